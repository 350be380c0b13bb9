use anyhow::{bail, Context};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::classifier;
use crate::emotion::Emotion;
use crate::models::{
    AnalysisKind, CachedTracks, DiaryAnalysis, DiaryEntry, DiaryFilter, DiaryUpdate, MoodRecord,
    NewDiary, Track, User,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool, max_chars: usize) -> anyhow::Result<usize> {
    let user = upsert_user(pool, "demo@emotion-diary.dev", Some("Demo")).await?;
    let today = Utc::now();

    let entries = [
        (13, "seed-001", "첫 출근", "새로운 회사에 첫 출근했다. 너무 떨렸지만 기대된다"),
        (11, "seed-002", "야근", "마감 때문에 압박이 심하다. 오늘도 짜증나는 하루였다"),
        (9, "seed-003", "주말 산책", "공원을 천천히 걸었다. 조용하고 편안했다"),
        (6, "seed-004", "발표", "발표를 해냈다! 정말 뿌듯하고 행복했다"),
        (4, "seed-005", "감기", "몸이 아파서 하루 종일 누워 있었다. 너무 피곤했다"),
        (2, "seed-006", "이별", "오랜 친구와 멀어졌다. 눈물이 났고 쓸쓸했다"),
        (0, "seed-007", "휴식", "오늘은 아무것도 하지 않고 휴식했다"),
    ];

    let mut inserted = 0usize;
    for (days_ago, source_key, title, content) in entries {
        let created_at = today - Duration::days(days_ago);
        let diary = NewDiary {
            title: title.to_string(),
            content: content.to_string(),
            emotion: None,
            created_at: Some(created_at),
        };
        if insert_diary(pool, user.id, &diary, Some(source_key), max_chars)
            .await?
            .is_some()
        {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn upsert_user(
    pool: &PgPool,
    email: &str,
    display_name: Option<&str>,
) -> anyhow::Result<User> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        bail!("email must not be empty");
    }
    let fallback_name = email.split('@').next().unwrap_or_default().to_string();
    let name = display_name.map(str::to_string).unwrap_or(fallback_name);

    let row = sqlx::query(
        r#"
        INSERT INTO emotion_diary.users (id, email, display_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET display_name = COALESCE($4, emotion_diary.users.display_name)
        RETURNING id, email, display_name
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&name)
    .bind(display_name)
    .fetch_one(pool)
    .await?;

    Ok(user_from_row(&row))
}

pub async fn find_user(pool: &PgPool, email: &str) -> anyhow::Result<User> {
    let row = sqlx::query(
        "SELECT id, email, display_name FROM emotion_diary.users WHERE email = $1",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no user registered with email {email}"))?;

    Ok(user_from_row(&row))
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
    }
}

/// Rejects blank diaries and ones over the length cap (counted in chars).
pub fn validate_content(content: &str, max_chars: usize) -> anyhow::Result<()> {
    if content.trim().is_empty() {
        bail!("diary content must not be empty");
    }
    let length = content.chars().count();
    if length > max_chars {
        bail!("diary content is {length} characters, the limit is {max_chars}");
    }
    Ok(())
}

/// First sentence of the content, cut to 30 characters.
pub fn derive_title(content: &str) -> String {
    let first = classifier::split_sentences(content)
        .into_iter()
        .next()
        .unwrap_or("무제");
    let mut title: String = first.chars().take(30).collect();
    if first.chars().count() > 30 {
        title.push('…');
    }
    title
}

pub async fn create_diary(
    pool: &PgPool,
    user_id: Uuid,
    diary: &NewDiary,
    max_chars: usize,
) -> anyhow::Result<DiaryEntry> {
    insert_diary(pool, user_id, diary, None, max_chars)
        .await?
        .context("diary was not inserted")
}

/// Inserts a diary and its mood entry in one transaction. Returns `None`
/// when `source_key` was already imported.
async fn insert_diary(
    pool: &PgPool,
    user_id: Uuid,
    diary: &NewDiary,
    source_key: Option<&str>,
    max_chars: usize,
) -> anyhow::Result<Option<DiaryEntry>> {
    validate_content(&diary.content, max_chars)?;
    let emotion = diary
        .emotion
        .unwrap_or_else(|| classifier::classify(&diary.content));
    let title = if diary.title.trim().is_empty() {
        derive_title(&diary.content)
    } else {
        diary.title.trim().to_string()
    };
    let created_at = diary.created_at.unwrap_or_else(Utc::now);

    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r#"
        INSERT INTO emotion_diary.diaries
        (id, user_id, title, content, emotion, source_key, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        ON CONFLICT (source_key) DO NOTHING
        RETURNING id, user_id, title, content, emotion, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&title)
    .bind(&diary.content)
    .bind(emotion.label())
    .bind(source_key)
    .bind(created_at)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        tx.rollback().await?;
        return Ok(None);
    };
    let entry = diary_from_row(&row)?;

    sqlx::query(
        r#"
        INSERT INTO emotion_diary.mood_entries (id, user_id, diary_id, emotion, score, recorded_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(entry.id)
    .bind(emotion.label())
    .bind(emotion.mood_score())
    .bind(created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(entry))
}

pub async fn get_diary(pool: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<DiaryEntry> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, title, content, emotion, created_at, updated_at
        FROM emotion_diary.diaries
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("diary {id} not found"))?;

    diary_from_row(&row)
}

/// Applies the given fields. Changed content is re-classified unless an
/// emotion is supplied; the diary's mood entry follows the new emotion.
pub async fn update_diary(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    update: &DiaryUpdate,
    max_chars: usize,
) -> anyhow::Result<DiaryEntry> {
    let current = get_diary(pool, user_id, id).await?;

    if let Some(content) = &update.content {
        validate_content(content, max_chars)?;
    }
    let title = update.title.clone().unwrap_or(current.title);
    let content = update.content.clone().unwrap_or(current.content);
    let emotion = match (update.emotion, &update.content) {
        (Some(emotion), _) => emotion,
        (None, Some(content)) => classifier::classify(content),
        (None, None) => current.emotion,
    };

    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r#"
        UPDATE emotion_diary.diaries
        SET title = $3, content = $4, emotion = $5, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, title, content, emotion, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&title)
    .bind(&content)
    .bind(emotion.label())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE emotion_diary.mood_entries SET emotion = $2, score = $3 WHERE diary_id = $1",
    )
    .bind(id)
    .bind(emotion.label())
    .bind(emotion.mood_score())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    diary_from_row(&row)
}

pub async fn delete_diary(pool: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<()> {
    let result = sqlx::query("DELETE FROM emotion_diary.diaries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        bail!("diary {id} not found");
    }
    Ok(())
}

/// First instant of the month and of the month after it.
pub fn month_bounds(year: i32, month: u32) -> anyhow::Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("invalid month {year}-{month:02}"))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).context("invalid month")?;

    let midnight = |date: NaiveDate| Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
    Ok((midnight(start), midnight(end)))
}

pub async fn list_diaries(
    pool: &PgPool,
    user_id: Uuid,
    filter: DiaryFilter,
) -> anyhow::Result<Vec<DiaryEntry>> {
    let mut query = String::from(
        "SELECT id, user_id, title, content, emotion, created_at, updated_at \
         FROM emotion_diary.diaries \
         WHERE user_id = $1",
    );

    match filter {
        DiaryFilter::All => {}
        DiaryFilter::RecentDays(_) => query.push_str(" AND created_at >= $2"),
        DiaryFilter::Month { .. } => query.push_str(" AND created_at >= $2 AND created_at < $3"),
        DiaryFilter::Emotion(_) => query.push_str(" AND emotion = $2"),
    }
    query.push_str(" ORDER BY created_at DESC");

    let mut rows = sqlx::query(&query).bind(user_id);

    match filter {
        DiaryFilter::All => {}
        DiaryFilter::RecentDays(days) => {
            rows = rows.bind(Utc::now() - Duration::days(days.max(1)));
        }
        DiaryFilter::Month { year, month } => {
            let (start, end) = month_bounds(year, month)?;
            rows = rows.bind(start).bind(end);
        }
        DiaryFilter::Emotion(emotion) => {
            rows = rows.bind(emotion.label());
        }
    }

    let records = rows.fetch_all(pool).await?;
    records.iter().map(diary_from_row).collect()
}

fn diary_from_row(row: &PgRow) -> anyhow::Result<DiaryEntry> {
    let emotion: String = row.get("emotion");
    Ok(DiaryEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        content: row.get("content"),
        emotion: emotion.parse()?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub async fn fetch_mood_history(
    pool: &PgPool,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<MoodRecord>> {
    let records = sqlx::query(
        r#"
        SELECT emotion, score, recorded_at
        FROM emotion_diary.mood_entries
        WHERE user_id = $1 AND recorded_at >= $2
        ORDER BY recorded_at
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    let mut history = Vec::with_capacity(records.len());
    for row in records {
        let emotion: String = row.get("emotion");
        history.push(MoodRecord {
            emotion: emotion.parse()?,
            score: row.get("score"),
            recorded_at: row.get("recorded_at"),
        });
    }

    Ok(history)
}

pub async fn record_analysis(
    pool: &PgPool,
    user_id: Uuid,
    input_text: &str,
    analysis: &DiaryAnalysis,
    kind: AnalysisKind,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO emotion_diary.emotion_analyses
        (id, user_id, input_text, detected_emotion, analysis, advice, analysis_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(input_text)
    .bind(analysis.emotion.label())
    .bind(&analysis.analysis)
    .bind(&analysis.advice)
    .bind(kind.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn record_recommendations(
    pool: &PgPool,
    user_id: Uuid,
    emotion: Emotion,
    tracks: &[Track],
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    for track in tracks {
        sqlx::query(
            r#"
            INSERT INTO emotion_diary.music_recommendations
            (id, user_id, emotion, track_id, track_name, artist_name, track_view_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(emotion.label())
        .bind(track.track_id)
        .bind(&track.track_name)
        .bind(&track.artist_name)
        .bind(track.track_view_url.as_deref())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn load_cached_tracks(
    pool: &PgPool,
    emotion: Emotion,
) -> anyhow::Result<Option<CachedTracks>> {
    let row = sqlx::query(
        r#"
        SELECT tracks, requested_limit, fetched_at
        FROM emotion_diary.track_cache
        WHERE emotion = $1
        "#,
    )
    .bind(emotion.label())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let tracks: String = row.get("tracks");
    let cached =
        cached_tracks_from_parts(&tracks, row.get("requested_limit"), row.get("fetched_at"))
            .with_context(|| format!("track cache for {emotion} is unreadable"))?;
    Ok(Some(cached))
}

fn cached_tracks_from_parts(
    tracks: &str,
    requested_limit: i32,
    fetched_at: DateTime<Utc>,
) -> anyhow::Result<CachedTracks> {
    Ok(CachedTracks {
        tracks: serde_json::from_str(tracks)?,
        requested_limit: usize::try_from(requested_limit)?,
        fetched_at,
    })
}

/// Replaces the cached catalog answer for `emotion`, stamped now.
pub async fn store_cached_tracks(
    pool: &PgPool,
    emotion: Emotion,
    requested_limit: usize,
    tracks: &[Track],
) -> anyhow::Result<()> {
    let requested_limit = i32::try_from(requested_limit).context("track limit out of range")?;
    sqlx::query(
        r#"
        INSERT INTO emotion_diary.track_cache (emotion, tracks, requested_limit, fetched_at)
        VALUES ($1, $2, $3, now())
        ON CONFLICT (emotion) DO UPDATE
        SET tracks = EXCLUDED.tracks,
            requested_limit = EXCLUDED.requested_limit,
            fetched_at = EXCLUDED.fetched_at
        "#,
    )
    .bind(emotion.label())
    .bind(serde_json::to_string(tracks)?)
    .bind(requested_limit)
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(serde::Deserialize)]
struct CsvRow {
    email: String,
    #[serde(default)]
    title: String,
    content: String,
    #[serde(default)]
    emotion: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    source_key: Option<String>,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> anyhow::Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid timestamp {value:?}"))?;
    Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)))
}

fn new_diary_from_csv(row: &CsvRow) -> anyhow::Result<NewDiary> {
    let emotion = match row.emotion.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(label) => Some(label.parse::<Emotion>()?),
    };
    let created_at = match row.created_at.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(parse_timestamp(value)?),
    };

    Ok(NewDiary {
        title: row.title.clone(),
        content: row.content.clone(),
        emotion,
        created_at,
    })
}

pub async fn import_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    max_chars: usize,
) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let diary = new_diary_from_csv(&row).with_context(|| format!("row {}", line + 1))?;
        let user = upsert_user(pool, &row.email, None).await?;

        let source_key = row
            .source_key
            .clone()
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_diary(pool, user.id, &diary, Some(&source_key), max_chars)
            .await
            .with_context(|| format!("row {}", line + 1))?
            .is_some()
        {
            inserted += 1;
        }
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn blank_content_is_rejected() {
        assert!(validate_content("   ", 500).is_err());
        assert!(validate_content("오늘은 평범했다", 500).is_ok());
    }

    #[test]
    fn length_cap_counts_characters_not_bytes() {
        let text = "가".repeat(500);
        assert!(validate_content(&text, 500).is_ok());
        let longer = "가".repeat(501);
        assert!(validate_content(&longer, 500).is_err());
    }

    #[test]
    fn title_comes_from_first_sentence() {
        assert_eq!(derive_title("비 오는 날. 집에 있었다"), "비 오는 날");
        assert_eq!(derive_title(""), "무제");
        let long = "아".repeat(40);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), 31);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn month_bounds_roll_over_december() {
        let (start, end) = month_bounds(2026, 12).unwrap();
        assert_eq!((start.year(), start.month(), start.day()), (2026, 12, 1));
        assert_eq!((end.year(), end.month(), end.day()), (2027, 1, 1));
        assert_eq!(end.hour(), 0);
        assert!(month_bounds(2026, 13).is_err());
    }

    #[test]
    fn timestamps_accept_dates_and_rfc3339() {
        let date = parse_timestamp("2026-03-04").unwrap();
        assert_eq!((date.month(), date.day(), date.hour()), (3, 4, 0));
        let exact = parse_timestamp("2026-03-04T21:30:00+09:00").unwrap();
        assert_eq!(exact.hour(), 12);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn cached_tracks_decode_from_stored_columns() {
        let fetched_at = parse_timestamp("2026-10-01").unwrap();
        let stored = r#"[{"trackId": 7, "trackName": "봄날", "artistName": "BTS"}]"#;
        let cached = cached_tracks_from_parts(stored, 9, fetched_at).unwrap();
        assert_eq!(cached.tracks.len(), 1);
        assert_eq!(cached.tracks[0].track_id, 7);
        assert_eq!(cached.requested_limit, 9);
        assert_eq!(cached.fetched_at, fetched_at);

        assert!(cached_tracks_from_parts("not json", 9, fetched_at).is_err());
        assert!(cached_tracks_from_parts("[]", -1, fetched_at).is_err());
    }

    #[test]
    fn csv_rows_map_to_new_diaries() {
        let row = CsvRow {
            email: "a@example.com".to_string(),
            title: String::new(),
            content: "오늘 너무 피곤했다".to_string(),
            emotion: Some(" ".to_string()),
            created_at: Some("2026-01-02".to_string()),
            source_key: None,
        };
        let diary = new_diary_from_csv(&row).unwrap();
        assert_eq!(diary.emotion, None);
        assert!(diary.created_at.is_some());

        let labelled = CsvRow {
            emotion: Some("설렘".to_string()),
            ..row
        };
        assert_eq!(
            new_diary_from_csv(&labelled).unwrap().emotion,
            Some(Emotion::Excited)
        );
    }
}
