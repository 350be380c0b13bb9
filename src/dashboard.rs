use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::emotion::Emotion;
use crate::models::{DiaryEntry, EmotionCount, MonthlyCount, MoodRecord, MoodTrend};

pub fn cutoff(since_days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(since_days.max(1))
}

pub fn summarize_by_emotion(records: &[MoodRecord]) -> Vec<EmotionCount> {
    let total = records.len();
    let mut counts: BTreeMap<Emotion, usize> = BTreeMap::new();

    for record in records {
        *counts.entry(record.emotion).or_insert(0) += 1;
    }

    let mut summaries: Vec<EmotionCount> = counts
        .into_iter()
        .map(|(emotion, count)| EmotionCount {
            emotion,
            count,
            share: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

/// Most frequent emotion; ties go to the most recent record.
pub fn dominant_emotion(records: &[MoodRecord]) -> Option<Emotion> {
    let top = summarize_by_emotion(records).first()?.count;
    records
        .iter()
        .rev()
        .map(|record| record.emotion)
        .find(|emotion| records.iter().filter(|r| r.emotion == *emotion).count() == top)
}

pub fn monthly_counts(entries: &[DiaryEntry]) -> Vec<MonthlyCount> {
    let mut months: BTreeMap<String, usize> = BTreeMap::new();

    for entry in entries {
        let key = format!("{}-{:02}", entry.created_at.year(), entry.created_at.month());
        *months.entry(key).or_insert(0) += 1;
    }

    months
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect()
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn weekly_trends(records: &[MoodRecord]) -> Vec<MoodTrend> {
    let mut weeks: BTreeMap<NaiveDate, (usize, i32)> = BTreeMap::new();

    for record in records {
        let entry = weeks
            .entry(week_start(record.recorded_at.date_naive()))
            .or_insert((0, 0));
        entry.0 += 1;
        entry.1 += record.score;
    }

    weeks
        .into_iter()
        .map(|(week_start, (entry_count, total_score))| MoodTrend {
            week_start,
            entry_count,
            avg_score: total_score as f64 / entry_count as f64,
        })
        .collect()
}

fn mood_bar(avg_score: f64) -> String {
    "#".repeat(avg_score.round().clamp(0.0, 10.0) as usize)
}

pub fn build_report(
    user_label: &str,
    since_days: i64,
    cutoff: DateTime<Utc>,
    entries: &[DiaryEntry],
    records: &[MoodRecord],
) -> String {
    let summaries = summarize_by_emotion(records);
    let trends = weekly_trends(records);
    let months = monthly_counts(entries);

    let mut output = String::new();

    let _ = writeln!(output, "# Mood Dashboard");
    let _ = writeln!(
        output,
        "Generated for {} (last {} days, since {})",
        user_label,
        since_days,
        cutoff.date_naive()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Diary entries: {}", entries.len());
    let _ = writeln!(output, "- Mood records: {}", records.len());

    match dominant_emotion(records) {
        Some(emotion) => {
            let _ = writeln!(output, "- Dominant emotion: {emotion}");
            let _ = writeln!(output, "- {}", emotion.description());
        }
        None => {
            let _ = writeln!(output, "- Dominant emotion: none recorded");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Emotion Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No moods recorded for this window.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} entries ({:.0}%)",
                summary.emotion,
                summary.count,
                summary.share * 100.0
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Mood Trend");

    if trends.is_empty() {
        let _ = writeln!(output, "No moods recorded for this window.");
    } else {
        for trend in trends.iter() {
            let _ = writeln!(
                output,
                "- week of {}: avg mood {:.1} across {} entries {}",
                trend.week_start,
                trend.avg_score,
                trend.entry_count,
                mood_bar(trend.avg_score)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Entries");

    if months.is_empty() {
        let _ = writeln!(output, "No diary entries for this window.");
    } else {
        for month in months.iter() {
            let _ = writeln!(output, "- {}: {} entries", month.month, month.count);
        }
    }

    let mut recent = entries.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Entries");

    if recent.is_empty() {
        let _ = writeln!(output, "No diary entries for this window.");
    } else {
        for entry in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} [{}] {}",
                entry.created_at.date_naive(),
                entry.emotion,
                entry.title
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
    }

    fn record(emotion: Emotion, recorded_at: DateTime<Utc>) -> MoodRecord {
        MoodRecord {
            emotion,
            score: emotion.mood_score(),
            recorded_at,
        }
    }

    fn entry(title: &str, emotion: Emotion, created_at: DateTime<Utc>) -> DiaryEntry {
        DiaryEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: title.to_string(),
            content: "내용".to_string(),
            emotion,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn counts_and_shares_by_emotion() {
        let records = vec![
            record(Emotion::Sad, at(2026, 3, 2)),
            record(Emotion::Sad, at(2026, 3, 3)),
            record(Emotion::Happy, at(2026, 3, 4)),
            record(Emotion::Calm, at(2026, 3, 5)),
        ];
        let summaries = summarize_by_emotion(&records);
        assert_eq!(summaries[0].emotion, Emotion::Sad);
        assert_eq!(summaries[0].count, 2);
        assert!((summaries[0].share - 0.5).abs() < 1e-9);
        assert_eq!(summaries.len(), 3);
    }

    #[test]
    fn dominant_emotion_prefers_recent_on_ties() {
        let records = vec![
            record(Emotion::Sad, at(2026, 3, 2)),
            record(Emotion::Happy, at(2026, 3, 3)),
        ];
        assert_eq!(dominant_emotion(&records), Some(Emotion::Happy));
        assert_eq!(dominant_emotion(&[]), None);
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2026-03-05 is a Thursday
        let thursday = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(week_start(thursday), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn weekly_trend_averages_scores() {
        let records = vec![
            record(Emotion::Happy, at(2026, 3, 2)),
            record(Emotion::Sad, at(2026, 3, 4)),
            record(Emotion::Calm, at(2026, 3, 10)),
        ];
        let trends = weekly_trends(&records);
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].entry_count, 2);
        assert!((trends[0].avg_score - 5.5).abs() < 1e-9);
        assert!((trends[1].avg_score - 7.0).abs() < 1e-9);
    }

    #[test]
    fn months_are_sorted_and_zero_padded() {
        let entries = vec![
            entry("b", Emotion::Calm, at(2026, 11, 1)),
            entry("a", Emotion::Calm, at(2026, 2, 1)),
            entry("c", Emotion::Calm, at(2026, 2, 20)),
        ];
        let months = monthly_counts(&entries);
        assert_eq!(
            months,
            vec![
                MonthlyCount { month: "2026-02".to_string(), count: 2 },
                MonthlyCount { month: "2026-11".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn report_lists_sections_and_recent_entries() {
        let entries = vec![
            entry("발표", Emotion::Happy, at(2026, 3, 2)),
            entry("야근", Emotion::Stressed, at(2026, 3, 4)),
        ];
        let records = vec![
            record(Emotion::Happy, at(2026, 3, 2)),
            record(Emotion::Stressed, at(2026, 3, 4)),
        ];
        let report =
            build_report("demo@emotion-diary.dev", 30, at(2026, 2, 10), &entries, &records);

        assert!(report.contains("# Mood Dashboard"));
        assert!(report
            .contains("Generated for demo@emotion-diary.dev (last 30 days, since 2026-02-10)"));
        assert!(report.contains("- Dominant emotion: 스트레스"));
        assert!(report.contains("- week of 2026-03-02: avg mood 6.0 across 2 entries ######"));
        assert!(report.contains("- 2026-03: 2 entries"));
        let newest = report.find("[스트레스] 야근").unwrap();
        let oldest = report.find("[행복함] 발표").unwrap();
        assert!(newest < oldest);
    }

    #[test]
    fn empty_report_says_so() {
        let report = build_report("nobody", 7, at(2026, 3, 1), &[], &[]);
        assert!(report.contains("- Dominant emotion: none recorded"));
        assert!(report.contains("No moods recorded for this window."));
        assert!(report.contains("No diary entries for this window."));
    }
}
