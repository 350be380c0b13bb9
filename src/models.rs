use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::emotion::Emotion;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiaryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub emotion: Emotion,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDiary {
    pub title: String,
    pub content: String,
    /// Overrides the classifier when set.
    pub emotion: Option<Emotion>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct DiaryUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub emotion: Option<Emotion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiaryFilter {
    All,
    RecentDays(i64),
    Month { year: i32, month: u32 },
    Emotion(Emotion),
}

#[derive(Debug, Clone)]
pub struct MoodRecord {
    pub emotion: Emotion,
    pub score: i32,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmotionCount {
    pub emotion: Emotion,
    pub count: usize,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoodTrend {
    pub week_start: NaiveDate,
    pub entry_count: usize,
    pub avg_score: f64,
}

/// A catalog track, shaped like the iTunes search result item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub track_id: i64,
    pub track_name: String,
    pub artist_name: String,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub artwork_url100: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub track_view_url: Option<String>,
    #[serde(default)]
    pub primary_genre_name: Option<String>,
    #[serde(default)]
    pub track_time_millis: Option<i64>,
}

/// A stored catalog answer for one emotion.
#[derive(Debug, Clone)]
pub struct CachedTracks {
    pub tracks: Vec<Track>,
    /// The `limit` the search ran with; the catalog may return fewer.
    pub requested_limit: usize,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryAnalysis {
    pub emotion: Emotion,
    pub analysis: String,
    pub advice: String,
    pub encouragement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Local,
    Remote,
}

impl AnalysisKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisKind::Local => "local",
            AnalysisKind::Remote => "diary",
        }
    }
}
