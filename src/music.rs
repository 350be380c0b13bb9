use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::db;
use crate::emotion::Emotion;
use crate::error::RemoteError;
use crate::models::{CachedTracks, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    Cache,
    Catalog,
    Fallback,
}

impl TrackSource {
    /// Built-in picks carry made-up ids and are never persisted.
    pub fn is_catalog_data(self) -> bool {
        self != TrackSource::Fallback
    }
}

#[derive(Debug, Clone)]
pub struct Recommendation {
    pub tracks: Vec<Track>,
    pub source: TrackSource,
}

/// Tracks from a cached search when it is still fresh and asked for at
/// least `limit` results; `None` means the catalog has to be queried.
pub fn cached_selection(
    cached: Option<&CachedTracks>,
    now: DateTime<Utc>,
    ttl: Duration,
    limit: usize,
    refresh: bool,
) -> Option<Vec<Track>> {
    if refresh {
        return None;
    }
    let cached = cached?;
    let age = now.signed_duration_since(cached.fetched_at).to_std().ok()?;
    if age >= ttl || cached.requested_limit < limit {
        return None;
    }
    Some(cached.tracks.iter().take(limit).cloned().collect())
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Track>,
}

pub struct MusicCatalog {
    client: Client,
    base_url: String,
    ttl: Duration,
}

impl MusicCatalog {
    pub fn new(client: Client, base_url: &str, ttl: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            ttl,
        }
    }

    pub async fn search(&self, emotion: Emotion, limit: usize) -> Result<Vec<Track>, RemoteError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("term", emotion.search_term()),
                ("media", "music"),
                ("entity", "song"),
                ("country", "KR"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status {
                service: "music catalog",
                status: response.status(),
            });
        }

        let body = response.text().await?;
        parse_search(&body)
    }

    /// Serves from the `track_cache` table when a pool is given and the
    /// entry is fresh, otherwise searches the catalog and stores non-empty
    /// results. Empty or failed searches fall back to the built-in list.
    pub async fn recommend(
        &self,
        pool: Option<&PgPool>,
        emotion: Emotion,
        limit: usize,
        refresh: bool,
    ) -> anyhow::Result<Recommendation> {
        if let Some(pool) = pool {
            let cached = db::load_cached_tracks(pool, emotion).await?;
            if let Some(tracks) =
                cached_selection(cached.as_ref(), Utc::now(), self.ttl, limit, refresh)
            {
                debug!("music cache hit for {emotion}");
                return Ok(Recommendation {
                    tracks,
                    source: TrackSource::Cache,
                });
            }
        }

        let tracks = match self.search(emotion, limit).await {
            Ok(tracks) if !tracks.is_empty() => tracks,
            Ok(_) => {
                warn!("music catalog returned no tracks for {emotion}, using built-in list");
                return Ok(fallback_recommendation(emotion));
            }
            Err(e) => {
                warn!("music catalog search failed for {emotion}: {e}, using built-in list");
                return Ok(fallback_recommendation(emotion));
            }
        };

        if let Some(pool) = pool {
            db::store_cached_tracks(pool, emotion, limit, &tracks).await?;
        }

        Ok(Recommendation {
            tracks,
            source: TrackSource::Catalog,
        })
    }
}

fn parse_search(body: &str) -> Result<Vec<Track>, RemoteError> {
    serde_json::from_str::<SearchResponse>(body)
        .map(|response| response.results)
        .map_err(|e| RemoteError::MalformedPayload(e.to_string()))
}

fn fallback_recommendation(emotion: Emotion) -> Recommendation {
    Recommendation {
        tracks: fallback_tracks(emotion),
        source: TrackSource::Fallback,
    }
}

pub fn fallback_tracks(emotion: Emotion) -> Vec<Track> {
    let picks: &[(i64, &str, &str)] = match emotion {
        Emotion::Happy => &[(1, "좋은 날", "아이유"), (2, "Dynamite", "BTS")],
        Emotion::Sad => &[(3, "눈의 꽃", "박효신"), (4, "사랑했지만", "김광석")],
        Emotion::Stressed => &[(5, "걱정말아요 그대", "이적"), (6, "Weightless", "Marconi Union")],
        Emotion::Excited => &[(7, "봄날", "BTS"), (8, "썸", "소유, 정기고")],
        Emotion::Calm => &[(9, "밤편지", "아이유"), (10, "Clair de Lune", "Claude Debussy")],
        Emotion::Exhausted => &[(11, "수고했어, 오늘도", "옥상달빛"), (12, "위로", "권진아")],
    };

    picks
        .iter()
        .map(|(id, name, artist)| Track {
            track_id: *id,
            track_name: name.to_string(),
            artist_name: artist.to_string(),
            collection_name: None,
            artwork_url100: None,
            preview_url: None,
            track_view_url: None,
            primary_genre_name: Some("Pop".to_string()),
            track_time_millis: None,
        })
        .collect()
}
