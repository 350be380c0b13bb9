use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use tracing::info;

pub struct Config {
    pub database_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub itunes_base_url: String,
    pub music_cache_ttl: Duration,
    pub http_timeout: Duration,
    pub max_diary_chars: usize,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: optional("DATABASE_URL"),
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_base_url: try_load("OPENAI_BASE_URL", "https://api.openai.com/v1")?,
            openai_model: try_load("OPENAI_MODEL", "gpt-3.5-turbo")?,
            itunes_base_url: try_load("ITUNES_BASE_URL", "https://itunes.apple.com")?,
            music_cache_ttl: Duration::from_secs(try_load("MUSIC_CACHE_SECS", "300")?),
            http_timeout: Duration::from_secs(try_load("HTTP_TIMEOUT_SECS", "15")?),
            max_diary_chars: try_load("MAX_DIARY_CHARS", "500")?,
        })
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a Postgres instance")
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    parse_value(key, optional(key), default)
}

fn parse_value<T: FromStr>(key: &str, value: Option<String>, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = value.unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow!("invalid {key} value {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_value_uses_default() {
        let ttl_secs: u64 = parse_value("MUSIC_CACHE_SECS", None, "300").unwrap();
        assert_eq!(ttl_secs, 300);
    }

    #[test]
    fn set_value_wins_over_default() {
        let chars: usize = parse_value("MAX_DIARY_CHARS", Some("1000".to_string()), "500").unwrap();
        assert_eq!(chars, 1000);
    }

    #[test]
    fn unparsable_value_is_an_error() {
        let result: anyhow::Result<u64> =
            parse_value("HTTP_TIMEOUT_SECS", Some("soon".to_string()), "15");
        let message = result.unwrap_err().to_string();
        assert!(message.contains("HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn missing_database_url_is_reported() {
        let config = Config {
            database_url: None,
            openai_api_key: None,
            openai_base_url: String::new(),
            openai_model: String::new(),
            itunes_base_url: String::new(),
            music_cache_ttl: Duration::from_secs(300),
            http_timeout: Duration::from_secs(15),
            max_diary_chars: 500,
        };
        assert!(config.database_url().is_err());
    }
}
