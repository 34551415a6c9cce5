//! Runtime configuration.
//!
//! Layered with figment: built-in defaults, then `eventscape.toml` in the
//! working directory, then `EVENTSCAPE_*` environment variables.

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use fundu::DurationParser;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_FILE: &str = "eventscape.toml";
pub const ENV_PREFIX: &str = "EVENTSCAPE_";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// JSON file backing the persistent store.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Default lifetime of embed cache rows.
    #[serde(default = "default_cache_ttl", deserialize_with = "deserialize_duration")]
    pub cache_ttl: Duration,
    #[serde(default = "default_search_debounce", deserialize_with = "deserialize_duration")]
    pub search_debounce: Duration,
    #[serde(default = "default_http_timeout", deserialize_with = "deserialize_duration")]
    pub http_timeout: Duration,
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".eventscape/store.json")
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api/".to_owned()
}

fn default_cache_ttl() -> Duration {
    crate::embed_cache::DEFAULT_TTL
}

fn default_search_debounce() -> Duration {
    Duration::from_millis(300)
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Config {
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}

/// Parse a human duration such as `7d`, `90s` or `300ms`.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let parsed = DurationParser::with_all_time_units()
        .parse(text.trim())
        .map_err(|e| format!("invalid duration {text:?}: {e}"))?;
    Duration::try_from(parsed).map_err(|e| format!("invalid duration {text:?}: {e}"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

/// Accept either bare seconds or a human duration string.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match RawDuration::deserialize(deserializer)? {
        RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawDuration::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Result<Config, figment::Error> {
        Figment::new().merge(Toml::string(toml)).extract()
    }

    #[test]
    fn defaults_apply_when_empty() {
        let config = from_toml("").unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.cache_ttl, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert_eq!(config.store_path, PathBuf::from(".eventscape/store.json"));
    }

    #[test]
    fn durations_accept_strings_and_seconds() {
        let config = from_toml(
            r#"
            cache_ttl = "1h"
            search_debounce = "150ms"
            http_timeout = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.search_debounce, Duration::from_millis(150));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn bad_duration_is_rejected() {
        assert!(from_toml(r#"cache_ttl = "soon""#).is_err());
        assert!(parse_duration("7d").is_ok());
        assert!(parse_duration("").is_err());
    }
}
