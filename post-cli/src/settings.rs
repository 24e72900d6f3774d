use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use post_client::{CacheOptions, ClientConfig, DEFAULT_BASE_URL, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub log_level: String,
    pub http_timeout_secs: u64,
    pub query_stale_secs: u64,
    pub query_gc_secs: u64,
    pub query_retry: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("POSTS_API_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let log_level = lookup("LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "warn".to_string());

        let http_timeout_secs = parse_positive(&lookup, "HTTP_TIMEOUT_SECS", 15)?;
        let query_stale_secs = parse_positive(&lookup, "QUERY_STALE_SECS", 5 * 60)?;
        let query_gc_secs = parse_positive(&lookup, "QUERY_GC_SECS", 15 * 60)?;
        let query_retry = lookup("QUERY_RETRY")
            .unwrap_or_else(|| "3".to_string())
            .trim()
            .parse::<u32>()
            .context("Failed to parse QUERY_RETRY, expecting non-negative integer")?;

        Ok(Self {
            api_url,
            log_level,
            http_timeout_secs,
            query_stale_secs,
            query_gc_secs,
            query_retry,
        })
    }

    /// `--server` важнее `POSTS_API_URL`.
    pub fn client_config(&self, server: Option<String>) -> ClientConfig {
        let base_url = server.map_or_else(|| self.api_url.clone(), normalize_server);
        ClientConfig {
            base_url,
            request_timeout: Duration::from_secs(self.http_timeout_secs),
            ..ClientConfig::default()
        }
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            stale_time: Duration::from_secs(self.query_stale_secs),
            gc_time: Duration::from_secs(self.query_gc_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.query_retry,
            ..RetryPolicy::default()
        }
    }
}

pub fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    let value = lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_match_sandbox_and_query_policy() {
        let settings = settings_from(&[]).expect("defaults must parse");
        assert_eq!(settings.api_url, DEFAULT_BASE_URL);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.cache_options(), CacheOptions::default());
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn env_overrides_are_applied() {
        let settings = settings_from(&[
            ("POSTS_API_URL", "http://localhost:3000"),
            ("RUST_LOG", "debug"),
            ("QUERY_STALE_SECS", "10"),
            ("QUERY_RETRY", "0"),
        ])
        .expect("settings must parse");

        assert_eq!(settings.api_url, "http://localhost:3000");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.cache_options().stale_time, Duration::from_secs(10));
        assert_eq!(settings.retry_policy().max_attempts(), 1);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(settings_from(&[("HTTP_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn garbage_number_is_rejected() {
        assert!(settings_from(&[("QUERY_GC_SECS", "soon")]).is_err());
    }

    #[test]
    fn server_flag_wins_over_env() {
        let settings = settings_from(&[("POSTS_API_URL", "http://env:1")]).expect("parse");
        let config = settings.client_config(Some("127.0.0.1:9999".to_string()));
        assert_eq!(config.base_url, "http://127.0.0.1:9999");

        let config = settings.client_config(None);
        assert_eq!(config.base_url, "http://env:1");
    }

    #[test]
    fn normalize_server_keeps_scheme() {
        let s = normalize_server("https://example.com:8080".to_string());
        assert_eq!(s, "https://example.com:8080");
    }
}
