use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ChatError;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_REPLAY_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Where replay transcripts are read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplaySource {
    /// Static file server; transcripts are fetched from `{base_url}/{path}`.
    Http { base_url: String },
    /// Local directory; transcripts are read from `{dir}/{path}`.
    Dir(PathBuf),
}

/// Configuration for a [`ChatClient`](crate::ChatClient).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the chat service, e.g. `http://localhost:8000/api`.
    pub api_base_url: String,
    pub replay_source: ReplaySource,
    /// Connection timeout for live streams and transcript fetches.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            replay_source: ReplaySource::Http {
                base_url: DEFAULT_REPLAY_BASE_URL.to_string(),
            },
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Builds a config from the process environment.
    ///
    /// Environment variables:
    /// - `CHATREPLAY_API_URL`: chat service base URL (default `http://localhost:8000/api`).
    /// - `CHATREPLAY_REPLAY_DIR`: read transcripts from this directory.
    /// - `CHATREPLAY_REPLAY_BASE_URL`: fetch transcripts over HTTP from this base
    ///   (default `http://localhost:3000`). Ignored when `CHATREPLAY_REPLAY_DIR` is set.
    /// - `CHATREPLAY_TIMEOUT_SECS`: connection timeout in seconds (default 120).
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ChatError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("CHATREPLAY_API_URL") {
            config.api_base_url = url;
        }
        if let Some(dir) = get("CHATREPLAY_REPLAY_DIR") {
            config.replay_source = ReplaySource::Dir(PathBuf::from(dir));
        } else if let Some(base_url) = get("CHATREPLAY_REPLAY_BASE_URL") {
            config.replay_source = ReplaySource::Http { base_url };
        }
        if let Some(raw) = get("CHATREPLAY_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ChatError::Config(format!(
                    "CHATREPLAY_TIMEOUT_SECS must be an integer, got `{raw}`"
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn replay_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.replay_source = ReplaySource::Dir(dir.into());
        self
    }

    pub fn replay_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.replay_source = ReplaySource::Http {
            base_url: base_url.into(),
        };
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn stream_url(&self) -> String {
        format!("{}/chat/stream", self.api_base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = ClientConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config.stream_url(), "http://localhost:8000/api/chat/stream");
        assert_eq!(
            config.replay_source,
            ReplaySource::Http {
                base_url: DEFAULT_REPLAY_BASE_URL.into()
            }
        );
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn replay_dir_overrides_base_url() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CHATREPLAY_API_URL", "https://chat.example.com/api/"),
            ("CHATREPLAY_REPLAY_DIR", "/srv/transcripts"),
            ("CHATREPLAY_REPLAY_BASE_URL", "https://static.example.com"),
            ("CHATREPLAY_TIMEOUT_SECS", "5"),
        ]))
        .expect("config");
        assert_eq!(config.stream_url(), "https://chat.example.com/api/chat/stream");
        assert_eq!(
            config.replay_source,
            ReplaySource::Dir(PathBuf::from("/srv/transcripts"))
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_timeout_is_a_config_error() {
        let err = ClientConfig::from_lookup(lookup(&[("CHATREPLAY_TIMEOUT_SECS", "soon")]))
            .expect_err("invalid timeout");
        assert!(matches!(err, ChatError::Config(msg) if msg.contains("CHATREPLAY_TIMEOUT_SECS")));
    }
}
