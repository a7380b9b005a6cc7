use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_LOG_FILE: &str = "chatreplay.logs.jsonl";

static INIT: OnceCell<()> = OnceCell::new();

/// Logging settings read from `CHATREPLAY_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    enabled: bool,
    /// Explicit filter from `CHATREPLAY_LOG_LEVEL`; `RUST_LOG` applies otherwise.
    filter: Option<String>,
    json_path: Option<PathBuf>,
}

impl LogSettings {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            enabled: get("CHATREPLAY_OBSERVABILITY_ENABLED")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(true),
            filter: get("CHATREPLAY_LOG_LEVEL"),
            json_path: get("CHATREPLAY_JSON_LOG_PATH").map(PathBuf::from),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        self.filter
            .as_deref()
            .and_then(|filter| EnvFilter::try_new(filter).ok())
            .or_else(|| EnvFilter::try_from_default_env().ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

/// Splits a log path into the directory and file name the appender expects.
fn log_file_target(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    (dir.to_path_buf(), file.to_string())
}

/// Initialize logging once per process.
///
/// Environment variables:
/// - `CHATREPLAY_OBSERVABILITY_ENABLED`: optional enable/disable flag (default enabled).
/// - `CHATREPLAY_LOG_LEVEL`: optional level/filter override (`info`, `chatreplay_core=debug`, ...).
/// - `CHATREPLAY_JSON_LOG_PATH`: optional log file path. If set, logs are JSONL in that file.
///   If unset, logs go to stderr in a compact console format so stdout stays free for events.
/// - `RUST_LOG`: filter used when `CHATREPLAY_LOG_LEVEL` is unset or invalid.
pub fn init_observability() {
    INIT.get_or_init(|| {
        let settings = LogSettings::from_lookup(|key| std::env::var(key).ok());
        if !settings.enabled {
            return;
        }
        let registry = tracing_subscriber::registry().with(settings.env_filter());

        match &settings.json_path {
            Some(path) => {
                let (dir, file) = log_file_target(path);
                let _ = std::fs::create_dir_all(&dir);
                let json_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(false)
                    .with_writer(tracing_appender::rolling::never(dir, file));
                let _ = registry.with(json_layer).try_init();
            }
            None => {
                let console_layer = tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr);
                let _ = registry.with(console_layer).try_init();
            }
        }
    });
}
