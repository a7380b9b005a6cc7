use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;

use super::fetch::TranscriptFetcher;
use crate::errors::SourceError;

type Slot = Arc<OnceCell<Arc<str>>>;

/// Process-lifetime store of transcript text keyed by resolved path.
///
/// Entries are created on the first successful fetch and never change or
/// expire. A failed fetch leaves no entry, so the next `get` retries. Callers
/// racing on the same uncached path share a single in-flight fetch.
pub struct TranscriptCache {
    fetcher: Arc<dyn TranscriptFetcher>,
    entries: DashMap<String, Slot>,
}

impl TranscriptCache {
    pub fn new(fetcher: Arc<dyn TranscriptFetcher>) -> Self {
        Self {
            fetcher,
            entries: DashMap::new(),
        }
    }

    /// Returns the transcript at `path`, fetching it on first access.
    ///
    /// Stored text has CRLF line endings normalized to LF.
    pub async fn get(&self, path: &str) -> Result<Arc<str>, SourceError> {
        let slot: Slot = self.entries.entry(path.to_string()).or_default().clone();
        if let Some(text) = slot.get() {
            debug!(path, "transcript cache hit");
            return Ok(text.clone());
        }
        let text = slot
            .get_or_try_init(|| async {
                debug!(path, "transcript cache miss");
                let raw = self.fetcher.fetch(path).await?;
                Ok::<_, SourceError>(Arc::from(raw.replace("\r\n", "\n")))
            })
            .await?;
        Ok(text.clone())
    }

    /// True once `path` has been fetched successfully.
    pub fn contains(&self, path: &str) -> bool {
        self.entries
            .get(path)
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of cached transcripts.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
