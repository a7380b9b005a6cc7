//! Cache-backed replay of recorded transcripts.
//!
//! [`resolve`] picks a transcript path from the call parameters,
//! [`TranscriptCache`] fetches it once per process through a
//! [`TranscriptFetcher`], and the stream facade paces its events with the
//! playback scheduler.

mod cache;
mod fetch;
mod resolver;

pub use cache::TranscriptCache;
pub use fetch::{FsTranscriptFetcher, HttpTranscriptFetcher, TranscriptFetcher};
pub use resolver::{DEFAULT_RECORDING, ReplayParams, ReplayPath, ReplayPathKind, resolve};
