//! Chat event-stream consumer with a deterministic replay engine.
//!
//! A chat service streams `event:` / `data:` records separated by blank lines.
//! This crate decodes them into typed [`DomainEvent`]s and can serve the same
//! events from a recorded transcript instead of the network, paced the way
//! the original session arrived.
//!
//! ```no_run
//! use chatreplay_core::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ChatError> {
//! let client = ChatClient::from_env()?;
//! let (abort, signal) = AbortHandle::pair();
//!
//! let mut chat = client.stream(
//!     "How tall is the Eiffel Tower?",
//!     ChatParams::default().replay(ReplayParams::recording("eiffel-tower-vs-tallest-building")),
//!     PlaybackConfig::default().abort_signal(signal),
//! );
//! while let Some(event) = chat.next_event().await {
//!     if let DomainEvent::MessageChunk(chunk) = &event {
//!         print!("{}", chunk.content.as_deref().unwrap_or_default());
//!     }
//! }
//! # drop(abort);
//! # Ok(())
//! # }
//! ```

/// Cooperative cancellation.
pub mod abort;
/// Facade selecting the live or replay source.
pub mod client;
/// `event:` / `data:` record decoder.
pub mod codec;
/// Client configuration.
pub mod config;
/// Error types for every layer.
pub mod errors;
/// Typed domain events and the per-frame normalizer.
pub mod event;
/// Live HTTP source.
pub mod live;
/// Logging setup.
pub mod observability;
/// Replay pacing.
pub mod playback;
/// Common imports for typical usage.
pub mod prelude;
/// Transcript resolution, fetching and caching.
pub mod replay;
/// Live request body and call parameters.
pub mod request;
/// The per-call event stream state machine.
pub mod stream;

pub use abort::{AbortHandle, AbortSignal};
pub use client::{ChatClient, ChatClientBuilder};
pub use codec::{Frame, FrameDecoder, decode_frames};
pub use config::{ClientConfig, ReplaySource};
pub use errors::{Cancelled, ChatError, DecodeError, PayloadError, SourceError};
pub use event::{DomainEvent, EventKind, FinishReason, Role, normalize};
pub use live::{ChunkSource, ChunkStream, HttpChatSource};
pub use playback::{Pacing, PlaybackConfig, PlaybackScheduler};
pub use replay::{ReplayParams, ReplayPath, ReplayPathKind, TranscriptCache, TranscriptFetcher};
pub use request::{ChatParams, ChatRequest};
pub use stream::{ChatStream, StreamMode, StreamState};
