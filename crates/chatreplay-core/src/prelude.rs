//! Common imports for typical usage.
pub use crate::{
    AbortHandle, ChatClient, ChatError, ChatParams, ChatStream, ClientConfig, DomainEvent,
    EventKind, PlaybackConfig, ReplayParams, StreamState,
};
