/// A record that could not be split into its `event:` and `data:` lines.
///
/// Decode errors are never fatal: the record is dropped, logged, and decoding
/// continues with the next one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The first line is missing or does not start with `event:`.
    #[error("record has no `event:` line: {record:?}")]
    MissingEventLine { record: String },
    /// The second line is missing or does not start with `data:`.
    #[error("record `{event}` has no `data:` line")]
    MissingDataLine { event: String },
}

/// A frame whose `data:` payload could not be turned into a `DomainEvent`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The payload is not valid JSON.
    #[error("invalid JSON payload for `{event}`: {message}")]
    InvalidJson { event: String, message: String },
    /// The payload is valid JSON but not an object.
    #[error("payload for `{event}` is not a JSON object")]
    NotAnObject { event: String },
    /// The payload does not match the schema of its event type (or the event
    /// type is unknown).
    #[error("payload for `{event}` does not match its schema: {message}")]
    Schema { event: String, message: String },
}

impl PayloadError {
    /// Returns the event name of the rejected frame.
    pub fn event(&self) -> &str {
        match self {
            Self::InvalidJson { event, .. }
            | Self::NotAnObject { event }
            | Self::Schema { event, .. } => event,
        }
    }
}

/// Failure of the byte source feeding a stream (live request or transcript
/// fetch). Terminal for the current stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Connection or stream I/O failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    /// A transcript resource could not be fetched.
    #[error("failed to fetch transcript `{path}`: {message}")]
    Fetch { path: String, message: String },
    /// Local filesystem access failed.
    #[error("io error on `{path}`: {message}")]
    Io { path: String, message: String },
}

impl SourceError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub(crate) fn fetch(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The abort signal fired. Not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("stream cancelled")]
pub struct Cancelled;

/// Top-level error type for client construction and configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Source failure surfaced outside a stream.
    #[error(transparent)]
    Source(#[from] SourceError),
}
