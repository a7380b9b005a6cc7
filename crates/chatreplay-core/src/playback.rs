//! Synthetic pacing for replayed transcripts.

use std::time::Duration;

use crate::abort::AbortSignal;
use crate::errors::Cancelled;
use crate::event::{DomainEvent, Role};

/// Wait before each streamed message token.
pub const MESSAGE_CHUNK_DELAY: Duration = Duration::from_millis(50);
/// Wait before a tool result, standing in for tool execution.
pub const TOOL_RESULT_LEAD: Duration = Duration::from_millis(500);
/// Wait after a tool result.
pub const TOOL_RESULT_SETTLE: Duration = Duration::from_millis(800);
/// Wait after a message typed by the user.
pub const USER_MESSAGE_SETTLE: Duration = Duration::from_millis(500);

/// Per-call playback settings. Owned by exactly one stream.
#[derive(Clone, Debug, Default)]
pub struct PlaybackConfig {
    /// Collapse every replay delay to zero.
    pub fast_forward: bool,
    /// Cooperative cancellation for the stream.
    pub abort: Option<AbortSignal>,
}

impl PlaybackConfig {
    pub fn fast_forward(mut self, fast_forward: bool) -> Self {
        self.fast_forward = fast_forward;
        self
    }

    pub fn abort_signal(mut self, signal: AbortSignal) -> Self {
        self.abort = Some(signal);
        self
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.abort.as_ref().is_some_and(AbortSignal::is_aborted)
    }
}

/// Delays surrounding one yielded event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pacing {
    /// Wait before the event is yielded.
    pub before: Duration,
    /// Wait after the event is yielded, before the next one is produced.
    pub after: Duration,
}

impl Pacing {
    pub const ZERO: Pacing = Pacing {
        before: Duration::ZERO,
        after: Duration::ZERO,
    };
}

/// Computes replay delays from event kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackScheduler {
    fast_forward: bool,
}

impl PlaybackScheduler {
    pub fn new(fast_forward: bool) -> Self {
        Self { fast_forward }
    }

    pub fn is_fast_forward(&self) -> bool {
        self.fast_forward
    }

    pub fn pacing(&self, event: &DomainEvent) -> Pacing {
        if self.fast_forward {
            return Pacing::ZERO;
        }
        match event {
            DomainEvent::MessageChunk(chunk) => Pacing {
                before: if chunk.finish_reason.is_none() {
                    MESSAGE_CHUNK_DELAY
                } else {
                    Duration::ZERO
                },
                after: if chunk.role == Role::User {
                    USER_MESSAGE_SETTLE
                } else {
                    Duration::ZERO
                },
            },
            DomainEvent::ToolCallResult(_) => Pacing {
                before: TOOL_RESULT_LEAD,
                after: TOOL_RESULT_SETTLE,
            },
            _ => Pacing::ZERO,
        }
    }
}

/// Suspends for `duration`, returning early with [`Cancelled`] if the abort
/// signal fires first (or has already fired).
pub async fn pause(duration: Duration, abort: Option<&AbortSignal>) -> Result<(), Cancelled> {
    if abort.is_some_and(AbortSignal::is_aborted) {
        return Err(Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }
    match abort {
        None => {
            tokio::time::sleep(duration).await;
            Ok(())
        }
        Some(signal) => tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = signal.aborted() => Err(Cancelled),
        },
    }
}
