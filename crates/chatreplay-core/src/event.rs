//! Typed domain events and the per-frame normalizer.

use serde::{Deserialize, Serialize};

use crate::codec::Frame;
use crate::errors::PayloadError;

/// Author role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "human")]
    User,
    Assistant,
    Tool,
}

/// Why the producer stopped emitting a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Interrupt,
    #[serde(other)]
    Other,
}

/// Fields shared by the non-message events. All optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// Incremental text emitted by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageChunk {
    pub id: String,
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// A fully formed tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// A fragment of a tool invocation still being streamed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCallChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub args: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCalls {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub tool_call_chunks: Vec<ToolCallChunk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallChunks {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub tool_call_chunks: Vec<ToolCallChunk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub tool_call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One choice offered to the user when the workflow pauses for feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptOption {
    pub text: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interrupt {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub options: Vec<InterruptOption>,
}

/// A typed event decoded from one frame. The variant is the frame's event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    MessageChunk(MessageChunk),
    ToolCalls(ToolCalls),
    ToolCallChunks(ToolCallChunks),
    ToolCallResult(ToolCallResult),
    Interrupt(Interrupt),
}

/// Discriminant of a [`DomainEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MessageChunk,
    ToolCalls,
    ToolCallChunks,
    ToolCallResult,
    Interrupt,
}

impl EventKind {
    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageChunk => "message_chunk",
            Self::ToolCalls => "tool_calls",
            Self::ToolCallChunks => "tool_call_chunks",
            Self::ToolCallResult => "tool_call_result",
            Self::Interrupt => "interrupt",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MessageChunk(_) => EventKind::MessageChunk,
            Self::ToolCalls(_) => EventKind::ToolCalls,
            Self::ToolCallChunks(_) => EventKind::ToolCallChunks,
            Self::ToolCallResult(_) => EventKind::ToolCallResult,
            Self::Interrupt(_) => EventKind::Interrupt,
        }
    }

    fn meta(&self) -> Option<&EventMeta> {
        match self {
            Self::MessageChunk(_) => None,
            Self::ToolCalls(e) => Some(&e.meta),
            Self::ToolCallChunks(e) => Some(&e.meta),
            Self::ToolCallResult(e) => Some(&e.meta),
            Self::Interrupt(e) => Some(&e.meta),
        }
    }

    pub fn thread_id(&self) -> Option<&str> {
        match self {
            Self::MessageChunk(m) => Some(&m.thread_id),
            _ => self.meta().and_then(|m| m.thread_id.as_deref()),
        }
    }

    pub fn agent(&self) -> Option<&str> {
        match self {
            Self::MessageChunk(m) => m.agent.as_deref(),
            _ => self.meta().and_then(|m| m.agent.as_deref()),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Self::MessageChunk(m) => Some(m.role),
            _ => self.meta().and_then(|m| m.role),
        }
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        match self {
            Self::MessageChunk(m) => m.finish_reason,
            _ => self.meta().and_then(|m| m.finish_reason),
        }
    }

    /// True for a message chunk that closes its message.
    pub fn is_terminal_chunk(&self) -> bool {
        matches!(self, Self::MessageChunk(m) if m.finish_reason.is_some())
    }
}

/// Parses a frame's payload and validates it against the schema of its event
/// type.
pub fn normalize(frame: &Frame) -> Result<DomainEvent, PayloadError> {
    let value: serde_json::Value =
        serde_json::from_str(&frame.data).map_err(|e| PayloadError::InvalidJson {
            event: frame.event.clone(),
            message: e.to_string(),
        })?;
    let serde_json::Value::Object(mut object) = value else {
        return Err(PayloadError::NotAnObject {
            event: frame.event.clone(),
        });
    };
    object.insert(
        "type".to_string(),
        serde_json::Value::String(frame.event.clone()),
    );
    serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| PayloadError::Schema {
        event: frame.event.clone(),
        message: e.to_string(),
    })
}
