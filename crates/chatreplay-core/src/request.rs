use serde::Serialize;

use crate::replay::ReplayParams;

/// Per-call chat parameters.
///
/// Everything except `replay` is sent to the chat service on a live call.
/// `replay` is the calling context's replay indicator: when present the call
/// is served from a recorded transcript instead.
#[derive(Clone, Debug, Serialize)]
pub struct ChatParams {
    pub thread_id: String,
    pub auto_accepted_plan: bool,
    pub max_plan_iterations: u32,
    pub max_step_num: u32,
    pub max_search_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupt_feedback: Option<String>,
    pub enable_background_investigation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_settings: Option<serde_json::Value>,
    #[serde(skip)]
    pub replay: Option<ReplayParams>,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            thread_id: uuid::Uuid::new_v4().to_string(),
            auto_accepted_plan: false,
            max_plan_iterations: 1,
            max_step_num: 3,
            max_search_results: 3,
            interrupt_feedback: None,
            enable_background_investigation: true,
            report_style: None,
            mcp_settings: None,
            replay: None,
        }
    }
}

impl ChatParams {
    pub fn thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    pub fn interrupt_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.interrupt_feedback = Some(feedback.into());
        self
    }

    pub fn auto_accepted_plan(mut self, accepted: bool) -> Self {
        self.auto_accepted_plan = accepted;
        self
    }

    pub fn report_style(mut self, style: impl Into<String>) -> Self {
        self.report_style = Some(style.into());
        self
    }

    /// Serves this call from a recorded transcript.
    pub fn replay(mut self, replay: ReplayParams) -> Self {
        self.replay = Some(replay);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// JSON body of a live chat request.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub params: ChatParams,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, params: ChatParams) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: "user".into(),
                content: message.into(),
            }],
            params,
        }
    }
}
