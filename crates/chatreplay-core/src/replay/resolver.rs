/// Recording played when the caller names nothing more specific.
pub const DEFAULT_RECORDING: &str = "eiffel-tower-vs-tallest-building";

const FIRST_PLAN: &str = "first-plan";
const RE_PLAN: &str = "re-plan";
const FINAL_ANSWER: &str = "final-answer";

/// Replay indicators supplied by the calling context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplayParams {
    /// Named mock fixture, e.g. `first-plan`.
    pub fixture: Option<String>,
    /// Mock mode without a named fixture: the script follows interrupt feedback.
    pub mock: bool,
    /// Identifier of a recorded session.
    pub replay_id: Option<String>,
}

impl ReplayParams {
    pub fn fixture(name: impl Into<String>) -> Self {
        Self {
            fixture: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn mock() -> Self {
        Self {
            mock: true,
            ..Self::default()
        }
    }

    pub fn recording(replay_id: impl Into<String>) -> Self {
        Self {
            replay_id: Some(replay_id.into()),
            ..Self::default()
        }
    }

    /// Reads `mock` and `replay` from a URL query string.
    ///
    /// Returns `None` when neither is present, meaning the call should go live.
    pub fn from_query(query: &str) -> Option<Self> {
        let mut params = Self::default();
        let mut found = false;
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "mock" => {
                    found = true;
                    params.mock = true;
                    if !value.trim().is_empty() {
                        params.fixture = Some(value.into_owned());
                    }
                }
                "replay" => {
                    found = true;
                    if !value.trim().is_empty() {
                        params.replay_id = Some(value.into_owned());
                    }
                }
                _ => {}
            }
        }
        found.then_some(params)
    }
}

/// Where a resolved transcript comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayPathKind {
    /// Hand-written fixture under `mock/`. Always played fast-forward.
    Mock,
    /// Captured session under `replay/`.
    Recording,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayPath {
    pub path: String,
    pub kind: ReplayPathKind,
}

impl ReplayPath {
    fn mock(name: &str) -> Self {
        Self {
            path: format!("mock/{name}.txt"),
            kind: ReplayPathKind::Mock,
        }
    }

    fn recording(id: &str) -> Self {
        Self {
            path: format!("replay/{id}.txt"),
            kind: ReplayPathKind::Recording,
        }
    }
}

/// Chooses the transcript to replay.
///
/// Precedence: named fixture, then the feedback-driven mock script, then a
/// recording id, then [`DEFAULT_RECORDING`].
pub fn resolve(params: &ReplayParams, interrupt_feedback: Option<&str>) -> ReplayPath {
    if let Some(fixture) = non_empty(params.fixture.as_deref()) {
        return ReplayPath::mock(fixture);
    }
    if params.mock || interrupt_feedback.is_some() {
        let script = match interrupt_feedback {
            Some("accepted") => FINAL_ANSWER,
            Some("edit_plan") => RE_PLAN,
            _ => FIRST_PLAN,
        };
        return ReplayPath::mock(script);
    }
    if let Some(id) = non_empty(params.replay_id.as_deref()) {
        return ReplayPath::recording(id);
    }
    ReplayPath::recording(DEFAULT_RECORDING)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
