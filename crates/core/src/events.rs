use crate::ports::{Evaluation, QuestionDraft};
use crate::session::InterviewState;
use serde::{Deserialize, Serialize};

/// One inbound message = one event. The discriminator is carried in a
/// `"type"` field so unknown kinds fail to decode instead of being guessed at.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Base64-encoded audio chunk (optionally a data URL).
    Audio {
        payload: String,
        #[serde(default)]
        timestamp: Option<f64>,
    },
    /// Base64-encoded video frame (optionally a data URL).
    Video {
        payload: String,
        #[serde(default)]
        timestamp: Option<f64>,
    },
    JobDescription { payload: String },
    /// Explicit answer submission; without a payload the session's
    /// accumulated answer buffer is used.
    SubmitAnswer {
        #[serde(default)]
        payload: Option<String>,
    },
    TriggerQuestion,
    EndSession,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    StateUpdate {
        state: InterviewState,
    },
    Transcript {
        text: String,
        timestamp: Option<f64>,
    },
    VisualLog {
        text: String,
        description: String,
        timestamp: Option<f64>,
    },
    Question {
        payload: QuestionDraft,
    },
    Evaluation {
        payload: Evaluation,
    },
    Report {
        payload: String,
    },
}
