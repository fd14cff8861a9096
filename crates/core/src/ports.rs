use crate::context::ContextSnapshot;
use crate::phase::Phase;
use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

/// A generated question. `question_text` is the only field the orchestrator
/// relies on; an empty one marks the draft as malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub question_text: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub topic: String,
}

impl QuestionDraft {
    pub fn is_well_formed(&self) -> bool {
        !self.question_text.trim().is_empty()
    }
}

/// Scored evaluation of one answer. `score` and `feedback` are required;
/// their absence in a port response is a port failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: u8,
    pub feedback: String,
    #[serde(default)]
    pub missing_points: Vec<String>,
    #[serde(default)]
    pub better_answer: String,
}

/// One completed question/answer/evaluation exchange.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
    pub score: u8,
    pub feedback: String,
}

/// Everything question generation gets to see: the context snapshot plus the
/// current phase and the previous exchange for continuity.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionRequest {
    pub phase: Phase,
    pub context: ContextSnapshot,
    pub previous_question: Option<String>,
    pub previous_answer: Option<String>,
}

/// Input to report generation at end of session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub transcript_tail: String,
    pub keywords: Vec<String>,
    pub history: Vec<HistoryEntry>,
}

// The `Generator` trait is the seam between the orchestrator and the slow,
// fallible external models. Every method may fail or come back empty; the
// orchestrator treats both the same way and never lets either end a session.
// Mocked with `mockall` in tests so state-machine behavior can be exercised
// without network calls.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait Generator {
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;

    async fn describe_visual(&self, image: &[u8]) -> Result<String>;

    async fn generate_question(&self, request: &QuestionRequest) -> Result<QuestionDraft>;

    async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        context: &ContextSnapshot,
    ) -> Result<Evaluation>;

    async fn generate_report(&self, summary: &SessionSummary) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_question_text_is_malformed() {
        let draft = QuestionDraft {
            question_text: "   ".into(),
            difficulty: "Mid".into(),
            topic: "React".into(),
        };
        assert!(!draft.is_well_formed());
    }

    #[test]
    fn evaluation_requires_score_and_feedback() {
        let missing_score = r#"{"feedback":"solid"}"#;
        assert!(serde_json::from_str::<Evaluation>(missing_score).is_err());

        let full = r#"{"score":7,"feedback":"solid","missing_points":["latency"],"better_answer":"..."}"#;
        let eval: Evaluation = serde_json::from_str(full).unwrap();
        assert_eq!(eval.score, 7);
        assert_eq!(eval.missing_points, vec!["latency".to_string()]);
    }
}
