use crate::ports::{Evaluation, Generator, QuestionDraft, QuestionRequest, SessionSummary};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

/// `Generator` backed by an OpenAI-compatible HTTP API: JSON-mode chat
/// completions for question/evaluation/report generation, the audio
/// transcriptions endpoint for speech-to-text, and an image_url chat message
/// for vision description.
///
/// Every failure mode (transport error, empty choice list, unparseable JSON)
/// surfaces as an ordinary `Err`, which the orchestrator absorbs. Callers
/// needing bounded latency should configure a timeout on the underlying
/// `reqwest::Client`.
pub struct LlmGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    transcription_model: String,
    vision_model: String,
}

impl LlmGenerator {
    pub fn new(
        api_key: String,
        base_url: String,
        chat_model: String,
        transcription_model: String,
        vision_model: String,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            chat_model,
            transcription_model,
            vision_model,
        }
    }

    async fn chat(&self, model: &str, body: serde_json::Value) -> Result<String> {
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("chat completion request failed for model {model}"))?
            .error_for_status()?
            .json::<ChatResponse>()
            .await
            .context("failed to decode chat completion response")?;

        let content = resp
            .choices
            .first()
            .ok_or_else(|| anyhow!("no choices in chat completion response"))?
            .message
            .content
            .clone();
        Ok(content)
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("audio.webm")
            .mime_str("audio/webm")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.transcription_model.clone())
            .text("response_format", "text")
            .text("language", "en");

        let text = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("transcription request failed")?
            .error_for_status()?
            .text()
            .await
            .context("failed to read transcription response")?;
        Ok(text)
    }

    async fn describe_visual(&self, image: &[u8]) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let body = serde_json::json!({
            "model": self.vision_model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        {
                            "type": "text",
                            "text": "Describe the technical content of this screen accurately. \
                                     Identify any code, diagrams, or slide titles. Be concise."
                        },
                        {
                            "type": "image_url",
                            "image_url": { "url": format!("data:image/jpeg;base64,{encoded}") }
                        }
                    ]
                }
            ]
        });
        self.chat(&self.vision_model, body).await
    }

    async fn generate_question(&self, request: &QuestionRequest) -> Result<QuestionDraft> {
        let phase = request.phase.label();
        let system_prompt = format!(
            r#"You are an expert Technical Interviewer conducting a {phase} round.
Your goal is to ask a relevant question based on the candidate's presentation AND the provided Job Description.

Current Phase: {phase}
Phase Strategy:
- Introduction: Ask about their background and the project's inspiration.
- Project Walkthrough: Ask about the architecture, tech stack decisions, and flow.
- Technical Deep Dive: Ask hard technical questions about specific code/implementation details observed.
- Behavioral/HR: Ask about challenges faced, conflicts, and soft skills (aligned with JD).
- Closing: Ask if they have questions or summary thoughts.

Rules:
1. Keep the question short and conversational.
2. Focus strictly on the CURRENT PHASE strategy.
3. START with a brief 1-sentence acknowledgment of the candidate's last answer.
4. Output MUST be valid JSON with keys: "question_text", "difficulty" (Junior/Mid/Senior), "topic"."#
        );

        let context = &request.context;
        let jd = truncate(&context.job_description, 1000);
        let user_prompt = format!(
            r#"Job Description:
{jd}

Current Context:
- Recent Transcript: {transcript}
- Detected Keywords: {keywords}
- Slide Text: {slide}
- Topics: {topics}

Last Question Asked: {previous_question}
Candidate's Last Answer: {previous_answer}

Generate a {phase} question now.
IF a valid Candidate's Last Answer is provided, you MUST ask a follow-up question digging deeper into it."#,
            transcript = context.transcript_tail,
            keywords = context.keywords.join(", "),
            slide = truncate(&context.current_slide_text, 500),
            topics = context.topics.join(", "),
            previous_question = request.previous_question.as_deref().unwrap_or("None"),
            previous_answer = request.previous_answer.as_deref().unwrap_or("None"),
        );

        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.7
        });

        let content = self.chat(&self.chat_model, body).await?;
        let draft: QuestionDraft = serde_json::from_str(&content)
            .with_context(|| format!("question generator returned invalid JSON: {content}"))?;
        Ok(draft)
    }

    async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        context: &crate::context::ContextSnapshot,
    ) -> Result<Evaluation> {
        let system_prompt = r#"You are an expert Technical Interviewer.
Your goal is to evaluate the candidate's answer to a technical question.

Rules:
1. Score the answer from 1-10 based on Accuracy, Depth, and Clarity.
2. Identify key missing points.
3. Provide a brief "Better Answer" example.
4. Output MUST be valid JSON with keys: "score" (int), "feedback" (str), "missing_points" (list[str]), "better_answer" (str)."#;

        let user_prompt = format!(
            r#"Question: {question}

Candidate's Answer: {answer}

Context (What they were presenting):
- Tech Stack: {keywords}

Evaluate now."#,
            keywords = context.keywords.join(", "),
        );

        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.2
        });

        let content = self.chat(&self.chat_model, body).await?;
        let evaluation: Evaluation = serde_json::from_str(&content)
            .with_context(|| format!("evaluator returned invalid JSON: {content}"))?;
        Ok(evaluation)
    }

    async fn generate_report(&self, summary: &SessionSummary) -> Result<String> {
        let mut qa_history = String::new();
        let mut total_score: u32 = 0;
        for entry in &summary.history {
            qa_history.push_str(&format!(
                "Q: {}\nA: {}\nScore: {}/10\nFeedback: {}\n---\n",
                entry.question, entry.answer, entry.score, entry.feedback
            ));
            total_score += u32::from(entry.score);
        }
        let avg_score = if summary.history.is_empty() {
            0.0
        } else {
            f64::from(total_score) / summary.history.len() as f64
        };

        let system_prompt = r#"You are a Senior Technical Hiring Manager.
Your goal is to write a constructive Interview Feedback Report for a candidate.

Output Format: MARKDOWN
Structure:
# Interview Performance Report
## Executive Summary
(Pass/Fail/Training Needed)

## Scores
- **Technical Score**: (calculate based on Q&A)
- **Communication Score**: (assess based on transcript clarity)

## Key Topics Covered
(List detected topics)

## Detailed Feedback
(Analyze their answers. Highlight strengths and weaknesses.)

## Recommendations
(What exactly should they study next? Be specific.)"#;

        let user_prompt = format!(
            r#"Candidate Context:
- Detected Tech Stack: {keywords}
- Session Transcript Summary: {transcript}

Q&A History:
{qa_history}

Average Technical Score: {avg_score:.1}/10

Generate the report now."#,
            keywords = summary.keywords.join(", "),
            transcript = summary.transcript_tail,
        );

        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "temperature": 0.7
        });

        self.chat(&self.chat_model, body).await
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}... (truncated)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_text_alone() {
        assert_eq!(truncate("short", 100), "short");
    }

    #[test]
    fn truncate_cuts_on_char_boundaries() {
        let cut = truncate(&"é".repeat(20), 5);
        assert!(cut.starts_with(&"é".repeat(5)));
        assert!(cut.ends_with("(truncated)"));
    }
}
