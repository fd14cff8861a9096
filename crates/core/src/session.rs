use crate::context::ContextAccumulator;
use crate::events::{InboundEvent, OutboundEvent};
use crate::lexicon::Lexicon;
use crate::phase::{self, Phase, PhaseLimits};
use crate::ports::{Generator, HistoryEntry, QuestionDraft, QuestionRequest, SessionSummary};
use anyhow::{Context, Result};
use base64::Engine;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Opening line sent when the job description arrives. Counts as the first
/// Introduction question and bypasses question generation entirely.
pub const GREETING: &str = "System checks complete. Audio and Video streams are active. \
I have reviewed the job description. Let's begin the interview. \
Please start by introducing yourself and your project.";

/// Spoken phrases that submit the accumulated answer buffer.
pub const TRIGGER_PHRASES: &[&str] =
    &["done with", "next question", "finished answer", "that's my answer"];

/// Every Nth video frame is forwarded to the vision describer.
const VISION_SAMPLE_INTERVAL: u64 = 3;
/// Every Nth video frame, while monitoring, checks whether there is enough
/// context to ask a question.
const READINESS_CHECK_INTERVAL: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewState {
    Monitoring,
    Questioning,
    AwaitingAnswer,
    Evaluating,
}

/// Per-connection interview orchestrator. Consumes inbound events one at a
/// time, folds signal into the context accumulator, drives the generation
/// ports, and emits outbound events on the provided channel.
///
/// Events synthesized internally (the voice-trigger auto-submit) go through
/// the same queue as caller events, so one event is always fully processed
/// before the next begins. There is no terminal state; the session runs
/// until the connection drops.
pub struct InterviewSession {
    pub state: InterviewState,
    pub phase_index: usize,
    pub questions_asked_in_phase: u32,
    pub last_asked_question: String,
    pub answer_buffer: String,
    pub history: Vec<HistoryEntry>,
    pub frame_counter: u64,
    context: ContextAccumulator,
    phase_limits: PhaseLimits,
    pending: VecDeque<InboundEvent>,
}

impl InterviewSession {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self::with_limits(lexicon, PhaseLimits::default())
    }

    pub fn with_limits(lexicon: Arc<Lexicon>, phase_limits: PhaseLimits) -> Self {
        Self {
            state: InterviewState::Monitoring,
            phase_index: 0,
            questions_asked_in_phase: 0,
            last_asked_question: String::new(),
            answer_buffer: String::new(),
            history: Vec::new(),
            frame_counter: 0,
            context: ContextAccumulator::new(lexicon),
            phase_limits,
            pending: VecDeque::new(),
        }
    }

    pub fn current_phase(&self) -> Phase {
        Phase::from_index(self.phase_index)
    }

    /// Processes one inbound event, plus any events it synthesizes, to
    /// completion. Errors surfacing here are channel failures or internal
    /// faults; the caller logs them and keeps the session in its last-known
    /// state.
    pub async fn process<G: Generator + Send + Sync>(
        &mut self,
        generator: &G,
        event: InboundEvent,
        outbound: &mpsc::Sender<OutboundEvent>,
    ) -> Result<()> {
        self.pending.push_back(event);
        while let Some(event) = self.pending.pop_front() {
            self.handle(generator, event, outbound).await?;
        }
        Ok(())
    }

    async fn handle<G: Generator + Send + Sync>(
        &mut self,
        generator: &G,
        event: InboundEvent,
        outbound: &mpsc::Sender<OutboundEvent>,
    ) -> Result<()> {
        match event {
            InboundEvent::Audio { payload, timestamp } => {
                self.handle_audio(generator, &payload, timestamp, outbound).await
            }
            InboundEvent::Video { payload, timestamp } => {
                self.handle_video(generator, &payload, timestamp, outbound).await
            }
            InboundEvent::JobDescription { payload } => {
                self.handle_job_description(&payload, outbound).await
            }
            InboundEvent::SubmitAnswer { payload } => {
                self.handle_submit_answer(generator, payload, outbound).await
            }
            InboundEvent::TriggerQuestion => {
                self.transition_to(InterviewState::Questioning, outbound).await?;
                self.issue_question(generator, outbound).await
            }
            InboundEvent::EndSession => self.handle_end_session(generator, outbound).await,
        }
    }

    async fn handle_audio<G: Generator + Send + Sync>(
        &mut self,
        generator: &G,
        payload: &str,
        timestamp: Option<f64>,
        outbound: &mpsc::Sender<OutboundEvent>,
    ) -> Result<()> {
        let Some(audio) = decode_media_payload(payload) else {
            return Ok(());
        };

        let text = match generator.transcribe(&audio).await {
            Ok(text) => text,
            Err(e) => {
                // Transcription failure degrades to a no-op for this chunk.
                tracing::warn!(error = %e, "transcription failed");
                return Ok(());
            }
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        self.context.ingest_transcript(text);

        if self.state == InterviewState::AwaitingAnswer {
            if !self.answer_buffer.is_empty() {
                self.answer_buffer.push(' ');
            }
            self.answer_buffer.push_str(text);
        }

        outbound
            .send(OutboundEvent::Transcript { text: text.to_string(), timestamp })
            .await
            .context("failed to emit transcript event")?;

        let lowered = text.to_lowercase();
        if TRIGGER_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
            tracing::info!("voice trigger detected, submitting answer buffer");
            self.pending.push_back(InboundEvent::SubmitAnswer {
                payload: Some(self.answer_buffer.clone()),
            });
        }
        Ok(())
    }

    async fn handle_video<G: Generator + Send + Sync>(
        &mut self,
        generator: &G,
        payload: &str,
        timestamp: Option<f64>,
        outbound: &mpsc::Sender<OutboundEvent>,
    ) -> Result<()> {
        self.frame_counter += 1;

        if self.frame_counter % VISION_SAMPLE_INTERVAL == 0 {
            if let Some(frame) = decode_media_payload(payload) {
                match generator.describe_visual(&frame).await {
                    Ok(description) if !description.trim().is_empty() => {
                        let description = description.trim().to_string();
                        self.context.ingest_visual(&description);
                        outbound
                            .send(OutboundEvent::VisualLog {
                                text: format!("Visual context: {}", truncate(&description, 100)),
                                description,
                                timestamp,
                            })
                            .await
                            .context("failed to emit visual_log event")?;
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "vision description failed"),
                }
            }
        }

        // Readiness check runs on its own cadence, independent of sampling.
        if self.state == InterviewState::Monitoring
            && self.frame_counter % READINESS_CHECK_INTERVAL == 0
            && self.context.snapshot().has_signal()
        {
            self.transition_to(InterviewState::Questioning, outbound).await?;
            self.issue_question(generator, outbound).await?;
        }
        Ok(())
    }

    /// Requests a question from the generator. On a well-formed draft the
    /// session moves to `AwaitingAnswer`; any failure abandons the attempt
    /// and falls back to `Monitoring`. Not retried.
    async fn issue_question<G: Generator + Send + Sync>(
        &mut self,
        generator: &G,
        outbound: &mpsc::Sender<OutboundEvent>,
    ) -> Result<()> {
        let last = self.history.last();
        let request = QuestionRequest {
            phase: self.current_phase(),
            context: self.context.snapshot(),
            previous_question: last.map(|h| h.question.clone()),
            previous_answer: last.map(|h| h.answer.clone()),
        };

        match generator.generate_question(&request).await {
            Ok(draft) if draft.is_well_formed() => {
                self.questions_asked_in_phase += 1;
                self.last_asked_question = draft.question_text.clone();
                self.answer_buffer.clear();
                outbound
                    .send(OutboundEvent::Question { payload: draft })
                    .await
                    .context("failed to emit question event")?;
                self.transition_to(InterviewState::AwaitingAnswer, outbound).await
            }
            Ok(_) => {
                tracing::warn!("question generator returned a malformed draft");
                self.transition_to(InterviewState::Monitoring, outbound).await
            }
            Err(e) => {
                tracing::warn!(error = %e, "question generation failed");
                self.transition_to(InterviewState::Monitoring, outbound).await
            }
        }
    }

    async fn handle_job_description(
        &mut self,
        text: &str,
        outbound: &mpsc::Sender<OutboundEvent>,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.context.set_job_description(text);

        // The greeting is the first Introduction question.
        self.phase_index = 0;
        self.questions_asked_in_phase = 1;
        self.last_asked_question = GREETING.to_string();
        self.answer_buffer.clear();
        self.transition_to(InterviewState::AwaitingAnswer, outbound).await?;

        outbound
            .send(OutboundEvent::Question {
                payload: QuestionDraft {
                    question_text: GREETING.to_string(),
                    difficulty: "Intro".to_string(),
                    topic: "Introduction".to_string(),
                },
            })
            .await
            .context("failed to emit greeting question event")?;
        Ok(())
    }

    async fn handle_submit_answer<G: Generator + Send + Sync>(
        &mut self,
        generator: &G,
        payload: Option<String>,
        outbound: &mpsc::Sender<OutboundEvent>,
    ) -> Result<()> {
        if self.state != InterviewState::AwaitingAnswer || self.last_asked_question.is_empty() {
            // Protocol misuse, not an error.
            tracing::debug!(state = ?self.state, "ignoring submit_answer");
            return Ok(());
        }

        self.transition_to(InterviewState::Evaluating, outbound).await?;

        let answer = payload
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.answer_buffer.clone());

        match generator
            .evaluate_answer(&self.last_asked_question, &answer, &self.context.snapshot())
            .await
        {
            Ok(evaluation) => {
                self.history.push(HistoryEntry {
                    question: self.last_asked_question.clone(),
                    answer,
                    score: evaluation.score,
                    feedback: evaluation.feedback.clone(),
                });
                outbound
                    .send(OutboundEvent::Evaluation { payload: evaluation })
                    .await
                    .context("failed to emit evaluation event")?;
            }
            Err(e) => tracing::warn!(error = %e, "answer evaluation failed"),
        }

        // The planner is consulted whether or not evaluation succeeded.
        let decision =
            phase::advance(self.phase_index, self.questions_asked_in_phase, &self.phase_limits);
        if decision.advanced {
            tracing::info!(phase = Phase::from_index(decision.phase_index).label(), "advancing phase");
        }
        self.phase_index = decision.phase_index;
        self.questions_asked_in_phase = decision.questions_asked;

        self.transition_to(InterviewState::Monitoring, outbound).await
    }

    async fn handle_end_session<G: Generator + Send + Sync>(
        &mut self,
        generator: &G,
        outbound: &mpsc::Sender<OutboundEvent>,
    ) -> Result<()> {
        let snapshot = self.context.snapshot();
        let summary = SessionSummary {
            transcript_tail: snapshot.transcript_tail,
            keywords: snapshot.keywords,
            history: self.history.clone(),
        };

        match generator.generate_report(&summary).await {
            Ok(report) if !report.trim().is_empty() => {
                outbound
                    .send(OutboundEvent::Report { payload: report })
                    .await
                    .context("failed to emit report event")?;
            }
            Ok(_) => tracing::warn!("report generation returned empty text"),
            Err(e) => tracing::warn!(error = %e, "report generation failed"),
        }
        Ok(())
    }

    async fn transition_to(
        &mut self,
        new_state: InterviewState,
        outbound: &mpsc::Sender<OutboundEvent>,
    ) -> Result<()> {
        tracing::info!(from = ?self.state, to = ?new_state, "state transition");
        self.state = new_state;
        outbound
            .send(OutboundEvent::StateUpdate { state: new_state })
            .await
            .context("failed to emit state_update event")
    }
}

/// Decodes a base64 media payload, tolerating a `data:...;base64,` prefix.
/// Undecodable payloads are malformed input: logged and dropped.
fn decode_media_payload(payload: &str) -> Option<Vec<u8>> {
    let encoded = match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    };
    match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable media payload");
            None
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
