use crate::lexicon::Lexicon;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Upper bound on the retained transcript tail, in characters. Keeps prompt
/// context small without dropping the most recent speech.
pub const TRANSCRIPT_TAIL_CHARS: usize = 1000;

/// A first line shorter than this is taken as a slide-title candidate.
const TOPIC_TITLE_MAX_CHARS: usize = 50;

/// Folds noisy transcript and visual-description text into a bounded summary
/// used to prompt question and evaluation generation. One per session.
///
/// Keywords and topics only ever grow; re-ingesting identical text leaves
/// them unchanged.
pub struct ContextAccumulator {
    lexicon: Arc<Lexicon>,
    transcript_tail: String,
    keywords: BTreeSet<String>,
    current_slide_text: String,
    topics: BTreeSet<String>,
    job_description: String,
}

/// Immutable point-in-time copy of the accumulated context, safe to hand to
/// generation calls while the accumulator keeps mutating.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContextSnapshot {
    pub transcript_tail: String,
    pub keywords: Vec<String>,
    pub current_slide_text: String,
    pub topics: Vec<String>,
    pub job_description: String,
}

impl ContextSnapshot {
    /// Readiness heuristic: any audible or visible signal at all.
    pub fn has_signal(&self) -> bool {
        !self.keywords.is_empty()
            || !self.transcript_tail.is_empty()
            || !self.current_slide_text.is_empty()
    }
}

impl ContextAccumulator {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            lexicon,
            transcript_tail: String::new(),
            keywords: BTreeSet::new(),
            current_slide_text: String::new(),
            topics: BTreeSet::new(),
            job_description: String::new(),
        }
    }

    /// Appends a transcript segment to the bounded tail and scans it for
    /// lexicon terms. Empty input is a valid no-op.
    pub fn ingest_transcript(&mut self, text: &str) {
        if !text.is_empty() {
            if !self.transcript_tail.is_empty() {
                self.transcript_tail.push(' ');
            }
            self.transcript_tail.push_str(text);
            self.truncate_tail();
        }
        self.scan_keywords(text);
    }

    /// Replaces the current slide text, scans it for lexicon terms, and
    /// records a short first line as a topic candidate. A heuristic, not a
    /// classifier.
    pub fn ingest_visual(&mut self, text: &str) {
        self.current_slide_text = text.to_string();
        self.scan_keywords(text);

        if let Some(first_line) = text.lines().map(str::trim).find(|l| !l.is_empty()) {
            if first_line.chars().count() < TOPIC_TITLE_MAX_CHARS {
                if self.topics.insert(first_line.to_string()) {
                    tracing::info!(topic = first_line, "detected topic candidate");
                }
            }
        }
    }

    /// Stores the job description verbatim, overwriting any prior value.
    pub fn set_job_description(&mut self, text: &str) {
        self.job_description = text.to_string();
        tracing::info!(chars = text.len(), "job description set");
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            transcript_tail: self.transcript_tail.clone(),
            keywords: self.keywords.iter().cloned().collect(),
            current_slide_text: self.current_slide_text.clone(),
            topics: self.topics.iter().cloned().collect(),
            job_description: self.job_description.clone(),
        }
    }

    fn scan_keywords(&mut self, text: &str) {
        for term in self.lexicon.find_mentions(text) {
            if !self.keywords.contains(term) {
                tracing::info!(keyword = term, "detected keyword");
                self.keywords.insert(term.to_string());
            }
        }
    }

    fn truncate_tail(&mut self) {
        let len = self.transcript_tail.chars().count();
        if len > TRANSCRIPT_TAIL_CHARS {
            self.transcript_tail = self
                .transcript_tail
                .chars()
                .skip(len - TRANSCRIPT_TAIL_CHARS)
                .collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulator() -> ContextAccumulator {
        ContextAccumulator::new(Lexicon::shared())
    }

    #[test]
    fn transcript_keywords_are_detected() {
        let mut ctx = accumulator();
        ctx.ingest_transcript("I use Python and FastAPI");
        let snap = ctx.snapshot();
        assert!(snap.keywords.contains(&"python".to_string()));
        assert!(snap.keywords.contains(&"fastapi".to_string()));
        assert_eq!(snap.transcript_tail, "I use Python and FastAPI");
    }

    #[test]
    fn repeated_ingest_is_idempotent_for_keywords() {
        let mut ctx = accumulator();
        ctx.ingest_transcript("We deployed it on AWS with Docker");
        let once = ctx.snapshot().keywords;
        ctx.ingest_transcript("We deployed it on AWS with Docker");
        assert_eq!(once, ctx.snapshot().keywords);
    }

    #[test]
    fn visual_ingest_extracts_title_and_keywords() {
        let mut ctx = accumulator();
        ctx.ingest_visual("Architecture Diagram\nUsing React and AWS");
        let snap = ctx.snapshot();
        assert!(snap.keywords.contains(&"react".to_string()));
        assert!(snap.keywords.contains(&"aws".to_string()));
        assert!(snap.topics.contains(&"Architecture Diagram".to_string()));
        assert_eq!(snap.current_slide_text, "Architecture Diagram\nUsing React and AWS");
    }

    #[test]
    fn long_first_line_is_not_a_topic() {
        let mut ctx = accumulator();
        let line = "x".repeat(60);
        ctx.ingest_visual(&line);
        assert!(ctx.snapshot().topics.is_empty());
    }

    #[test]
    fn slide_text_is_overwritten_not_accumulated() {
        let mut ctx = accumulator();
        ctx.ingest_visual("Slide One");
        ctx.ingest_visual("Slide Two");
        assert_eq!(ctx.snapshot().current_slide_text, "Slide Two");
    }

    #[test]
    fn transcript_tail_is_bounded() {
        let mut ctx = accumulator();
        for _ in 0..50 {
            ctx.ingest_transcript(&"a".repeat(100));
        }
        assert_eq!(ctx.snapshot().transcript_tail.chars().count(), TRANSCRIPT_TAIL_CHARS);
    }

    #[test]
    fn job_description_overwrites() {
        let mut ctx = accumulator();
        ctx.set_job_description("first");
        ctx.set_job_description("second");
        assert_eq!(ctx.snapshot().job_description, "second");
    }

    #[test]
    fn empty_context_has_no_signal() {
        let ctx = accumulator();
        assert!(!ctx.snapshot().has_signal());
    }

    #[test]
    fn transcript_alone_is_signal() {
        let mut ctx = accumulator();
        ctx.ingest_transcript("hello there");
        assert!(ctx.snapshot().has_signal());
    }
}
