use serde::Serialize;
use std::collections::HashMap;

/// The five fixed interview stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Introduction,
    ProjectWalkthrough,
    TechnicalDeepDive,
    BehavioralHr,
    Closing,
}

pub const PHASES: [Phase; 5] = [
    Phase::Introduction,
    Phase::ProjectWalkthrough,
    Phase::TechnicalDeepDive,
    Phase::BehavioralHr,
    Phase::Closing,
];

/// Limit applied when a custom limits table has no entry for a phase.
const DEFAULT_PHASE_LIMIT: u32 = 2;

impl Phase {
    /// Saturates at the last phase; indexes never wrap.
    pub fn from_index(index: usize) -> Phase {
        PHASES[index.min(PHASES.len() - 1)]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Introduction => "Introduction",
            Phase::ProjectWalkthrough => "Project Walkthrough",
            Phase::TechnicalDeepDive => "Technical Deep Dive",
            Phase::BehavioralHr => "Behavioral/HR",
            Phase::Closing => "Closing",
        }
    }
}

/// Per-phase question caps.
#[derive(Debug, Clone)]
pub struct PhaseLimits {
    limits: HashMap<Phase, u32>,
}

impl Default for PhaseLimits {
    fn default() -> Self {
        Self {
            limits: HashMap::from([
                (Phase::Introduction, 1),
                (Phase::ProjectWalkthrough, 2),
                (Phase::TechnicalDeepDive, 3),
                (Phase::BehavioralHr, 2),
                (Phase::Closing, 1),
            ]),
        }
    }
}

impl PhaseLimits {
    pub fn new(limits: HashMap<Phase, u32>) -> Self {
        Self { limits }
    }

    pub fn limit(&self, phase: Phase) -> u32 {
        self.limits.get(&phase).copied().unwrap_or(DEFAULT_PHASE_LIMIT)
    }
}

/// Outcome of consulting the planner after an evaluated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDecision {
    pub phase_index: usize,
    pub questions_asked: u32,
    pub advanced: bool,
}

/// Pure advancement rule: once the current phase's cap is reached, move to
/// the next phase and reset the counter. Reaching the cap of the final phase
/// is a no-op; the planner never ends the interview.
pub fn advance(phase_index: usize, questions_asked: u32, limits: &PhaseLimits) -> PhaseDecision {
    let phase = Phase::from_index(phase_index);
    if questions_asked >= limits.limit(phase) && phase_index < PHASES.len() - 1 {
        PhaseDecision {
            phase_index: phase_index + 1,
            questions_asked: 0,
            advanced: true,
        }
    } else {
        PhaseDecision {
            phase_index: phase_index.min(PHASES.len() - 1),
            questions_asked,
            advanced: false,
        }
    }
}
