pub mod context;
pub mod events;
pub mod generator;
pub mod lexicon;
pub mod phase;
pub mod ports;
pub mod session;

pub use context::{ContextAccumulator, ContextSnapshot};
pub use events::{InboundEvent, OutboundEvent};
pub use lexicon::Lexicon;
pub use phase::{Phase, PhaseLimits};
pub use ports::Generator;
pub use session::{InterviewSession, InterviewState};
