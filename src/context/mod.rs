//! Context orchestration for a study turn.
//!
//! Decides which optional sources to consult, gathers them through
//! [`worker::WorkerPipeline`], and assembles the prompt sent to the chat model.

pub mod conversation;
pub mod fragment;
pub mod heuristic;
pub mod orchestrator;
pub mod prompt;
pub mod response_mode;
pub mod worker;
pub mod workers;

pub use conversation::{ConversationTurn, TurnRole};
pub use fragment::{ContextFragment, ContextSource};
pub use orchestrator::{
    ContextOrchestrator, FeaturesUsed, OrchestratorSettings, TurnFlags, TurnOutcome, TurnReply,
    TurnRequest,
};
pub use response_mode::ResponseMode;
