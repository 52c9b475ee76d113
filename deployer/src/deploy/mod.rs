//! Stack deployment

pub mod artifacts;
pub mod bundle;
pub mod confirm;
pub mod fsm;
pub mod orchestrator;

pub use orchestrator::{Operation, OperationOutcome, StackOrchestrator};
