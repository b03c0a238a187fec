//! Domain models for the orchestration loop.
//!
//! - `AgentState`: the record every role reads and writes
//! - `StateUpdate` / `StepRecord`: what a single step produces
//! - error taxonomy shared by the parser, model clients and engine

pub mod error;
pub mod state;

pub use error::{LoopError, ModelError, ParseError, Result};
pub use state::{AgentState, PlannerProposal, ReviewerFeedback, StateUpdate, StepRecord};
