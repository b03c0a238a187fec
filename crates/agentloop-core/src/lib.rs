//! agentloop core library
//!
//! A bounded planner / reviewer / supervisor loop that turns free-text model
//! output into a tags-and-summary artifact.

pub mod config;
pub mod domain;
pub mod model;
pub mod obs;
pub mod ollama;
pub mod parser;
pub mod role_orchestration;
pub mod telemetry;

pub use config::LoopConfig;
pub use domain::{
    AgentState, LoopError, ModelError, ParseError, PlannerProposal, Result, ReviewerFeedback,
    StateUpdate, StepRecord,
};
pub use model::{ModelClient, ModelConfig, ScriptedModel};
pub use obs::{
    emit_route_decided, emit_run_failed, emit_run_finished, emit_run_started,
    emit_step_completed, run_span,
};
pub use ollama::OllamaClient;
pub use parser::{
    extract_first_json, BalancedJsonParser, FirstJsonParser, JsonObject, ResponseParser,
};
pub use role_orchestration::engine::{Engine, Phase, Run, DEFAULT_MAX_TURNS};
pub use role_orchestration::roles::{
    planner, planner_prompt, reviewer, supervisor, AgentRole, ReviewPolicy, SimulatedReviewer,
};
pub use role_orchestration::router::{route, RouteDecision};
pub use telemetry::{default_filter, init_tracing};

/// agentloop version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
