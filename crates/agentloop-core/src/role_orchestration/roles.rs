//! The three loop roles: planner, reviewer and supervisor.
//!
//! Each role reads the shared [`AgentState`] and returns a single
//! [`StateUpdate`]; none of them mutate the state directly.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::error::{LoopError, Result};
use crate::domain::state::{AgentState, PlannerProposal, ReviewerFeedback, StateUpdate};
use crate::model::{ModelClient, ModelConfig};
use crate::parser::ResponseParser;

/// The roles that take part in the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Supervisor,
    Planner,
    Reviewer,
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentRole::Supervisor => "supervisor",
            AgentRole::Planner => "planner",
            AgentRole::Reviewer => "reviewer",
        };
        write!(f, "{s}")
    }
}

/// Prompt asking for three lowercase tags and a short summary as JSON.
pub fn planner_prompt(state: &AgentState) -> String {
    format!(
        "Title: {title}\n\
         Content: {content}\n\
         Return JSON with 3 lowercase topical tags and a summary under 25 words:\n\
         {{\"tags\": [...], \"summary\": \"...\"}}\n",
        title = state.title,
        content = state.content,
    )
}

/// Ask the model for a proposal and parse it out of the reply.
///
/// One model call per invocation. Parse and shape failures are returned as-is;
/// there is no retry and no fallback proposal.
#[instrument(skip_all, fields(turn = state.turn_count))]
pub async fn planner(
    state: &AgentState,
    model: &dyn ModelClient,
    model_config: &ModelConfig,
    parser: &dyn ResponseParser,
) -> Result<StateUpdate> {
    let prompt = planner_prompt(state);
    let raw = model.generate(&prompt, model_config).await?;
    let object = parser.parse(raw.trim())?;
    let proposal: PlannerProposal = serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| LoopError::InvalidProposal(e.to_string()))?;
    debug!(tags = ?proposal.tags, "planner produced proposal");
    Ok(StateUpdate::PlannerProposal(proposal))
}

/// Quality check run on each proposal.
///
/// The reviewer is the only source of the "needs revision" signal, so an
/// implementation must eventually clear `has_issue` for the loop to end.
pub trait ReviewPolicy: Send + Sync {
    fn review(&self, state: &AgentState) -> ReviewerFeedback;
}

/// Turn-based stand-in for a real review: flags an issue on every turn before
/// `approve_from_turn`, then approves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedReviewer {
    pub approve_from_turn: u32,
}

impl Default for SimulatedReviewer {
    fn default() -> Self {
        Self {
            approve_from_turn: 3,
        }
    }
}

impl ReviewPolicy for SimulatedReviewer {
    fn review(&self, state: &AgentState) -> ReviewerFeedback {
        if state.turn_count < self.approve_from_turn {
            ReviewerFeedback {
                has_issue: true,
                reason: format!(
                    "Simulated issue at turn {} for correction loop testing.",
                    state.turn_count
                ),
            }
        } else {
            ReviewerFeedback {
                has_issue: false,
                reason: "No issues detected after revision.".to_string(),
            }
        }
    }
}

pub fn reviewer(state: &AgentState, policy: &dyn ReviewPolicy) -> StateUpdate {
    StateUpdate::ReviewerFeedback(policy.review(state))
}

/// Count one more supervisor visit. Saturates at `u32::MAX`; the engine's
/// turn cap ends any run long before that.
pub fn supervisor(state: &AgentState) -> StateUpdate {
    StateUpdate::TurnCount(state.turn_count.saturating_add(1))
}
