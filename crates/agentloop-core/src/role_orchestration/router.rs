//! Routing decision taken after every supervisor step.

use serde::{Deserialize, Serialize};

use crate::domain::state::AgentState;

/// Where the loop goes after the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    Planner,
    End,
}

/// Decide whether to plan again or stop.
///
/// Reads only the proposal and the feedback. Plans when nothing has been
/// proposed yet or the reviewer reported an issue; ends otherwise.
pub fn route(state: &AgentState) -> RouteDecision {
    if state.planner_proposal.is_none() {
        return RouteDecision::Planner;
    }
    match &state.reviewer_feedback {
        Some(feedback) if feedback.has_issue => RouteDecision::Planner,
        _ => RouteDecision::End,
    }
}
