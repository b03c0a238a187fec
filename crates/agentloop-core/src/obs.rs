//! Structured observability hooks for loop runs.
//!
//! - [`run_span`] builds the span every step of a run executes inside
//! - `emit_*` functions record lifecycle events: start, step, route, finish, failure
//!
//! Events are emitted at `info!` (failures at `warn!`). Filter with `RUST_LOG`.

use tracing::{info, warn};
use uuid::Uuid;

use crate::role_orchestration::roles::AgentRole;
use crate::role_orchestration::router::RouteDecision;

/// Span tagged with the run id and task label.
///
/// The span is entered around each step rather than held for the whole run,
/// so it can be carried across `.await` points.
pub fn run_span(run_id: &Uuid, task: &str) -> tracing::Span {
    tracing::info_span!("agentloop.run", run_id = %run_id, task = %task)
}

/// Emit event: run started.
pub fn emit_run_started(run_id: &Uuid, task: &str) {
    info!(event = "run.started", run_id = %run_id, task = %task);
}

/// Emit event: a role finished and its update was applied.
pub fn emit_step_completed(run_id: &Uuid, role: AgentRole, turn_count: u32) {
    info!(event = "step.completed", run_id = %run_id, role = %role, turn_count = turn_count);
}

/// Emit event: the router chose the next role.
pub fn emit_route_decided(run_id: &Uuid, decision: RouteDecision, turn_count: u32) {
    info!(
        event = "route.decided",
        run_id = %run_id,
        decision = ?decision,
        turn_count = turn_count,
    );
}

/// Emit event: run reached the terminal state.
pub fn emit_run_finished(run_id: &Uuid, duration_ms: u64, total_steps: u64, turn_count: u32) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        total_steps = total_steps,
        turn_count = turn_count,
    );
}

/// Emit event: run aborted by a role error (warning level).
pub fn emit_run_failed(run_id: &Uuid, role: AgentRole, error: &dyn std::fmt::Display) {
    warn!(event = "run.failed", run_id = %run_id, role = %role, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let id = Uuid::new_v4();
        let span = run_span(&id, "generate-tags-and-summary");
        let _entered = span.enter();
    }
}
