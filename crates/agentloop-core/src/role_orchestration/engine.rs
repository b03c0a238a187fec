//! Step-by-step driver for the supervisor → planner → reviewer loop.
//!
//! The [`Engine`] holds the collaborators (model client, response parser,
//! review policy) and hands out a [`Run`] per initial state. A run is a lazy
//! sequence: each call to [`Run::next_step`] executes exactly one role, applies
//! its update and returns the [`StepRecord`]. Nothing executes ahead of the
//! consumer.

use std::sync::Arc;
use std::time::Instant;

use futures::Stream;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::error::{LoopError, Result};
use crate::domain::state::{AgentState, StateUpdate, StepRecord};
use crate::model::{ModelClient, ModelConfig};
use crate::obs;
use crate::parser::{FirstJsonParser, ResponseParser};
use crate::role_orchestration::roles::{
    planner, reviewer, supervisor, AgentRole, ReviewPolicy, SimulatedReviewer,
};
use crate::role_orchestration::router::{route, RouteDecision};

/// Planner rounds allowed before the engine gives up on the reviewer.
pub const DEFAULT_MAX_TURNS: u32 = 10;

/// Position of a run in the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Supervisor,
    Route,
    Planner,
    Reviewer,
    Terminal,
    Failed,
}

impl Phase {
    /// Pure transition function.
    ///
    /// `decision` is only consulted in [`Phase::Route`]; without one the run
    /// stays there. `Terminal` and `Failed` are absorbing.
    pub fn advance(self, decision: Option<RouteDecision>) -> Phase {
        match (self, decision) {
            (Phase::Start, _) => Phase::Supervisor,
            (Phase::Supervisor, _) => Phase::Route,
            (Phase::Route, Some(RouteDecision::Planner)) => Phase::Planner,
            (Phase::Route, Some(RouteDecision::End)) => Phase::Terminal,
            (Phase::Route, None) => Phase::Route,
            (Phase::Planner, _) => Phase::Reviewer,
            (Phase::Reviewer, _) => Phase::Supervisor,
            (Phase::Terminal, _) => Phase::Terminal,
            (Phase::Failed, _) => Phase::Failed,
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Phase::Terminal | Phase::Failed)
    }
}

/// Loop driver. Cheap to share; every [`Run`] borrows it.
pub struct Engine {
    model: Arc<dyn ModelClient>,
    model_config: ModelConfig,
    parser: Arc<dyn ResponseParser>,
    reviewer: Arc<dyn ReviewPolicy>,
    max_turns: u32,
}

impl Engine {
    /// Build an engine around a model client with the default parser,
    /// simulated reviewer and turn cap.
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            model_config: ModelConfig::default(),
            parser: Arc::new(FirstJsonParser),
            reviewer: Arc::new(SimulatedReviewer::default()),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_model_config(mut self, config: ModelConfig) -> Self {
        self.model_config = config;
        self
    }

    pub fn with_parser(mut self, parser: impl ResponseParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    pub fn with_reviewer(mut self, reviewer: impl ReviewPolicy + 'static) -> Self {
        self.reviewer = Arc::new(reviewer);
        self
    }

    /// Maximum planner rounds. Routing back to the planner once `turn_count`
    /// exceeds this fails the run with [`LoopError::TurnLimitExceeded`].
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    /// Begin a run over `state`. No role executes until the first
    /// [`Run::next_step`].
    pub fn start(&self, state: AgentState) -> Run<'_> {
        let run_id = Uuid::new_v4();
        let span = obs::run_span(&run_id, &state.task);
        Run {
            engine: self,
            state,
            phase: Phase::Start,
            run_id,
            span,
            steps: 0,
            started: Instant::now(),
        }
    }

    /// Drive a run to the end and return the final state.
    pub async fn run_to_completion(&self, state: AgentState) -> Result<AgentState> {
        let mut run = self.start(state);
        while let Some(step) = run.next_step().await {
            step?;
        }
        Ok(run.into_state())
    }
}

/// A single pass through the loop, consumed one step at a time.
pub struct Run<'e> {
    engine: &'e Engine,
    state: AgentState,
    phase: Phase,
    run_id: Uuid,
    span: tracing::Span,
    steps: u64,
    started: Instant,
}

impl<'e> Run<'e> {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn into_state(self) -> AgentState {
        self.state
    }

    /// Execute the next role and return what it wrote.
    ///
    /// Returns `None` once the run is terminal or has failed. A failing step
    /// leaves the state untouched and moves the run to [`Phase::Failed`].
    pub async fn next_step(&mut self) -> Option<Result<StepRecord>> {
        let span = self.span.clone();
        self.step().instrument(span).await
    }

    /// Adapt the run into a [`Stream`] of step results.
    pub fn into_stream(self) -> impl Stream<Item = Result<StepRecord>> + 'e {
        futures::stream::unfold(self, |mut run| async move {
            let item = run.next_step().await?;
            Some((item, run))
        })
    }

    async fn step(&mut self) -> Option<Result<StepRecord>> {
        loop {
            match self.phase {
                Phase::Start => {
                    obs::emit_run_started(&self.run_id, &self.state.task);
                    self.phase = self.phase.advance(None);
                }
                Phase::Supervisor => {
                    let update = supervisor(&self.state);
                    return Some(Ok(self.commit(AgentRole::Supervisor, update)));
                }
                Phase::Route => {
                    let decision = route(&self.state);
                    obs::emit_route_decided(&self.run_id, decision, self.state.turn_count);
                    if decision == RouteDecision::Planner
                        && self.state.turn_count > self.engine.max_turns
                    {
                        let err = LoopError::TurnLimitExceeded {
                            max_turns: self.engine.max_turns,
                        };
                        return Some(Err(self.fail(AgentRole::Supervisor, err)));
                    }
                    self.phase = self.phase.advance(Some(decision));
                    if self.phase == Phase::Terminal {
                        obs::emit_run_finished(
                            &self.run_id,
                            self.started.elapsed().as_millis() as u64,
                            self.steps,
                            self.state.turn_count,
                        );
                    }
                }
                Phase::Planner => {
                    let result = planner(
                        &self.state,
                        self.engine.model.as_ref(),
                        &self.engine.model_config,
                        self.engine.parser.as_ref(),
                    )
                    .await;
                    return Some(match result {
                        Ok(update) => Ok(self.commit(AgentRole::Planner, update)),
                        Err(err) => Err(self.fail(AgentRole::Planner, err)),
                    });
                }
                Phase::Reviewer => {
                    let update = reviewer(&self.state, self.engine.reviewer.as_ref());
                    return Some(Ok(self.commit(AgentRole::Reviewer, update)));
                }
                Phase::Terminal | Phase::Failed => return None,
            }
        }
    }

    fn commit(&mut self, role: AgentRole, update: StateUpdate) -> StepRecord {
        self.state.apply(update.clone());
        self.steps += 1;
        self.phase = self.phase.advance(None);
        obs::emit_step_completed(&self.run_id, role, self.state.turn_count);
        StepRecord { role, update }
    }

    fn fail(&mut self, role: AgentRole, err: LoopError) -> LoopError {
        self.phase = Phase::Failed;
        obs::emit_run_failed(&self.run_id, role, &err);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconditional_transitions() {
        assert_eq!(Phase::Start.advance(None), Phase::Supervisor);
        assert_eq!(Phase::Supervisor.advance(None), Phase::Route);
        assert_eq!(Phase::Planner.advance(None), Phase::Reviewer);
        assert_eq!(Phase::Reviewer.advance(None), Phase::Supervisor);
    }

    #[test]
    fn test_route_transitions_follow_decision() {
        assert_eq!(
            Phase::Route.advance(Some(RouteDecision::Planner)),
            Phase::Planner
        );
        assert_eq!(Phase::Route.advance(Some(RouteDecision::End)), Phase::Terminal);
        assert_eq!(Phase::Route.advance(None), Phase::Route);
    }

    #[test]
    fn test_terminal_and_failed_are_absorbing() {
        for decision in [None, Some(RouteDecision::Planner), Some(RouteDecision::End)] {
            assert_eq!(Phase::Terminal.advance(decision), Phase::Terminal);
            assert_eq!(Phase::Failed.advance(decision), Phase::Failed);
        }
        assert!(Phase::Terminal.is_finished());
        assert!(Phase::Failed.is_finished());
        assert!(!Phase::Route.is_finished());
    }

    #[test]
    fn test_start_does_not_execute_anything() {
        let model = Arc::new(crate::model::ScriptedModel::new(Vec::<String>::new()));
        let engine = Engine::new(model.clone());
        let run = engine.start(AgentState::new("t", "c"));
        assert_eq!(run.phase(), Phase::Start);
        assert_eq!(run.state().turn_count, 0);
        assert!(model.prompts().is_empty());
    }
}
