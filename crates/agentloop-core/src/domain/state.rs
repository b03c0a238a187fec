//! Shared loop state and the partial updates roles produce.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::role_orchestration::roles::AgentRole;

/// Structured artifact produced by the planner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannerProposal {
    /// Lowercase topical tags.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Short summary. The ~25 word limit is requested in the prompt, not enforced.
    #[serde(default)]
    pub summary: String,
}

/// Reviewer judgment on the latest proposal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewerFeedback {
    pub has_issue: bool,
    pub reason: String,
}

/// The record threaded through every step of a loop run.
///
/// `title`, `content`, `email`, `strict` and `task` are fixed at construction.
/// The remaining fields are written by exactly one role each.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentState {
    pub title: String,
    pub content: String,
    pub email: String,
    pub strict: bool,
    pub task: String,

    /// Latest planner output; `None` until the planner has run once.
    pub planner_proposal: Option<PlannerProposal>,

    /// Latest reviewer output; `None` until the reviewer has run once.
    pub reviewer_feedback: Option<ReviewerFeedback>,

    /// Number of supervisor visits so far.
    pub turn_count: u32,
}

impl AgentState {
    /// Create a zeroed state for the given context.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            email: String::new(),
            strict: false,
            task: String::new(),
            planner_proposal: None,
            reviewer_feedback: None,
            turn_count: 0,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    /// Merge a partial update into the state.
    pub fn apply(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::TurnCount(n) => self.turn_count = n,
            StateUpdate::PlannerProposal(p) => self.planner_proposal = Some(p),
            StateUpdate::ReviewerFeedback(f) => self.reviewer_feedback = Some(f),
        }
    }
}

/// A partial state update produced by a single role step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StateUpdate {
    TurnCount(u32),
    PlannerProposal(PlannerProposal),
    ReviewerFeedback(ReviewerFeedback),
}

/// Observable result of one engine step: which role ran and what it wrote.
///
/// Serialises as `{"<role>": {"<field>": <value>}}`, e.g.
/// `{"supervisor": {"turn_count": 1}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub role: AgentRole,
    pub update: StateUpdate,
}

impl Serialize for StepRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.role, &self.update)?;
        map.end()
    }
}
