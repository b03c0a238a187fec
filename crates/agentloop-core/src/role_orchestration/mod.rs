//! Planner / reviewer / supervisor orchestration.
//!
//! # Module layout
//!
//! - [`roles`] — `AgentRole`, the three role functions, `ReviewPolicy`
//! - [`router`] — `route`, `RouteDecision`
//! - [`engine`] — `Engine`, `Run`, `Phase`

pub mod engine;
pub mod roles;
pub mod router;
