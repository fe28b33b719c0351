//! Error kinds observable at the planner surface (`spec.md` §7).
//!
//! `NoSources`/`NoReachableSinks` are deliberately *not* modeled here: they
//! are structured return values (the four lists in [`crate::plug::PlanOutcome`]),
//! not exceptions. Planner invariant violations are `assert!`/`debug_assert!`
//! failures, not `Result`s, because they indicate a bug in the planner or
//! its caller, not a runtime condition anything can recover from.

use thiserror::Error;

/// Errors surfaced by this crate's own collaborators (reporters).
#[derive(Debug, Error)]
pub enum PlugError {
    /// A reporter factory could not open its destination.
    #[error("reporter could not be initialized: {0}")]
    ReporterInit(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A multiplex reporter was constructed with fewer than two children.
    #[error("multiplex reporter needs at least two children, got {0}")]
    NotEnoughReporters(usize),
}

/// Convenience alias for fallible planner-adjacent operations.
pub type Result<T> = std::result::Result<T, PlugError>;
