use std::io;

use thiserror::Error;

/// Errors surfaced by the goal store and the allocation engine. All of
/// them are handed to the calling UI layer for display; none are retried
/// automatically.
#[derive(Debug, Error)]
pub enum GoalError {
    /// A malformed or missing input field. Carries the first field that
    /// failed so the user knows what to correct.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The affordability check rejected a new or edited goal. `shortfall`
    /// is how much more monthly income the goal would need.
    #[error(
        "goal needs {needed:.2}/month but only {leftover:.2} of income is uncommitted (short {shortfall:.2})"
    )]
    InsufficientIncome {
        needed: f64,
        leftover: f64,
        shortfall: f64,
    },

    /// Edit of a goal id that is not in the set. The caller should treat
    /// its view as stale and reload.
    #[error("no goal with id {0}")]
    NotFound(String),

    /// A goal with a non-positive target amount or time frame reached the
    /// engine. Store validation gates these out, so hitting this means a
    /// validation gap upstream, not a user mistake.
    #[error("goal {id} has a non-positive target amount or time frame")]
    InvalidGoal { id: String },

    /// The key-value store could not be read or written. On mutation paths
    /// the in-memory change has already been applied and stands; only
    /// durability failed.
    #[error("failed to persist state: {0}")]
    Persistence(#[from] io::Error),
}
