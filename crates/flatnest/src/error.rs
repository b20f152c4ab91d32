//! Error types for the nesting engine.

use thiserror::Error;

/// Errors reported for invalid engine inputs.
///
/// The optimization itself never fails: `run` on an empty nester is a no-op
/// and post-run invariants are audited through `Nester::validate`.
#[derive(Error, Debug)]
pub enum NestError {
    /// Annealing schedule knobs are out of range.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
}

/// Result type for nesting operations.
pub type Result<T> = std::result::Result<T, NestError>;
