use thiserror::Error;

/// Programming-contract violations: fatal, not an input-data problem.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("attempted to add a non-positive count ({count}) to the piece-pattern tree")]
    NonPositiveCount { count: i64 },
    #[error("node pattern was reassigned after already being set by an earlier cluster pass")]
    PatternAlreadyAssigned,
}

pub type TreeResult<T> = Result<T, TreeError>;
