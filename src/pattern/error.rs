use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern '{raw}' is syntactically malformed: {reason}")]
    InvalidPattern { raw: String, reason: String },
}

pub type PatternResult<T> = Result<T, PatternError>;
