use thiserror::Error;

/// Programming-contract violations surfaced by the cluster cascade: fatal,
/// never triggered by malformed input data.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("piece '{piece}' was added to a LengthPieceBucket that already holds it")]
    DuplicatePiece { piece: String },
    #[error(transparent)]
    Tree(#[from] crate::tree::TreeError),
}

pub type ClusterResult<T> = Result<T, ClusterError>;
