use thiserror::Error;

/// Aggregates every submodule's error type behind one crate-level type, the
/// way the teacher's own `structures.rs` rolls up its per-module errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Piece(#[from] crate::piece::PieceError),
    #[error(transparent)]
    Pattern(#[from] crate::pattern::PatternError),
    #[error(transparent)]
    Url(#[from] crate::url::UrlError),
    #[error(transparent)]
    Tree(#[from] crate::tree::TreeError),
    #[error(transparent)]
    Cluster(#[from] crate::cluster::ClusterError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
