use thiserror::Error;

#[derive(Debug, Error)]
pub enum PieceError {
    #[error("byte {byte:#04x} in piece '{piece}' is outside the recognized character-class alphabet")]
    InvalidChar { piece: String, byte: u8 },
    #[error("piece is empty")]
    Empty,
}

pub type PieceResult<T> = Result<T, PieceError>;
