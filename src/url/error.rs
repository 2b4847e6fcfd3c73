use thiserror::Error;

#[derive(Debug, Error)]
pub enum UrlError {
    #[error("url '{url}' is irregular: {reason}")]
    IrregularUrl { url: String, reason: String },
    #[error("line is not valid UTF-8")]
    EncodingError,
}

pub type UrlResult<T> = Result<T, UrlError>;
