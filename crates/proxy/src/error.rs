//! Proxy gateway error types

use thiserror::Error;

/// Proxy gateway result type
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Proxy gateway errors
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Invalid proxy prefix: {0} (must start and end with '/')")]
    InvalidPrefix(String),

    #[error("Unknown codec: {0}")]
    UnknownCodec(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<std::string::FromUtf8Error> for ProxyError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        ProxyError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for ProxyError {
    fn from(err: base64::DecodeError) -> Self {
        ProxyError::Decode(err.to_string())
    }
}
