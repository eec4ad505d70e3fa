//! Shell error types
//!
//! These only surface at the edges (configuration, I/O, command parsing).
//! Tab and history operations degrade to no-ops instead of failing.

use thiserror::Error;

/// Shell result type
pub type ShellResult<T> = Result<T, ShellError>;

/// Shell errors
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] calcite_proxy::ProxyError),

    #[error("Network error: {0}")]
    Net(#[from] calcite_net::NetError),

    #[error("Config file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
