//! Calcite Proxy Gateway
//!
//! Maps raw URLs onto the path space of the URL-rewriting proxy that serves
//! every page the shell displays.

mod codec;
mod error;
mod gateway;

pub use codec::Codec;
pub use error::{ProxyError, ProxyResult};
pub use gateway::{CodecGateway, ProxyConfig, ProxyGateway, DEFAULT_PREFIX};
