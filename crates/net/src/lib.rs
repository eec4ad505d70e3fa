//! Calcite Network Layer
//!
//! HTTP fetching for the headless render surface. Every request goes to the
//! proxy origin; the proxy server performs the actual upstream fetch.

mod client;
mod error;
mod response;

pub use client::{ClientConfig, HttpClient};
pub use error::{NetError, NetResult};
pub use response::Response;
