//! Proxy gateway: raw URL to proxied address

use serde::Deserialize;

use crate::codec::Codec;
use crate::error::{ProxyError, ProxyResult};

/// Path prefix the proxy service worker is mounted under
pub const DEFAULT_PREFIX: &str = "/service/";

/// Encodes raw URLs into addresses served by the proxy.
///
/// Decoding happens server-side when the render surface requests the
/// composed address, so the shell only ever needs this direction.
pub trait ProxyGateway {
    /// Fixed path prefix of every proxied address
    fn prefix(&self) -> &str;

    /// Map an absolute URL to an opaque, path-safe token
    fn encode(&self, raw: &str) -> String;

    /// Final navigable address: `prefix + encode(raw)`
    fn compose(&self, raw: &str) -> String {
        format!("{}{}", self.prefix(), self.encode(raw))
    }
}

/// Gateway settings as they appear in the shell configuration file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub prefix: String,
    pub codec: Codec,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            codec: Codec::default(),
        }
    }
}

/// Gateway backed by one of the built-in [`Codec`]s
#[derive(Debug, Clone)]
pub struct CodecGateway {
    prefix: String,
    codec: Codec,
}

impl CodecGateway {
    /// Create a gateway, validating the prefix
    pub fn new(prefix: impl Into<String>, codec: Codec) -> ProxyResult<Self> {
        let prefix = prefix.into();
        if !prefix.starts_with('/') || !prefix.ends_with('/') {
            return Err(ProxyError::InvalidPrefix(prefix));
        }

        log::debug!("Proxy gateway: prefix={} codec={}", prefix, codec);
        Ok(Self { prefix, codec })
    }

    /// Create a gateway from configuration
    pub fn from_config(config: &ProxyConfig) -> ProxyResult<Self> {
        Self::new(config.prefix.clone(), config.codec)
    }

    /// The codec in use
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Recover the raw URL from a composed address, if it carries our prefix
    pub fn decompose(&self, address: &str) -> Option<ProxyResult<String>> {
        address
            .strip_prefix(&self.prefix)
            .map(|token| self.codec.decode(token))
    }
}

impl Default for CodecGateway {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            codec: Codec::default(),
        }
    }
}

impl ProxyGateway for CodecGateway {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn encode(&self, raw: &str) -> String {
        self.codec.encode(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_default() {
        let gateway = CodecGateway::default();
        assert_eq!(
            gateway.compose("https://example.com"),
            "/service/hvtrs8%2F-ezaopne%2Ccmm"
        );
    }

    #[test]
    fn test_compose_is_deterministic() {
        let gateway = CodecGateway::new("/p/", Codec::Plain).unwrap();
        assert_eq!(gateway.compose("https://a.com/"), gateway.compose("https://a.com/"));
        assert!(gateway.compose("https://a.com/").starts_with("/p/"));
    }

    #[test]
    fn test_invalid_prefix() {
        assert!(matches!(
            CodecGateway::new("service/", Codec::Xor),
            Err(ProxyError::InvalidPrefix(_))
        ));
        assert!(matches!(
            CodecGateway::new("/service", Codec::Xor),
            Err(ProxyError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_decompose() {
        let gateway = CodecGateway::default();
        let address = gateway.compose("https://example.com/page");
        let raw = gateway.decompose(&address).unwrap().unwrap();
        assert_eq!(raw, "https://example.com/page");

        assert!(gateway.decompose("/elsewhere/abc").is_none());
    }

    #[test]
    fn test_config_defaults() {
        let config: ProxyConfig = serde_json::from_str(r#"{"codec": "base64"}"#).unwrap();
        assert_eq!(config.prefix, DEFAULT_PREFIX);
        assert_eq!(config.codec, Codec::Base64);

        let gateway = CodecGateway::from_config(&config).unwrap();
        assert_eq!(gateway.codec(), Codec::Base64);
    }
}
