//! Shell configuration

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use calcite_proxy::{CodecGateway, ProxyConfig};

use crate::error::{ShellError, ShellResult};
use crate::loading::LOAD_FALLBACK_TIMEOUT;
use crate::resolver::{UrlResolver, DEFAULT_SEARCH_TEMPLATE};
use crate::stealth::{StealthConfig, StealthLauncher};

/// Everything the shell needs to start.
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Origin of the rewriting proxy server
    pub proxy_origin: String,
    pub proxy: ProxyConfig,
    /// Search engine template with a `%s` placeholder
    pub search_template: String,
    /// Seconds before the busy indicator is released regardless
    pub load_timeout_secs: u64,
    /// Seconds before an HTTP fetch gives up
    pub request_timeout_secs: u64,
    pub stealth: StealthConfig,
    /// Where stealth popups are written; `None` blocks them
    pub popup_dir: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            proxy_origin: "http://127.0.0.1:8080".to_string(),
            proxy: ProxyConfig::default(),
            search_template: DEFAULT_SEARCH_TEMPLATE.to_string(),
            load_timeout_secs: LOAD_FALLBACK_TIMEOUT.as_secs(),
            request_timeout_secs: 30,
            stealth: StealthConfig::default(),
            popup_dir: Some(std::env::temp_dir().join("calcite")),
        }
    }
}

impl ShellConfig {
    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> ShellResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check every field that can be wrong
    pub fn validate(&self) -> ShellResult<()> {
        self.proxy_origin_url()?;
        UrlResolver::new(self.search_template.as_str())?;
        CodecGateway::from_config(&self.proxy)?;
        StealthLauncher::new(self.stealth.clone())?;

        if self.load_timeout_secs == 0 {
            return Err(ShellError::Config("load_timeout_secs must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ShellError::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// The proxy origin, which must be absolute
    pub fn proxy_origin_url(&self) -> ShellResult<Url> {
        let url = Url::parse(&self.proxy_origin)?;
        if url.cannot_be_a_base() {
            return Err(ShellError::Config(format!(
                "proxy origin cannot hold paths: {}",
                self.proxy_origin
            )));
        }
        Ok(url)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}
