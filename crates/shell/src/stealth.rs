//! Stealth launch: proxied page in a detached, address-less window
//!
//! The detached window is not a tab. Once it is open the primary surface is
//! sent to a decoy destination and the shell's own state no longer matters.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Message shown when the detached window cannot be opened
pub const POPUP_BLOCKED_MESSAGE: &str = "Popup blocked. Please allow popups for stealth mode to work.";

/// Stealth launch errors
#[derive(Debug, Error)]
pub enum StealthError {
    #[error("Popup blocked")]
    PopupBlocked,

    #[error("Failed to write popup document: {0}")]
    Io(#[from] std::io::Error),
}

/// How the detached window disguises itself
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StealthConfig {
    /// Where the primary surface goes after a successful launch
    pub decoy_url: String,
    /// Title of the detached window
    pub cloak_title: String,
    /// Favicon of the detached window
    pub cloak_icon: String,
}

impl Default for StealthConfig {
    fn default() -> Self {
        Self {
            decoy_url: "https://www.google.com".to_string(),
            cloak_title: "Google".to_string(),
            cloak_icon: "https://www.google.com/favicon.ico".to_string(),
        }
    }
}

/// Content injected into the blank detached window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealthDocument {
    pub title: String,
    pub icon: String,
    /// Absolute proxied address framed by the document
    pub address: String,
}

impl StealthDocument {
    /// Full-viewport, borderless frame page
    pub fn to_html(&self) -> String {
        format!(
            r#"<html>
  <head>
    <title>{title}</title>
    <link rel="icon" href="{icon}">
    <style>
      html, body {{ margin: 0; padding: 0; height: 100%; overflow: hidden; }}
      iframe {{ width: 100%; height: 100%; border: none; }}
    </style>
  </head>
  <body>
    <iframe src="{address}"></iframe>
  </body>
</html>
"#,
            title = escape_attr(&self.title),
            icon = escape_attr(&self.icon),
            address = escape_attr(&self.address),
        )
    }
}

/// The environment a stealth launch acts on
pub trait WindowHost {
    /// Open a blank-addressed window showing `document`
    fn open_detached(&mut self, document: &StealthDocument) -> Result<(), StealthError>;

    /// Navigate the primary window away
    fn redirect_primary(&mut self, destination: &Url);

    /// Blocking notification to the user
    fn notify(&mut self, message: &str);
}

/// Fire-and-forget launcher; never creates a tracked session
#[derive(Debug, Clone)]
pub struct StealthLauncher {
    config: StealthConfig,
    decoy: Url,
}

impl StealthLauncher {
    /// Create a launcher, validating the decoy destination
    pub fn new(config: StealthConfig) -> Result<Self, url::ParseError> {
        let decoy = Url::parse(&config.decoy_url)?;
        Ok(Self { config, decoy })
    }

    /// Open `address` detached, then redirect the primary window
    ///
    /// On any failure the user is notified and nothing else happens.
    pub fn launch(&self, host: &mut dyn WindowHost, address: &Url) -> Result<(), StealthError> {
        let document = StealthDocument {
            title: self.config.cloak_title.clone(),
            icon: self.config.cloak_icon.clone(),
            address: address.to_string(),
        };

        if let Err(e) = host.open_detached(&document) {
            log::warn!("Stealth launch failed: {}", e);
            match e {
                StealthError::PopupBlocked => host.notify(POPUP_BLOCKED_MESSAGE),
                _ => host.notify(&e.to_string()),
            }
            return Err(e);
        }

        log::info!("Stealth window opened, redirecting to {}", self.decoy);
        host.redirect_primary(&self.decoy);
        Ok(())
    }
}

/// Terminal host: popups are HTML files in a directory
#[derive(Debug)]
pub struct FileWindowHost {
    /// `None` blocks every popup
    popup_dir: Option<PathBuf>,
    opened: usize,
}

impl FileWindowHost {
    pub fn new(popup_dir: Option<PathBuf>) -> Self {
        Self {
            popup_dir,
            opened: 0,
        }
    }
}

impl WindowHost for FileWindowHost {
    fn open_detached(&mut self, document: &StealthDocument) -> Result<(), StealthError> {
        let dir = self.popup_dir.as_ref().ok_or(StealthError::PopupBlocked)?;
        fs::create_dir_all(dir)?;

        self.opened += 1;
        let path = dir.join(format!("calcite-stealth-{}.html", self.opened));
        fs::write(&path, document.to_html())?;

        println!("Opened stealth window: {}", path.display());
        Ok(())
    }

    fn redirect_primary(&mut self, destination: &Url) {
        println!("Redirected to {}", destination);
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Minimal escaping for values placed inside double-quoted attributes and text
fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
