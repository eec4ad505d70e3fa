//! Loading State Management
//!
//! The busy indicator shared by every tab, load tickets, and load outcomes.

use std::fmt;
use std::time::Duration;

use crate::session::TabId;

/// Busy state is released after this long even if the surface never reports completion
pub const LOAD_FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Identifies one issued load. Monotonic for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub u64);

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Loading state for the browser
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadingState {
    /// No navigation in progress
    #[default]
    Idle,
    /// A load was issued and has not completed or timed out
    Loading {
        /// The most recently issued ticket
        ticket: LoadTicket,
        /// Tab that issued it
        tab: TabId,
    },
}

/// Process-wide busy/idle signal.
///
/// One flag for all tabs: the most recent load owns it. Completion of an
/// older ticket (an abandoned load, or another tab's) never clears it.
#[derive(Debug, Default)]
pub struct LoadIndicator {
    state: LoadingState,
    next_ticket: u64,
}

impl LoadIndicator {
    /// Create an idle indicator
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark busy for a new load and hand out its ticket
    pub fn begin(&mut self, tab: TabId) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        log::debug!("Load {} started by tab {}", ticket, tab);
        self.state = LoadingState::Loading { ticket, tab };
        ticket
    }

    /// Release busy state for `ticket`
    ///
    /// Idempotent. Returns true only if this call moved the indicator to idle.
    pub fn finish(&mut self, ticket: LoadTicket) -> bool {
        match self.state {
            LoadingState::Loading { ticket: current, .. } if current == ticket => {
                log::debug!("Load {} finished, indicator idle", ticket);
                self.state = LoadingState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Whether the busy indicator is showing
    pub fn is_busy(&self) -> bool {
        matches!(self.state, LoadingState::Loading { .. })
    }

    /// Current state
    pub fn state(&self) -> LoadingState {
        self.state
    }
}

/// How a surface load ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The surface received a response (any status, like a frame's load event)
    Loaded {
        /// HTTP status code
        status: u16,
        /// Body size in bytes
        bytes: usize,
    },
    /// No response at all
    Failed(LoadError),
}

impl LoadOutcome {
    /// One-line status for the chrome
    pub fn summary(&self) -> String {
        match self {
            Self::Loaded { status, bytes } => format!("{} ({} bytes)", status, bytes),
            Self::Failed(error) => format!("{}: {}", error.title(), error.details()),
        }
    }
}

/// Load failure types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Proxy unreachable / connection refused
    NetworkError(String),
    /// Request timed out
    Timeout,
    /// The composed address could not be turned into a request URL
    InvalidAddress(String),
}

impl LoadError {
    /// Short human-readable title
    pub fn title(&self) -> &'static str {
        match self {
            Self::NetworkError(_) => "Network Error",
            Self::Timeout => "Connection Timed Out",
            Self::InvalidAddress(_) => "Invalid Address",
        }
    }

    /// Detailed description
    pub fn details(&self) -> String {
        match self {
            Self::NetworkError(msg) => msg.clone(),
            Self::Timeout => "The proxy took too long to respond.".into(),
            Self::InvalidAddress(address) => format!("Cannot load {}", address),
        }
    }
}

impl From<calcite_net::NetError> for LoadError {
    fn from(err: calcite_net::NetError) -> Self {
        match err {
            calcite_net::NetError::Timeout => Self::Timeout,
            calcite_net::NetError::InvalidUrl(address) => Self::InvalidAddress(address),
            other => Self::NetworkError(other.to_string()),
        }
    }
}
