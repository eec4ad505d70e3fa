//! Tab sessions
//!
//! A session is one independent browsing context: its own history, address
//! bar, stealth toggle and render surface source.

use std::fmt;

use calcite_proxy::ProxyGateway;
use url::Url;

use crate::loading::{LoadIndicator, LoadTicket};
use crate::navigation::{HistoryEntry, HistoryStack};
use crate::resolver::UrlResolver;

/// Title shown until a navigation resolves a hostname
pub const NEW_TAB_TITLE: &str = "New Tab";

/// Unparseable addresses are cut to this many characters for the title
const TITLE_FALLBACK_CHARS: usize = 20;

/// Tab identifier. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which surface a tab is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Landing view with the search form
    #[default]
    Home,
    /// Render surface with the address bar
    Browsing,
}

/// Enabled state of the back/forward controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavButtons {
    pub back: bool,
    pub forward: bool,
}

/// A load the render surface must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub tab: TabId,
    pub ticket: LoadTicket,
    /// Proxied address to set as the surface source
    pub address: String,
}

/// What a navigate call asks the caller to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateOutcome {
    /// Empty input, nothing happened
    Ignored,
    /// Load this into the tab's surface
    Load(LoadRequest),
    /// Stealth mode: open this proxied address detached; the tab is untouched
    Stealth { address: String },
}

/// Collaborators a navigation needs
#[derive(Clone, Copy)]
pub struct Navigator<'a> {
    pub resolver: &'a UrlResolver,
    pub gateway: &'a dyn ProxyGateway,
}

/// One tab
#[derive(Debug)]
pub struct TabSession {
    id: TabId,
    title: String,
    /// Last loaded proxied address, `None` until the first navigation
    current_url: Option<String>,
    history: HistoryStack,
    stealth_mode: bool,
    view: ViewMode,
    /// Address bar contents (original URL of the shown entry)
    address_text: String,
    /// Home view search field contents
    search_text: String,
    /// Source currently set on the render surface
    surface_source: Option<String>,
    /// Most recent load issued by this tab
    ticket: Option<LoadTicket>,
    loading: bool,
    nav_buttons: NavButtons,
    /// Summary of the last completed load
    status: Option<String>,
}

impl TabSession {
    /// Create a session on its home view
    pub fn new(id: TabId) -> Self {
        Self {
            id,
            title: NEW_TAB_TITLE.to_string(),
            current_url: None,
            history: HistoryStack::new(),
            stealth_mode: false,
            view: ViewMode::Home,
            address_text: String::new(),
            search_text: String::new(),
            surface_source: None,
            ticket: None,
            loading: false,
            nav_buttons: NavButtons::default(),
            status: None,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn address_text(&self) -> &str {
        &self.address_text
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn nav_buttons(&self) -> NavButtons {
        self.nav_buttons
    }

    pub fn stealth_mode(&self) -> bool {
        self.stealth_mode
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Whether this tab's latest load is still in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Stealth checkbox on the home view
    pub fn set_stealth_mode(&mut self, enabled: bool) {
        self.stealth_mode = enabled;
    }

    /// Submit the home view search form
    ///
    /// Honours the stealth toggle: with it set, history and view are left alone
    /// and the caller is told to open the address detached.
    pub fn navigate(
        &mut self,
        input: &str,
        nav: Navigator<'_>,
        indicator: &mut LoadIndicator,
    ) -> NavigateOutcome {
        let query = input.trim();
        if query.is_empty() {
            return NavigateOutcome::Ignored;
        }
        self.search_text = query.to_string();

        let original = nav.resolver.resolve(query);
        let proxied = nav.gateway.compose(&original);

        if self.stealth_mode {
            log::info!("Tab {}: stealth navigation to {}", self.id, original);
            return NavigateOutcome::Stealth { address: proxied };
        }

        NavigateOutcome::Load(self.visit(original, proxied, indicator))
    }

    /// Enter pressed in the address bar. Never goes through stealth mode.
    pub fn navigate_address(
        &mut self,
        input: &str,
        nav: Navigator<'_>,
        indicator: &mut LoadIndicator,
    ) -> NavigateOutcome {
        let query = input.trim();
        if query.is_empty() {
            return NavigateOutcome::Ignored;
        }

        let original = nav.resolver.resolve(query);
        let proxied = nav.gateway.compose(&original);
        NavigateOutcome::Load(self.visit(original, proxied, indicator))
    }

    /// Step back in history and reload the surface
    pub fn go_back(&mut self, indicator: &mut LoadIndicator) -> Option<LoadRequest> {
        let entry = self.history.step_back()?.clone();
        Some(self.show_entry(entry, indicator))
    }

    /// Step forward in history and reload the surface
    pub fn go_forward(&mut self, indicator: &mut LoadIndicator) -> Option<LoadRequest> {
        let entry = self.history.step_forward()?.clone();
        Some(self.show_entry(entry, indicator))
    }

    /// Reissue the surface's current source unchanged
    pub fn reload(&mut self, indicator: &mut LoadIndicator) -> Option<LoadRequest> {
        let source = self.surface_source.clone()?;
        log::info!("Tab {}: reloading", self.id);
        let request = self.issue_load(source, indicator);
        self.refresh_nav_buttons();
        Some(request)
    }

    /// Back to the landing view. History is kept as is.
    pub fn go_home(&mut self) {
        self.view = ViewMode::Home;
        self.title = NEW_TAB_TITLE.to_string();
        self.search_text.clear();
    }

    /// The surface reported completion (or the fallback fired) for `ticket`
    ///
    /// Returns false for tickets this tab has since superseded.
    pub fn finish_load(&mut self, ticket: LoadTicket) -> bool {
        if self.ticket != Some(ticket) {
            log::debug!("Tab {}: ignoring stale load {}", self.id, ticket);
            return false;
        }
        self.loading = false;
        true
    }

    /// Record the outcome line for the latest load
    pub fn set_status(&mut self, status: String) {
        self.status = Some(status);
    }

    /// Fresh navigation: push history and load
    fn visit(&mut self, original: String, proxied: String, indicator: &mut LoadIndicator) -> LoadRequest {
        log::info!("Tab {}: navigating to {}", self.id, original);
        self.history.push(original.clone(), proxied.clone());
        self.show_entry(HistoryEntry { proxied, original }, indicator)
    }

    fn show_entry(&mut self, entry: HistoryEntry, indicator: &mut LoadIndicator) -> LoadRequest {
        self.view = ViewMode::Browsing;
        self.current_url = Some(entry.proxied.clone());
        self.title = derive_title(&entry.original);
        self.address_text = entry.original;

        let request = self.issue_load(entry.proxied, indicator);
        self.refresh_nav_buttons();
        request
    }

    fn issue_load(&mut self, address: String, indicator: &mut LoadIndicator) -> LoadRequest {
        let ticket = indicator.begin(self.id);
        self.ticket = Some(ticket);
        self.loading = true;
        self.surface_source = Some(address.clone());
        LoadRequest {
            tab: self.id,
            ticket,
            address,
        }
    }

    fn refresh_nav_buttons(&mut self) {
        self.nav_buttons = NavButtons {
            back: self.history.can_step_back(),
            forward: self.history.can_step_forward(),
        };
    }
}

/// Tab title for an original URL: its hostname, or a shortened raw string
pub fn derive_title(original: &str) -> String {
    match Url::parse(original) {
        Ok(url) => match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => NEW_TAB_TITLE.to_string(),
        },
        Err(_) => truncate_label(original, TITLE_FALLBACK_CHARS),
    }
}

/// Cut `text` to `max` characters, marking the cut with `...`
pub(crate) fn truncate_label(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
