//! Browser chrome UI components
//!
//! Tab bar, navigation buttons, address bar and status line, captured from
//! the tab manager so any front end can draw them.

use std::fmt::Write;

use crate::loading::LoadIndicator;
use crate::manager::TabManager;
use crate::session::{truncate_label, TabId, ViewMode};

/// Widest a tab title may be in the tab bar, in characters
const TAB_TITLE_MAX: usize = 24;

/// Widest the address bar may be, in characters
const ADDRESS_MAX: usize = 72;

/// Tab in the tab bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeTab {
    /// Tab identifier
    pub id: TabId,
    /// Tab title
    pub title: String,
    /// Whether this tab is active
    pub is_active: bool,
    /// Whether this tab is loading
    pub is_loading: bool,
}

/// Browser chrome UI state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chrome {
    /// Tabs in tab order
    pub tabs: Vec<ChromeTab>,
    /// What the active tab is showing
    pub view: ViewMode,
    /// Address bar contents
    pub address: String,
    /// Home view search field contents
    pub search: String,
    pub back_enabled: bool,
    pub forward_enabled: bool,
    /// Active tab's stealth checkbox
    pub stealth: bool,
    /// Result of the active tab's last load
    pub status: Option<String>,
    /// Global busy indicator
    pub busy: bool,
}

impl Chrome {
    /// Snapshot the chrome for the current state
    pub fn capture(tabs: &TabManager, indicator: &LoadIndicator) -> Self {
        let active_id = tabs.active_id();
        let chrome_tabs = tabs
            .sessions()
            .iter()
            .map(|session| ChromeTab {
                id: session.id(),
                title: session.title().to_string(),
                is_active: session.id() == active_id,
                is_loading: session.is_loading(),
            })
            .collect();

        let mut chrome = Self {
            tabs: chrome_tabs,
            view: ViewMode::Home,
            address: String::new(),
            search: String::new(),
            back_enabled: false,
            forward_enabled: false,
            stealth: false,
            status: None,
            busy: indicator.is_busy(),
        };

        if let Some(active) = tabs.active() {
            let buttons = active.nav_buttons();
            chrome.view = active.view();
            chrome.address = active.address_text().to_string();
            chrome.search = active.search_text().to_string();
            chrome.back_enabled = buttons.back;
            chrome.forward_enabled = buttons.forward;
            chrome.stealth = active.stealth_mode();
            chrome.status = active.status().map(str::to_string);
        }

        chrome
    }

    /// Render for a terminal
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        // Tab bar
        for tab in &self.tabs {
            let marker = if tab.is_active { '*' } else { ' ' };
            let spinner = if tab.is_loading { " ~" } else { "" };
            let _ = write!(
                out,
                "[{}{}: {}{}] ",
                marker,
                tab.id,
                truncate_title(&tab.title, TAB_TITLE_MAX),
                spinner
            );
        }
        out.push_str("[+]\n");

        match self.view {
            ViewMode::Home => {
                let stealth = if self.stealth { "x" } else { " " };
                let _ = writeln!(out, "Home  search: {}  [{}] stealth", self.search, stealth);
            }
            ViewMode::Browsing => {
                let back = if self.back_enabled { "<" } else { "-" };
                let forward = if self.forward_enabled { ">" } else { "-" };
                let _ = writeln!(
                    out,
                    "{} {}  {}",
                    back,
                    forward,
                    truncate_title(&self.address, ADDRESS_MAX)
                );
            }
        }

        if self.busy {
            out.push_str("Loading...\n");
        } else if let Some(status) = &self.status {
            let _ = writeln!(out, "{}", status);
        }

        out
    }
}

/// Fit a title into `max_chars`, counting the `...` suffix
fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        title.to_string()
    } else if max_chars > 3 {
        truncate_label(title, max_chars - 3)
    } else {
        title.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::UrlResolver;
    use crate::session::{Navigator, NEW_TAB_TITLE};
    use calcite_proxy::CodecGateway;

    fn open(tabs: &mut TabManager, indicator: &mut LoadIndicator, input: &str) {
        let resolver = UrlResolver::default();
        let gateway = CodecGateway::default();
        let nav = Navigator {
            resolver: &resolver,
            gateway: &gateway,
        };
        tabs.active_mut().unwrap().navigate_address(input, nav, indicator);
    }

    #[test]
    fn test_capture_fresh_manager() {
        let tabs = TabManager::new();
        let chrome = Chrome::capture(&tabs, &LoadIndicator::new());

        assert_eq!(chrome.tabs.len(), 1);
        assert_eq!(chrome.tabs[0].title, NEW_TAB_TITLE);
        assert!(chrome.tabs[0].is_active);
        assert_eq!(chrome.view, ViewMode::Home);
        assert!(!chrome.back_enabled && !chrome.forward_enabled);
        assert!(!chrome.busy);
    }

    #[test]
    fn test_capture_reflects_active_tab() {
        let mut tabs = TabManager::new();
        let mut indicator = LoadIndicator::new();
        open(&mut tabs, &mut indicator, "a.com");
        open(&mut tabs, &mut indicator, "b.com");
        tabs.create_session();

        let chrome = Chrome::capture(&tabs, &indicator);
        assert_eq!(chrome.tabs.len(), 2);
        assert!(!chrome.tabs[0].is_active);
        assert!(chrome.tabs[0].is_loading);
        assert_eq!(chrome.tabs[0].title, "b.com");
        assert!(chrome.tabs[1].is_active);
        assert_eq!(chrome.view, ViewMode::Home);
        assert!(chrome.busy);

        tabs.switch_to(TabId(0));
        let chrome = Chrome::capture(&tabs, &indicator);
        assert_eq!(chrome.view, ViewMode::Browsing);
        assert_eq!(chrome.address, "https://b.com/");
        assert!(chrome.back_enabled);
        assert!(!chrome.forward_enabled);
    }

    #[test]
    fn test_render_text() {
        let mut tabs = TabManager::new();
        let mut indicator = LoadIndicator::new();
        open(&mut tabs, &mut indicator, "example.com");

        let text = Chrome::capture(&tabs, &indicator).render_text();
        assert!(text.starts_with("[*0: example.com ~] [+]\n"));
        assert!(text.contains("- -  https://example.com/"));
        assert!(text.contains("Loading..."));
    }

    #[test]
    fn test_render_home_with_stealth() {
        let mut tabs = TabManager::new();
        tabs.active_mut().unwrap().set_stealth_mode(true);

        let text = Chrome::capture(&tabs, &LoadIndicator::new()).render_text();
        assert!(text.contains("[x] stealth"));
        assert!(!text.contains("Loading"));
    }

    #[test]
    fn test_title_truncation() {
        assert_eq!(truncate_title("Short", 20), "Short");
        assert_eq!(truncate_title("This is a very long title", 10), "This is...");
        assert_eq!(truncate_title("Hello", 2), "He");
    }
}
