//! Calcite Browser Shell
//!
//! Tabs, per-tab history, stealth launch and the load indicator, driven by
//! text commands and surface events.

mod chrome;
mod config;
mod error;
mod event;
mod loading;
mod manager;
mod navigation;
mod resolver;
mod session;
mod stealth;
mod surface;

pub use chrome::{Chrome, ChromeTab};
pub use config::ShellConfig;
pub use error::{ShellError, ShellResult};
pub use event::{Command, CommandError, ShellEvent, HELP};
pub use loading::{LoadError, LoadIndicator, LoadOutcome, LoadTicket, LoadingState, LOAD_FALLBACK_TIMEOUT};
pub use manager::TabManager;
pub use navigation::{HistoryEntry, HistoryStack};
pub use resolver::{UrlResolver, DEFAULT_SEARCH_TEMPLATE};
pub use session::{
    derive_title, LoadRequest, NavButtons, NavigateOutcome, Navigator, TabId, TabSession, ViewMode,
    NEW_TAB_TITLE,
};
pub use stealth::{
    FileWindowHost, StealthConfig, StealthDocument, StealthError, StealthLauncher, WindowHost,
    POPUP_BLOCKED_MESSAGE,
};
pub use surface::{HttpSurface, RenderSurface};

use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use calcite_net::{ClientConfig, HttpClient};
use calcite_proxy::CodecGateway;

/// Pending surface events before senders wait
const EVENT_QUEUE_SIZE: usize = 64;

/// Whether the shell keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Quit, or the primary window was sent away by a stealth launch
    Exit,
}

/// The browser shell
pub struct Shell {
    tabs: TabManager,
    indicator: LoadIndicator,
    resolver: UrlResolver,
    gateway: CodecGateway,
    launcher: StealthLauncher,
    /// Proxy origin that composed addresses are relative to
    origin: Url,
    load_timeout: Duration,
    surface: Box<dyn RenderSurface>,
    host: Box<dyn WindowHost>,
    events_tx: mpsc::Sender<ShellEvent>,
    events_rx: mpsc::Receiver<ShellEvent>,
    /// Fallback timers still armed, by the load they guard
    fallbacks: FxHashMap<LoadTicket, CancellationToken>,
}

impl Shell {
    /// Create a shell with the given surface and window host
    pub fn new(
        config: &ShellConfig,
        surface: Box<dyn RenderSurface>,
        host: Box<dyn WindowHost>,
    ) -> ShellResult<Self> {
        config.validate()?;

        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_SIZE);

        Ok(Self {
            tabs: TabManager::new(),
            indicator: LoadIndicator::new(),
            resolver: UrlResolver::new(config.search_template.clone())?,
            gateway: CodecGateway::from_config(&config.proxy)?,
            launcher: StealthLauncher::new(config.stealth.clone())?,
            origin: config.proxy_origin_url()?,
            load_timeout: config.load_timeout(),
            surface,
            host,
            events_tx,
            events_rx,
            fallbacks: FxHashMap::default(),
        })
    }

    /// Create a terminal shell: HTTP surface against the proxy, popups as files
    pub fn from_config(config: &ShellConfig) -> ShellResult<Self> {
        let client = HttpClient::with_config(ClientConfig {
            timeout_secs: config.request_timeout_secs,
        })?;
        let surface = HttpSurface::new(client, config.proxy_origin_url()?);
        let host = FileWindowHost::new(config.popup_dir.clone());

        Self::new(config, Box::new(surface), Box::new(host))
    }

    pub fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    pub fn indicator(&self) -> &LoadIndicator {
        &self.indicator
    }

    /// Snapshot of the chrome for the current state
    pub fn chrome(&self) -> Chrome {
        Chrome::capture(&self.tabs, &self.indicator)
    }

    /// Apply one user command
    pub fn dispatch(&mut self, command: Command) -> Flow {
        match command {
            Command::NewTab => {
                self.tabs.create_session();
            }
            Command::CloseTab(id) => {
                if self.tabs.close_session(id) {
                    self.surface.discard(id);
                }
            }
            Command::SwitchTab(id) => {
                if !self.tabs.switch_to(id) {
                    log::debug!("No tab {}", id);
                }
            }
            Command::Search(text) => return self.navigate(&text, true),
            Command::Open(text) => return self.navigate(&text, false),
            Command::Stealth(enabled) => {
                if let Some(tab) = self.tabs.active_mut() {
                    tab.set_stealth_mode(enabled);
                }
            }
            Command::Back => {
                let request = self.tabs.active_mut().and_then(|tab| tab.go_back(&mut self.indicator));
                self.start_load(request);
            }
            Command::Forward => {
                let request = self.tabs.active_mut().and_then(|tab| tab.go_forward(&mut self.indicator));
                self.start_load(request);
            }
            Command::Reload => {
                let request = self.tabs.active_mut().and_then(|tab| tab.reload(&mut self.indicator));
                self.start_load(request);
            }
            Command::Home => {
                if let Some(tab) = self.tabs.active_mut() {
                    tab.go_home();
                }
            }
            Command::Tabs | Command::Help => {}
            Command::Quit => return Flow::Exit,
        }
        Flow::Continue
    }

    /// Apply one surface event
    pub fn handle_event(&mut self, event: ShellEvent) {
        match event {
            ShellEvent::LoadComplete { tab, ticket, outcome } => {
                if let Some(fallback) = self.fallbacks.remove(&ticket) {
                    fallback.cancel();
                }

                match &outcome {
                    LoadOutcome::Loaded { .. } => {
                        log::info!("Tab {}: load {} finished: {}", tab, ticket, outcome.summary())
                    }
                    LoadOutcome::Failed(_) => {
                        log::warn!("Tab {}: load {} failed: {}", tab, ticket, outcome.summary())
                    }
                }

                if let Some(session) = self.tabs.get_mut(tab) {
                    if session.finish_load(ticket) {
                        session.set_status(outcome.summary());
                    }
                }
                self.indicator.finish(ticket);
            }
            ShellEvent::LoadTimeout { tab, ticket } => {
                self.fallbacks.remove(&ticket);

                if let Some(session) = self.tabs.get_mut(tab) {
                    session.finish_load(ticket);
                }
                if self.indicator.finish(ticket) {
                    log::warn!("Tab {}: load {} never reported back, clearing busy state", tab, ticket);
                }
            }
        }
    }

    /// Wait for the next surface event
    pub async fn next_event(&mut self) -> Option<ShellEvent> {
        self.events_rx.recv().await
    }

    /// Interactive loop over stdin until `quit`, EOF or a stealth launch
    pub async fn run(&mut self) -> ShellResult<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        print!("{}", self.chrome().render_text());

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match line.parse::<Command>() {
                        Ok(Command::Help) => println!("{}", HELP),
                        Ok(command) => {
                            if self.dispatch(command) == Flow::Exit {
                                break;
                            }
                        }
                        Err(e) => {
                            eprintln!("{}", e);
                            continue;
                        }
                    }
                    print!("{}", self.chrome().render_text());
                }
                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event);
                    print!("{}", self.chrome().render_text());
                }
            }
        }

        Ok(())
    }

    /// Navigate the active tab from the home form or the address bar
    fn navigate(&mut self, text: &str, from_home: bool) -> Flow {
        let nav = Navigator {
            resolver: &self.resolver,
            gateway: &self.gateway,
        };
        let Some(tab) = self.tabs.active_mut() else {
            return Flow::Continue;
        };

        let outcome = if from_home {
            tab.navigate(text, nav, &mut self.indicator)
        } else {
            tab.navigate_address(text, nav, &mut self.indicator)
        };

        match outcome {
            NavigateOutcome::Ignored => Flow::Continue,
            NavigateOutcome::Load(request) => {
                self.start_load(Some(request));
                Flow::Continue
            }
            NavigateOutcome::Stealth { address } => self.launch_stealth(&address),
        }
    }

    fn launch_stealth(&mut self, address: &str) -> Flow {
        let url = match self.origin.join(address) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Cannot resolve stealth address {}: {}", address, e);
                let message = format!("Cannot open {} in stealth mode: {}", address, e);
                self.host.notify(&message);
                return Flow::Continue;
            }
        };

        match self.launcher.launch(self.host.as_mut(), &url) {
            Ok(()) => Flow::Exit,
            Err(_) => Flow::Continue,
        }
    }

    fn start_load(&mut self, request: Option<LoadRequest>) {
        let Some(request) = request else {
            return;
        };
        self.surface.load(&request, &self.events_tx);
        self.arm_fallback(request.tab, request.ticket);
    }

    /// Release the busy state after the timeout unless the load reports first
    fn arm_fallback(&mut self, tab: TabId, ticket: LoadTicket) {
        let cancel_token = CancellationToken::new();
        self.fallbacks.insert(ticket, cancel_token.clone());

        let events = self.events_tx.clone();
        let timeout = self.load_timeout;

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    let _ = events.send(ShellEvent::LoadTimeout { tab, ticket }).await;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::time::Instant;

    const EXAMPLE_ADDRESS: &str = "/service/hvtrs8%2F-ezaopne%2Ccmm-";

    #[derive(Default)]
    struct SurfaceLog {
        loads: Vec<LoadRequest>,
        discarded: Vec<TabId>,
    }

    struct MockSurface {
        log: Rc<RefCell<SurfaceLog>>,
        /// Report completion straight away
        complete: bool,
    }

    impl RenderSurface for MockSurface {
        fn load(&mut self, request: &LoadRequest, events: &mpsc::Sender<ShellEvent>) {
            self.log.borrow_mut().loads.push(request.clone());
            if self.complete {
                let _ = events.try_send(ShellEvent::LoadComplete {
                    tab: request.tab,
                    ticket: request.ticket,
                    outcome: LoadOutcome::Loaded { status: 200, bytes: 42 },
                });
            }
        }

        fn discard(&mut self, tab: TabId) {
            self.log.borrow_mut().discarded.push(tab);
        }
    }

    #[derive(Default)]
    struct HostLog {
        opened: Vec<StealthDocument>,
        redirected: Option<Url>,
        notices: Vec<String>,
    }

    struct MockHost {
        log: Rc<RefCell<HostLog>>,
        block: bool,
    }

    impl WindowHost for MockHost {
        fn open_detached(&mut self, document: &StealthDocument) -> Result<(), StealthError> {
            if self.block {
                return Err(StealthError::PopupBlocked);
            }
            self.log.borrow_mut().opened.push(document.clone());
            Ok(())
        }

        fn redirect_primary(&mut self, destination: &Url) {
            self.log.borrow_mut().redirected = Some(destination.clone());
        }

        fn notify(&mut self, message: &str) {
            self.log.borrow_mut().notices.push(message.to_string());
        }
    }

    struct Harness {
        shell: Shell,
        surface: Rc<RefCell<SurfaceLog>>,
        host: Rc<RefCell<HostLog>>,
    }

    fn harness(complete: bool, block: bool) -> Harness {
        let surface = Rc::new(RefCell::new(SurfaceLog::default()));
        let host = Rc::new(RefCell::new(HostLog::default()));
        let shell = Shell::new(
            &ShellConfig::default(),
            Box::new(MockSurface {
                log: surface.clone(),
                complete,
            }),
            Box::new(MockHost {
                log: host.clone(),
                block,
            }),
        )
        .unwrap();
        Harness { shell, surface, host }
    }

    fn active(shell: &Shell) -> &TabSession {
        shell.tabs().active().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_defuses_fallback() {
        let mut h = harness(true, false);

        assert_eq!(h.shell.dispatch(Command::Open("example.com".into())), Flow::Continue);
        assert_eq!(h.surface.borrow().loads[0].address, EXAMPLE_ADDRESS);
        assert!(h.shell.indicator().is_busy());

        let event = h.shell.next_event().await.unwrap();
        assert!(matches!(event, ShellEvent::LoadComplete { .. }));
        h.shell.handle_event(event);

        assert!(!h.shell.indicator().is_busy());
        assert!(!active(&h.shell).is_loading());
        assert_eq!(active(&h.shell).status(), Some("200 (42 bytes)"));

        // The fallback was defused, so nothing else arrives
        let later = tokio::time::timeout(Duration::from_secs(60), h.shell.next_event()).await;
        assert!(later.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_releases_busy() {
        let mut h = harness(false, false);
        let start = Instant::now();

        h.shell.dispatch(Command::Search("a.com".into()));
        assert!(h.shell.indicator().is_busy());

        let event = h.shell.next_event().await.unwrap();
        assert!(matches!(event, ShellEvent::LoadTimeout { .. }));
        assert!(start.elapsed() >= LOAD_FALLBACK_TIMEOUT);

        h.shell.handle_event(event);
        assert!(!h.shell.indicator().is_busy());
        assert!(!active(&h.shell).is_loading());
    }

    #[tokio::test]
    async fn test_stale_completion_keeps_busy() {
        let mut h = harness(false, false);
        h.shell.dispatch(Command::Open("a.com".into()));
        h.shell.dispatch(Command::Open("b.com".into()));

        let (first, second) = {
            let log = h.surface.borrow();
            (log.loads[0].clone(), log.loads[1].clone())
        };
        let loaded = LoadOutcome::Loaded { status: 200, bytes: 1 };

        h.shell.handle_event(ShellEvent::LoadComplete {
            tab: first.tab,
            ticket: first.ticket,
            outcome: loaded.clone(),
        });
        assert!(h.shell.indicator().is_busy());
        assert!(active(&h.shell).is_loading());
        assert!(active(&h.shell).status().is_none());

        h.shell.handle_event(ShellEvent::LoadComplete {
            tab: second.tab,
            ticket: second.ticket,
            outcome: loaded,
        });
        assert!(!h.shell.indicator().is_busy());

        // A late fallback for the finished load changes nothing
        h.shell.handle_event(ShellEvent::LoadTimeout {
            tab: second.tab,
            ticket: second.ticket,
        });
        assert!(!h.shell.indicator().is_busy());
        assert_eq!(active(&h.shell).status(), Some("200 (1 bytes)"));
    }

    #[tokio::test]
    async fn test_stealth_launch_leaves_session_alone() {
        let mut h = harness(false, false);
        h.shell.dispatch(Command::Stealth(true));

        assert_eq!(h.shell.dispatch(Command::Search("example.com".into())), Flow::Exit);

        let host = h.host.borrow();
        assert_eq!(host.opened.len(), 1);
        assert_eq!(
            host.opened[0].address,
            format!("http://127.0.0.1:8080{}", EXAMPLE_ADDRESS)
        );
        assert_eq!(host.redirected.as_ref().unwrap().as_str(), "https://www.google.com/");
        assert!(h.surface.borrow().loads.is_empty());
        assert!(active(&h.shell).history().is_empty());
        assert!(!h.shell.indicator().is_busy());
    }

    #[tokio::test]
    async fn test_blocked_stealth_continues() {
        let mut h = harness(false, true);
        h.shell.dispatch(Command::Stealth(true));

        assert_eq!(h.shell.dispatch(Command::Search("example.com".into())), Flow::Continue);
        let host = h.host.borrow();
        assert_eq!(host.notices, vec![POPUP_BLOCKED_MESSAGE.to_string()]);
        assert!(host.redirected.is_none());
        assert_eq!(active(&h.shell).view(), ViewMode::Home);
    }

    #[tokio::test]
    async fn test_unresolvable_stealth_address_is_reported() {
        let mut h = harness(false, false);

        assert_eq!(h.shell.launch_stealth("http://[::1"), Flow::Continue);

        let host = h.host.borrow();
        assert!(host.opened.is_empty());
        assert!(host.redirected.is_none());
        assert_eq!(host.notices.len(), 1);
        assert!(host.notices[0].starts_with("Cannot open http://[::1 in stealth mode"));
    }

    #[tokio::test]
    async fn test_address_bar_bypasses_stealth() {
        let mut h = harness(false, false);
        h.shell.dispatch(Command::Stealth(true));

        assert_eq!(h.shell.dispatch(Command::Open("example.com".into())), Flow::Continue);
        assert_eq!(h.surface.borrow().loads.len(), 1);
        assert!(h.host.borrow().opened.is_empty());
    }

    #[tokio::test]
    async fn test_history_commands_reach_surface() {
        let mut h = harness(false, false);
        h.shell.dispatch(Command::Open("a.com".into()));
        h.shell.dispatch(Command::Open("b.com".into()));
        h.shell.dispatch(Command::Back);
        h.shell.dispatch(Command::Reload);
        h.shell.dispatch(Command::Forward);
        // Nothing further forward
        h.shell.dispatch(Command::Forward);

        let gateway = CodecGateway::default();
        let addresses: Vec<String> = h.surface.borrow().loads.iter().map(|r| r.address.clone()).collect();
        let a = calcite_proxy::ProxyGateway::compose(&gateway, "https://a.com/");
        let b = calcite_proxy::ProxyGateway::compose(&gateway, "https://b.com/");
        assert_eq!(addresses, vec![a.clone(), b.clone(), a.clone(), a, b]);
    }

    #[tokio::test]
    async fn test_tab_commands() {
        let mut h = harness(false, false);

        h.shell.dispatch(Command::NewTab);
        assert_eq!(h.shell.tabs().len(), 2);
        assert_eq!(h.shell.tabs().active_id(), TabId(1));

        h.shell.dispatch(Command::SwitchTab(TabId(0)));
        assert_eq!(h.shell.tabs().active_id(), TabId(0));
        h.shell.dispatch(Command::SwitchTab(TabId(9)));
        assert_eq!(h.shell.tabs().active_id(), TabId(0));

        h.shell.dispatch(Command::CloseTab(TabId(1)));
        h.shell.dispatch(Command::CloseTab(TabId(0)));
        assert_eq!(h.shell.tabs().len(), 1);
        assert_eq!(h.surface.borrow().discarded, vec![TabId(1)]);

        assert_eq!(h.shell.dispatch(Command::Help), Flow::Continue);
        assert_eq!(h.shell.dispatch(Command::Quit), Flow::Exit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_for_closed_tab() {
        let mut h = harness(false, false);
        h.shell.dispatch(Command::NewTab);
        h.shell.dispatch(Command::Open("a.com".into()));
        h.shell.dispatch(Command::CloseTab(TabId(1)));
        assert!(h.shell.indicator().is_busy());

        let event = h.shell.next_event().await.unwrap();
        h.shell.handle_event(event);
        assert!(!h.shell.indicator().is_busy());
        assert_eq!(h.shell.tabs().active_id(), TabId(0));
    }

    #[tokio::test]
    async fn test_home_then_back() {
        let mut h = harness(false, false);
        h.shell.dispatch(Command::Search("a.com".into()));
        h.shell.dispatch(Command::Search("b.com".into()));
        h.shell.dispatch(Command::Home);

        let chrome = h.shell.chrome();
        assert_eq!(chrome.view, ViewMode::Home);
        assert_eq!(chrome.tabs[0].title, NEW_TAB_TITLE);

        h.shell.dispatch(Command::Back);
        assert_eq!(active(&h.shell).view(), ViewMode::Browsing);
        assert_eq!(active(&h.shell).address_text(), "https://a.com/");
    }
}
