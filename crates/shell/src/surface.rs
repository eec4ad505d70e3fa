//! Render surfaces
//!
//! A surface takes a source address and, some time later, reports that the
//! load completed. Completion arrives on the shell's event channel.

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use calcite_net::HttpClient;

use crate::event::ShellEvent;
use crate::loading::{LoadError, LoadOutcome};
use crate::session::{LoadRequest, TabId};

/// Where tabs display their content
pub trait RenderSurface {
    /// Set the tab's source address. Must not block; completion is sent on `events`.
    fn load(&mut self, request: &LoadRequest, events: &mpsc::Sender<ShellEvent>);

    /// The tab is gone; drop whatever it had in flight
    fn discard(&mut self, _tab: TabId) {}
}

/// Headless surface that fetches proxied addresses over HTTP
pub struct HttpSurface {
    client: HttpClient,
    /// Origin of the proxy server the composed paths are relative to
    origin: Url,
    /// Cancellation for each tab's current fetch
    in_flight: FxHashMap<TabId, CancellationToken>,
}

impl HttpSurface {
    pub fn new(client: HttpClient, origin: Url) -> Self {
        Self {
            client,
            origin,
            in_flight: FxHashMap::default(),
        }
    }
}

impl RenderSurface for HttpSurface {
    fn load(&mut self, request: &LoadRequest, events: &mpsc::Sender<ShellEvent>) {
        let tab = request.tab;
        let ticket = request.ticket;

        // A new source abandons whatever the tab was loading
        let cancel_token = CancellationToken::new();
        if let Some(previous) = self.in_flight.insert(tab, cancel_token.clone()) {
            previous.cancel();
        }

        let url = match self.origin.join(&request.address) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Tab {}: cannot resolve {}: {}", tab, request.address, e);
                let outcome = LoadOutcome::Failed(LoadError::InvalidAddress(request.address.clone()));
                let _ = events.try_send(ShellEvent::LoadComplete { tab, ticket, outcome });
                return;
            }
        };

        let client = self.client.clone();
        let events = events.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    log::debug!("Tab {}: load {} abandoned", tab, ticket);
                    return;
                }
                result = client.get(&url) => match result {
                    Ok(response) => LoadOutcome::Loaded {
                        status: response.status,
                        bytes: response.len(),
                    },
                    Err(e) => LoadOutcome::Failed(e.into()),
                }
            };

            let _ = events.send(ShellEvent::LoadComplete { tab, ticket, outcome }).await;
        });
    }

    fn discard(&mut self, tab: TabId) {
        if let Some(cancel_token) = self.in_flight.remove(&tab) {
            cancel_token.cancel();
        }
    }
}
