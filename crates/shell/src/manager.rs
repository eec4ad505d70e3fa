//! Tab manager: owns every session and the active-tab pointer

use crate::session::{TabId, TabSession};

/// Ordered collection of tab sessions with exactly one visible.
///
/// Never empty: the first session is created on construction and the last
/// remaining session refuses to close.
#[derive(Debug)]
pub struct TabManager {
    /// All tabs, in creation order
    sessions: Vec<TabSession>,
    /// Currently visible tab
    active: TabId,
    /// Counter for generating unique tab IDs
    next_id: u32,
}

impl TabManager {
    /// Create a manager with one fresh session
    pub fn new() -> Self {
        let first = TabSession::new(TabId(0));
        log::info!("Created tab {} (total: 1)", first.id());
        Self {
            active: first.id(),
            sessions: vec![first],
            next_id: 1,
        }
    }

    /// Open a new session on its home view and make it active
    pub fn create_session(&mut self) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;

        self.sessions.push(TabSession::new(id));
        self.active = id;

        log::info!("Created tab {} (total: {})", id, self.sessions.len());
        id
    }

    /// Close a session
    ///
    /// No-op for the last remaining session or an unknown id. When the active
    /// tab closes, the tab now at its index (or the new last tab) takes over.
    pub fn close_session(&mut self, id: TabId) -> bool {
        if self.sessions.len() == 1 {
            log::debug!("Refusing to close the last tab");
            return false;
        }
        let Some(index) = self.index_of(id) else {
            return false;
        };

        self.sessions.remove(index);

        if self.active == id {
            let successor = index.min(self.sessions.len() - 1);
            self.active = self.sessions[successor].id();
        }

        log::info!(
            "Closed tab {} (total: {}, active: {})",
            id,
            self.sessions.len(),
            self.active
        );
        true
    }

    /// Make `id` the visible session. Unknown ids are ignored.
    pub fn switch_to(&mut self, id: TabId) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        self.active = id;
        true
    }

    /// Id of the visible session
    pub fn active_id(&self) -> TabId {
        self.active
    }

    /// The visible session
    pub fn active(&self) -> Option<&TabSession> {
        self.get(self.active)
    }

    /// The visible session, mutably
    pub fn active_mut(&mut self) -> Option<&mut TabSession> {
        self.get_mut(self.active)
    }

    /// Look up a session by id
    pub fn get(&self, id: TabId) -> Option<&TabSession> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    /// Look up a session by id, mutably
    pub fn get_mut(&mut self, id: TabId) -> Option<&mut TabSession> {
        self.sessions.iter_mut().find(|s| s.id() == id)
    }

    /// Position of a session in tab order
    pub fn index_of(&self, id: TabId) -> Option<usize> {
        self.sessions.iter().position(|s| s.id() == id)
    }

    /// All sessions in tab order
    pub fn sessions(&self) -> &[TabSession] {
        &self.sessions
    }

    /// Number of open tabs
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if there are no tabs
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}
