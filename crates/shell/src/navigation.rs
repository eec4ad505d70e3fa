//! Per-tab navigation history
//!
//! Handles back/forward navigation with a cursor into a history stack.

/// One visited page: the address loaded into the surface and what the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Proxied address (`prefix + encode(original)`)
    pub proxied: String,
    /// Resolved URL before encoding, shown in the address bar
    pub original: String,
}

/// History stack with a cursor
#[derive(Debug)]
pub struct HistoryStack {
    /// All entries, oldest first
    entries: Vec<HistoryEntry>,
    /// Current position (0-indexed, -1 if empty)
    cursor: i32,
}

impl HistoryStack {
    /// Create a new empty history
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: -1,
        }
    }

    /// Current cursor position, or `None` when empty
    pub fn cursor(&self) -> Option<usize> {
        usize::try_from(self.cursor).ok()
    }

    /// Entry under the cursor, if any
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor().and_then(|i| self.entries.get(i))
    }

    /// Check if we can step back
    pub fn can_step_back(&self) -> bool {
        self.cursor > 0
    }

    /// Check if we can step forward
    pub fn can_step_forward(&self) -> bool {
        self.cursor >= 0 && (self.cursor as usize) + 1 < self.entries.len()
    }

    /// Record a fresh navigation
    ///
    /// Anything after the cursor (pages we went back from) is discarded.
    pub fn push(&mut self, original: impl Into<String>, proxied: impl Into<String>) {
        let keep = (self.cursor + 1) as usize;
        if keep < self.entries.len() {
            log::debug!("Dropping {} forward entries", self.entries.len() - keep);
            self.entries.truncate(keep);
        }

        self.entries.push(HistoryEntry {
            proxied: proxied.into(),
            original: original.into(),
        });
        self.cursor = (self.entries.len() - 1) as i32;
    }

    /// Move one entry back
    ///
    /// Returns the new current entry, or `None` at the beginning.
    pub fn step_back(&mut self) -> Option<&HistoryEntry> {
        if !self.can_step_back() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    /// Move one entry forward
    ///
    /// Returns the new current entry, or `None` at the end.
    pub fn step_forward(&mut self) -> Option<&HistoryEntry> {
        if !self.can_step_forward() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    /// All entries, oldest first
    #[cfg(test)]
    fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}
