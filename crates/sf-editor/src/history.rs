//! Per-page undo/redo history built from serialized snapshots.
//!
//! The stack is linear: recording after an undo discards the redo branch.
//! Index 0 holds the page's state at mount time; the total length is
//! capped and the oldest snapshots are dropped first.

pub struct HistoryManager {
    snapshots: Vec<String>,
    /// Position of the snapshot currently shown on the canvas.
    index: usize,
    limit: usize,
}

impl HistoryManager {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            snapshots: Vec::with_capacity(limit.min(64)),
            index: 0,
            limit,
        }
    }

    /// Establish the initial snapshot. Only the first call has any effect,
    /// so a remount cannot duplicate the base entry.
    pub fn initialize(&mut self, snapshot: String) -> bool {
        if !self.snapshots.is_empty() {
            return false;
        }
        self.snapshots.push(snapshot);
        self.index = 0;
        true
    }

    /// Append a snapshot after the current position, discarding any redo
    /// snapshots beyond it.
    pub fn record(&mut self, snapshot: String) {
        if self.snapshots.is_empty() {
            self.initialize(snapshot);
            return;
        }
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.limit {
            let excess = self.snapshots.len() - self.limit;
            self.snapshots.drain(..excess);
        }
        self.index = self.snapshots.len() - 1;
        log::trace!("history: {} snapshots, at {}", self.snapshots.len(), self.index);
    }

    /// Step back one snapshot and return it for loading.
    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(&self.snapshots[self.index])
    }

    /// Step forward one snapshot and return it for loading.
    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(&self.snapshots[self.index])
    }

    /// The snapshot `undo` would step back to, without moving.
    pub fn peek_undo(&self) -> Option<&str> {
        let index = self.index.checked_sub(1)?;
        self.snapshots.get(index).map(String::as_str)
    }

    /// The snapshot `redo` would step forward to, without moving.
    pub fn peek_redo(&self) -> Option<&str> {
        self.snapshots.get(self.index + 1).map(String::as_str)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    pub fn current(&self) -> Option<&str> {
        self.snapshots.get(self.index).map(String::as_str)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
