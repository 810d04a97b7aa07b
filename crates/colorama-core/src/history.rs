//! Bounded undo/redo history of raster snapshots.

use crate::raster::RasterSnapshot;
use std::collections::VecDeque;

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Linear snapshot history with a cursor.
///
/// Recording after an undo discards the redo tail. When the capacity is
/// exceeded the oldest snapshot is dropped.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<RasterSnapshot>,
    cursor: Option<usize>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Create an empty history. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            capacity: capacity.max(1),
        }
    }

    /// Push a snapshot and make it current.
    pub fn record(&mut self, snapshot: RasterSnapshot) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push_back(snapshot);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            log::debug!("History full, dropped oldest snapshot");
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step back. Returns the snapshot to restore, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&RasterSnapshot> {
        match self.cursor {
            Some(c) if c > 0 => {
                self.cursor = Some(c - 1);
                self.entries.get(c - 1)
            }
            _ => None,
        }
    }

    /// Step forward. Returns the snapshot to restore, or `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&RasterSnapshot> {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.entries.len() {
            self.cursor = Some(next);
            self.entries.get(next)
        } else {
            None
        }
    }

    /// The snapshot the surface is expected to match.
    pub fn current(&self) -> Option<&RasterSnapshot> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.entries.len()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, dropping the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.cursor = self.cursor.map(|c| c.saturating_sub(1));
        }
    }

    /// Drop everything and start again from `baseline`.
    pub fn reset(&mut self, baseline: RasterSnapshot) {
        self.entries.clear();
        self.cursor = None;
        self.record(baseline);
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}
