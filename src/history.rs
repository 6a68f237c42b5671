//! Snapshot-based undo/redo over the shape graph.
//!
//! History is a linear, append-only list of labeled deep copies of the layer
//! stack, with a movable index. Snapshots are explicit structural clones,
//! decoupled from the live model; raster pixel content stays in the asset
//! store and is referenced by id, so snapshots stay cheap. There is no
//! branching: pushing after an undo discards the redo tail.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layers::Layer;

/// A complete copy of the document's layers at one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub label: String,
    pub layers: Vec<Layer>,
}

/// Linear history with a movable pointer. The index is `-1` only while the
/// list is empty; every session seeds a baseline entry at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    entries: Vec<Snapshot>,
    index: isize,
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: -1,
        }
    }

    /// Rebuild from persisted parts. An out-of-range index is clamped.
    pub fn from_parts(entries: Vec<Snapshot>, index: isize) -> Self {
        let index = index.clamp(-1, entries.len() as isize - 1);
        Self { entries, index }
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    pub fn index(&self) -> isize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.entries.len() as isize - 1
    }

    /// Record a commit. Any redo tail beyond the current index is discarded
    /// first. A snapshot structurally identical to the current entry is
    /// skipped entirely, so no-op commits never grow the history. Returns
    /// whether an entry was pushed.
    pub fn push(&mut self, label: impl Into<String>, layers: &[Layer]) -> bool {
        self.entries.truncate((self.index + 1) as usize);

        if let Some(current) = self.current() {
            if current.layers == layers {
                return false;
            }
        }

        let label = label.into();
        debug!(%label, index = self.entries.len(), "history push");
        self.entries.push(Snapshot {
            label,
            layers: layers.to_vec(),
        });
        self.index = self.entries.len() as isize - 1;
        true
    }

    /// The snapshot at the current index, if any.
    pub fn current(&self) -> Option<&Snapshot> {
        if self.index < 0 {
            None
        } else {
            self.entries.get(self.index as usize)
        }
    }

    /// Step back one entry. No-op at (or before) the baseline.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.index <= 0 {
            return None;
        }
        self.index -= 1;
        debug!(index = self.index, "undo");
        self.current()
    }

    /// Step forward one entry. No-op at the newest entry.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.index >= self.entries.len() as isize - 1 {
            return None;
        }
        self.index += 1;
        debug!(index = self.index, "redo");
        self.current()
    }

    /// Jump straight to an arbitrary entry without replaying intermediate
    /// states.
    pub fn jump_to(&mut self, index: usize) -> Option<&Snapshot> {
        if index >= self.entries.len() {
            return None;
        }
        self.index = index as isize;
        self.current()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
