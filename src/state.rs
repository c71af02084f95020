//! Construction state tree
//!
//! Path-addressed store of per-slot argument selections for one editing
//! session. Owned by exactly one session at a time; operations are
//! synchronous and non-concurrent, so there is no internal locking.
//!
//! Invariant: the slot array at a path always matches the arity of the
//! definition being refined there. Invariant: replacing or clearing slot `i`
//! at path `p` removes every entry below `p + [i]` — a stale sub-tree must
//! never outlive the argument it refines.

use crate::path::ConstructionPath;
use crate::types::TypeNode;
use std::collections::HashMap;

/// Selections and expansion marker for one node of the argument tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotEntry {
    /// One cell per generic parameter of the definition at this path.
    pub slots: Vec<Option<TypeNode>>,
    /// Which slot, if any, currently shows its nested construction UI.
    pub expanded: Option<usize>,
}

/// Mutable, path-addressed store for an in-progress construction.
#[derive(Debug, Clone, Default)]
pub struct ConstructionState {
    entries: HashMap<ConstructionPath, SlotEntry>,
}

impl ConstructionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_entry(&self, path: &ConstructionPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get_slots(&self, path: &ConstructionPath) -> Option<&[Option<TypeNode>]> {
        self.entries.get(path).map(|entry| entry.slots.as_slice())
    }

    /// Create the entry at `path` with `arity` empty slots if absent.
    pub fn ensure_entry(&mut self, path: ConstructionPath, arity: usize) {
        self.entries.entry(path).or_insert_with(|| SlotEntry {
            slots: vec![None; arity],
            expanded: None,
        });
    }

    /// Replace the whole slot array at `path`. Every recorded sub-tree below
    /// `path` is discarded, since all of its refinements are now stale.
    pub fn set_slots(&mut self, path: ConstructionPath, slots: Vec<Option<TypeNode>>) {
        self.clear_descendants(&path);
        let entry = self.entries.entry(path).or_default();
        entry.slots = slots;
        entry.expanded = None;
    }

    /// Write one slot, discarding the sub-tree that refined its previous
    /// value. Returns false when no entry exists at `path` or the index is
    /// out of range; nothing is written in that case.
    pub fn set_slot(&mut self, path: &ConstructionPath, index: usize, value: Option<TypeNode>) -> bool {
        let child = path.child(index as u32);
        match self.entries.get_mut(path) {
            Some(entry) if index < entry.slots.len() => {
                entry.slots[index] = value;
                if entry.expanded == Some(index) {
                    entry.expanded = None;
                }
            }
            _ => return false,
        }
        self.clear_subtree(&child);
        true
    }

    pub fn expanded_index(&self, path: &ConstructionPath) -> Option<usize> {
        self.entries.get(path).and_then(|entry| entry.expanded)
    }

    /// Returns false when no entry exists at `path`.
    pub fn set_expanded_index(&mut self, path: &ConstructionPath, index: Option<usize>) -> bool {
        match self.entries.get_mut(path) {
            Some(entry) => {
                entry.expanded = index;
                true
            }
            None => false,
        }
    }

    /// Remove the entry at `path` and every strict descendant.
    pub fn clear_path(&mut self, path: &ConstructionPath) {
        self.clear_subtree(path);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear_subtree(&mut self, root: &ConstructionPath) {
        self.entries
            .retain(|path, _| !(path == root || path.is_strict_descendant_of(root)));
    }

    fn clear_descendants(&mut self, root: &ConstructionPath) {
        self.entries
            .retain(|path, _| !path.is_strict_descendant_of(root));
    }
}
