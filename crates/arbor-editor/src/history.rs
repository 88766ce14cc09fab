//! Linear undo/redo over whole-document snapshots.
//!
//! The top of the undo stack is always the current state, so undo pops it
//! onto the redo stack and restores whatever is underneath. Every new
//! snapshot clears the redo stack.

use arbor_core::id::NodeId;
use arbor_core::model::Diagram;

pub const MAX_HISTORY: usize = 100;

/// Everything a snapshot restores.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub diagram: Diagram,
    pub selected: NodeId,
    pub highlighted: Option<NodeId>,
}

#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_depth: usize,
}

impl History {
    /// Start a history whose only entry is `initial`.
    pub fn new(initial: Snapshot, max_depth: usize) -> Self {
        Self {
            undo_stack: vec![initial],
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record `state` as the new current state.
    pub fn record(&mut self, state: Snapshot) {
        self.undo_stack.push(state);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Step back. Returns the state to restore, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.undo_stack.len() < 2 {
            return None;
        }
        let current = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        self.undo_stack.last()
    }

    /// Step forward again. Returns the state to restore.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(next);
        self.undo_stack.last()
    }

    /// The state the session should currently be showing.
    pub fn current(&self) -> Option<&Snapshot> {
        self.undo_stack.last()
    }

    /// Drop everything and start over from `state` (after loading a file).
    pub fn reset(&mut self, state: Snapshot) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push(state);
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }
}
