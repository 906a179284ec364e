//! # Undo/Redo History
//!
//! Records committed transactions so they can be reverted and replayed.
//!
//! ## Design
//!
//! - Each entry keeps the committed steps and the inverses reported when
//!   they were applied, plus the selection on either side
//! - Undo applies the inverses and restores the earlier selection
//! - Redo reapplies the original steps and restores the later selection
//! - New entries clear the redo stack
//! - Batches group several transactions into one entry
//!
//! ```text
//!   undo_stack: [e1, e2, e3]      redo_stack: []
//!        undo() ──► inverses of e3 applied
//!   undo_stack: [e1, e2]          redo_stack: [e3]
//!        redo() ──► steps of e3 applied
//!   undo_stack: [e1, e2, e3]      redo_stack: []
//! ```

use crate::config::DEFAULT_HISTORY_DEPTH;
use crate::state::EditorState;
use ecnn_model::{AppliedTransaction, Selection, Step, Transaction, TransactionError};

/// One undoable unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Steps in application order
    pub steps: Vec<Step>,

    /// Steps reverting `steps`, in application order
    pub inverses: Vec<Step>,

    pub selection_before: Selection,
    pub selection_after: Selection,
    pub label: Option<String>,
}

impl HistoryEntry {
    fn undo_transaction(&self) -> Transaction {
        Transaction {
            steps: self.inverses.clone(),
            selection: Some(self.selection_before.clone()),
            label: self.label.clone(),
            ..Transaction::default()
        }
        .without_history()
    }

    fn redo_transaction(&self) -> Transaction {
        Transaction {
            steps: self.steps.clone(),
            selection: Some(self.selection_after.clone()),
            label: self.label.clone(),
            ..Transaction::default()
        }
        .without_history()
    }

    /// Fold a later entry into this one
    fn absorb(&mut self, later: HistoryEntry) {
        self.steps.extend(later.steps);
        let mut inverses = later.inverses;
        inverses.append(&mut self.inverses);
        self.inverses = inverses;
        self.selection_after = later.selection_after;
        if self.label.is_none() {
            self.label = later.label;
        }
    }
}

/// Undo/redo stacks for one editing session
#[derive(Debug, Clone)]
pub struct History {
    /// Committed entries (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Undone entries (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Entry being assembled by an open batch
    current_batch: Option<Batch>,
}

#[derive(Debug, Clone, Default)]
struct Batch {
    entry: Option<HistoryEntry>,
    label: Option<String>,
}

impl History {
    /// History with the default depth (100)
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_HISTORY_DEPTH)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Record a committed entry, folding it into the open batch if any
    pub fn record(&mut self, entry: HistoryEntry) {
        match &mut self.current_batch {
            Some(batch) => match &mut batch.entry {
                Some(open) => open.absorb(entry),
                None => batch.entry = Some(entry),
            },
            None => self.push_entry(entry),
        }
    }

    /// Start grouping recorded entries into one undo step
    pub fn begin_batch(&mut self) {
        self.current_batch = Some(Batch::default());
    }

    /// Close the open batch and push it, unless it recorded nothing
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if let Some(mut entry) = batch.entry {
                if batch.label.is_some() {
                    entry.label = batch.label;
                }
                self.push_entry(entry);
            }
        }
    }

    pub fn set_batch_label(&mut self, label: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            batch.label = Some(label.into());
        }
    }

    pub fn is_batching(&self) -> bool {
        self.current_batch.is_some()
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// Revert the most recent entry against `state`.
    ///
    /// Returns `None` when there is nothing to undo. On failure the entry
    /// stays where it was.
    pub fn undo(
        &mut self,
        state: &EditorState,
    ) -> Result<Option<(EditorState, AppliedTransaction)>, TransactionError> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(None);
        };
        match state.apply(&entry.undo_transaction()) {
            Ok(result) => {
                self.redo_stack.push(entry);
                Ok(Some(result))
            }
            Err(err) => {
                self.undo_stack.push(entry);
                Err(err)
            }
        }
    }

    /// Replay the most recently undone entry against `state`
    pub fn redo(
        &mut self,
        state: &EditorState,
    ) -> Result<Option<(EditorState, AppliedTransaction)>, TransactionError> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(None);
        };
        match state.apply(&entry.redo_transaction()) {
            Ok(result) => {
                self.undo_stack.push(entry);
                Ok(Some(result))
            }
            Err(err) => {
                self.redo_stack.push(entry);
                Err(err)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }

    /// Label of the entry `undo` would revert
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().and_then(|e| e.label.as_deref())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().and_then(|e| e.label.as_deref())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
