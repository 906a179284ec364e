//! Transactions and the incremental transform used to build them

use crate::document::Document;
use crate::error::StepError;
use crate::mapping::Mapping;
use crate::node::Mark;
use crate::position::Selection;
use crate::step::Step;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// An atomic batch of steps plus the state that travels with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub steps: Vec<Step>,
    /// Selection after the transaction; mapped from the old one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    /// Marks applied to the next typed text; `Some(vec![])` clears them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_marks: Option<Vec<Mark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default = "default_true")]
    pub add_to_history: bool,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            selection: None,
            stored_marks: None,
            label: None,
            add_to_history: true,
        }
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transaction that only moves the selection
    pub fn select(selection: Selection) -> Self {
        Self {
            selection: Some(selection),
            add_to_history: false,
            ..Self::default()
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_stored_marks(mut self, marks: Vec<Mark>) -> Self {
        self.stored_marks = Some(marks);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn without_history(mut self) -> Self {
        self.add_to_history = false;
        self
    }

    pub fn is_selection_only(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Result of applying a transaction
#[derive(Debug, Clone)]
pub struct AppliedTransaction {
    pub doc: Document,
    /// Steps undoing the transaction, in application order
    pub inverses: Vec<Step>,
    pub mapping: Mapping,
}

/// Builds a step list against a working copy, so each step can be computed
/// from the document left by the previous ones.
#[derive(Debug, Clone)]
pub struct Transform {
    doc: Document,
    steps: Vec<Step>,
    mapping: Mapping,
}

impl Transform {
    pub fn new(doc: &Document) -> Self {
        Self {
            doc: doc.clone(),
            steps: Vec::new(),
            mapping: Mapping::new(),
        }
    }

    /// Apply a step to the working copy and record it
    pub fn step(&mut self, step: Step) -> Result<&mut Self, StepError> {
        let outcome = self.doc.apply_step(&step)?;
        self.mapping.push(outcome.map);
        self.steps.push(step);
        Ok(self)
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_transaction(self) -> Transaction {
        Transaction {
            steps: self.steps,
            ..Transaction::default()
        }
    }
}
