//! Error types for the document model

use ecnn_schema::AttrError;
use std::fmt;
use thiserror::Error;

/// A structural problem found while validating a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: Vec<usize>,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: &[usize], message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {:?}: {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Why a single step could not be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("No node at {0:?}")]
    NoSuchNode(Vec<usize>),

    #[error("Offset {offset} is out of range for the node at {path:?} (width {width})")]
    OutOfRange {
        path: Vec<usize>,
        offset: usize,
        width: usize,
    },

    #[error("Unknown node type '{0}'")]
    UnknownNodeType(String),

    #[error("Unknown mark type '{0}'")]
    UnknownMarkType(String),

    #[error("Node type '{0}' cannot be split")]
    NotSplittable(String),

    #[error("Nodes at {0:?} cannot be joined with their previous sibling")]
    NotJoinable(Vec<usize>),

    #[error("Node at {0:?} cannot be unwrapped")]
    NotUnwrappable(Vec<usize>),

    #[error("Node at {0:?} has no inline content")]
    NotTextblock(Vec<usize>),

    #[error("Mark '{mark}' is not allowed in '{node}'")]
    MarkNotAllowed { mark: String, node: String },

    #[error("Mark '{0}' is already present in the range")]
    MarkPresent(String),

    #[error("Mark '{0}' is not present across the range")]
    MarkAbsent(String),

    #[error("Range {from}..{to} is empty or inverted")]
    EmptyRange { from: usize, to: usize },

    #[error(transparent)]
    Attr(#[from] AttrError),

    #[error("Invalid result {0}")]
    Invalid(#[from] ValidationError),
}

/// Why a transaction was rejected. The document is unchanged in every case.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("{}", describe_violation(.step, .reason))]
    SchemaViolation {
        /// Index of the failing step, `None` when the final result failed validation
        step: Option<usize>,
        reason: StepError,
    },

    #[error("Selection does not resolve in the resulting document")]
    InvalidSelection,

    #[error("Document is corrupted: {0}")]
    Corrupted(ValidationError),
}

fn describe_violation(step: &Option<usize>, reason: &StepError) -> String {
    match step {
        Some(index) => format!("Step {} violates the schema: {}", index, reason),
        None => format!("Transaction result violates the schema: {}", reason),
    }
}

impl TransactionError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransactionError::Corrupted(_))
    }
}
