//! # ecnn model
//!
//! The article document tree, the primitive steps that edit it, and the
//! transactions that group steps into atomic changes.
//!
//! ```text
//! Transaction ──▶ Document::apply ──▶ working copy ──▶ validate ──▶ AppliedTransaction
//!                                          │                          (doc, inverses, mapping)
//!                                          └── any failure: original document untouched
//! ```

pub mod document;
pub mod error;
pub mod mapping;
pub mod node;
pub mod position;
pub mod step;
pub mod transaction;

pub use document::{normalize_tree, Document, LoadError, ResolvedPos, TextRange};
pub use error::{StepError, TransactionError, ValidationError};
pub use mapping::{Mapping, StepMap};
pub use node::{
    inline_width, leaf_after, leaf_before, map_inline_range, normalize_inline, slice_inline,
    split_inline, Mark, Node, NodeSpec,
};
pub use position::{Position, Selection};
pub use step::{content_width, Step, StepOutcome};
pub use transaction::{AppliedTransaction, Transaction, Transform};
