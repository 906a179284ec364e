//! # ecnn schema
//!
//! Node and mark types for article documents, the registry that holds
//! them, and the article vocabulary itself. Types are plain records with
//! parse and render rules stored as function values.

pub mod article;
pub mod attrs;
pub mod content;
pub mod context;
pub mod dom_spec;
pub mod embed;
pub mod error;
pub mod node_type;
pub mod parse_rule;
pub mod registry;
pub mod sanitize;

pub use article::{article_schema, TEXT_ALIGNMENTS};
pub use attrs::{attrs, AttrKind, AttrSpec, AttrValue, Attrs};
pub use content::{ContentExpr, Quantifier};
pub use context::{presentation_stylesheet, RenderContext, Theme};
pub use dom_spec::DomSpec;
pub use embed::{canonical_social_url, SocialPost, VideoEmbed};
pub use error::{AttrError, SchemaError};
pub use node_type::{MarkAllowance, MarkType, NodeCategory, NodeType, RenderFn};
pub use parse_rule::{ParseContent, ParseRule, Selector};
pub use registry::{Resolved, Schema};
pub use sanitize::{is_safe_color, is_safe_href};
