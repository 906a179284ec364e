//! # ecnn markup
//!
//! Tokenizer and generic element tree for article HTML. This is the input
//! side of the deserializer; it knows nothing about the article schema.

pub mod entities;
pub mod lexer;
pub mod style;
pub mod tree;

pub use entities::{decode_entities, escape_attr, escape_text};
pub use style::{parse_style, style_property};
pub use tree::{is_void, parse_fragment, Element, MarkupNode};
