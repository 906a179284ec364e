//! # ecnn html
//!
//! Converts article documents to markup and back. For every document the
//! editor can produce, `deserialize(serialize(doc))` yields an equal tree.

pub mod deserializer;
pub mod serializer;

pub use deserializer::{deserialize, deserialize_with_report, ParseReport};
pub use serializer::{serialize, serialize_node, serialize_with, SerializeOptions};
