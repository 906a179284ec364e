use thiserror::Error;

/// Errors raised while building a schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Node type '{0}' is already registered")]
    DuplicateNode(String),

    #[error("Mark type '{0}' is already registered")]
    DuplicateMark(String),

    #[error("Invalid content expression '{expr}' for '{node}': {reason}")]
    InvalidContent {
        node: String,
        expr: String,
        reason: String,
    },

    #[error("Content expression of '{node}' references unknown node type or group '{name}'")]
    UnknownReference { node: String, name: String },

    #[error("Node type '{node}' allows unknown mark '{mark}'")]
    UnknownMark { node: String, mark: String },

    #[error("Schema has no '{0}' node type")]
    MissingNode(String),
}

/// Errors raised while checking attributes against a type's declaration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttrError {
    #[error("'{owner}' requires attribute '{attr}'")]
    Missing { owner: String, attr: String },

    #[error("Attribute '{attr}' of '{owner}' expects {expected}")]
    WrongType {
        owner: String,
        attr: String,
        expected: &'static str,
    },

    #[error("Value {value} is not allowed for attribute '{attr}' of '{owner}'")]
    NotAllowed {
        owner: String,
        attr: String,
        value: String,
    },

    #[error("Unknown type '{0}'")]
    UnknownType(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
