//! Error types for the editor

use ecnn_model::{StepError, TransactionError};
use ecnn_schema::AttrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which embed pattern a URL was checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmbedKind {
    Video,
    SocialPost,
}

impl fmt::Display for EmbedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedKind::Video => write!(f, "video"),
            EmbedKind::SocialPost => write!(f, "social post"),
        }
    }
}

/// Why a command produced no transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command does not apply here: {0}")]
    Unapplicable(String),

    #[error("Not a {kind} link: {url}")]
    InvalidEmbedUrl { kind: EmbedKind, url: String },
}

impl CommandError {
    pub(crate) fn unapplicable(reason: impl Into<String>) -> Self {
        CommandError::Unapplicable(reason.into())
    }
}

impl From<StepError> for CommandError {
    fn from(e: StepError) -> Self {
        CommandError::Unapplicable(e.to_string())
    }
}

impl From<AttrError> for CommandError {
    fn from(e: AttrError) -> Self {
        CommandError::Unapplicable(e.to_string())
    }
}

/// Failure reported by an asset uploader
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Upload failed: {0}")]
    Transport(String),

    #[error("Upload was cancelled")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Asset upload failed: {0}")]
    UploadFailed(#[from] UploadError),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Editor session is closed")]
    SessionClosed,

    #[error("No pending asset request with id {0}")]
    UnknownTicket(u64),
}

/// Failure reported by an article submitter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Submission refused: {0}")]
    Refused(String),

    #[error("Submission failed: {0}")]
    Transport(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Draft cannot be submitted: {0}")]
    SubmissionRejected(String),

    #[error("Submit error: {0}")]
    Submit(#[from] SubmitError),

    #[error("Editor session is closed")]
    Closed,
}

impl EditorError {
    /// Whether the session should be abandoned
    pub fn is_fatal(&self) -> bool {
        matches!(self, EditorError::Transaction(e) if e.is_fatal())
    }
}
