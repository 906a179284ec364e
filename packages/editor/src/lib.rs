//! # ecnn Editor
//!
//! Authoring core for article bodies: commands, history, active state and
//! asset placement on top of the document model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ html: markup ⇄ Document                     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditorSession                       │
//! │  - Commands build transactions              │
//! │  - History records inverses                 │
//! │  - Toolbar reads active state               │
//! │  - Uploads land at remapped positions       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ submission: ArticleDraft → backend          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Transactions are atomic**: a rejected transaction leaves the session as it was
//! 2. **Commands never mutate**: they read a state and return a transaction
//! 3. **Markup is the storage format**: the tree is rebuilt from it on load
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ecnn_editor::{Command, EditorConfig, EditorSession, FormatMark};
//!
//! let mut session = EditorSession::from_html(schema, "<p>Hello</p>", EditorConfig::default());
//! session.execute(&Command::ToggleMark(FormatMark::Bold))?;
//! session.undo()?;
//! let html = session.to_html();
//! ```

mod active;
mod asset;
mod commands;
mod config;
mod errors;
mod history;
mod session;
mod state;
mod submission;

pub use active::{can_apply, is_active, ActiveQuery, ToolbarState};
pub use asset::{
    insert_asset, AssetKind, AssetTicket, AssetUploader, LocalFile, UploadedAsset, MAX_ASSET_BYTES,
};
pub use commands::{insert_block_at, locate_cell, new_image, CellLocation, Command, FormatMark, TextAlign};
pub use config::{EditorConfig, DEFAULT_HISTORY_DEPTH};
pub use errors::{AssetError, CommandError, EditorError, EmbedKind, SubmitError, UploadError};
pub use history::{History, HistoryEntry};
pub use session::EditorSession;
pub use state::{marks_at, EditorState};
pub use submission::{
    prepare_draft, submit_draft, ArticleDraft, ArticleSubmitter, DraftStatus, SubmitReceipt, SUMMARY_LENGTH,
};
