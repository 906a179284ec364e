//! # Editor Session
//!
//! One author editing one article. The session owns the state and the
//! history, and is the only place transactions are committed.
//!
//! Pending asset uploads are tracked here as tickets holding a position.
//! Each commit remaps them, and a closed session ignores late results.

use crate::active::{can_apply, is_active, ActiveQuery, ToolbarState};
use crate::asset::{AssetKind, AssetTicket, UploadedAsset};
use crate::commands::{insert_block_at, new_image, Command};
use crate::config::EditorConfig;
use crate::errors::{AssetError, EditorError, UploadError};
use crate::history::{History, HistoryEntry};
use crate::state::EditorState;
use ecnn_html::{deserialize_with_report, serialize};
use ecnn_model::{Document, Mapping, Position, Selection, Transaction};
use ecnn_schema::Schema;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Upload waiting to be placed
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingAsset {
    ticket: AssetTicket,
    position: Position,
}

pub struct EditorSession {
    state: EditorState,
    history: History,
    config: EditorConfig,
    pending_assets: Vec<PendingAsset>,
    next_ticket: u64,
    cover_image: Option<String>,
    closed: bool,
}

impl EditorSession {
    pub fn new(doc: Document) -> Self {
        Self::with_config(doc, EditorConfig::default())
    }

    pub fn with_config(doc: Document, config: EditorConfig) -> Self {
        Self {
            state: EditorState::new(doc),
            history: History::with_max_levels(config.history_depth),
            config,
            pending_assets: Vec::new(),
            next_ticket: 1,
            cover_image: None,
            closed: false,
        }
    }

    /// Open stored markup for editing
    pub fn from_html(schema: Arc<Schema>, markup: &str, config: EditorConfig) -> Self {
        let (doc, report) = deserialize_with_report(schema, markup);
        if !report.is_clean() {
            warn!(repairs = report.repairs.len(), "markup needed repairs");
            for repair in &report.repairs {
                debug!(%repair, "repair");
            }
        }
        Self::with_config(doc, config)
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn doc(&self) -> &Document {
        &self.state.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Build and commit a command
    pub fn execute(&mut self, command: &Command) -> Result<(), EditorError> {
        if self.closed {
            return Err(EditorError::Closed);
        }
        let tx = command.build(&self.state).map_err(|err| {
            debug!(command = command.label(), %err, "command not applied");
            err
        })?;
        self.dispatch(tx)
    }

    /// Commit a transaction. On failure nothing changes.
    pub fn dispatch(&mut self, tx: Transaction) -> Result<(), EditorError> {
        if self.closed {
            return Err(EditorError::Closed);
        }
        let (next, applied) = self.state.apply(&tx).map_err(|err| {
            if err.is_fatal() {
                error!(%err, "transaction rejected");
            } else {
                warn!(%err, "transaction rejected");
            }
            err
        })?;
        self.remap_assets(&applied.mapping);

        if !tx.steps.is_empty() {
            info!(steps = tx.steps.len(), label = ?tx.label, "committed transaction");
            if tx.add_to_history {
                self.history.record(HistoryEntry {
                    steps: tx.steps,
                    inverses: applied.inverses,
                    selection_before: self.state.selection.clone(),
                    selection_after: next.selection.clone(),
                    label: tx.label,
                });
            }
        }
        self.state = next;
        Ok(())
    }

    /// Revert the last history entry; `false` when there is none
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        if self.closed {
            return Err(EditorError::Closed);
        }
        let label = self.history.undo_label().map(str::to_string);
        match self.history.undo(&self.state)? {
            Some((next, applied)) => {
                self.remap_assets(&applied.mapping);
                self.state = next;
                info!(?label, "undo");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        if self.closed {
            return Err(EditorError::Closed);
        }
        let label = self.history.redo_label().map(str::to_string);
        match self.history.redo(&self.state)? {
            Some((next, applied)) => {
                self.remap_assets(&applied.mapping);
                self.state = next;
                info!(?label, "redo");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Group the following commits into one undo step
    pub fn begin_batch(&mut self, label: impl Into<String>) {
        self.history.begin_batch();
        self.history.set_batch_label(label);
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    pub fn can_execute(&self, command: &Command) -> bool {
        !self.closed && can_apply(&self.state, command)
    }

    pub fn is_active(&self, query: &ActiveQuery) -> bool {
        is_active(&self.state, query)
    }

    pub fn toolbar(&self) -> ToolbarState {
        ToolbarState::new(&self.state, &self.history)
    }

    /// Markup for the current document in the configured theme
    pub fn to_html(&self) -> String {
        serialize(&self.state.doc, &self.config.render_context())
    }

    /// Reserve a place for an upload at the current head
    pub fn request_asset(&mut self, kind: AssetKind) -> Result<AssetTicket, AssetError> {
        if self.closed {
            return Err(AssetError::SessionClosed);
        }
        let ticket = AssetTicket {
            id: self.next_ticket,
            kind,
        };
        self.next_ticket += 1;
        self.pending_assets.push(PendingAsset {
            ticket,
            position: self.state.selection.head.clone(),
        });
        debug!(ticket = ticket.id, ?kind, "asset requested");
        Ok(ticket)
    }

    /// Place a finished upload.
    ///
    /// Returns `Ok(false)` when the session closed in the meantime. A
    /// failed upload leaves the document untouched.
    pub fn resolve_asset(
        &mut self,
        ticket: AssetTicket,
        result: Result<UploadedAsset, UploadError>,
    ) -> Result<bool, EditorError> {
        if self.closed {
            debug!(ticket = ticket.id, "session closed, dropping asset");
            return Ok(false);
        }
        let index = self
            .pending_assets
            .iter()
            .position(|pending| pending.ticket.id == ticket.id)
            .ok_or(AssetError::UnknownTicket(ticket.id))?;
        let pending = self.pending_assets.remove(index);

        let asset = match result {
            Ok(asset) => asset,
            Err(err) => {
                warn!(ticket = ticket.id, %err, "asset upload failed");
                return Err(AssetError::UploadFailed(err).into());
            }
        };

        match pending.ticket.kind {
            AssetKind::Cover => {
                info!(url = %asset.access_url, "cover image set");
                self.cover_image = Some(asset.access_url);
            }
            AssetKind::ContentImage => {
                let image = new_image(self.state.schema(), &asset.access_url, None, None)?;
                let position = self.state.doc.snap(&pending.position);
                let (transform, path) = insert_block_at(&self.state.doc, &position, image)?;
                debug!(ticket = ticket.id, ?path, "placing image");
                self.dispatch(transform.into_transaction().with_label("Insert image"))?;
            }
        }
        Ok(true)
    }

    fn remap_assets(&mut self, mapping: &Mapping) {
        for pending in &mut self.pending_assets {
            pending.position = mapping.map(&pending.position);
        }
    }

    pub fn pending_assets(&self) -> usize {
        self.pending_assets.len()
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.cover_image.as_deref()
    }

    /// Stop accepting edits; late uploads are dropped
    pub fn close(&mut self) {
        if !self.closed {
            info!(dropped_assets = self.pending_assets.len(), "session closed");
        }
        self.closed = true;
        self.pending_assets.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::FormatMark;
    use ecnn_schema::article_schema;

    fn session() -> EditorSession {
        EditorSession::from_html(
            Arc::new(article_schema().unwrap()),
            "<p>Hello world</p>",
            EditorConfig::default(),
        )
    }

    #[test]
    fn test_execute_records_history() {
        let mut session = session();
        session
            .execute(&Command::SetSelection(Selection::new(
                Position::new(vec![0], 0),
                Position::new(vec![0], 5),
            )))
            .unwrap();
        assert!(!session.history().can_undo());

        session.execute(&Command::ToggleMark(FormatMark::Bold)).unwrap();
        assert_eq!(session.to_html(), "<p><strong>Hello</strong> world</p>");
        assert_eq!(session.history().undo_label(), Some("Bold"));

        assert!(session.undo().unwrap());
        assert_eq!(session.to_html(), "<p>Hello world</p>");
        assert!(session.redo().unwrap());
        assert!(session.toolbar().bold);
    }

    #[test]
    fn test_batch_groups_commits() {
        let mut session = session();
        session
            .execute(&Command::SetSelection(Selection::caret(Position::new(vec![0], 11))))
            .unwrap();
        session.begin_batch("Typing");
        session.execute(&Command::InsertText("!".into())).unwrap();
        session.execute(&Command::InsertText("?".into())).unwrap();
        session.end_batch();
        assert_eq!(session.history().undo_levels(), 1);
        assert!(session.undo().unwrap());
        assert_eq!(session.doc().text_content(), "Hello world");
    }

    #[test]
    fn test_cover_upload_sets_cover_without_touching_tree() {
        let mut session = session();
        let before = session.doc().clone();
        let ticket = session.request_asset(AssetKind::Cover).unwrap();
        let placed = session
            .resolve_asset(
                ticket,
                Ok(UploadedAsset {
                    access_url: "https://cdn.example/cover.jpg".into(),
                }),
            )
            .unwrap();
        assert!(placed);
        assert_eq!(session.cover_image(), Some("https://cdn.example/cover.jpg"));
        assert_eq!(session.doc(), &before);
        assert!(matches!(
            session.resolve_asset(ticket, Err(UploadError::Cancelled)),
            Err(EditorError::Asset(AssetError::UnknownTicket(1)))
        ));
    }

    #[test]
    fn test_closed_session_rejects_edits() {
        let mut session = session();
        session.close();
        assert!(session.is_closed());
        assert_eq!(
            session.execute(&Command::InsertText("x".into())),
            Err(EditorError::Closed)
        );
        assert!(!session.can_execute(&Command::SetParagraph));
        assert_eq!(session.request_asset(AssetKind::Cover), Err(AssetError::SessionClosed));
    }
}
