//! # Commands
//!
//! Toolbar and keyboard operations. A command reads an [`EditorState`] and
//! either builds a [`Transaction`] or explains why it does not apply; it
//! never touches the state itself. Commands that build steps do so on a
//! [`Transform`], so every step sees the document left by the previous one.
//!
//! ```text
//! Command ──build(state)──► Transaction ──session.dispatch──► new state
//!                 └──────► CommandError (nothing happens)
//! ```

mod blocks;
mod insert;
mod marks;
mod table;
mod text;

pub use insert::{insert_block_at, new_image};
pub use table::{locate_cell, CellLocation};

pub(crate) use marks::mark_active;

use crate::errors::CommandError;
use crate::state::EditorState;
use ecnn_model::{Document, Node, Position, ResolvedPos, Selection, Step, Transaction, Transform};
use ecnn_schema::{Attrs, NodeType, Schema};
use serde::{Deserialize, Serialize};

/// Inline formats toggled by a single button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormatMark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
}

impl FormatMark {
    pub const ALL: [FormatMark; 5] = [
        FormatMark::Bold,
        FormatMark::Italic,
        FormatMark::Underline,
        FormatMark::Strike,
        FormatMark::Code,
    ];

    /// Mark type name in the article schema
    pub fn name(self) -> &'static str {
        match self {
            FormatMark::Bold => "bold",
            FormatMark::Italic => "italic",
            FormatMark::Underline => "underline",
            FormatMark::Strike => "strike",
            FormatMark::Code => "code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

/// Every operation the authoring toolbar and keyboard can request.
///
/// Prompted values (colours, URLs, table sizes) arrive already elicited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "camelCase")]
pub enum Command {
    // Marks
    ToggleMark(FormatMark),
    SetLink {
        href: String,
        #[serde(default)]
        target: Option<String>,
    },
    UnsetLink,
    SetColor(String),
    UnsetColor,
    SetHighlight(Option<String>),
    UnsetHighlight,
    ToggleHighlight,

    // Blocks
    SetParagraph,
    ToggleHeading(u8),
    ToggleCodeBlock,
    SetTextAlign(TextAlign),
    ToggleBlockquote,
    ToggleBulletList,
    ToggleOrderedList,
    ToggleTaskList,
    ToggleTaskChecked,
    InsertHorizontalRule,

    // Text
    InsertText(String),
    InsertHardBreak,
    SplitBlock,
    DeleteBackward,
    DeleteSelection,
    SetSelection(Selection),

    // Tables
    #[serde(rename_all = "camelCase")]
    InsertTable {
        rows: usize,
        cols: usize,
        #[serde(default)]
        with_header_row: bool,
    },
    AddColumnBefore,
    AddColumnAfter,
    AddRowBefore,
    AddRowAfter,
    DeleteColumn,
    DeleteRow,
    DeleteTable,

    // Embeds and assets
    InsertImage {
        src: String,
        #[serde(default)]
        alt: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },
    InsertVideo(String),
    InsertSocialPost(String),
}

impl Command {
    /// Build the transaction this command stands for
    pub fn build(&self, state: &EditorState) -> Result<Transaction, CommandError> {
        let tx = match self {
            Command::ToggleMark(mark) => marks::toggle_format(state, *mark),
            Command::SetLink { href, target } => marks::set_link(state, href, target.as_deref()),
            Command::UnsetLink => marks::unset_link(state),
            Command::SetColor(color) => marks::set_color(state, color),
            Command::UnsetColor => marks::unset_mark(state, "text_style"),
            Command::SetHighlight(color) => marks::set_highlight(state, color.as_deref()),
            Command::UnsetHighlight => marks::unset_mark(state, "highlight"),
            Command::ToggleHighlight => marks::toggle_highlight(state),

            Command::SetParagraph => blocks::set_paragraph(state),
            Command::ToggleHeading(level) => blocks::toggle_heading(state, *level),
            Command::ToggleCodeBlock => blocks::toggle_code_block(state),
            Command::SetTextAlign(align) => blocks::set_text_align(state, *align),
            Command::ToggleBlockquote => blocks::toggle_blockquote(state),
            Command::ToggleBulletList => blocks::toggle_list(state, "bullet_list"),
            Command::ToggleOrderedList => blocks::toggle_list(state, "ordered_list"),
            Command::ToggleTaskList => blocks::toggle_list(state, "task_list"),
            Command::ToggleTaskChecked => blocks::toggle_task_checked(state),
            Command::InsertHorizontalRule => insert::insert_horizontal_rule(state),

            Command::InsertText(text) => text::insert_text(state, text),
            Command::InsertHardBreak => text::insert_hard_break(state),
            Command::SplitBlock => text::split_block(state),
            Command::DeleteBackward => text::delete_backward(state),
            Command::DeleteSelection => text::delete_selection(state),
            Command::SetSelection(selection) => text::set_selection(state, selection),

            Command::InsertTable {
                rows,
                cols,
                with_header_row,
            } => table::insert_table(state, *rows, *cols, *with_header_row),
            Command::AddColumnBefore => table::add_column(state, false),
            Command::AddColumnAfter => table::add_column(state, true),
            Command::AddRowBefore => table::add_row(state, false),
            Command::AddRowAfter => table::add_row(state, true),
            Command::DeleteColumn => table::delete_column(state),
            Command::DeleteRow => table::delete_row(state),
            Command::DeleteTable => table::delete_table(state),

            Command::InsertImage { src, alt, title } => {
                insert::insert_image(state, src, alt.as_deref(), title.as_deref())
            }
            Command::InsertVideo(url) => insert::insert_video(state, url),
            Command::InsertSocialPost(url) => insert::insert_social_post(state, url),
        }?;
        Ok(if tx.is_selection_only() {
            tx
        } else {
            tx.with_label(self.label())
        })
    }

    /// Human-readable name, used as the history label
    pub fn label(&self) -> &'static str {
        match self {
            Command::ToggleMark(FormatMark::Bold) => "Bold",
            Command::ToggleMark(FormatMark::Italic) => "Italic",
            Command::ToggleMark(FormatMark::Underline) => "Underline",
            Command::ToggleMark(FormatMark::Strike) => "Strikethrough",
            Command::ToggleMark(FormatMark::Code) => "Inline code",
            Command::SetLink { .. } => "Set link",
            Command::UnsetLink => "Remove link",
            Command::SetColor(_) => "Text colour",
            Command::UnsetColor => "Remove colour",
            Command::SetHighlight(_) | Command::ToggleHighlight => "Highlight",
            Command::UnsetHighlight => "Remove highlight",
            Command::SetParagraph => "Paragraph",
            Command::ToggleHeading(_) => "Heading",
            Command::ToggleCodeBlock => "Code block",
            Command::SetTextAlign(_) => "Align text",
            Command::ToggleBlockquote => "Quote",
            Command::ToggleBulletList => "Bullet list",
            Command::ToggleOrderedList => "Numbered list",
            Command::ToggleTaskList => "Task list",
            Command::ToggleTaskChecked => "Check task",
            Command::InsertHorizontalRule => "Horizontal rule",
            Command::InsertText(_) => "Typing",
            Command::InsertHardBreak => "Line break",
            Command::SplitBlock => "New paragraph",
            Command::DeleteBackward | Command::DeleteSelection => "Delete",
            Command::SetSelection(_) => "Select",
            Command::InsertTable { .. } => "Insert table",
            Command::AddColumnBefore | Command::AddColumnAfter => "Add column",
            Command::AddRowBefore | Command::AddRowAfter => "Add row",
            Command::DeleteColumn => "Delete column",
            Command::DeleteRow => "Delete row",
            Command::DeleteTable => "Delete table",
            Command::InsertImage { .. } => "Insert image",
            Command::InsertVideo(_) => "Insert video",
            Command::InsertSocialPost(_) => "Insert post",
        }
    }
}

/// Resolve a position that must sit inside a textblock
fn textblock_at<'a>(doc: &'a Document, pos: &Position) -> Result<ResolvedPos<'a>, CommandError> {
    doc.resolve(pos)
        .filter(|resolved| resolved.is_textblock())
        .ok_or_else(|| CommandError::unapplicable("selection is not inside text"))
}

/// Turn a transform into a transaction, refusing results the schema rejects
fn finish(transform: Transform) -> Result<Transaction, CommandError> {
    if transform.is_empty() {
        return Err(CommandError::unapplicable("nothing to change"));
    }
    if let Err(err) = transform.doc().validate() {
        return Err(CommandError::unapplicable(err.to_string()));
    }
    Ok(transform.into_transaction())
}

/// Like [`finish`], placing the caret explicitly
fn finish_at(transform: Transform, caret: Position) -> Result<Transaction, CommandError> {
    let caret = transform.doc().snap(&caret);
    Ok(finish(transform)?.with_selection(Selection::caret(caret)))
}

/// Smallest valid content for a node of type `ty`: its first allowed child,
/// itself filled the same way
fn default_child(schema: &Schema, ty: &NodeType) -> Option<Node> {
    let name = ty.content_expr().references().next()?;
    let child_type = schema.default_type(name)?;
    let content = if schema.content_matches(child_type, &[]) {
        Vec::new()
    } else {
        vec![default_child(schema, child_type)?]
    };
    Node::new(schema, &child_type.name, Attrs::new(), content).ok()
}

/// Put default content back into a container its last child was removed from
fn refill_if_empty(transform: &mut Transform, path: &[usize]) -> Result<(), CommandError> {
    let doc = transform.doc();
    let schema = doc.schema().clone();
    let Some(node) = doc.node_at(path) else {
        return Ok(());
    };
    let Some(ty) = schema.node(&node.kind) else {
        return Ok(());
    };
    if !node.content.is_empty() || ty.is_textblock() || schema.content_matches(ty, &[]) {
        return Ok(());
    }
    let filler = default_child(&schema, ty)
        .ok_or_else(|| CommandError::unapplicable(format!("'{}' cannot be left empty", ty.name)))?;
    transform.step(Step::Insert {
        parent: path.to_vec(),
        offset: 0,
        content: vec![filler],
    })?;
    Ok(())
}

fn sibling_path(path: &[usize], index: usize) -> Vec<usize> {
    let mut sibling = path.to_vec();
    if let Some(last) = sibling.last_mut() {
        *last = index;
    }
    sibling
}

fn child_path(path: &[usize], index: usize) -> Vec<usize> {
    let mut child = path.to_vec();
    child.push(index);
    child
}
