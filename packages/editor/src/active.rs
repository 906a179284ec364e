//! # Active State
//!
//! Answers "is this format on here?" and "would this command do
//! anything?" for toolbar buttons. Nothing here changes the state.

use crate::commands::{locate_cell, mark_active, Command};
use crate::history::History;
use crate::state::{marks_at, EditorState};
use ecnn_model::{Mark, Node, Position};
use ecnn_schema::{AttrValue, Attrs};
use serde::{Deserialize, Serialize};

/// A toolbar question about the current selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "camelCase")]
pub enum ActiveQuery {
    /// Mark of this type, carrying at least these attributes
    Mark {
        kind: String,
        #[serde(default)]
        attrs: Attrs,
    },
    /// Ancestor node of this type, carrying at least these attributes
    Node {
        kind: String,
        #[serde(default)]
        attrs: Attrs,
    },
    /// Attribute value on the textblock at the head
    Attr { name: String, value: AttrValue },
}

fn attrs_match(actual: &Attrs, wanted: &Attrs) -> bool {
    wanted.iter().all(|(name, value)| actual.get(name) == Some(value))
}

fn node_matches(node: &Node, kind: &str, attrs: &Attrs) -> bool {
    node.kind == kind && attrs_match(&node.attrs, attrs)
}

/// Whether every selected textblock sits in a node satisfying `pred`
fn every_block_within(state: &EditorState, pred: impl Fn(&Node) -> bool) -> bool {
    let ranges = state.selected_ranges();
    !ranges.is_empty()
        && ranges.iter().all(|range| {
            state
                .doc
                .resolve(&Position::new(range.path.clone(), range.from))
                .is_some_and(|resolved| resolved.ancestors().any(|(_, node)| pred(node)))
        })
}

fn head_textblock(state: &EditorState) -> Option<&Node> {
    state
        .doc
        .resolve(&state.selection.head)
        .filter(|resolved| resolved.is_textblock())
        .map(|resolved| resolved.parent())
}

pub fn is_active(state: &EditorState, query: &ActiveQuery) -> bool {
    match query {
        ActiveQuery::Mark { kind, attrs } => {
            mark_active(state, |mark| mark.kind == *kind && attrs_match(&mark.attrs, attrs))
        }
        ActiveQuery::Node { kind, attrs } => every_block_within(state, |node| node_matches(node, kind, attrs)),
        ActiveQuery::Attr { name, value } => {
            head_textblock(state).is_some_and(|block| block.attrs.get(name) == Some(value))
        }
    }
}

/// Whether `command` would produce a transaction. Builds it and throws
/// it away.
pub fn can_apply(state: &EditorState, command: &Command) -> bool {
    command.build(state).is_ok()
}

fn mark_on(state: &EditorState, kind: &str) -> bool {
    mark_active(state, |mark| mark.kind == kind)
}

fn block_within(state: &EditorState, kind: &str) -> bool {
    every_block_within(state, |node| node.kind == kind)
}

/// Colour every selected character shares, if any
fn shared_color(state: &EditorState) -> Option<String> {
    let marks = if state.selection.is_caret() {
        state.marks_at_caret()
    } else {
        marks_at(&state.doc, state.selection.from())
    };
    let style = Mark::type_in_set("text_style", &marks)?.clone();
    if !mark_active(state, |mark| *mark == style) {
        return None;
    }
    style.attrs.get("color").and_then(AttrValue::as_str).map(str::to_string)
}

/// Everything the toolbar shows, in one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub code: bool,
    pub link: bool,
    pub highlight: bool,
    pub text_color: Option<String>,

    pub paragraph: bool,
    pub heading: Option<u8>,
    pub code_block: bool,
    pub blockquote: bool,
    pub bullet_list: bool,
    pub ordered_list: bool,
    pub task_list: bool,
    pub table: bool,
    pub text_align: Option<String>,

    pub can_undo: bool,
    pub can_redo: bool,
    pub can_add_column: bool,
    pub can_add_row: bool,
    pub can_delete_column: bool,
    pub can_delete_row: bool,
    pub can_delete_table: bool,
}

impl ToolbarState {
    pub fn new(state: &EditorState, history: &History) -> Self {
        let heading = (1..=6u8).find(|level| {
            every_block_within(state, |node| {
                node.kind == "heading" && node.attrs.get("level") == Some(&AttrValue::Int(i64::from(*level)))
            })
        });
        let cell = locate_cell(state);

        Self {
            bold: mark_on(state, "bold"),
            italic: mark_on(state, "italic"),
            underline: mark_on(state, "underline"),
            strike: mark_on(state, "strike"),
            code: mark_on(state, "code"),
            link: mark_on(state, "link"),
            highlight: mark_on(state, "highlight"),
            text_color: shared_color(state),

            paragraph: block_within(state, "paragraph"),
            heading,
            code_block: block_within(state, "code_block"),
            blockquote: block_within(state, "blockquote"),
            bullet_list: block_within(state, "bullet_list"),
            ordered_list: block_within(state, "ordered_list"),
            task_list: block_within(state, "task_list"),
            table: cell.is_some(),
            text_align: head_textblock(state)
                .and_then(|block| block.attrs.get("text_align"))
                .and_then(AttrValue::as_str)
                .map(str::to_string),

            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
            can_add_column: cell.is_some(),
            can_add_row: cell.is_some(),
            can_delete_column: cell.as_ref().is_some_and(|c| c.can_delete_column()),
            can_delete_row: cell.as_ref().is_some_and(|c| c.can_delete_row()),
            can_delete_table: cell.is_some(),
        }
    }
}
