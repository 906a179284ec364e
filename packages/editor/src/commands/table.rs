//! Table commands.
//!
//! Columns are addressed by cell index within a row; spans do not shift
//! column positions.

use super::{child_path, finish, finish_at, refill_if_empty};
use crate::errors::CommandError;
use crate::state::EditorState;
use ecnn_model::{Node, Position, Step, Transaction, Transform};
use ecnn_schema::{attrs, AttrValue, Attrs, Schema};

/// Where the head sits inside a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellLocation {
    pub table: Vec<usize>,
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    /// Cells in the head's row
    pub cols: usize,
    /// Cells in the shortest row
    pub narrowest_row: usize,
}

impl CellLocation {
    fn cell_path(&self, row: usize, col: usize) -> Vec<usize> {
        let mut path = self.table.clone();
        path.extend([row, col]);
        path
    }

    pub fn can_delete_row(&self) -> bool {
        self.rows > 1
    }

    pub fn can_delete_column(&self) -> bool {
        self.narrowest_row > 1
    }
}

fn is_cell(kind: &str) -> bool {
    matches!(kind, "table_cell" | "table_header")
}

/// Innermost table cell around the head, if any
pub fn locate_cell(state: &EditorState) -> Option<CellLocation> {
    let resolved = state.doc.resolve(&state.selection.head)?;
    let (depth, _) = resolved
        .ancestors()
        .find(|(depth, node)| *depth >= 2 && is_cell(&node.kind))?;
    let table = resolved.node(depth - 2);
    if table.kind != "table" {
        return None;
    }
    let path = &resolved.pos.path;
    Some(CellLocation {
        table: resolved.path_at(depth - 2).to_vec(),
        row: path[depth - 2],
        col: path[depth - 1],
        rows: table.content.len(),
        cols: resolved.node(depth - 1).content.len(),
        narrowest_row: table.content.iter().map(|row| row.content.len()).min().unwrap_or(0),
    })
}

fn require_cell(state: &EditorState) -> Result<CellLocation, CommandError> {
    locate_cell(state).ok_or_else(|| CommandError::unapplicable("selection is not in a table"))
}

fn empty_cell(schema: &Schema, kind: &str, cell_attrs: Attrs) -> Result<Node, CommandError> {
    let paragraph = Node::new(schema, "paragraph", Attrs::new(), Vec::new())?;
    Ok(Node::new(schema, kind, cell_attrs, vec![paragraph])?)
}

pub(super) fn insert_table(
    state: &EditorState,
    rows: usize,
    cols: usize,
    with_header_row: bool,
) -> Result<Transaction, CommandError> {
    if rows == 0 || cols == 0 {
        return Err(CommandError::unapplicable("a table needs at least one row and column"));
    }
    let schema = state.schema();
    let table = Node::new(schema, "table", Attrs::new(), Vec::new())?;
    let (mut transform, path) = super::insert_block_at(&state.doc, &state.selection.head, table)?;

    // One step per row, then one per cell
    for row in 0..rows {
        transform.step(Step::Insert {
            parent: path.clone(),
            offset: row,
            content: vec![Node::new(schema, "table_row", Attrs::new(), Vec::new())?],
        })?;
        let kind = if row == 0 && with_header_row {
            "table_header"
        } else {
            "table_cell"
        };
        for col in 0..cols {
            transform.step(Step::Insert {
                parent: child_path(&path, row),
                offset: col,
                content: vec![empty_cell(schema, kind, Attrs::new())?],
            })?;
        }
    }

    let mut first = path;
    first.extend([0, 0, 0]);
    finish_at(transform, Position::new(first, 0))
}

pub(super) fn add_column(state: &EditorState, after: bool) -> Result<Transaction, CommandError> {
    let cell = require_cell(state)?;
    let schema = state.schema();
    let table = state
        .doc
        .node_at(&cell.table)
        .ok_or_else(|| CommandError::unapplicable("table vanished"))?;
    let at = cell.col + usize::from(after);

    let mut transform = Transform::new(&state.doc);
    for (index, row) in table.content.iter().enumerate() {
        let Some(last) = row.content.len().checked_sub(1) else {
            continue;
        };
        let kind = row.content[cell.col.min(last)].kind.as_str();
        transform.step(Step::Insert {
            parent: child_path(&cell.table, index),
            offset: at.min(row.content.len()),
            content: vec![empty_cell(schema, kind, Attrs::new())?],
        })?;
    }
    finish(transform)
}

pub(super) fn add_row(state: &EditorState, after: bool) -> Result<Transaction, CommandError> {
    let cell = require_cell(state)?;
    let schema = state.schema();
    let row = state
        .doc
        .node_at(&child_path(&cell.table, cell.row))
        .ok_or_else(|| CommandError::unapplicable("row vanished"))?;
    let header_row = row.content.iter().all(|c| c.kind == "table_header");

    let cells = row
        .content
        .iter()
        .map(|source| {
            let kind = if after && header_row {
                "table_cell"
            } else {
                source.kind.as_str()
            };
            let colspan = source.attrs.get("colspan").cloned().unwrap_or(AttrValue::Int(1));
            empty_cell(schema, kind, attrs([("colspan", colspan)]))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let new_row = Node::new(schema, "table_row", Attrs::new(), cells)?;

    let mut transform = Transform::new(&state.doc);
    transform.step(Step::Insert {
        parent: cell.table.clone(),
        offset: cell.row + usize::from(after),
        content: vec![new_row],
    })?;
    finish(transform)
}

pub(super) fn delete_column(state: &EditorState) -> Result<Transaction, CommandError> {
    let cell = require_cell(state)?;
    if !cell.can_delete_column() {
        return Err(CommandError::unapplicable("cannot delete the only column"));
    }
    let table = state
        .doc
        .node_at(&cell.table)
        .ok_or_else(|| CommandError::unapplicable("table vanished"))?;

    let mut transform = Transform::new(&state.doc);
    for (index, row) in table.content.iter().enumerate() {
        if cell.col < row.content.len() {
            transform.step(Step::Delete {
                parent: child_path(&cell.table, index),
                from: cell.col,
                to: cell.col + 1,
            })?;
        }
    }
    let col = if cell.col + 1 >= cell.cols {
        cell.col.saturating_sub(1)
    } else {
        cell.col
    };
    finish_at(transform, Position::new(child_path(&cell.cell_path(cell.row, col), 0), 0))
}

pub(super) fn delete_row(state: &EditorState) -> Result<Transaction, CommandError> {
    let cell = require_cell(state)?;
    if !cell.can_delete_row() {
        return Err(CommandError::unapplicable("cannot delete the only row"));
    }
    let mut transform = Transform::new(&state.doc);
    transform.step(Step::Delete {
        parent: cell.table.clone(),
        from: cell.row,
        to: cell.row + 1,
    })?;

    let row = if cell.row + 1 == cell.rows { cell.row - 1 } else { cell.row };
    let width = transform
        .doc()
        .node_at(&child_path(&cell.table, row))
        .map_or(1, |r| r.content.len());
    let col = cell.col.min(width.saturating_sub(1));
    finish_at(transform, Position::new(child_path(&cell.cell_path(row, col), 0), 0))
}

pub(super) fn delete_table(state: &EditorState) -> Result<Transaction, CommandError> {
    let cell = require_cell(state)?;
    let Some((&index, parent)) = cell.table.split_last() else {
        return Err(CommandError::unapplicable("table has no parent"));
    };
    let mut transform = Transform::new(&state.doc);
    transform.step(Step::Delete {
        parent: parent.to_vec(),
        from: index,
        to: index + 1,
    })?;
    refill_if_empty(&mut transform, parent)?;
    finish_at(transform, Position::new(parent.to_vec(), index))
}
