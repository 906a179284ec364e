//! Typing, line breaks, block splitting and deletion

use super::{child_path, finish_at, refill_if_empty, sibling_path, textblock_at};
use crate::errors::CommandError;
use crate::state::{marks_at, EditorState};
use ecnn_model::{
    inline_width, Document, Mark, Node, NodeSpec, Position, Selection, Step, Transaction, Transform,
};
use ecnn_schema::{attrs, Attrs, NodeType, Schema};

fn is_textblock(doc: &Document, path: &[usize]) -> bool {
    doc.node_type_at(path).is_some_and(NodeType::is_textblock)
}

fn block_width(doc: &Document, path: &[usize]) -> usize {
    doc.node_at(path).map_or(0, |node| inline_width(&node.content))
}

/// Remove everything between two positions and return where the caret
/// lands. Ranges may span sibling textblocks, which are joined.
pub(super) fn delete_range(
    transform: &mut Transform,
    from: &Position,
    to: &Position,
) -> Result<Position, CommandError> {
    if from == to {
        return Ok(from.clone());
    }
    if from.path == to.path {
        if transform.doc().resolve(from).is_none() || transform.doc().resolve(to).is_none() {
            return Err(CommandError::unapplicable("selection is outside the document"));
        }
        let textblock = is_textblock(transform.doc(), &from.path);
        transform.step(Step::Delete {
            parent: from.path.clone(),
            from: from.offset,
            to: to.offset,
        })?;
        if !textblock {
            refill_if_empty(transform, &from.path)?;
        }
        return Ok(from.clone());
    }

    let (Some((&first, parent)), Some((&last, to_parent))) = (from.path.split_last(), to.path.split_last())
    else {
        return Err(CommandError::unapplicable("selection crosses block boundaries"));
    };
    let doc = transform.doc();
    if parent != to_parent || !is_textblock(doc, &from.path) || !is_textblock(doc, &to.path) {
        return Err(CommandError::unapplicable("selection crosses block boundaries"));
    }
    let first_width = block_width(doc, &from.path);

    // Back to front so earlier paths stay valid
    if to.offset > 0 {
        transform.step(Step::Delete {
            parent: to.path.clone(),
            from: 0,
            to: to.offset,
        })?;
    }
    if from.offset < first_width {
        transform.step(Step::Delete {
            parent: from.path.clone(),
            from: from.offset,
            to: first_width,
        })?;
    }
    if last > first + 1 {
        transform.step(Step::Delete {
            parent: parent.to_vec(),
            from: first + 1,
            to: last,
        })?;
    }
    transform.step(Step::Join {
        path: child_path(parent, first + 1),
    })?;
    Ok(from.clone())
}

/// Inline nodes for typed text. Newlines become hard breaks except in code.
fn typed_content(schema: &Schema, text: &str, marks: &[Mark], code: bool) -> Result<Vec<Node>, CommandError> {
    if code {
        return Ok(vec![Node::text(text)]);
    }
    let mut content = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            content.push(Node::new(schema, "hard_break", Attrs::new(), Vec::new())?);
        }
        if !line.is_empty() {
            content.push(Node::text_with_marks(line, marks.to_vec()));
        }
    }
    Ok(content)
}

pub(super) fn insert_text(state: &EditorState, text: &str) -> Result<Transaction, CommandError> {
    let text: String = text.chars().filter(|c| *c != '\r').collect();
    if text.is_empty() {
        return Err(CommandError::unapplicable("no text to insert"));
    }
    let schema = state.schema().clone();
    let marks = state
        .stored_marks
        .clone()
        .unwrap_or_else(|| marks_at(&state.doc, state.selection.from()));

    let mut transform = Transform::new(&state.doc);
    let at = delete_range(&mut transform, state.selection.from(), state.selection.to())?;

    let content = {
        let resolved = textblock_at(transform.doc(), &at)?;
        let ty = resolved
            .parent_type()
            .ok_or_else(|| CommandError::unapplicable("selection is not inside text"))?;
        let marks: Vec<Mark> = marks.into_iter().filter(|m| ty.allows_mark(&m.kind)).collect();
        typed_content(&schema, &text, &marks, ty.code)?
    };
    let width = inline_width(&content);
    transform.step(Step::Insert {
        parent: at.path.clone(),
        offset: at.offset,
        content,
    })?;
    finish_at(transform, Position::new(at.path, at.offset + width))
}

pub(super) fn insert_hard_break(state: &EditorState) -> Result<Transaction, CommandError> {
    insert_text(state, "\n")
}

/// Enter: split the textblock, or the list item around it
pub(super) fn split_block(state: &EditorState) -> Result<Transaction, CommandError> {
    let mut transform = Transform::new(&state.doc);
    let at = delete_range(&mut transform, state.selection.from(), state.selection.to())?;

    let (kind, code, width, item) = {
        let resolved = textblock_at(transform.doc(), &at)?;
        let ty = resolved
            .parent_type()
            .ok_or_else(|| CommandError::unapplicable("selection is not inside text"))?;
        let depth = resolved.depth();
        let item = (depth >= 2)
            .then(|| resolved.node(depth - 1))
            .filter(|parent| matches!(parent.kind.as_str(), "list_item" | "task_item"))
            .map(|parent| (resolved.path_at(depth - 1).to_vec(), parent.clone()));
        (ty.name.clone(), ty.code, resolved.parent_width(), item)
    };

    if code {
        transform.step(Step::Insert {
            parent: at.path.clone(),
            offset: at.offset,
            content: vec![Node::text("\n")],
        })?;
        return finish_at(transform, Position::new(at.path, at.offset + 1));
    }

    let index = at.path.last().copied().unwrap_or(0);

    if let Some((item_path, item)) = item {
        let list_path = &item_path[..item_path.len() - 1];
        let item_index = item_path.last().copied().unwrap_or(0);
        let list_len = transform.doc().node_at(list_path).map_or(0, |list| list.content.len());
        if width == 0 && item.content.len() == 1 && item_index + 1 == list_len {
            return leave_list(transform, &item_path, list_len);
        }

        transform.step(Step::Split {
            path: at.path.clone(),
            offset: at.offset,
            new_type: None,
        })?;
        let new_type = (item.kind == "task_item").then(|| NodeSpec::new("task_item", attrs([("checked", false)])));
        transform.step(Step::Split {
            path: item_path.clone(),
            offset: index + 1,
            new_type,
        })?;
        let next_item = sibling_path(&item_path, item_index + 1);
        return finish_at(transform, Position::new(child_path(&next_item, 0), 0));
    }

    let new_type = (kind == "heading" && at.offset == width).then(|| NodeSpec::new("paragraph", Attrs::new()));
    transform.step(Step::Split {
        path: at.path.clone(),
        offset: at.offset,
        new_type,
    })?;
    finish_at(transform, Position::new(sibling_path(&at.path, index + 1), 0))
}

/// Enter in an empty last list item: drop the item and continue with a
/// paragraph after the list
fn leave_list(mut transform: Transform, item_path: &[usize], list_len: usize) -> Result<Transaction, CommandError> {
    let list_path = &item_path[..item_path.len() - 1];
    let Some((&list_index, outer)) = list_path.split_last() else {
        return Err(CommandError::unapplicable("list has no parent"));
    };
    let paragraph = Node::new(transform.doc().schema(), "paragraph", Attrs::new(), Vec::new())?;

    if list_len == 1 {
        transform.step(Step::Delete {
            parent: outer.to_vec(),
            from: list_index,
            to: list_index + 1,
        })?;
        transform.step(Step::Insert {
            parent: outer.to_vec(),
            offset: list_index,
            content: vec![paragraph],
        })?;
        return finish_at(transform, Position::new(list_path.to_vec(), 0));
    }

    transform.step(Step::Delete {
        parent: list_path.to_vec(),
        from: list_len - 1,
        to: list_len,
    })?;
    transform.step(Step::Insert {
        parent: outer.to_vec(),
        offset: list_index + 1,
        content: vec![paragraph],
    })?;
    finish_at(transform, Position::new(sibling_path(list_path, list_index + 1), 0))
}

/// Path of the last textblock inside the subtree at `path`
fn last_textblock(doc: &Document, path: &[usize]) -> Option<Vec<usize>> {
    let node = doc.node_at(path)?;
    if is_textblock(doc, path) {
        return Some(path.to_vec());
    }
    (0..node.content.len())
        .rev()
        .find_map(|index| last_textblock(doc, &child_path(path, index)))
}

/// Backspace
pub(super) fn delete_backward(state: &EditorState) -> Result<Transaction, CommandError> {
    if !state.selection.is_caret() {
        return delete_selection(state);
    }
    let head = &state.selection.head;
    textblock_at(&state.doc, head)?;
    let doc = &state.doc;
    let schema = state.schema().clone();
    let mut transform = Transform::new(doc);

    if head.offset > 0 {
        transform.step(Step::Delete {
            parent: head.path.clone(),
            from: head.offset - 1,
            to: head.offset,
        })?;
        return finish_at(transform, Position::new(head.path.clone(), head.offset - 1));
    }

    let path = head.path.clone();
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(CommandError::unapplicable("nothing before the caret"));
    };
    let parent = doc
        .node_at(parent_path)
        .ok_or_else(|| CommandError::unapplicable("block has no parent"))?;

    if index > 0 {
        let previous_path = sibling_path(&path, index - 1);
        let previous = &parent.content[index - 1];
        let previous_type = schema
            .node(&previous.kind)
            .ok_or_else(|| CommandError::unapplicable(format!("schema has no '{}'", previous.kind)))?;

        if previous_type.is_textblock() {
            let width = inline_width(&previous.content);
            transform.step(Step::Join { path: path.clone() })?;
            return finish_at(transform, Position::new(previous_path, width));
        }

        if previous_type.is_leaf() {
            transform.step(Step::Delete {
                parent: parent_path.to_vec(),
                from: index - 1,
                to: index,
            })?;
            return finish_at(transform, Position::new(previous_path, 0));
        }

        // Pull this block's content into the end of the container before it
        let target = last_textblock(doc, &previous_path)
            .ok_or_else(|| CommandError::unapplicable("nothing to merge into"))?;
        let width = block_width(doc, &target);
        let content = parent.content[index].content.clone();
        if !content.is_empty() {
            transform.step(Step::Insert {
                parent: target.clone(),
                offset: width,
                content,
            })?;
        }
        transform.step(Step::Delete {
            parent: parent_path.to_vec(),
            from: index,
            to: index + 1,
        })?;
        return finish_at(transform, Position::new(target, width));
    }

    match parent.kind.as_str() {
        "list_item" | "task_item" => lift_from_item(doc, transform, parent_path),
        "blockquote" => {
            let Some((&quote_index, outer)) = parent_path.split_last() else {
                return Err(CommandError::unapplicable("quote has no parent"));
            };
            if parent.content.len() == 1 {
                transform.step(Step::Unwrap {
                    path: parent_path.to_vec(),
                })?;
            } else {
                let block = parent.content[0].clone();
                transform.step(Step::Delete {
                    parent: parent_path.to_vec(),
                    from: 0,
                    to: 1,
                })?;
                transform.step(Step::Insert {
                    parent: outer.to_vec(),
                    offset: quote_index,
                    content: vec![block],
                })?;
            }
            finish_at(transform, Position::new(parent_path.to_vec(), 0))
        }
        _ => Err(CommandError::unapplicable("nothing before the caret")),
    }
}

/// Backspace at the start of a list item: merge it into the previous item,
/// or move the first item's content out in front of the list
fn lift_from_item(doc: &Document, mut transform: Transform, item_path: &[usize]) -> Result<Transaction, CommandError> {
    let Some((&item_index, list_path)) = item_path.split_last() else {
        return Err(CommandError::unapplicable("item has no list"));
    };
    let list = doc
        .node_at(list_path)
        .ok_or_else(|| CommandError::unapplicable("item has no list"))?;

    if item_index > 0 {
        let previous_item = sibling_path(item_path, item_index - 1);
        let previous_len = list.content[item_index - 1].content.len();
        transform.step(Step::Join {
            path: item_path.to_vec(),
        })?;
        let moved = child_path(&previous_item, previous_len);
        if previous_len > 0 {
            let before = child_path(&previous_item, previous_len - 1);
            if is_textblock(transform.doc(), &before) {
                let width = block_width(transform.doc(), &before);
                transform.step(Step::Join { path: moved })?;
                return finish_at(transform, Position::new(before, width));
            }
        }
        return finish_at(transform, Position::new(moved, 0));
    }

    let Some((&list_index, outer)) = list_path.split_last() else {
        return Err(CommandError::unapplicable("list has no parent"));
    };
    if list.content.len() == 1 {
        transform.step(Step::Unwrap {
            path: item_path.to_vec(),
        })?;
        transform.step(Step::Unwrap {
            path: list_path.to_vec(),
        })?;
    } else {
        let content = list.content[0].content.clone();
        transform.step(Step::Delete {
            parent: list_path.to_vec(),
            from: 0,
            to: 1,
        })?;
        transform.step(Step::Insert {
            parent: outer.to_vec(),
            offset: list_index,
            content,
        })?;
    }
    finish_at(transform, Position::new(list_path.to_vec(), 0))
}

pub(super) fn delete_selection(state: &EditorState) -> Result<Transaction, CommandError> {
    if state.selection.is_caret() {
        return Err(CommandError::unapplicable("selection is empty"));
    }
    let mut transform = Transform::new(&state.doc);
    let at = delete_range(&mut transform, state.selection.from(), state.selection.to())?;
    finish_at(transform, at)
}

pub(super) fn set_selection(state: &EditorState, selection: &Selection) -> Result<Transaction, CommandError> {
    if state.doc.resolve(&selection.anchor).is_none() || state.doc.resolve(&selection.head).is_none() {
        return Err(CommandError::unapplicable("selection is outside the document"));
    }
    Ok(Transaction::select(selection.clone()))
}
