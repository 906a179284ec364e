//! Block type, alignment, quote and list commands

use super::{child_path, finish, textblock_at, TextAlign};
use crate::errors::CommandError;
use crate::state::EditorState;
use ecnn_model::{Document, Node, NodeSpec, Position, Step, Transaction, Transform};
use ecnn_schema::{attrs, AttrValue, Attrs, NodeType, Schema};

/// Paths of the textblocks touched by the selection
fn selected_textblocks(state: &EditorState) -> Result<Vec<Vec<usize>>, CommandError> {
    let paths: Vec<Vec<usize>> = state.selected_ranges().into_iter().map(|range| range.path).collect();
    if paths.is_empty() {
        return Err(CommandError::unapplicable("selection holds no text"));
    }
    Ok(paths)
}

fn node_type<'s>(schema: &'s Schema, kind: &str) -> Result<&'s NodeType, CommandError> {
    schema
        .node(kind)
        .ok_or_else(|| CommandError::unapplicable(format!("schema has no '{}'", kind)))
}

/// Retype a textblock, carrying alignment over and converting content
/// between code and rich text
fn set_block_type(transform: &mut Transform, path: &[usize], kind: &str, attrs: Attrs) -> Result<(), CommandError> {
    let schema = transform.doc().schema().clone();
    let node = transform
        .doc()
        .node_at(path)
        .cloned()
        .ok_or_else(|| CommandError::unapplicable("block vanished"))?;
    let target = node_type(&schema, kind)?;
    let was_code = schema.node(&node.kind).is_some_and(|ty| ty.code);

    let mut attrs = attrs;
    if target.attr_spec("text_align").is_some() && !attrs.contains_key("text_align") {
        if let Some(align) = node.attrs.get("text_align") {
            attrs.insert("text_align".to_string(), align.clone());
        }
    }
    let filled = schema.fill_attrs(kind, &attrs)?;
    if node.kind == kind && node.attrs == filled {
        return Ok(());
    }

    if target.code && !was_code {
        strip_formatting(transform, path, &node)?;
    }
    transform.step(Step::SetType {
        path: path.to_vec(),
        node_type: kind.to_string(),
        attrs: filled,
    })?;
    if was_code && !target.code {
        newlines_to_breaks(transform, path, &node)?;
    }
    Ok(())
}

/// Drop marks and turn inline atoms into plain text, ready for a code block
fn strip_formatting(transform: &mut Transform, path: &[usize], node: &Node) -> Result<(), CommandError> {
    let mut pos = 0;
    let mut atoms = Vec::new();
    for leaf in &node.content {
        let width = leaf.width();
        if leaf.is_text() {
            for mark in &leaf.marks {
                transform.step(Step::RemoveMark {
                    path: path.to_vec(),
                    from: pos,
                    to: pos + width,
                    mark: mark.clone(),
                })?;
            }
        } else {
            atoms.push((pos, leaf.kind == "hard_break"));
        }
        pos += width;
    }

    for (offset, is_break) in atoms.into_iter().rev() {
        transform.step(Step::Delete {
            parent: path.to_vec(),
            from: offset,
            to: offset + 1,
        })?;
        if is_break {
            transform.step(Step::Insert {
                parent: path.to_vec(),
                offset,
                content: vec![Node::text("\n")],
            })?;
        }
    }
    Ok(())
}

/// Replace newline characters left by a code block with hard breaks
fn newlines_to_breaks(transform: &mut Transform, path: &[usize], node: &Node) -> Result<(), CommandError> {
    let schema = transform.doc().schema().clone();
    let text = node.text_content();
    let offsets: Vec<usize> = text
        .chars()
        .enumerate()
        .filter(|(_, c)| *c == '\n')
        .map(|(i, _)| i)
        .collect();
    for offset in offsets.into_iter().rev() {
        transform.step(Step::Delete {
            parent: path.to_vec(),
            from: offset,
            to: offset + 1,
        })?;
        transform.step(Step::Insert {
            parent: path.to_vec(),
            offset,
            content: vec![Node::new(&schema, "hard_break", Attrs::new(), Vec::new())?],
        })?;
    }
    Ok(())
}

fn retype_selection(state: &EditorState, kind: &str, attrs: Attrs) -> Result<Transaction, CommandError> {
    let mut transform = Transform::new(&state.doc);
    for path in selected_textblocks(state)? {
        set_block_type(&mut transform, &path, kind, attrs.clone())?;
    }
    finish(transform)
}

/// Whether every selected textblock satisfies `pred`
fn all_selected(state: &EditorState, pred: impl Fn(&Node) -> bool) -> Result<bool, CommandError> {
    Ok(selected_textblocks(state)?
        .iter()
        .all(|path| state.doc.node_at(path).is_some_and(&pred)))
}

pub(super) fn set_paragraph(state: &EditorState) -> Result<Transaction, CommandError> {
    retype_selection(state, "paragraph", Attrs::new())
}

pub(super) fn toggle_heading(state: &EditorState, level: u8) -> Result<Transaction, CommandError> {
    if !(1..=6).contains(&level) {
        return Err(CommandError::unapplicable(format!("no heading level {}", level)));
    }
    let level = i64::from(level);
    let is_same = all_selected(state, |node| {
        node.kind == "heading" && node.attrs.get("level").and_then(AttrValue::as_int) == Some(level)
    })?;
    if is_same {
        retype_selection(state, "paragraph", Attrs::new())
    } else {
        retype_selection(state, "heading", attrs([("level", level)]))
    }
}

pub(super) fn toggle_code_block(state: &EditorState) -> Result<Transaction, CommandError> {
    if all_selected(state, |node| node.kind == "code_block")? {
        retype_selection(state, "paragraph", Attrs::new())
    } else {
        retype_selection(state, "code_block", Attrs::new())
    }
}

pub(super) fn set_text_align(state: &EditorState, align: TextAlign) -> Result<Transaction, CommandError> {
    let value = AttrValue::from(align.as_str());
    let aligned: Vec<Vec<usize>> = selected_textblocks(state)?
        .into_iter()
        .filter(|path| {
            state
                .doc
                .node_type_at(path)
                .is_some_and(|ty| ty.attr_spec("text_align").is_some())
        })
        .collect();
    if aligned.is_empty() {
        return Err(CommandError::unapplicable("selected blocks cannot be aligned"));
    }

    let mut transform = Transform::new(&state.doc);
    for path in aligned {
        let current = state.doc.node_at(&path).and_then(|node| node.attrs.get("text_align"));
        if current != Some(&value) {
            transform.step(Step::SetAttr {
                path,
                name: "text_align".to_string(),
                value: value.clone(),
            })?;
        }
    }
    if transform.is_empty() {
        return Ok(Transaction::new());
    }
    finish(transform)
}

/// Deepest sibling range covering the selection that `wrapper` can hold,
/// as (parent, from, to). With `item`, each child must fit in an item of
/// that type instead.
fn wrap_range(
    doc: &Document,
    from: &Position,
    to: &Position,
    wrapper: &NodeType,
    item: Option<&NodeType>,
) -> Option<(Vec<usize>, usize, usize)> {
    let schema = doc.schema();
    let (a, b) = (&from.path, &to.path);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let common = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
    let deepest = common.min(a.len() - 1).min(b.len() - 1);

    for depth in (0..=deepest).rev() {
        let parent_path = &a[..depth];
        let (start, end) = (a[depth], b[depth]);
        let Some(parent) = doc.node_at(parent_path) else {
            continue;
        };
        let Some(parent_type) = schema.node(&parent.kind) else {
            continue;
        };
        if !schema.can_contain(parent_type, wrapper) || end >= parent.content.len() {
            continue;
        }
        let children: Option<Vec<&NodeType>> = parent.content[start..=end]
            .iter()
            .map(|child| schema.node(&child.kind))
            .collect();
        let Some(children) = children else {
            continue;
        };
        let fits = match item {
            None => schema.content_matches(wrapper, &children),
            Some(item) => children.iter().all(|child| schema.can_contain(item, child)),
        };
        if fits {
            return Some((parent_path.to_vec(), start, end + 1));
        }
    }
    None
}

pub(super) fn toggle_blockquote(state: &EditorState) -> Result<Transaction, CommandError> {
    let schema = state.schema().clone();
    let resolved = textblock_at(&state.doc, &state.selection.head)?;
    let mut transform = Transform::new(&state.doc);

    if let Some((path, _)) = resolved.find_ancestor(|node| node.kind == "blockquote") {
        transform.step(Step::Unwrap { path })?;
        return finish(transform);
    }

    textblock_at(&state.doc, &state.selection.anchor)?;
    let quote = node_type(&schema, "blockquote")?;
    let (parent, from, to) = wrap_range(&state.doc, state.selection.from(), state.selection.to(), quote, None)
        .ok_or_else(|| CommandError::unapplicable("selection cannot be quoted"))?;
    transform.step(Step::Wrap {
        parent,
        from,
        to,
        wrapper: NodeSpec::new("blockquote", Attrs::new()),
    })?;
    finish(transform)
}

fn item_kind(list_kind: &str) -> &'static str {
    if list_kind == "task_list" {
        "task_item"
    } else {
        "list_item"
    }
}

pub(super) fn toggle_list(state: &EditorState, kind: &str) -> Result<Transaction, CommandError> {
    let schema = state.schema().clone();
    let resolved = textblock_at(&state.doc, &state.selection.head)?;
    let is_list = |node: &Node| schema.node(&node.kind).is_some_and(|ty| ty.in_group("list"));
    let mut transform = Transform::new(&state.doc);

    if let Some((list_path, list)) = resolved.find_ancestor(is_list) {
        if list.kind == kind {
            // Lift the whole list: unwrap every item, then the list
            for index in (0..list.content.len()).rev() {
                transform.step(Step::Unwrap {
                    path: child_path(&list_path, index),
                })?;
            }
            transform.step(Step::Unwrap { path: list_path })?;
        } else {
            let item = item_kind(kind);
            for (index, child) in list.content.iter().enumerate() {
                if child.kind != item {
                    transform.step(Step::SetType {
                        path: child_path(&list_path, index),
                        node_type: item.to_string(),
                        attrs: Attrs::new(),
                    })?;
                }
            }
            transform.step(Step::SetType {
                path: list_path,
                node_type: kind.to_string(),
                attrs: Attrs::new(),
            })?;
        }
        return finish(transform);
    }

    textblock_at(&state.doc, &state.selection.anchor)?;
    let list_type = node_type(&schema, kind)?;
    let item_type = node_type(&schema, item_kind(kind))?;
    let (parent, from, to) = wrap_range(
        &state.doc,
        state.selection.from(),
        state.selection.to(),
        list_type,
        Some(item_type),
    )
    .ok_or_else(|| CommandError::unapplicable("selection cannot become a list"))?;

    let list_path = child_path(&parent, from);
    transform.step(Step::Wrap {
        parent,
        from,
        to,
        wrapper: NodeSpec::new(kind, Attrs::new()),
    })?;
    for index in 0..to - from {
        transform.step(Step::Wrap {
            parent: list_path.clone(),
            from: index,
            to: index + 1,
            wrapper: NodeSpec::new(item_kind(kind), Attrs::new()),
        })?;
    }
    finish(transform)
}

pub(super) fn toggle_task_checked(state: &EditorState) -> Result<Transaction, CommandError> {
    let resolved = textblock_at(&state.doc, &state.selection.head)?;
    let (path, item) = resolved
        .find_ancestor(|node| node.kind == "task_item")
        .ok_or_else(|| CommandError::unapplicable("not inside a task"))?;
    let checked = item.attrs.get("checked").and_then(AttrValue::as_bool).unwrap_or(false);

    let mut transform = Transform::new(&state.doc);
    transform.step(Step::SetAttr {
        path,
        name: "checked".to_string(),
        value: AttrValue::from(!checked),
    })?;
    finish(transform)
}
