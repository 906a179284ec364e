//! Inline formatting commands

use super::{finish, textblock_at, FormatMark};
use crate::errors::CommandError;
use crate::state::EditorState;
use ecnn_model::{Document, Mark, Node, Step, TextRange, Transaction, Transform};
use ecnn_schema::{attrs, is_safe_color, is_safe_href, AttrValue, Attrs};

/// A stretch of one text leaf inside a range
struct TextRun {
    from: usize,
    to: usize,
    marks: Vec<Mark>,
}

/// Text leaves of a textblock clipped to `from..to`
fn text_runs(node: &Node, from: usize, to: usize) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut pos = 0;
    for leaf in &node.content {
        let width = leaf.width();
        let (start, end) = (pos.max(from), (pos + width).min(to));
        if leaf.is_text() && start < end {
            runs.push(TextRun {
                from: start,
                to: end,
                marks: leaf.marks.clone(),
            });
        }
        pos += width;
    }
    runs
}

/// Merge touching spans that carry the same payload
fn merge_spans<T: PartialEq>(spans: impl IntoIterator<Item = (usize, usize, T)>) -> Vec<(usize, usize, T)> {
    let mut merged: Vec<(usize, usize, T)> = Vec::new();
    for (from, to, value) in spans {
        if let Some(last) = merged.last_mut() {
            if last.1 == from && last.2 == value {
                last.1 = to;
                continue;
            }
        }
        merged.push((from, to, value));
    }
    merged
}

/// Whether every text leaf in the ranges carries a mark satisfying `pred`.
/// False when the ranges hold no text.
pub(crate) fn every_text_has(doc: &Document, ranges: &[TextRange], pred: impl Fn(&Mark) -> bool) -> bool {
    let mut seen = false;
    for range in ranges {
        let Some(node) = doc.node_at(&range.path) else {
            continue;
        };
        for run in text_runs(node, range.from, range.to) {
            seen = true;
            if !run.marks.iter().any(&pred) {
                return false;
            }
        }
    }
    seen
}

/// Mark state of the selection: stored or inherited marks for a caret,
/// every selected text leaf otherwise
pub(crate) fn mark_active(state: &EditorState, pred: impl Fn(&Mark) -> bool) -> bool {
    if state.selection.is_caret() {
        return state.marks_at_caret().iter().any(pred);
    }
    let ranges: Vec<TextRange> = state
        .selected_ranges()
        .into_iter()
        .filter(|range| range.from < range.to)
        .collect();
    every_text_has(&state.doc, &ranges, pred)
}

/// Non-empty selected ranges whose textblock accepts `kind`
fn markable_ranges(state: &EditorState, kind: &str) -> Vec<TextRange> {
    state
        .selected_ranges()
        .into_iter()
        .filter(|range| {
            range.from < range.to
                && state
                    .doc
                    .node_type_at(&range.path)
                    .is_some_and(|ty| ty.allows_mark(kind))
        })
        .collect()
}

fn add_mark_steps(transform: &mut Transform, range: &TextRange, mark: &Mark) -> Result<(), CommandError> {
    let spans = match transform.doc().node_at(&range.path) {
        Some(node) => merge_spans(
            text_runs(node, range.from, range.to)
                .into_iter()
                .filter(|run| Mark::type_in_set(&mark.kind, &run.marks).is_none())
                .map(|run| (run.from, run.to, ())),
        ),
        None => return Ok(()),
    };
    for (from, to, ()) in spans {
        transform.step(Step::AddMark {
            path: range.path.clone(),
            from,
            to,
            mark: mark.clone(),
        })?;
    }
    Ok(())
}

/// Remove marks of type `kind` from a range, except the exact mark `keep`
fn remove_mark_steps(
    transform: &mut Transform,
    range: &TextRange,
    kind: &str,
    keep: Option<&Mark>,
) -> Result<(), CommandError> {
    let spans = match transform.doc().node_at(&range.path) {
        Some(node) => merge_spans(text_runs(node, range.from, range.to).into_iter().filter_map(|run| {
            let mark = Mark::type_in_set(kind, &run.marks)?;
            (Some(mark) != keep).then(|| (run.from, run.to, mark.clone()))
        })),
        None => return Ok(()),
    };
    for (from, to, mark) in spans {
        transform.step(Step::RemoveMark {
            path: range.path.clone(),
            from,
            to,
            mark,
        })?;
    }
    Ok(())
}

/// The full run of a mark of type `kind` touching `offset`
fn mark_extent(node: &Node, offset: usize, kind: &str) -> Option<(usize, usize, Mark)> {
    let leaves = &node.content;
    let mut starts = Vec::with_capacity(leaves.len());
    let mut pos = 0;
    for leaf in leaves {
        starts.push(pos);
        pos += leaf.width();
    }
    let has_kind = |i: usize| Mark::type_in_set(kind, &leaves[i].marks).is_some();
    let index = (0..leaves.len())
        .find(|&i| starts[i] < offset && offset <= starts[i] + leaves[i].width() && has_kind(i))
        .or_else(|| {
            (0..leaves.len()).find(|&i| starts[i] <= offset && offset < starts[i] + leaves[i].width() && has_kind(i))
        })?;
    let mark = Mark::type_in_set(kind, &leaves[index].marks)?.clone();

    let mut first = index;
    while first > 0 && leaves[first - 1].has_mark(&mark) {
        first -= 1;
    }
    let mut last = index;
    while last + 1 < leaves.len() && leaves[last + 1].has_mark(&mark) {
        last += 1;
    }
    Some((starts[first], starts[last] + leaves[last].width(), mark))
}

/// Range of the mark around the caret, for commands that act on whole links
fn caret_extent(state: &EditorState, kind: &str) -> Option<TextRange> {
    let head = &state.selection.head;
    let node = state.doc.node_at(&head.path)?;
    let (from, to, _) = mark_extent(node, head.offset, kind)?;
    Some(TextRange {
        path: head.path.clone(),
        from,
        to,
    })
}

fn check_caret_allows(state: &EditorState, kind: &str) -> Result<(), CommandError> {
    let resolved = textblock_at(&state.doc, &state.selection.head)?;
    if resolved.parent_type().is_some_and(|ty| ty.allows_mark(kind)) {
        Ok(())
    } else {
        Err(CommandError::unapplicable(format!("'{}' is not allowed here", kind)))
    }
}

fn store_marks(marks: Vec<Mark>) -> Transaction {
    Transaction::new().with_stored_marks(marks)
}

/// Replace marks of the same type over `ranges` with `mark`
fn apply_mark(state: &EditorState, ranges: &[TextRange], mark: &Mark) -> Result<Transaction, CommandError> {
    let mut transform = Transform::new(&state.doc);
    for range in ranges {
        remove_mark_steps(&mut transform, range, &mark.kind, Some(mark))?;
        add_mark_steps(&mut transform, range, mark)?;
    }
    finish(transform)
}

fn set_mark(state: &EditorState, mark: Mark, extend_at_caret: bool) -> Result<Transaction, CommandError> {
    if state.selection.is_caret() {
        if extend_at_caret {
            if let Some(range) = caret_extent(state, &mark.kind) {
                return apply_mark(state, &[range], &mark);
            }
        }
        check_caret_allows(state, &mark.kind)?;
        return Ok(store_marks(mark.add_to_set(&state.marks_at_caret(), state.schema())));
    }

    let ranges = markable_ranges(state, &mark.kind);
    if ranges.is_empty() {
        return Err(CommandError::unapplicable(format!("no text accepts '{}'", mark.kind)));
    }
    apply_mark(state, &ranges, &mark)
}

pub(super) fn unset_mark(state: &EditorState, kind: &str) -> Result<Transaction, CommandError> {
    let ranges = if state.selection.is_caret() {
        if let Some(range) = caret_extent(state, kind).filter(|_| kind == "link") {
            vec![range]
        } else {
            let stored = state.marks_at_caret();
            if Mark::type_in_set(kind, &stored).is_none() {
                return Err(CommandError::unapplicable(format!("no '{}' to remove", kind)));
            }
            return Ok(store_marks(stored.into_iter().filter(|m| m.kind != kind).collect()));
        }
    } else {
        markable_ranges(state, kind)
    };

    let mut transform = Transform::new(&state.doc);
    for range in &ranges {
        remove_mark_steps(&mut transform, range, kind, None)?;
    }
    finish(transform)
}

fn toggle_mark(state: &EditorState, mark: Mark) -> Result<Transaction, CommandError> {
    let kind = mark.kind.clone();
    if state.selection.is_caret() {
        check_caret_allows(state, &kind)?;
        let stored = state.marks_at_caret();
        let marks = if Mark::type_in_set(&kind, &stored).is_some() {
            stored.into_iter().filter(|m| m.kind != kind).collect()
        } else {
            mark.add_to_set(&stored, state.schema())
        };
        return Ok(store_marks(marks));
    }

    let ranges = markable_ranges(state, &kind);
    if ranges.is_empty() {
        return Err(CommandError::unapplicable(format!("no text accepts '{}'", kind)));
    }
    if every_text_has(&state.doc, &ranges, |m| m.kind == kind) {
        let mut transform = Transform::new(&state.doc);
        for range in &ranges {
            remove_mark_steps(&mut transform, range, &kind, None)?;
        }
        finish(transform)
    } else {
        apply_mark(state, &ranges, &mark)
    }
}

pub(super) fn toggle_format(state: &EditorState, format: FormatMark) -> Result<Transaction, CommandError> {
    let mark = Mark::new(state.schema(), format.name(), Attrs::new())?;
    toggle_mark(state, mark)
}

pub(super) fn set_link(state: &EditorState, href: &str, target: Option<&str>) -> Result<Transaction, CommandError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(CommandError::unapplicable("link needs an address"));
    }
    if !is_safe_href(href) {
        return Err(CommandError::unapplicable(format!("unsupported link address '{}'", href)));
    }
    let mark = Mark::new(
        state.schema(),
        "link",
        attrs([("href", AttrValue::from(href)), ("target", AttrValue::from(target))]),
    )?;
    set_mark(state, mark, true)
}

pub(super) fn unset_link(state: &EditorState) -> Result<Transaction, CommandError> {
    unset_mark(state, "link")
}

pub(super) fn set_color(state: &EditorState, color: &str) -> Result<Transaction, CommandError> {
    let color = color.trim();
    if color.is_empty() {
        return Err(CommandError::unapplicable("colour is empty"));
    }
    if !is_safe_color(color) {
        return Err(CommandError::unapplicable(format!("'{}' is not a colour", color)));
    }
    let mark = Mark::new(state.schema(), "text_style", attrs([("color", color)]))?;
    set_mark(state, mark, false)
}

pub(super) fn set_highlight(state: &EditorState, color: Option<&str>) -> Result<Transaction, CommandError> {
    let color = color.map(str::trim).filter(|c| !c.is_empty());
    if let Some(color) = color.filter(|c| !is_safe_color(c)) {
        return Err(CommandError::unapplicable(format!("'{}' is not a colour", color)));
    }
    let mark = Mark::new(state.schema(), "highlight", attrs([("color", AttrValue::from(color))]))?;
    set_mark(state, mark, false)
}

pub(super) fn toggle_highlight(state: &EditorState) -> Result<Transaction, CommandError> {
    if mark_active(state, |m| m.kind == "highlight") {
        unset_mark(state, "highlight")
    } else {
        set_highlight(state, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecnn_model::{Position, Selection};
    use ecnn_schema::article_schema;
    use std::sync::Arc;

    fn state(json: &str, anchor: (usize, usize), head: (usize, usize)) -> EditorState {
        let schema = Arc::new(article_schema().unwrap());
        let mut state = EditorState::new(Document::from_json(schema, json).unwrap());
        state.selection = Selection::new(
            Position::new(vec![anchor.0], anchor.1),
            Position::new(vec![head.0], head.1),
        );
        state
    }

    fn apply(state: &EditorState, tx: Transaction) -> EditorState {
        state.apply(&tx).unwrap().0
    }

    fn leaves(state: &EditorState, block: usize) -> Vec<(String, Vec<String>)> {
        state.doc.node_at(&[block]).unwrap().content.iter()
            .map(|leaf| (leaf.text_str().to_string(), leaf.marks.iter().map(|m| m.kind.clone()).collect()))
            .collect()
    }

    const MIXED: &str = r#"{"type":"doc","content":[{"type":"paragraph","content":[
        {"type":"text","text":"ab"},
        {"type":"text","text":"cd","marks":[{"type":"bold"}]},
        {"type":"text","text":"ef"}
    ]}]}"#;

    #[test]
    fn test_toggle_bold_fills_partially_bold_range() {
        let state = state(MIXED, (0, 1), (0, 5));
        let tx = toggle_format(&state, FormatMark::Bold).unwrap();
        assert_eq!(tx.steps.len(), 2);
        let next = apply(&state, tx);
        assert_eq!(
            leaves(&next, 0),
            vec![
                ("a".to_string(), vec![]),
                ("bcde".to_string(), vec!["bold".to_string()]),
                ("f".to_string(), vec![]),
            ]
        );

        // Fully bold now, so the same toggle removes it
        let cleared = apply(&next, toggle_format(&next, FormatMark::Bold).unwrap());
        assert_eq!(cleared.doc.node_at(&[0]).unwrap().content, vec![Node::text("abcdef")]);
    }

    #[test]
    fn test_caret_toggle_sets_stored_marks() {
        let state = state(MIXED, (0, 3), (0, 3));
        let tx = toggle_format(&state, FormatMark::Italic).unwrap();
        assert!(tx.steps.is_empty());
        let next = apply(&state, tx);
        let kinds: Vec<_> = next.marks_at_caret().into_iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec!["bold", "italic"]);
    }

    #[test]
    fn test_set_link_replaces_existing_link() {
        let json = r#"{"type":"doc","content":[{"type":"paragraph","content":[
            {"type":"text","text":"old","marks":[{"type":"link","attrs":{"href":"/old"}}]},
            {"type":"text","text":" text"}
        ]}]}"#;
        let state = state(json, (0, 0), (0, 8));
        let next = apply(&state, set_link(&state, "/new", None).unwrap());
        let node = next.doc.node_at(&[0]).unwrap();
        assert_eq!(node.content.len(), 1);
        assert_eq!(node.content[0].marks[0].attrs["href"], AttrValue::from("/new"));
    }

    #[test]
    fn test_unset_link_at_caret_removes_whole_link() {
        let json = r#"{"type":"doc","content":[{"type":"paragraph","content":[
            {"type":"text","text":"go "},
            {"type":"text","text":"here","marks":[{"type":"link","attrs":{"href":"/x"}}]},
            {"type":"text","text":" now"}
        ]}]}"#;
        let state = state(json, (0, 5), (0, 5));
        let next = apply(&state, unset_link(&state).unwrap());
        assert_eq!(next.doc.node_at(&[0]).unwrap().content, vec![Node::text("go here now")]);

        let plain = self::state(json, (0, 1), (0, 1));
        assert!(unset_link(&plain).is_err());
    }

    #[test]
    fn test_marks_skip_code_blocks() {
        let json = r#"{"type":"doc","content":[{"type":"code_block","content":[{"type":"text","text":"x = 1"}]}]}"#;
        let state = state(json, (0, 0), (0, 3));
        assert!(matches!(
            toggle_format(&state, FormatMark::Bold),
            Err(CommandError::Unapplicable(_))
        ));
    }

    #[test]
    fn test_color_and_highlight() {
        let state = state(MIXED, (0, 0), (0, 6));
        let colored = apply(&state, set_color(&state, "#ff0000").unwrap());
        assert!(mark_active(&colored, |m| m.kind == "text_style"));
        let recolored = apply(&colored, set_color(&colored, "blue").unwrap());
        assert!(mark_active(&recolored, |m| m.attrs.get("color") == Some(&AttrValue::from("blue"))));

        let highlighted = apply(&recolored, toggle_highlight(&recolored).unwrap());
        assert!(mark_active(&highlighted, |m| m.kind == "highlight"));
        let plain = apply(&highlighted, toggle_highlight(&highlighted).unwrap());
        assert!(!mark_active(&plain, |m| m.kind == "highlight"));
        assert!(unset_mark(&plain, "highlight").is_err());
    }

    #[test]
    fn test_unparseable_values_are_refused() {
        let state = state(MIXED, (0, 0), (0, 6));
        for href in ["javascript:alert(1)", " JAVASCRIPT:void(0)", "java\nscript:x"] {
            assert!(
                matches!(set_link(&state, href, None), Err(CommandError::Unapplicable(_))),
                "{}",
                href
            );
        }
        assert!(set_link(&state, "https://example.com/?q=a&b=<c>", None).is_ok());

        for color in ["red; background: blue", "url(a:b)", "red\"", "<b>"] {
            assert!(set_color(&state, color).is_err(), "{}", color);
            assert!(set_highlight(&state, Some(color)).is_err(), "{}", color);
        }
        assert!(set_color(&state, "rgb(1, 2, 3)").is_ok());
    }
}
