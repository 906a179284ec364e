//! # Document
//!
//! A validated tree bound to its schema. [`Document::apply`] is the only
//! way to change it: steps run against a working copy and the result is
//! validated as a whole before it replaces anything.

use crate::error::{StepError, TransactionError, ValidationError};
use crate::mapping::Mapping;
use crate::node::{inline_width, leaf_after, leaf_before, normalize_inline, Mark, Node};
use crate::position::Position;
use crate::step::{content_width, Step, StepOutcome};
use crate::transaction::{AppliedTransaction, Transaction};
use ecnn_schema::{AttrError, Attrs, NodeType, Schema};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while loading a document from JSON
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Attr(#[from] AttrError),

    #[error("Invalid document {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Clone)]
pub struct Document {
    schema: Arc<Schema>,
    root: Node,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("root", &self.root).finish()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

/// A textblock overlapping a range, with the overlapping character span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRange {
    pub path: Vec<usize>,
    pub from: usize,
    pub to: usize,
}

impl Document {
    /// An empty document: a single empty paragraph
    pub fn new(schema: Arc<Schema>) -> Self {
        let paragraph = Node::new(&schema, "paragraph", Attrs::new(), Vec::new()).unwrap_or_else(|_| Node {
            kind: "paragraph".to_string(),
            attrs: Attrs::new(),
            content: Vec::new(),
            marks: Vec::new(),
            text: None,
        });
        let root = Node::new(&schema, "doc", Attrs::new(), vec![paragraph.clone()]).unwrap_or_else(|_| Node {
            kind: "doc".to_string(),
            attrs: Attrs::new(),
            content: vec![paragraph],
            marks: Vec::new(),
            text: None,
        });
        Self { schema, root }
    }

    /// Wrap an existing tree, validating it first
    pub fn from_root(schema: Arc<Schema>, root: Node) -> Result<Self, ValidationError> {
        let doc = Self { schema, root };
        doc.validate()?;
        Ok(doc)
    }

    /// Load JSON, filling missing attributes and normalizing inline content
    pub fn from_json(schema: Arc<Schema>, json: &str) -> Result<Self, LoadError> {
        let root: Node = serde_json::from_str(json)?;
        let root = normalize_tree(&schema, root)?;
        Ok(Self::from_root(schema, root)?)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.root).unwrap_or(serde_json::Value::Null)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        self.root.node_at(path)
    }

    pub fn node_type_at(&self, path: &[usize]) -> Option<&NodeType> {
        self.schema.node(&self.node_at(path)?.kind)
    }

    /// A document holding nothing but one empty paragraph
    pub fn is_empty(&self) -> bool {
        self.root.content.len() == 1
            && self.root.content[0].kind == "paragraph"
            && self.root.content[0].content.is_empty()
    }

    pub fn text_content(&self) -> String {
        self.root.text_content()
    }

    /// Resolve a position; `None` when it does not address a gap or a
    /// character offset in this document.
    pub fn resolve(&self, pos: &Position) -> Option<ResolvedPos<'_>> {
        let mut nodes = Vec::with_capacity(pos.path.len() + 1);
        let mut node = &self.root;
        nodes.push(node);
        for &index in &pos.path {
            node = node.content.get(index)?;
            nodes.push(node);
        }
        let ty = self.schema.node(&node.kind)?;
        if node.is_text() || ty.is_leaf() || pos.offset > content_width(node, ty) {
            return None;
        }
        Some(ResolvedPos {
            pos: pos.clone(),
            nodes,
            schema: &self.schema,
        })
    }

    /// Visit every node in document order with its path
    pub fn for_each_node<'a>(&'a self, mut f: impl FnMut(&[usize], &'a Node)) {
        fn walk<'a>(node: &'a Node, path: &mut Vec<usize>, f: &mut impl FnMut(&[usize], &'a Node)) {
            f(path, node);
            if node.is_text() {
                return;
            }
            for (index, child) in node.content.iter().enumerate() {
                path.push(index);
                walk(child, path, f);
                path.pop();
            }
        }
        walk(&self.root, &mut Vec::new(), &mut f);
    }

    /// Textblocks overlapping `from..to`, clipped to the range. Only the
    /// subtrees lying between the two positions are visited.
    pub fn textblocks_between(&self, from: &Position, to: &Position) -> Vec<TextRange> {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        let bounds = RangeBounds {
            from,
            to,
            from_key: from.child_path(),
            to_key: to.child_path(),
        };
        let mut found = Vec::new();
        self.collect_textblocks(&self.root, &mut Vec::new(), &bounds, &mut found);
        found
    }

    fn collect_textblocks(
        &self,
        node: &Node,
        path: &mut Vec<usize>,
        bounds: &RangeBounds<'_>,
        found: &mut Vec<TextRange>,
    ) {
        let RangeBounds {
            from,
            to,
            from_key,
            to_key,
        } = bounds;
        if self.schema.node(&node.kind).is_some_and(NodeType::is_textblock) {
            let width = inline_width(&node.content);
            let clip_from = if from.path == *path { from.offset } else { 0 };
            let clip_to = if to.path == *path { to.offset } else { width };
            found.push(TextRange {
                path: path.clone(),
                from: clip_from,
                to: clip_to.max(clip_from),
            });
            return;
        }
        if node.is_text() {
            return;
        }

        let first = match subtree_order(path, from_key) {
            Ordering::Equal => from_key[path.len()],
            _ => 0,
        };
        for (index, child) in node.content.iter().enumerate().skip(first) {
            path.push(index);
            if subtree_order(path, to_key) == Ordering::Greater {
                path.pop();
                break;
            }
            if subtree_order(path, from_key) != Ordering::Less {
                self.collect_textblocks(child, path, bounds, found);
            }
            path.pop();
        }
    }

    /// Text between two positions; block boundaries become newlines
    pub fn text_between(&self, from: &Position, to: &Position) -> String {
        let mut out = String::new();
        for (i, range) in self.textblocks_between(from, to).iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let Some(node) = self.node_at(&range.path) else { continue };
            let mut pos = 0;
            for leaf in &node.content {
                let width = leaf.width();
                let (start, end) = (pos.max(range.from), (pos + width).min(range.to));
                if start < end {
                    match &leaf.text {
                        Some(text) => out.extend(text.chars().skip(start - pos).take(end - start)),
                        None if leaf.kind == "hard_break" => out.push('\n'),
                        None => {}
                    }
                }
                pos += width;
            }
        }
        out
    }

    pub fn start_position(&self) -> Position {
        self.textblock_from(&self.root, &mut Vec::new(), &[])
            .map(|path| Position::new(path, 0))
            .unwrap_or_else(|| Position::new(Vec::new(), 0))
    }

    pub fn end_position(&self) -> Position {
        self.last_textblock(&self.root, &mut Vec::new())
            .map(|(path, node)| Position::new(path, inline_width(&node.content)))
            .unwrap_or_else(|| Position::new(Vec::new(), self.root.content.len()))
    }

    /// Move a position that is not inside a textblock to the nearest
    /// textblock: the next one in document order, else the end of the last.
    pub fn snap(&self, pos: &Position) -> Position {
        if self.resolve(pos).is_some_and(|r| r.is_textblock()) {
            return pos.clone();
        }
        if let Some(path) = self.textblock_from(&self.root, &mut Vec::new(), &pos.child_path()) {
            return Position::new(path, 0);
        }
        match self.last_textblock(&self.root, &mut Vec::new()) {
            Some((path, node)) => Position::new(path, inline_width(&node.content)),
            None if self.resolve(pos).is_some() => pos.clone(),
            None => Position::new(Vec::new(), 0),
        }
    }

    /// First textblock whose start is at or after `key`
    fn textblock_from(&self, node: &Node, path: &mut Vec<usize>, key: &[usize]) -> Option<Vec<usize>> {
        if self.schema.node(&node.kind).is_some_and(NodeType::is_textblock) {
            let starts_after = path.iter().copied().chain([0]).cmp(key.iter().copied()) != Ordering::Less;
            return starts_after.then(|| path.clone());
        }
        if node.is_text() {
            return None;
        }
        let first = match subtree_order(path, key) {
            Ordering::Equal => key[path.len()],
            _ => 0,
        };
        for (index, child) in node.content.iter().enumerate().skip(first) {
            path.push(index);
            let found = self.textblock_from(child, path, key);
            path.pop();
            if found.is_some() {
                return found;
            }
        }
        None
    }

    fn last_textblock<'a>(&self, node: &'a Node, path: &mut Vec<usize>) -> Option<(Vec<usize>, &'a Node)> {
        if self.schema.node(&node.kind).is_some_and(NodeType::is_textblock) {
            return Some((path.clone(), node));
        }
        for (index, child) in node.content.iter().enumerate().rev() {
            path.push(index);
            let found = self.last_textblock(child, path);
            path.pop();
            if found.is_some() {
                return found;
            }
        }
        None
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.root.kind != "doc" {
            return Err(ValidationError::new(&[], "root must be a doc node"));
        }
        self.validate_node(&self.root, &mut Vec::new(), None)
    }

    fn validate_node(
        &self,
        node: &Node,
        path: &mut Vec<usize>,
        parent: Option<&NodeType>,
    ) -> Result<(), ValidationError> {
        let schema = &self.schema;

        if let Some(text) = &node.text {
            if node.kind != "text" || !node.content.is_empty() || !node.attrs.is_empty() {
                return Err(ValidationError::new(path, "malformed text node"));
            }
            if text.is_empty() {
                return Err(ValidationError::new(path, "empty text node"));
            }
            let Some(parent) = parent.filter(|p| p.is_textblock()) else {
                return Err(ValidationError::new(path, "text outside a textblock"));
            };
            let mut last_rank = None;
            for mark in &node.marks {
                let Some(mark_type) = schema.mark(&mark.kind) else {
                    return Err(ValidationError::new(path, format!("unknown mark '{}'", mark.kind)));
                };
                if !parent.allows_mark(&mark.kind) {
                    return Err(ValidationError::new(
                        path,
                        format!("mark '{}' not allowed in '{}'", mark.kind, parent.name),
                    ));
                }
                match schema.fill_mark_attrs(&mark.kind, &mark.attrs) {
                    Ok(filled) if filled == mark.attrs => {}
                    Ok(_) => {
                        return Err(ValidationError::new(
                            path,
                            format!("attributes of mark '{}' are not normalized", mark.kind),
                        ))
                    }
                    Err(err) => return Err(ValidationError::new(path, err.to_string())),
                }
                if last_rank.is_some_and(|rank| rank >= mark_type.rank()) {
                    return Err(ValidationError::new(path, "marks are unordered or repeated"));
                }
                last_rank = Some(mark_type.rank());
            }
            return Ok(());
        }

        let Some(ty) = schema.node(&node.kind) else {
            return Err(ValidationError::new(path, format!("unknown node type '{}'", node.kind)));
        };
        if ty.is_text() {
            return Err(ValidationError::new(path, "text node without text"));
        }
        if !node.marks.is_empty() {
            return Err(ValidationError::new(path, "marks on a non-text node"));
        }
        match schema.fill_attrs(&node.kind, &node.attrs) {
            Ok(filled) if filled == node.attrs => {}
            Ok(_) => {
                return Err(ValidationError::new(
                    path,
                    format!("attributes of '{}' are not normalized", node.kind),
                ))
            }
            Err(err) => return Err(ValidationError::new(path, err.to_string())),
        }

        let mut child_types = Vec::with_capacity(node.content.len());
        for child in &node.content {
            match schema.node(&child.kind) {
                Some(child_type) => child_types.push(child_type),
                None => {
                    return Err(ValidationError::new(
                        path,
                        format!("unknown node type '{}'", child.kind),
                    ))
                }
            }
        }
        if !schema.content_matches(ty, &child_types) {
            let found: Vec<&str> = child_types.iter().map(|t| t.name.as_str()).collect();
            return Err(ValidationError::new(
                path,
                format!(
                    "content [{}] of '{}' does not match '{}'",
                    found.join(", "),
                    ty.name,
                    ty.content_expr()
                ),
            ));
        }
        if ty.is_textblock() && normalize_inline(node.content.clone()) != node.content {
            return Err(ValidationError::new(path, "inline content is not normalized"));
        }

        for (index, child) in node.content.iter().enumerate() {
            path.push(index);
            self.validate_node(child, path, Some(ty))?;
            path.pop();
        }
        Ok(())
    }

    pub(crate) fn apply_step(&mut self, step: &Step) -> Result<StepOutcome, StepError> {
        step.apply(&mut self.root, &self.schema)
    }

    /// Apply a transaction atomically
    pub fn apply(&self, tx: &Transaction) -> Result<AppliedTransaction, TransactionError> {
        // Valid by construction; re-checked in debug builds only
        #[cfg(debug_assertions)]
        if let Err(err) = self.validate() {
            tracing::error!(%err, "document is corrupted");
            return Err(TransactionError::Corrupted(err));
        }

        let mut working = self.clone();
        let mut mapping = Mapping::new();
        let mut inverses = Vec::with_capacity(tx.steps.len());

        for (index, step) in tx.steps.iter().enumerate() {
            match working.apply_step(step) {
                Ok(outcome) => {
                    tracing::debug!(index, step = step.name(), "applied step");
                    inverses.push(outcome.inverse);
                    mapping.push(outcome.map);
                }
                Err(reason) => {
                    tracing::warn!(index, step = step.name(), %reason, "transaction rejected");
                    return Err(TransactionError::SchemaViolation {
                        step: Some(index),
                        reason,
                    });
                }
            }
        }

        if let Err(err) = working.validate() {
            tracing::warn!(%err, "transaction result rejected");
            return Err(TransactionError::SchemaViolation {
                step: None,
                reason: StepError::Invalid(err),
            });
        }

        if let Some(selection) = &tx.selection {
            if working.resolve(&selection.anchor).is_none() || working.resolve(&selection.head).is_none() {
                return Err(TransactionError::InvalidSelection);
            }
        }

        inverses.reverse();
        Ok(AppliedTransaction {
            doc: working,
            inverses,
            mapping,
        })
    }
}

/// Fill attributes, order marks and normalize inline content throughout
pub fn normalize_tree(schema: &Schema, mut node: Node) -> Result<Node, AttrError> {
    if node.is_text() {
        let mut marks = Vec::with_capacity(node.marks.len());
        for mark in &node.marks {
            marks.push(Mark::new(schema, &mark.kind, mark.attrs.clone())?);
        }
        marks.sort_by_key(|m| schema.mark_rank(&m.kind));
        marks.dedup_by(|a, b| a.kind == b.kind);
        node.marks = marks;
        return Ok(node);
    }
    node.attrs = schema.fill_attrs(&node.kind, &node.attrs)?;
    let children = std::mem::take(&mut node.content)
        .into_iter()
        .map(|child| normalize_tree(schema, child))
        .collect::<Result<Vec<_>, _>>()?;
    node.content = if schema.node(&node.kind).is_some_and(NodeType::is_textblock) {
        normalize_inline(children)
    } else {
        children
    };
    Ok(node)
}

/// A position with its ancestor chain
#[derive(Debug, Clone)]
pub struct ResolvedPos<'a> {
    pub pos: Position,
    nodes: Vec<&'a Node>,
    schema: &'a Schema,
}

impl<'a> ResolvedPos<'a> {
    /// Depth of the addressed node; the root is depth 0
    pub fn depth(&self) -> usize {
        self.pos.path.len()
    }

    pub fn node(&self, depth: usize) -> &'a Node {
        self.nodes[depth]
    }

    /// The node the position is in
    pub fn parent(&self) -> &'a Node {
        self.nodes[self.nodes.len() - 1]
    }

    pub fn parent_type(&self) -> Option<&'a NodeType> {
        self.schema.node(&self.parent().kind)
    }

    /// Path of the ancestor at `depth`
    pub fn path_at(&self, depth: usize) -> &[usize] {
        &self.pos.path[..depth]
    }

    pub fn is_textblock(&self) -> bool {
        self.parent_type().is_some_and(NodeType::is_textblock)
    }

    /// Ancestors innermost first, with their depth
    pub fn ancestors(&self) -> impl Iterator<Item = (usize, &'a Node)> + '_ {
        self.nodes.iter().copied().enumerate().rev()
    }

    /// Innermost ancestor satisfying `pred`, as (path, node)
    pub fn find_ancestor(&self, pred: impl Fn(&Node) -> bool) -> Option<(Vec<usize>, &'a Node)> {
        self.ancestors()
            .find(|(_, node)| pred(node))
            .map(|(depth, node)| (self.path_at(depth).to_vec(), node))
    }

    /// Marks of the text before the position; at the start of a
    /// textblock, those of the text after it
    pub fn marks(&self) -> Vec<Mark> {
        if !self.is_textblock() {
            return Vec::new();
        }
        let content = &self.parent().content;
        let leaf = if self.pos.offset == 0 {
            leaf_after(content, 0)
        } else {
            leaf_before(content, self.pos.offset)
        };
        leaf.filter(|n| n.is_text())
            .map(|n| n.marks.clone())
            .unwrap_or_default()
    }

    /// The leaf just before the position inside a textblock
    pub fn leaf_before(&self) -> Option<&'a Node> {
        if !self.is_textblock() {
            return None;
        }
        leaf_before(&self.parent().content, self.pos.offset)
    }

    /// The leaf just after the position inside a textblock
    pub fn leaf_after(&self) -> Option<&'a Node> {
        if !self.is_textblock() {
            return None;
        }
        leaf_after(&self.parent().content, self.pos.offset)
    }

    /// Width of the node the position is in
    pub fn parent_width(&self) -> usize {
        match self.parent_type() {
            Some(ty) => content_width(self.parent(), ty),
            None => 0,
        }
    }
}

/// Ordered ends of a range with their ordering keys
struct RangeBounds<'a> {
    from: &'a Position,
    to: &'a Position,
    from_key: Vec<usize>,
    to_key: Vec<usize>,
}

/// Where the subtree at `path` lies relative to the position whose key
/// (`path ++ [offset]`) is `key`: `Equal` when it contains the position
fn subtree_order(path: &[usize], key: &[usize]) -> Ordering {
    for (a, b) in path.iter().zip(key) {
        match a.cmp(b) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    if path.len() < key.len() {
        Ordering::Equal
    } else {
        Ordering::Greater
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Selection;
    use ecnn_schema::article_schema;

    fn schema() -> Arc<Schema> {
        Arc::new(article_schema().unwrap())
    }

    fn two_paragraphs(schema: &Arc<Schema>) -> Document {
        let json = r#"{"type":"doc","content":[
            {"type":"paragraph","content":[{"type":"text","text":"Hello"}]},
            {"type":"paragraph","content":[{"type":"text","text":"world","marks":[{"type":"bold"}]}]}
        ]}"#;
        Document::from_json(schema.clone(), json).unwrap()
    }

    #[test]
    fn test_new_document_is_valid() {
        let doc = Document::new(schema());
        assert!(doc.validate().is_ok());
        assert!(doc.is_empty());
        assert_eq!(doc.start_position(), Position::new(vec![0], 0));
    }

    #[test]
    fn test_from_json_fills_attrs() {
        let schema = schema();
        let doc = two_paragraphs(&schema);
        assert_eq!(
            doc.node_at(&[0]).unwrap().attrs.get("text_align"),
            Some(&ecnn_schema::AttrValue::from("left"))
        );
    }

    #[test]
    fn test_from_root_rejects_invalid_content() {
        let schema = schema();
        let root = Node::new(&schema, "doc", Attrs::new(), vec![Node::text("loose")]).unwrap();
        assert!(Document::from_root(schema, root).is_err());
    }

    #[test]
    fn test_resolve_and_marks() {
        let schema = schema();
        let doc = two_paragraphs(&schema);
        let resolved = doc.resolve(&Position::new(vec![1], 2)).unwrap();
        assert_eq!(resolved.depth(), 1);
        assert!(resolved.is_textblock());
        assert_eq!(resolved.marks(), vec![Mark::plain("bold")]);
        assert!(doc.resolve(&Position::new(vec![1], 9)).is_none());
        assert!(doc.resolve(&Position::new(vec![5], 0)).is_none());
    }

    #[test]
    fn test_text_between() {
        let schema = schema();
        let doc = two_paragraphs(&schema);
        let text = doc.text_between(&Position::new(vec![0], 3), &Position::new(vec![1], 2));
        assert_eq!(text, "lo\nwo");
        assert_eq!(
            doc.textblocks_between(&Position::new(vec![0], 3), &Position::new(vec![1], 2)),
            vec![
                TextRange { path: vec![0], from: 3, to: 5 },
                TextRange { path: vec![1], from: 0, to: 2 },
            ]
        );
    }

    #[test]
    fn test_nested_ranges_and_snapping() {
        let json = r#"{"type":"doc","content":[
            {"type":"paragraph","content":[{"type":"text","text":"a"}]},
            {"type":"blockquote","content":[
                {"type":"paragraph","content":[{"type":"text","text":"bb"}]},
                {"type":"paragraph","content":[{"type":"text","text":"cc"}]}
            ]},
            {"type":"bullet_list","content":[
                {"type":"list_item","content":[{"type":"paragraph","content":[{"type":"text","text":"dd"}]}]},
                {"type":"list_item","content":[{"type":"paragraph","content":[{"type":"text","text":"ee"}]}]}
            ]},
            {"type":"paragraph","content":[{"type":"text","text":"f"}]}
        ]}"#;
        let doc = Document::from_json(schema(), json).unwrap();

        let from = Position::new(vec![1, 1], 1);
        let to = Position::new(vec![2, 0, 0], 1);
        let expected = vec![
            TextRange { path: vec![1, 1], from: 1, to: 2 },
            TextRange { path: vec![2, 0, 0], from: 0, to: 1 },
        ];
        assert_eq!(doc.textblocks_between(&from, &to), expected);
        assert_eq!(doc.textblocks_between(&to, &from), expected);
        assert_eq!(doc.text_between(&from, &to), "c\nd");

        // Block positions between containers
        assert_eq!(
            doc.textblocks_between(&Position::new(vec![], 1), &Position::new(vec![], 2)),
            vec![
                TextRange { path: vec![1, 0], from: 0, to: 2 },
                TextRange { path: vec![1, 1], from: 0, to: 2 },
            ]
        );

        assert_eq!(doc.start_position(), Position::new(vec![0], 0));
        assert_eq!(doc.end_position(), Position::new(vec![3], 1));
        assert_eq!(doc.snap(&Position::new(vec![2], 1)), Position::new(vec![2, 1, 0], 0));
        assert_eq!(doc.snap(&Position::new(vec![], 4)), Position::new(vec![3], 1));
    }

    #[test]
    fn test_atomic_rejection_leaves_document_unchanged() {
        let schema = schema();
        let doc = two_paragraphs(&schema);
        let before = doc.clone();
        let tx = Transaction::new()
            .step(Step::Insert {
                parent: vec![0],
                offset: 5,
                content: vec![Node::text("!")],
            })
            .step(Step::Split {
                path: vec![],
                offset: 0,
                new_type: None,
            });
        let err = doc.apply(&tx).unwrap_err();
        assert!(matches!(err, TransactionError::SchemaViolation { step: Some(1), .. }));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_final_validation_catches_bad_content() {
        let schema = schema();
        let doc = two_paragraphs(&schema);
        let tx = Transaction::new().step(Step::Delete {
            parent: vec![],
            from: 0,
            to: 2,
        });
        let err = doc.apply(&tx).unwrap_err();
        assert!(matches!(err, TransactionError::SchemaViolation { step: None, .. }));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_corrupted_document_is_fatal() {
        let doc = Document::new(Arc::new(Schema::new()));
        let err = doc.apply(&Transaction::new()).unwrap_err();
        assert!(matches!(err, TransactionError::Corrupted(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_invalid_selection() {
        let schema = schema();
        let doc = two_paragraphs(&schema);
        let tx = Transaction::select(Selection::caret(Position::new(vec![7], 0)));
        assert_eq!(doc.apply(&tx).unwrap_err(), TransactionError::InvalidSelection);
    }

    #[test]
    fn test_inverses_undo() {
        let schema = schema();
        let doc = two_paragraphs(&schema);
        let tx = Transaction::new()
            .step(Step::Insert {
                parent: vec![0],
                offset: 5,
                content: vec![Node::text(", dear")],
            })
            .step(Step::Join { path: vec![1] });
        let applied = doc.apply(&tx).unwrap();
        assert_eq!(applied.doc.root().content.len(), 1);
        assert_eq!(applied.doc.text_content(), "Hello, dearworld");

        let undo = Transaction {
            steps: applied.inverses.clone(),
            ..Transaction::default()
        };
        let restored = applied.doc.apply(&undo).unwrap();
        assert_eq!(restored.doc, doc);
    }

    #[test]
    fn test_snap_moves_into_textblock() {
        let schema = schema();
        let doc = two_paragraphs(&schema);
        assert_eq!(doc.snap(&Position::new(vec![], 1)), Position::new(vec![1], 0));
        assert_eq!(doc.snap(&Position::new(vec![], 2)), Position::new(vec![1], 5));
    }
}
