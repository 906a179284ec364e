//! # Document nodes
//!
//! Nodes serialize to the familiar `{ type, attrs, content, marks, text }`
//! JSON shape. Inline content is kept normalized: no empty text leaves and
//! no two adjacent text leaves with the same mark set.

use ecnn_schema::{AttrError, Attrs, Schema};
use serde::{Deserialize, Serialize};

/// Inline formatting attached to a text leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

impl Mark {
    /// A mark with attributes filled from its declaration
    pub fn new(schema: &Schema, kind: &str, attrs: Attrs) -> Result<Self, AttrError> {
        let attrs = schema.fill_mark_attrs(kind, &attrs)?;
        Ok(Self {
            kind: kind.to_string(),
            attrs,
        })
    }

    /// A mark with no attributes, without consulting a schema
    pub fn plain(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            attrs: Attrs::new(),
        }
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.contains(self)
    }

    /// Add to a rank-ordered set, replacing any mark of the same type
    pub fn add_to_set(&self, set: &[Mark], schema: &Schema) -> Vec<Mark> {
        let mut result: Vec<Mark> = set.iter().filter(|m| m.kind != self.kind).cloned().collect();
        let rank = schema.mark_rank(&self.kind);
        let at = result
            .iter()
            .position(|m| schema.mark_rank(&m.kind) > rank)
            .unwrap_or(result.len());
        result.insert(at, self.clone());
        result
    }

    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|m| *m != self).cloned().collect()
    }

    pub fn type_in_set<'a>(kind: &str, set: &'a [Mark]) -> Option<&'a Mark> {
        set.iter().find(|m| m.kind == kind)
    }
}

/// A type name plus attributes, used where steps create or retype nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attrs: Attrs,
}

impl NodeSpec {
    pub fn new(kind: &str, attrs: Attrs) -> Self {
        Self {
            kind: kind.to_string(),
            attrs,
        }
    }

    pub fn of(node: &Node) -> Self {
        Self {
            kind: node.kind.clone(),
            attrs: node.attrs.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Node {
    /// A non-text node with attributes filled from its declaration
    pub fn new(
        schema: &Schema,
        kind: &str,
        attrs: Attrs,
        content: Vec<Node>,
    ) -> Result<Self, AttrError> {
        let attrs = schema.fill_attrs(kind, &attrs)?;
        Ok(Self {
            kind: kind.to_string(),
            attrs,
            content,
            marks: Vec::new(),
            text: None,
        })
    }

    pub fn from_spec(schema: &Schema, spec: &NodeSpec, content: Vec<Node>) -> Result<Self, AttrError> {
        Self::new(schema, &spec.kind, spec.attrs.clone(), content)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::text_with_marks(text, Vec::new())
    }

    pub fn text_with_marks(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            kind: "text".to_string(),
            attrs: Attrs::new(),
            content: Vec::new(),
            marks,
            text: Some(text.into()),
        }
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Width inside inline content: characters for text, one otherwise
    pub fn width(&self) -> usize {
        match &self.text {
            Some(text) => text.chars().count(),
            None => 1,
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self.content.get(*first)?.node_at(rest),
        }
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self.content.get_mut(*first)?.node_at_mut(rest),
        }
    }

    /// Text of the subtree; hard breaks become newlines and blocks are
    /// separated by newlines.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
            return;
        }
        if self.kind == "hard_break" {
            out.push('\n');
            return;
        }
        let inline = self.content.iter().any(Node::is_text);
        for (i, child) in self.content.iter().enumerate() {
            if i > 0 && !inline && !child.is_text() && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            child.collect_text(out);
        }
    }

    pub fn has_mark(&self, mark: &Mark) -> bool {
        self.marks.contains(mark)
    }

    /// Number of nodes in the subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.content.iter().map(Node::node_count).sum::<usize>()
    }
}

/// Total width of inline content
pub fn inline_width(content: &[Node]) -> usize {
    content.iter().map(Node::width).sum()
}

fn split_text_node(node: Node, at: usize) -> (Node, Node) {
    let mut head = node.text.unwrap_or_default();
    let byte = head
        .char_indices()
        .nth(at)
        .map(|(index, _)| index)
        .unwrap_or(head.len());
    let tail = head.split_off(byte);
    let left = Node::text_with_marks(head, node.marks.clone());
    let right = Node::text_with_marks(tail, node.marks);
    (left, right)
}

/// Split inline content at a character offset
pub fn split_inline(content: Vec<Node>, offset: usize) -> (Vec<Node>, Vec<Node>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut pos = 0;

    for node in content {
        let width = node.width();
        if pos + width <= offset {
            left.push(node);
        } else if pos >= offset {
            right.push(node);
        } else {
            let (a, b) = split_text_node(node, offset - pos);
            left.push(a);
            right.push(b);
        }
        pos += width;
    }

    (normalize_inline(left), normalize_inline(right))
}

/// Copy of the inline content between two character offsets
pub fn slice_inline(content: &[Node], from: usize, to: usize) -> Vec<Node> {
    let (_, rest) = split_inline(content.to_vec(), from);
    let (middle, _) = split_inline(rest, to.saturating_sub(from));
    middle
}

/// Apply `f` to every leaf between two offsets, splitting text at the edges
pub fn map_inline_range(
    content: Vec<Node>,
    from: usize,
    to: usize,
    mut f: impl FnMut(&mut Node),
) -> Vec<Node> {
    let (mut left, rest) = split_inline(content, from);
    let (mut middle, right) = split_inline(rest, to.saturating_sub(from));
    middle.iter_mut().for_each(&mut f);
    left.append(&mut middle);
    left.extend(right);
    normalize_inline(left)
}

/// Drop empty text leaves and merge neighbours with equal marks
pub fn normalize_inline(content: Vec<Node>) -> Vec<Node> {
    let mut result: Vec<Node> = Vec::with_capacity(content.len());
    for node in content {
        if node.is_text() && node.text_str().is_empty() {
            continue;
        }
        if let Some(last) = result.last_mut() {
            if last.is_text() && node.is_text() && last.marks == node.marks {
                let mut merged = last.text.take().unwrap_or_default();
                merged.push_str(node.text_str());
                last.text = Some(merged);
                continue;
            }
        }
        result.push(node);
    }
    result
}

/// The leaf containing the character just before `offset`
pub fn leaf_before(content: &[Node], offset: usize) -> Option<&Node> {
    if offset == 0 {
        return None;
    }
    let mut pos = 0;
    for node in content {
        pos += node.width();
        if pos >= offset {
            return Some(node);
        }
    }
    None
}

/// The leaf containing the character just after `offset`
pub fn leaf_after(content: &[Node], offset: usize) -> Option<&Node> {
    let mut pos = 0;
    for node in content {
        let end = pos + node.width();
        if end > offset {
            return Some(node);
        }
        pos = end;
    }
    None
}
