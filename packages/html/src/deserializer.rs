//! # Deserializer
//!
//! Markup is read into the generic element tree and each element is
//! mapped through the schema's parse rules. Reading never fails:
//!
//! - unknown attributes are dropped by attribute filling
//! - unknown elements are transparent; text outside any textblock is
//!   gathered into paragraphs
//! - block nodes found inside inline content split the textblock around them
//! - children a container cannot hold are wrapped in an allowed type, and
//!   empty required content is filled with defaults
//!
//! Every repair is recorded in the [`ParseReport`].

use ecnn_markup::{parse_fragment, Element, MarkupNode};
use ecnn_model::{normalize_inline, Document, Mark, Node};
use ecnn_schema::{Attrs, NodeType, ParseContent, Resolved, Schema};
use std::sync::Arc;

/// Unknown elements with these tags hold blocks rather than inline content
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "body", "center", "details", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "header", "html", "main", "nav",
    "section", "summary", "tbody", "tfoot", "thead",
];

/// Repairs made while reading markup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub repairs: Vec<String>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty()
    }

    fn note(&mut self, repair: impl Into<String>) {
        self.repairs.push(repair.into());
    }
}

/// Read markup into a document
pub fn deserialize(schema: Arc<Schema>, markup: &str) -> Document {
    deserialize_with_report(schema, markup).0
}

pub fn deserialize_with_report(schema: Arc<Schema>, markup: &str) -> (Document, ParseReport) {
    let fragment = parse_fragment(markup);
    let mut parser = Parser::new(&schema);
    let root = parser.parse_root(&fragment);
    let mut report = parser.report;

    let doc = match root.map(|root| Document::from_root(schema.clone(), root)) {
        Some(Ok(doc)) => doc,
        Some(Err(err)) => {
            report.note(format!("fell back to plain text: {}", err));
            plain_text_document(schema, &fragment)
        }
        None => {
            report.note("fell back to plain text: no doc type");
            plain_text_document(schema, &fragment)
        }
    };

    if !report.is_clean() {
        tracing::warn!(repairs = report.repairs.len(), "repaired degraded markup");
        for repair in &report.repairs {
            tracing::debug!(%repair);
        }
    }
    (doc, report)
}

/// Last resort: one paragraph per non-empty line of text
fn plain_text_document(schema: Arc<Schema>, fragment: &[MarkupNode]) -> Document {
    let mut holder = Element::new("#fragment");
    holder.children = fragment.to_vec();
    let text = holder.text_content();

    let mut paragraphs = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match Node::new(&schema, "paragraph", Attrs::new(), vec![Node::text(line)]) {
            Ok(paragraph) => paragraphs.push(paragraph),
            Err(_) => break,
        }
    }
    if paragraphs.is_empty() {
        return Document::new(schema);
    }
    Node::new(&schema, "doc", Attrs::new(), paragraphs)
        .ok()
        .and_then(|root| Document::from_root(schema.clone(), root).ok())
        .unwrap_or_else(|| Document::new(schema))
}

/// Inline content being gathered for a textblock, plus the blocks already
/// finished in front of it
struct InlineRun<'s> {
    shell: &'s NodeType,
    attrs: Attrs,
    leaves: Vec<Node>,
    blocks: Vec<Node>,
    /// A newline-bearing whitespace run is waiting to become a space
    pending_space: bool,
    /// The shell was emitted at least once
    emitted: bool,
}

impl<'s> InlineRun<'s> {
    fn new(shell: &'s NodeType, attrs: Attrs) -> Self {
        Self {
            shell,
            attrs,
            leaves: Vec::new(),
            blocks: Vec::new(),
            pending_space: false,
            emitted: false,
        }
    }

    fn push_text(&mut self, text: &str, marks: &[Mark]) {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c.is_whitespace() && c != '\u{a0}' {
                let mut run = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !next.is_whitespace() || next == '\u{a0}' {
                        break;
                    }
                    run.push(next);
                    chars.next();
                }
                if run.contains(['\n', '\r']) {
                    if !out.is_empty() || self.leaves.last().is_some_and(Node::is_text) {
                        self.pending_space = true;
                    }
                    continue;
                }
                self.pending_space = false;
                out.push_str(&run);
                continue;
            }
            if self.pending_space {
                out.push(' ');
                self.pending_space = false;
            }
            out.push(c);
        }
        if !out.is_empty() {
            self.leaves.push(Node::text_with_marks(out, marks.to_vec()));
        }
    }

    fn push_inline(&mut self, node: Node) {
        self.pending_space = false;
        self.leaves.push(node);
    }

    fn has_content(&self) -> bool {
        !self.leaves.is_empty()
    }

    /// Close the current textblock. An empty one is only kept when forced
    /// and nothing was emitted yet.
    fn flush(&mut self, force: bool) {
        self.pending_space = false;
        if self.leaves.is_empty() && !(force && !self.emitted) {
            return;
        }
        let content = normalize_inline(std::mem::take(&mut self.leaves));
        self.blocks.push(Node {
            kind: self.shell.name.clone(),
            attrs: self.attrs.clone(),
            content,
            marks: Vec::new(),
            text: None,
        });
        self.emitted = true;
    }

    fn push_block(&mut self, block: Node) {
        self.flush(false);
        self.blocks.push(block);
    }
}

struct Parser<'s> {
    schema: &'s Schema,
    report: ParseReport,
}

impl<'s> Parser<'s> {
    fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            report: ParseReport::default(),
        }
    }

    fn parse_root(&mut self, fragment: &[MarkupNode]) -> Option<Node> {
        let doc_type = self.schema.node("doc")?;
        let blocks = self.parse_blocks(fragment);
        let content = self.fit_content(doc_type, blocks);
        Some(Node {
            kind: doc_type.name.clone(),
            attrs: self.schema.fill_attrs(&doc_type.name, &Attrs::new()).ok()?,
            content,
            marks: Vec::new(),
            text: None,
        })
    }

    fn paragraph_run(&self) -> Option<InlineRun<'s>> {
        let paragraph = self.schema.node("paragraph")?;
        let attrs = self.schema.fill_attrs("paragraph", &Attrs::new()).ok()?;
        Some(InlineRun::new(paragraph, attrs))
    }

    /// Read nodes in block context
    fn parse_blocks(&mut self, nodes: &[MarkupNode]) -> Vec<Node> {
        let Some(mut run) = self.paragraph_run() else {
            return Vec::new();
        };
        for node in nodes {
            match node {
                MarkupNode::Text(text) => {
                    if text.trim().is_empty() && !run.has_content() {
                        continue;
                    }
                    if !run.has_content() {
                        self.report.note("wrapped loose text in a paragraph");
                    }
                    run.push_text(text, &[]);
                }
                MarkupNode::Element(element) => match self.schema.resolve(element) {
                    Some(Resolved::Node {
                        node_type,
                        attrs,
                        content,
                    }) if !node_type.is_inline() => {
                        run.flush(false);
                        let blocks = self.parse_block(element, node_type, attrs, content);
                        run.blocks.extend(blocks);
                    }
                    Some(_) => self.walk_inline(&mut run, element, &[]),
                    None if self.is_block_container(element) => {
                        run.flush(false);
                        let blocks = self.parse_blocks(&element.children);
                        run.blocks.extend(blocks);
                    }
                    None => self.walk_inline(&mut run, element, &[]),
                },
            }
        }
        run.flush(false);
        run.blocks
    }

    fn is_block_container(&self, element: &Element) -> bool {
        BLOCK_TAGS.contains(&element.tag.as_str())
            || element.elements().any(|child| {
                matches!(
                    self.schema.resolve(child),
                    Some(Resolved::Node { node_type, .. }) if !node_type.is_inline()
                ) || self.is_block_container(child)
            })
    }

    /// Read an element already resolved to a block node type. Textblocks
    /// may come back as several blocks when they held block content.
    fn parse_block(
        &mut self,
        element: &Element,
        node_type: &'s NodeType,
        attrs: Attrs,
        content: ParseContent,
    ) -> Vec<Node> {
        let shell = |content: Vec<Node>| Node {
            kind: node_type.name.clone(),
            attrs: attrs.clone(),
            content,
            marks: Vec::new(),
            text: None,
        };

        match content {
            ParseContent::Ignore => {
                let node = shell(Vec::new());
                vec![self.fill_if_needed(node_type, node)]
            }
            ParseContent::Preformatted => {
                let text = element.text_content();
                let content = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Node::text(text)]
                };
                vec![shell(content)]
            }
            ParseContent::Children if node_type.is_textblock() => {
                let mut run = InlineRun::new(node_type, attrs.clone());
                for child in &element.children {
                    self.walk_inline_node(&mut run, child, &[]);
                }
                run.flush(true);
                run.blocks
            }
            ParseContent::Children => {
                let children = self.parse_blocks(&element.children);
                let children = self.fit_content(node_type, children);
                vec![shell(children)]
            }
        }
    }

    fn walk_inline_node(&mut self, run: &mut InlineRun<'s>, node: &MarkupNode, marks: &[Mark]) {
        match node {
            MarkupNode::Text(text) => run.push_text(text, marks),
            MarkupNode::Element(element) => self.walk_inline(run, element, marks),
        }
    }

    /// Read an element in inline context with the marks of its ancestors
    fn walk_inline(&mut self, run: &mut InlineRun<'s>, element: &Element, marks: &[Mark]) {
        match self.schema.resolve(element) {
            Some(Resolved::Mark { mark_type, attrs }) => {
                let marks = if run.shell.allows_mark(&mark_type.name) {
                    let mark = Mark {
                        kind: mark_type.name.clone(),
                        attrs,
                    };
                    mark.add_to_set(marks, self.schema)
                } else {
                    self.report
                        .note(format!("dropped mark '{}' in '{}'", mark_type.name, run.shell.name));
                    marks.to_vec()
                };
                for child in &element.children {
                    self.walk_inline_node(run, child, &marks);
                }
            }
            Some(Resolved::Node {
                node_type,
                attrs,
                ..
            }) if node_type.is_inline() => {
                if run.shell.content_expr().references().any(|r| node_type.satisfies(r)) {
                    run.push_inline(Node {
                        kind: node_type.name.clone(),
                        attrs,
                        content: Vec::new(),
                        marks: Vec::new(),
                        text: None,
                    });
                } else {
                    self.report
                        .note(format!("dropped '{}' in '{}'", node_type.name, run.shell.name));
                }
            }
            Some(Resolved::Node {
                node_type,
                attrs,
                content,
            }) => {
                self.report
                    .note(format!("lifted '{}' out of inline content", node_type.name));
                let blocks = self.parse_block(element, node_type, attrs, content);
                for block in blocks {
                    run.push_block(block);
                }
            }
            None => {
                for child in &element.children {
                    self.walk_inline_node(run, child, marks);
                }
            }
        }
    }

    /// Make `children` acceptable content for `parent`
    fn fit_content(&mut self, parent: &'s NodeType, children: Vec<Node>) -> Vec<Node> {
        let mut fitted = Vec::with_capacity(children.len());
        for child in children {
            self.fit_child(parent, child, &mut fitted);
        }

        let types: Vec<&NodeType> = fitted
            .iter()
            .filter_map(|n| self.schema.node(&n.kind))
            .collect();
        if !self.schema.content_matches(parent, &types) && fitted.is_empty() {
            if let Some(filler) = self.default_child(parent) {
                self.report
                    .note(format!("filled empty '{}' with '{}'", parent.name, filler.kind));
                fitted.push(filler);
            }
        }
        fitted
    }

    fn fit_child(&mut self, parent: &'s NodeType, child: Node, fitted: &mut Vec<Node>) {
        let Some(child_type) = self.schema.node(&child.kind) else {
            return;
        };
        if self.schema.can_contain(parent, child_type) {
            fitted.push(child);
            return;
        }
        if let Some(wrapped) = self.wrap_for(parent, child_type, 2) {
            self.report.note(format!(
                "wrapped '{}' to fit in '{}'",
                child_type.name, parent.name
            ));
            fitted.push(self.nest(wrapped, child));
            return;
        }
        if !child_type.is_textblock() && !child_type.is_leaf() {
            self.report
                .note(format!("unwrapped '{}' inside '{}'", child_type.name, parent.name));
            for grandchild in child.content {
                self.fit_child(parent, grandchild, fitted);
            }
            return;
        }
        self.report
            .note(format!("dropped '{}' inside '{}'", child_type.name, parent.name));
    }

    /// Candidate wrapper types for `parent`, in the order its content
    /// expression names them
    fn wrapper_candidates(&self, parent: &NodeType) -> Vec<&'s NodeType> {
        let mut candidates: Vec<&'s NodeType> = Vec::new();
        for name in parent.content_expr().references() {
            for node_type in self.schema.nodes() {
                if node_type.satisfies(name)
                    && !node_type.is_text()
                    && !node_type.is_leaf()
                    && !candidates.iter().any(|c| c.name == node_type.name)
                {
                    candidates.push(node_type);
                }
            }
        }
        candidates
    }

    /// Chain of wrapper types (outermost first) that lets `parent` hold `child`
    fn wrap_for(&self, parent: &NodeType, child: &NodeType, depth: usize) -> Option<Vec<&'s NodeType>> {
        for wrapper in self.wrapper_candidates(parent) {
            if wrapper.name == child.name {
                continue;
            }
            if self.schema.can_contain(wrapper, child) {
                return Some(vec![wrapper]);
            }
            if depth > 1 {
                if let Some(mut inner) = self.wrap_for(wrapper, child, depth - 1) {
                    inner.insert(0, wrapper);
                    return Some(inner);
                }
            }
        }
        None
    }

    /// The smallest valid node `parent` can hold
    fn default_child(&self, parent: &NodeType) -> Option<Node> {
        let name = parent.content_expr().references().next()?;
        let child_type = self
            .wrapper_candidates(parent)
            .into_iter()
            .find(|t| t.satisfies(name))?;
        self.default_node(child_type, 4)
    }

    fn default_node(&self, node_type: &NodeType, depth: usize) -> Option<Node> {
        let attrs = self.schema.fill_attrs(&node_type.name, &Attrs::new()).ok()?;
        let needs_child = !node_type.is_textblock()
            && !node_type.is_leaf()
            && !self.schema.content_matches(node_type, &[]);
        let content = if needs_child {
            if depth == 0 {
                return None;
            }
            let name = node_type.content_expr().references().next()?;
            let child_type = self
                .wrapper_candidates(node_type)
                .into_iter()
                .find(|t| t.satisfies(name))?;
            vec![self.default_node(child_type, depth - 1)?]
        } else {
            Vec::new()
        };
        Some(Node {
            kind: node_type.name.clone(),
            attrs,
            content,
            marks: Vec::new(),
            text: None,
        })
    }

    fn nest(&self, wrappers: Vec<&NodeType>, child: Node) -> Node {
        wrappers.into_iter().rev().fold(child, |inner, wrapper| Node {
            kind: wrapper.name.clone(),
            attrs: self
                .schema
                .fill_attrs(&wrapper.name, &Attrs::new())
                .unwrap_or_default(),
            content: vec![inner],
            marks: Vec::new(),
            text: None,
        })
    }

    /// Atom nodes read with `Ignore` that still require content get defaults
    fn fill_if_needed(&mut self, node_type: &'s NodeType, node: Node) -> Node {
        if node_type.is_leaf() || self.schema.content_matches(node_type, &[]) {
            return node;
        }
        let content = self.fit_content(node_type, Vec::new());
        Node { content, ..node }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecnn_schema::article_schema;

    fn read(markup: &str) -> (Document, ParseReport) {
        deserialize_with_report(Arc::new(article_schema().unwrap()), markup)
    }

    fn kinds(node: &Node) -> Vec<&str> {
        node.content.iter().map(|n| n.kind.as_str()).collect()
    }

    #[test]
    fn test_reads_basic_blocks() {
        let (doc, report) = read("<h2>Title</h2><p>Some <strong>bold</strong> text</p>");
        assert!(report.is_clean(), "{:?}", report);
        assert_eq!(kinds(doc.root()), vec!["heading", "paragraph"]);
        assert_eq!(doc.text_content(), "Title\nSome bold text");
    }

    #[test]
    fn test_loose_text_becomes_paragraph() {
        let (doc, report) = read("just text<p>after</p>");
        assert_eq!(kinds(doc.root()), vec!["paragraph", "paragraph"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_unknown_elements_are_transparent() {
        let (doc, _) = read("<section><font>hello</font> <blink>world</blink></section>");
        assert_eq!(kinds(doc.root()), vec!["paragraph"]);
        assert_eq!(doc.text_content(), "hello world");
    }

    #[test]
    fn test_formatting_whitespace_collapses() {
        let (doc, _) = read("<p>\n  first\n  second\n</p>");
        assert_eq!(doc.text_content(), "first second");
    }

    #[test]
    fn test_paragraph_in_list_gets_list_item() {
        let (doc, report) = read("<ul><p>loose</p><li><p>fine</p></li></ul>");
        let list = &doc.root().content[0];
        assert_eq!(kinds(list), vec!["list_item", "list_item"]);
        assert!(report.repairs.iter().any(|r| r.contains("wrapped 'paragraph'")));
    }

    #[test]
    fn test_text_in_table_row_gets_cell() {
        let (doc, _) = read("<table><tr><p>x</p></tr></table>");
        let row = &doc.root().content[0].content[0];
        assert_eq!(row.kind, "table_row");
        assert_eq!(kinds(row), vec!["table_cell"]);
    }

    #[test]
    fn test_empty_containers_are_filled() {
        let (doc, _) = read("<blockquote></blockquote><ul></ul>");
        assert_eq!(kinds(&doc.root().content[0]), vec!["paragraph"]);
        assert_eq!(kinds(&doc.root().content[1]), vec!["list_item"]);
        assert_eq!(kinds(&doc.root().content[1].content[0]), vec!["paragraph"]);
    }

    #[test]
    fn test_image_inside_paragraph_is_lifted() {
        let (doc, _) = read("<p>before<img src=\"/a.png\">after</p>");
        assert_eq!(kinds(doc.root()), vec!["paragraph", "image", "paragraph"]);
    }

    #[test]
    fn test_empty_input_is_empty_document() {
        let (doc, _) = read("");
        assert!(doc.is_empty());
        let (doc, _) = read("<!-- only a comment --><script>alert(1)</script>");
        assert!(doc.is_empty());
    }

    #[test]
    fn test_marks_not_allowed_in_code_are_dropped() {
        let (doc, _) = read("<pre><code>let <b>x</b> = 1;</code></pre>");
        let code = &doc.root().content[0];
        assert_eq!(code.kind, "code_block");
        assert_eq!(code.content, vec![Node::text("let x = 1;")]);
    }
}
