//! Node and mark type records

use crate::attrs::{AttrSpec, Attrs};
use crate::content::ContentExpr;
use crate::context::RenderContext;
use crate::dom_spec::DomSpec;
use crate::parse_rule::ParseRule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Render rule: attributes and context to a markup fragment
pub type RenderFn = fn(&Attrs, &RenderContext) -> DomSpec;

fn render_hole(_: &Attrs, _: &RenderContext) -> DomSpec {
    DomSpec::Hole
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// Block-level container or textblock
    Block,
    /// Inline content: text and inline leaves
    Inline,
    /// Block-level leaf rendered wholly from attributes
    Atomic,
}

/// Which marks the inline content of a node may carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkAllowance {
    All,
    None,
    Only(Vec<String>),
}

impl MarkAllowance {
    pub fn allows(&self, mark: &str) -> bool {
        match self {
            MarkAllowance::All => true,
            MarkAllowance::None => false,
            MarkAllowance::Only(marks) => marks.iter().any(|m| m == mark),
        }
    }
}

#[derive(Clone)]
pub struct NodeType {
    pub name: String,
    pub category: NodeCategory,
    pub groups: Vec<String>,
    pub content_source: String,
    pub attrs: Vec<(String, AttrSpec)>,
    pub marks: MarkAllowance,
    pub splittable: bool,
    /// Inline content is preformatted code
    pub code: bool,
    pub parse_rules: Vec<ParseRule>,
    pub render: RenderFn,
    pub(crate) content: ContentExpr,
    pub(crate) inline_content: bool,
}

impl NodeType {
    pub fn new(name: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            name: name.into(),
            category,
            groups: Vec::new(),
            content_source: String::new(),
            attrs: Vec::new(),
            marks: MarkAllowance::All,
            splittable: false,
            code: false,
            parse_rules: Vec::new(),
            render: render_hole,
            content: ContentExpr::empty(),
            inline_content: false,
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.groups.push(group.to_string());
        self
    }

    /// Content expression, compiled when the type is registered
    pub fn content(mut self, expr: &str) -> Self {
        self.content_source = expr.to_string();
        self
    }

    pub fn attr(mut self, name: &str, spec: AttrSpec) -> Self {
        self.attrs.push((name.to_string(), spec));
        self
    }

    pub fn marks(mut self, marks: MarkAllowance) -> Self {
        self.marks = marks;
        self
    }

    pub fn splittable(mut self) -> Self {
        self.splittable = true;
        self
    }

    pub fn code(mut self) -> Self {
        self.code = true;
        self
    }

    pub fn parse(mut self, rule: ParseRule) -> Self {
        self.parse_rules.push(rule);
        self
    }

    pub fn render(mut self, render: RenderFn) -> Self {
        self.render = render;
        self
    }

    pub fn content_expr(&self) -> &ContentExpr {
        &self.content
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Whether a content expression name refers to this type
    pub fn satisfies(&self, name: &str) -> bool {
        self.name == name || self.in_group(name)
    }

    pub fn is_text(&self) -> bool {
        self.name == "text"
    }

    pub fn is_inline(&self) -> bool {
        self.category == NodeCategory::Inline
    }

    pub fn is_atom(&self) -> bool {
        self.category == NodeCategory::Atomic
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }

    /// A block whose content is inline
    pub fn is_textblock(&self) -> bool {
        self.category == NodeCategory::Block && self.inline_content
    }

    /// Leaves: atoms and inline nodes other than text
    pub fn is_leaf(&self) -> bool {
        self.content.is_empty() && !self.is_text()
    }

    pub fn attr_spec(&self, name: &str) -> Option<&AttrSpec> {
        self.attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, spec)| spec)
    }

    pub fn allows_mark(&self, mark: &str) -> bool {
        self.inline_content && self.marks.allows(mark)
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeType")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("groups", &self.groups)
            .field("content", &self.content_source)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct MarkType {
    pub name: String,
    pub attrs: Vec<(String, AttrSpec)>,
    /// Whether text typed at the end of the mark inherits it
    pub inclusive: bool,
    pub parse_rules: Vec<ParseRule>,
    pub render: RenderFn,
    pub(crate) rank: usize,
}

impl MarkType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            inclusive: true,
            parse_rules: Vec::new(),
            render: render_hole,
            rank: 0,
        }
    }

    pub fn attr(mut self, name: &str, spec: AttrSpec) -> Self {
        self.attrs.push((name.to_string(), spec));
        self
    }

    pub fn exclusive_end(mut self) -> Self {
        self.inclusive = false;
        self
    }

    pub fn parse(mut self, rule: ParseRule) -> Self {
        self.parse_rules.push(rule);
        self
    }

    pub fn render(mut self, render: RenderFn) -> Self {
        self.render = render;
        self
    }

    /// Registration order; marks on a text leaf are kept sorted by rank
    pub fn rank(&self) -> usize {
        self.rank
    }
}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkType")
            .field("name", &self.name)
            .field("rank", &self.rank)
            .finish_non_exhaustive()
    }
}
