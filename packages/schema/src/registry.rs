//! # Schema registry
//!
//! Node and mark types live in registration order. Parse rules from both
//! are consulted in that same order, so the first registered rule that
//! accepts an element claims it.

use crate::attrs::{fill_declared, Attrs};
use crate::content::ContentExpr;
use crate::error::{AttrError, Result, SchemaError};
use crate::node_type::{MarkType, NodeCategory, NodeType};
use crate::parse_rule::ParseContent;
use ecnn_markup::Element;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleOwner {
    Node(usize),
    Mark(usize),
}

/// The type an element resolved to, with its extracted attributes
#[derive(Debug, Clone)]
pub enum Resolved<'a> {
    Node {
        node_type: &'a NodeType,
        attrs: Attrs,
        content: ParseContent,
    },
    Mark {
        mark_type: &'a MarkType,
        attrs: Attrs,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    nodes: Vec<NodeType>,
    marks: Vec<MarkType>,
    node_index: HashMap<String, usize>,
    mark_index: HashMap<String, usize>,
    rules: Vec<(RuleOwner, usize)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type. Its content expression may only reference
    /// types or groups already registered, or the type itself.
    pub fn register_node(&mut self, mut node_type: NodeType) -> Result<()> {
        if self.node_index.contains_key(&node_type.name) {
            return Err(SchemaError::DuplicateNode(node_type.name));
        }

        let content = ContentExpr::parse(&node_type.content_source).map_err(|reason| {
            SchemaError::InvalidContent {
                node: node_type.name.clone(),
                expr: node_type.content_source.clone(),
                reason,
            }
        })?;

        let mut inline_content = !content.is_empty();
        for name in content.references() {
            let self_reference = node_type.satisfies(name);
            let members: Vec<&NodeType> = self.nodes.iter().filter(|n| n.satisfies(name)).collect();
            if members.is_empty() && !self_reference {
                return Err(SchemaError::UnknownReference {
                    node: node_type.name.clone(),
                    name: name.to_string(),
                });
            }
            if self_reference || members.iter().any(|member| !member.is_inline()) {
                inline_content = false;
            }
        }

        if let crate::node_type::MarkAllowance::Only(marks) = &node_type.marks {
            if let Some(unknown) = marks.iter().find(|m| !self.mark_index.contains_key(*m)) {
                return Err(SchemaError::UnknownMark {
                    node: node_type.name.clone(),
                    mark: unknown.clone(),
                });
            }
        }

        node_type.content = content;
        node_type.inline_content = inline_content && node_type.category == NodeCategory::Block;

        let index = self.nodes.len();
        for rule in 0..node_type.parse_rules.len() {
            self.rules.push((RuleOwner::Node(index), rule));
        }
        tracing::debug!(node = %node_type.name, "registered node type");
        self.node_index.insert(node_type.name.clone(), index);
        self.nodes.push(node_type);
        Ok(())
    }

    pub fn register_mark(&mut self, mut mark_type: MarkType) -> Result<()> {
        if self.mark_index.contains_key(&mark_type.name) {
            return Err(SchemaError::DuplicateMark(mark_type.name));
        }

        let index = self.marks.len();
        mark_type.rank = index;
        for rule in 0..mark_type.parse_rules.len() {
            self.rules.push((RuleOwner::Mark(index), rule));
        }
        tracing::debug!(mark = %mark_type.name, "registered mark type");
        self.mark_index.insert(mark_type.name.clone(), index);
        self.marks.push(mark_type);
        Ok(())
    }

    /// Confirm the types every document needs are present
    pub fn check_complete(&self) -> Result<()> {
        for required in ["doc", "text", "paragraph"] {
            if !self.node_index.contains_key(required) {
                return Err(SchemaError::MissingNode(required.to_string()));
            }
        }
        Ok(())
    }

    pub fn node(&self, name: &str) -> Option<&NodeType> {
        self.node_index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn mark(&self, name: &str) -> Option<&MarkType> {
        self.mark_index.get(name).map(|&i| &self.marks[i])
    }

    pub fn nodes(&self) -> &[NodeType] {
        &self.nodes
    }

    pub fn marks(&self) -> &[MarkType] {
        &self.marks
    }

    /// Rank of a mark type, unknown marks sort last
    pub fn mark_rank(&self, name: &str) -> usize {
        self.mark_index.get(name).copied().unwrap_or(usize::MAX)
    }

    /// First registered node type satisfying a content expression name.
    /// Used to fill required content with defaults.
    pub fn default_type(&self, name: &str) -> Option<&NodeType> {
        self.nodes
            .iter()
            .find(|n| n.satisfies(name) && !n.is_text())
            .or_else(|| self.nodes.iter().find(|n| n.satisfies(name)))
    }

    /// Whether `child` may appear anywhere in `parent`'s content
    pub fn can_contain(&self, parent: &NodeType, child: &NodeType) -> bool {
        parent
            .content
            .mentions(&child, &|child: &&NodeType, name: &str| child.satisfies(name))
    }

    /// Check a child type sequence against a node type's content expression
    pub fn content_matches(&self, parent: &NodeType, children: &[&NodeType]) -> bool {
        parent
            .content
            .matches(children, &|child: &&NodeType, name: &str| child.satisfies(name))
    }

    /// Drop undeclared attributes, fill defaults and type-check values
    pub fn fill_attrs(&self, type_name: &str, attrs: &Attrs) -> std::result::Result<Attrs, AttrError> {
        let node_type = self
            .node(type_name)
            .ok_or_else(|| AttrError::UnknownType(type_name.to_string()))?;
        fill_declared(&node_type.name, &node_type.attrs, attrs)
    }

    pub fn fill_mark_attrs(
        &self,
        mark_name: &str,
        attrs: &Attrs,
    ) -> std::result::Result<Attrs, AttrError> {
        let mark_type = self
            .mark(mark_name)
            .ok_or_else(|| AttrError::UnknownType(mark_name.to_string()))?;
        fill_declared(&mark_type.name, &mark_type.attrs, attrs)
    }

    /// Find the type claiming an element: the first rule, in registration
    /// order, whose selector matches and whose extractor accepts.
    pub fn resolve(&self, element: &Element) -> Option<Resolved<'_>> {
        self.rules.iter().find_map(|&(owner, rule)| match owner {
            RuleOwner::Node(index) => {
                let node_type = &self.nodes[index];
                let rule = &node_type.parse_rules[rule];
                let extracted = rule.apply(element)?;
                let attrs = fill_declared(&node_type.name, &node_type.attrs, &extracted).ok()?;
                Some(Resolved::Node {
                    node_type,
                    attrs,
                    content: rule.content,
                })
            }
            RuleOwner::Mark(index) => {
                let mark_type = &self.marks[index];
                let extracted = mark_type.parse_rules[rule].apply(element)?;
                let attrs = fill_declared(&mark_type.name, &mark_type.attrs, &extracted).ok()?;
                Some(Resolved::Mark { mark_type, attrs })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_rule::ParseRule;

    fn minimal() -> Schema {
        let mut schema = Schema::new();
        schema
            .register_node(NodeType::new("text", NodeCategory::Inline).group("inline"))
            .unwrap();
        schema
            .register_node(
                NodeType::new("paragraph", NodeCategory::Block)
                    .group("block")
                    .content("inline*")
                    .parse(ParseRule::tag("p")),
            )
            .unwrap();
        schema
    }

    #[test]
    fn test_duplicate_node() {
        let mut schema = minimal();
        let err = schema
            .register_node(NodeType::new("paragraph", NodeCategory::Block))
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateNode("paragraph".to_string()));
    }

    #[test]
    fn test_bad_content_expression() {
        let mut schema = minimal();
        let err = schema
            .register_node(NodeType::new("quote", NodeCategory::Block).content("(block"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidContent { .. }));
    }

    #[test]
    fn test_unknown_reference() {
        let mut schema = minimal();
        let err = schema
            .register_node(NodeType::new("list", NodeCategory::Block).content("list_item+"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownReference { name, .. } if name == "list_item"));
    }

    #[test]
    fn test_textblock_detection() {
        let schema = minimal();
        assert!(schema.node("paragraph").unwrap().is_textblock());
        assert!(!schema.node("text").unwrap().is_textblock());
    }

    #[test]
    fn test_first_match_wins() {
        let mut schema = minimal();
        schema
            .register_node(
                NodeType::new("lead", NodeCategory::Block)
                    .group("block")
                    .content("inline*")
                    .parse(ParseRule::tag("p")),
            )
            .unwrap();
        match schema.resolve(&Element::new("p")) {
            Some(Resolved::Node { node_type, .. }) => assert_eq!(node_type.name, "paragraph"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(schema.resolve(&Element::new("blink")).is_none());
    }

    #[test]
    fn test_check_complete() {
        assert_eq!(
            minimal().check_complete(),
            Err(SchemaError::MissingNode("doc".to_string()))
        );
    }
}
