//! # Steps
//!
//! The primitive edits a transaction is made of. Each step checks its
//! structural precondition before touching the tree and reports its
//! inverse and position map once applied.

use crate::error::StepError;
use crate::mapping::StepMap;
use crate::node::{
    inline_width, map_inline_range, normalize_inline, slice_inline, split_inline, Mark, Node,
    NodeSpec,
};
use ecnn_schema::{AttrError, AttrValue, Attrs, NodeType, Schema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stepType", rename_all = "camelCase")]
pub enum Step {
    /// Insert nodes at `offset` of the node at `parent`
    Insert {
        parent: Vec<usize>,
        offset: usize,
        content: Vec<Node>,
    },
    /// Remove the range `from..to` of the node at `parent`
    Delete {
        parent: Vec<usize>,
        from: usize,
        to: usize,
    },
    SetAttr {
        path: Vec<usize>,
        name: String,
        value: AttrValue,
    },
    SetType {
        path: Vec<usize>,
        node_type: String,
        attrs: Attrs,
    },
    /// Cut the node at `path` in two at `offset`. The second half takes
    /// `new_type` when given, the original type otherwise.
    Split {
        path: Vec<usize>,
        offset: usize,
        new_type: Option<NodeSpec>,
    },
    /// Merge the node at `path` into its previous sibling
    Join { path: Vec<usize> },
    /// Move children `from..to` of `parent` into a new `wrapper` node
    Wrap {
        parent: Vec<usize>,
        from: usize,
        to: usize,
        wrapper: NodeSpec,
    },
    /// Replace the node at `path` with its children
    Unwrap { path: Vec<usize> },
    AddMark {
        path: Vec<usize>,
        from: usize,
        to: usize,
        mark: Mark,
    },
    RemoveMark {
        path: Vec<usize>,
        from: usize,
        to: usize,
        mark: Mark,
    },
}

/// What applying a step produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub inverse: Step,
    pub map: StepMap,
}

fn outcome(inverse: Step, map: StepMap) -> Result<StepOutcome, StepError> {
    Ok(StepOutcome { inverse, map })
}

fn node_type<'s>(schema: &'s Schema, kind: &str) -> Result<&'s NodeType, StepError> {
    schema
        .node(kind)
        .ok_or_else(|| StepError::UnknownNodeType(kind.to_string()))
}

fn target<'a>(root: &'a mut Node, path: &[usize]) -> Result<&'a mut Node, StepError> {
    root.node_at_mut(path)
        .ok_or_else(|| StepError::NoSuchNode(path.to_vec()))
}

/// Characters for textblocks, children otherwise
pub fn content_width(node: &Node, ty: &NodeType) -> usize {
    if ty.is_textblock() {
        inline_width(&node.content)
    } else {
        node.content.len()
    }
}

fn check_range(path: &[usize], from: usize, to: usize, width: usize) -> Result<(), StepError> {
    if from > to {
        return Err(StepError::EmptyRange { from, to });
    }
    if to > width {
        return Err(StepError::OutOfRange {
            path: path.to_vec(),
            offset: to,
            width,
        });
    }
    Ok(())
}

fn child_path(parent: &[usize], index: usize) -> Vec<usize> {
    let mut path = parent.to_vec();
    path.push(index);
    path
}

/// Resolve a mark against the schema and check it may go into `ty`
fn effective_mark(schema: &Schema, ty: &NodeType, mark: &Mark) -> Result<Mark, StepError> {
    if schema.mark(&mark.kind).is_none() {
        return Err(StepError::UnknownMarkType(mark.kind.clone()));
    }
    if !ty.allows_mark(&mark.kind) {
        return Err(StepError::MarkNotAllowed {
            mark: mark.kind.clone(),
            node: ty.name.clone(),
        });
    }
    let attrs = schema.fill_mark_attrs(&mark.kind, &mark.attrs)?;
    Ok(Mark {
        kind: mark.kind.clone(),
        attrs,
    })
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Insert { .. } => "insert",
            Step::Delete { .. } => "delete",
            Step::SetAttr { .. } => "setAttr",
            Step::SetType { .. } => "setType",
            Step::Split { .. } => "split",
            Step::Join { .. } => "join",
            Step::Wrap { .. } => "wrap",
            Step::Unwrap { .. } => "unwrap",
            Step::AddMark { .. } => "addMark",
            Step::RemoveMark { .. } => "removeMark",
        }
    }

    /// Apply to a tree in place. On error the tree is left untouched.
    pub fn apply(&self, root: &mut Node, schema: &Schema) -> Result<StepOutcome, StepError> {
        match self {
            Step::Insert {
                parent,
                offset,
                content,
            } => {
                let node = target(root, parent)?;
                let ty = node_type(schema, &node.kind)?;
                if node.is_text() || ty.is_leaf() {
                    return Err(StepError::NoSuchNode(child_path(parent, *offset)));
                }
                check_range(parent, *offset, *offset, content_width(node, ty))?;

                let width = if ty.is_textblock() {
                    let (mut left, right) = split_inline(std::mem::take(&mut node.content), *offset);
                    left.extend(content.iter().cloned());
                    left.extend(right);
                    node.content = normalize_inline(left);
                    inline_width(content)
                } else {
                    node.content.splice(*offset..*offset, content.iter().cloned());
                    content.len()
                };

                outcome(
                    Step::Delete {
                        parent: parent.clone(),
                        from: *offset,
                        to: *offset + width,
                    },
                    StepMap::Insert {
                        parent: parent.clone(),
                        offset: *offset,
                        width,
                    },
                )
            }

            Step::Delete { parent, from, to } => {
                let node = target(root, parent)?;
                let ty = node_type(schema, &node.kind)?;
                check_range(parent, *from, *to, content_width(node, ty))?;

                let removed = if ty.is_textblock() {
                    let (mut left, rest) = split_inline(std::mem::take(&mut node.content), *from);
                    let (removed, right) = split_inline(rest, to - from);
                    left.extend(right);
                    node.content = normalize_inline(left);
                    removed
                } else {
                    node.content.drain(*from..*to).collect()
                };

                outcome(
                    Step::Insert {
                        parent: parent.clone(),
                        offset: *from,
                        content: removed,
                    },
                    StepMap::Delete {
                        parent: parent.clone(),
                        from: *from,
                        to: *to,
                    },
                )
            }

            Step::SetAttr { path, name, value } => {
                let node = target(root, path)?;
                let ty = node_type(schema, &node.kind)?;
                let spec = ty.attr_spec(name).ok_or_else(|| AttrError::NotAllowed {
                    owner: ty.name.clone(),
                    attr: name.clone(),
                    value: value.to_string(),
                })?;
                spec.check(&ty.name, name, value)?;
                let previous = node
                    .attrs
                    .insert(name.clone(), value.clone())
                    .unwrap_or(AttrValue::Null);
                outcome(
                    Step::SetAttr {
                        path: path.clone(),
                        name: name.clone(),
                        value: previous,
                    },
                    StepMap::Identity,
                )
            }

            Step::SetType {
                path,
                node_type: kind,
                attrs,
            } => {
                let new_type = node_type(schema, kind)?;
                let node = target(root, path)?;
                if path.is_empty() || node.is_text() || new_type.is_text() {
                    return Err(StepError::UnknownNodeType(kind.clone()));
                }
                let filled = schema.fill_attrs(kind, attrs)?;
                let previous = NodeSpec::of(node);
                node.kind = kind.clone();
                node.attrs = filled;
                outcome(
                    Step::SetType {
                        path: path.clone(),
                        node_type: previous.kind,
                        attrs: previous.attrs,
                    },
                    StepMap::Identity,
                )
            }

            Step::Split {
                path,
                offset,
                new_type,
            } => {
                let (&index, parent_path) = path
                    .split_last()
                    .ok_or_else(|| StepError::NotSplittable("doc".to_string()))?;
                let parent = target(root, parent_path)?;
                let node = parent
                    .content
                    .get(index)
                    .ok_or_else(|| StepError::NoSuchNode(path.clone()))?;
                let ty = node_type(schema, &node.kind)?;
                if !ty.splittable {
                    return Err(StepError::NotSplittable(ty.name.clone()));
                }
                check_range(path, *offset, *offset, content_width(node, ty))?;
                let right_shell = match new_type {
                    Some(spec) => Node::from_spec(schema, spec, Vec::new())?,
                    None => Node {
                        content: Vec::new(),
                        ..node.clone()
                    },
                };

                let mut left = parent.content.remove(index);
                let right_content = if ty.is_textblock() {
                    let (head, tail) = split_inline(std::mem::take(&mut left.content), *offset);
                    left.content = head;
                    tail
                } else {
                    left.content.split_off(*offset)
                };
                let right = Node {
                    content: right_content,
                    ..right_shell
                };
                parent.content.insert(index, left);
                parent.content.insert(index + 1, right);

                outcome(
                    Step::Join {
                        path: child_path(parent_path, index + 1),
                    },
                    StepMap::Split {
                        path: path.clone(),
                        offset: *offset,
                    },
                )
            }

            Step::Join { path } => {
                let not_joinable = || StepError::NotJoinable(path.clone());
                let (&index, parent_path) = path.split_last().ok_or_else(not_joinable)?;
                if index == 0 {
                    return Err(not_joinable());
                }
                let parent = target(root, parent_path)?;
                let (Some(left), Some(right)) =
                    (parent.content.get(index - 1), parent.content.get(index))
                else {
                    return Err(StepError::NoSuchNode(path.clone()));
                };
                let left_type = node_type(schema, &left.kind)?;
                let right_type = node_type(schema, &right.kind)?;
                let textblocks = left_type.is_textblock() && right_type.is_textblock();
                let containers = !left_type.is_textblock()
                    && !right_type.is_textblock()
                    && !left_type.is_leaf()
                    && !right_type.is_leaf()
                    && !left.is_text()
                    && !right.is_text();
                if !left_type.splittable || !(textblocks || containers) {
                    return Err(not_joinable());
                }

                let left_width = content_width(left, left_type);
                let right = parent.content.remove(index);
                let right_spec = NodeSpec::of(&right);
                let left = &mut parent.content[index - 1];
                if textblocks {
                    let mut merged = std::mem::take(&mut left.content);
                    merged.extend(right.content);
                    left.content = normalize_inline(merged);
                } else {
                    left.content.extend(right.content);
                }

                outcome(
                    Step::Split {
                        path: child_path(parent_path, index - 1),
                        offset: left_width,
                        new_type: Some(right_spec),
                    },
                    StepMap::Join {
                        path: path.clone(),
                        left_width,
                    },
                )
            }

            Step::Wrap {
                parent,
                from,
                to,
                wrapper,
            } => {
                let node = target(root, parent)?;
                let ty = node_type(schema, &node.kind)?;
                if ty.is_textblock() || node.is_text() {
                    return Err(StepError::NotUnwrappable(parent.clone()));
                }
                check_range(parent, *from, *to, node.content.len())?;
                let mut shell = Node::from_spec(schema, wrapper, Vec::new())?;
                shell.content = node.content.drain(*from..*to).collect();
                node.content.insert(*from, shell);

                outcome(
                    Step::Unwrap {
                        path: child_path(parent, *from),
                    },
                    StepMap::Wrap {
                        parent: parent.clone(),
                        from: *from,
                        to: *to,
                    },
                )
            }

            Step::Unwrap { path } => {
                let (&index, parent_path) = path
                    .split_last()
                    .ok_or_else(|| StepError::NotUnwrappable(path.clone()))?;
                let parent = target(root, parent_path)?;
                let node = parent
                    .content
                    .get(index)
                    .ok_or_else(|| StepError::NoSuchNode(path.clone()))?;
                let ty = node_type(schema, &node.kind)?;
                if node.is_text() || ty.is_textblock() || ty.is_leaf() {
                    return Err(StepError::NotUnwrappable(path.clone()));
                }

                let node = parent.content.remove(index);
                let spec = NodeSpec::of(&node);
                let count = node.content.len();
                parent.content.splice(index..index, node.content);

                outcome(
                    Step::Wrap {
                        parent: parent_path.to_vec(),
                        from: index,
                        to: index + count,
                        wrapper: spec,
                    },
                    StepMap::Unwrap {
                        path: path.clone(),
                        count,
                    },
                )
            }

            Step::AddMark {
                path,
                from,
                to,
                mark,
            } => {
                let node = target(root, path)?;
                let ty = node_type(schema, &node.kind)?;
                if !ty.is_textblock() {
                    return Err(StepError::NotTextblock(path.clone()));
                }
                check_range(path, *from, *to, inline_width(&node.content))?;
                let mark = effective_mark(schema, ty, mark)?;

                let slice = slice_inline(&node.content, *from, *to);
                let mut texts = slice.iter().filter(|n| n.is_text()).peekable();
                if texts.peek().is_none() {
                    return Err(StepError::EmptyRange { from: *from, to: *to });
                }
                if texts.any(|n| Mark::type_in_set(&mark.kind, &n.marks).is_some()) {
                    return Err(StepError::MarkPresent(mark.kind.clone()));
                }

                node.content = map_inline_range(std::mem::take(&mut node.content), *from, *to, |leaf| {
                    if leaf.is_text() {
                        leaf.marks = mark.add_to_set(&leaf.marks, schema);
                    }
                });

                outcome(
                    Step::RemoveMark {
                        path: path.clone(),
                        from: *from,
                        to: *to,
                        mark,
                    },
                    StepMap::Identity,
                )
            }

            Step::RemoveMark {
                path,
                from,
                to,
                mark,
            } => {
                let node = target(root, path)?;
                let ty = node_type(schema, &node.kind)?;
                if !ty.is_textblock() {
                    return Err(StepError::NotTextblock(path.clone()));
                }
                check_range(path, *from, *to, inline_width(&node.content))?;
                let mark = effective_mark(schema, ty, mark)?;

                let slice = slice_inline(&node.content, *from, *to);
                let mut texts = slice.iter().filter(|n| n.is_text()).peekable();
                if texts.peek().is_none() {
                    return Err(StepError::EmptyRange { from: *from, to: *to });
                }
                if !texts.all(|n| n.has_mark(&mark)) {
                    return Err(StepError::MarkAbsent(mark.kind.clone()));
                }

                node.content = map_inline_range(std::mem::take(&mut node.content), *from, *to, |leaf| {
                    if leaf.is_text() {
                        leaf.marks = mark.remove_from_set(&leaf.marks);
                    }
                });

                outcome(
                    Step::AddMark {
                        path: path.clone(),
                        from: *from,
                        to: *to,
                        mark,
                    },
                    StepMap::Identity,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecnn_schema::{article_schema, attrs};

    fn paragraph(schema: &Schema, content: Vec<Node>) -> Node {
        Node::new(schema, "paragraph", Attrs::new(), content).unwrap()
    }

    fn doc(schema: &Schema, blocks: Vec<Node>) -> Node {
        Node::new(schema, "doc", Attrs::new(), blocks).unwrap()
    }

    fn roundtrip(schema: &Schema, root: &Node, step: Step) -> Node {
        let mut working = root.clone();
        let outcome = step.apply(&mut working, schema).unwrap();
        let mut restored = working.clone();
        outcome.inverse.apply(&mut restored, schema).unwrap();
        assert_eq!(&restored, root, "inverse of {:?}", step);
        working
    }

    #[test]
    fn test_insert_text_merges() {
        let schema = article_schema().unwrap();
        let root = doc(&schema, vec![paragraph(&schema, vec![Node::text("helo")])]);
        let after = roundtrip(
            &schema,
            &root,
            Step::Insert {
                parent: vec![0],
                offset: 3,
                content: vec![Node::text("l")],
            },
        );
        assert_eq!(after.content[0].content, vec![Node::text("hello")]);
    }

    #[test]
    fn test_split_and_join() {
        let schema = article_schema().unwrap();
        let root = doc(&schema, vec![paragraph(&schema, vec![Node::text("hello world")])]);
        let after = roundtrip(
            &schema,
            &root,
            Step::Split {
                path: vec![0],
                offset: 5,
                new_type: None,
            },
        );
        assert_eq!(after.content.len(), 2);
        assert_eq!(after.content[1].content, vec![Node::text(" world")]);
    }

    #[test]
    fn test_split_with_new_type_roundtrips() {
        let schema = article_schema().unwrap();
        let heading = Node::new(&schema, "heading", attrs([("level", 2i64)]), vec![Node::text("Title")]).unwrap();
        let root = doc(&schema, vec![heading]);
        let after = roundtrip(
            &schema,
            &root,
            Step::Split {
                path: vec![0],
                offset: 5,
                new_type: Some(NodeSpec::new("paragraph", Attrs::new())),
            },
        );
        assert_eq!(after.content[1].kind, "paragraph");
    }

    #[test]
    fn test_marks() {
        let schema = article_schema().unwrap();
        let root = doc(&schema, vec![paragraph(&schema, vec![Node::text("hello")])]);
        let bold = Mark::plain("bold");
        let after = roundtrip(
            &schema,
            &root,
            Step::AddMark {
                path: vec![0],
                from: 1,
                to: 3,
                mark: bold.clone(),
            },
        );
        assert_eq!(after.content[0].content.len(), 3);
        assert_eq!(after.content[0].content[1].marks, vec![bold.clone()]);

        // Already present.
        let mut again = after.clone();
        let err = Step::AddMark {
            path: vec![0],
            from: 0,
            to: 5,
            mark: bold.clone(),
        }
        .apply(&mut again, &schema)
        .unwrap_err();
        assert_eq!(err, StepError::MarkPresent("bold".to_string()));
        assert_eq!(again, after);

        // Not present across the whole range.
        let err = Step::RemoveMark {
            path: vec![0],
            from: 0,
            to: 5,
            mark: bold,
        }
        .apply(&mut again, &schema)
        .unwrap_err();
        assert_eq!(err, StepError::MarkAbsent("bold".to_string()));
    }

    #[test]
    fn test_code_block_rejects_marks() {
        let schema = article_schema().unwrap();
        let code = Node::new(&schema, "code_block", Attrs::new(), vec![Node::text("x")]).unwrap();
        let mut root = doc(&schema, vec![code]);
        let err = Step::AddMark {
            path: vec![0],
            from: 0,
            to: 1,
            mark: Mark::plain("bold"),
        }
        .apply(&mut root, &schema)
        .unwrap_err();
        assert!(matches!(err, StepError::MarkNotAllowed { .. }));
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let schema = article_schema().unwrap();
        let root = doc(
            &schema,
            vec![
                paragraph(&schema, vec![Node::text("a")]),
                paragraph(&schema, vec![Node::text("b")]),
            ],
        );
        let after = roundtrip(
            &schema,
            &root,
            Step::Wrap {
                parent: vec![],
                from: 0,
                to: 2,
                wrapper: NodeSpec::new("blockquote", Attrs::new()),
            },
        );
        assert_eq!(after.content.len(), 1);
        assert_eq!(after.content[0].content.len(), 2);
    }

    #[test]
    fn test_set_attr_and_type() {
        let schema = article_schema().unwrap();
        let root = doc(&schema, vec![paragraph(&schema, vec![Node::text("a")])]);
        roundtrip(
            &schema,
            &root,
            Step::SetAttr {
                path: vec![0],
                name: "text_align".to_string(),
                value: AttrValue::from("center"),
            },
        );
        let after = roundtrip(
            &schema,
            &root,
            Step::SetType {
                path: vec![0],
                node_type: "heading".to_string(),
                attrs: attrs([("level", 3i64)]),
            },
        );
        assert_eq!(after.content[0].attrs.get("level"), Some(&AttrValue::Int(3)));
    }

    #[test]
    fn test_delete_out_of_range() {
        let schema = article_schema().unwrap();
        let mut root = doc(&schema, vec![paragraph(&schema, vec![Node::text("ab")])]);
        let err = Step::Delete {
            parent: vec![0],
            from: 1,
            to: 9,
        }
        .apply(&mut root, &schema)
        .unwrap_err();
        assert!(matches!(err, StepError::OutOfRange { width: 2, .. }));
    }
}
