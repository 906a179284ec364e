//! Block insertion: rules, images and embeds

use super::{child_path, finish_at};
use crate::errors::{CommandError, EmbedKind};
use crate::state::EditorState;
use ecnn_model::{Document, Node, Position, Step, Transaction, Transform};
use ecnn_schema::{attrs, AttrValue, Attrs, Schema, SocialPost, VideoEmbed};

/// Insert a block node at `pos`.
///
/// Inside a textblock the node goes after the block, in the innermost
/// ancestor that accepts it; an empty paragraph is replaced instead. At a
/// gap between blocks it goes into the gap. A leaf that ends up last in
/// its parent gets an empty paragraph after it so the caret has somewhere
/// to go. Returns the transform and the path of the inserted node.
pub fn insert_block_at(doc: &Document, pos: &Position, node: Node) -> Result<(Transform, Vec<usize>), CommandError> {
    let schema = doc.schema().clone();
    let ty = schema
        .node(&node.kind)
        .ok_or_else(|| CommandError::unapplicable(format!("schema has no '{}'", node.kind)))?;
    let resolved = doc
        .resolve(pos)
        .ok_or_else(|| CommandError::unapplicable("position is outside the document"))?;

    let gap_accepts = !resolved.is_textblock()
        && resolved
            .parent_type()
            .is_some_and(|parent| schema.can_contain(parent, ty));
    let (parent, index, replace) = if gap_accepts {
        (pos.path.clone(), pos.offset, false)
    } else {
        let depth = (0..resolved.depth())
            .rev()
            .find(|&depth| {
                schema
                    .node(&resolved.node(depth).kind)
                    .is_some_and(|ancestor| schema.can_contain(ancestor, ty))
            })
            .ok_or_else(|| CommandError::unapplicable(format!("'{}' cannot go here", ty.name)))?;
        let child = resolved.node(depth + 1);
        let empty_paragraph =
            depth + 1 == resolved.depth() && child.kind == "paragraph" && child.content.is_empty();
        let index = pos.path[depth];
        if empty_paragraph {
            (resolved.path_at(depth).to_vec(), index, true)
        } else {
            (resolved.path_at(depth).to_vec(), index + 1, false)
        }
    };

    let mut transform = Transform::new(doc);
    if replace {
        transform.step(Step::Delete {
            parent: parent.clone(),
            from: index,
            to: index + 1,
        })?;
    }
    transform.step(Step::Insert {
        parent: parent.clone(),
        offset: index,
        content: vec![node],
    })?;

    let siblings = transform.doc().node_at(&parent).map_or(0, |p| p.content.len());
    if ty.is_leaf() && index + 1 == siblings {
        let paragraph = Node::new(&schema, "paragraph", Attrs::new(), Vec::new())?;
        transform.step(Step::Insert {
            parent: parent.clone(),
            offset: index + 1,
            content: vec![paragraph],
        })?;
    }
    Ok((transform, child_path(&parent, index)))
}

/// Insert at the head and put the caret in the next textblock
fn insert_block(state: &EditorState, node: Node) -> Result<Transaction, CommandError> {
    let (transform, path) = insert_block_at(&state.doc, &state.selection.head, node)?;
    let (&index, parent) = path
        .split_last()
        .ok_or_else(|| CommandError::unapplicable("cannot replace the document"))?;
    finish_at(transform, Position::new(parent.to_vec(), index + 1))
}

pub fn new_image(schema: &Schema, src: &str, alt: Option<&str>, title: Option<&str>) -> Result<Node, CommandError> {
    let src = src.trim();
    if src.is_empty() {
        return Err(CommandError::unapplicable("image needs a source"));
    }
    let node = Node::new(
        schema,
        "image",
        attrs([
            ("src", AttrValue::from(src)),
            ("alt", AttrValue::from(alt)),
            ("title", AttrValue::from(title)),
        ]),
        Vec::new(),
    )?;
    Ok(node)
}

pub(super) fn insert_horizontal_rule(state: &EditorState) -> Result<Transaction, CommandError> {
    let rule = Node::new(state.schema(), "horizontal_rule", Attrs::new(), Vec::new())?;
    insert_block(state, rule)
}

pub(super) fn insert_image(
    state: &EditorState,
    src: &str,
    alt: Option<&str>,
    title: Option<&str>,
) -> Result<Transaction, CommandError> {
    insert_block(state, new_image(state.schema(), src, alt, title)?)
}

pub(super) fn insert_video(state: &EditorState, url: &str) -> Result<Transaction, CommandError> {
    let video = VideoEmbed::parse(url).ok_or_else(|| CommandError::InvalidEmbedUrl {
        kind: EmbedKind::Video,
        url: url.to_string(),
    })?;
    let node = Node::new(
        state.schema(),
        "video_embed",
        attrs([("src", video.embed_src())]),
        Vec::new(),
    )?;
    insert_block(state, node)
}

pub(super) fn insert_social_post(state: &EditorState, url: &str) -> Result<Transaction, CommandError> {
    let post = SocialPost::parse(url).ok_or_else(|| CommandError::InvalidEmbedUrl {
        kind: EmbedKind::SocialPost,
        url: url.to_string(),
    })?;
    let node = Node::new(state.schema(), "social_embed", attrs([("url", post.url)]), Vec::new())?;
    insert_block(state, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecnn_model::Selection;
    use ecnn_schema::article_schema;
    use std::sync::Arc;

    fn state(json: &str, head: Position) -> EditorState {
        let schema = Arc::new(article_schema().unwrap());
        let mut state = EditorState::new(Document::from_json(schema, json).unwrap());
        state.selection = Selection::caret(head);
        state
    }

    fn kinds(state: &EditorState) -> Vec<String> {
        state.doc.root().content.iter().map(|n| n.kind.clone()).collect()
    }

    const TEXT: &str = r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"intro"}]}]}"#;

    #[test]
    fn test_rule_goes_after_block_with_trailing_paragraph() {
        let s = state(TEXT, Position::new(vec![0], 2));
        let next = s.apply(&insert_horizontal_rule(&s).unwrap()).unwrap().0;
        assert_eq!(kinds(&next), vec!["paragraph", "horizontal_rule", "paragraph"]);
        assert_eq!(next.selection.head, Position::new(vec![2], 0));
    }

    #[test]
    fn test_image_replaces_empty_paragraph() {
        let s = state(
            r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"a"}]},{"type":"paragraph"},{"type":"paragraph","content":[{"type":"text","text":"b"}]}]}"#,
            Position::new(vec![1], 0),
        );
        let next = s.apply(&insert_image(&s, " /a.png ", Some("A"), None).unwrap()).unwrap().0;
        assert_eq!(kinds(&next), vec!["paragraph", "image", "paragraph"]);
        let image = next.doc.node_at(&[1]).unwrap();
        assert_eq!(image.attrs.get("src").and_then(AttrValue::as_str), Some("/a.png"));
        assert_eq!(next.selection.head, Position::new(vec![2], 0));
        assert!(insert_image(&s, "  ", None, None).is_err());
    }

    #[test]
    fn test_video_accepts_short_links_only() {
        let s = state(TEXT, Position::new(vec![0], 0));
        let next = s
            .apply(&insert_video(&s, "https://youtu.be/dQw4w9WgXcQ").unwrap())
            .unwrap()
            .0;
        let video = next.doc.node_at(&[1]).unwrap();
        assert_eq!(video.kind, "video_embed");
        assert_eq!(
            video.attrs.get("src").and_then(AttrValue::as_str),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
        assert_eq!(video.attrs.get("width").and_then(AttrValue::as_str), Some("560"));

        let err = insert_video(&s, "https://vimeo.com/12345").unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidEmbedUrl {
                kind: EmbedKind::Video,
                ..
            }
        ));
    }

    #[test]
    fn test_social_post_keeps_literal_url() {
        let s = state(TEXT, Position::new(vec![0], 0));
        let url = "https://x.com/someone/status/1234567890";
        let next = s.apply(&insert_social_post(&s, url).unwrap()).unwrap().0;
        let post = next.doc.node_at(&[1]).unwrap();
        assert_eq!(post.attrs.get("url").and_then(AttrValue::as_str), Some(url));
        assert!(insert_social_post(&s, "https://example.com/post/1").is_err());
    }

    #[test]
    fn test_image_inside_list_item_stays_in_item() {
        let s = state(
            r#"{"type":"doc","content":[{"type":"bullet_list","content":[
                {"type":"list_item","content":[{"type":"paragraph","content":[{"type":"text","text":"x"}]}]}
            ]}]}"#,
            Position::new(vec![0, 0, 0], 1),
        );
        let (transform, path) = insert_block_at(
            &s.doc,
            &s.selection.head,
            new_image(s.schema(), "/i.png", None, None).unwrap(),
        )
        .unwrap();
        assert_eq!(path, vec![0, 0, 1]);
        let item = transform.doc().node_at(&[0, 0]).unwrap();
        let kinds: Vec<&str> = item.content.iter().map(|n| n.kind.as_str()).collect();
        assert_eq!(kinds, vec!["paragraph", "image", "paragraph"]);
    }
}
