//! Integration tests for transactions over article documents

use ecnn_model::{
    Document, Mark, Node, NodeSpec, Position, Selection, Step, Transaction, TransactionError,
    Transform,
};
use ecnn_schema::{article_schema, attrs, Attrs, Schema};
use std::sync::Arc;

fn schema() -> Arc<Schema> {
    Arc::new(article_schema().unwrap())
}

fn article(schema: &Arc<Schema>) -> Document {
    let json = r#"{
        "type": "doc",
        "content": [
            {"type": "heading", "attrs": {"level": 1}, "content": [{"type": "text", "text": "Title"}]},
            {"type": "paragraph", "content": [
                {"type": "text", "text": "Plain "},
                {"type": "text", "text": "bold", "marks": [{"type": "bold"}]},
                {"type": "text", "text": " tail"}
            ]},
            {"type": "bullet_list", "content": [
                {"type": "list_item", "content": [
                    {"type": "paragraph", "content": [{"type": "text", "text": "one"}]}
                ]}
            ]}
        ]
    }"#;
    Document::from_json(schema.clone(), json).unwrap()
}

#[test]
fn test_json_round_trip() {
    let schema = schema();
    let doc = article(&schema);
    let json = doc.to_json().to_string();
    let again = Document::from_json(schema, &json).unwrap();
    assert_eq!(again, doc);
}

#[test]
fn test_from_json_normalizes_adjacent_text() {
    let schema = schema();
    let json = r#"{"type":"doc","content":[{"type":"paragraph","content":[
        {"type":"text","text":"a"},{"type":"text","text":"b"}
    ]}]}"#;
    let doc = Document::from_json(schema, json).unwrap();
    assert_eq!(doc.node_at(&[0]).unwrap().content, vec![Node::text("ab")]);
}

#[test]
fn test_from_json_rejects_unknown_types() {
    let schema = schema();
    let json = r#"{"type":"doc","content":[{"type":"marquee"}]}"#;
    assert!(Document::from_json(schema, json).is_err());
}

#[test]
fn test_failed_transaction_is_atomic() {
    let schema = schema();
    let doc = article(&schema);
    let snapshot = doc.to_json();

    let tx = Transaction::new()
        .step(Step::Insert {
            parent: vec![1],
            offset: 0,
            content: vec![Node::text("New ")],
        })
        .step(Step::AddMark {
            path: vec![1],
            from: 0,
            to: 4,
            mark: Mark::plain("no_such_mark"),
        });

    assert!(doc.apply(&tx).is_err());
    assert_eq!(doc.to_json(), snapshot);
}

#[test]
fn test_selection_maps_through_block_deletion() {
    let schema = schema();
    let doc = article(&schema);
    let caret = Selection::caret(Position::new(vec![2, 0, 0], 2));

    let mut transform = Transform::new(&doc);
    transform
        .step(Step::Delete {
            parent: vec![],
            from: 0,
            to: 1,
        })
        .unwrap();
    let mapped = transform.mapping().map_selection(&caret);
    assert_eq!(mapped.head, Position::new(vec![1, 0, 0], 2));

    let applied = doc
        .apply(&transform.into_transaction().with_selection(mapped.clone()))
        .unwrap();
    let resolved = applied.doc.resolve(&mapped.head).unwrap();
    assert_eq!(resolved.parent().text_content(), "one");
}

#[test]
fn test_caret_inside_deleted_text_collapses() {
    let schema = schema();
    let doc = article(&schema);
    let mut transform = Transform::new(&doc);
    transform
        .step(Step::Delete {
            parent: vec![1],
            from: 2,
            to: 10,
        })
        .unwrap();
    assert_eq!(
        transform.mapping().map(&Position::new(vec![1], 5)),
        Position::new(vec![1], 2)
    );
    assert_eq!(transform.doc().node_at(&[1]).unwrap().text_content(), "Pl tail");
}

#[test]
fn test_inverse_steps_restore_document() {
    let schema = schema();
    let doc = article(&schema);
    let tx = Transaction::new()
        .step(Step::SetType {
            path: vec![1],
            node_type: "heading".to_string(),
            attrs: attrs([("level", 2i64)]),
        })
        .step(Step::Wrap {
            parent: vec![],
            from: 0,
            to: 2,
            wrapper: NodeSpec::new("blockquote", Attrs::new()),
        })
        .step(Step::SetAttr {
            path: vec![1],
            name: "level".to_string(),
            value: 3i64.into(),
        })
        .step(Step::Split {
            path: vec![0, 1],
            offset: 3,
            new_type: Some(NodeSpec::new("paragraph", Attrs::new())),
        });

    // SetAttr targets the bullet list, which declares no level
    assert!(matches!(
        doc.apply(&tx),
        Err(TransactionError::SchemaViolation { step: Some(2), .. })
    ));

    let tx = Transaction {
        steps: tx
            .steps
            .into_iter()
            .filter(|s| !matches!(s, Step::SetAttr { .. }))
            .collect(),
        ..Transaction::default()
    };
    let applied = doc.apply(&tx).unwrap();
    assert_eq!(applied.doc.root().content.len(), 2);
    assert_eq!(applied.doc.node_at(&[0, 2]).unwrap().kind, "paragraph");

    let undo = Transaction {
        steps: applied.inverses,
        ..Transaction::default()
    };
    assert_eq!(applied.doc.apply(&undo).unwrap().doc, doc);
}

#[test]
fn test_transaction_serializes_steps() {
    let tx = Transaction::new()
        .step(Step::Join { path: vec![2] })
        .with_label("join");
    let json = serde_json::to_value(&tx).unwrap();
    assert_eq!(json["steps"][0]["stepType"], "join");
    assert_eq!(json["addToHistory"], true);
    let back: Transaction = serde_json::from_value(json).unwrap();
    assert_eq!(back, tx);
}
