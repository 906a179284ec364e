//! Serialize then deserialize must reproduce the tree

use ecnn_html::{deserialize, deserialize_with_report, serialize, serialize_with, SerializeOptions};
use ecnn_model::Document;
use ecnn_schema::{article_schema, AttrValue, RenderContext, Schema};
use serde_json::json;
use std::sync::Arc;

fn schema() -> Arc<Schema> {
    Arc::new(article_schema().unwrap())
}

fn doc(schema: &Arc<Schema>, blocks: serde_json::Value) -> Document {
    let root = json!({ "type": "doc", "content": blocks });
    Document::from_json(schema.clone(), &root.to_string()).unwrap()
}

fn paragraph(content: serde_json::Value) -> serde_json::Value {
    json!({ "type": "paragraph", "content": content })
}

fn text(text: &str, marks: serde_json::Value) -> serde_json::Value {
    json!({ "type": "text", "text": text, "marks": marks })
}

fn assert_round_trip(doc: &Document) {
    for ctx in [RenderContext::light(), RenderContext::dark()] {
        let html = serialize(doc, &ctx);
        let (back, report) = deserialize_with_report(doc.schema().clone(), &html);
        assert!(report.is_clean(), "repairs for {}: {:?}", html, report.repairs);
        assert_eq!(&back, doc, "round trip of {}", html);
    }
}

#[test]
fn test_text_blocks_round_trip() {
    let schema = schema();
    let doc = doc(
        &schema,
        json!([
            { "type": "heading", "attrs": { "level": 2, "text_align": "center" },
              "content": [{ "type": "text", "text": "Heading" }] },
            { "type": "paragraph", "attrs": { "text_align": "justify" },
              "content": [{ "type": "text", "text": " padded  text " }] },
            { "type": "paragraph" },
            paragraph(json!([
                { "type": "text", "text": "line" },
                { "type": "hard_break" },
                { "type": "text", "text": "next" }
            ])),
            { "type": "code_block", "attrs": { "language": "rust" },
              "content": [{ "type": "text", "text": "fn main() {\n    if a < b && c > d {}\n}" }] },
            { "type": "code_block" },
            { "type": "horizontal_rule" },
        ]),
    );
    assert_round_trip(&doc);
}

#[test]
fn test_each_mark_round_trips() {
    let schema = schema();
    let marks = [
        json!([{ "type": "link", "attrs": { "href": "https://example.com/?a=1&b=\"2\"", "target": "_blank" } }]),
        json!([{ "type": "link", "attrs": { "href": "/relative" } }]),
        json!([{ "type": "bold" }]),
        json!([{ "type": "italic" }]),
        json!([{ "type": "underline" }]),
        json!([{ "type": "strike" }]),
        json!([{ "type": "code" }]),
        json!([{ "type": "highlight" }]),
        json!([{ "type": "highlight", "attrs": { "color": "#fef08a" } }]),
        json!([{ "type": "text_style", "attrs": { "color": "rgb(255, 0, 0)" } }]),
    ];
    for mark in marks {
        let doc = doc(&schema, json!([paragraph(json!([text("marked <text>", mark)]))]));
        assert_round_trip(&doc);
    }
}

#[test]
fn test_combined_marks_round_trip() {
    let schema = schema();
    let doc = doc(
        &schema,
        json!([paragraph(json!([
            text("a", json!([{ "type": "bold" }])),
            text("b", json!([{ "type": "bold" }, { "type": "italic" }])),
            text("c", json!([{ "type": "italic" }, { "type": "code" }])),
            text("d", json!([
                { "type": "link", "attrs": { "href": "/one" } },
                { "type": "underline" },
                { "type": "text_style", "attrs": { "color": "blue" } }
            ])),
            text("e", json!([{ "type": "link", "attrs": { "href": "/two" } }])),
            text(" plain & simple", json!([])),
        ]))]),
    );
    assert_round_trip(&doc);
}

#[test]
fn test_containers_round_trip() {
    let schema = schema();
    let doc = doc(
        &schema,
        json!([
            { "type": "blockquote", "content": [paragraph(json!([text("quoted", json!([]))]))] },
            { "type": "bullet_list", "content": [
                { "type": "list_item", "content": [
                    paragraph(json!([text("one", json!([]))])),
                    { "type": "bullet_list", "content": [
                        { "type": "list_item", "content": [paragraph(json!([text("nested", json!([]))]))] }
                    ] }
                ] },
                { "type": "list_item", "content": [{ "type": "paragraph" }] }
            ] },
            { "type": "ordered_list", "attrs": { "start": 3 }, "content": [
                { "type": "list_item", "content": [paragraph(json!([text("third", json!([]))]))] }
            ] },
            { "type": "task_list", "content": [
                { "type": "task_item", "attrs": { "checked": true },
                  "content": [paragraph(json!([text("done", json!([]))]))] },
                { "type": "task_item", "content": [paragraph(json!([text("todo", json!([]))]))] }
            ] },
        ]),
    );
    assert_round_trip(&doc);
}

#[test]
fn test_table_round_trips() {
    let schema = schema();
    let cell = |kind: &str, label: &str| {
        json!({ "type": kind, "content": [paragraph(json!([text(label, json!([]))]))] })
    };
    let doc = doc(
        &schema,
        json!([{ "type": "table", "content": [
            { "type": "table_row", "content": [cell("table_header", "A"), cell("table_header", "B")] },
            { "type": "table_row", "content": [
                { "type": "table_cell", "attrs": { "colspan": 2 },
                  "content": [paragraph(json!([text("wide", json!([]))]))] }
            ] },
            { "type": "table_row", "content": [cell("table_cell", "1"), { "type": "table_cell", "content": [{ "type": "paragraph" }] }] }
        ] }]),
    );
    assert_round_trip(&doc);
}

#[test]
fn test_atoms_round_trip() {
    let schema = schema();
    let doc = doc(
        &schema,
        json!([
            { "type": "image", "attrs": { "src": "https://cdn.example.com/a.png", "alt": "An \"image\"", "title": "T" } },
            { "type": "image", "attrs": { "src": "/b.png" } },
            { "type": "video_embed", "attrs": { "src": "https://www.youtube.com/embed/dQw4w9WgXcQ" } },
            { "type": "video_embed", "attrs": {
                "src": "https://www.youtube.com/embed/abcdefghijk",
                "width": "640", "height": "360", "allowfullscreen": false } },
            { "type": "social_embed", "attrs": { "url": "https://x.com/acct/status/1234567890" } },
        ]),
    );
    assert_round_trip(&doc);
}

#[test]
fn test_social_caption_uses_canonical_host() {
    let schema = schema();
    let doc = doc(
        &schema,
        json!([{ "type": "social_embed", "attrs": { "url": "https://x.com/acct/status/1234567890" } }]),
    );
    let light = serialize(&doc, &RenderContext::light());
    assert!(light.contains("data-url=\"https://x.com/acct/status/1234567890\""));
    assert!(light.contains("href=\"https://twitter.com/acct/status/1234567890\""));
    assert!(!light.contains("data-theme"));

    let dark = serialize(&doc, &RenderContext::dark());
    assert!(dark.contains("data-theme=\"dark\""));
}

#[test]
fn test_pretty_output_reads_back() {
    let schema = schema();
    let doc = doc(
        &schema,
        json!([
            paragraph(json!([text("first", json!([]))])),
            { "type": "horizontal_rule" },
            paragraph(json!([text("second", json!([]))])),
        ]),
    );
    let html = serialize_with(&doc, &RenderContext::light(), &SerializeOptions { pretty: true });
    assert_eq!(deserialize(schema, &html), doc);
}

#[test]
fn test_pasted_markup_is_repaired() {
    let schema = schema();
    let html = r#"
        <div class="post">
            <h1 style="text-align: right" id="x">Title</h1>
            <p>Intro with <a href="javascript:alert(1)">bad link</a> and <b>bold</b></p>
            <ul><li>bare item</li></ul>
            <iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ?start=10"></iframe>
        </div>
    "#;
    let (doc, report) = deserialize_with_report(schema, html);
    let kinds: Vec<_> = doc.root().content.iter().map(|n| n.kind.as_str()).collect();
    assert_eq!(kinds, vec!["heading", "paragraph", "bullet_list", "video_embed"]);
    assert_eq!(doc.root().content[0].attrs["text_align"], AttrValue::from("right"));
    assert_eq!(doc.text_content().lines().nth(1), Some("Intro with bad link and bold"));
    assert!(!report.is_clean());
}
