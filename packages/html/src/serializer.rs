//! # Serializer
//!
//! Walks the document depth-first. Each node's render rule produces a
//! [`DomSpec`]; its hole receives the serialized children. Marks stay open
//! across adjacent text leaves that share them, so `**ab**` with `b`
//! italic becomes `<strong>a<em>b</em></strong>`.

use ecnn_markup::{escape_attr, escape_text, is_void};
use ecnn_model::{Document, Mark, Node};
use ecnn_schema::{DomSpec, RenderContext, Schema};
use serde::{Deserialize, Serialize};

/// Output options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializeOptions {
    /// Put each top-level block on its own line
    #[serde(default)]
    pub pretty: bool,
}

struct Context {
    buffer: String,
}

impl Context {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Serialize a document to markup
pub fn serialize(doc: &Document, ctx: &RenderContext) -> String {
    serialize_with(doc, ctx, &SerializeOptions::default())
}

pub fn serialize_with(doc: &Document, ctx: &RenderContext, options: &SerializeOptions) -> String {
    let mut out = Context::new();
    let schema = doc.schema();
    for (index, block) in doc.root().content.iter().enumerate() {
        if options.pretty && index > 0 {
            out.add("\n");
        }
        write_node(&mut out, schema, block, ctx);
    }
    tracing::debug!(bytes = out.len(), "serialized document");
    out.get_output()
}

/// Serialize a single node and its subtree
pub fn serialize_node(schema: &Schema, node: &Node, ctx: &RenderContext) -> String {
    let mut out = Context::new();
    write_node(&mut out, schema, node, ctx);
    out.get_output()
}

fn write_node(out: &mut Context, schema: &Schema, node: &Node, ctx: &RenderContext) {
    if let Some(text) = &node.text {
        out.add(&escape_text(text));
        return;
    }
    let Some(node_type) = schema.node(&node.kind) else {
        tracing::warn!(kind = %node.kind, "skipping node of unknown type");
        return;
    };
    let spec = (node_type.render)(&node.attrs, ctx);
    if node_type.is_textblock() {
        write_spec(out, &spec, &mut |out| write_inline(out, schema, &node.content, ctx));
    } else {
        write_spec(out, &spec, &mut |out| {
            for child in &node.content {
                write_node(out, schema, child, ctx);
            }
        });
    }
}

fn write_spec(out: &mut Context, spec: &DomSpec, hole: &mut dyn FnMut(&mut Context)) {
    match spec {
        DomSpec::Hole => hole(out),
        DomSpec::Text(text) => out.add(&escape_text(text)),
        DomSpec::Element {
            tag,
            attrs,
            children,
        } => {
            out.add("<");
            out.add(tag);
            for (name, value) in attrs {
                out.add(" ");
                out.add(name);
                out.add("=\"");
                out.add(&escape_attr(value));
                out.add("\"");
            }
            out.add(">");
            if is_void(tag) {
                return;
            }
            for child in children {
                write_spec(out, child, hole);
            }
            out.add("</");
            out.add(tag);
            out.add(">");
        }
    }
}

/// Opening and closing markup of a mark
fn mark_tags(schema: &Schema, mark: &Mark, ctx: &RenderContext) -> (String, String) {
    let Some(mark_type) = schema.mark(&mark.kind) else {
        return (String::new(), String::new());
    };
    let spec = (mark_type.render)(&mark.attrs, ctx);
    let mut out = Context::new();
    let mut split = None;
    write_spec(&mut out, &spec, &mut |out| split = Some(out.len()));
    let mut open = out.get_output();
    let close = match split {
        Some(at) => open.split_off(at),
        None => String::new(),
    };
    (open, close)
}

fn write_inline(out: &mut Context, schema: &Schema, content: &[Node], ctx: &RenderContext) {
    let mut open: Vec<(&Mark, String)> = Vec::new();

    for leaf in content {
        let keep = open
            .iter()
            .zip(&leaf.marks)
            .take_while(|((open_mark, _), mark)| *open_mark == *mark)
            .count();
        while open.len() > keep {
            if let Some((_, close)) = open.pop() {
                out.add(&close);
            }
        }
        for mark in &leaf.marks[keep..] {
            let (start, close) = mark_tags(schema, mark, ctx);
            out.add(&start);
            open.push((mark, close));
        }
        write_node(out, schema, leaf, ctx);
    }

    while let Some((_, close)) = open.pop() {
        out.add(&close);
    }
}
