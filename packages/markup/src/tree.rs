//! # Element tree
//!
//! A forgiving tree builder over the token stream. It knows just enough of
//! the HTML parsing rules to cope with what editors and pasted content
//! produce: void elements, the implicit end tags of `p`, `li` and table
//! parts, and skipping of `script`/`style` bodies.

use crate::entities::decode_entities;
use crate::lexer::{lex_start_tag, raw_text_end, Token};
use crate::style::style_property;
use logos::Logos;
use serde::Serialize;

/// A node of the generic markup tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupNode {
    Element(Element),
    Text(String),
}

impl MarkupNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            MarkupNode::Element(element) => Some(element),
            MarkupNode::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MarkupNode::Text(text) => Some(text),
            MarkupNode::Element(_) => None,
        }
    }
}

/// An element with lowercase tag and attribute names and decoded values
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: MarkupNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(MarkupNode::Text(text.into()))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// A single property of the inline `style` attribute
    pub fn style(&self, property: &str) -> Option<String> {
        style_property(self.attr("style")?, property)
    }

    /// Child elements, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(MarkupNode::as_element)
    }

    /// First descendant (depth-first, excluding self) with the given tag
    pub fn find(&self, tag: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.tag == tag {
                return Some(child);
            }
            if let Some(found) = child.find(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated descendant text; `br` contributes a newline
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[MarkupNode], out: &mut String) {
    for node in nodes {
        match node {
            MarkupNode::Text(text) => out.push_str(text),
            MarkupNode::Element(element) if element.tag == "br" => out.push('\n'),
            MarkupNode::Element(element) => collect_text(&element.children, out),
        }
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose start tag closes an open `<p>`
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main",
    "nav", "ol", "p", "pre", "section", "table", "ul",
];

const RAW_TEXT_DROPPED: &[&str] = &["script", "style", "template", "noscript"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

struct TreeBuilder {
    stack: Vec<Element>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Element::new("#fragment")],
        }
    }

    fn current(&mut self) -> &mut Element {
        // The fragment root is never popped.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let current = self.current();
        let text = if current.tag == "pre" && current.children.is_empty() {
            text.strip_prefix('\n').unwrap_or(text)
        } else {
            text
        };
        if let Some(MarkupNode::Text(existing)) = current.children.last_mut() {
            existing.push_str(text);
        } else if !text.is_empty() {
            current.children.push(MarkupNode::Text(text.to_string()));
        }
    }

    fn pop(&mut self) {
        if self.stack.len() > 1 {
            if let Some(element) = self.stack.pop() {
                self.current().children.push(MarkupNode::Element(element));
            }
        }
    }

    /// Index of the nearest open element named `tag`, not looking past any of `barriers`
    fn open_index(&self, tag: &str, barriers: &[&str]) -> Option<usize> {
        for (index, element) in self.stack.iter().enumerate().skip(1).rev() {
            if element.tag == tag {
                return Some(index);
            }
            if barriers.contains(&element.tag.as_str()) {
                return None;
            }
        }
        None
    }

    fn close_to(&mut self, index: usize) {
        while self.stack.len() > index {
            self.pop();
        }
    }

    fn implicit_close(&mut self, tag: &str) {
        if CLOSES_PARAGRAPH.contains(&tag) {
            if let Some(index) = self.open_index("p", &["button", "td", "th", "li", "blockquote"]) {
                self.close_to(index);
            }
        }
        match tag {
            "li" => {
                if let Some(index) = self.open_index("li", &["ul", "ol"]) {
                    self.close_to(index);
                }
            }
            "td" | "th" => {
                for cell in ["td", "th"] {
                    if let Some(index) = self.open_index(cell, &["tr", "table"]) {
                        self.close_to(index);
                    }
                }
            }
            "tr" => {
                if let Some(index) = self.open_index("tr", &["table", "tbody", "thead", "tfoot"]) {
                    self.close_to(index);
                }
            }
            "tbody" | "thead" | "tfoot" => {
                for section in ["tbody", "thead", "tfoot"] {
                    if let Some(index) = self.open_index(section, &["table"]) {
                        self.close_to(index);
                    }
                }
            }
            _ => {}
        }
    }

    fn start(&mut self, source: &str) -> Option<String> {
        let tag = lex_start_tag(source);
        let name = tag.name.to_ascii_lowercase();

        if RAW_TEXT_DROPPED.contains(&name.as_str()) {
            return if tag.self_closing { None } else { Some(name) };
        }

        self.implicit_close(&name);

        let mut element = Element::new(name.clone());
        for (key, value) in tag.attrs {
            let key = key.to_ascii_lowercase();
            if element.has_attr(&key) {
                continue;
            }
            element.attrs.push((key, decode_entities(value).into_owned()));
        }

        if is_void(&name) || tag.self_closing {
            self.current().children.push(MarkupNode::Element(element));
        } else {
            self.stack.push(element);
        }
        None
    }

    fn end(&mut self, name: &str) {
        let name = name.to_ascii_lowercase();
        if name == "br" {
            self.current()
                .children
                .push(MarkupNode::Element(Element::new("br")));
            return;
        }
        if let Some(index) = self.open_index(&name, &[]) {
            self.close_to(index);
        }
    }

    fn finish(mut self) -> Vec<MarkupNode> {
        self.close_to(1);
        self.stack
            .pop()
            .map(|root| root.children)
            .unwrap_or_default()
    }
}

/// Parse a markup fragment into a list of top-level nodes. Never fails.
pub fn parse_fragment(source: &str) -> Vec<MarkupNode> {
    let mut builder = TreeBuilder::new();
    let mut lexer = Token::lexer(source);

    while let Some(token) = lexer.next() {
        match token.unwrap_or(Token::Lt) {
            Token::StartTag(tag) => {
                if let Some(raw) = builder.start(tag) {
                    let skip = raw_text_end(lexer.remainder(), &raw);
                    lexer.bump(skip);
                }
            }
            Token::EndTag(name) => builder.end(name),
            Token::Text(text) => builder.push_text(&decode_entities(text)),
            Token::Lt => builder.push_text("<"),
            Token::Comment(_) | Token::Declaration | Token::ProcessingInstruction => {}
        }
    }

    builder.finish()
}
