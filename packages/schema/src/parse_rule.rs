//! Parse rules: selectors over the generic element tree

use crate::attrs::Attrs;
use ecnn_markup::Element;

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Present(String),
    Equals(String, String),
    Contains(String, String),
}

/// Tag plus optional class and attribute constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Selector {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            attrs: Vec::new(),
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn has_attr(mut self, name: impl Into<String>) -> Self {
        self.attrs.push(AttrMatch::Present(name.into()));
        self
    }

    pub fn attr_eq(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(AttrMatch::Equals(name.into(), value.into()));
        self
    }

    pub fn attr_contains(mut self, name: impl Into<String>, needle: impl Into<String>) -> Self {
        self.attrs.push(AttrMatch::Contains(name.into(), needle.into()));
        self
    }

    pub fn matches(&self, element: &Element) -> bool {
        element.tag == self.tag
            && self.classes.iter().all(|class| element.has_class(class))
            && self.attrs.iter().all(|constraint| match constraint {
                AttrMatch::Present(name) => element.has_attr(name),
                AttrMatch::Equals(name, value) => element.attr(name) == Some(value.as_str()),
                AttrMatch::Contains(name, needle) => element
                    .attr(name)
                    .is_some_and(|value| value.contains(needle.as_str())),
            })
    }
}

/// How the children of a matched element are read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseContent {
    /// Read children as node content
    #[default]
    Children,
    /// The node is rebuilt from attributes only
    Ignore,
    /// Take the raw text content, whitespace preserved
    Preformatted,
}

/// Extracts attributes from a matched element; `None` rejects the match
pub type GetAttrs = fn(&Element) -> Option<Attrs>;

#[derive(Clone)]
pub struct ParseRule {
    pub selector: Selector,
    pub get_attrs: Option<GetAttrs>,
    pub content: ParseContent,
}

impl std::fmt::Debug for ParseRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseRule")
            .field("selector", &self.selector)
            .field("get_attrs", &self.get_attrs.is_some())
            .field("content", &self.content)
            .finish()
    }
}

impl ParseRule {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            get_attrs: None,
            content: ParseContent::Children,
        }
    }

    pub fn tag(tag: &str) -> Self {
        Self::new(Selector::tag(tag))
    }

    pub fn get_attrs(mut self, get_attrs: GetAttrs) -> Self {
        self.get_attrs = Some(get_attrs);
        self
    }

    pub fn content(mut self, content: ParseContent) -> Self {
        self.content = content;
        self
    }

    /// Attributes for the element if this rule accepts it
    pub fn apply(&self, element: &Element) -> Option<Attrs> {
        if !self.selector.matches(element) {
            return None;
        }
        match self.get_attrs {
            Some(get_attrs) => get_attrs(element),
            None => Some(Attrs::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_matching() {
        let task_list = Selector::tag("ul").attr_eq("data-type", "taskList");
        assert!(task_list.matches(&Element::new("ul").with_attr("data-type", "taskList")));
        assert!(!task_list.matches(&Element::new("ul")));

        let tweet = Selector::tag("blockquote").class("twitter-tweet");
        assert!(tweet.matches(&Element::new("blockquote").with_attr("class", "x twitter-tweet")));
        assert!(!tweet.matches(&Element::new("div").with_attr("class", "twitter-tweet")));

        let colored = Selector::tag("span").attr_contains("style", "color");
        assert!(colored.matches(&Element::new("span").with_attr("style", "color: red")));
    }

    #[test]
    fn test_get_attrs_can_reject() {
        let rule = ParseRule::tag("a").get_attrs(|el| {
            let href = el.attr("href")?;
            Some(crate::attrs::attrs([("href", href)]))
        });
        assert!(rule.apply(&Element::new("a")).is_none());
        assert!(rule.apply(&Element::new("a").with_attr("href", "/x")).is_some());
    }
}
