//! Markup fragment specs returned by render rules

/// A fragment of markup. `Hole` marks where a node's children (or a mark's
/// text) go; at most one hole per spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomSpec {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<DomSpec>,
    },
    Text(String),
    Hole,
}

impl DomSpec {
    pub fn element(tag: impl Into<String>) -> Self {
        DomSpec::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        DomSpec::Text(text.into())
    }

    /// Add an attribute; a no-op on text and holes
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let DomSpec::Element { attrs, .. } = &mut self {
            attrs.push((name.into(), value.into()));
        }
        self
    }

    pub fn attr_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    pub fn child(mut self, child: DomSpec) -> Self {
        if let DomSpec::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    pub fn hole(self) -> Self {
        self.child(DomSpec::Hole)
    }

    pub fn has_hole(&self) -> bool {
        match self {
            DomSpec::Hole => true,
            DomSpec::Text(_) => false,
            DomSpec::Element { children, .. } => children.iter().any(DomSpec::has_hole),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let spec = DomSpec::element("pre")
            .child(DomSpec::element("code").attr("class", "language-rust").hole());
        assert!(spec.has_hole());
        assert!(!DomSpec::element("hr").has_hole());
        assert_eq!(DomSpec::text("x").attr("a", "b"), DomSpec::text("x"));
    }
}
