//! # Content expressions
//!
//! A small regular language over node names and groups:
//! `inline*`, `block+`, `paragraph block*`, `(table_cell | table_header)+`.
//! Matching backtracks over terms, which is plenty for the short
//! expressions a schema uses.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    One,
    Optional,
    Star,
    Plus,
}

impl Quantifier {
    fn min(self) -> usize {
        match self {
            Quantifier::One | Quantifier::Plus => 1,
            Quantifier::Optional | Quantifier::Star => 0,
        }
    }

    fn max(self) -> usize {
        match self {
            Quantifier::One | Quantifier::Optional => 1,
            Quantifier::Star | Quantifier::Plus => usize::MAX,
        }
    }
}

/// One term of an expression: a set of alternatives and a quantifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub alternatives: Vec<String>,
    pub quantifier: Quantifier,
}

impl Term {
    pub fn min(&self) -> usize {
        self.quantifier.min()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentExpr {
    source: String,
    terms: Vec<Term>,
}

impl ContentExpr {
    /// The empty expression: no children allowed
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(source: &str) -> Result<Self, String> {
        let mut terms = Vec::new();
        let mut chars = source.chars().peekable();

        loop {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            let Some(&first) = chars.peek() else { break };

            let alternatives = if first == '(' {
                chars.next();
                let mut alternatives = Vec::new();
                let mut name = String::new();
                let mut closed = false;
                for ch in chars.by_ref() {
                    match ch {
                        '|' => {
                            alternatives.push(take_name(&mut name)?);
                        }
                        ')' => {
                            alternatives.push(take_name(&mut name)?);
                            closed = true;
                            break;
                        }
                        c if c.is_whitespace() => {}
                        c if is_name_char(c) => name.push(c),
                        c => return Err(format!("unexpected character '{}'", c)),
                    }
                }
                if !closed {
                    return Err("unclosed group".to_string());
                }
                alternatives
            } else if is_name_char(first) {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_name_char(c) {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                vec![name]
            } else {
                return Err(format!("unexpected character '{}'", first));
            };

            let quantifier = match chars.peek() {
                Some('?') => Quantifier::Optional,
                Some('*') => Quantifier::Star,
                Some('+') => Quantifier::Plus,
                _ => Quantifier::One,
            };
            if quantifier != Quantifier::One {
                chars.next();
            }

            terms.push(Term {
                alternatives,
                quantifier,
            });
        }

        Ok(Self {
            source: source.trim().to_string(),
            terms,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Names referenced by any term
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .flat_map(|term| term.alternatives.iter().map(String::as_str))
    }

    /// Match a child sequence. `accepts(item, name)` decides whether a child
    /// satisfies a node name or group.
    pub fn matches<T>(&self, children: &[T], accepts: &dyn Fn(&T, &str) -> bool) -> bool {
        match_from(&self.terms, children, accepts)
    }

    /// Whether some term could ever accept this child
    pub fn mentions<T>(&self, child: &T, accepts: &dyn Fn(&T, &str) -> bool) -> bool {
        self.references().any(|name| accepts(child, name))
    }
}

impl fmt::Display for ContentExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn take_name(name: &mut String) -> Result<String, String> {
    if name.is_empty() {
        return Err("empty alternative".to_string());
    }
    Ok(std::mem::take(name))
}

fn match_from<T>(terms: &[Term], children: &[T], accepts: &dyn Fn(&T, &str) -> bool) -> bool {
    let Some((term, rest)) = terms.split_first() else {
        return children.is_empty();
    };

    let fits = |child: &T| term.alternatives.iter().any(|alt| accepts(child, alt));

    // Greedy: find the longest run this term can take, then back off.
    let mut run = 0;
    while run < children.len() && run < term.quantifier.max() && fits(&children[run]) {
        run += 1;
    }

    let min = term.quantifier.min();
    if run < min {
        return false;
    }
    (min..=run)
        .rev()
        .any(|taken| match_from(rest, &children[taken..], accepts))
}
