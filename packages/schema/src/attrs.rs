//! Attribute values and declarations

use crate::error::AttrError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A node or mark attribute value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Text used when the value is written into markup; `None` for null
    pub fn to_markup(&self) -> Option<String> {
        match self {
            AttrValue::Null => None,
            AttrValue::Bool(b) => Some(b.to_string()),
            AttrValue::Int(i) => Some(i.to_string()),
            AttrValue::Str(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => write!(f, "null"),
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttrValue::Null)
    }
}

/// Attributes of a node or mark, ordered by name
pub type Attrs = BTreeMap<String, AttrValue>;

/// Build an [`Attrs`] map from pairs
pub fn attrs<K, V, I>(pairs: I) -> Attrs
where
    K: Into<String>,
    V: Into<AttrValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Bool,
    Int,
    Str,
}

impl AttrKind {
    fn describe(self, nullable: bool) -> &'static str {
        match (self, nullable) {
            (AttrKind::Bool, false) => "a boolean",
            (AttrKind::Bool, true) => "a boolean or null",
            (AttrKind::Int, false) => "an integer",
            (AttrKind::Int, true) => "an integer or null",
            (AttrKind::Str, false) => "a string",
            (AttrKind::Str, true) => "a string or null",
        }
    }
}

/// Declaration of one attribute: type, default and accepted values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSpec {
    pub kind: AttrKind,
    pub nullable: bool,
    /// `None` makes the attribute required
    pub default: Option<AttrValue>,
    /// When non-empty, the only accepted values
    pub choices: Vec<AttrValue>,
}

impl AttrSpec {
    pub fn string(default: &str) -> Self {
        Self {
            kind: AttrKind::Str,
            nullable: false,
            default: Some(AttrValue::from(default)),
            choices: Vec::new(),
        }
    }

    pub fn optional_string() -> Self {
        Self {
            kind: AttrKind::Str,
            nullable: true,
            default: Some(AttrValue::Null),
            choices: Vec::new(),
        }
    }

    pub fn required_string() -> Self {
        Self {
            kind: AttrKind::Str,
            nullable: false,
            default: None,
            choices: Vec::new(),
        }
    }

    pub fn int(default: i64) -> Self {
        Self {
            kind: AttrKind::Int,
            nullable: false,
            default: Some(AttrValue::Int(default)),
            choices: Vec::new(),
        }
    }

    pub fn bool(default: bool) -> Self {
        Self {
            kind: AttrKind::Bool,
            nullable: false,
            default: Some(AttrValue::Bool(default)),
            choices: Vec::new(),
        }
    }

    pub fn one_of<V: Into<AttrValue>>(mut self, choices: impl IntoIterator<Item = V>) -> Self {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Check a value against this declaration
    pub fn check(&self, owner: &str, name: &str, value: &AttrValue) -> Result<(), AttrError> {
        let type_ok = match (self.kind, value) {
            (_, AttrValue::Null) => self.nullable,
            (AttrKind::Bool, AttrValue::Bool(_)) => true,
            (AttrKind::Int, AttrValue::Int(_)) => true,
            (AttrKind::Str, AttrValue::Str(_)) => true,
            _ => false,
        };
        if !type_ok {
            return Err(AttrError::WrongType {
                owner: owner.to_string(),
                attr: name.to_string(),
                expected: self.kind.describe(self.nullable),
            });
        }
        if !self.choices.is_empty() && !value.is_null() && !self.choices.contains(value) {
            return Err(AttrError::NotAllowed {
                owner: owner.to_string(),
                attr: name.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }
}

/// Drop undeclared attributes, fill defaults and type-check the rest
pub fn fill_declared(
    owner: &str,
    declared: &[(String, AttrSpec)],
    given: &Attrs,
) -> Result<Attrs, AttrError> {
    let mut filled = Attrs::new();
    for (name, spec) in declared {
        let value = match given.get(name) {
            Some(value) => value.clone(),
            None => spec.default.clone().ok_or_else(|| AttrError::Missing {
                owner: owner.to_string(),
                attr: name.clone(),
            })?,
        };
        spec.check(owner, name, &value)?;
        filled.insert(name.clone(), value);
    }
    Ok(filled)
}
