//! Positions and selections

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A location in the document.
///
/// `path` addresses a node by child indices from the root. Inside a
/// textblock `offset` counts characters (inline leaves count as one);
/// anywhere else it is the index of a gap between children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Position {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Position inside the textblock at `path`
    pub fn text(path: &[usize], offset: usize) -> Self {
        Self {
            path: path.to_vec(),
            offset,
        }
    }

    /// Path of the child directly after this gap
    pub fn child_path(&self) -> Vec<usize> {
        let mut path = self.path.clone();
        path.push(self.offset);
        path
    }

    fn key(&self) -> impl Iterator<Item = usize> + '_ {
        self.path.iter().copied().chain(std::iter::once(self.offset))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Anchor and head; equal positions make a caret
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
}

impl Selection {
    pub fn new(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    pub fn caret(pos: Position) -> Self {
        Self {
            anchor: pos.clone(),
            head: pos,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }

    pub fn from(&self) -> &Position {
        std::cmp::min(&self.anchor, &self.head)
    }

    pub fn to(&self) -> &Position {
        std::cmp::max(&self.anchor, &self.head)
    }
}
