//! # Position mapping
//!
//! Every applied step yields a [`StepMap`] describing how positions in the
//! old document relate to positions in the new one. Positions are mapped
//! with a rightward bias: content inserted at a position ends up before it.
//! Positions inside deleted content collapse to the deletion point.

use crate::position::{Position, Selection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepMap {
    /// No structural change (attribute, type and mark steps)
    Identity,
    Insert {
        parent: Vec<usize>,
        offset: usize,
        width: usize,
    },
    Delete {
        parent: Vec<usize>,
        from: usize,
        to: usize,
    },
    /// The node at `path` was cut at `offset`; its tail is the next sibling
    Split { path: Vec<usize>, offset: usize },
    /// The node at `path` was merged into its previous sibling of width `left_width`
    Join { path: Vec<usize>, left_width: usize },
    /// Children `from..to` of `parent` moved into a new node at `from`
    Wrap {
        parent: Vec<usize>,
        from: usize,
        to: usize,
    },
    /// The node at `path`, holding `count` children, was replaced by them
    Unwrap { path: Vec<usize>, count: usize },
}

/// Does `path` run strictly through `prefix`? Returns the child index taken
/// below the prefix.
fn below(path: &[usize], prefix: &[usize]) -> Option<usize> {
    if path.len() > prefix.len() && path.starts_with(prefix) {
        Some(path[prefix.len()])
    } else {
        None
    }
}

impl StepMap {
    pub fn map(&self, pos: &Position) -> Position {
        let mut pos = pos.clone();
        match self {
            StepMap::Identity => {}

            StepMap::Insert {
                parent,
                offset,
                width,
            } => {
                if pos.path == *parent {
                    if pos.offset >= *offset {
                        pos.offset += width;
                    }
                } else if let Some(index) = below(&pos.path, parent) {
                    if index >= *offset {
                        pos.path[parent.len()] += width;
                    }
                }
            }

            StepMap::Delete { parent, from, to } => {
                let size = to - from;
                if pos.path == *parent {
                    if pos.offset >= *to {
                        pos.offset -= size;
                    } else if pos.offset > *from {
                        pos.offset = *from;
                    }
                } else if let Some(index) = below(&pos.path, parent) {
                    if index >= *to {
                        pos.path[parent.len()] -= size;
                    } else if index >= *from {
                        return Position::new(parent.clone(), *from);
                    }
                }
            }

            StepMap::Split { path, offset } => {
                let Some((&index, parent)) = path.split_last() else {
                    return pos;
                };
                let depth = parent.len();
                if pos.path == *path {
                    if pos.offset >= *offset {
                        pos.path[depth] = index + 1;
                        pos.offset -= offset;
                    }
                } else if let Some(child) = below(&pos.path, path) {
                    if child >= *offset {
                        pos.path[depth] = index + 1;
                        pos.path[depth + 1] = child - offset;
                    }
                } else if pos.path == parent {
                    if pos.offset > index {
                        pos.offset += 1;
                    }
                } else if let Some(sibling) = below(&pos.path, parent) {
                    if sibling > index {
                        pos.path[depth] += 1;
                    }
                }
            }

            StepMap::Join { path, left_width } => {
                let Some((&index, parent)) = path.split_last() else {
                    return pos;
                };
                let depth = parent.len();
                if pos.path == *path {
                    pos.path[depth] = index - 1;
                    pos.offset += left_width;
                } else if let Some(child) = below(&pos.path, path) {
                    pos.path[depth] = index - 1;
                    pos.path[depth + 1] = child + left_width;
                } else if pos.path == parent {
                    if pos.offset > index {
                        pos.offset -= 1;
                    }
                } else if let Some(sibling) = below(&pos.path, parent) {
                    if sibling > index {
                        pos.path[depth] -= 1;
                    }
                }
            }

            StepMap::Wrap { parent, from, to } => {
                let count = to - from;
                let depth = parent.len();
                if pos.path == *parent {
                    if pos.offset >= *to {
                        pos.offset = pos.offset + 1 - count;
                    } else if pos.offset > *from {
                        let mut path = parent.clone();
                        path.push(*from);
                        return Position::new(path, pos.offset - from);
                    }
                } else if let Some(index) = below(&pos.path, parent) {
                    if index >= *to {
                        pos.path[depth] = index + 1 - count;
                    } else if index >= *from {
                        pos.path[depth] = *from;
                        pos.path.insert(depth + 1, index - from);
                    }
                }
            }

            StepMap::Unwrap { path, count } => {
                let Some((&index, parent)) = path.split_last() else {
                    return pos;
                };
                let depth = parent.len();
                if pos.path == *path {
                    return Position::new(parent.to_vec(), index + pos.offset);
                } else if let Some(child) = below(&pos.path, path) {
                    pos.path.remove(depth);
                    pos.path[depth] = index + child;
                } else if pos.path == parent {
                    if pos.offset > index {
                        pos.offset = pos.offset + count - 1;
                    }
                } else if let Some(sibling) = below(&pos.path, parent) {
                    if sibling > index {
                        pos.path[depth] = sibling + count - 1;
                    }
                }
            }
        }
        pos
    }
}

/// The composed maps of a sequence of steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn append(&mut self, other: Mapping) {
        self.maps.extend(other.maps);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn is_empty(&self) -> bool {
        self.maps.iter().all(|m| *m == StepMap::Identity)
    }

    pub fn map(&self, pos: &Position) -> Position {
        let mut pos = pos.clone();
        for map in &self.maps {
            pos = map.map(&pos);
        }
        tracing::trace!(?pos, "mapped position");
        pos
    }

    pub fn map_selection(&self, selection: &Selection) -> Selection {
        Selection::new(self.map(&selection.anchor), self.map(&selection.head))
    }
}
