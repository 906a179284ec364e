//! Editor state: the document plus everything a command reads besides it

use ecnn_model::{
    AppliedTransaction, Document, Mark, Position, Selection, TextRange, Transaction,
    TransactionError,
};
use ecnn_schema::Schema;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub doc: Document,
    pub selection: Selection,
    /// Marks for the next typed text, overriding those at the caret
    pub stored_marks: Option<Vec<Mark>>,
}

impl EditorState {
    /// State with the caret at the start of the first textblock
    pub fn new(doc: Document) -> Self {
        let start = doc.start_position();
        Self {
            doc,
            selection: Selection::caret(start),
            stored_marks: None,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.doc.schema()
    }

    /// Apply a transaction, producing the next state.
    ///
    /// Without an explicit selection the current one is mapped through the
    /// transaction's steps and snapped into the nearest textblock.
    pub fn apply(&self, tx: &Transaction) -> Result<(EditorState, AppliedTransaction), TransactionError> {
        let applied = self.doc.apply(tx)?;

        let selection = match &tx.selection {
            Some(selection) => selection.clone(),
            None if tx.steps.is_empty() => self.selection.clone(),
            None => {
                let mapped = applied.mapping.map_selection(&self.selection);
                let selection = Selection::new(
                    applied.doc.snap(&mapped.anchor),
                    applied.doc.snap(&mapped.head),
                );
                tracing::debug!(?selection, "remapped selection");
                selection
            }
        };

        let stored_marks = match &tx.stored_marks {
            Some(marks) => Some(marks.clone()),
            None if tx.steps.is_empty() && tx.selection.is_none() => self.stored_marks.clone(),
            None => None,
        };

        let next = EditorState {
            doc: applied.doc.clone(),
            selection,
            stored_marks,
        };
        Ok((next, applied))
    }

    /// Textblock ranges covered by the selection; a caret yields the empty
    /// range of its own textblock.
    pub fn selected_ranges(&self) -> Vec<TextRange> {
        let from = self.selection.from();
        let to = self.selection.to();
        if self.selection.is_caret() {
            return match self.doc.resolve(from) {
                Some(resolved) if resolved.is_textblock() => vec![TextRange {
                    path: from.path.clone(),
                    from: from.offset,
                    to: from.offset,
                }],
                _ => Vec::new(),
            };
        }
        self.doc.textblocks_between(from, to)
    }

    /// Marks the next typed character would carry
    pub fn marks_at_caret(&self) -> Vec<Mark> {
        match &self.stored_marks {
            Some(marks) => marks.clone(),
            None => marks_at(&self.doc, &self.selection.head),
        }
    }
}

/// Marks inherited by text inserted at `pos`. Marks that do not extend
/// past their end (links) are dropped at the trailing edge of their run.
pub fn marks_at(doc: &Document, pos: &Position) -> Vec<Mark> {
    let Some(resolved) = doc.resolve(pos) else {
        return Vec::new();
    };
    let marks = resolved.marks();
    if pos.offset == 0 {
        return marks;
    }
    let after = resolved
        .leaf_after()
        .map(|leaf| leaf.marks.clone())
        .unwrap_or_default();
    let schema = doc.schema();
    marks
        .into_iter()
        .filter(|mark| {
            schema.mark(&mark.kind).is_some_and(|ty| ty.inclusive) || mark.is_in_set(&after)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecnn_model::Step;
    use ecnn_schema::article_schema;

    fn state(json: &str) -> EditorState {
        let schema = Arc::new(article_schema().unwrap());
        EditorState::new(Document::from_json(schema, json).unwrap())
    }

    #[test]
    fn test_new_state_starts_in_first_textblock() {
        let state = state(
            r#"{"type":"doc","content":[{"type":"horizontal_rule"},{"type":"paragraph"}]}"#,
        );
        assert_eq!(state.selection, Selection::caret(Position::new(vec![1], 0)));
    }

    #[test]
    fn test_link_does_not_extend_past_its_end() {
        let state = state(
            r#"{"type":"doc","content":[{"type":"paragraph","content":[
                {"type":"text","text":"ab","marks":[{"type":"link","attrs":{"href":"/x"}},{"type":"bold"}]},
                {"type":"text","text":"c"}
            ]}]}"#,
        );
        let kinds = |pos| -> Vec<String> {
            marks_at(&state.doc, &Position::new(vec![0], pos))
                .into_iter()
                .map(|m| m.kind)
                .collect()
        };
        assert_eq!(kinds(1), vec!["link", "bold"]);
        assert_eq!(kinds(2), vec!["bold"]);
        assert_eq!(kinds(0), vec!["link", "bold"]);
    }

    #[test]
    fn test_steps_clear_stored_marks() {
        let mut state = state(r#"{"type":"doc","content":[{"type":"paragraph"}]}"#);
        state.stored_marks = Some(vec![Mark::plain("bold")]);

        let (moved, _) = state.apply(&Transaction::new()).unwrap();
        assert_eq!(moved.stored_marks, Some(vec![Mark::plain("bold")]));

        let tx = Transaction::new().step(Step::Insert {
            parent: vec![0],
            offset: 0,
            content: vec![ecnn_model::Node::text("x")],
        });
        let (typed, _) = state.apply(&tx).unwrap();
        assert_eq!(typed.stored_marks, None);
        assert_eq!(typed.selection.head, Position::new(vec![0], 1));
    }
}
