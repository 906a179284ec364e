//! Draft submission: turn a session into the article record the backend
//! stores.

use crate::errors::{EditorError, SubmitError};
use crate::session::EditorSession;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

/// Characters of body text used when no summary is given
pub const SUMMARY_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: String,
    #[serde(rename = "description")]
    pub summary: String,
    #[serde(rename = "content")]
    pub body_markup: String,
    #[serde(rename = "coverImage", skip_serializing_if = "Option::is_none", default)]
    pub cover_asset_url: Option<String>,
    pub status: DraftStatus,
}

/// What the backend answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

pub trait ArticleSubmitter {
    fn submit(&self, draft: ArticleDraft) -> LocalBoxFuture<'_, Result<SubmitReceipt, SubmitError>>;
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether the body holds anything worth publishing
fn has_body(session: &EditorSession) -> bool {
    let doc = session.doc();
    if !doc.text_content().trim().is_empty() {
        return true;
    }
    let mut atoms = false;
    doc.for_each_node(|_, node| {
        if doc.schema().node(&node.kind).is_some_and(|ty| ty.is_atom()) {
            atoms = true;
        }
    });
    atoms
}

/// Assemble the record for a session, deriving the summary from the body
/// text when none is given
pub fn prepare_draft(
    session: &EditorSession,
    title: &str,
    summary: Option<&str>,
    status: DraftStatus,
) -> Result<ArticleDraft, EditorError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(EditorError::SubmissionRejected("title is empty".to_string()));
    }
    if !has_body(session) {
        return Err(EditorError::SubmissionRejected("article body is empty".to_string()));
    }

    let summary = match summary.map(str::trim).filter(|s| !s.is_empty()) {
        Some(summary) => summary.to_string(),
        None => {
            let doc = session.doc();
            collapse_whitespace(&doc.text_between(&doc.start_position(), &doc.end_position()))
                .chars()
                .take(SUMMARY_LENGTH)
                .collect()
        }
    };

    Ok(ArticleDraft {
        title: title.to_string(),
        summary,
        body_markup: session.to_html(),
        cover_asset_url: session.cover_image().map(str::to_string),
        status,
    })
}

pub async fn submit_draft<S>(submitter: &S, draft: ArticleDraft) -> Result<SubmitReceipt, EditorError>
where
    S: ArticleSubmitter + ?Sized,
{
    let title = draft.title.clone();
    let receipt = submitter.submit(draft).await.map_err(|err| {
        tracing::warn!(%title, %err, "submission failed");
        err
    })?;
    tracing::info!(%title, id = %receipt.id, "article submitted");
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use ecnn_schema::article_schema;
    use std::sync::Arc;

    fn session(markup: &str) -> EditorSession {
        EditorSession::from_html(Arc::new(article_schema().unwrap()), markup, EditorConfig::default())
    }

    #[test]
    fn test_summary_derived_from_body() {
        let long = "word ".repeat(100);
        let session = session(&format!("<h2>Intro</h2><p>{}</p>", long));
        let draft = prepare_draft(&session, "  My post ", None, DraftStatus::Draft).unwrap();
        assert_eq!(draft.title, "My post");
        assert_eq!(draft.summary.chars().count(), SUMMARY_LENGTH);
        assert!(draft.summary.starts_with("Intro word word"));
        assert!(draft.body_markup.starts_with("<h2>Intro</h2>"));

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["status"], "draft");
        assert!(json.get("description").is_some());
        assert!(json.get("coverImage").is_none());
    }

    #[test]
    fn test_empty_drafts_are_rejected() {
        let empty = session("<p></p>");
        assert!(matches!(
            prepare_draft(&empty, "Title", None, DraftStatus::Published),
            Err(EditorError::SubmissionRejected(_))
        ));

        let rule_only = session("<hr>");
        assert!(prepare_draft(&rule_only, "Title", Some("A rule"), DraftStatus::Draft).is_ok());
        assert!(prepare_draft(&rule_only, "   ", None, DraftStatus::Draft).is_err());
    }
}
