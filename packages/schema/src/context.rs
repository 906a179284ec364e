//! Render context and one-time presentation setup

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Everything a render rule may depend on besides the node's attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderContext {
    pub theme: Theme,
}

impl RenderContext {
    pub fn light() -> Self {
        Self { theme: Theme::Light }
    }

    pub fn dark() -> Self {
        Self { theme: Theme::Dark }
    }

    pub fn is_dark(&self) -> bool {
        self.theme == Theme::Dark
    }
}

static STYLESHEET: OnceLock<String> = OnceLock::new();

const TABLE_RULES: &[(&str, &str)] = &[
    (".custom-table", "border-collapse: collapse; width: 100%; margin: 1rem 0;"),
    (
        ".custom-table td, .custom-table th",
        "border: 1px solid #888; min-width: 40px; min-height: 30px; padding: 0.5rem;",
    ),
    (".custom-table th", "background: #f8fafc; font-weight: 600;"),
    (".yt-embed-wrapper iframe", "width: 100%; max-width: 100%; border-radius: 12px;"),
    (".twitter-embed-wrapper", "margin: 16px 0; width: 100%; max-width: 100%;"),
];

/// The stylesheet presenting tables and embeds. Built on first call and
/// shared afterwards; callers install it wherever they render articles.
pub fn presentation_stylesheet() -> &'static str {
    STYLESHEET.get_or_init(|| {
        TABLE_RULES
            .iter()
            .map(|(selector, body)| format!("{} {{ {} }}\n", selector, body))
            .collect()
    })
}
