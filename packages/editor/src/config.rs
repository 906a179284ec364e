//! Editor configuration

use ecnn_schema::{RenderContext, Theme};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_DEPTH: usize = 100;

fn default_history_depth() -> usize {
    DEFAULT_HISTORY_DEPTH
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo levels kept (0 = unlimited)
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,

    /// Theme used when the session serializes its document
    #[serde(default)]
    pub theme: Theme,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            theme: Theme::default(),
        }
    }
}

impl EditorConfig {
    pub fn render_context(&self) -> RenderContext {
        RenderContext { theme: self.theme }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: EditorConfig = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(config.history_depth, 100);
        assert!(config.render_context().is_dark());
    }
}
