use ecnn_editor::EditorConfig;
use ecnn_html::SerializeOptions;
use ecnn_schema::{RenderContext, Theme};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "ecnn.config.json";

/// ecnn configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Presentation theme for rendered markup
    #[serde(default)]
    pub theme: Theme,

    /// Undo levels kept by editing sessions
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,

    /// Put each top-level block on its own line
    #[serde(default)]
    pub pretty: bool,
}

fn default_history_depth() -> usize {
    ecnn_editor::DEFAULT_HISTORY_DEPTH
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn render_context(&self) -> RenderContext {
        RenderContext { theme: self.theme }
    }

    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions { pretty: self.pretty }
    }

    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            history_depth: self.history_depth,
            theme: self.theme,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            history_depth: default_history_depth(),
            pretty: false,
        }
    }
}
