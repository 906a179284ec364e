use ecnn_editor::{ActiveQuery, Command, EditorConfig, EditorSession};
use ecnn_schema::{article_schema, SocialPost, VideoEmbed};
use serde::Serialize;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(message: String) -> JsValue {
    JsValue::from_str(&message)
}

/// An editing session driven from JavaScript with JSON commands
#[wasm_bindgen]
pub struct EditorHandle {
    session: EditorSession,
}

impl EditorHandle {
    fn open(markup: &str, config_json: Option<&str>) -> Result<Self, String> {
        let config = match config_json {
            Some(json) => serde_json::from_str::<EditorConfig>(json)
                .map_err(|e| format!("Config error: {}", e))?,
            None => EditorConfig::default(),
        };
        let schema = article_schema().map_err(|e| format!("Schema error: {}", e))?;
        Ok(Self {
            session: EditorSession::from_html(Arc::new(schema), markup, config),
        })
    }

    fn run(&mut self, command_json: &str) -> Result<(), String> {
        let command: Command =
            serde_json::from_str(command_json).map_err(|e| format!("Command error: {}", e))?;
        self.session.execute(&command).map_err(|e| e.to_string())
    }

    fn toolbar_json(&self) -> Result<String, String> {
        serde_json::to_string(&self.session.toolbar()).map_err(|e| format!("Serialization error: {}", e))
    }
}

#[wasm_bindgen]
impl EditorHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(markup: &str, config_json: Option<String>) -> Result<EditorHandle, JsValue> {
        Self::open(markup, config_json.as_deref()).map_err(js_error)
    }

    /// Run a command such as `{"command":"toggleMark","args":"bold"}`
    pub fn execute(&mut self, command_json: &str) -> Result<(), JsValue> {
        self.run(command_json).map_err(js_error)
    }

    #[wasm_bindgen(js_name = canExecute)]
    pub fn can_execute(&self, command_json: &str) -> bool {
        serde_json::from_str::<Command>(command_json)
            .map(|command| self.session.can_execute(&command))
            .unwrap_or(false)
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self, query_json: &str) -> bool {
        serde_json::from_str::<ActiveQuery>(query_json)
            .map(|query| self.session.is_active(&query))
            .unwrap_or(false)
    }

    pub fn toolbar(&self) -> Result<String, JsValue> {
        self.toolbar_json().map_err(js_error)
    }

    pub fn undo(&mut self) -> Result<bool, JsValue> {
        self.session.undo().map_err(|e| js_error(e.to_string()))
    }

    pub fn redo(&mut self) -> Result<bool, JsValue> {
        self.session.redo().map_err(|e| js_error(e.to_string()))
    }

    #[wasm_bindgen(js_name = beginBatch)]
    pub fn begin_batch(&mut self, label: &str) {
        self.session.begin_batch(label);
    }

    #[wasm_bindgen(js_name = endBatch)]
    pub fn end_batch(&mut self) {
        self.session.end_batch();
    }

    pub fn html(&self) -> String {
        self.session.to_html()
    }

    /// The document tree as JSON
    #[wasm_bindgen(js_name = docJson)]
    pub fn doc_json(&self) -> String {
        self.session.doc().to_json().to_string()
    }

    pub fn close(&mut self) {
        self.session.close();
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum EmbedInfo {
    #[serde(rename_all = "camelCase")]
    Video { id: String, src: String },
    #[serde(rename_all = "camelCase")]
    SocialPost { url: String, canonical_url: String },
}

fn describe_embed(url: &str) -> Option<EmbedInfo> {
    if let Some(video) = VideoEmbed::parse(url) {
        return Some(EmbedInfo::Video {
            src: video.embed_src(),
            id: video.id,
        });
    }
    SocialPost::parse(url).map(|post| EmbedInfo::SocialPost {
        canonical_url: post.canonical_url(),
        url: post.url,
    })
}

/// Classify a pasted link; `undefined` when it is not an accepted embed
#[wasm_bindgen(js_name = describeEmbed)]
pub fn describe_embed_js(url: &str) -> Option<String> {
    describe_embed(url).and_then(|info| serde_json::to_string(&info).ok())
}
