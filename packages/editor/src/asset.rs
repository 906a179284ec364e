//! # Asset Insertion
//!
//! Uploads run outside the session. A ticket taken before the upload
//! remembers where the asset goes; every committed transaction remaps it,
//! so the image lands where the user asked even if they kept typing.
//!
//! ```text
//! request_asset ──► ticket(position) ──► upload (await) ──► resolve_asset
//!                        ▲                                      │
//!                        └────── remapped by each commit ───────┘
//! ```

use crate::errors::{AssetError, EditorError, UploadError};
use crate::session::EditorSession;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Weak;

/// Largest accepted upload
pub const MAX_ASSET_BYTES: usize = 5 * 1024 * 1024;

/// What an uploaded asset is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    /// The article's cover; stored on the session, not in the tree
    Cover,
    /// An image inserted into the body
    ContentImage,
}

/// A file picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Images only, with an extension, no larger than [`MAX_ASSET_BYTES`]
    pub fn validate(&self) -> Result<(), AssetError> {
        if !self.content_type.starts_with("image/") {
            return Err(AssetError::InvalidFile(format!(
                "{} is not an image ({})",
                self.name, self.content_type
            )));
        }
        if self.bytes.len() > MAX_ASSET_BYTES {
            return Err(AssetError::InvalidFile(format!(
                "{} is {} bytes, the limit is {}",
                self.name,
                self.bytes.len(),
                MAX_ASSET_BYTES
            )));
        }
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Ok(()),
            _ => Err(AssetError::InvalidFile(format!("{} has no extension", self.name))),
        }
    }
}

/// Where the uploader put the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    #[serde(rename = "accessURL")]
    pub access_url: String,
}

/// Storage backend for picked files
pub trait AssetUploader {
    fn upload_asset(&self, file: LocalFile) -> LocalBoxFuture<'_, Result<UploadedAsset, UploadError>>;
}

/// Handle for one outstanding upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetTicket {
    pub id: u64,
    pub kind: AssetKind,
}

/// Validate, upload and place a file.
///
/// The session is held weakly and never borrowed across the upload, so
/// the editor stays usable while it runs. Returns `Ok(false)` when the
/// session was dropped or closed before the upload finished.
pub async fn insert_asset<U>(
    session: Weak<RefCell<EditorSession>>,
    uploader: &U,
    kind: AssetKind,
    file: LocalFile,
) -> Result<bool, EditorError>
where
    U: AssetUploader + ?Sized,
{
    file.validate()?;

    let ticket = {
        let session = session.upgrade().ok_or(AssetError::SessionClosed)?;
        let mut session = session.borrow_mut();
        session.request_asset(kind)?
    };
    tracing::debug!(ticket = ticket.id, name = %file.name, "uploading asset");

    let result = uploader.upload_asset(file).await;

    let Some(session) = session.upgrade() else {
        tracing::debug!(ticket = ticket.id, "session dropped during upload");
        return Ok(false);
    };
    let mut session = session.borrow_mut();
    session.resolve_asset(ticket, result)
}
