//! Input image reference.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::ImagePart;

/// A single input screenshot.
///
/// The bytes are shared, so cloning is cheap and the image can be handed to
/// the model without copying.
#[derive(Clone, PartialEq, Eq)]
pub struct ScreenshotRef {
    bytes: Arc<[u8]>,
    mime_type: String,
    source: Option<PathBuf>,
}

impl std::fmt::Debug for ScreenshotRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenshotRef")
            .field("size_bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("source", &self.source)
            .finish()
    }
}

impl ScreenshotRef {
    /// Creates a screenshot from in-memory bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            source: None,
        }
    }

    /// Reads a screenshot from disk, guessing the MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self {
            bytes: bytes.into(),
            mime_type: mime_for_path(path).to_string(),
            source: Some(path.to_path_buf()),
        })
    }

    /// The raw image bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The image MIME type.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Where the image was read from, if it came from disk.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Image size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for an empty image.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex-encoded SHA-256 digest of the image.
    #[must_use]
    pub fn sha256_hex(&self) -> String {
        hex::encode(Sha256::digest(self.bytes.as_ref()))
    }

    /// Builds the model payload for this image.
    #[must_use]
    pub fn to_image_part(&self) -> ImagePart {
        ImagePart::new(self.mime_type.clone(), Arc::clone(&self.bytes))
    }

    /// Summary recorded alongside a run.
    #[must_use]
    pub fn metadata(&self) -> ScreenshotMeta {
        ScreenshotMeta {
            mime_type: self.mime_type.clone(),
            size_bytes: self.bytes.len(),
            sha256: self.sha256_hex(),
            source: self.source.as_ref().map(|p| p.display().to_string()),
        }
    }
}

/// Persisted description of a run's input image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotMeta {
    /// Image MIME type.
    pub mime_type: String,
    /// Image size in bytes.
    pub size_bytes: usize,
    /// Hex-encoded SHA-256 digest.
    pub sha256: String,
    /// Source path, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "image/png",
    }
}
