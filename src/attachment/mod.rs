//! Prescription attachments: the user-selected file and its transport-sized
//! encoding.

pub mod compress;
pub mod orientation;

pub use compress::*;
pub use orientation::*;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PrescriptionAttachment;

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("Image could not be decoded: {0}")]
    DecodeFailure(String),

    #[error("File is {size} bytes, over the {limit} byte limit")]
    SizeExceeded { size: usize, limit: usize },

    #[error("Image encoding failed: {0}")]
    Encoding(String),

    #[error("Compression task failed: {0}")]
    TaskFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file as the user picked it.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub filename: String,
    /// Declared media type. Decides between the image and passthrough paths.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("filename", &self.filename)
            .field("media_type", &self.media_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl SelectedFile {
    pub fn new(
        filename: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk; the media type is guessed from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let bytes = tokio::fs::read(path).await?;
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            filename,
            media_type,
            bytes,
        })
    }

    /// Whether the declared media type is an image.
    pub fn is_image(&self) -> bool {
        self.media_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl From<SelectedFile> for PrescriptionAttachment {
    fn from(file: SelectedFile) -> Self {
        Self {
            filename: file.filename,
            media_type: file.media_type,
            bytes: file.bytes,
        }
    }
}

/// The encoded attachment ready for the wire.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionResult {
    /// `data:<media>;base64,<payload>` URI.
    pub encoded_payload: String,
    /// Base64 length of the encoded bytes.
    pub estimated_size_bytes: usize,
    /// Output dimensions (images only).
    pub dimensions: Option<(u32, u32)>,
    /// JPEG quality used (images only).
    pub quality: Option<u8>,
}

impl std::fmt::Debug for CompressionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionResult")
            .field("estimated_size_bytes", &self.estimated_size_bytes)
            .field("dimensions", &self.dimensions)
            .field("quality", &self.quality)
            .finish()
    }
}
