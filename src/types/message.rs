//! Gemini content model: turns made of typed parts

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::with_parts(MessageRole::System, vec![Part::text(text)])
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::with_parts(MessageRole::User, vec![Part::text(text)])
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::with_parts(MessageRole::Model, vec![Part::text(text)])
    }

    pub fn with_parts(role: MessageRole, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn contains_image(&self) -> bool {
        self.parts.iter().any(|p| p.is_image())
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Model,
}

/// A single piece of content in Vertex AI wire format.
///
/// Serializes as `{"text": ..}`, `{"fileData": {..}}` or `{"inlineData": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    FileData(FileData),
    InlineData(InlineData),
}

/// Reference to an object stored outside the request (usually `gs://`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

/// Base64 payload embedded in the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Used when the extension says nothing useful.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    /// Reference a remote object. Without an explicit mime type it is
    /// guessed from the extension, falling back to JPEG.
    pub fn from_uri(uri: impl Into<String>, mime_type: Option<String>) -> Self {
        let uri = uri.into();
        let mime_type = mime_type
            .or_else(|| guess_media_type(Path::new(&uri)))
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
        Part::FileData(FileData {
            mime_type,
            file_uri: uri,
        })
    }

    pub fn inline_base64(data: String, mime_type: impl Into<String>) -> Self {
        Part::InlineData(InlineData {
            mime_type: mime_type.into(),
            data,
        })
    }

    pub fn inline_from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let media_type =
            guess_media_type(path).unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(Self::inline_base64(data, media_type))
    }

    /// Resolve a user-supplied image reference: `gs://` and `http(s)://`
    /// become file references, anything else is read as a local file.
    pub fn image_from_reference(reference: &str) -> crate::Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(crate::Error::validation_with_context(
                "image reference is empty",
                crate::ErrorContext::new().with_field_path("image_uri"),
            ));
        }
        if is_remote_uri(reference) {
            Ok(Self::from_uri(reference, None))
        } else {
            Self::inline_from_file(reference)
        }
    }

    pub fn is_image(&self) -> bool {
        let mime = match self {
            Part::Text(_) => return false,
            Part::FileData(f) => &f.mime_type,
            Part::InlineData(d) => &d.mime_type,
        };
        mime.starts_with("image/")
    }
}

fn is_remote_uri(s: &str) -> bool {
    ["gs://", "https://", "http://"]
        .iter()
        .any(|scheme| s.starts_with(scheme))
}

fn guess_media_type(path: &Path) -> Option<String> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mt = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mt.to_string())
}
