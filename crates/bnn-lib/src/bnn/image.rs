//! Image payloads as stored in sessions and exchanged with the image API

use crate::primitives::SessionError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MIME: &str = "image/png";

/// Base64 image bytes with their MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    /// Encode raw bytes; the MIME type is sniffed, then guessed from `hint`
    pub fn from_bytes(bytes: &[u8], hint: Option<&Path>) -> Self {
        let mime_type = sniff_mime(bytes)
            .or_else(|| hint.and_then(mime_for_path))
            .unwrap_or(DEFAULT_MIME);
        Self {
            mime_type: mime_type.to_string(),
            data: BASE64.encode(bytes),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, SessionError> {
        let bytes = fs::read(path).map_err(|e| SessionError::ImageRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::from_bytes(&bytes, Some(path)))
    }

    pub fn decode(&self) -> Result<Vec<u8>, SessionError> {
        BASE64
            .decode(self.data.trim().as_bytes())
            .map_err(|e| SessionError::InvalidImageData {
                reason: e.to_string(),
            })
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }

    /// Decode and write to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let bytes = self.decode()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SessionError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(path, bytes).map_err(|e| SessionError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Original input of a session: a file reference or embedded bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    Path { path: PathBuf },
    Embedded(ImagePayload),
}

impl ImageSource {
    /// Payload to send upstream, reading the file for path references
    pub fn to_payload(&self) -> Result<ImagePayload, SessionError> {
        match self {
            ImageSource::Path { path } => ImagePayload::from_path(path),
            ImageSource::Embedded(payload) => Ok(payload.clone()),
        }
    }
}

impl From<ImagePayload> for ImageSource {
    fn from(payload: ImagePayload) -> Self {
        ImageSource::Embedded(payload)
    }
}

/// MIME type from magic bytes
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

/// Pixel size read from a PNG or GIF header
pub fn dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    match sniff_mime(bytes)? {
        "image/png" if bytes.len() >= 24 && &bytes[12..16] == b"IHDR" => {
            let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
            let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
            Some((width, height))
        }
        "image/gif" if bytes.len() >= 10 => {
            let width = u16::from_le_bytes(bytes[6..8].try_into().ok()?);
            let height = u16::from_le_bytes(bytes[8..10].try_into().ok()?);
            Some((u32::from(width), u32::from(height)))
        }
        _ => None,
    }
}

/// MIME type from the file extension
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    let lowered = mime.to_ascii_lowercase();
    if lowered.contains("jpeg") || lowered.contains("jpg") {
        "jpg"
    } else if lowered.contains("webp") {
        "webp"
    } else if lowered.contains("gif") {
        "gif"
    } else {
        "png"
    }
}

#[cfg(test)]
mod tests {
    include!("image.test.rs");
}
