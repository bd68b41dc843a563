//! Image payloads and the per-document resolution store

use super::placeholder::PlaceholderId;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A self-contained renderable image reference
///
/// Either an inline `data:` URL or an external URL. Never a file handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePayload(String);

impl ImagePayload {
    /// Wrap a reference that is already renderable (URL or data URL)
    pub fn from_reference(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Encode raw image bytes as a base64 data URL
    ///
    /// # Parameters
    /// * `bytes` - Raw image file content
    ///
    /// # Returns
    /// * `ImagePayload` - `data:<mime>;base64,<data>` with the MIME type sniffed from the bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(format!(
            "data:{};base64,{}",
            sniff_mime(bytes),
            STANDARD.encode(bytes)
        ))
    }

    /// The reference as inserted into documents
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the image bytes are carried inline
    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl fmt::Display for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Determine the MIME type of image bytes
///
/// Every format `imagesize` recognises maps to an `image/*` type so that
/// inline payloads survive the preview's data URL filter. SVG is recognised
/// by its leading markup. Anything else is `application/octet-stream`.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if let Ok(image_type) = imagesize::image_type(bytes) {
        if let Some(mime) = raster_mime(image_type) {
            return mime;
        }
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        "image/svg+xml"
    } else {
        "application/octet-stream"
    }
}

fn raster_mime(image_type: imagesize::ImageType) -> Option<&'static str> {
    use imagesize::{Compression, ImageType};

    let mime = match image_type {
        ImageType::Png => "image/png",
        ImageType::Jpeg => "image/jpeg",
        ImageType::Gif => "image/gif",
        ImageType::Webp => "image/webp",
        ImageType::Bmp => "image/bmp",
        ImageType::Ico => "image/x-icon",
        ImageType::Tiff => "image/tiff",
        ImageType::Heif(Compression::Av1) => "image/avif",
        ImageType::Heif(_) => "image/heic",
        ImageType::Jxl => "image/jxl",
        ImageType::Qoi => "image/qoi",
        ImageType::Tga => "image/x-tga",
        ImageType::Psd => "image/vnd.adobe.photoshop",
        ImageType::Pnm => "image/x-portable-anymap",
        ImageType::Hdr => "image/vnd.radiance",
        ImageType::Exr => "image/x-exr",
        ImageType::Dds => "image/vnd-ms.dds",
        ImageType::Ktx2 => "image/ktx2",
        ImageType::Farbfeld => "image/x-farbfeld",
        ImageType::Aseprite => "image/x-aseprite",
        ImageType::Vtf => "image/x-vtf",
        ImageType::Ilbm => "image/x-ilbm",
        _ => return None,
    };
    Some(mime)
}

/// Sparse mapping from placeholder id to its resolved image
///
/// Writes are last-write-wins with no history. The store lives only as long
/// as the document it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageStore {
    images: HashMap<PlaceholderId, ImagePayload>,
}

impl ImageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a placeholder, overwriting any earlier resolution
    pub fn set(&mut self, id: PlaceholderId, payload: ImagePayload) {
        self.images.insert(id, payload);
    }

    /// Current resolution for an id, `None` when unresolved
    pub fn get(&self, id: &str) -> Option<&ImagePayload> {
        self.images.get(id)
    }

    /// Whether the id has a resolution
    pub fn is_resolved(&self, id: &str) -> bool {
        self.images.contains_key(id)
    }

    /// Number of resolved placeholders
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether nothing is resolved yet
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Drop every resolution (used when a new document replaces the old one)
    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Keep only the resolutions whose id satisfies the predicate
    pub fn retain<F: FnMut(&PlaceholderId) -> bool>(&mut self, mut keep: F) {
        self.images.retain(|id, _| keep(id));
    }

    /// Iterate over resolutions in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&PlaceholderId, &ImagePayload)> {
        self.images.iter()
    }
}
