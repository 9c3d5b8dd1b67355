//! Upload requests, receipts and progress reporting.

use crate::models::{ItemStatus, ResourceId};
use bytes::Bytes;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;

/// A file to send to an upload endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    /// File contents. Cheap to clone; chunks sent on the wire share this buffer.
    pub bytes: Bytes,
    /// Destination path inside the library, e.g. `summer/drone`.
    pub destination: String,
}

impl UploadRequest {
    /// Build a request, guessing the content type from the file extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, destination: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes: Bytes::from(bytes),
            destination: destination.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Split the contents into chunks of at most `size` bytes without
    /// copying them.
    pub fn chunks(&self, size: usize) -> Vec<Bytes> {
        let size = size.max(1);
        (0..self.bytes.len())
            .step_by(size)
            .map(|start| self.bytes.slice(start..self.bytes.len().min(start + size)))
            .collect()
    }
}

// The bytes can be hundreds of megabytes; never dump them into logs.
impl Debug for UploadRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadRequest")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .field("destination", &self.destination)
            .finish()
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// What the server said about an upload it accepted.
///
/// `status` is usually [`ItemStatus::Ready`], but media that needs
/// server-side work (transcoding, waveform extraction) comes back as
/// [`ItemStatus::Processing`] and only becomes ready later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub id: ResourceId,
    pub status: ItemStatus,
}

/// Callback receiving transfer progress as a percentage (0–100).
///
/// Cheap to clone; all clones feed the same callback.
#[derive(Clone)]
pub struct ProgressReporter(Arc<dyn Fn(u8) + Send + Sync>);

impl ProgressReporter {
    pub fn new(callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    /// Reporter that discards everything.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn percent(&self, percent: u8) {
        (self.0)(percent.min(100));
    }

    /// Report `transferred` out of `total` bytes. An empty body counts as done.
    pub fn bytes(&self, transferred: u64, total: u64) {
        let percent = match total {
            0 => 100,
            _ => (transferred.min(total) * 100 / total) as u8,
        };
        self.percent(percent);
    }
}

impl Debug for ProgressReporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("ProgressReporter")
    }
}
