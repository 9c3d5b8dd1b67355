//! Local previews of files that have not finished uploading.
//!
//! A preview is a handle on some platform resource (a browser object URL, a
//! temporary file, a decoded thumbnail) that must be released exactly once.
//! [`Preview`] releases it when dropped, so removing a task, clearing the
//! queue and dropping the queue all revoke without further bookkeeping.

use derive_more::Display;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

/// Address of a local preview, e.g. `blob:...` or a file path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Platform hook that creates and releases previews.
pub trait PreviewRegistry: Send + Sync {
    /// Create a preview for a file, or `None` if the file cannot be previewed.
    fn create(&self, file_name: &str, bytes: &[u8]) -> Option<PreviewUrl>;

    /// Release a preview created by [`create`](Self::create).
    fn revoke(&self, url: &PreviewUrl);
}

/// Registry for front ends without previews.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreviews;

impl PreviewRegistry for NoPreviews {
    fn create(&self, _file_name: &str, _bytes: &[u8]) -> Option<PreviewUrl> {
        None
    }

    fn revoke(&self, _url: &PreviewUrl) {}
}

/// An owned preview, revoked on drop.
pub struct Preview {
    url: PreviewUrl,
    registry: Arc<dyn PreviewRegistry>,
}

impl Preview {
    pub fn acquire(registry: &Arc<dyn PreviewRegistry>, file_name: &str, bytes: &[u8]) -> Option<Self> {
        let url = registry.create(file_name, bytes)?;
        tracing::trace!(%url, file = file_name, "Preview created");
        Some(Self {
            url,
            registry: registry.clone(),
        })
    }

    pub fn url(&self) -> &PreviewUrl {
        &self.url
    }
}

impl Drop for Preview {
    fn drop(&mut self) {
        tracing::trace!(url = %self.url, "Preview revoked");
        self.registry.revoke(&self.url);
    }
}

impl Debug for Preview {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_tuple("Preview").field(&self.url).finish()
    }
}
