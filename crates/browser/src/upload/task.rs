use crate::error::{ErrorKind, Result};
use crate::upload::preview::Preview;
use clipflow_api::models::{ItemStatus, ResourceId};
use clipflow_api::{UploadReceipt, UploadRequest};
use derive_more::Display;

/// Queue-local identifier of an upload task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("#{_0}")]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Where an upload is in its lifecycle.
///
/// ```text
/// queued ──▶ uploading ──▶ processing ──▶ ready
///                 │             │
///                 └──▶ failed ◀─┘
/// ```
///
/// `ready` and `failed` are terminal. Transfer progress reaching 100 does
/// not leave `uploading`; only the server's answer does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Queued,
    Uploading { progress: u8 },
    /// Transferred; the server is still working on it.
    Processing { remote_id: ResourceId },
    Ready { remote_id: ResourceId },
    Failed { progress: u8, reason: String },
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Uploading { .. } => "uploading",
            Self::Processing { .. } => "processing",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Failed { .. })
    }

    /// Transfer progress, 0 to 100.
    pub fn progress(&self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Uploading { progress } | Self::Failed { progress, .. } => *progress,
            Self::Processing { .. } | Self::Ready { .. } => 100,
        }
    }

    pub fn remote_id(&self) -> Option<&ResourceId> {
        match self {
            Self::Processing { remote_id } | Self::Ready { remote_id } => Some(remote_id),
            _ => None,
        }
    }
}

/// One file in the upload queue.
#[derive(Debug)]
pub struct UploadTask {
    id: TaskId,
    request: UploadRequest,
    state: UploadState,
    paused: bool,
    claimed: bool,
    preview: Option<Preview>,
}

impl UploadTask {
    pub(crate) fn new(id: TaskId, request: UploadRequest, preview: Option<Preview>) -> Self {
        Self {
            id,
            request,
            state: UploadState::Queued,
            paused: false,
            claimed: false,
            preview,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.request.file_name
    }

    pub fn destination(&self) -> &str {
        &self.request.destination
    }

    pub fn request(&self) -> &UploadRequest {
        &self.request
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Handed to a dispatcher, transferring, or awaiting server processing.
    pub fn is_in_flight(&self) -> bool {
        self.claimed || matches!(self.state, UploadState::Uploading { .. } | UploadState::Processing { .. })
    }

    pub(crate) fn is_dispatchable(&self) -> bool {
        self.state == UploadState::Queued && !self.paused && !self.claimed
    }

    pub(crate) fn claim(&mut self) {
        self.claimed = true;
    }

    pub(crate) fn take_preview(&mut self) -> Option<Preview> {
        self.preview.take()
    }

    fn invalid(&self, action: &'static str) -> ErrorKind {
        ErrorKind::InvalidTransition {
            task: self.id,
            from: self.state.name(),
            action,
        }
    }

    pub(crate) fn pause(&mut self) -> Result<()> {
        if self.state != UploadState::Queued {
            exn::bail!(self.invalid("pause"));
        }
        if self.claimed {
            exn::bail!(ErrorKind::InFlight(self.id));
        }
        self.paused = true;
        Ok(())
    }

    pub(crate) fn resume(&mut self) -> Result<()> {
        if self.state != UploadState::Queued {
            exn::bail!(self.invalid("resume"));
        }
        self.paused = false;
        Ok(())
    }

    pub(crate) fn start(&mut self) -> Result<()> {
        if self.state != UploadState::Queued {
            exn::bail!(self.invalid("start"));
        }
        self.claimed = false;
        self.paused = false;
        self.state = UploadState::Uploading { progress: 0 };
        Ok(())
    }

    /// Record transfer progress. Lower values than already seen are ignored.
    pub(crate) fn progress(&mut self, percent: u8) -> Result<()> {
        if let UploadState::Uploading { progress } = &mut self.state {
            *progress = (*progress).max(percent.min(100));
            return Ok(());
        }
        exn::bail!(self.invalid("report progress"));
    }

    /// Apply the server's answer to a finished transfer.
    pub(crate) fn uploaded(&mut self, receipt: UploadReceipt) -> Result<()> {
        if !matches!(self.state, UploadState::Uploading { .. }) {
            exn::bail!(self.invalid("complete"));
        }
        self.state = match receipt.status {
            ItemStatus::Ready => UploadState::Ready { remote_id: receipt.id },
            ItemStatus::Processing | ItemStatus::Pending => UploadState::Processing { remote_id: receipt.id },
            ItemStatus::Failed => UploadState::Failed {
                progress: 100,
                reason: "The server could not process this file.".to_string(),
            },
        };
        Ok(())
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        let progress = match &self.state {
            UploadState::Uploading { progress } => *progress,
            UploadState::Processing { .. } => 100,
            _ => exn::bail!(self.invalid("fail")),
        };
        self.state = UploadState::Failed {
            progress,
            reason: reason.into(),
        };
        Ok(())
    }

    /// Promote a processing task once the server reports the item settled.
    /// Returns `true` if the task reached a terminal state.
    pub(crate) fn settle(&mut self, status: ItemStatus) -> bool {
        let UploadState::Processing { remote_id } = &self.state else {
            return false;
        };
        self.state = match status {
            ItemStatus::Ready => UploadState::Ready {
                remote_id: remote_id.clone(),
            },
            ItemStatus::Failed => UploadState::Failed {
                progress: 100,
                reason: "The server could not process this file.".to_string(),
            },
            ItemStatus::Processing | ItemStatus::Pending => return false,
        };
        true
    }
}
