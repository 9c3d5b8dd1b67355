use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// A paginated collection exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// Stock video footage library.
    Footage,
    /// Background music tracks.
    Bgm,
    /// Folders grouping background music tracks.
    BgmFolders,
    /// Still images.
    Images,
    /// Video overlays composited on top of generated clips.
    VideoOverlays,
    /// Image overlays (watermarks, frames).
    ImageOverlays,
    /// Files uploaded through the media-upload module.
    Media,
    /// Folders of the media-upload module.
    MediaFolders,
    SupportTickets,
    Plans,
    Customers,
}

/// What a user is trying to do with a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Upload,
    Manage,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Upload => "upload",
            Action::Manage => "manage",
            Action::Delete => "delete",
        }
    }
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 11] = [
        Self::Footage,
        Self::Bgm,
        Self::BgmFolders,
        Self::Images,
        Self::VideoOverlays,
        Self::ImageOverlays,
        Self::Media,
        Self::MediaFolders,
        Self::SupportTickets,
        Self::Plans,
        Self::Customers,
    ];

    /// Path segment of the collection endpoint, relative to the API root.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Footage => "footage",
            Self::Bgm => "bgm",
            Self::BgmFolders => "bgm-folders",
            Self::Images => "images",
            Self::VideoOverlays => "video-overlays",
            Self::ImageOverlays => "image-overlays",
            Self::Media => "media",
            Self::MediaFolders => "media-folders",
            Self::SupportTickets => "support-tickets",
            Self::Plans => "plans",
            Self::Customers => "customers",
        }
    }

    /// Collections that accept file uploads.
    pub fn accepts_uploads(&self) -> bool {
        matches!(
            self,
            Self::Footage | Self::Bgm | Self::Images | Self::VideoOverlays | Self::ImageOverlays | Self::Media
        )
    }

    /// Collections whose rows are folders rather than items.
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::BgmFolders | Self::MediaFolders)
    }

    /// Permission slug gating `action` on this collection, e.g. `footage.upload`.
    pub fn permission(&self, action: Action) -> String {
        format!("{}.{}", self.path(), action.as_str())
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.path())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.path() == normalized)
            .ok_or_else(|| exn::Exn::from(ErrorKind::InvalidRequest(format!("unknown resource kind: {s}"))))
    }
}
