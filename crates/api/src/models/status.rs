use crate::error::{Error, ErrorKind};
use crate::models::ResourceKind;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Lifecycle status of a resource item, unified across collections.
///
/// Each backend collection spells its statuses differently (`"READY"` vs
/// `"ready"`, `"NEW"` vs `"pending"`, ...). The spelling is resolved once, at
/// the edge, through the per-kind tables in [`wire_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemStatus {
    Ready,
    Processing,
    Pending,
    Failed,
}

type Table = &'static [(&'static str, ItemStatus)];

// The first entry for a status is the spelling used when filtering.
const SHOUTING: Table = &[
    ("READY", ItemStatus::Ready),
    ("PROCESSING", ItemStatus::Processing),
    ("NEW", ItemStatus::Pending),
    ("FAILED", ItemStatus::Failed),
    ("ERROR", ItemStatus::Failed),
];
const LOWERCASE: Table = &[
    ("ready", ItemStatus::Ready),
    ("completed", ItemStatus::Ready),
    ("processing", ItemStatus::Processing),
    ("uploading", ItemStatus::Processing),
    ("pending", ItemStatus::Pending),
    ("queued", ItemStatus::Pending),
    ("failed", ItemStatus::Failed),
];
const TICKETS: Table = &[
    ("closed", ItemStatus::Ready),
    ("resolved", ItemStatus::Ready),
    ("in_progress", ItemStatus::Processing),
    ("open", ItemStatus::Pending),
    ("rejected", ItemStatus::Failed),
];
const ACCOUNTS: Table = &[
    ("active", ItemStatus::Ready),
    ("trialing", ItemStatus::Processing),
    ("inactive", ItemStatus::Pending),
    ("suspended", ItemStatus::Failed),
];

/// Mapping between backend spellings and [`ItemStatus`] for one collection.
pub fn wire_table(kind: ResourceKind) -> &'static [(&'static str, ItemStatus)] {
    match kind {
        ResourceKind::Footage | ResourceKind::VideoOverlays => SHOUTING,
        ResourceKind::Bgm
        | ResourceKind::BgmFolders
        | ResourceKind::Images
        | ResourceKind::ImageOverlays
        | ResourceKind::Media
        | ResourceKind::MediaFolders => LOWERCASE,
        ResourceKind::SupportTickets => TICKETS,
        ResourceKind::Plans | ResourceKind::Customers => ACCOUNTS,
    }
}

impl ItemStatus {
    /// Resolve a backend spelling for the given collection.
    ///
    /// Exact matches win; otherwise the table is searched case-insensitively
    /// so that a collection switching between `"READY"` and `"ready"` does not
    /// break the client.
    pub fn from_wire(kind: ResourceKind, raw: &str) -> Option<Self> {
        let table = wire_table(kind);
        let raw = raw.trim();
        table
            .iter()
            .find(|(wire, _)| *wire == raw)
            .or_else(|| table.iter().find(|(wire, _)| wire.eq_ignore_ascii_case(raw)))
            .map(|(_, status)| *status)
    }

    /// Spelling the given collection expects, e.g. in a `status` filter.
    pub fn to_wire(&self, kind: ResourceKind) -> &'static str {
        wire_table(kind)
            .iter()
            .find(|(_, status)| status == self)
            .map(|(wire, _)| *wire)
            // Every table covers every status; this is unreachable in practice.
            .unwrap_or(self.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Ready => "ready",
            ItemStatus::Processing => "processing",
            ItemStatus::Pending => "pending",
            ItemStatus::Failed => "failed",
        }
    }

    /// `ready` and `failed` never change again without user action.
    pub fn is_settled(&self) -> bool {
        matches!(self, ItemStatus::Ready | ItemStatus::Failed)
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "ready" => Self::Ready,
            "processing" => Self::Processing,
            "pending" => Self::Pending,
            "failed" => Self::Failed,
            _ => exn::bail!(ErrorKind::InvalidRequest(format!("unknown status: {s}"))),
        })
    }
}
