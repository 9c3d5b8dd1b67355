use crate::error::{ErrorKind, Result};
use crate::models::{ItemStatus, Listed, ResourceId, ResourceKind};
use exn::ResultExt;
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

/// A row of a resource library (footage clip, track, image, overlay, ...).
///
/// The client only ever holds the rows of the page currently on screen; the
/// backend remains the owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ResourceId,
    pub name: String,
    pub status: ItemStatus,
    pub media_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size_bytes: Option<u64>,
    pub folder_id: Option<ResourceId>,
    pub created_at: Option<OffsetDateTime>,
}

/// Item as it is spelled on the wire, before the status is resolved.
#[derive(Debug, Deserialize)]
struct WireItem {
    id: ResourceId,
    #[serde(alias = "filename", alias = "file_name", alias = "title")]
    name: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "url", alias = "file_url")]
    media_url: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default, alias = "size", alias = "file_size")]
    size_bytes: Option<u64>,
    #[serde(default)]
    folder_id: Option<ResourceId>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
}

impl Item {
    /// `width x height`, when both are known.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

impl Listed for Item {
    fn decode(kind: ResourceKind, value: Value) -> Result<Self> {
        let wire: WireItem =
            serde_json::from_value(value).or_raise(|| ErrorKind::InvalidResponse(format!("malformed {kind} item")))?;
        let status = match wire.status.as_deref() {
            // Rows without a status are plain records; nothing is pending on them.
            None => ItemStatus::Ready,
            Some(raw) => ItemStatus::from_wire(kind, raw).unwrap_or_else(|| {
                tracing::warn!(%kind, id = %wire.id, status = raw, "Unknown item status; treating as pending");
                ItemStatus::Pending
            }),
        };
        Ok(Self {
            id: wire.id,
            name: wire.name,
            status,
            media_url: wire.media_url,
            width: wire.width,
            height: wire.height,
            size_bytes: wire.size_bytes,
            folder_id: wire.folder_id,
            created_at: wire.created_at,
        })
    }

    fn id(&self) -> &ResourceId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_footage_row() {
        let item = Item::decode(
            ResourceKind::Footage,
            json!({
                "id": 12,
                "filename": "beach.mp4",
                "status": "NEW",
                "url": "https://cdn.example.com/beach.mp4",
                "width": 1920,
                "height": 1080,
                "file_size": 1048576,
                "folder_id": "7",
                "created_at": "2026-03-01T10:00:00Z"
            }),
        )
        .unwrap();
        assert_eq!(item.id, ResourceId::from(12u64));
        assert_eq!(item.name, "beach.mp4");
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.dimensions(), Some((1920, 1080)));
        assert_eq!(item.size_bytes, Some(1_048_576));
        assert_eq!(item.folder_id, Some(ResourceId::from("7")));
        assert_eq!(item.created_at.map(|t| t.year()), Some(2026));
    }

    #[test]
    fn missing_status_means_ready() {
        let item = Item::decode(ResourceKind::Plans, json!({"id": "pro", "name": "Pro"})).unwrap();
        assert_eq!(item.status, ItemStatus::Ready);
        assert_eq!(item.dimensions(), None);
    }

    #[test]
    fn unknown_status_is_pending() {
        let item = Item::decode(ResourceKind::Bgm, json!({"id": 1, "name": "song", "status": "mystery"})).unwrap();
        assert_eq!(item.status, ItemStatus::Pending);
    }

    #[test]
    fn malformed_row_is_invalid_response() {
        let err = Item::decode(ResourceKind::Images, json!({"name": "no id"})).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidResponse(_)));
    }
}
