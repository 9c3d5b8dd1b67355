use crate::error::{ErrorKind, Result};
use crate::models::{Listed, ResourceId, ResourceKind};
use exn::ResultExt;
use serde::Deserialize;
use serde_json::Value;

/// A library folder. Folders form a tree through `parent_id`; the backend
/// guarantees the tree is acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Folder {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<ResourceId>,
    #[serde(default, alias = "items_count", alias = "files_count")]
    pub item_count: u64,
}

impl Listed for Folder {
    fn decode(kind: ResourceKind, value: Value) -> Result<Self> {
        serde_json::from_value(value).or_raise(|| ErrorKind::InvalidResponse(format!("malformed {kind} folder")))
    }

    fn id(&self) -> &ResourceId {
        &self.id
    }
}
