//! Typed views of the rows served by the collection endpoints.

mod folder;
mod id;
mod item;
mod kind;
mod profile;
mod status;

pub use self::folder::Folder;
pub use self::id::ResourceId;
pub use self::item::Item;
pub use self::kind::{Action, ResourceKind};
pub use self::profile::{Profile, Role};
pub use self::status::{ItemStatus, wire_table};
use crate::error::Result;
use serde_json::Value;

/// A row type that can be decoded from a collection listing.
///
/// Decoding is kind-aware because the same JSON shape means different things
/// in different collections (status spellings in particular).
pub trait Listed: Sized {
    fn decode(kind: ResourceKind, value: Value) -> Result<Self>;
    fn id(&self) -> &ResourceId;
}
