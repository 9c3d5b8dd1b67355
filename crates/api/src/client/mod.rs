//! Resource client trait and implementations.
//!
//! This module defines the `ResourceClient` trait, which provides a unified
//! interface over the backend's paginated collection endpoints, regardless
//! of whether the collection lives behind HTTP or in memory (tests).

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "http")]
pub use self::http::HttpClient;
#[cfg(feature = "mock")]
pub use self::mock::{MockClient, MockUpload};
use crate::envelope::Page;
use crate::error::Result;
use crate::models::{Listed, Profile, ResourceId, ResourceKind};
use crate::query::ListQuery;
use crate::upload::{ProgressReporter, UploadReceipt, UploadRequest};
use async_trait::async_trait;
use serde_json::Value;

/// Unified interface for the backend's collection endpoints.
///
/// Rows travel as raw JSON [`Value`]s at this seam so that the trait stays
/// object safe; use [`list_typed()`] or [`Listed::decode`] to get typed rows.
///
/// Every method reports failures in one of the shapes described on
/// [`ErrorKind`](crate::error::ErrorKind): validation, business rejection or
/// transport. Callers decide which of those to show inline and which to toast.
///
/// # Examples
///
/// ```
/// use clipflow_api::{ClientHandle, Filters, ListQuery, error::Result, list_typed};
/// use clipflow_api::models::{Item, ResourceKind};
///
/// async fn first_page_names(client: &ClientHandle) -> Result<Vec<String>> {
///     let query = ListQuery::new(1, 15, Filters::default().with_search("beach"));
///     let page = list_typed::<Item>(client.as_ref(), ResourceKind::Footage, &query).await?;
///     Ok(page.items.into_iter().map(|item| item.name).collect())
/// }
/// ```
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Name of the configured client (used for logging only).
    fn name(&self) -> &str;

    /// The signed-in user, their role and permission slugs.
    async fn profile(&self) -> Result<Profile>;

    /// Fetch one page of a collection.
    ///
    /// A page beyond the last one is not an error: the backend answers with
    /// no rows and pagination metadata describing the real last page.
    async fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<Page<Value>>;

    /// Create a row. Returns the created row as the server echoes it back.
    async fn create(&self, kind: ResourceKind, payload: &Value) -> Result<Value>;

    /// Partially update a row (`PATCH` semantics).
    async fn update(&self, kind: ResourceKind, id: &ResourceId, payload: &Value) -> Result<Value>;

    /// Delete a row. `hard` skips the backend's trash, where it has one.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the row
    /// does not exist.
    async fn delete(&self, kind: ResourceKind, id: &ResourceId, hard: bool) -> Result<()>;

    /// Upload a file into a collection, reporting transfer progress.
    ///
    /// # Notes
    /// - Progress reaching 100 only means the bytes left the client. The
    ///   returned [`UploadReceipt`] is the only confirmation of success, and
    ///   its status may still be `processing`.
    /// - Progress values passed to `progress` never decrease.
    async fn upload(&self, kind: ResourceKind, request: &UploadRequest, progress: ProgressReporter)
    -> Result<UploadReceipt>;
}

/// Fetch one page and decode the rows into `T`.
pub async fn list_typed<T: Listed>(
    client: &dyn ResourceClient,
    kind: ResourceKind,
    query: &ListQuery,
) -> Result<Page<T>> {
    client.list(kind, query).await?.decode(kind)
}
