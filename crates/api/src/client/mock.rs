//! In-memory resource client for testing.

use crate::client::ResourceClient;
use crate::envelope::{Page, Pagination};
use crate::error::{ErrorKind, FieldErrors, Result};
use crate::models::{ItemStatus, Profile, ResourceId, ResourceKind};
use crate::query::ListQuery;
use crate::upload::{ProgressReporter, UploadReceipt, UploadRequest};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Scripted outcome of an upload, keyed by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockUpload {
    /// Report progress up to 100 and hand out `id` with `status`.
    Succeed { id: ResourceId, status: ItemStatus },
    /// Report progress up to `percent`, then reject with `message`.
    FailAt { percent: u8, message: String },
}

/// In-memory resource client for testing.
///
/// Rows are stored per [`ResourceKind`] as JSON objects behind a [`RwLock`],
/// so all trait methods can operate on `&self` without external
/// synchronisation. Listing honours the `status`, `folder_id`, `user_id` and
/// `search` filters and paginates like the real backend. Every list query is
/// recorded so tests can assert on what was asked for.
///
/// # Examples
///
/// ```
/// use clipflow_api::client::MockClient;
/// use clipflow_api::models::ResourceKind;
/// use clipflow_api::{Filters, ListQuery, ResourceClient};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> clipflow_api::error::Result<()> {
/// let client = MockClient::default().with_items(ResourceKind::Bgm, [
///     json!({"name": "intro.mp3", "status": "ready"}),
///     json!({"name": "outro.mp3", "status": "processing"}),
/// ]);
/// let page = client.list(ResourceKind::Bgm, &ListQuery::new(1, 15, Filters::default())).await?;
/// assert_eq!(page.pagination.total, 2);
/// # Ok(())
/// # }
/// ```
pub struct MockClient {
    name: String,
    profile: Profile,
    rows: RwLock<HashMap<ResourceKind, Vec<Map<String, Value>>>>,
    uploads: RwLock<HashMap<String, MockUpload>>,
    queries: RwLock<Vec<(ResourceKind, ListQuery)>>,
    deletions: RwLock<Vec<(ResourceKind, ResourceId, bool)>>,
    fail_next: RwLock<Option<ErrorKind>>,
    next_id: AtomicU64,
}

impl MockClient {
    /// Add rows to a collection. Rows without an `id` get one assigned.
    ///
    /// Panics if a row is not a JSON object. If test setup is wrong, then
    /// test should not pass.
    pub fn with_items(mut self, kind: ResourceKind, rows: impl IntoIterator<Item = Value>) -> Self {
        let mut assigned = Vec::new();
        for row in rows {
            let Value::Object(mut row) = row else {
                panic!("MockClient::with_items: rows must be JSON objects");
            };
            if !row.contains_key("id") {
                row.insert("id".to_string(), Value::from(self.allocate_id()));
            }
            assigned.push(row);
        }
        self.rows.get_mut().entry(kind).or_default().extend(assigned);
        self
    }

    /// Add `count` ready rows named `{prefix}-{n}` (1-based).
    pub fn with_generated(self, kind: ResourceKind, prefix: &str, count: usize) -> Self {
        let status = ItemStatus::Ready.to_wire(kind);
        let rows: Vec<Value> = (1..=count)
            .map(|n| serde_json::json!({"name": format!("{prefix}-{n}"), "status": status}))
            .collect();
        self.with_items(kind, rows)
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Script the outcome of uploading `file_name`.
    pub fn with_upload(mut self, file_name: impl Into<String>, outcome: MockUpload) -> Self {
        self.uploads.get_mut().insert(file_name.into(), outcome);
        self
    }

    /// Change the name of the mock client.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make the next call (of any kind) fail with `error`.
    pub async fn fail_next(&self, error: ErrorKind) {
        *self.fail_next.write().await = Some(error);
    }

    /// Every list query received so far, oldest first.
    pub async fn queries(&self) -> Vec<(ResourceKind, ListQuery)> {
        self.queries.read().await.clone()
    }

    /// Every successful deletion so far, oldest first.
    pub async fn deletions(&self) -> Vec<(ResourceKind, ResourceId, bool)> {
        self.deletions.read().await.clone()
    }

    /// Number of rows currently stored in a collection.
    pub async fn count(&self, kind: ResourceKind) -> usize {
        self.rows.read().await.get(&kind).map_or(0, Vec::len)
    }

    /// Overwrite a stored row's status (simulates server-side processing).
    pub async fn set_status(&self, kind: ResourceKind, id: &ResourceId, status: ItemStatus) {
        let mut guard = self.rows.write().await;
        if let Some(row) = guard.get_mut(&kind).and_then(|rows| rows.iter_mut().find(|row| row_id(row) == *id)) {
            row.insert("status".to_string(), Value::from(status.to_wire(kind)));
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn take_failure(&self) -> Result<()> {
        match self.fail_next.write().await.take() {
            Some(error) => exn::bail!(error),
            None => Ok(()),
        }
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            profile: Profile::new("1", "Mock User", Default::default()).with_all_permissions(),
            rows: RwLock::new(HashMap::new()),
            uploads: RwLock::new(HashMap::new()),
            queries: RwLock::new(Vec::new()),
            deletions: RwLock::new(Vec::new()),
            fail_next: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }
}

fn row_id(row: &Map<String, Value>) -> ResourceId {
    row.get("id")
        .cloned()
        .and_then(|id| serde_json::from_value(id).ok())
        .unwrap_or_else(|| ResourceId::new(""))
}

fn row_field_id(row: &Map<String, Value>, field: &str) -> Option<ResourceId> {
    row.get(field).cloned().and_then(|id| serde_json::from_value(id).ok())
}

fn matches(kind: ResourceKind, row: &Map<String, Value>, query: &ListQuery) -> bool {
    let filters = &query.filters;
    if let Some(status) = filters.status {
        let row_status = row.get("status").and_then(Value::as_str).and_then(|raw| ItemStatus::from_wire(kind, raw));
        if row_status != Some(status) {
            return false;
        }
    }
    if filters.folder_id.is_some() && row_field_id(row, "folder_id") != filters.folder_id {
        return false;
    }
    if filters.user_id.is_some() && row_field_id(row, "user_id") != filters.user_id {
        return false;
    }
    if let Some(search) = &filters.search {
        let name = row.get("name").and_then(Value::as_str).unwrap_or_default();
        if !name.to_lowercase().contains(&search.to_lowercase()) {
            return false;
        }
    }
    true
}

#[async_trait]
impl ResourceClient for MockClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn profile(&self) -> Result<Profile> {
        self.take_failure().await?;
        Ok(self.profile.clone())
    }

    async fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<Page<Value>> {
        self.queries.write().await.push((kind, query.clone()));
        self.take_failure().await?;
        let guard = self.rows.read().await;
        let matching: Vec<&Map<String, Value>> =
            guard.get(&kind).into_iter().flatten().filter(|row| matches(kind, row, query)).collect();
        let pagination = Pagination::for_total(matching.len() as u64, query.per_page, query.page);
        let start = (query.page as usize - 1).saturating_mul(query.per_page as usize);
        let items = matching
            .into_iter()
            .skip(start)
            .take(query.per_page as usize)
            .map(|row| Value::Object(row.clone()))
            .collect();
        Ok(Page { items, pagination })
    }

    async fn create(&self, kind: ResourceKind, payload: &Value) -> Result<Value> {
        self.take_failure().await?;
        let Some(fields) = payload.as_object() else {
            exn::bail!(ErrorKind::InvalidRequest("payload must be an object".to_string()));
        };
        let name = fields.get("name").and_then(Value::as_str).unwrap_or_default();
        if name.trim().is_empty() {
            exn::bail!(ErrorKind::Validation(FieldErrors::new().with("name", "The name field is required.")));
        }
        let mut row = fields.clone();
        row.insert("id".to_string(), Value::from(self.allocate_id()));
        row.entry("status").or_insert_with(|| Value::from(ItemStatus::Ready.to_wire(kind)));
        self.rows.write().await.entry(kind).or_default().push(row.clone());
        Ok(Value::Object(row))
    }

    async fn update(&self, kind: ResourceKind, id: &ResourceId, payload: &Value) -> Result<Value> {
        self.take_failure().await?;
        let Some(fields) = payload.as_object() else {
            exn::bail!(ErrorKind::InvalidRequest("payload must be an object".to_string()));
        };
        if fields.get("name").and_then(Value::as_str).is_some_and(|name| name.trim().is_empty()) {
            exn::bail!(ErrorKind::Validation(FieldErrors::new().with("name", "The name field is required.")));
        }
        let mut guard = self.rows.write().await;
        let row = guard
            .get_mut(&kind)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == *id))
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(format!("{kind}/{id}"))))?;
        for (key, value) in fields {
            if key != "id" {
                row.insert(key.clone(), value.clone());
            }
        }
        Ok(Value::Object(row.clone()))
    }

    async fn delete(&self, kind: ResourceKind, id: &ResourceId, hard: bool) -> Result<()> {
        self.take_failure().await?;
        let mut guard = self.rows.write().await;
        let rows = guard.entry(kind).or_default();
        let position = rows
            .iter()
            .position(|row| row_id(row) == *id)
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(format!("{kind}/{id}"))))?;
        rows.remove(position);
        self.deletions.write().await.push((kind, id.clone(), hard));
        Ok(())
    }

    async fn upload(
        &self,
        kind: ResourceKind,
        request: &UploadRequest,
        progress: ProgressReporter,
    ) -> Result<UploadReceipt> {
        self.take_failure().await?;
        if !kind.accepts_uploads() {
            exn::bail!(ErrorKind::InvalidRequest(format!("{kind} does not accept uploads")));
        }
        let scripted = self.uploads.read().await.get(&request.file_name).cloned();
        let (id, status) = match scripted {
            Some(MockUpload::FailAt { percent, message }) => {
                for step in (0..=percent).step_by(20).chain([percent]) {
                    progress.percent(step);
                }
                exn::bail!(ErrorKind::Rejected(message));
            },
            Some(MockUpload::Succeed { id, status }) => (id, status),
            None => (ResourceId::from(self.allocate_id()), ItemStatus::Ready),
        };
        for step in [0, 25, 50, 75, 100] {
            progress.percent(step);
        }
        let mut row = Map::new();
        row.insert("id".to_string(), serde_json::to_value(&id).unwrap_or(Value::Null));
        row.insert("name".to_string(), Value::from(request.file_name.clone()));
        row.insert("status".to_string(), Value::from(status.to_wire(kind)));
        row.insert("path".to_string(), Value::from(request.destination.clone()));
        row.insert("size".to_string(), Value::from(request.size()));
        self.rows.write().await.entry(kind).or_default().push(row);
        Ok(UploadReceipt { id, status })
    }
}
