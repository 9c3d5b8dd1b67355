//! The page container: one collection, one page at a time.

use crate::error::{ErrorKind, Result};
use crate::paginate::Paginator;
use crate::selection::Selection;
use crate::session::{Access, NoticeLevel, SessionHandle};
use crate::upload::preview::PreviewRegistry;
use crate::upload::{TaskId, UploadEvent, UploadQueue, UploadState, dispatch};
use crate::{DEFAULT_PER_PAGE, DEFAULT_UPLOAD_CONCURRENCY};
use clipflow_api::error::Result as ApiResult;
use clipflow_api::models::{Action, Item, Listed, ResourceId, ResourceKind};
use clipflow_api::{ClientHandle, Filters, ListQuery, Page, UploadRequest, list_typed};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;

/// List requests per reload before a page that keeps moving is given up on.
const MAX_LOAD_ATTEMPTS: usize = 3;

/// What the page body should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet.
    Idle,
    Loading,
    Loaded,
    /// The last fetch failed; the message is user-facing. Retry is manual.
    Failed(String),
}

/// Snapshot of a list request, handed out by [`Browser::begin_load`].
///
/// Only the most recently issued ticket may update the browser; responses
/// carrying an older one are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    query: ListQuery,
}

impl LoadTicket {
    pub fn query(&self) -> &ListQuery {
        &self.query
    }
}

/// Result of feeding a response to [`Browser::finish_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer request was issued meanwhile; nothing changed.
    Stale,
    /// The requested page no longer exists and the paginator moved to the
    /// server's last page. Load again.
    Relocated,
}

/// Per-row outcome of a bulk delete. Partial failure is normal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub deleted: Vec<ResourceId>,
    pub failed: Vec<(ResourceId, String)>,
}

/// Counts after a batch of uploads has been dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub ready: usize,
    pub processing: usize,
    pub failed: usize,
}

impl UploadSummary {
    pub fn total(&self) -> usize {
        self.ready + self.processing + self.failed
    }
}

/// Headless state of a collection page.
///
/// Every operation that changes what should be listed (page, filters,
/// search, any successful mutation) reloads the current page before it
/// returns, and every reload clears the selection.
pub struct Browser<T: Listed> {
    kind: ResourceKind,
    client: ClientHandle,
    session: SessionHandle,
    paginator: Paginator,
    filters: Filters,
    selection: Selection<ResourceId>,
    items: Vec<T>,
    state: LoadState,
    generation: u64,
    uploads: UploadQueue,
    upload_concurrency: usize,
}

impl<T: Listed> Browser<T> {
    pub fn new(kind: ResourceKind, client: ClientHandle, session: SessionHandle) -> Self {
        Self {
            kind,
            client,
            session,
            paginator: Paginator::new(DEFAULT_PER_PAGE),
            filters: Filters::default(),
            selection: Selection::new(),
            items: Vec::new(),
            state: LoadState::Idle,
            generation: 0,
            uploads: UploadQueue::default(),
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.paginator = Paginator::new(per_page);
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_upload_concurrency(mut self, concurrency: usize) -> Self {
        self.upload_concurrency = concurrency.max(1);
        self
    }

    pub fn with_previews(mut self, previews: Arc<dyn PreviewRegistry>) -> Self {
        self.uploads = UploadQueue::new(previews);
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn access(&self) -> Access {
        self.session.gate(self.kind)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Loaded successfully, and nothing matched.
    pub fn is_empty(&self) -> bool {
        self.state == LoadState::Loaded && self.items.is_empty()
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn selection(&self) -> &Selection<ResourceId> {
        &self.selection
    }

    pub fn uploads(&self) -> &UploadQueue {
        &self.uploads
    }

    pub fn uploads_mut(&mut self) -> &mut UploadQueue {
        &mut self.uploads
    }

    fn query(&self) -> ListQuery {
        ListQuery::new(self.paginator.page(), self.paginator.per_page(), self.filters.clone())
    }

    /// Start a list request for the current page and filters. Issuing a
    /// ticket makes every earlier one stale.
    pub fn begin_load(&mut self) -> Result<LoadTicket> {
        self.session.require(self.kind, Action::View)?;
        self.generation += 1;
        self.state = LoadState::Loading;
        Ok(LoadTicket {
            generation: self.generation,
            query: self.query(),
        })
    }

    /// Apply the response to a request started with [`begin_load`](Self::begin_load).
    pub fn finish_load(&mut self, ticket: LoadTicket, response: ApiResult<Page<Value>>) -> Result<LoadOutcome> {
        if ticket.generation != self.generation {
            tracing::debug!(
                kind = %self.kind,
                page = ticket.query.page,
                latest = self.generation,
                stale = ticket.generation,
                "Discarding stale listing"
            );
            return Ok(LoadOutcome::Stale);
        }
        let page = match response.and_then(|page| page.decode::<T>(self.kind)) {
            Ok(page) => page,
            Err(err) => {
                let err = ErrorKind::api(err);
                self.state = LoadState::Failed(err.user_message());
                self.session.report(&err);
                return Err(err);
            },
        };
        self.selection.clear();
        if self.paginator.apply(&page.pagination) && page.items.is_empty() {
            let page = self.paginator.page();
            tracing::debug!(kind = %self.kind, requested = ticket.query.page, page, "Page gone; relocating");
            return Ok(LoadOutcome::Relocated);
        }
        self.items = page.items;
        self.state = LoadState::Loaded;
        Ok(LoadOutcome::Applied)
    }

    /// Fetch the current page, following the server if the page moved.
    #[tracing::instrument(skip(self), fields(kind = %self.kind, page = self.paginator.page()))]
    pub async fn reload(&mut self) -> Result<()> {
        for _ in 0..MAX_LOAD_ATTEMPTS {
            let ticket = self.begin_load()?;
            let response = self.client.list(self.kind, ticket.query()).await;
            if self.finish_load(ticket, response)? != LoadOutcome::Relocated {
                return Ok(());
            }
        }
        let err = exn::Exn::from(ErrorKind::PageMoved(self.paginator.page()));
        tracing::warn!(kind = %self.kind, attempts = MAX_LOAD_ATTEMPTS, "Page kept relocating; giving up");
        self.invalidate();
        self.state = LoadState::Failed(err.user_message());
        self.session.report(&err);
        Err(err)
    }

    /// Drop rows and selection that no longer match the requested page.
    fn invalidate(&mut self) {
        self.items.clear();
        self.selection.clear();
    }

    /// Re-issue the last fetch after a failure.
    pub async fn retry(&mut self) -> Result<()> {
        self.reload().await
    }

    /// Go to page `n` and load it. Returns `false` without any request when
    /// `n` is out of range.
    pub async fn go_to_page(&mut self, n: u32) -> Result<bool> {
        if !self.paginator.set_page(n) {
            return Ok(false);
        }
        self.invalidate();
        self.reload().await?;
        Ok(true)
    }

    pub async fn next_page(&mut self) -> Result<bool> {
        self.go_to_page(self.paginator.page().saturating_add(1)).await
    }

    pub async fn prev_page(&mut self) -> Result<bool> {
        self.go_to_page(self.paginator.page().saturating_sub(1)).await
    }

    /// Replace the filters and load page 1.
    pub async fn set_filters(&mut self, filters: Filters) -> Result<()> {
        self.filters = filters;
        self.paginator.reset();
        self.invalidate();
        self.reload().await
    }

    /// Change the search text and load page 1.
    pub async fn set_search(&mut self, search: &str) -> Result<()> {
        let mut filters = self.filters.clone();
        filters.set_search(search);
        self.set_filters(filters).await
    }

    pub fn toggle(&mut self, id: ResourceId) -> bool {
        self.selection.toggle(id)
    }

    pub fn toggle_all_on_page(&mut self) -> bool {
        self.selection.select_all_on_page(self.items.iter().map(Listed::id))
    }

    fn finish_mutation<R>(&self, result: ApiResult<R>) -> Result<R> {
        result.map_err(|err| {
            let err = ErrorKind::api(err);
            self.session.report(&err);
            err
        })
    }

    /// Create a row and reload. Validation errors are returned for inline
    /// display and not toasted.
    #[tracing::instrument(skip(self, payload), fields(kind = %self.kind))]
    pub async fn create(&mut self, payload: &Value) -> Result<Value> {
        self.session.require(self.kind, Action::Manage)?;
        let result = self.client.create(self.kind, payload).await;
        let created = self.finish_mutation(result)?;
        tracing::info!(kind = %self.kind, "Created");
        self.session.notify(NoticeLevel::Success, "Created successfully.");
        self.reload().await?;
        Ok(created)
    }

    #[tracing::instrument(skip(self, payload), fields(kind = %self.kind))]
    pub async fn update(&mut self, id: &ResourceId, payload: &Value) -> Result<Value> {
        self.session.require(self.kind, Action::Manage)?;
        let result = self.client.update(self.kind, id, payload).await;
        let updated = self.finish_mutation(result)?;
        tracing::info!(kind = %self.kind, %id, "Updated");
        self.session.notify(NoticeLevel::Success, "Saved successfully.");
        self.reload().await?;
        Ok(updated)
    }

    fn remaining_after(&self, removed: &[ResourceId]) -> usize {
        self.items.iter().filter(|item| !removed.contains(item.id())).count()
    }

    #[tracing::instrument(skip(self), fields(kind = %self.kind))]
    pub async fn delete(&mut self, id: &ResourceId, hard: bool) -> Result<()> {
        self.session.require(self.kind, Action::Delete)?;
        let result = self.client.delete(self.kind, id, hard).await;
        self.finish_mutation(result)?;
        tracing::info!(kind = %self.kind, %id, hard, "Deleted");
        let remaining = self.remaining_after(std::slice::from_ref(id));
        self.paginator.after_delete(1, remaining);
        self.selection.remove(id);
        self.session.notify(NoticeLevel::Success, "Deleted successfully.");
        self.reload().await
    }

    /// Delete every selected row. Rows that fail are reported and skipped.
    #[tracing::instrument(skip(self), fields(kind = %self.kind, selected = self.selection.len()))]
    pub async fn delete_selected(&mut self, hard: bool) -> Result<BulkOutcome> {
        self.session.require(self.kind, Action::Delete)?;
        let mut outcome = BulkOutcome::default();
        let ids: Vec<ResourceId> = self.selection.iter().cloned().collect();
        for id in ids {
            match self.client.delete(self.kind, &id, hard).await {
                Ok(()) => outcome.deleted.push(id),
                Err(err) => {
                    tracing::warn!(kind = %self.kind, %id, error = %err.user_message(), "Delete failed");
                    outcome.failed.push((id, err.user_message()));
                },
            }
        }
        let remaining = self.remaining_after(&outcome.deleted);
        self.paginator.after_delete(outcome.deleted.len(), remaining);
        self.selection.clear();
        match (outcome.deleted.len(), outcome.failed.len()) {
            (_, 0) => self.session.notify(NoticeLevel::Success, format!("Deleted {} items.", outcome.deleted.len())),
            (deleted, failed) => self.session.notify(
                NoticeLevel::Error,
                format!("Deleted {deleted} items; {failed} could not be deleted."),
            ),
        }
        self.reload().await?;
        Ok(outcome)
    }
}

impl Browser<Item> {
    /// Add a file to the upload queue. Nothing is sent until
    /// [`upload_queued`](Self::upload_queued).
    pub fn enqueue(&mut self, file_name: &str, bytes: Vec<u8>, destination: &str) -> Result<TaskId> {
        if !self.kind.accepts_uploads() {
            exn::bail!(ErrorKind::UploadsUnsupported(self.kind));
        }
        self.session.require(self.kind, Action::Upload)?;
        Ok(self.uploads.enqueue(UploadRequest::new(file_name, bytes, destination)))
    }

    /// Upload every queued, unpaused file. Failures stay on their task.
    /// Reloads afterwards if anything was accepted.
    #[tracing::instrument(skip(self), fields(kind = %self.kind))]
    pub async fn upload_queued(&mut self) -> Result<UploadSummary> {
        self.session.require(self.kind, Action::Upload)?;
        let jobs = self.uploads.take_dispatchable();
        let mut summary = UploadSummary::default();
        if jobs.is_empty() {
            return Ok(summary);
        }
        let mut events = std::pin::pin!(dispatch(self.client.clone(), self.kind, jobs, self.upload_concurrency));
        while let Some(event) = events.next().await {
            self.uploads.apply(&event)?;
            if let UploadEvent::Uploaded(task, _) | UploadEvent::Failed(task, _) = &event
                && let Some(task) = self.uploads.get(*task)
            {
                match task.state() {
                    UploadState::Ready { .. } => summary.ready += 1,
                    UploadState::Processing { .. } => summary.processing += 1,
                    _ => summary.failed += 1,
                }
            }
        }
        tracing::info!(
            kind = %self.kind,
            ready = summary.ready,
            processing = summary.processing,
            failed = summary.failed,
            "Uploads dispatched"
        );
        if summary.failed > 0 {
            self.session.notify(
                NoticeLevel::Error,
                format!("{} of {} uploads failed.", summary.failed, summary.total()),
            );
        }
        if summary.ready + summary.processing > 0 {
            self.reload().await?;
            self.uploads.reconcile(&self.items);
        }
        Ok(summary)
    }

    /// Reload and promote uploads the server has finished processing.
    /// Returns how many tasks settled.
    ///
    /// Processing rows that are not on the current page are looked up by
    /// paging through the unfiltered collection until each one is seen.
    #[tracing::instrument(skip(self), fields(kind = %self.kind))]
    pub async fn refresh_processing(&mut self) -> Result<usize> {
        self.reload().await?;
        let mut settled = self.uploads.reconcile(&self.items);
        let mut pending = self.uploads.processing_ids();
        pending.retain(|id| !self.items.iter().any(|item| &item.id == id));
        let mut page = 1;
        while !pending.is_empty() {
            let query = ListQuery::new(page, self.paginator.per_page(), Filters::default());
            let listing = list_typed::<Item>(self.client.as_ref(), self.kind, &query).await.map_err(ErrorKind::api)?;
            settled += self.uploads.reconcile(&listing.items);
            pending.retain(|id| !listing.items.iter().any(|item| &item.id == id));
            if page >= listing.pagination.last_page {
                break;
            }
            page += 1;
        }
        if !pending.is_empty() {
            tracing::debug!(kind = %self.kind, missing = pending.len(), "Processing uploads not listed");
        }
        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::session::tests::RecordingNotifier;
    use crate::upload::preview::tests::CountingRegistry;
    use clipflow_api::client::{MockClient, MockUpload};
    use clipflow_api::models::{Folder, ItemStatus, Profile, Role};
    use clipflow_api::{Pagination, ResourceClient};
    use serde_json::json;

    struct Fixture {
        client: Arc<MockClient>,
        notifier: Arc<RecordingNotifier>,
        browser: Browser<Item>,
    }

    fn fixture(client: MockClient, profile: Profile) -> Fixture {
        let client = Arc::new(client);
        let notifier = Arc::new(RecordingNotifier::default());
        let session = Arc::new(Session::new(profile, notifier.clone()));
        let browser = Browser::new(ResourceKind::Footage, client.clone(), session);
        Fixture {
            client,
            notifier,
            browser,
        }
    }

    fn admin() -> Profile {
        Profile::new("1", "Admin", Role::Admin).with_all_permissions()
    }

    fn footage(count: usize) -> MockClient {
        MockClient::default().with_generated(ResourceKind::Footage, "clip", count)
    }

    fn page(total: u64, current_page: u32, rows: usize) -> Page<Value> {
        Page {
            items: (0..rows).map(|i| json!({"id": i, "name": format!("row-{i}")})).collect(),
            pagination: Pagination::for_total(total, 15, current_page),
        }
    }

    #[tokio::test]
    async fn test_first_page_then_next() {
        let mut f = fixture(footage(42), admin());
        f.browser.reload().await.unwrap();
        assert_eq!(f.browser.items().len(), 15);
        assert_eq!(f.browser.paginator().summary(), "Showing 1 to 15 of 42");

        assert!(f.browser.next_page().await.unwrap());
        let queries = f.client.queries().await;
        assert_eq!(queries.last().map(|(_, q)| q.page), Some(2));
        assert_eq!(f.browser.paginator().summary(), "Showing 16 to 30 of 42");
    }

    #[tokio::test]
    async fn test_out_of_range_page_sends_nothing() {
        let mut f = fixture(footage(42), admin());
        f.browser.reload().await.unwrap();
        assert!(!f.browser.go_to_page(4).await.unwrap());
        assert!(!f.browser.go_to_page(0).await.unwrap());
        assert!(!f.browser.prev_page().await.unwrap());
        assert_eq!(f.client.queries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_search_resets_to_first_page() {
        let mut f = fixture(footage(80), admin());
        f.browser.reload().await.unwrap();
        f.browser.go_to_page(4).await.unwrap();
        assert_eq!(f.browser.paginator().page(), 4);

        f.browser.set_search("clip-1").await.unwrap();
        let (_, query) = f.client.queries().await.pop().unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.filters.search.as_deref(), Some("clip-1"));
        assert_eq!(f.browser.paginator().page(), 1);
    }

    #[tokio::test]
    async fn test_deleting_only_item_on_last_page() {
        let mut f = fixture(footage(31), admin());
        f.browser.reload().await.unwrap();
        f.browser.go_to_page(3).await.unwrap();
        assert_eq!(f.browser.items().len(), 1);

        let id = f.browser.items()[0].id.clone();
        f.browser.delete(&id, false).await.unwrap();
        let paginator = f.browser.paginator();
        assert!(paginator.page() <= 2);
        assert_eq!(paginator.total_pages(), 2);
        assert_eq!(f.browser.items().len(), 15);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let mut f = fixture(footage(0), admin());
        let first = f.browser.begin_load().unwrap();
        let second = f.browser.begin_load().unwrap();
        assert_eq!(f.browser.finish_load(first, Ok(page(42, 1, 15))).unwrap(), LoadOutcome::Stale);
        assert!(f.browser.items().is_empty());
        assert_eq!(f.browser.state(), &LoadState::Loading);
        assert_eq!(f.browser.finish_load(second, Ok(page(3, 1, 3))).unwrap(), LoadOutcome::Applied);
        assert_eq!(f.browser.items().len(), 3);
    }

    #[tokio::test]
    async fn test_vanished_page_relocates() {
        let mut f = fixture(footage(0), admin());
        let ticket = f.browser.begin_load().unwrap();
        let gone = Page {
            items: vec![],
            pagination: Pagination {
                total: 30,
                per_page: 15,
                current_page: 3,
                last_page: 2,
            },
        };
        assert_eq!(f.browser.finish_load(ticket, Ok(gone)).unwrap(), LoadOutcome::Relocated);
        assert_eq!(f.browser.paginator().page(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_sets_error_and_retry_recovers() {
        let mut f = fixture(footage(5), admin());
        f.client.fail_next(clipflow_api::error::ErrorKind::Transport("connection reset".to_string())).await;
        let err = f.browser.reload().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(f.browser.state(), LoadState::Failed(_)));
        assert_eq!(f.notifier.errors(), vec!["Could not reach the server. Please try again.".to_string()]);

        f.browser.retry().await.unwrap();
        assert_eq!(f.browser.state(), &LoadState::Loaded);
        assert_eq!(f.browser.items().len(), 5);
    }

    #[tokio::test]
    async fn test_selection_cleared_on_reload() {
        let mut f = fixture(footage(20), admin());
        f.browser.reload().await.unwrap();
        assert!(f.browser.toggle_all_on_page());
        assert_eq!(f.browser.selection().len(), 15);
        assert!(!f.browser.toggle_all_on_page());
        let id = f.browser.items()[0].id.clone();
        assert!(f.browser.toggle(id));
        f.browser.next_page().await.unwrap();
        assert!(f.browser.selection().is_empty());
    }

    #[tokio::test]
    async fn test_failed_page_change_drops_previous_rows() {
        let mut f = fixture(footage(20), admin());
        f.browser.reload().await.unwrap();
        let first = f.browser.items()[0].id.clone();
        f.browser.toggle(first);
        f.client.fail_next(clipflow_api::error::ErrorKind::Transport("timed out".to_string())).await;

        assert!(f.browser.next_page().await.is_err());
        assert_eq!(f.browser.paginator().page(), 2);
        assert!(f.browser.selection().is_empty());
        assert!(f.browser.items().is_empty());
        assert!(!f.browser.toggle_all_on_page());
        assert!(matches!(f.browser.state(), LoadState::Failed(_)));

        f.browser.retry().await.unwrap();
        assert_eq!(f.browser.items().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_filter_change_drops_previous_rows() {
        let mut f = fixture(footage(20), admin());
        f.browser.reload().await.unwrap();
        assert!(f.browser.toggle_all_on_page());
        f.client.fail_next(clipflow_api::error::ErrorKind::Transport("timed out".to_string())).await;

        assert!(f.browser.set_search("clip-1").await.is_err());
        assert!(f.browser.selection().is_empty());
        assert!(f.browser.items().is_empty());
    }

    /// Answers every page with an empty body and a last page one lower.
    struct ShrinkingClient(MockClient);

    #[async_trait::async_trait]
    impl ResourceClient for ShrinkingClient {
        fn name(&self) -> &str {
            "shrinking"
        }

        async fn profile(&self) -> ApiResult<Profile> {
            self.0.profile().await
        }

        async fn list(&self, _kind: ResourceKind, query: &ListQuery) -> ApiResult<Page<Value>> {
            let last_page = query.page.saturating_sub(1).max(1);
            Ok(Page {
                items: vec![],
                pagination: Pagination {
                    total: u64::from(last_page) * 15,
                    per_page: 15,
                    current_page: query.page,
                    last_page,
                },
            })
        }

        async fn create(&self, kind: ResourceKind, payload: &Value) -> ApiResult<Value> {
            self.0.create(kind, payload).await
        }

        async fn update(&self, kind: ResourceKind, id: &ResourceId, payload: &Value) -> ApiResult<Value> {
            self.0.update(kind, id, payload).await
        }

        async fn delete(&self, kind: ResourceKind, id: &ResourceId, hard: bool) -> ApiResult<()> {
            self.0.delete(kind, id, hard).await
        }

        async fn upload(
            &self,
            kind: ResourceKind,
            request: &UploadRequest,
            progress: clipflow_api::ProgressReporter,
        ) -> ApiResult<clipflow_api::UploadReceipt> {
            self.0.upload(kind, request, progress).await
        }
    }

    #[tokio::test]
    async fn test_page_that_keeps_moving_gives_up() {
        let notifier = Arc::new(RecordingNotifier::default());
        let session = Arc::new(Session::new(admin(), notifier.clone()));
        let client: ClientHandle = Arc::new(ShrinkingClient(MockClient::default()));
        let mut browser: Browser<Item> = Browser::new(ResourceKind::Footage, client, session);
        let ticket = browser.begin_load().unwrap();
        browser.finish_load(ticket, Ok(page(100, 1, 15))).unwrap();

        let err = browser.go_to_page(6).await.unwrap_err();
        assert_eq!(*err, ErrorKind::PageMoved(3));
        assert!(err.is_retryable());
        let message = "The list changed while loading. Please try again.".to_string();
        assert_eq!(browser.state(), &LoadState::Failed(message));
        assert!(browser.items().is_empty());
        assert_eq!(notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_bulk_delete_reports_partial_failure() {
        let mut f = fixture(footage(4), admin());
        f.browser.reload().await.unwrap();
        let ids: Vec<ResourceId> = f.browser.items().iter().take(2).map(|item| item.id.clone()).collect();
        for id in &ids {
            f.browser.toggle(id.clone());
        }
        f.browser.toggle(ResourceId::from("missing"));

        let outcome = f.browser.delete_selected(true).await.unwrap();
        assert_eq!(outcome.deleted, ids);
        assert_eq!(outcome.failed.len(), 1);
        assert!(f.browser.selection().is_empty());
        assert_eq!(f.browser.items().len(), 2);
        assert_eq!(f.notifier.errors(), vec!["Deleted 2 items; 1 could not be deleted.".to_string()]);
    }

    #[tokio::test]
    async fn test_validation_errors_are_returned_not_toasted() {
        let mut f = fixture(footage(0), admin());
        let err = f.browser.create(&json!({"name": " "})).await.unwrap_err();
        assert!(err.field_errors().is_some());
        assert!(f.notifier.errors().is_empty());
        assert_eq!(f.client.count(ResourceKind::Footage).await, 0);

        f.browser.create(&json!({"name": "clip"})).await.unwrap();
        assert_eq!(f.browser.items().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_permissions_send_nothing() {
        let profile = Profile::new("2", "Viewer", Role::Customer).with_permissions(["footage.view"]);
        let mut f = fixture(footage(3), profile);
        assert_eq!(f.browser.access(), Access::Granted);
        f.browser.reload().await.unwrap();

        let id = f.browser.items()[0].id.clone();
        let err = f.browser.delete(&id, false).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Forbidden("footage.delete".to_string()));
        assert!(f.browser.enqueue("a.mp4", vec![1], "root").is_err());
        assert!(f.client.deletions().await.is_empty());

        let mut f = fixture(footage(3), Profile::new("3", "Nobody", Role::Customer));
        assert_eq!(f.browser.access(), Access::NoAccess);
        assert!(f.browser.reload().await.is_err());
        assert!(f.client.queries().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_uploads_settle_independently() {
        let client = MockClient::default()
            .with_upload("a.mp4", MockUpload::FailAt {
                percent: 40,
                message: "Corrupt file".to_string(),
            })
            .with_upload("b.mp4", MockUpload::Succeed {
                id: ResourceId::from(77u64),
                status: ItemStatus::Ready,
            });
        let mut f = fixture(client, admin());
        let registry = Arc::new(CountingRegistry::default());
        f.browser = f.browser.with_previews(registry.clone()).with_upload_concurrency(2);

        let a = f.browser.enqueue("a.mp4", vec![0; 32], "summer").unwrap();
        let b = f.browser.enqueue("b.mp4", vec![0; 32], "summer").unwrap();
        let summary = f.browser.upload_queued().await.unwrap();

        assert_eq!(summary, UploadSummary { ready: 1, processing: 0, failed: 1 });
        let uploads = f.browser.uploads();
        assert_eq!(uploads.get(a).unwrap().state(), &UploadState::Failed {
            progress: 40,
            reason: "Corrupt file".to_string(),
        });
        assert_eq!(uploads.get(b).unwrap().state(), &UploadState::Ready {
            remote_id: ResourceId::from(77u64),
        });
        assert_eq!(f.browser.items().len(), 1);

        f.browser.uploads_mut().clear();
        assert_eq!((registry.live(), registry.revoked()), (0, 2));
    }

    #[tokio::test]
    async fn test_processing_uploads_promoted_on_refresh() {
        let client = MockClient::default().with_upload("c.mp4", MockUpload::Succeed {
            id: ResourceId::from(5u64),
            status: ItemStatus::Processing,
        });
        let mut f = fixture(client, admin());
        let task = f.browser.enqueue("c.mp4", vec![0; 8], "root").unwrap();
        let summary = f.browser.upload_queued().await.unwrap();
        assert_eq!(summary.processing, 1);
        assert_eq!(f.browser.uploads().get(task).unwrap().state().name(), "processing");
        assert_eq!(f.browser.refresh_processing().await.unwrap(), 0);

        f.client.set_status(ResourceKind::Footage, &ResourceId::from(5u64), ItemStatus::Ready).await;
        assert_eq!(f.browser.refresh_processing().await.unwrap(), 1);
        assert_eq!(f.browser.uploads().get(task).unwrap().state().name(), "ready");
    }

    #[tokio::test]
    async fn test_processing_upload_off_the_current_page_settles() {
        let client = footage(20).with_upload("late.mp4", MockUpload::Succeed {
            id: ResourceId::from(500u64),
            status: ItemStatus::Processing,
        });
        let mut f = fixture(client, admin());
        let task = f.browser.enqueue("late.mp4", vec![0; 8], "root").unwrap();
        f.browser.upload_queued().await.unwrap();
        assert_eq!(f.browser.paginator().page(), 1);
        assert!(f.browser.items().iter().all(|item| item.id != ResourceId::from(500u64)));

        f.client.set_status(ResourceKind::Footage, &ResourceId::from(500u64), ItemStatus::Ready).await;
        assert_eq!(f.browser.refresh_processing().await.unwrap(), 1);
        assert_eq!(f.browser.uploads().get(task).unwrap().state(), &UploadState::Ready {
            remote_id: ResourceId::from(500u64),
        });
        let (_, last) = f.client.queries().await.pop().unwrap();
        assert_eq!(last.page, 2);
    }

    #[tokio::test]
    async fn test_uploads_rejected_for_non_library_kinds() {
        let client: ClientHandle = Arc::new(MockClient::default());
        let session = Arc::new(Session::new(admin(), Arc::new(RecordingNotifier::default())));
        let mut browser: Browser<Item> = Browser::new(ResourceKind::Customers, client, session);
        let err = browser.enqueue("a.png", vec![], "root").unwrap_err();
        assert!(matches!(*err, ErrorKind::UploadsUnsupported(ResourceKind::Customers)));
    }

    #[tokio::test]
    async fn test_folder_browser() {
        let client = MockClient::default().with_items(ResourceKind::BgmFolders, [json!({"id": 1, "name": "All"})]);
        let client: Arc<MockClient> = Arc::new(client);
        let session = Session::start(client.as_ref(), Arc::new(RecordingNotifier::default())).await.unwrap();
        let mut browser: Browser<Folder> = Browser::new(ResourceKind::BgmFolders, client.clone(), session);
        browser.reload().await.unwrap();
        assert_eq!(browser.items()[0].name, "All");
        assert_eq!(client.name(), "mock");
    }
}
