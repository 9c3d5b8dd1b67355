use crate::error::{ErrorKind, Result};
use crate::upload::UploadEvent;
use crate::upload::preview::{NoPreviews, Preview, PreviewRegistry};
use crate::upload::task::{TaskId, UploadState, UploadTask};
use clipflow_api::UploadRequest;
use clipflow_api::models::{Item, ResourceId};
use std::sync::Arc;

/// Tasks grouped the way an upload panel shows them.
#[derive(Debug)]
pub struct Buckets<'a> {
    pub queued: Vec<&'a UploadTask>,
    pub in_flight: Vec<&'a UploadTask>,
    pub finished: Vec<&'a UploadTask>,
}

/// Files chosen for upload, in the order they were chosen.
///
/// The queue only tracks state; transfers are performed by
/// [`dispatch`](crate::upload::dispatch), whose events are fed back in
/// through [`apply`](Self::apply). Each task owns its local [`Preview`], so
/// a preview is revoked whenever its task leaves the queue.
pub struct UploadQueue {
    tasks: Vec<UploadTask>,
    next_id: u64,
    previews: Arc<dyn PreviewRegistry>,
}

impl UploadQueue {
    pub fn new(previews: Arc<dyn PreviewRegistry>) -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
            previews,
        }
    }

    /// Add a file. It waits in `queued` until dispatched.
    pub fn enqueue(&mut self, request: UploadRequest) -> TaskId {
        let preview = Preview::acquire(&self.previews, &request.file_name, &request.bytes);
        self.push(request, preview)
    }

    fn push(&mut self, request: UploadRequest, preview: Option<Preview>) -> TaskId {
        let id = TaskId::new(self.next_id);
        self.next_id += 1;
        tracing::debug!(task = %id, file = %request.file_name, size = request.size(), "Upload queued");
        self.tasks.push(UploadTask::new(id, request, preview));
        id
    }

    pub fn get(&self, id: TaskId) -> Option<&UploadTask> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    fn get_mut(&mut self, id: TaskId) -> Result<&mut UploadTask> {
        match self.tasks.iter_mut().find(|task| task.id() == id) {
            Some(task) => Ok(task),
            None => exn::bail!(ErrorKind::UnknownTask(id)),
        }
    }

    fn position(&self, id: TaskId) -> Result<usize> {
        match self.tasks.iter().position(|task| task.id() == id) {
            Some(index) => Ok(index),
            None => exn::bail!(ErrorKind::UnknownTask(id)),
        }
    }

    pub fn tasks(&self) -> &[UploadTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Hold a queued task back from dispatch.
    pub fn pause(&mut self, id: TaskId) -> Result<()> {
        self.get_mut(id)?.pause()
    }

    pub fn resume(&mut self, id: TaskId) -> Result<()> {
        self.get_mut(id)?.resume()
    }

    /// Drop a queued or finished task, revoking its preview. In-flight tasks
    /// cannot be removed.
    pub fn remove(&mut self, id: TaskId) -> Result<()> {
        let index = self.position(id)?;
        if self.tasks[index].is_in_flight() {
            exn::bail!(ErrorKind::InFlight(id));
        }
        let task = self.tasks.remove(index);
        tracing::debug!(task = %id, state = task.state().name(), "Upload removed");
        Ok(())
    }

    /// Drop every task that is not in flight. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(UploadTask::is_in_flight);
        before - self.tasks.len()
    }

    /// Drop every terminal task. Returns how many were dropped.
    pub fn clear_finished(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.state().is_terminal());
        before - self.tasks.len()
    }

    /// Put a failed task back in the queue as a fresh task, keeping its preview.
    pub fn requeue(&mut self, id: TaskId) -> Result<TaskId> {
        let index = self.position(id)?;
        if !matches!(self.tasks[index].state(), UploadState::Failed { .. }) {
            exn::bail!(ErrorKind::InvalidTransition {
                task: id,
                from: self.tasks[index].state().name(),
                action: "retry",
            });
        }
        let mut failed = self.tasks.remove(index);
        let preview = failed.take_preview();
        Ok(self.push(failed.request().clone(), preview))
    }

    /// Claim every queued, unpaused task for a dispatcher. Claimed tasks
    /// count as in flight and are not handed out twice.
    pub fn take_dispatchable(&mut self) -> Vec<(TaskId, UploadRequest)> {
        self.tasks
            .iter_mut()
            .filter(|task| task.is_dispatchable())
            .map(|task| {
                task.claim();
                (task.id(), task.request().clone())
            })
            .collect()
    }

    /// Advance a task according to a dispatcher event.
    pub fn apply(&mut self, event: &UploadEvent) -> Result<()> {
        match event {
            UploadEvent::Started(id) => self.get_mut(*id)?.start(),
            UploadEvent::Progress(id, percent) => self.get_mut(*id)?.progress(*percent),
            UploadEvent::Uploaded(id, receipt) => self.get_mut(*id)?.uploaded(receipt.clone()),
            UploadEvent::Failed(id, reason) => self.get_mut(*id)?.fail(reason.clone()),
            UploadEvent::Complete => Ok(()),
        }
    }

    /// Remote ids of tasks still being processed by the server.
    pub fn processing_ids(&self) -> Vec<ResourceId> {
        self.tasks
            .iter()
            .filter_map(|task| match task.state() {
                UploadState::Processing { remote_id } => Some(remote_id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Promote processing tasks whose item a fresh listing reports as
    /// settled. Returns how many tasks reached a terminal state.
    pub fn reconcile(&mut self, items: &[Item]) -> usize {
        let mut settled = 0;
        for task in &mut self.tasks {
            let Some(remote_id) = task.state().remote_id().cloned() else {
                continue;
            };
            if let Some(item) = items.iter().find(|item| item.id == remote_id)
                && task.settle(item.status)
            {
                tracing::info!(task = %task.id(), id = %remote_id, state = task.state().name(), "Upload settled");
                settled += 1;
            }
        }
        settled
    }

    pub fn buckets(&self) -> Buckets<'_> {
        let mut buckets = Buckets {
            queued: Vec::new(),
            in_flight: Vec::new(),
            finished: Vec::new(),
        };
        for task in &self.tasks {
            if task.state().is_terminal() {
                buckets.finished.push(task);
            } else if task.is_in_flight() {
                buckets.in_flight.push(task);
            } else {
                buckets.queued.push(task);
            }
        }
        buckets
    }
}

impl Default for UploadQueue {
    fn default() -> Self {
        Self::new(Arc::new(NoPreviews))
    }
}
