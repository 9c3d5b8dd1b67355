use crate::upload::task::TaskId;
use async_stream::stream;
use clipflow_api::error::{ErrorKind as ApiErrorKind, Result as ApiResult};
use clipflow_api::models::ResourceKind;
use clipflow_api::{ClientHandle, ProgressReporter, UploadReceipt, UploadRequest};
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// Progress events emitted by [`dispatch`] as it works through a batch of
/// uploads.
///
/// For each task, events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once, when the transfer begins.
/// 2. [`Progress`](Self::Progress): zero or more times, non-decreasing.
/// 3. [`Uploaded`](Self::Uploaded) or [`Failed`](Self::Failed): exactly once.
///
/// [`Complete`](Self::Complete) is emitted once after every task has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Started(TaskId),
    Progress(TaskId, u8),
    /// The server accepted the file. Its status may still be `processing`.
    Uploaded(TaskId, UploadReceipt),
    /// The transfer or the server rejected the file; the message is user-facing.
    Failed(TaskId, String),
    Complete,
}

enum Step {
    Progress(TaskId, u8),
    Finished(TaskId, ApiResult<UploadReceipt>),
}

/// Streams [`UploadEvent`]s while uploading `jobs` into `kind` through
/// `client`.
///
/// At most `concurrency` transfers run at once; further jobs are started in
/// submission order as running ones finish. A failed upload is reported as a
/// [`Failed`](UploadEvent::Failed) event and never stops the others. All
/// transfers run inside the stream itself, so dropping the stream abandons
/// any that have not finished.
pub fn dispatch(
    client: ClientHandle,
    kind: ResourceKind,
    jobs: Vec<(TaskId, UploadRequest)>,
    concurrency: usize,
) -> impl Stream<Item = UploadEvent> {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut waiting: VecDeque<_> = jobs.into();
        let mut running = FuturesUnordered::new();
        let limit = concurrency.max(1);

        while running.len() < limit {
            let Some((task, request)) = waiting.pop_front() else {
                break;
            };
            yield UploadEvent::Started(task);
            running.push(upload_one(&client, kind, task, request, tx.clone()));
        }

        while !running.is_empty() {
            let step = tokio::select! {
                biased;
                Some((task, percent)) = rx.recv() => Step::Progress(task, percent),
                Some((task, outcome)) = running.next() => Step::Finished(task, outcome),
            };
            match step {
                Step::Progress(task, percent) => yield UploadEvent::Progress(task, percent),
                Step::Finished(task, outcome) => {
                    // A transfer can report progress and finish within one
                    // poll; flush those reports before its outcome.
                    while let Ok((task, percent)) = rx.try_recv() {
                        yield UploadEvent::Progress(task, percent);
                    }
                    yield match outcome {
                        Ok(receipt) => UploadEvent::Uploaded(task, receipt),
                        Err(err) => {
                            let error: &ApiErrorKind = &err;
                            tracing::warn!(%task, %kind, %error, "Upload failed");
                            UploadEvent::Failed(task, err.user_message())
                        },
                    };
                    // Pop-n-push, FIFO.
                    if let Some((task, request)) = waiting.pop_front() {
                        yield UploadEvent::Started(task);
                        running.push(upload_one(&client, kind, task, request, tx.clone()));
                    }
                },
            }
        }

        yield UploadEvent::Complete;
    })
}

async fn upload_one(
    client: &ClientHandle,
    kind: ResourceKind,
    task: TaskId,
    request: UploadRequest,
    tx: mpsc::UnboundedSender<(TaskId, u8)>,
) -> (TaskId, ApiResult<UploadReceipt>) {
    let progress = ProgressReporter::new(move |percent| {
        // The receiver only goes away with the stream.
        let _ = tx.send((task, percent));
    });
    let outcome = client.upload(kind, &request, progress).await;
    (task, outcome)
}
