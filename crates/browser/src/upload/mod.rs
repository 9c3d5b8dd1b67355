//! Upload queue: per-file state, previews and the transfer stream.

mod dispatch;
pub mod preview;
mod queue;
mod task;

pub use self::dispatch::{UploadEvent, dispatch};
pub use self::queue::{Buckets, UploadQueue};
pub use self::task::{TaskId, UploadState, UploadTask};
