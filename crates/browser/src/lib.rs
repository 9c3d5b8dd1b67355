//! Headless state for a paginated resource browser with an upload queue.
//!
//! A [`Browser`] owns everything a library page needs between two renders:
//! which page is showing, which rows are checked, which filters apply, and
//! which files are waiting to be (or being) uploaded. It talks to the
//! backend only through a [`ClientHandle`](clipflow_api::ClientHandle) and
//! reports to the user only through the injected [`Session`].
//!
//! The building blocks are usable on their own: [`Paginator`],
//! [`Selection`], [`UploadQueue`](upload::UploadQueue) and the
//! [`dispatch`](upload::dispatch) stream.

mod browser;
pub mod error;
mod folders;
mod paginate;
mod selection;
mod session;
pub mod upload;

pub use crate::browser::{Browser, BulkOutcome, LoadOutcome, LoadState, LoadTicket, UploadSummary};
pub use crate::folders::{FolderTree, load_folder_tree};
pub use crate::paginate::Paginator;
pub use crate::selection::Selection;
pub use crate::session::{Access, LogNotifier, Notice, NoticeLevel, Notifier, Session, SessionHandle};

/// Page size used when nothing else is configured.
pub const DEFAULT_PER_PAGE: u32 = 15;
/// Number of files transferred at the same time when nothing else is configured.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 3;
