//! Typed client for the clipflow REST collection endpoints.
//!
//! Every resource library the dashboard shows (footage, background music,
//! images, overlays, media folders, tickets, plans, customers) is exposed by
//! the backend as the same kind of paginated collection wrapped in the same
//! response envelope. This crate models that once:
//!
//! - [`ResourceClient`] is the seam: list/create/update/delete/upload against
//!   a [`ResourceKind`](models::ResourceKind), with an HTTP implementation
//!   (`http` feature) and an in-memory one for tests (`mock` feature).
//! - [`envelope`] normalizes `{success, data, pagination, errors, message}`
//!   into either data or one [`ErrorKind`](error::ErrorKind).
//! - [`models`] holds the typed rows, with per-collection status spellings
//!   resolved into one [`ItemStatus`](models::ItemStatus).

pub mod client;
pub mod envelope;
pub mod error;
pub mod models;
mod query;
mod upload;

pub use crate::client::{ResourceClient, list_typed};
pub use crate::envelope::{Page, Pagination};
pub use crate::query::{Filters, ListQuery};
pub use crate::upload::{ProgressReporter, UploadReceipt, UploadRequest};
use std::sync::Arc;

pub type ClientHandle = Arc<dyn ResourceClient + Send + Sync>;
