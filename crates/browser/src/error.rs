//! Browser Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. API failures keep the client's
//! [`ApiErrorKind`] so callers can still tell validation, rejection and
//! transport failures apart.

use crate::upload::TaskId;
use clipflow_api::error::{Error as ApiError, ErrorKind as ApiErrorKind, FieldErrors};
use clipflow_api::models::ResourceKind;
use derive_more::{Display, Error};

/// A browser error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for browser operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The backend (or the connection to it) failed.
    #[display("{_0}")]
    Api(ApiErrorKind),
    /// The signed-in user lacks the named permission slug. Nothing was sent.
    #[display("missing permission: {_0}")]
    Forbidden(#[error(not(source))] String),
    /// The collection does not take file uploads.
    #[display("{_0} does not accept uploads")]
    UploadsUnsupported(#[error(not(source))] ResourceKind),
    /// An upload task was asked to do something its state does not allow.
    #[display("upload {task} cannot {action} while {from}")]
    InvalidTransition {
        task: TaskId,
        from: &'static str,
        action: &'static str,
    },
    #[display("no upload task {_0}")]
    UnknownTask(#[error(not(source))] TaskId),
    /// The task is transferring or being processed and cannot be touched.
    #[display("upload {_0} is in flight")]
    InFlight(#[error(not(source))] TaskId),
    /// The requested page kept moving out from under repeated reloads.
    #[display("page {_0} could not be settled")]
    PageMoved(#[error(not(source))] u32),
}

impl ErrorKind {
    /// Wrap an API error, keeping the client's `Exn` frame as a child in the
    /// browser's error tree.
    #[track_caller]
    pub fn api(err: ApiError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Api(inner))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(inner) => inner.is_retryable(),
            Self::PageMoved(_) => true,
            _ => false,
        }
    }

    /// Field errors to render inline, if the backend rejected input.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Api(inner) => inner.field_errors(),
            _ => None,
        }
    }

    /// Normalized message suitable for a toast or banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(inner) => inner.user_message(),
            Self::Forbidden(_) => "You do not have permission to do that.".to_string(),
            Self::UploadsUnsupported(kind) => format!("Files cannot be uploaded to {kind}."),
            Self::InFlight(_) => "That upload is still in progress.".to_string(),
            Self::PageMoved(_) => "The list changed while loading. Please try again.".to_string(),
            Self::InvalidTransition { .. } | Self::UnknownTask(_) => {
                "That upload can no longer be changed.".to_string()
            },
        }
    }
}
