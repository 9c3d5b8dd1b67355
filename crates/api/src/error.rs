//! API Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Every failure a collection endpoint can produce is folded into one of three
//! shapes before it reaches a caller: field-level validation errors, a flat
//! business-rule message, or a transport failure. [`ErrorKind::user_message`]
//! turns any of them into something that can be put in front of a person.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// An API error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// One or more fields were rejected; show them next to the inputs.
    #[display("validation failed: {_0}")]
    Validation(#[error(not(source))] FieldErrors),
    /// The server understood the request but refused it (`success: false`).
    #[display("request rejected: {_0}")]
    Rejected(#[error(not(source))] String),
    /// The request never produced a usable response (DNS, TLS, timeout, 5xx).
    #[display("network error: {_0}")]
    Transport(#[error(not(source))] String),
    /// The response arrived but could not be understood.
    #[display("invalid response: {_0}")]
    InvalidResponse(#[error(not(source))] String),
    /// The addressed resource does not exist (anymore).
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Credentials are missing or expired.
    #[display("unauthorized")]
    Unauthorized,
    /// The request could not be built from the given input.
    #[display("invalid request: {_0}")]
    InvalidRequest(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Field errors to render inline, if this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Normalized message suitable for a toast or banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => match errors.first() {
                Some((_, message)) => message.to_string(),
                None => "Please correct the highlighted fields.".to_string(),
            },
            Self::Rejected(message) if message.trim().is_empty() => "The request could not be completed.".to_string(),
            Self::Rejected(message) => message.clone(),
            Self::Transport(_) => "Could not reach the server. Please try again.".to_string(),
            Self::InvalidResponse(_) => "The server returned an unexpected response.".to_string(),
            Self::NotFound(_) => "The requested item no longer exists.".to_string(),
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::InvalidRequest(message) => message.clone(),
        }
    }
}

/// Field-scoped validation messages, keyed by field name.
///
/// Mirrors the `errors` member of the response envelope
/// (`Record<string, string[]>`). Ordered so that rendering is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper, mostly for tests and mock backends.
    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(field, message);
        self
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Messages recorded against a single field.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// The first message of the first field (alphabetically).
    pub fn first(&self) -> Option<(&str, &str)> {
        self.0.iter().find_map(|(field, messages)| messages.first().map(|m| (field.as_str(), m.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut first = true;
        for (field, messages) in self.iter() {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}
