//! The response envelope shared by every collection endpoint.
//!
//! ```json
//! { "success": true, "data": [...], "pagination": {...}, "errors": {...}, "message": "..." }
//! ```

use crate::error::{ErrorKind, FieldErrors, Result};
use crate::models::{Listed, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
}

impl Pagination {
    /// Metadata for `total` rows split into pages of `per_page`.
    pub fn for_total(total: u64, per_page: u32, current_page: u32) -> Self {
        let per_page = per_page.max(1);
        let last_page = u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX).max(1);
        Self {
            total,
            per_page,
            current_page: current_page.max(1),
            last_page,
        }
    }
}

/// Raw response body as sent by the server.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub errors: Option<FieldErrors>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A successful envelope, with the failure shapes stripped away.
#[derive(Debug)]
pub struct Reply<T> {
    pub data: Option<T>,
    pub pagination: Option<Pagination>,
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Normalize a `success: false` envelope into an error.
    ///
    /// Field errors take precedence over the flat message: when both are
    /// present the message is usually a generic "The given data was invalid".
    pub fn into_result(self) -> Result<Reply<T>> {
        if self.success {
            return Ok(Reply {
                data: self.data,
                pagination: self.pagination,
                message: self.message,
            });
        }
        match self.errors {
            Some(errors) if !errors.is_empty() => exn::bail!(ErrorKind::Validation(errors)),
            _ => exn::bail!(ErrorKind::Rejected(self.message.unwrap_or_default())),
        }
    }
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl Page<Value> {
    /// Build a page from a list reply. Endpoints that do not paginate get
    /// metadata describing a single page holding everything.
    pub fn from_reply(reply: Reply<Vec<Value>>, per_page: u32) -> Self {
        let items = reply.data.unwrap_or_default();
        let pagination = reply
            .pagination
            .unwrap_or_else(|| Pagination::for_total(items.len() as u64, per_page.max(items.len() as u32), 1));
        Self { items, pagination }
    }

    /// Decode every row into `T`. One malformed row fails the whole page.
    pub fn decode<T: Listed>(self, kind: ResourceKind) -> Result<Page<T>> {
        let items = self.items.into_iter().map(|value| T::decode(kind, value)).collect::<Result<Vec<_>>>()?;
        Ok(Page {
            items,
            pagination: self.pagination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, ItemStatus};
    use rstest::rstest;

    #[rstest]
    #[case(0, 15, 1)]
    #[case(15, 15, 1)]
    #[case(16, 15, 2)]
    #[case(42, 15, 3)]
    #[case(42, 0, 42)]
    fn last_page_for_total(#[case] total: u64, #[case] per_page: u32, #[case] last_page: u32) {
        assert_eq!(Pagination::for_total(total, per_page, 1).last_page, last_page);
    }

    #[test]
    fn successful_list_envelope() {
        let envelope: Envelope<Vec<Value>> = serde_json::from_str(
            r#"{
                "success": true,
                "data": [{"id": 1, "name": "a.mp4", "status": "READY"}],
                "pagination": {"total": 42, "per_page": 15, "current_page": 1, "last_page": 3}
            }"#,
        )
        .unwrap();
        let page = Page::from_reply(envelope.into_result().unwrap(), 15);
        assert_eq!(page.pagination, Pagination::for_total(42, 15, 1));
        let page: Page<Item> = page.decode(ResourceKind::Footage).unwrap();
        assert_eq!(page.items[0].status, ItemStatus::Ready);
    }

    #[test]
    fn validation_failure_wins_over_message() {
        let envelope: Envelope<Value> = serde_json::from_str(
            r#"{"success": false, "message": "The given data was invalid.", "errors": {"name": ["Required"]}}"#,
        )
        .unwrap();
        let err = envelope.into_result().unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors.get("name"), ["Required"]);
    }

    #[test]
    fn business_failure_keeps_message() {
        let envelope: Envelope<Value> =
            serde_json::from_str(r#"{"success": false, "message": "Storage quota exceeded", "errors": {}}"#).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert_eq!(*err, ErrorKind::Rejected("Storage quota exceeded".to_string()));
    }

    #[test]
    fn missing_success_flag_is_a_failure() {
        let envelope: Envelope<Value> = serde_json::from_str(r#"{"data": {"id": 1}}"#).unwrap();
        assert!(envelope.into_result().is_err());
    }

    #[test]
    fn unpaginated_list_becomes_single_page() {
        let reply = Reply {
            data: Some(vec![serde_json::json!({"id": 1, "name": "x"}); 3]),
            pagination: None,
            message: None,
        };
        let page = Page::from_reply(reply, 15);
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.last_page, 1);
    }
}
