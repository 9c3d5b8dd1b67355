use crate::models::{ItemStatus, ResourceId, ResourceKind};

/// Narrowing applied to a collection listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub status: Option<ItemStatus>,
    pub folder_id: Option<ResourceId>,
    pub user_id: Option<ResourceId>,
    pub search: Option<String>,
}

impl Filters {
    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_folder(mut self, folder_id: impl Into<ResourceId>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<ResourceId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Blank searches are dropped rather than sent as `search=`.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.set_search(search);
        self
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        let trimmed = search.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }
}

/// A fully specified list request: which page, how big, and which rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub filters: Filters,
}

impl ListQuery {
    pub fn new(page: u32, per_page: u32, filters: Filters) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            filters,
        }
    }

    /// Query-string pairs, with statuses spelled the way `kind` expects.
    pub fn to_pairs(&self, kind: ResourceKind) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("per_page", self.per_page.to_string())];
        if let Some(status) = self.filters.status {
            pairs.push(("status", status.to_wire(kind).to_string()));
        }
        if let Some(folder_id) = &self.filters.folder_id {
            pairs.push(("folder_id", folder_id.to_string()));
        }
        if let Some(user_id) = &self.filters.user_id {
            pairs.push(("user_id", user_id.to_string()));
        }
        if let Some(search) = &self.filters.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}
