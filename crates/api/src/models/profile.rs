use crate::models::{Action, ResourceId, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tenant role of the signed-in user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

/// The signed-in user and the capabilities granted to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Permission slugs, e.g. `footage.upload`.
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl Profile {
    pub fn new(id: impl Into<ResourceId>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            ..Default::default()
        }
    }

    pub fn with_permissions(mut self, slugs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.permissions.extend(slugs.into_iter().map(Into::into));
        self
    }

    /// Grant every action on every collection. Test and fixture helper.
    pub fn with_all_permissions(self) -> Self {
        let slugs: Vec<String> = ResourceKind::ALL
            .into_iter()
            .flat_map(|kind| {
                [Action::View, Action::Upload, Action::Manage, Action::Delete].map(|action| kind.permission(action))
            })
            .collect();
        self.with_permissions(slugs)
    }

    pub fn has_permission(&self, slug: &str) -> bool {
        self.permissions.contains(slug)
    }

    pub fn can(&self, kind: ResourceKind, action: Action) -> bool {
        self.has_permission(&kind.permission(action))
    }
}
