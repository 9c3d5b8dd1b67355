use crate::error::{ErrorKind, Result};
use clipflow_api::models::{Folder, ResourceId, ResourceKind};
use clipflow_api::{Filters, ListQuery, ResourceClient, list_typed};
use std::collections::{BTreeMap, HashSet};

/// Folders of one library, indexed by id and linked through `parent_id`.
///
/// The backend promises an acyclic tree; walks still stop at the first
/// repeated folder so a bad response cannot hang the caller.
#[derive(Debug, Clone, Default)]
pub struct FolderTree {
    folders: BTreeMap<ResourceId, Folder>,
}

impl FolderTree {
    pub fn new(folders: impl IntoIterator<Item = Folder>) -> Self {
        Self {
            folders: folders.into_iter().map(|folder| (folder.id.clone(), folder)).collect(),
        }
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Folder> {
        self.folders.get(id)
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Folders without a (known) parent.
    pub fn roots(&self) -> Vec<&Folder> {
        self.folders
            .values()
            .filter(|folder| folder.parent_id.as_ref().is_none_or(|parent| !self.folders.contains_key(parent)))
            .collect()
    }

    pub fn children(&self, id: &ResourceId) -> Vec<&Folder> {
        self.folders.values().filter(|folder| folder.parent_id.as_ref() == Some(id)).collect()
    }

    /// Path from the root down to `id`, inclusive. Empty if `id` is unknown.
    pub fn breadcrumbs(&self, id: &ResourceId) -> Vec<&Folder> {
        let mut seen = HashSet::new();
        let mut path = Vec::new();
        let mut current = self.folders.get(id);
        while let Some(folder) = current {
            if !seen.insert(&folder.id) {
                tracing::warn!(folder = %folder.id, "Folder parent chain loops; cutting breadcrumbs short");
                break;
            }
            path.push(folder);
            current = folder.parent_id.as_ref().and_then(|parent| self.folders.get(parent));
        }
        path.reverse();
        path
    }

    /// Depth-first walk from the roots, yielding each folder with its depth.
    pub fn walk(&self) -> Vec<(usize, &Folder)> {
        let mut out = Vec::with_capacity(self.folders.len());
        let mut seen = HashSet::new();
        let mut stack: Vec<(usize, &Folder)> = self.roots().into_iter().rev().map(|folder| (0, folder)).collect();
        while let Some((depth, folder)) = stack.pop() {
            if !seen.insert(&folder.id) {
                continue;
            }
            out.push((depth, folder));
            stack.extend(self.children(&folder.id).into_iter().rev().map(|child| (depth + 1, child)));
        }
        out
    }
}

/// Fetch every page of a folder collection and assemble the tree.
#[tracing::instrument(skip(client), fields(client = %client.name()))]
pub async fn load_folder_tree(client: &dyn ResourceClient, kind: ResourceKind, per_page: u32) -> Result<FolderTree> {
    let mut folders = Vec::new();
    let mut page = 1;
    loop {
        let query = ListQuery::new(page, per_page, Filters::default());
        let listing = list_typed::<Folder>(client, kind, &query).await.map_err(ErrorKind::api)?;
        folders.extend(listing.items);
        if page >= listing.pagination.last_page {
            break;
        }
        page += 1;
    }
    tracing::debug!(%kind, folders = folders.len(), "Folder tree loaded");
    Ok(FolderTree::new(folders))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipflow_api::client::MockClient;
    use serde_json::json;

    fn folder(id: u64, parent: Option<u64>) -> Folder {
        Folder {
            id: ResourceId::from(id),
            name: format!("f{id}"),
            parent_id: parent.map(ResourceId::from),
            item_count: 0,
        }
    }

    fn names(folders: Vec<&Folder>) -> Vec<&str> {
        folders.into_iter().map(|folder| folder.name.as_str()).collect()
    }

    #[test]
    fn test_breadcrumbs_root_to_leaf() {
        let tree = FolderTree::new([folder(1, None), folder(2, Some(1)), folder(3, Some(2)), folder(4, Some(1))]);
        assert_eq!(names(tree.breadcrumbs(&ResourceId::from(3u64))), vec!["f1", "f2", "f3"]);
        assert_eq!(names(tree.children(&ResourceId::from(1u64))), vec!["f2", "f4"]);
        assert_eq!(names(tree.roots()), vec!["f1"]);
        assert!(tree.breadcrumbs(&ResourceId::from(9u64)).is_empty());
    }

    #[test]
    fn test_cycles_are_cut() {
        let tree = FolderTree::new([folder(1, Some(2)), folder(2, Some(1))]);
        assert_eq!(tree.breadcrumbs(&ResourceId::from(1u64)).len(), 2);
        assert!(tree.roots().is_empty());
        assert!(tree.walk().is_empty());
    }

    #[test]
    fn test_walk_depths() {
        let tree = FolderTree::new([folder(1, None), folder(2, Some(1)), folder(3, Some(2)), folder(5, None)]);
        let walked: Vec<(usize, &str)> = tree.walk().into_iter().map(|(d, f)| (d, f.name.as_str())).collect();
        assert_eq!(walked, vec![(0, "f1"), (1, "f2"), (2, "f3"), (0, "f5")]);
    }

    #[tokio::test]
    async fn test_load_reads_every_page() {
        let rows = (1..=7).map(|id| json!({"id": id, "name": format!("f{id}"), "parent_id": (id > 1).then_some(1)}));
        let client = MockClient::default().with_items(ResourceKind::MediaFolders, rows);
        let tree = load_folder_tree(&client, ResourceKind::MediaFolders, 3).await.unwrap();
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.children(&ResourceId::from(1u64)).len(), 6);
        assert_eq!(client.queries().await.len(), 3);
    }
}
