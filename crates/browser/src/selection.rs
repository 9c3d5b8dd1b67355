use std::collections::BTreeSet;

/// Set of checked row identifiers.
///
/// "Select all" uses exact-deselect semantics: when every id on the page is
/// already checked, exactly those ids are unchecked and anything selected
/// elsewhere is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<K: Ord> {
    ids: BTreeSet<K>,
}

impl<K: Ord + Clone> Selection<K> {
    pub fn new() -> Self {
        Self { ids: BTreeSet::new() }
    }

    /// Check `id` if unchecked, uncheck it otherwise. Returns whether `id` is
    /// now selected.
    pub fn toggle(&mut self, id: K) -> bool {
        if self.ids.remove(&id) {
            return false;
        }
        self.ids.insert(id);
        true
    }

    /// Toggle the whole page: uncheck exactly `page` if all of it is checked,
    /// check all of it otherwise. Returns whether the page is now selected.
    pub fn select_all_on_page<'a>(&mut self, page: impl IntoIterator<Item = &'a K>) -> bool
    where
        K: 'a,
    {
        let page: Vec<&K> = page.into_iter().collect();
        if page.is_empty() {
            return false;
        }
        if page.iter().all(|id| self.ids.contains(*id)) {
            for id in page {
                self.ids.remove(id);
            }
            return false;
        }
        self.ids.extend(page.into_iter().cloned());
        true
    }

    /// Whether every id in `page` is selected (and `page` is not empty).
    pub fn is_page_selected<'a>(&self, page: impl IntoIterator<Item = &'a K>) -> bool
    where
        K: 'a,
    {
        let mut any = false;
        for id in page {
            if !self.ids.contains(id) {
                return false;
            }
            any = true;
        }
        any
    }

    pub fn contains(&self, id: &K) -> bool {
        self.ids.contains(id)
    }

    pub fn remove(&mut self, id: &K) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.ids.iter()
    }
}

impl<K: Ord + Clone> Default for Selection<K> {
    fn default() -> Self {
        Self::new()
    }
}
