use std::collections::HashMap;

use tiled_ipc::Item;

/// Ancestor paths of every item in a tree.
///
/// Each path runs from a root item down to the item itself, inclusive. The index holds ids
/// only and is rebuilt from scratch after every change to the tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathIndex {
    paths: HashMap<String, Vec<String>>,
}

impl PathIndex {
    /// Builds the index with a pre-order traversal of `items`.
    pub fn build(items: &[Item]) -> Self {
        let mut index = Self::default();
        let mut path = Vec::new();
        index.insert_items(items, &mut path);
        trace!("rebuilt path index with {} items", index.paths.len());
        index
    }

    fn insert_items(&mut self, items: &[Item], path: &mut Vec<String>) {
        for item in items {
            let id = item.id();
            path.push(id.to_owned());

            if self.paths.contains_key(id) {
                warn!("duplicate item id {id}, keeping the first occurrence");
            } else {
                self.paths.insert(id.to_owned(), path.clone());
            }

            if let Item::Group(group) = item {
                self.insert_items(&group.items, path);
            }

            path.pop();
        }
    }

    /// Path from a root item down to `id`.
    pub fn path(&self, id: &str) -> Option<&[String]> {
        self.paths.get(id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.paths.contains_key(id)
    }

    /// Id of the group directly containing `id`, `None` for root items and unknown ids.
    pub fn parent_id(&self, id: &str) -> Option<&str> {
        let path = self.path(id)?;
        let len = path.len();
        (len >= 2).then(|| path[len - 2].as_str())
    }

    /// Whether `ancestor` is `id` itself or one of the groups containing it.
    pub fn is_within(&self, id: &str, ancestor: &str) -> bool {
        self.path(id)
            .is_some_and(|path| path.iter().any(|other| other == ancestor))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }
}
