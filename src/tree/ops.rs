use tiled_ipc::{DropPosition, Group, Item, Tile, VerticalSetting};

use super::nav::{collect_ids, find_item, find_item_mut, switch_vertical_setting, take_item};
use super::AppState;
use crate::id::new_id;

/// Where a new item goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertTarget {
    /// End of the root list.
    Root,
    /// End of the given group.
    Group(String),
    /// End of the group owning the selected item, or of the root list.
    Current,
}

/// Where a dragged item lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Appended to a group, or to the root list for `None`.
    Container(Option<String>),
    /// Next to another item, in that item's parent.
    Sibling { id: String, position: DropPosition },
}

impl InsertTarget {
    pub fn from_args(group: Option<String>, root: bool) -> Self {
        match (group, root) {
            (Some(id), _) => InsertTarget::Group(id),
            (None, true) => InsertTarget::Root,
            (None, false) => InsertTarget::Current,
        }
    }
}

impl DropTarget {
    /// Id of the item the drop happened on, `None` for the root list.
    pub fn id(&self) -> Option<&str> {
        match self {
            DropTarget::Container(id) => id.as_deref(),
            DropTarget::Sibling { id, .. } => Some(id),
        }
    }
}

impl AppState {
    /// Group that `target` refers to, `None` for the root list.
    fn resolve_target(&self, target: &InsertTarget) -> Option<String> {
        match target {
            InsertTarget::Root => None,
            InsertTarget::Group(id) => {
                if self.is_group(id) {
                    Some(id.clone())
                } else {
                    warn!("insert target {id} is not a group, using the current group");
                    self.current_group_id().map(str::to_owned)
                }
            }
            InsertTarget::Current => self.current_group_id().map(str::to_owned),
        }
    }

    fn insert(&mut self, target: &InsertTarget, item: Item) {
        let parent = self.resolve_target(target);
        match self.children_mut(parent.as_deref()) {
            Some(items) => items.push(item),
            None => self.items.push(item),
        }
    }

    /// Opens a new tile at the end of `target` and selects it.
    pub fn new_tile(&mut self, name: String, url: String, target: InsertTarget) -> String {
        let id = new_id();
        debug!("new tile {id} at {url}");

        self.insert(&target, Item::Tile(Tile::new(id.clone(), name, url)));
        self.selected_item = Some(id.clone());

        self.commit();
        id
    }

    /// Creates an empty group at the end of `target`, selects it and starts renaming it.
    pub fn new_group(&mut self, target: InsertTarget) -> String {
        let id = new_id();
        debug!("new group {id}");

        self.insert(&target, Item::Group(Group::new(id.clone(), String::new(), Vec::new())));
        self.selected_item = Some(id.clone());
        self.edit_item_name = Some(id.clone());

        self.commit();
        id
    }

    /// Starts editing the name of an item.
    pub fn begin_rename(&mut self, id: &str) -> bool {
        if !self.index.contains(id) {
            return false;
        }
        self.edit_item_name = Some(id.to_owned());
        self.commit();
        true
    }

    /// Stores the edited name and leaves rename mode.
    pub fn commit_rename(&mut self, id: &str, name: String) -> bool {
        let Some(item) = find_item_mut(&mut self.items, id) else {
            return false;
        };
        item.set_name(name);
        if self.edit_item_name.as_deref() == Some(id) {
            self.edit_item_name = None;
        }
        self.commit();
        true
    }

    /// Leaves rename mode without touching the name.
    pub fn cancel_rename(&mut self, id: &str) {
        if self.edit_item_name.as_deref() == Some(id) {
            self.edit_item_name = None;
        }
        self.commit();
    }

    pub fn rename(&mut self, id: &str, name: String) -> bool {
        let Some(item) = find_item_mut(&mut self.items, id) else {
            return false;
        };
        item.set_name(name);
        self.commit();
        true
    }

    /// Removes an item with everything inside it.
    ///
    /// Top-level references into the removed subtree are cleared. Unknown ids are ignored.
    pub fn remove_item(&mut self, id: &str) -> Option<Item> {
        let removed = take_item(&mut self.items, id)?;
        debug!("removed item {id}");

        let mut removed_ids = Vec::new();
        collect_ids(&removed, &mut removed_ids);
        for slot in [
            &mut self.maximized_item,
            &mut self.selected_item,
            &mut self.edit_item_name,
            &mut self.drag_item,
        ] {
            if slot.as_ref().is_some_and(|other| removed_ids.contains(other)) {
                *slot = None;
            }
        }

        self.commit();
        Some(removed)
    }

    /// Collapses or expands an item.
    ///
    /// A collapsed item can't stay selected, maximized or in rename mode.
    pub fn toggle_collapsed(&mut self, id: &str) -> bool {
        let Some(item) = find_item_mut(&mut self.items, id) else {
            return false;
        };
        let collapsed = !item.collapsed();
        item.set_collapsed(collapsed);

        if collapsed {
            for slot in [
                &mut self.selected_item,
                &mut self.maximized_item,
                &mut self.edit_item_name,
            ] {
                if slot.as_deref() == Some(id) {
                    *slot = None;
                }
            }
        }

        self.commit();
        true
    }

    /// Advances the orientation override of a group, returning the new setting.
    pub fn toggle_orientation(&mut self, id: &str) -> Option<VerticalSetting> {
        let computed = self.orientation(id)?.computed;
        let group = find_item_mut(&mut self.items, id)?.as_group_mut()?;

        group.vertical = switch_vertical_setting(group.vertical, computed);
        let vertical = group.vertical;
        debug!("group {id} orientation is now {vertical:?}");

        self.commit();
        Some(vertical)
    }

    /// Moves an item to a new place in the tree.
    ///
    /// Dropping an item onto itself or into its own subtree does nothing, as do unknown ids.
    /// Returns whether the tree changed.
    pub fn move_item(&mut self, dragged: &str, target: &DropTarget) -> bool {
        if target.id() == Some(dragged) || !self.index.contains(dragged) {
            return false;
        }

        if let Some(target_id) = target.id() {
            let Some(path) = self.index.path(target_id) else {
                return false;
            };
            if path.iter().any(|id| id == dragged) {
                debug!("not moving {dragged} into its own subtree");
                return false;
            }
        }

        let sibling_parent = match target {
            DropTarget::Container(Some(id)) => {
                if !self.is_group(id) {
                    return false;
                }
                None
            }
            DropTarget::Container(None) => None,
            DropTarget::Sibling { id, .. } => self.index.parent_id(id).map(str::to_owned),
        };

        let Some(item) = take_item(&mut self.items, dragged) else {
            return false;
        };

        let (list, insert_idx) = match target {
            DropTarget::Container(parent) => {
                let list = self.children_mut(parent.as_deref());
                let len = list.as_ref().map_or(0, |list| list.len());
                (list, len)
            }
            DropTarget::Sibling { id, position } => {
                let list = self.children_mut(sibling_parent.as_deref());
                let idx = list
                    .as_ref()
                    .and_then(|list| list.iter().position(|other| other.id() == id))
                    .unwrap_or(0);
                let idx = match position {
                    DropPosition::Before => idx,
                    DropPosition::After => idx + 1,
                };
                (list, idx)
            }
        };

        match list {
            Some(list) => {
                let idx = insert_idx.min(list.len());
                list.insert(idx, item);
            }
            None => {
                error!("drop target of {dragged} vanished, appending to the root list");
                self.items.push(item);
            }
        }
        debug!("moved {dragged} to {target:?}");

        self.commit();
        true
    }

    /// Sets the fixed size of an item along its parent's axis.
    pub fn set_size(&mut self, id: &str, size: f64) -> bool {
        let Some(vertical) = self.parent_vertical(id) else {
            return false;
        };
        let Some(item) = find_item_mut(&mut self.items, id) else {
            return false;
        };
        item.set_size(vertical, Some(size));
        self.commit();
        true
    }

    /// Drops the fixed size of an item along its parent's axis.
    pub fn clear_fixed_size(&mut self, id: &str) -> bool {
        let Some(vertical) = self.parent_vertical(id) else {
            return false;
        };
        let Some(item) = find_item_mut(&mut self.items, id) else {
            return false;
        };
        item.set_size(vertical, None);
        self.commit();
        true
    }

    /// Fixed size that applies to an item right now.
    ///
    /// Sizes are ignored on collapsed items, on the last item of a list (which takes the
    /// remaining space) and while any item is maximized.
    pub fn fixed_size(&self, id: &str) -> Option<f64> {
        let item = self.find_item(id)?;
        if item.collapsed() || self.maximized_item.is_some() || self.is_last_sibling(id) {
            return None;
        }
        item.size(self.parent_vertical(id)?)
    }

    /// Whether an item has a resize handle.
    ///
    /// It must be expanded, not last in its list, and not the only visible item of its list
    /// because it or something inside it is maximized.
    pub fn is_resizable(&self, id: &str) -> bool {
        let Some(item) = self.find_item(id) else {
            return false;
        };
        let sole_visible = self
            .maximized_item
            .as_deref()
            .is_some_and(|maximized| self.index.is_within(maximized, id));

        !item.collapsed() && !self.is_last_sibling(id) && !sole_visible
    }

    pub fn set_maximized(&mut self, id: Option<String>) {
        self.maximized_item = id;
        self.commit();
    }

    pub fn set_selected(&mut self, id: Option<String>) {
        self.selected_item = id;
        self.commit();
    }

    /// Selects an item, expanding it if it was collapsed.
    pub fn focus(&mut self, id: &str) {
        if self.selected_item.as_deref() == Some(id) {
            return;
        }
        let Some(item) = find_item_mut(&mut self.items, id) else {
            return;
        };
        item.set_collapsed(false);
        self.selected_item = Some(id.to_owned());
        self.commit();
    }

    /// Expands every item from the root down to `id` and closes the search.
    pub fn reveal(&mut self, id: &str) {
        let Some(path) = self.index.path(id).map(<[String]>::to_vec) else {
            return;
        };
        for ancestor in &path {
            if let Some(item) = find_item_mut(&mut self.items, ancestor) {
                item.set_collapsed(false);
            }
        }
        self.search = None;
        self.commit();
    }

    /// Opens an empty search, dropping the selection.
    pub fn start_search(&mut self) {
        self.search = Some(String::new());
        self.selected_item = None;
        self.commit();
    }

    pub fn set_search(&mut self, query: String) {
        self.search = Some(query);
        self.commit();
    }

    pub fn close_search(&mut self) {
        self.search = None;
        self.commit();
    }

    /// Whether an item is a group.
    pub fn is_group(&self, id: &str) -> bool {
        find_item(&self.items, id).is_some_and(|item| item.as_group().is_some())
    }
}
