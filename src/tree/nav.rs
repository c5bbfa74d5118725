use tiled_ipc::{Group, Item, VerticalSetting};

use super::AppState;

/// Orientation of the root item list: left to right.
pub const ROOT_VERTICAL: bool = false;

/// Layout axis of an item's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    /// Orientation in effect, honoring the override.
    pub effective: bool,
    /// Orientation the item gets without an override.
    pub computed: bool,
}

/// Finds an item anywhere in `items`, searching in pre-order.
pub fn find_item<'a>(items: &'a [Item], id: &str) -> Option<&'a Item> {
    for item in items {
        if item.id() == id {
            return Some(item);
        }
        if let Item::Group(group) = item {
            if let Some(found) = find_item(&group.items, id) {
                return Some(found);
            }
        }
    }
    None
}

pub fn find_item_mut<'a>(items: &'a mut [Item], id: &str) -> Option<&'a mut Item> {
    for item in items {
        if item.id() == id {
            return Some(item);
        }
        if let Item::Group(group) = item {
            if let Some(found) = find_item_mut(&mut group.items, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Detaches an item, with everything inside it, from wherever it lives in `items`.
pub fn take_item(items: &mut Vec<Item>, id: &str) -> Option<Item> {
    if let Some(idx) = items.iter().position(|item| item.id() == id) {
        return Some(items.remove(idx));
    }
    for item in items.iter_mut() {
        if let Item::Group(group) = item {
            if let Some(taken) = take_item(&mut group.items, id) {
                return Some(taken);
            }
        }
    }
    None
}

/// Collects the ids of an item and all its descendants.
pub fn collect_ids(item: &Item, out: &mut Vec<String>) {
    out.push(item.id().to_owned());
    for child in item.children() {
        collect_ids(child, out);
    }
}

/// Resolves each id of `path` level by level, starting at `items`.
fn resolve_path<'a>(items: &'a [Item], path: &[String]) -> Option<Vec<&'a Item>> {
    let mut resolved = Vec::with_capacity(path.len());
    let mut level = items;
    for id in path {
        let item = level.iter().find(|item| item.id() == id)?;
        level = item.children();
        resolved.push(item);
    }
    Some(resolved)
}

/// Computed and effective orientation of an item whose parent lays out along
/// `parent_vertical`.
pub fn item_orientation(item: &Item, parent_vertical: bool) -> Orientation {
    let computed = !parent_vertical;
    let effective = match item {
        Item::Group(group) => group.vertical.resolve(computed),
        Item::Tile(_) => computed,
    };
    Orientation {
        effective,
        computed,
    }
}

/// Next orientation override when the user toggles a group's layout.
///
/// Cycles default, forced opposite of the computed orientation, forced computed orientation,
/// and back to default.
pub fn switch_vertical_setting(current: VerticalSetting, computed: bool) -> VerticalSetting {
    match current.as_bool() {
        None => VerticalSetting::forced(!computed),
        Some(vertical) if vertical != computed => VerticalSetting::forced(!vertical),
        Some(_) => VerticalSetting::Default,
    }
}

impl AppState {
    /// Finds an item anywhere in the tree.
    pub fn find_item(&self, id: &str) -> Option<&Item> {
        find_item(&self.items, id)
    }

    /// Group directly containing `id`, `None` for root items.
    pub fn parent(&self, id: &str) -> Option<&Group> {
        let parent_id = self.index.parent_id(id)?;
        let parent = self.find_item(parent_id);
        debug_assert!(
            parent.is_some_and(|item| item.as_group().is_some()),
            "indexed parent {parent_id} of {id} is not a group in the tree"
        );
        parent?.as_group()
    }

    /// Items next to `id`, including itself, in layout order.
    pub fn siblings(&self, id: &str) -> Option<&[Item]> {
        if !self.index.contains(id) {
            return None;
        }
        match self.index.parent_id(id) {
            Some(_) => self.parent(id).map(|group| group.items.as_slice()),
            None => Some(&self.items),
        }
    }

    /// Whether `id` is the last item of its parent.
    pub fn is_last_sibling(&self, id: &str) -> bool {
        self.siblings(id)
            .and_then(|siblings| siblings.last())
            .is_some_and(|last| last.id() == id)
    }

    /// Orientation of an item's children, `None` for unknown ids.
    ///
    /// The root list runs horizontally, and every group without an override runs
    /// perpendicular to the group containing it.
    pub fn orientation(&self, id: &str) -> Option<Orientation> {
        let path = self.index.path(id)?;
        let chain = resolve_path(&self.items, path);
        debug_assert!(chain.is_some(), "stale path index for {id}");
        let Some(chain) = chain else {
            error!("indexed path of {id} does not resolve in the tree");
            return None;
        };

        let mut parent_vertical = ROOT_VERTICAL;
        let mut orientation = None;
        for item in chain {
            let current = item_orientation(item, parent_vertical);
            parent_vertical = current.effective;
            orientation = Some(current);
        }
        orientation
    }

    /// Effective orientation of the list containing `id`.
    ///
    /// This is the axis along which the item's fixed size applies: `true` means height.
    pub fn parent_vertical(&self, id: &str) -> Option<bool> {
        if !self.index.contains(id) {
            return None;
        }
        match self.index.parent_id(id) {
            Some(parent_id) => self.orientation(parent_id).map(|o| o.effective),
            None => Some(ROOT_VERTICAL),
        }
    }

    /// Id of the group that new items go to when no target is given.
    ///
    /// Walks up from the selected item until it reaches a group. `None` means the root list.
    pub fn current_group_id(&self) -> Option<&str> {
        let mut id = self.selected_item.as_deref()?;
        loop {
            match self.find_item(id)? {
                Item::Group(group) => return Some(&group.id),
                Item::Tile(_) => id = self.index.parent_id(id)?,
            }
        }
    }

    /// Mutable child list of `parent`, the root list for `None`.
    pub(super) fn children_mut(&mut self, parent: Option<&str>) -> Option<&mut Vec<Item>> {
        match parent {
            None => Some(&mut self.items),
            Some(id) => find_item_mut(&mut self.items, id)?
                .as_group_mut()
                .map(|group| &mut group.items),
        }
    }
}
