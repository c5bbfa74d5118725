//! Item tree state of the tab manager.
//!
//! The tree is a list of root [`Item`]s, each either a tile showing one page or a group owning
//! an ordered list of children. Groups own their children outright; there are no parent links.
//! Every parent or ancestry query goes through the [`PathIndex`], which is derived from the
//! tree and rebuilt at the end of every operation.
//!
//! All changes go through methods of [`AppState`] (or [`AppState::apply`] for serialized
//! [`Action`]s, or [`AppState::dispatch`] for free-form edits). Each of them is one atomic
//! transition: it changes the tree, then rebuilds the index and drops references to items that
//! no longer exist. Since they all take `&mut self`, nothing can observe the state in between.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

use tiled_config::Config;
use tiled_ipc::{Action, DropPosition, Item, Tile};

use crate::webview::normalize_address;

pub use self::drag::{drop_position, DropHandler, ResizeItem};
pub use self::index::PathIndex;
pub use self::nav::{
    collect_ids, find_item, find_item_mut, item_orientation, switch_vertical_setting, take_item,
    Orientation, ROOT_VERTICAL,
};
pub use self::ops::{DropTarget, InsertTarget};

mod drag;
mod index;
mod nav;
mod ops;
mod visibility;


/// Settings that operations need from the config.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Address of tiles opened without one.
    pub new_tile_url: String,
    /// Prefix that address-bar searches are appended to.
    pub search_url: String,
}

/// Tab tree with its selection, transient interaction state and derived index.
#[derive(Debug, Clone)]
pub struct AppState {
    pub(crate) items: Vec<Item>,
    pub(crate) maximized_item: Option<String>,
    pub(crate) selected_item: Option<String>,
    pub(crate) search: Option<String>,
    /// Item whose name is being edited.
    pub(crate) edit_item_name: Option<String>,
    pub(crate) resize_item: Option<ResizeItem>,
    pub(crate) drag_item: Option<String>,
    /// Current location of each tile's view, which can differ from the pinned URL.
    pub(crate) locations: HashMap<String, String>,
    pub(crate) index: PathIndex,
    pub(crate) options: Rc<Options>,
}

impl Options {
    pub fn from_config(config: &Config) -> Self {
        Self {
            new_tile_url: config.new_tile_url.clone(),
            search_url: config.search_url.clone(),
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl AppState {
    /// Creates a state holding `items` with nothing selected.
    pub fn with_options(items: Vec<Item>, options: Rc<Options>) -> Self {
        let mut state = Self {
            items,
            maximized_item: None,
            selected_item: None,
            search: None,
            edit_item_name: None,
            resize_item: None,
            drag_item: None,
            locations: HashMap::new(),
            index: PathIndex::default(),
            options,
        };
        state.commit();
        state
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn maximized_item(&self) -> Option<&str> {
        self.maximized_item.as_deref()
    }

    pub fn selected_item(&self) -> Option<&str> {
        self.selected_item.as_deref()
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn edit_item_name(&self) -> Option<&str> {
        self.edit_item_name.as_deref()
    }

    pub fn resize_item(&self) -> Option<&ResizeItem> {
        self.resize_item.as_ref()
    }

    pub fn drag_item(&self) -> Option<&str> {
        self.drag_item.as_deref()
    }

    /// Runs a free-form edit of the item tree, then rebuilds the index.
    ///
    /// References to items that the edit removed are cleared.
    pub fn dispatch<R>(&mut self, f: impl FnOnce(&mut Vec<Item>) -> R) -> R {
        let result = f(&mut self.items);
        self.commit();
        result
    }

    /// Applies a serialized action.
    pub fn apply(&mut self, action: Action) {
        debug!("applying {action:?}");

        match action {
            Action::NewTile {
                name,
                url,
                group,
                root,
            } => {
                let url = match url {
                    Some(url) => normalize_address(&url, &self.options.search_url),
                    None => self.options.new_tile_url.clone(),
                };
                self.new_tile(name, url, InsertTarget::from_args(group, root));
            }
            Action::NewGroup { group, root } => {
                self.new_group(InsertTarget::from_args(group, root));
            }
            Action::Rename { id, name } => {
                self.rename(&id, name);
            }
            Action::RemoveItem { id } => {
                self.remove_item(&id);
            }
            Action::ToggleCollapsed { id } => {
                self.toggle_collapsed(&id);
            }
            Action::ToggleOrientation { id } => {
                self.toggle_orientation(&id);
            }
            Action::MoveItem {
                id,
                into,
                sibling,
                position,
            } => {
                let target = match sibling {
                    Some(sibling) => DropTarget::Sibling {
                        id: sibling,
                        position: position.unwrap_or(DropPosition::After),
                    },
                    None => DropTarget::Container(into),
                };
                self.move_item(&id, &target);
            }
            Action::SetSize { id, size } => {
                self.set_size(&id, size);
            }
            Action::ClearFixedSize { id } => {
                self.clear_fixed_size(&id);
            }
            Action::Maximize { id } => self.set_maximized(Some(id)),
            Action::Restore {} => self.set_maximized(None),
            Action::Select { id } => self.set_selected(Some(id)),
            Action::Deselect {} => self.set_selected(None),
            Action::Focus { id } => self.focus(&id),
            Action::Reveal { id } => self.reveal(&id),
            Action::StartSearch {} => self.start_search(),
            Action::SetSearch { query } => self.set_search(query),
            Action::CloseSearch {} => self.close_search(),
            Action::PinUrl { id } => {
                self.pin_url(&id);
            }
        }
    }

    /// Rebuilds the path index and clears references to items that are gone.
    pub(crate) fn commit(&mut self) {
        self.index = PathIndex::build(&self.items);

        let index = &self.index;
        for (field, slot) in [
            ("maximized", &mut self.maximized_item),
            ("selected", &mut self.selected_item),
            ("edited", &mut self.edit_item_name),
            ("dragged", &mut self.drag_item),
        ] {
            if slot.as_deref().is_some_and(|id| !index.contains(id)) {
                debug!("clearing {field} item {slot:?}, it is no longer in the tree");
                *slot = None;
            }
        }

        if self
            .resize_item
            .as_ref()
            .is_some_and(|resize| !index.contains(&resize.id))
        {
            debug!("cancelling resize of a removed item");
            self.resize_item = None;
        }

        self.locations.retain(|id, _| index.contains(id));
    }

    /// Renders the tree as indented text, one item per line.
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        if self.items.is_empty() {
            out.push_str("(empty)\n");
            return out;
        }

        for item in &self.items {
            self.debug_tree_item(item, ROOT_VERTICAL, 0, &mut out);
        }
        out
    }

    fn debug_tree_item(&self, item: &Item, parent_vertical: bool, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let orientation = item_orientation(item, parent_vertical);

        let _ = match item {
            Item::Group(group) => {
                let axis = if orientation.effective {
                    "vertical"
                } else {
                    "horizontal"
                };
                let forced = if group.vertical.is_default() { "" } else { "!" };
                write!(out, "{indent}Group {} ({axis}{forced})", item.display_name())
            }
            Item::Tile(tile) => write!(out, "{indent}Tile {} <{}>", item.display_name(), tile.url),
        };

        if let Some(title) = item.as_tile().and_then(Tile::title_suffix) {
            let _ = write!(out, " {title:?}");
        }

        if item.collapsed() {
            out.push_str(" collapsed");
        }
        if self.maximized_item.as_deref() == Some(item.id()) {
            out.push_str(" maximized");
        }
        if self.selected_item.as_deref() == Some(item.id()) {
            out.push_str(" *");
        }
        out.push('\n');

        for child in item.children() {
            self.debug_tree_item(child, orientation.effective, depth + 1, out);
        }
    }
}
