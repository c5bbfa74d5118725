//! Types for reading and writing tiled state.
//!
//! This crate holds the serializable side of tiled: the item tree as it is stored, the
//! persisted top-level state, the import patch, and the [`Action`] messages that hosts send to
//! mutate a running state.
//!
//! Items are discriminated structurally, the same way the stored JSON has always looked: an
//! object with an `items` array is a [`Group`], an object with a `url` is a [`Tile`].
#![warn(missing_docs)]

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Item of the tab tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Item {
    /// Container of other items.
    Group(Group),
    /// Single web page.
    Tile(Tile),
}

/// Leaf item showing one web page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Unique id of the tile.
    pub id: String,
    /// User-given name, empty when unnamed.
    #[serde(default)]
    pub name: String,
    /// Fixed width override in logical pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Fixed height override in logical pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Whether the tile is collapsed to its header.
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
    /// Pinned navigation target.
    pub url: String,
    /// Last known page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Page icon state.
    #[serde(default, skip_serializing_if = "Favicon::is_unresolved")]
    pub favicon: Favicon,
    /// Zoom level to restore when the page loads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

/// Internal item containing an ordered list of children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique id of the group.
    pub id: String,
    /// User-given name, empty when unnamed.
    #[serde(default)]
    pub name: String,
    /// Fixed width override in logical pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Fixed height override in logical pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Whether the group is collapsed to its header.
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
    /// Children in layout order.
    pub items: Vec<Item>,
    /// Orientation override for the children layout.
    #[serde(default, skip_serializing_if = "VerticalSetting::is_default")]
    pub vertical: VerticalSetting,
}

/// Icon of a tile.
///
/// Stored as a missing field ([`Favicon::Unresolved`]), `null` ([`Favicon::Absent`]) or a
/// string ([`Favicon::Url`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Favicon {
    /// Not known yet, derive one from the page origin.
    #[default]
    Unresolved,
    /// Known to be missing, do not try again.
    Absent,
    /// Explicit icon URL.
    Url(String),
}

/// Orientation override of a group.
///
/// Stored as a missing field ([`VerticalSetting::Default`]), `true` or `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum VerticalSetting {
    /// Follow the computed orientation.
    #[default]
    Default,
    /// Lay children out top to bottom.
    Vertical,
    /// Lay children out left to right.
    Horizontal,
}

/// Top-level state that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    /// Item given exclusive focus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximized_item: Option<String>,
    /// Currently selected item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_item: Option<String>,
    /// In-progress search query, `None` when the search is closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Root items in layout order.
    #[serde(default)]
    pub items: Vec<Item>,
}

/// Partial state from an import payload.
///
/// Only keys present in the payload are `Some`. A key present with `null` is `Some(None)` and
/// clears the current value when merged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    /// Replacement maximized item.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub maximized_item: Option<Option<String>>,
    /// Replacement selected item.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub selected_item: Option<Option<String>>,
    /// Replacement search query.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub search: Option<Option<String>>,
    /// Replacement root items.
    #[serde(default)]
    pub items: Option<Vec<Item>>,
}

/// Side of a sibling that a dragged item is dropped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DropPosition {
    /// Insert right before the sibling.
    Before,
    /// Insert right after the sibling.
    After,
}

/// Actions that change the tab tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Subcommand))]
#[cfg_attr(feature = "clap", command(subcommand_value_name = "ACTION"))]
#[cfg_attr(feature = "clap", command(subcommand_help_heading = "Actions"))]
pub enum Action {
    /// Open a new tile and select it.
    NewTile {
        /// Name of the tile.
        #[cfg_attr(feature = "clap", arg(long, default_value = ""))]
        #[serde(default)]
        name: String,
        /// Address to open, the configured new tile URL if unset.
        #[cfg_attr(feature = "clap", arg(long))]
        #[serde(default)]
        url: Option<String>,
        /// Id of the group to add the tile to.
        #[cfg_attr(feature = "clap", arg(long, conflicts_with = "root"))]
        #[serde(default)]
        group: Option<String>,
        /// Add the tile to the root list instead of the current group.
        #[cfg_attr(feature = "clap", arg(long))]
        #[serde(default)]
        root: bool,
    },
    /// Create an empty group and start renaming it.
    NewGroup {
        /// Id of the group to add the new group to.
        #[cfg_attr(feature = "clap", arg(long, conflicts_with = "root"))]
        #[serde(default)]
        group: Option<String>,
        /// Add the group to the root list instead of the current group.
        #[cfg_attr(feature = "clap", arg(long))]
        #[serde(default)]
        root: bool,
    },
    /// Set the name of an item.
    Rename {
        /// Id of the item.
        id: String,
        /// New name, empty to fall back to the page title.
        name: String,
    },
    /// Close an item together with everything inside it.
    RemoveItem {
        /// Id of the item.
        id: String,
    },
    /// Collapse or expand an item.
    ToggleCollapsed {
        /// Id of the item.
        id: String,
    },
    /// Cycle the children layout of a group through both overrides and back to default.
    ToggleOrientation {
        /// Id of the group.
        id: String,
    },
    /// Move an item to another place in the tree.
    ///
    /// Without `--sibling` the item is appended to `--into`, or to the root list when that is
    /// unset too.
    MoveItem {
        /// Id of the moved item.
        id: String,
        /// Id of the group to append to.
        #[cfg_attr(feature = "clap", arg(long, conflicts_with = "sibling"))]
        #[serde(default)]
        into: Option<String>,
        /// Id of the sibling to drop next to.
        #[cfg_attr(feature = "clap", arg(long, requires = "position"))]
        #[serde(default)]
        sibling: Option<String>,
        /// Side of the sibling to drop on.
        #[cfg_attr(feature = "clap", arg(long, value_enum))]
        #[serde(default)]
        position: Option<DropPosition>,
    },
    /// Set the fixed size of an item along its parent's layout axis.
    SetSize {
        /// Id of the item.
        id: String,
        /// Size in logical pixels.
        size: f64,
    },
    /// Remove the fixed size of an item along its parent's layout axis.
    ClearFixedSize {
        /// Id of the item.
        id: String,
    },
    /// Give an item exclusive focus.
    Maximize {
        /// Id of the item.
        id: String,
    },
    /// Leave the maximized view.
    Restore {},
    /// Select an item.
    Select {
        /// Id of the item.
        id: String,
    },
    /// Clear the selection.
    Deselect {},
    /// Select an item and expand it if it was collapsed.
    Focus {
        /// Id of the item.
        id: String,
    },
    /// Expand every item down to the given one and close the search.
    Reveal {
        /// Id of the item.
        id: String,
    },
    /// Open an empty search.
    StartSearch {},
    /// Replace the search query.
    SetSearch {
        /// New query.
        query: String,
    },
    /// Close the search.
    CloseSearch {},
    /// Make the live location of a tile its pinned URL.
    PinUrl {
        /// Id of the tile.
        id: String,
    },
}

impl Item {
    /// Id of the item.
    pub fn id(&self) -> &str {
        match self {
            Item::Group(group) => &group.id,
            Item::Tile(tile) => &tile.id,
        }
    }

    /// User-given name of the item, possibly empty.
    pub fn name(&self) -> &str {
        match self {
            Item::Group(group) => &group.name,
            Item::Tile(tile) => &tile.name,
        }
    }

    /// Sets the user-given name of the item.
    pub fn set_name(&mut self, name: String) {
        match self {
            Item::Group(group) => group.name = name,
            Item::Tile(tile) => tile.name = name,
        }
    }

    /// Name to show for the item: its own, or a placeholder naming its kind.
    pub fn display_name(&self) -> &str {
        match self {
            _ if !self.name().is_empty() => self.name(),
            Item::Group(_) => "New Group",
            Item::Tile(_) => "New Tile",
        }
    }

    /// Whether the item is collapsed.
    pub fn collapsed(&self) -> bool {
        match self {
            Item::Group(group) => group.collapsed,
            Item::Tile(tile) => tile.collapsed,
        }
    }

    /// Collapses or expands the item.
    pub fn set_collapsed(&mut self, collapsed: bool) {
        match self {
            Item::Group(group) => group.collapsed = collapsed,
            Item::Tile(tile) => tile.collapsed = collapsed,
        }
    }

    /// Fixed size along the given axis.
    pub fn size(&self, vertical: bool) -> Option<f64> {
        match (self, vertical) {
            (Item::Group(group), true) => group.height,
            (Item::Group(group), false) => group.width,
            (Item::Tile(tile), true) => tile.height,
            (Item::Tile(tile), false) => tile.width,
        }
    }

    /// Sets or clears the fixed size along the given axis.
    pub fn set_size(&mut self, vertical: bool, size: Option<f64>) {
        let slot = match (self, vertical) {
            (Item::Group(group), true) => &mut group.height,
            (Item::Group(group), false) => &mut group.width,
            (Item::Tile(tile), true) => &mut tile.height,
            (Item::Tile(tile), false) => &mut tile.width,
        };
        *slot = size;
    }

    /// Children of the item, empty for tiles.
    pub fn children(&self) -> &[Item] {
        match self {
            Item::Group(group) => &group.items,
            Item::Tile(_) => &[],
        }
    }

    /// Returns the group if this item is one.
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Item::Group(group) => Some(group),
            Item::Tile(_) => None,
        }
    }

    /// Returns the group if this item is one.
    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Item::Group(group) => Some(group),
            Item::Tile(_) => None,
        }
    }

    /// Returns the tile if this item is one.
    pub fn as_tile(&self) -> Option<&Tile> {
        match self {
            Item::Tile(tile) => Some(tile),
            Item::Group(_) => None,
        }
    }

    /// Returns the tile if this item is one.
    pub fn as_tile_mut(&mut self) -> Option<&mut Tile> {
        match self {
            Item::Tile(tile) => Some(tile),
            Item::Group(_) => None,
        }
    }
}

impl Tile {
    /// Creates an unsized, expanded tile.
    pub fn new(id: String, name: String, url: String) -> Self {
        Self {
            id,
            name,
            width: None,
            height: None,
            collapsed: false,
            url,
            title: None,
            favicon: Favicon::Unresolved,
            zoom: None,
        }
    }

    /// Page title worth showing next to the name.
    ///
    /// Returns `None` when there is no title or it repeats the name.
    pub fn title_suffix(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty() && *title != self.name)
    }
}

impl Group {
    /// Creates an unsized, expanded group with default orientation.
    pub fn new(id: String, name: String, items: Vec<Item>) -> Self {
        Self {
            id,
            name,
            width: None,
            height: None,
            collapsed: false,
            items,
            vertical: VerticalSetting::Default,
        }
    }
}

impl Favicon {
    /// Whether the icon still has to be derived from the page.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Favicon::Unresolved)
    }
}

impl Serialize for Favicon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Favicon::Url(url) => serializer.serialize_some(url),
            Favicon::Unresolved | Favicon::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Favicon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(url) => Favicon::Url(url),
            None => Favicon::Absent,
        })
    }
}

impl VerticalSetting {
    /// Whether no override is set.
    pub fn is_default(&self) -> bool {
        matches!(self, VerticalSetting::Default)
    }

    /// Override forcing the given orientation.
    pub fn forced(vertical: bool) -> Self {
        if vertical {
            VerticalSetting::Vertical
        } else {
            VerticalSetting::Horizontal
        }
    }

    /// The override as a boolean, `None` when following the computed orientation.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            VerticalSetting::Default => None,
            VerticalSetting::Vertical => Some(true),
            VerticalSetting::Horizontal => Some(false),
        }
    }

    /// Effective orientation given the computed one.
    pub fn resolve(self, computed: bool) -> bool {
        self.as_bool().unwrap_or(computed)
    }
}

impl From<Option<bool>> for VerticalSetting {
    fn from(value: Option<bool>) -> Self {
        value.map_or(VerticalSetting::Default, VerticalSetting::forced)
    }
}

impl From<VerticalSetting> for Option<bool> {
    fn from(value: VerticalSetting) -> Self {
        value.as_bool()
    }
}

impl StoredState {
    /// Parses stored state from its JSON form.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serializes the state the way it is written to storage.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl StatePatch {
    /// Parses an import payload.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
