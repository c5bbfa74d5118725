//! Saving, loading, export and import of the tab tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone};
use tiled_ipc::{Group, Item, StatePatch, StoredState, Tile};

use crate::id::new_id;
use crate::tree::{AppState, Options};
use crate::webview::BLANK_URL;

/// Prefix of exported state.
pub const DATA_URI_PREFIX: &str = "data:application/json;base64,";

/// Import payload that could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("unknown import format, expected a data:application/json;base64 URI")]
    UnknownFormat,
    #[error("invalid base64 in import payload")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid state in import payload")]
    Json(#[from] serde_json::Error),
}

/// Place where the stored state lives between runs.
pub trait Storage {
    /// Reads the stored state, `None` if nothing was saved yet.
    fn load(&self) -> anyhow::Result<Option<StoredState>>;
    /// Replaces the stored state.
    fn save(&mut self, state: &StoredState) -> anyhow::Result<()>;
}

/// Stored state as pretty-printed JSON in a file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

/// Stored state kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Option<StoredState>,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn load(&self) -> anyhow::Result<Option<StoredState>> {
        if !self.path.exists() {
            debug!("no stored state at {:?}", self.path);
            return Ok(None);
        }

        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("error reading {:?}", self.path))?;
        let state = StoredState::from_json(&text)
            .with_context(|| format!("error parsing stored state from {:?}", self.path))?;
        Ok(Some(state))
    }

    fn save(&mut self, state: &StoredState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("error creating directory {parent:?}"))?;
        }

        let json = state.to_json_pretty().context("error serializing state")?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json).with_context(|| format!("error writing {temp_path:?}"))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("error replacing {:?}", self.path))?;

        debug!("saved state to {:?}", self.path);
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> anyhow::Result<Option<StoredState>> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &StoredState) -> anyhow::Result<()> {
        self.state = Some(state.clone());
        Ok(())
    }
}

/// State of a fresh install: one unnamed group holding a blank tile.
pub fn default_stored_state() -> StoredState {
    let tile = Tile::new(new_id(), String::from("Blank"), BLANK_URL.to_owned());
    let group = Group::new(new_id(), String::new(), vec![Item::Tile(tile)]);
    StoredState {
        items: vec![Item::Group(group)],
        ..StoredState::default()
    }
}

impl AppState {
    /// Restores a state saved with [`AppState::to_stored`].
    pub fn from_stored(stored: StoredState) -> Self {
        Self::with_stored(stored, Rc::new(Options::default()))
    }

    /// Restores a saved state with the given options.
    ///
    /// Selection and maximize referring to items that are not in the tree are dropped.
    pub fn with_stored(stored: StoredState, options: Rc<Options>) -> Self {
        let mut state = Self::with_options(stored.items, options);
        state.maximized_item = stored.maximized_item;
        state.selected_item = stored.selected_item;
        state.search = stored.search;
        state.commit();
        state
    }

    /// Part of the state that is saved between runs.
    pub fn to_stored(&self) -> StoredState {
        StoredState {
            maximized_item: self.maximized_item.clone(),
            selected_item: self.selected_item.clone(),
            search: self.search.clone(),
            items: self.items.clone(),
        }
    }

    /// Pretty JSON of the stored state.
    pub fn export_json(&self) -> serde_json::Result<String> {
        self.to_stored().to_json_pretty()
    }

    /// Stored state as a `data:` URI, the format [`parse_import`] reads.
    pub fn export_data_uri(&self) -> serde_json::Result<String> {
        let json = self.export_json()?;
        Ok(format!("{DATA_URI_PREFIX}{}", STANDARD.encode(json)))
    }

    /// Overwrites the parts of the state present in an import.
    ///
    /// Keys missing from the import keep their current value.
    pub fn merge_import(&mut self, patch: StatePatch) {
        if let Some(items) = patch.items {
            debug!("importing {} root items", items.len());
            self.items = items;
        }
        if let Some(maximized_item) = patch.maximized_item {
            self.maximized_item = maximized_item;
        }
        if let Some(selected_item) = patch.selected_item {
            self.selected_item = selected_item;
        }
        if let Some(search) = patch.search {
            self.search = search;
        }
        self.commit();
    }
}

/// Name of the file an export made at `now` is saved to.
pub fn export_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "tiled-browser-export-{}.json",
        now.format("%Y-%m-%d_%H-%M-%S")
    )
}

/// Reads an exported `data:` URI.
pub fn parse_import(text: &str) -> Result<StatePatch, ImportError> {
    let payload = text
        .trim()
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or(ImportError::UnknownFormat)?;
    let json = STANDARD.decode(payload)?;
    Ok(serde_json::from_slice(&json)?)
}
