#[macro_use]
extern crate tracing;

use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic};

pub const DEFAULT_STORAGE_KEY: &str = "tiled-browser-state";
pub const DEFAULT_NEW_TILE_URL: &str = "about:blank";
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search?q=";

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Config {
    #[knuffel(child, default)]
    pub storage: Storage,
    #[knuffel(child, unwrap(argument), default = DEFAULT_NEW_TILE_URL.to_owned())]
    pub new_tile_url: String,
    #[knuffel(child, unwrap(argument), default = DEFAULT_SEARCH_URL.to_owned())]
    pub search_url: String,
}

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Storage {
    /// Name of the state file, without extension.
    #[knuffel(child, unwrap(argument), default = DEFAULT_STORAGE_KEY.to_owned())]
    pub key: String,
    /// Full path of the state file, overrides `key`.
    #[knuffel(child, unwrap(argument))]
    pub path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: Storage::default(),
            new_tile_url: DEFAULT_NEW_TILE_URL.to_owned(),
            search_url: DEFAULT_SEARCH_URL.to_owned(),
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_owned(),
            path: None,
        }
    }
}

impl Config {
    pub fn parse(filename: &str, text: &str) -> Result<Self, knuffel::Error> {
        let _span = tracing::debug_span!("Config::parse").entered();
        knuffel::parse(filename, text)
    }

    pub fn load(path: &Path) -> miette::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("error reading {path:?}"))?;

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("config.kdl");
        let config = Self::parse(filename, &contents).context("error parsing")?;
        debug!("loaded config from {path:?}");
        Ok(config)
    }
}

impl Storage {
    /// Location of the state file inside `data_dir`, unless an explicit path is set.
    pub fn file_path(&self, data_dir: &Path) -> PathBuf {
        match &self.path {
            Some(path) => PathBuf::from(path),
            None => data_dir.join(format!("{}.json", self.key)),
        }
    }
}
