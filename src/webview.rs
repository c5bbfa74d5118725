//! Events from the embedded page views.
//!
//! Every tile shows its page in a view owned by the shell. The view reports what happens to
//! the page and the state records the parts that matter: title, icon, zoom and the address
//! the user navigated to.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tiled_ipc::{Favicon, Item, Tile};
use url::Url;

use crate::tree::{find_item_mut, AppState, InsertTarget};

/// Address new tiles open at before the user picks one.
pub const BLANK_URL: &str = "about:blank";

/// Something that happened in the page view of a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WebViewEvent {
    /// The page navigated, including in-page navigations.
    Navigated { url: String },
    TitleUpdated { title: String },
    /// The page announced its icons, best first.
    FaviconUpdated { urls: Vec<String> },
    /// The page icon failed to load.
    FaviconFailed,
    /// The page tried to open a new window.
    NewWindowRequested { url: String },
    Focused,
    /// The page finished loading its document.
    DomReady,
    ZoomChanged { level: f64 },
}

/// Request from the state back to a page view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WebViewCommand {
    SetZoomLevel(f64),
}

impl AppState {
    /// Folds a page view event into the state.
    ///
    /// Events for unknown tiles or for groups are dropped.
    pub fn handle_webview_event(
        &mut self,
        tile_id: &str,
        event: WebViewEvent,
    ) -> Option<WebViewCommand> {
        let Some(tile) = find_item_mut(&mut self.items, tile_id).and_then(Item::as_tile_mut)
        else {
            debug!("dropping {event:?} for unknown tile {tile_id}");
            return None;
        };
        trace!("tile {tile_id}: {event:?}");

        let mut command = None;
        match event {
            WebViewEvent::Navigated { url } => {
                if tile.url == BLANK_URL {
                    tile.url = url.clone();
                }
                self.locations.insert(tile_id.to_owned(), url);
            }
            WebViewEvent::TitleUpdated { title } => {
                if !title.is_empty() {
                    if tile.name.is_empty() {
                        tile.name = title.clone();
                    }
                    tile.title = Some(title);
                }
            }
            WebViewEvent::FaviconUpdated { urls } => {
                if let Some(url) = urls.into_iter().next() {
                    tile.favicon = Favicon::Url(url);
                }
            }
            WebViewEvent::FaviconFailed => tile.favicon = Favicon::Absent,
            WebViewEvent::NewWindowRequested { url } => {
                self.new_tile(String::new(), url, InsertTarget::Root);
                return None;
            }
            WebViewEvent::Focused => {
                self.focus(tile_id);
                return None;
            }
            WebViewEvent::DomReady => command = tile.zoom.map(WebViewCommand::SetZoomLevel),
            WebViewEvent::ZoomChanged { level } => tile.zoom = Some(level),
        }

        self.commit();
        command
    }

    /// Address the page view of a tile is currently at.
    ///
    /// Falls back to the pinned URL until the view reports a navigation.
    pub fn location(&self, id: &str) -> Option<&str> {
        if let Some(location) = self.locations.get(id) {
            return Some(location);
        }
        self.find_item(id)?.as_tile().map(|tile| tile.url.as_str())
    }

    /// Makes the current page of a tile its new home.
    ///
    /// The tile URL becomes the current location and the name becomes the page title.
    pub fn pin_url(&mut self, id: &str) -> bool {
        let location = self.locations.get(id).cloned();
        let Some(tile) = find_item_mut(&mut self.items, id).and_then(Item::as_tile_mut) else {
            return false;
        };

        if let Some(location) = location {
            debug!("pinning {id} to {location}");
            tile.url = location;
        }
        if let Some(title) = tile.title.clone().filter(|title| !title.is_empty()) {
            tile.name = title;
        }

        self.commit();
        true
    }
}

/// Icon to show for a tile, `None` when it has none.
///
/// Tiles without a known icon use `/favicon.ico` at the origin of their page.
pub fn favicon_url(tile: &Tile) -> Option<String> {
    match &tile.favicon {
        Favicon::Url(url) => Some(url.clone()),
        Favicon::Absent => None,
        Favicon::Unresolved => {
            let url = Url::parse(&tile.url).ok()?;
            let origin = url.origin();
            if !origin.is_tuple() {
                return None;
            }
            Some(format!("{}/favicon.ico", origin.ascii_serialization()))
        }
    }
}

/// Turns what the user typed into the address bar into a URL.
///
/// Input with a scheme (including `about:` pages) is used as is, input that looks like a host
/// name gets `https://`, and anything else is searched for with `search_url`.
pub fn normalize_address(input: &str, search_url: &str) -> String {
    static SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\w+://|about:)").unwrap());
    static DOMAIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\w{2,3}$").unwrap());

    let input = input.trim();
    if SCHEME.is_match(input) {
        input.to_owned()
    } else if DOMAIN.is_match(input) {
        format!("https://{input}")
    } else {
        let query: String = url::form_urlencoded::byte_serialize(input.as_bytes()).collect();
        format!("{search_url}{query}")
    }
}
