use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tiled_config::Config;
use tiled_ipc::{Action, Item};

use crate::persistence::{
    default_stored_state, export_file_name, parse_import, FileStorage, Storage,
};
use crate::search::{filter_tree, SearchResults};
use crate::tree::{AppState, Options};
use crate::webview::WebViewEvent;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(subcommand_value_name = "SUBCOMMAND")]
#[command(subcommand_help_heading = "Subcommands")]
pub struct Cli {
    /// Path to config file (default: `$XDG_CONFIG_HOME/tiled/config.kdl`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Path to the state file, overriding the config.
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub subcommand: Sub,
}

#[derive(Subcommand)]
pub enum Sub {
    /// Print the item tree.
    Tree,
    /// Print the items matching a query, with matches in brackets.
    Search {
        /// Query to run, the open search if unset.
        query: Option<String>,
    },
    /// Export the state.
    Export {
        /// Export as a `data:` URI, the format `import` reads.
        #[arg(long)]
        data_uri: bool,
        /// File or directory to write to instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge an exported `data:` URI into the state.
    Import { path: PathBuf },
    /// Apply an action to the state.
    Action {
        #[command(subcommand)]
        action: Action,
    },
    /// Feed a page view event, given as JSON, to a tile.
    Event { tile: String, event: String },
}

/// Directories of the application, `None` when there is no home directory.
fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "tiled")
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return load_config_file(path);
    }

    match project_dirs() {
        Some(dirs) => load_default_config(&dirs.config_dir().join("config.kdl")),
        None => {
            warn!("error retrieving home directory, using the default config");
            Ok(Config::default())
        }
    }
}

/// Loads the config from its default location, where it may be missing.
fn load_default_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        debug!("no config at {path:?}, using the default config");
        return Ok(Config::default());
    }
    load_config_file(path)
}

fn load_config_file(path: &Path) -> anyhow::Result<Config> {
    Config::load(path).map_err(|err| anyhow!("{err:?}"))
}

/// Location of the state file: `--state`, then the configured path, then the data directory.
fn state_path(
    cli_path: Option<PathBuf>,
    config: &Config,
    data_dir: Option<&Path>,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli_path {
        return Ok(path);
    }
    if let Some(path) = &config.storage.path {
        return Ok(PathBuf::from(path));
    }
    let data_dir = data_dir.context("error retrieving home directory")?;
    Ok(config.storage.file_path(data_dir))
}

/// Runs one command against the stored state, saving it afterwards unless it only reads.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let options = Rc::new(Options::from_config(&config));

    let dirs = project_dirs();
    let data_dir = dirs.as_ref().map(|dirs| dirs.data_dir());
    let mut storage = FileStorage::new(state_path(cli.state, &config, data_dir)?);
    let stored = match storage.load()? {
        Some(stored) => stored,
        None => {
            info!("no saved state, starting fresh");
            default_stored_state()
        }
    };
    let mut state = AppState::with_stored(stored, options);

    match cli.subcommand {
        Sub::Tree => {
            print!("{}", state.debug_tree());
            return Ok(());
        }
        Sub::Search { query } => {
            let results = match query {
                Some(query) => filter_tree(state.items(), &query),
                None => state
                    .search_results()
                    .context("no query given and no search is open")?,
            };
            print!("{}", render_search(&results));
            return Ok(());
        }
        Sub::Export { data_uri, output } => {
            let text = if data_uri {
                state.export_data_uri()
            } else {
                state.export_json()
            }
            .context("error serializing state")?;

            match output {
                Some(mut path) => {
                    if path.is_dir() {
                        path.push(export_file_name(&chrono::Local::now()));
                    }
                    fs::write(&path, text).with_context(|| format!("error writing {path:?}"))?;
                    info!("exported state to {path:?}");
                }
                None => println!("{text}"),
            }
            return Ok(());
        }
        Sub::Import { path } => {
            let text =
                fs::read_to_string(&path).with_context(|| format!("error reading {path:?}"))?;
            let patch = parse_import(&text).with_context(|| format!("error importing {path:?}"))?;
            state.merge_import(patch);
        }
        Sub::Action { action } => state.apply(action),
        Sub::Event { tile, event } => {
            let event: WebViewEvent =
                serde_json::from_str(&event).context("error parsing page view event")?;
            if let Some(command) = state.handle_webview_event(&tile, event) {
                println!("{command:?}");
            }
        }
    }

    storage.save(&state.to_stored())
}

fn render_search(results: &SearchResults) -> String {
    let mut out = String::new();
    for item in &results.items {
        render_search_item(item, results, 0, &mut out);
    }
    out
}

fn render_search_item(item: &Item, results: &SearchResults, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let name: String = if item.name().is_empty() {
        item.display_name().to_owned()
    } else {
        results
            .highlight(item.name())
            .into_iter()
            .map(|span| {
                if span.matched {
                    format!("[{}]", span.text)
                } else {
                    span.text.to_owned()
                }
            })
            .collect()
    };
    let _ = writeln!(out, "{indent}{name} ({})", item.id());

    for child in item.children() {
        render_search_item(child, results, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use tiled_ipc::{Group, Tile};

    use super::*;
    use crate::id::new_id;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tiled-cli-test-{}", new_id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn run_args(base: &[&str], args: &[&str]) -> anyhow::Result<()> {
        let args = std::iter::once("tiled").chain(base.iter().chain(args).copied());
        run(Cli::try_parse_from(args)?)
    }

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_actions() {
        let cli = Cli::try_parse_from([
            "tiled",
            "--state",
            "/tmp/state.json",
            "action",
            "move-item",
            "a",
            "--sibling",
            "b",
            "--position",
            "before",
        ])
        .unwrap();
        assert_eq!(cli.state.as_deref(), Some(Path::new("/tmp/state.json")));
        assert!(matches!(
            cli.subcommand,
            Sub::Action {
                action: Action::MoveItem { .. }
            }
        ));
    }

    #[test]
    fn search_output() {
        let docs = Tile::new(
            String::from("docs"),
            String::from("Docs"),
            String::from("https://docs.rs"),
        );
        let mail = Tile::new(
            String::from("mail"),
            String::from("Mail"),
            String::from("https://mail.example.com"),
        );
        let group = Group::new(
            String::from("work"),
            String::new(),
            vec![Item::Tile(docs), Item::Tile(mail)],
        );
        let state = AppState::with_options(vec![Item::Group(group)], Rc::new(Options::default()));

        assert_eq!(
            render_search(&filter_tree(state.items(), "doc")),
            "New Group (work)\n  [Doc]s (docs)\n"
        );
    }

    #[test]
    fn search_output_uses_the_filtering_pattern() {
        let tile = Tile::new(
            String::from("t"),
            String::from("ab cd"),
            String::from("about:blank"),
        );
        let group = Group::new(
            String::from("g"),
            String::from("a_b_c_d"),
            vec![Item::Tile(tile)],
        );
        let mut state =
            AppState::with_options(vec![Item::Group(group)], Rc::new(Options::default()));

        assert_eq!(
            render_search(&filter_tree(state.items(), "ab cd")),
            "a_b_c_d (g)\n  [ab] [cd] (t)\n"
        );

        state.start_search();
        state.set_search(String::from("cd"));
        let results = state.search_results().unwrap();
        assert_eq!(render_search(&results), "a_b_c_d (g)\n  ab [cd] (t)\n");
    }

    #[test]
    fn state_path_precedence() {
        let data_dir = Path::new("/data");
        let mut config = Config::default();

        assert_eq!(
            state_path(None, &config, Some(data_dir)).unwrap(),
            PathBuf::from("/data/tiled-browser-state.json")
        );
        assert!(state_path(None, &config, None).is_err());

        config.storage.key = String::from("work");
        assert_eq!(
            state_path(None, &config, Some(data_dir)).unwrap(),
            PathBuf::from("/data/work.json")
        );

        config.storage.path = Some(String::from("/elsewhere/state.json"));
        assert_eq!(
            state_path(None, &config, None).unwrap(),
            PathBuf::from("/elsewhere/state.json")
        );

        let cli_path = PathBuf::from("/cli/state.json");
        assert_eq!(
            state_path(Some(cli_path.clone()), &config, Some(data_dir)).unwrap(),
            cli_path
        );
    }

    #[test]
    fn state_path_from_config_file() {
        let dir = temp_dir();
        let path = dir.join("config.kdl");
        fs::write(&path, "storage {\n    path \"/elsewhere/state.json\"\n}\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(
            state_path(None, &config, Some(&dir)).unwrap(),
            PathBuf::from("/elsewhere/state.json")
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_default_config_is_default() {
        let dir = temp_dir();

        let config = load_default_config(&dir.join("config.kdl")).unwrap();
        assert_eq!(config, Config::default());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn config_errors_are_reported() {
        let dir = temp_dir();
        let path = dir.join("config.kdl");

        // An explicit path has to exist.
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("error reading"), "{err}");

        fs::write(&path, "tab-width 4").unwrap();
        let err = load_default_config(&path).unwrap_err();
        assert!(err.to_string().contains("error parsing"), "{err}");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn run_applies_actions_to_the_state_file() {
        let dir = temp_dir();
        let config = dir.join("config.kdl");
        let state = dir.join("state.json");
        fs::write(
            &config,
            "new-tile-url \"https://start.test\"\nsearch-url \"https://search.test/?q=\"\n",
        )
        .unwrap();
        let config = config.to_str().unwrap();
        let state = state.to_str().unwrap();

        let base = ["--config", config, "--state", state];
        run_args(&base, &["action", "new-tile", "--name", "Start", "--root"]).unwrap();
        run_args(
            &base,
            &["action", "new-tile", "--name", "Docs", "--url", "rust docs", "--root"],
        )
        .unwrap();

        let stored = FileStorage::new(PathBuf::from(state)).load().unwrap().unwrap();
        let tiles: Vec<_> = stored
            .items
            .iter()
            .filter_map(Item::as_tile)
            .map(|tile| (tile.name.as_str(), tile.url.as_str()))
            .collect();
        assert_eq!(
            tiles,
            [
                ("Start", "https://start.test"),
                ("Docs", "https://search.test/?q=rust+docs"),
            ]
        );
        // The default group created on first run is still there.
        assert_eq!(stored.items.len(), 3);
        assert_eq!(stored.selected_item.as_deref(), Some(stored.items[2].id()));

        // Searching without a query needs an open search.
        assert!(run_args(&base, &["search"]).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
