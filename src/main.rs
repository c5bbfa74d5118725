#[macro_use]
extern crate tracing;

use std::env;

use clap::Parser;
use tiled::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let directives = env::var("RUST_LOG").unwrap_or_else(|_| "tiled=info".to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    debug!("starting with {:?}", env::args().collect::<Vec<_>>());
    cli::run(cli)
}
