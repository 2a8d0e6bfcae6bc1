//! Arbor back-office inspector
//!
//! Loads a JSON site fixture into in-memory stores and answers one
//! back-office query against it, printing the answer as JSON.
//!
//! Usage:
//!   arbor-inspect --fixture site.json children document
//!   arbor-inspect --fixture site.json --user 2 ancestors document 1003
//!   arbor-inspect --fixture site.json all template --filter 'Alias==home'
//!
//! Nothing is written back to the fixture.

use anyhow::Result;
use arbor_backoffice::BackofficeConfig;
use arbor_inspect::{Query, Site};
use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "arbor-inspect")]
#[command(about = "Answer back-office queries against a site fixture")]
struct Args {
    /// Path to the JSON site fixture
    #[arg(short, long)]
    fixture: PathBuf,

    /// Path to back-office settings (TOML)
    #[arg(short, long, default_value = "arbor.toml")]
    config: PathBuf,

    /// Id of the catalog user to act as
    #[arg(short, long, default_value = "1")]
    user: i32,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    query: Query,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = BackofficeConfig::load_from(&args.config);
    let site = Site::load(&args.fixture, config)?;
    let ctx = site.context_for(args.user)?;
    debug!("Acting as {} ({})", ctx.user.name, ctx.user.id);

    let answer = args.query.run(&site, &ctx)?;
    println!("{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}
