//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use doaj_dashboard::SourceKind;

/// Open-access journal catalog tooling.
///
/// Fetches the catalog, builds flat-file snapshots and serves them to the
/// dashboard.
#[derive(Parser, Debug)]
#[command(name = "doaj")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./doaj.toml when present)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the catalog and write journals.json, aggregates.json and meta.json
    Ingest(IngestArgs),
    /// Run the read-only metrics API over the latest snapshot
    Api(ApiArgs),
    /// Serve the dashboard's static files
    Serve(ServeArgs),
}

#[derive(ClapArgs, Debug, Default)]
pub struct IngestArgs {
    /// Catalog source: csv (bulk export) or api (paginated search)
    #[arg(long)]
    pub source: Option<SourceKind>,

    /// CSV export URL
    #[arg(long, value_name = "URL")]
    pub csv_url: Option<String>,

    /// Search query expression (api source)
    #[arg(long)]
    pub query: Option<String>,

    /// Snapshot output directory
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Stop after this many API records (0 disables the cap)
    #[arg(long, value_name = "N")]
    pub result_cap: Option<usize>,

    /// Records per API page (1-1000)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub page_size: Option<u32>,
}

#[derive(ClapArgs, Debug)]
pub struct ApiArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind (default: api_port setting, 8001)
    #[arg(long)]
    pub port: Option<u16>,

    /// Snapshot directory to serve (default: output_dir setting)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Directory to serve
    #[arg(long = "dir", value_name = "DIR", default_value = "web")]
    pub directory: PathBuf,
}
