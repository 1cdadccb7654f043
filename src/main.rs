//! CLI entry point for the DOAJ dashboard tool.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use doaj_dashboard::server::{run_api_server, run_static_server};
use doaj_dashboard::{MetricsCache, Settings, SnapshotWriter, run_ingest};
use tracing::{debug, info};

mod cli;

use cli::{ApiArgs, Args, Command, IngestArgs, ServeArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let settings = Settings::load(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command {
        Command::Ingest(ingest) => run_ingest_command(settings, ingest).await,
        Command::Api(api) => run_api_command(&settings, api).await,
        Command::Serve(serve) => run_serve_command(serve).await,
    }
}

async fn run_ingest_command(mut settings: Settings, args: IngestArgs) -> Result<()> {
    apply_ingest_overrides(&mut settings, args);
    settings.validate().context("Invalid settings")?;

    let report = run_ingest(&settings).await.context("Ingest failed")?;

    let capped = if report.is_capped { " (truncated)" } else { "" };
    println!(
        "Wrote {} journals{capped} to {}",
        report.records,
        settings.output_dir.display()
    );
    Ok(())
}

fn apply_ingest_overrides(settings: &mut Settings, args: IngestArgs) {
    if let Some(source) = args.source {
        settings.source = source;
    }
    if let Some(csv_url) = args.csv_url {
        settings.csv_url = csv_url;
    }
    if let Some(query) = args.query {
        settings.query = query;
    }
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = output_dir;
    }
    if let Some(cap) = args.result_cap {
        settings.result_cap = (cap > 0).then_some(cap);
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size;
    }
}

async fn run_api_command(settings: &Settings, args: ApiArgs) -> Result<()> {
    let addr = socket_addr(&args.host, args.port.unwrap_or(settings.api_port))?;
    let data_dir = args.data_dir.unwrap_or_else(|| settings.output_dir.clone());

    info!(data_dir = %data_dir.display(), "starting metrics API");
    let cache = Arc::new(MetricsCache::new(SnapshotWriter::new(data_dir)));
    run_api_server(addr, cache, &settings.cors_origins)
        .await
        .context("Metrics API failed")
}

async fn run_serve_command(args: ServeArgs) -> Result<()> {
    let addr = socket_addr(&args.host, args.port)?;
    run_static_server(addr, &args.directory)
        .await
        .context("Static server failed")
}

fn socket_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("Invalid host address: {host}"))?;
    Ok(SocketAddr::new(ip, port))
}
