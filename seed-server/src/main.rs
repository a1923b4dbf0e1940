// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ando-seed: discovery sync for gateway configuration
//
//  Input:   <dir>/{routes,upstreams,services}/*.json
//  Resolve: static discovery table from config
//  Output:  same layout, discovery fields replaced with nodes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod sync;

use clap::Parser;
use seed_core::config::{LogConfig, SeedConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ando-seed", version, about = "ando-seed: discovery sync for gateway configuration")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/ando-seed/seed.yaml")]
    config: PathBuf,

    /// Log level (overrides the configured one)
    #[arg(long)]
    log_level: Option<String>,

    /// Directory holding routes/, upstreams/ and services/ documents
    #[arg(short, long)]
    input: PathBuf,

    /// Directory the synced documents are written to
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Config ──
    let (config, loaded) = if cli.config.exists() {
        (SeedConfig::load(&cli.config)?, true)
    } else {
        (SeedConfig::default(), false)
    };

    // ── Tracing ──
    init_tracing(&config.log, cli.log_level.as_deref());

    info!(version = env!("CARGO_PKG_VERSION"), "ando-seed starting");
    if loaded {
        info!(path = %cli.config.display(), "Loaded config file");
    } else {
        info!("No config file found, using defaults");
    }

    // ── Discovery ──
    let discoverer = config.discovery.discoverer();
    info!(services = discoverer.len(), "Static discovery table ready");

    // ── Sync ──
    let report = sync::sync_dir(&cli.input, &cli.output, &discoverer, &config.sync)?;

    if report.failed > 0 {
        anyhow::bail!("{} document(s) failed to sync", report.failed);
    }
    Ok(())
}

fn init_tracing(log: &LogConfig, cli_level: Option<&str>) {
    let level = cli_level.unwrap_or(&log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
