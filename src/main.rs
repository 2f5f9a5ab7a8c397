use anyhow::{Context, Result};
use clap::Parser;
use fireflies_lib::model::config::AppConfig;
use fireflies_lib::model::metrics::init_logging;
use fireflies_lib::model::state::{CosmicKind, House};
use fireflies_lib::Ecosystem;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless firefly ecosystem runner", long_about = None)]
struct Args {
    /// TOML config file; a missing file means defaults
    #[arg(short, long, default_value = "fireflies.toml")]
    config: PathBuf,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 3600)]
    ticks: u64,

    /// Milliseconds per tick
    #[arg(long, default_value_t = 16.0)]
    dt: f64,

    /// RNG seed; overrides the config file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stream every event to stdout as JSON lines
    #[arg(long)]
    events: bool,

    /// Bias house assignment towards one personality (web, shield, forge, script, cloud, dark-arts)
    #[arg(long)]
    dominant_house: Option<House>,

    /// Start a cosmic event on the first tick (solar-flare, void-storm)
    #[arg(long)]
    cosmic_event: Option<CosmicKind>,

    /// Write the ancestry graph in Graphviz DOT after the run
    #[arg(long)]
    lineage_dot: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    started_at: String,
    finished_at: String,
    config_fingerprint: String,
    ticks: u64,
    wall_ms: u128,
    slowest_tick_us: u128,
    stats: &'a fireflies_lib::EcosystemStats,
}

fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "No config file, using defaults");
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    AppConfig::from_toml(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.arena.seed = Some(seed);
    }
    if args.print_config {
        let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
        println!("{rendered}");
        return Ok(());
    }

    let started_at = chrono::Utc::now();
    let mut eco = Ecosystem::new(config);
    if args.dominant_house.is_some() {
        eco.set_dominant_house(args.dominant_house);
    }
    if let Some(kind) = args.cosmic_event {
        eco.trigger_cosmic_event(kind);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for _ in 0..args.ticks {
        let events = eco.update(args.dt);
        if args.events {
            for event in &events {
                let line = serde_json::to_string(event).context("Failed to encode event")?;
                writeln!(out, "{line}").context("Failed to write event")?;
            }
        }
    }

    if let Some(path) = &args.lineage_dot {
        std::fs::write(path, eco.lineage_dot())
            .with_context(|| format!("Failed to write lineage graph to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Lineage graph written");
    }

    let stats = eco.stats();
    let finished_at = chrono::Utc::now();
    let summary = RunSummary {
        started_at: started_at.to_rfc3339(),
        finished_at: finished_at.to_rfc3339(),
        config_fingerprint: eco.config.fingerprint(),
        ticks: eco.tick(),
        wall_ms: eco.metrics.elapsed().as_millis(),
        slowest_tick_us: eco.metrics.slowest_tick().as_micros(),
        stats: &stats,
    };
    let rendered = serde_json::to_string_pretty(&summary).context("Failed to encode summary")?;
    writeln!(out, "{rendered}").context("Failed to write summary")?;
    Ok(())
}
