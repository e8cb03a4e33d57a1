//! Solarview CLI: sync, list and render yearly production heatmaps.
//!
//! Commands:
//! - `years`: list years available locally (and on the server with `--online`)
//! - `sync`: bring one year's cache up to date
//! - `render`: sync a year and write its heatmap as PNG
//! - `status`: current power and today's energy

mod png;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use solarview_core::config::SolarviewConfig;
use solarview_core::data::{SyncOutcome, SyncProgress};
use solarview_core::Solarview;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "solarview.toml";

#[derive(Parser)]
#[command(
    name = "solarview",
    about = "Solarview: Growatt production history as a yearly heatmap"
)]
struct Cli {
    /// Path to the TOML config. Defaults to ./solarview.toml, then the user
    /// config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List years with cached data.
    Years {
        /// Sync the current year first to learn which years the server has.
        #[arg(long, default_value_t = false)]
        online: bool,
    },
    /// Bring one year's cache up to date.
    Sync {
        /// Year to sync. Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,
    },
    /// Sync a year and write its heatmap.
    Render {
        /// Year to render. Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,

        /// Output file. Defaults to solarview_<year>.png.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Render from the cache without contacting the portal.
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Show current power and today's energy.
    Status,
}

/// Prints a percentage line on stderr, overwriting itself.
struct TerminalProgress;

impl SyncProgress for TerminalProgress {
    fn on_progress(&self, percent: u8) {
        let mut err = std::io::stderr();
        let _ = write!(err, "\r  {percent:>3}%");
        if percent >= 100 {
            let _ = writeln!(err);
        }
        let _ = err.flush();
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Years { online } => run_years(&config, online),
        Commands::Sync { year } => run_sync(&config, year),
        Commands::Render { year, out, offline } => run_render(&config, year, out, offline),
        Commands::Status => run_status(&config),
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<SolarviewConfig> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let local = PathBuf::from(CONFIG_FILE);
            let user = dirs::config_dir().map(|d| d.join("solarview").join(CONFIG_FILE));
            match user {
                Some(user) if !local.exists() && user.exists() => user,
                _ => local,
            }
        }
    };
    info!(path = %path.display(), "loading config");
    SolarviewConfig::from_file(&path).with_context(|| format!("config {}", path.display()))
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

fn report_failure(outcome: &SyncOutcome) {
    if let Some(err) = &outcome.failure {
        eprintln!("Sync of {} failed ({:?}): {err}", outcome.snapshot.year, err.kind());
    }
}

fn run_years(config: &SolarviewConfig, online: bool) -> Result<()> {
    let mut service = Solarview::from_config(config)?;
    if online {
        let outcome = service.sync_current_year(None);
        report_failure(&outcome);
    }
    let years = service.list_available_years();
    if years.is_empty() {
        println!("No years cached yet.");
    }
    for year in years {
        println!("{year}");
    }
    Ok(())
}

fn run_sync(config: &SolarviewConfig, year: Option<i32>) -> Result<()> {
    let year = year.unwrap_or_else(current_year);
    let mut service = Solarview::from_config(config)?;
    println!("Syncing {year}...");
    let outcome = service.sync_year(year, Some(&TerminalProgress), None);
    report_failure(&outcome);

    let snap = &outcome.snapshot;
    println!(
        "{year}: {} days, {:.0} kWh{}",
        snap.days.len(),
        snap.year_production,
        if snap.complete { ", complete" } else { "" }
    );
    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_render(
    config: &SolarviewConfig,
    year: Option<i32>,
    out: Option<PathBuf>,
    offline: bool,
) -> Result<()> {
    let year = year.unwrap_or_else(current_year);
    let mut service = Solarview::from_config(config)?;

    let (snapshot, failed) = if offline {
        let snapshot = service
            .cache()
            .load(year)?
            .with_context(|| format!("no cached data for {year}"))?;
        (snapshot, false)
    } else {
        let outcome = service.sync_year(year, Some(&TerminalProgress), None);
        report_failure(&outcome);
        let failed = !outcome.is_success();
        (outcome.snapshot, failed)
    };

    let with_text = match &config.render.font_path {
        Some(font) => match png::load_font(font) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "labels disabled");
                false
            }
        },
        None => {
            warn!("no render.font_path configured, writing image without labels");
            false
        }
    };

    let path = png::with_png_extension(out.unwrap_or_else(|| png::default_output(year)));
    let image = service.render_image(&snapshot);
    png::write_png(&image, &path, with_text)?;
    println!("Heatmap saved to: {}", path.display());

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn run_status(config: &SolarviewConfig) -> Result<()> {
    let mut service = Solarview::from_config(config)?;
    let overview = service.current_energy()?;
    println!("Power now: {:.0} W", overview.power_watts);
    println!("Today:     {:.1} kWh", overview.today_kwh);
    Ok(())
}
