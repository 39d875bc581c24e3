use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use covidboard::{page::Page, AppContext, DashboardConfig};
use serde::Serialize;
use serde_json::json;
use std::{
    fs::File,
    io::{self, BufRead, BufWriter, Write},
    path::PathBuf,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "COVID-19 dashboard: chart specifications from tabular data"
)]
struct Args {
    /// YAML configuration file; every field is optional.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Per-country snapshot file (.csv or .parquet).
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Per-country, per-date file (.csv or .parquet).
    #[arg(long)]
    time_series: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the page document with every region rendered.
    Page {
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the [metrics, trend] figures for one country.
    View {
        country: String,
        #[arg(long)]
        pretty: bool,
    },
    /// Answer selector events: one country per stdin line, one JSON line out.
    Listen,
}

fn main() -> Result<()> {
    // ─── 1) init logging (stderr; stdout carries JSON) ────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    // ─── 2) configuration ────────────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_yaml_file(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(p) = args.snapshot {
        config.snapshot_path = p;
    }
    if let Some(p) = args.time_series {
        config.time_series_path = p;
    }
    info!(
        snapshot = %config.snapshot_path.display(),
        time_series = %config.time_series_path.display(),
        "startup"
    );

    // ─── 3) load tables (fatal on any fault) ─────────────────────────
    let ctx = AppContext::load(config)?;

    // ─── 4) serve the requested surface ──────────────────────────────
    match args.command {
        Command::Page { out, pretty } => {
            let page = Page::initial(&ctx)?;
            match out {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    write_json(BufWriter::new(file), &page, pretty)?;
                    info!(path = %path.display(), "wrote page");
                }
                None => write_json(io::stdout().lock(), &page, pretty)?,
            }
        }
        Command::View { country, pretty } => {
            let (metrics, trend) = covidboard::compute_country_views(&ctx, &country)?.into_pair();
            write_json(io::stdout().lock(), &[metrics, trend], pretty)?;
        }
        Command::Listen => listen(&ctx)?,
    }
    Ok(())
}

fn write_json<W: Write, T: Serialize>(mut w: W, value: &T, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut w, value)?;
    } else {
        serde_json::to_writer(&mut w, value)?;
    }
    writeln!(w)?;
    w.flush()?;
    Ok(())
}

/// Events are handled strictly in arrival order; a failed event is reported
/// and the loop keeps going.
fn listen(ctx: &AppContext) -> Result<()> {
    let page = Page::initial(ctx)?;
    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    let mut handled = 0u64;

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let country = line.trim();
        if country.is_empty() {
            continue;
        }
        let reply = match page.dispatch(ctx, country) {
            Ok(outputs) => json!({ "country": country, "outputs": outputs }),
            Err(e) => {
                error!(country, "event failed: {:#}", e);
                json!({ "country": country, "error": format!("{:#}", e) })
            }
        };
        write_json(&mut out, &reply, false)?;
        handled += 1;
    }

    info!(handled, "stdin closed");
    Ok(())
}
