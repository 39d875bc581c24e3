use anyhow::Result;
use arrow::{array::Array, record_batch::RecordBatch};
use clap::Parser;
use covidboard::{load::date_parser::format_date32, AppContext, DashboardConfig};
use std::{collections::BTreeSet, path::PathBuf};

#[derive(Parser)]
#[command(about = "Print schema, size and country coverage of the dashboard inputs")]
struct Args {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    snapshot: Option<PathBuf>,
    #[arg(long)]
    time_series: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let args = Args::parse();
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
    let ctx = AppContext::load(config)?;

    print_table("Snapshot", &ctx.config.snapshot_path, ctx.snapshot.batch());
    print_table(
        "Time series",
        &ctx.config.time_series_path,
        ctx.time_series.batch(),
    );
    if let Some((lo, hi)) = ctx.time_series.date_range() {
        println!("Date range:           {} .. {}", format_date32(lo), format_date32(hi));
    }
    println!();

    println!("=== Aggregated time series ===");
    println!("Rows:                 {}", ctx.aggregated.num_rows());
    println!("Summed columns:       {}", ctx.aggregated.value_columns().join(", "));
    println!();

    // names that will render as zeroed metrics or an empty trend
    let snap: BTreeSet<String> = ctx.snapshot.distinct_countries().into_iter().collect();
    let ts: BTreeSet<String> = ctx.time_series.distinct_countries().into_iter().collect();
    print_names("Only in snapshot (empty trend)", snap.difference(&ts));
    print_names("Only in time series (not selectable)", ts.difference(&snap));

    Ok(())
}

fn print_table(label: &str, path: &std::path::Path, batch: &RecordBatch) {
    println!("=== {}: {} ===", label, path.display());
    println!("Rows:                 {}", batch.num_rows());
    println!("Columns:");
    for (field, col) in batch.schema().fields().iter().zip(batch.columns()) {
        println!(
            "- {:<30} | {:<10} | nulls: {}",
            field.name(),
            field.data_type().to_string(),
            col.null_count()
        );
    }
}

fn print_names<'a>(label: &str, names: impl Iterator<Item = &'a String>) {
    let names: Vec<&String> = names.collect();
    println!("=== {} ({}) ===", label, names.len());
    for n in names {
        println!("  {}", n);
    }
}
