// src/context.rs
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::aggregate::{aggregate, AggregatedTimeSeries};
use crate::config::DashboardConfig;
use crate::tables::{SnapshotTable, TimeSeriesTable};

/// The loaded and derived tables plus the settings the view builders read.
///
/// Built once at startup and never mutated; every view builder borrows it.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub snapshot: SnapshotTable,
    pub time_series: TimeSeriesTable,
    pub aggregated: AggregatedTimeSeries,
    pub config: DashboardConfig,
}

impl AppContext {
    /// Load both input files named in `config` and derive the aggregate.
    pub fn load(config: DashboardConfig) -> Result<Self> {
        let snapshot = SnapshotTable::load(&config.snapshot_path, &config.columns.snapshot)
            .context("loading snapshot data")?;
        let time_series =
            TimeSeriesTable::load(&config.time_series_path, &config.columns.time_series)
                .context("loading time-series data")?;
        Self::from_tables(snapshot, time_series, config)
    }

    pub fn from_tables(
        snapshot: SnapshotTable,
        time_series: TimeSeriesTable,
        config: DashboardConfig,
    ) -> Result<Self> {
        let aggregated = aggregate(&time_series).context("aggregating time series")?;
        let policy = config.duplicate_policy;
        for (country, rows) in snapshot.duplicate_countries() {
            warn!(country = %country, rows, ?policy, "duplicate snapshot rows for country");
        }
        info!(
            snapshot_rows = snapshot.num_rows(),
            time_series_rows = time_series.num_rows(),
            aggregated_rows = aggregated.num_rows(),
            "context ready"
        );
        Ok(Self {
            snapshot,
            time_series,
            aggregated,
            config,
        })
    }
}
