//! Per-country views, recomputed every time the country selector changes.

use anyhow::Result;
use tracing::debug;

use crate::chart::{
    palette::qualitative, Axis, BarTrace, Figure, Layout, Legend, LineStyle, ScatterTrace, Title,
    Trace,
};
use crate::config::DuplicatePolicy;
use crate::context::AppContext;
use crate::load::date_parser::format_date32;
use crate::tables::{SnapshotMetric, SnapshotTable, TimeSeriesTable};

/// The two reactive outputs, in the order the page routes them.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryViews {
    pub metrics: Figure,
    pub trend: Figure,
}

impl CountryViews {
    pub fn into_pair(self) -> (Figure, Figure) {
        (self.metrics, self.trend)
    }
}

/// Snapshot totals for one country, in [`SnapshotMetric::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryMetrics {
    pub country: String,
    pub values: [f64; 4],
    /// Snapshot rows that matched the country name.
    pub matched_rows: usize,
}

/// Build both country views for `country`.
///
/// An unknown country is not an error: the metrics are all zero and the
/// trend chart has empty series.
#[tracing::instrument(level = "debug", skip(ctx))]
pub fn compute_country_views(ctx: &AppContext, country: &str) -> Result<CountryViews> {
    let metrics = snapshot_metrics(&ctx.snapshot, country, ctx.config.duplicate_policy)?;
    Ok(CountryViews {
        metrics: metrics_chart(&metrics),
        trend: trend_chart(&ctx.time_series, country)?,
    })
}

pub fn snapshot_metrics(
    snapshot: &SnapshotTable,
    country: &str,
    policy: DuplicatePolicy,
) -> Result<CountryMetrics> {
    let rows = snapshot.filter_country(country)?;
    let matched_rows = rows.num_rows();
    let value = |row: usize, m: SnapshotMetric| rows.metric(row, m).unwrap_or(0.0);

    let values = match matched_rows {
        0 => {
            debug!(country, "country not in snapshot; metrics default to zero");
            [0.0; 4]
        }
        1 => SnapshotMetric::ALL.map(|m| value(0, m)),
        n => {
            debug!(country, rows = n, ?policy, "resolving duplicate snapshot rows");
            match policy {
                DuplicatePolicy::First => SnapshotMetric::ALL.map(|m| value(0, m)),
                DuplicatePolicy::Last => SnapshotMetric::ALL.map(|m| value(n - 1, m)),
                DuplicatePolicy::Sum => {
                    SnapshotMetric::ALL.map(|m| (0..n).map(|r| value(r, m)).sum::<f64>())
                }
            }
        }
    };

    Ok(CountryMetrics {
        country: country.to_string(),
        values,
        matched_rows,
    })
}

pub fn metrics_chart(metrics: &CountryMetrics) -> Figure {
    Figure {
        data: vec![Trace::Bar(BarTrace {
            x: SnapshotMetric::ALL.iter().map(|m| m.label().to_string()).collect(),
            y: metrics.values.to_vec(),
            marker: None,
        })],
        layout: Layout {
            xaxis: Some(Axis::titled("Metrics")),
            yaxis: Some(Axis::titled("Count")),
            ..Layout::titled(format!("COVID-19 Data in {}", metrics.country))
        },
        frames: Vec::new(),
    }
}

/// Confirmed, Deaths and Recovered over time for `country`, ordered by date.
pub fn trend_chart(time_series: &TimeSeriesTable, country: &str) -> Result<Figure> {
    let rows = time_series.filter_country(country)?.sorted_by_date()?;
    if rows.is_empty() {
        debug!(country, "country not in time series; trend is empty");
    }

    let dates: Vec<String> = (0..rows.num_rows())
        .map(|r| rows.date(r).map(format_date32).unwrap_or_default())
        .collect();

    type Getter = fn(&TimeSeriesTable, usize) -> Option<f64>;
    let series: [(&str, Getter); 3] = [
        ("Confirmed", TimeSeriesTable::confirmed),
        ("Deaths", TimeSeriesTable::deaths),
        ("Recovered", TimeSeriesTable::recovered),
    ];

    let data = series
        .iter()
        .enumerate()
        .map(|(i, (name, get))| {
            Trace::Scatter(ScatterTrace {
                name: name.to_string(),
                mode: "lines",
                x: dates.clone(),
                y: (0..rows.num_rows()).map(|r| get(&rows, r)).collect(),
                line: LineStyle {
                    color: qualitative(i).to_string(),
                },
                legendgroup: name.to_string(),
            })
        })
        .collect();

    Ok(Figure {
        data,
        layout: Layout {
            xaxis: Some(Axis::titled("Date")),
            yaxis: Some(Axis::titled("Count")),
            legend: Some(Legend {
                title: Title::new("Metric"),
            }),
            ..Layout::titled(format!("COVID-19 Trends in {}", country))
        },
        frames: Vec::new(),
    })
}
