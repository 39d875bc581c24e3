use anyhow::{Context, Result};
use arrow::{
    array::{Float64Array, StringArray},
    record_batch::RecordBatch,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use super::{f64_at, filter_eq, str_at, typed_column};
use crate::config::SnapshotColumns;
use crate::load::{load_table, ColumnKind, ColumnSpec, TableSpec};

/// The four per-country totals shown in the metrics chart, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotMetric {
    TotalCases,
    TotalDeaths,
    TotalRecovered,
    ActiveCases,
}

impl SnapshotMetric {
    pub const ALL: [SnapshotMetric; 4] = [
        SnapshotMetric::TotalCases,
        SnapshotMetric::TotalDeaths,
        SnapshotMetric::TotalRecovered,
        SnapshotMetric::ActiveCases,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SnapshotMetric::TotalCases => "Total Cases",
            SnapshotMetric::TotalDeaths => "Total Deaths",
            SnapshotMetric::TotalRecovered => "Total Recovered",
            SnapshotMetric::ActiveCases => "Active Cases",
        }
    }
}

/// One row per country of point-in-time totals.
#[derive(Debug, Clone)]
pub struct SnapshotTable {
    batch: RecordBatch,
    columns: SnapshotColumns,
    country: StringArray,
    continent: StringArray,
    metrics: [Float64Array; 4],
}

impl SnapshotTable {
    pub fn spec(columns: &SnapshotColumns) -> TableSpec {
        TableSpec {
            table_name: "snapshot".into(),
            columns: vec![
                ColumnSpec::new(&columns.country, ColumnKind::Text).alias("Country/Region"),
                ColumnSpec::new(&columns.continent, ColumnKind::Text),
                ColumnSpec::new(&columns.total_cases, ColumnKind::Number),
                ColumnSpec::new(&columns.total_deaths, ColumnKind::Number),
                ColumnSpec::new(&columns.total_recovered, ColumnKind::Number),
                ColumnSpec::new(&columns.active_cases, ColumnKind::Number),
            ],
        }
    }

    pub fn load(path: &Path, columns: &SnapshotColumns) -> Result<Self> {
        let batch = load_table(path, &Self::spec(columns))?;
        Self::from_batch(batch, columns.clone())
            .with_context(|| format!("snapshot table {}", path.display()))
    }

    pub fn from_batch(batch: RecordBatch, columns: SnapshotColumns) -> Result<Self> {
        let country = typed_column::<StringArray>(&batch, &columns.country)?;
        let continent = typed_column::<StringArray>(&batch, &columns.continent)?;
        let metrics = [
            typed_column::<Float64Array>(&batch, &columns.total_cases)?,
            typed_column::<Float64Array>(&batch, &columns.total_deaths)?,
            typed_column::<Float64Array>(&batch, &columns.total_recovered)?,
            typed_column::<Float64Array>(&batch, &columns.active_cases)?,
        ];
        Ok(Self {
            batch,
            columns,
            country,
            continent,
            metrics,
        })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn country(&self, row: usize) -> Option<&str> {
        str_at(&self.country, row)
    }

    pub fn continent(&self, row: usize) -> Option<&str> {
        str_at(&self.continent, row)
    }

    /// Metric value at `row`; `None` when the cell was empty or NaN.
    pub fn metric(&self, row: usize, metric: SnapshotMetric) -> Option<f64> {
        f64_at(&self.metrics[metric as usize], row)
    }

    /// Rows whose country equals `country`, in source order.
    pub fn filter_country(&self, country: &str) -> Result<Self> {
        let batch = filter_eq(&self.batch, &self.country, country)?;
        Self::from_batch(batch, self.columns.clone())
    }

    /// Distinct non-null country names, sorted.
    pub fn distinct_countries(&self) -> Vec<String> {
        let set: BTreeSet<&str> = (0..self.num_rows()).filter_map(|r| self.country(r)).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Countries that occur on more than one row, with their row counts, sorted
    /// by name.
    pub fn duplicate_countries(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for country in (0..self.num_rows()).filter_map(|r| self.country(r)) {
            *counts.entry(country).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|&(_, n)| n > 1)
            .map(|(c, n)| (c.to_string(), n))
            .collect()
    }
}
