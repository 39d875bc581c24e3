// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::chart::palette::ColorRamp;

/// How to resolve a country that appears on more than one snapshot row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Use the first matching row in file order.
    #[default]
    First,
    /// Use the last matching row in file order.
    Last,
    /// Add the matching rows together.
    Sum,
}

/// Column names of the per-country snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotColumns {
    pub country: String,
    pub continent: String,
    pub total_cases: String,
    pub total_deaths: String,
    pub total_recovered: String,
    pub active_cases: String,
}

impl Default for SnapshotColumns {
    fn default() -> Self {
        Self {
            country: "Country".into(),
            continent: "Continent".into(),
            total_cases: "TotalCases".into(),
            total_deaths: "TotalDeaths".into(),
            total_recovered: "TotalRecovered".into(),
            active_cases: "ActiveCases".into(),
        }
    }
}

/// Column names of the per-country, per-date file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeriesColumns {
    pub date: String,
    pub country: String,
    pub lat: String,
    pub long: String,
    pub region: String,
    pub confirmed: String,
    pub deaths: String,
    pub recovered: String,
}

impl Default for TimeSeriesColumns {
    fn default() -> Self {
        Self {
            date: "Date".into(),
            country: "Country".into(),
            lat: "Lat".into(),
            long: "Long".into(),
            region: "WHO Region".into(),
            confirmed: "Confirmed".into(),
            deaths: "Deaths".into(),
            recovered: "Recovered".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub snapshot: SnapshotColumns,
    pub time_series: TimeSeriesColumns,
}

/// Everything the dashboard needs to start. Every field has a default, so a
/// YAML file only lists what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub snapshot_path: PathBuf,
    pub time_series_path: PathBuf,
    /// Initial dropdown value.
    pub default_country: String,
    pub duplicate_policy: DuplicatePolicy,
    /// Largest marker diameter on the map, in pixels.
    pub map_size_max: f64,
    pub color_ramp: ColorRamp,
    pub columns: ColumnsConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("data/worldometer_data.csv"),
            time_series_path: PathBuf::from("data/covid_19_clean_complete.csv"),
            default_country: "Egypt".into(),
            duplicate_policy: DuplicatePolicy::First,
            map_size_max: 50.0,
            color_ramp: ColorRamp::Reds,
            columns: ColumnsConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening config file {}", path.display()))?;
        serde_yaml::from_reader(file)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing config yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let cfg = DashboardConfig::from_yaml_str(
            "default_country: Peru\nduplicate_policy: sum\ncolumns:\n  time_series:\n    region: Region\n",
        )?;
        assert_eq!(cfg.default_country, "Peru");
        assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Sum);
        assert_eq!(cfg.columns.time_series.region, "Region");
        assert_eq!(cfg.columns.time_series.date, "Date");
        assert_eq!(cfg.map_size_max, 50.0);
        assert_eq!(cfg.color_ramp, ColorRamp::Reds);
        Ok(())
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(DashboardConfig::from_yaml_str("duplicate_policy: average\n").is_err());
    }

    #[test]
    fn reads_from_file() -> Result<()> {
        use std::io::Write;
        let mut tmp = tempfile::NamedTempFile::new()?;
        writeln!(tmp, "color_ramp: Blues")?;
        writeln!(tmp, "map_size_max: 30")?;
        let cfg = DashboardConfig::from_yaml_file(tmp.path())?;
        assert_eq!(cfg.color_ramp, ColorRamp::Blues);
        assert_eq!(cfg.map_size_max, 30.0);
        Ok(())
    }
}
