use anyhow::{Context, Result};
use arrow::{
    array::{Array, Date32Array, Float64Array, StringArray},
    record_batch::RecordBatch,
};
use std::{collections::BTreeSet, path::Path};

use super::{f64_at, filter_eq, str_at, take_rows, typed_column};
use crate::config::TimeSeriesColumns;
use crate::load::{load_table, ColumnKind, ColumnSpec, TableSpec};

/// Per-country, per-date cumulative counts.
#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    batch: RecordBatch,
    columns: TimeSeriesColumns,
    date: Date32Array,
    country: StringArray,
    confirmed: Float64Array,
    deaths: Float64Array,
    recovered: Float64Array,
}

impl TimeSeriesTable {
    pub fn spec(columns: &TimeSeriesColumns) -> TableSpec {
        TableSpec {
            table_name: "time_series".into(),
            columns: vec![
                ColumnSpec::new(&columns.date, ColumnKind::Date),
                ColumnSpec::new(&columns.country, ColumnKind::Text).alias("Country/Region"),
                ColumnSpec::new(&columns.lat, ColumnKind::Number),
                ColumnSpec::new(&columns.long, ColumnKind::Number),
                ColumnSpec::new(&columns.region, ColumnKind::Text),
                ColumnSpec::new(&columns.confirmed, ColumnKind::Number),
                ColumnSpec::new(&columns.deaths, ColumnKind::Number),
                ColumnSpec::new(&columns.recovered, ColumnKind::Number),
            ],
        }
    }

    pub fn load(path: &Path, columns: &TimeSeriesColumns) -> Result<Self> {
        let batch = load_table(path, &Self::spec(columns))?;
        Self::from_batch(batch, columns.clone())
            .with_context(|| format!("time-series table {}", path.display()))
    }

    pub fn from_batch(batch: RecordBatch, columns: TimeSeriesColumns) -> Result<Self> {
        // lat/long/region are only needed by the aggregator, but validate them up front
        typed_column::<Float64Array>(&batch, &columns.lat)?;
        typed_column::<Float64Array>(&batch, &columns.long)?;
        typed_column::<StringArray>(&batch, &columns.region)?;
        Ok(Self {
            date: typed_column(&batch, &columns.date)?,
            country: typed_column(&batch, &columns.country)?,
            confirmed: typed_column(&batch, &columns.confirmed)?,
            deaths: typed_column(&batch, &columns.deaths)?,
            recovered: typed_column(&batch, &columns.recovered)?,
            batch,
            columns,
        })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn columns(&self) -> &TimeSeriesColumns {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Date as `Date32` days, `None` for an empty cell.
    pub fn date(&self, row: usize) -> Option<i32> {
        self.date.is_valid(row).then(|| self.date.value(row))
    }

    pub fn country(&self, row: usize) -> Option<&str> {
        str_at(&self.country, row)
    }

    pub fn confirmed(&self, row: usize) -> Option<f64> {
        f64_at(&self.confirmed, row)
    }

    pub fn deaths(&self, row: usize) -> Option<f64> {
        f64_at(&self.deaths, row)
    }

    pub fn recovered(&self, row: usize) -> Option<f64> {
        f64_at(&self.recovered, row)
    }

    /// Rows whose country equals `country`, in source order.
    pub fn filter_country(&self, country: &str) -> Result<Self> {
        let batch = filter_eq(&self.batch, &self.country, country)?;
        Self::from_batch(batch, self.columns.clone())
    }

    /// Stable sort by date ascending; rows without a date go first.
    pub fn sorted_by_date(&self) -> Result<Self> {
        let mut indices: Vec<u32> = (0..self.num_rows() as u32).collect();
        indices.sort_by_key(|&i| self.date(i as usize));
        let batch = take_rows(&self.batch, indices)?;
        Self::from_batch(batch, self.columns.clone())
    }

    pub fn distinct_countries(&self) -> Vec<String> {
        let set: BTreeSet<&str> = (0..self.num_rows()).filter_map(|r| self.country(r)).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Earliest and latest date present.
    pub fn date_range(&self) -> Option<(i32, i32)> {
        let dates = (0..self.num_rows()).filter_map(|r| self.date(r));
        dates.fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::load::date_parser::{parse_date, to_date32};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    /// (date, country, lat, long, region, confirmed, deaths, recovered)
    pub(crate) type Row<'a> = (&'a str, &'a str, f64, f64, &'a str, f64, f64, f64);

    pub(crate) fn day(s: &str) -> i32 {
        to_date32(parse_date(s).unwrap())
    }

    pub(crate) fn time_series(rows: &[Row]) -> TimeSeriesTable {
        let schema = Schema::new(vec![
            Field::new("Date", DataType::Date32, true),
            Field::new("Country", DataType::Utf8, true),
            Field::new("Lat", DataType::Float64, true),
            Field::new("Long", DataType::Float64, true),
            Field::new("WHO Region", DataType::Utf8, true),
            Field::new("Confirmed", DataType::Float64, true),
            Field::new("Deaths", DataType::Float64, true),
            Field::new("Recovered", DataType::Float64, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Date32Array::from_iter_values(rows.iter().map(|r| day(r.0)))),
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.1))),
                Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.2))),
                Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.3))),
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.4))),
                Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.5))),
                Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.6))),
                Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.7))),
            ],
        )
        .unwrap();
        TimeSeriesTable::from_batch(batch, TimeSeriesColumns::default()).unwrap()
    }

    #[test]
    fn sort_is_stable_by_date() -> Result<()> {
        let t = time_series(&[
            ("2020-01-24", "Egypt", 0.0, 0.0, "EMR", 3.0, 0.0, 0.0),
            ("2020-01-22", "Egypt", 0.0, 0.0, "EMR", 1.0, 0.0, 0.0),
            ("2020-01-24", "Egypt", 0.0, 0.0, "EMR", 4.0, 0.0, 0.0),
            ("2020-01-23", "Egypt", 0.0, 0.0, "EMR", 2.0, 0.0, 0.0),
        ]);
        let sorted = t.sorted_by_date()?;
        let confirmed: Vec<_> = (0..sorted.num_rows()).map(|r| sorted.confirmed(r)).collect();
        assert_eq!(
            confirmed,
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]
        );
        Ok(())
    }

    #[test]
    fn filter_and_range() -> Result<()> {
        let t = time_series(&[
            ("2020-01-22", "Egypt", 0.0, 0.0, "EMR", 1.0, 0.0, 0.0),
            ("2020-02-01", "Peru", 0.0, 0.0, "AMR", 1.0, 0.0, 0.0),
            ("2020-03-01", "Egypt", 0.0, 0.0, "EMR", 1.0, 0.0, 0.0),
        ]);
        let egypt = t.filter_country("Egypt")?;
        assert_eq!(egypt.num_rows(), 2);
        assert_eq!(
            egypt.date_range(),
            Some((day("2020-01-22"), day("2020-03-01")))
        );
        assert!(t.filter_country("Atlantis")?.is_empty());
        assert_eq!(t.filter_country("Atlantis")?.date_range(), None);
        assert_eq!(t.distinct_countries(), vec!["Egypt", "Peru"]);
        Ok(())
    }
}
