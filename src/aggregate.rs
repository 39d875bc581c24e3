// src/aggregate.rs
use anyhow::{Context, Result};
use arrow::{
    array::{Array, ArrayRef, Date32Array, Float64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{cmp::Ordering, collections::HashMap, sync::Arc};
use tracing::{debug, info};

use crate::tables::{time_series::TimeSeriesTable, typed_column};

/// Grouping key of the aggregated table. Coordinates are keyed by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey<'a> {
    date: i32,
    country: &'a str,
    lat: u64,
    long: u64,
    region: &'a str,
}

fn coord_bits(v: f64) -> u64 {
    // -0.0 and 0.0 are the same place
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

fn cmp_keys(a: &GroupKey, b: &GroupKey) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.country.cmp(b.country))
        .then_with(|| f64::from_bits(a.lat).total_cmp(&f64::from_bits(b.lat)))
        .then_with(|| f64::from_bits(a.long).total_cmp(&f64::from_bits(b.long)))
        .then_with(|| a.region.cmp(b.region))
}

/// Time series collapsed to one row per (Date, Country, Lat, Long, WHO Region),
/// every numeric column summed. Rows are ordered by that key.
#[derive(Debug, Clone)]
pub struct AggregatedTimeSeries {
    batch: RecordBatch,
    date: Date32Array,
    country: StringArray,
    lat: Float64Array,
    long: Float64Array,
    region: StringArray,
    value_columns: Vec<String>,
}

impl AggregatedTimeSeries {
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Names of the summed columns, in source order.
    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    pub fn date(&self, row: usize) -> i32 {
        self.date.value(row)
    }

    pub fn country(&self, row: usize) -> &str {
        self.country.value(row)
    }

    pub fn lat(&self, row: usize) -> f64 {
        self.lat.value(row)
    }

    pub fn long(&self, row: usize) -> f64 {
        self.long.value(row)
    }

    pub fn region(&self, row: usize) -> &str {
        self.region.value(row)
    }

    /// A summed column by name.
    pub fn values(&self, column: &str) -> Result<Float64Array> {
        typed_column(&self.batch, column)
    }
}

/// Group `ts` on (Date, Country, Lat, Long, WHO Region) and sum the numeric columns.
///
/// Null numeric cells count as 0. Rows with a null key cell are dropped.
/// Text columns outside the key are not carried over.
#[tracing::instrument(level = "info", skip(ts), fields(rows = ts.num_rows()))]
pub fn aggregate(ts: &TimeSeriesTable) -> Result<AggregatedTimeSeries> {
    let cols = ts.columns();
    let batch = ts.batch();
    let date: Date32Array = typed_column(batch, &cols.date)?;
    let country: StringArray = typed_column(batch, &cols.country)?;
    let lat: Float64Array = typed_column(batch, &cols.lat)?;
    let long: Float64Array = typed_column(batch, &cols.long)?;
    let region: StringArray = typed_column(batch, &cols.region)?;

    let key_names = [&cols.date, &cols.country, &cols.lat, &cols.long, &cols.region];
    let schema = batch.schema();
    let mut value_columns = Vec::new();
    let mut value_arrays = Vec::new();
    for (i, field) in schema.fields().iter().enumerate() {
        if field.data_type() != &DataType::Float64 || key_names.contains(&field.name()) {
            continue;
        }
        if let Some(arr) = batch.column(i).as_any().downcast_ref::<Float64Array>() {
            value_columns.push(field.name().clone());
            value_arrays.push(arr.clone());
        }
    }

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut keys: Vec<GroupKey> = Vec::new();
    let mut sums: Vec<Vec<f64>> = vec![Vec::new(); value_arrays.len()];
    let mut dropped = 0usize;

    for row in 0..batch.num_rows() {
        let key_valid = date.is_valid(row)
            && country.is_valid(row)
            && lat.is_valid(row)
            && long.is_valid(row)
            && region.is_valid(row);
        if !key_valid {
            dropped += 1;
            continue;
        }
        let key = GroupKey {
            date: date.value(row),
            country: country.value(row),
            lat: coord_bits(lat.value(row)),
            long: coord_bits(long.value(row)),
            region: region.value(row),
        };
        let group = *index.entry(key.clone()).or_insert_with(|| {
            keys.push(key);
            for s in sums.iter_mut() {
                s.push(0.0);
            }
            keys.len() - 1
        });
        for (s, arr) in sums.iter_mut().zip(&value_arrays) {
            // null and NaN cells add nothing
            if arr.is_valid(row) && !arr.value(row).is_nan() {
                s[group] += arr.value(row);
            }
        }
    }
    if dropped > 0 {
        debug!(dropped, "rows with an empty key cell skipped");
    }

    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| cmp_keys(&keys[a], &keys[b]));

    let mut fields = vec![
        Field::new(&cols.date, DataType::Date32, false),
        Field::new(&cols.country, DataType::Utf8, false),
        Field::new(&cols.lat, DataType::Float64, false),
        Field::new(&cols.long, DataType::Float64, false),
        Field::new(&cols.region, DataType::Utf8, false),
    ];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from_iter_values(order.iter().map(|&g| keys[g].date))),
        Arc::new(StringArray::from_iter_values(order.iter().map(|&g| keys[g].country))),
        Arc::new(Float64Array::from_iter_values(
            order.iter().map(|&g| f64::from_bits(keys[g].lat)),
        )),
        Arc::new(Float64Array::from_iter_values(
            order.iter().map(|&g| f64::from_bits(keys[g].long)),
        )),
        Arc::new(StringArray::from_iter_values(order.iter().map(|&g| keys[g].region))),
    ];
    for (name, s) in value_columns.iter().zip(&sums) {
        fields.push(Field::new(name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from_iter_values(
            order.iter().map(|&g| s[g]),
        )));
    }

    let out = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .context("assembling aggregated batch")?;
    info!(groups = out.num_rows(), values = ?value_columns, "aggregated time series");

    Ok(AggregatedTimeSeries {
        date: typed_column(&out, &cols.date)?,
        country: typed_column(&out, &cols.country)?,
        lat: typed_column(&out, &cols.lat)?,
        long: typed_column(&out, &cols.long)?,
        region: typed_column(&out, &cols.region)?,
        batch: out,
        value_columns,
    })
}
