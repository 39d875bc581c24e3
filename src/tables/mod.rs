// src/tables/mod.rs
pub mod snapshot;
pub mod time_series;

pub use snapshot::{SnapshotMetric, SnapshotTable};
pub use time_series::TimeSeriesTable;

use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, StringArray, UInt32Array},
    compute::{filter_record_batch, kernels::cmp::eq, take},
    record_batch::RecordBatch,
};

/// Fetch column `name` from `batch` as the concrete array type `T`.
pub(crate) fn typed_column<T: Array + Clone + 'static>(
    batch: &RecordBatch,
    name: &str,
) -> Result<T> {
    let idx = batch
        .schema()
        .index_of(name)
        .with_context(|| format!("column `{}` not found", name))?;
    let col = batch.column(idx);
    col.as_any()
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| anyhow!("column `{}` has unexpected type {}", name, col.data_type()))
}

/// Keep only the rows where `key` equals `value`. Null keys never match.
pub(crate) fn filter_eq(
    batch: &RecordBatch,
    key: &StringArray,
    value: &str,
) -> Result<RecordBatch> {
    let mask = eq(key, &StringArray::new_scalar(value)).context("comparing key column")?;
    filter_record_batch(batch, &mask).context("filtering rows")
}

/// Reorder every column of `batch` by `indices`.
pub(crate) fn take_rows(batch: &RecordBatch, indices: Vec<u32>) -> Result<RecordBatch> {
    let indices = UInt32Array::from(indices);
    let cols = batch
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), &indices, None))
        .collect::<Result<Vec<ArrayRef>, _>>()
        .context("reordering rows")?;
    RecordBatch::try_new(batch.schema(), cols).context("assembling reordered batch")
}

/// Null-aware cell read for numeric columns; a stored NaN reads as missing.
pub(crate) fn f64_at(arr: &Float64Array, row: usize) -> Option<f64> {
    arr.is_valid(row)
        .then(|| arr.value(row))
        .filter(|v| !v.is_nan())
}

/// Null-aware cell read for string columns.
pub(crate) fn str_at(arr: &StringArray, row: usize) -> Option<&str> {
    arr.is_valid(row).then(|| arr.value(row))
}
