use anyhow::{bail, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Date32Builder, Float64Builder, StringArray, StringBuilder},
    compute::cast,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use super::date_parser::{parse_date, to_date32};
use super::raw_table::RawTable;
use super::schema::{ColumnKind, SchemaInfo, TableSpec};
use super::utils::{is_missing, parse_number};

/// Convert raw text columns into their final Arrow types.
///
/// Empty cells and NA spellings (`NaN`, `N/A`, ...) become nulls. A non-empty cell that does not parse in a date or
/// numeric column fails the whole load.
pub fn convert_to_final_types(
    raw: &RawTable,
    schema_info: &SchemaInfo,
    source: &str,
) -> Result<RecordBatch> {
    let mut out = Vec::with_capacity(schema_info.schema.fields().len());

    for (i, fld) in schema_info.schema.fields().iter().enumerate() {
        let col: ArrayRef = match fld.data_type() {
            DataType::Date32 => {
                let mut b = Date32Builder::with_capacity(raw.num_rows());
                for (row, cell) in raw.column(i).enumerate() {
                    if is_missing(cell) {
                        b.append_null();
                        continue;
                    }
                    match parse_date(cell) {
                        Some(d) => b.append_value(to_date32(d)),
                        None => bail!(
                            "{}: unparseable date {:?} in column `{}` at data row {}",
                            source,
                            cell,
                            fld.name(),
                            row + 1
                        ),
                    }
                }
                Arc::new(b.finish())
            }
            DataType::Float64 => {
                let mut b = Float64Builder::with_capacity(raw.num_rows());
                for (row, cell) in raw.column(i).enumerate() {
                    if is_missing(cell) {
                        b.append_null();
                        continue;
                    }
                    match parse_number(cell) {
                        Some(v) => b.append_value(v),
                        None => bail!(
                            "{}: non-numeric value {:?} in column `{}` at data row {}",
                            source,
                            cell,
                            fld.name(),
                            row + 1
                        ),
                    }
                }
                Arc::new(b.finish())
            }
            _ => {
                let mut b = StringBuilder::new();
                for cell in raw.column(i) {
                    if is_missing(cell) {
                        b.append_null();
                    } else {
                        b.append_value(cell);
                    }
                }
                Arc::new(b.finish())
            }
        };
        out.push(col);
    }

    let schema = Arc::new(schema_info.schema.clone());
    RecordBatch::try_new(schema, out).context("assembling record batch")
}

/// Bring an already-typed batch (e.g. from Parquet) in line with `spec`:
/// alias columns are renamed and declared columns are cast to their kind.
pub fn coerce_batch(batch: &RecordBatch, spec: &TableSpec, source: &str) -> Result<RecordBatch> {
    let names: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let names = spec.resolve_headers(&names)?;

    let mut fields = Vec::with_capacity(names.len());
    let mut cols = Vec::with_capacity(names.len());
    for (name, arr) in names.iter().zip(batch.columns()) {
        let col = match spec.kind_of(name) {
            Some(kind) => coerce_column(arr, kind)
                .with_context(|| format!("{}: coercing column `{}`", source, name))?,
            None => arr.clone(),
        };
        fields.push(Field::new(name, col.data_type().clone(), true));
        cols.push(col);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), cols).context("assembling coerced batch")
}

fn coerce_column(arr: &ArrayRef, kind: ColumnKind) -> Result<ArrayRef> {
    let target = kind.data_type();
    if arr.data_type() == &target {
        return Ok(arr.clone());
    }
    // text that still needs our own parsing rules
    if matches!(arr.data_type(), DataType::Utf8 | DataType::LargeUtf8) && kind != ColumnKind::Text
    {
        let text = cast(arr, &DataType::Utf8)?;
        let Some(sarr) = text.as_any().downcast_ref::<StringArray>() else {
            bail!("expected a string column");
        };
        return parse_text_column(sarr, kind);
    }
    Ok(cast(arr, &target)?)
}

fn parse_text_column(sarr: &StringArray, kind: ColumnKind) -> Result<ArrayRef> {
    match kind {
        ColumnKind::Date => {
            let mut b = Date32Builder::with_capacity(sarr.len());
            for opt in sarr.iter() {
                match opt.map(str::trim).filter(|s| !is_missing(s)) {
                    None => b.append_null(),
                    Some(s) => match parse_date(s) {
                        Some(d) => b.append_value(to_date32(d)),
                        None => bail!("unparseable date {:?}", s),
                    },
                }
            }
            Ok(Arc::new(b.finish()))
        }
        ColumnKind::Number => {
            let mut b = Float64Builder::with_capacity(sarr.len());
            for opt in sarr.iter() {
                match opt.map(str::trim).filter(|s| !is_missing(s)) {
                    None => b.append_null(),
                    Some(s) => match parse_number(s) {
                        Some(v) => b.append_value(v),
                        None => bail!("non-numeric value {:?}", s),
                    },
                }
            }
            Ok(Arc::new(b.finish()))
        }
        ColumnKind::Text => Ok(Arc::new(sarr.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::schema::{analyze_raw_table, ColumnSpec};
    use arrow::array::{Date32Array, Float64Array, Int64Array, TimestampMillisecondArray};

    fn spec() -> TableSpec {
        TableSpec {
            table_name: "time_series".into(),
            columns: vec![
                ColumnSpec::new("Date", ColumnKind::Date),
                ColumnSpec::new("Confirmed", ColumnKind::Number),
            ],
        }
    }

    #[test]
    fn text_is_converted_and_empties_become_null() -> Result<()> {
        let raw = RawTable {
            headers: vec!["Date".into(), "Confirmed".into(), "Province".into()],
            rows: vec![
                vec!["2020-01-22".into(), "5".into(), "".into()],
                vec!["2020-01-23".into(), "".into(), "Hubei".into()],
            ],
        };
        let info = analyze_raw_table(&raw, &spec())?;
        let batch = convert_to_final_types(&raw, &info, "inline")?;

        let dates = batch
            .column(0)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(dates.value(1) - dates.value(0), 1);
        let confirmed = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(confirmed.value(0), 5.0);
        assert!(confirmed.is_null(1));
        assert!(batch.column(2).is_null(0));
        Ok(())
    }

    #[test]
    fn bad_date_fails_fast() -> Result<()> {
        let raw = RawTable {
            headers: vec!["Date".into(), "Confirmed".into()],
            rows: vec![vec!["not a date".into(), "1".into()]],
        };
        let info = analyze_raw_table(&raw, &spec())?;
        let err = convert_to_final_types(&raw, &info, "ts.csv").unwrap_err();
        assert!(err.to_string().contains("unparseable date"));
        Ok(())
    }

    #[test]
    fn typed_columns_are_cast() -> Result<()> {
        let schema = Schema::new(vec![
            Field::new(
                "Date",
                DataType::Timestamp(arrow::datatypes::TimeUnit::Millisecond, None),
                true,
            ),
            Field::new("Confirmed", DataType::Int64, true),
        ]);
        let day_ms = 86_400_000;
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(TimestampMillisecondArray::from(vec![0, day_ms + 3_600_000])),
                Arc::new(Int64Array::from(vec![3, 4])),
            ],
        )?;
        let out = coerce_batch(&batch, &spec(), "inline")?;
        assert_eq!(out.column(0).data_type(), &DataType::Date32);
        assert_eq!(out.column(1).data_type(), &DataType::Float64);
        let dates = out.column(0).as_any().downcast_ref::<Date32Array>().unwrap();
        assert_eq!(dates.values().to_vec(), vec![0, 1]);
        Ok(())
    }

    #[test]
    fn string_dates_in_typed_batches_are_parsed() -> Result<()> {
        let schema = Schema::new(vec![
            Field::new("Date", DataType::Utf8, true),
            Field::new("Confirmed", DataType::Float64, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec!["1/22/20"])),
                Arc::new(Float64Array::from(vec![1.0])),
            ],
        )?;
        let out = coerce_batch(&batch, &spec(), "inline")?;
        let dates = out.column(0).as_any().downcast_ref::<Date32Array>().unwrap();
        assert_eq!(crate::load::date_parser::format_date32(dates.value(0)), "2020-01-22");
        Ok(())
    }
}
