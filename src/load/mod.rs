// src/load/mod.rs
pub mod convert;
pub mod date_parser;
pub mod raw_table;
pub mod schema;
pub mod utils;

use anyhow::{bail, Context, Result};
use arrow::{compute::concat_batches, record_batch::RecordBatch};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{fs::File, path::Path};
use tracing::{debug, info};

pub use schema::{ColumnKind, ColumnSpec, TableSpec};

/// Load one input dataset, choosing the reader by file extension.
///
/// The returned batch has every declared column of `spec` under its canonical
/// name and type; other columns keep their inferred (CSV) or stored (Parquet) type.
#[tracing::instrument(
    level = "info",
    skip(path, spec),
    fields(path = %path.as_ref().display(), table = %spec.table_name)
)]
pub fn load_table<P: AsRef<Path>>(path: P, spec: &TableSpec) -> Result<RecordBatch> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let batch = match ext.as_str() {
        "csv" => {
            let raw = raw_table::read_csv_file(path)?;
            debug!(rows = raw.num_rows(), cols = raw.headers.len(), "read raw csv");
            let info = schema::analyze_raw_table(&raw, spec)
                .with_context(|| format!("analyzing schema of {}", source))?;
            convert::convert_to_final_types(&raw, &info, &source)?
        }
        "parquet" => {
            let batch = read_parquet_file(path)?;
            convert::coerce_batch(&batch, spec, &source)?
        }
        other => bail!(
            "{}: unsupported input format {:?} (expected .csv or .parquet)",
            source,
            other
        ),
    };

    info!(rows = batch.num_rows(), cols = batch.num_columns(), "loaded table");
    Ok(batch)
}

/// Read every record batch of a Parquet file into a single batch.
pub fn read_parquet_file(path: &Path) -> Result<RecordBatch> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open parquet file: {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read parquet metadata: {}", path.display()))?;
    let schema = builder.schema().clone();
    let reader = builder.with_batch_size(8192).build()?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch.with_context(|| format!("reading batch from {}", path.display()))?);
    }
    concat_batches(&schema, &batches).context("concatenating parquet batches")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Date32Array, Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::Builder;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,covidboard::load=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn spec() -> TableSpec {
        TableSpec {
            table_name: "time_series".into(),
            columns: vec![
                ColumnSpec::new("Date", ColumnKind::Date),
                ColumnSpec::new("Country", ColumnKind::Text).alias("Country/Region"),
                ColumnSpec::new("Confirmed", ColumnKind::Number),
            ],
        }
    }

    #[test]
    fn loads_kaggle_style_csv() -> Result<()> {
        init_test_logging();
        let content = "Province/State,Country/Region,Lat,Long,Date,Confirmed,Deaths,Recovered,Active,WHO Region
,Afghanistan,33.93911,67.709953,2020-01-22,0,0,0,0,Eastern Mediterranean
Hubei,China,30.9756,112.2707,2020-01-22,444,17,28,399,Western Pacific
";
        let mut tmp = Builder::new().suffix(".csv").tempfile()?;
        tmp.write_all(content.as_bytes())?;

        let batch = load_table(tmp.path(), &spec())?;
        assert_eq!(batch.num_rows(), 2);

        let schema = batch.schema();
        assert_eq!(schema.field_with_name("Country")?.data_type(), &DataType::Utf8);
        assert_eq!(schema.field_with_name("Date")?.data_type(), &DataType::Date32);
        assert_eq!(schema.field_with_name("Lat")?.data_type(), &DataType::Float64);
        assert_eq!(schema.field_with_name("Active")?.data_type(), &DataType::Float64);
        assert_eq!(
            schema.field_with_name("Province/State")?.data_type(),
            &DataType::Utf8
        );

        let idx = schema.index_of("Country")?;
        let countries = batch
            .column(idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(countries.value(1), "China");
        Ok(())
    }

    #[test]
    fn na_spellings_load_as_nulls() -> Result<()> {
        init_test_logging();
        let content = "Date,Country/Region,Confirmed,Active,WHO Region
2020-01-22,Egypt,5,NaN,N/A
2020-01-22,Egypt,NaN,3,Eastern Mediterranean
2020-01-23,Egypt,N/A,,Eastern Mediterranean
";
        let mut tmp = Builder::new().suffix(".csv").tempfile()?;
        tmp.write_all(content.as_bytes())?;

        let batch = load_table(tmp.path(), &spec())?;
        let schema = batch.schema();
        assert_eq!(schema.field_with_name("Active")?.data_type(), &DataType::Float64);

        let confirmed = batch
            .column(schema.index_of("Confirmed")?)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(confirmed.value(0), 5.0);
        assert!(confirmed.is_null(1));
        assert!(confirmed.is_null(2));
        assert_eq!(confirmed.iter().flatten().sum::<f64>(), 5.0);

        let active = batch
            .column(schema.index_of("Active")?)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert!(active.is_null(0));
        assert_eq!(active.value(1), 3.0);

        let region = batch
            .column(schema.index_of("WHO Region")?)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!(region.is_null(0));
        Ok(())
    }

    #[test]
    fn unparseable_date_aborts_load() -> Result<()> {
        init_test_logging();
        let mut tmp = Builder::new().suffix(".csv").tempfile()?;
        tmp.write_all(b"Date,Country,Confirmed\n22nd of Jan,Egypt,1\n")?;
        let err = load_table(tmp.path(), &spec()).unwrap_err();
        assert!(format!("{:#}", err).contains("unparseable date"));
        Ok(())
    }

    #[test]
    fn unknown_extension_is_rejected() -> Result<()> {
        let tmp = Builder::new().suffix(".xlsx").tempfile()?;
        let err = load_table(tmp.path(), &spec()).unwrap_err();
        assert!(err.to_string().contains("unsupported input format"));
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_table("does/not/exist.csv", &spec()).is_err());
    }

    #[test]
    fn loads_parquet_with_coercion() -> Result<()> {
        init_test_logging();
        let schema = Arc::new(Schema::new(vec![
            Field::new("Country/Region", DataType::Utf8, true),
            Field::new("Date", DataType::Utf8, true),
            Field::new("Confirmed", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["Egypt", "Egypt"])),
                Arc::new(StringArray::from(vec!["2020-03-01", "2020-03-02"])),
                Arc::new(Float64Array::from(vec![2.0, 3.0])),
            ],
        )?;
        let tmp = Builder::new().suffix(".parquet").tempfile()?;
        let mut writer = ArrowWriter::try_new(tmp.reopen()?, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;

        let loaded = load_table(tmp.path(), &spec())?;
        assert_eq!(loaded.num_rows(), 2);
        let idx = loaded.schema().index_of("Date")?;
        let dates = loaded
            .column(idx)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates.value(1) - dates.value(0), 1);
        Ok(())
    }
}
