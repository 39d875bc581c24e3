use anyhow::{bail, Result};
use arrow::datatypes::{DataType, Field, Schema};

use super::raw_table::RawTable;
use super::utils::infer_column_dtype;

/// Declared type of a column the dashboard relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Date,
}

impl ColumnKind {
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnKind::Text => DataType::Utf8,
            ColumnKind::Number => DataType::Float64,
            ColumnKind::Date => DataType::Date32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    /// Alternative header names accepted in input files.
    pub aliases: Vec<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            aliases: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// Required columns of one input dataset. Columns not listed are kept with
/// inferred types.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub table_name: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    /// Map file headers onto canonical names, renaming aliases, and fail if a
    /// required column is absent.
    pub fn resolve_headers(&self, headers: &[String]) -> Result<Vec<String>> {
        let mut resolved = headers.to_vec();
        for col in &self.columns {
            if resolved.iter().any(|h| h == &col.name) {
                continue;
            }
            match resolved
                .iter_mut()
                .find(|h| col.aliases.iter().any(|a| a.as_str() == h.as_str()))
            {
                Some(h) => *h = col.name.clone(),
                None => bail!(
                    "{}: required column `{}` missing (found: {})",
                    self.table_name,
                    col.name,
                    headers.join(", ")
                ),
            }
        }
        Ok(resolved)
    }
}

/// Final schema for a raw table + which columns need date parsing.
pub struct SchemaInfo {
    pub schema: Schema,
    pub date_columns: Vec<String>,
}

/// Declared kinds win; every other column is inferred from its text.
pub fn analyze_raw_table(raw: &RawTable, spec: &TableSpec) -> Result<SchemaInfo> {
    let headers = spec.resolve_headers(&raw.headers)?;
    let mut fields = Vec::with_capacity(headers.len());
    let mut date_columns = Vec::new();

    for (i, name) in headers.iter().enumerate() {
        let ty = match spec.kind_of(name) {
            Some(kind) => {
                if kind == ColumnKind::Date {
                    date_columns.push(name.clone());
                }
                kind.data_type()
            }
            None => infer_column_dtype(raw.column(i)),
        };
        fields.push(Field::new(name, ty, true));
    }

    Ok(SchemaInfo {
        schema: Schema::new(fields),
        date_columns,
    })
}
