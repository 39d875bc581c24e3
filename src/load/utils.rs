use arrow::datatypes::DataType;

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Cell spellings read as a missing value: the NA markers dataframe and
/// spreadsheet exports write for empty numbers.
pub const MISSING_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// True for an empty cell or one of [`MISSING_TOKENS`].
pub fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_TOKENS.contains(&cell)
}

/// Infer an Arrow dtype for a whole column of cleaned cells.
///
/// Missing cells are ignored. A column is Float64 only when every non-empty
/// cell parses as a number; a column with no values at all stays Utf8.
pub fn infer_column_dtype<'a, I>(cells: I) -> DataType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = false;
    for cell in cells {
        if is_missing(cell) {
            continue;
        }
        seen = true;
        if parse_number(cell).is_none() {
            return DataType::Utf8;
        }
    }
    if seen {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

/// Parse a numeric cell, tolerating thousands separators ("1,234").
/// Non-finite values (`inf`, `NaN`) are not numbers here.
pub fn parse_number(s: &str) -> Option<f64> {
    let v = match s.parse::<f64>() {
        Ok(v) => v,
        Err(_) if s.contains(',') => s.replace(',', "").parse::<f64>().ok()?,
        Err(_) => return None,
    };
    v.is_finite().then_some(v)
}
