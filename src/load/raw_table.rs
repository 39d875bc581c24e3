use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{io::Read, path::Path};
use tracing::warn;

use super::utils::clean_str;

#[derive(Debug)]
pub struct RawTable {
    /// Column names from the header row, cleaned.
    pub headers: Vec<String>,
    /// Each data row as cleaned strings, padded to `headers.len()`.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Iterate one column's cells.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r[idx].as_str())
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Read a headered CSV file into a [`RawTable`].
pub fn read_csv_file(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_csv(file, &path.display().to_string())
}

/// Read headered CSV text from any reader. `source` only labels errors.
pub fn read_csv<R: Read>(reader: R, source: &str) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("CSV header error in {}", source))?
        .iter()
        .map(clean_str)
        .collect();

    let width = headers.len();
    let mut rows = Vec::new();
    let mut ragged = 0usize;
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("CSV parse error in {} at record {}", source, idx))?;
        let mut row: Vec<String> = record.iter().map(clean_str).collect();
        if row.len() != width {
            ragged += 1;
            row.resize(width, String::new());
        }
        rows.push(row);
    }
    if ragged > 0 {
        warn!(source, ragged, width, "rows with a different field count were padded/truncated");
    }

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_rows() -> Result<()> {
        let text = "Country,Continent,TotalCases\n\"Egypt\", Africa ,100000\nPeru,South America\n";
        let raw = read_csv(text.as_bytes(), "inline")?;
        assert_eq!(raw.headers, vec!["Country", "Continent", "TotalCases"]);
        assert_eq!(raw.num_rows(), 2);
        assert_eq!(raw.rows[0], vec!["Egypt", "Africa", "100000"]);
        // short row padded with an empty cell
        assert_eq!(raw.rows[1][2], "");
        assert_eq!(raw.column(0).collect::<Vec<_>>(), vec!["Egypt", "Peru"]);
        Ok(())
    }
}
