use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::EconError;
use crate::types::Year;
use crate::EconResult;

pub const COUNTRY_NAME: &str = "Country Name";
pub const INDICATOR_NAME: &str = "Indicator Name";

/// Preamble lines ("Data Source", "Last Updated Date", blanks) ahead of the
/// header row in World Bank bulk-download CSVs.
pub const WORLD_BANK_PREAMBLE_ROWS: usize = 4;

/// A wide World Bank table: one row per (country, indicator), one column per year.
#[derive(Debug, Clone)]
pub struct WideTable {
    label: String,
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl WideTable {
    /// Parse CSV text, discarding `skip_rows` raw lines before the header.
    pub fn from_reader<R: Read>(label: &str, reader: R, skip_rows: usize) -> EconResult<Self> {
        let mut buffered = BufReader::new(reader);
        let mut discard = String::new();
        for _ in 0..skip_rows {
            discard.clear();
            if buffered.read_line(&mut discard)? == 0 {
                break;
            }
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(buffered);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        log::debug!("{label}: parsed {} columns, {} rows", headers.len(), rows.len());
        Ok(WideTable::from_parts(label, headers, rows))
    }

    pub fn from_path(label: &str, path: impl AsRef<Path>, skip_rows: usize) -> EconResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| EconError::Io(format!("Failed to open '{}': {}", path.display(), e)))?;
        WideTable::from_reader(label, file, skip_rows)
    }

    pub fn from_parts(label: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut index = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            index.entry(h.clone()).or_insert(i);
        }
        WideTable {
            label: label.to_string(),
            headers,
            index,
            rows,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Fails with a schema error listing every absent column.
    pub fn require_columns(&self, required: &[&str]) -> EconResult<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| self.column_index(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EconError::Schema {
                table: self.label.clone(),
                missing,
            })
        }
    }

    /// Columns whose header is a plain decimal year, sorted ascending.
    pub fn year_columns(&self) -> Vec<(Year, usize)> {
        let mut years: Vec<(Year, usize)> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty() && h.chars().all(|c| c.is_ascii_digit()))
            .filter_map(|(i, h)| h.parse::<Year>().ok().map(|y| (y, i)))
            .collect();
        years.sort_unstable();
        years.dedup_by_key(|(y, _)| *y);
        years
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Cell text, `None` when a short (ragged) row has no such column.
    pub fn cell<'a>(&self, row: &'a [String], column: usize) -> Option<&'a str> {
        row.get(column).map(|s| s.as_str())
    }

    /// Keep only rows satisfying `keep`.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[String]) -> bool) {
        self.rows.retain(|r| keep(r));
    }
}

/// Lenient numeric coercion: strip everything except digits, '.', '-', 'e'
/// and 'E', then parse. Unparseable or non-finite input is missing.
pub fn parse_numeric(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
