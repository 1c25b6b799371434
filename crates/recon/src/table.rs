use std::collections::HashMap;

use crate::error::ReconError;

/// One data row: header → raw cell text.
pub type Row = HashMap<String, String>;

/// A loaded sheet in neutral form, as handed over by the sheet-selection
/// layer. Headers are trimmed; blank headers are dropped and the first of
/// two identical headers wins.
///
/// Each kept row remembers the 1-based line (or spreadsheet row) it was read
/// from, so skipped-row reports point at the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
    lines: Vec<usize>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for h in headers {
            let h = h.as_ref().trim();
            if !h.is_empty() && !out.iter().any(|existing| existing == h) {
                out.push(h.to_string());
            }
        }
        Self {
            headers: out,
            rows: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Positional constructor: `rows[i][j]` belongs under `headers[j]`.
    /// The header is line 1, so `rows[i]` is line `i + 2`.
    pub fn from_rows<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        R: IntoIterator<Item = Vec<C>>,
        C: AsRef<str>,
    {
        let headers: Vec<String> = headers.into_iter().map(|h| h.as_ref().to_string()).collect();
        let mut table = Self::new(&headers);
        for (idx, cells) in rows.into_iter().enumerate() {
            let cells: Vec<&str> = cells.iter().map(|c| c.as_ref()).collect();
            table.push_positional(idx + 2, &headers, &cells);
        }
        table
    }

    /// Parse CSV text whose first record is the header row.
    pub fn from_csv(data: &str) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ReconError::Io(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut table = Self::new(&headers);
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
            let line = record
                .position()
                .map_or(idx + 2, |pos| pos.line() as usize);
            let cells: Vec<&str> = record.iter().collect();
            table.push_positional(line, &headers, &cells);
        }
        Ok(table)
    }

    /// Append the row read from source `line`, given cells aligned with
    /// `raw_headers` (the untrimmed header row as read). Rows whose cells are
    /// all blank are ignored.
    pub fn push_positional(&mut self, line: usize, raw_headers: &[String], cells: &[&str]) {
        if cells.iter().all(|c| c.trim().is_empty()) {
            return;
        }
        let mut row = Row::new();
        for (header, cell) in raw_headers.iter().zip(cells.iter()) {
            let header = header.trim();
            if header.is_empty() {
                continue;
            }
            row.entry(header.to_string()).or_insert_with(|| cell.to_string());
        }
        self.rows.push(row);
        self.lines.push(line);
    }

    /// Append a row that is already keyed by header. Unknown headers are
    /// added to the header list. The row takes the line after the last one.
    pub fn push_row(&mut self, row: Row) {
        let mut keyed = Row::new();
        for (header, value) in row {
            let header = header.trim().to_string();
            if header.is_empty() {
                continue;
            }
            if !self.headers.contains(&header) {
                self.headers.push(header.clone());
            }
            keyed.insert(header, value);
        }
        let line = self.lines.last().map_or(2, |last| last + 1);
        self.rows.push(keyed);
        self.lines.push(line);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows paired with the source line each was read from.
    pub fn numbered_rows(&self) -> impl Iterator<Item = (usize, &Row)> {
        self.lines.iter().copied().zip(self.rows.iter())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// No header row and no data: an absent or blank sheet.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        let name = name.trim();
        self.headers.iter().any(|h| h == name)
    }
}

/// Trimmed, non-blank cell value.
pub fn cell<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column.trim())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}
