// CSV/TSV sheet import

use std::io::Read;
use std::path::Path;

use bimgraph_recon::Table;

/// Import one sheet saved as CSV/TSV. `header_row` is the 1-based record
/// holding the column headers; records above it are ignored.
pub fn import_table(path: &Path, header_row: usize) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = if is_tsv(path) { b'\t' } else { sniff_delimiter(&content) };
    import_from_string(&content, delimiter, header_row)
}

pub fn import_from_string(content: &str, delimiter: u8, header_row: usize) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut table = Table::default();

    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| e.to_string())?;
        if idx + 1 < header_row {
            continue;
        }
        match &headers {
            None => {
                let raw: Vec<String> = record.iter().map(str::to_string).collect();
                table = Table::new(&raw);
                headers = Some(raw);
            }
            Some(raw) => {
                let line = record.position().map_or(idx + 1, |pos| pos.line() as usize);
                let cells: Vec<&str> = record.iter().collect();
                table.push_positional(line, raw, &cells);
            }
        }
    }

    Ok(table)
}

fn is_tsv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub(crate) fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines.iter().map(|line| field_count(line, delim)).collect();

        // A viable delimiter splits the first line
        let Some(&target) = counts.first().filter(|&&c| c > 1) else {
            continue;
        };

        // More consistent lines and more columns both raise the score
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Read file and convert to UTF-8 if needed (Excel-exported CSVs are often Windows-1252).
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| format!("{}: {}", path.display(), e))?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}
