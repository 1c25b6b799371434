// Excel/ODS sheet import (xlsx, xlsm, xls, xlsb, ods)

use std::path::Path;

use bimgraph_recon::Table;
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};

/// File extensions calamine can open.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| WORKBOOK_EXTENSIONS.iter().any(|w| e.eq_ignore_ascii_case(w)))
}

/// Sheet names in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, String> {
    let workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open workbook {}: {}", path.display(), e))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Import one sheet as a table. Returns `Ok(None)` when the workbook has no
/// sheet of that name. `header_row` is the 1-based spreadsheet row holding
/// the column headers; rows above it are ignored.
pub fn import_sheet(path: &Path, sheet_name: &str, header_row: usize) -> Result<Option<Table>, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open workbook {}: {}", path.display(), e))?;

    if !workbook.sheet_names().iter().any(|n| n == sheet_name) {
        return Ok(None);
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    let table = range_to_table(&range, header_row);
    log::debug!(
        "{}: sheet '{}' -> {} column(s), {} row(s)",
        path.display(),
        sheet_name,
        table.headers().len(),
        table.len()
    );
    Ok(Some(table))
}

fn range_to_table(range: &Range<Data>, header_row: usize) -> Table {
    let (height, width) = range.get_size();
    if height == 0 || width == 0 {
        return Table::default();
    }

    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let header_index = header_row.saturating_sub(1);

    let mut headers: Option<Vec<String>> = None;
    let mut table = Table::default();

    for (row_idx, row) in range.rows().enumerate() {
        if start_row as usize + row_idx < header_index {
            continue;
        }

        // Pad leading columns so positions line up with the header row
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_to_string));

        match &headers {
            None => {
                table = Table::new(&cells);
                headers = Some(cells);
            }
            Some(raw) => {
                let refs: Vec<&str> = cells.iter().map(String::as_str).collect();
                table.push_positional(start_row as usize + row_idx + 1, raw, &refs);
            }
        }
    }

    table
}

/// Render a cell the way it reads in the sheet. Whole floats lose their
/// decimals so numeric identifiers match their text form.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}
