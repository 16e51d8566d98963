// Matrix sheet import (xlsx, xls, xlsb, ods)
//
// One sheet becomes a header row plus string cells. Values are rendered the
// way they read in Excel, not kept typed: comparisons downstream are textual.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::error::IoError;

/// A sheet read from a workbook. `rows` excludes the header row and every
/// row above it; fully empty rows are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Read `sheet` (first sheet when `None`) of the workbook at `path`, taking
/// absolute row `header_row` (0-based) as the header.
pub fn read_sheet(path: &Path, sheet: Option<&str>, header_row: usize) -> Result<SheetData, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(s) if sheet_names.iter().any(|n| n == s) => s.to_string(),
        Some(s) => {
            return Err(IoError::SheetNotFound {
                path: path.display().to_string(),
                sheet: s.to_string(),
            })
        }
        None => sheet_names.first().cloned().ok_or_else(|| IoError::SheetNotFound {
            path: path.display().to_string(),
            sheet: "<first>".to_string(),
        })?,
    };

    let range = workbook.worksheet_range(&name).map_err(|e| IoError::Open {
        path: path.display().to_string(),
        message: format!("sheet '{name}': {e}"),
    })?;

    // Range start offset (data may not begin at A1)
    let (start_row, _) = range.start().unwrap_or((0, 0));
    let start_row = start_row as usize;
    let (height, _) = range.get_size();

    if header_row < start_row || header_row >= start_row + height {
        return Err(IoError::HeaderRow {
            path: path.display().to_string(),
            row: header_row,
            rows: start_row + height,
        });
    }

    let mut rows = range.rows().skip(header_row - start_row);
    let headers: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(|c| render_cell(c).unwrap_or_default()).collect())
        .unwrap_or_default();

    let rows: Vec<Vec<Option<String>>> = rows
        .map(|r| r.iter().map(render_cell).collect::<Vec<_>>())
        .filter(|r| r.iter().any(Option::is_some))
        .collect();

    debug!(
        path = %path.display(),
        sheet = %name,
        columns = headers.len(),
        rows = rows.len(),
        "sheet read"
    );

    Ok(SheetData { name, headers, rows })
}

/// Render one cell as text. Empty cells (and empty strings) are null.
pub fn render_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => (!s.is_empty()).then(|| s.clone()),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{}", n))
            }
        }
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Some(format!("#{:?}", e)),
        // 1900 date system assumed; calamine does not expose the 1904 flag.
        Data::DateTime(dt) => Some(serial_to_iso(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Excel serial date to `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` when it carries
/// a time of day, or `HH:MM:SS` for a pure time.
pub fn serial_to_iso(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0)) else {
        return serial.to_string();
    };
    let days = serial.floor();
    let seconds = ((serial - days) * 86_400.0).round() as i64;
    let Some(dt) = epoch
        .checked_add_signed(Duration::days(days as i64))
        .and_then(|d| d.checked_add_signed(Duration::seconds(seconds)))
    else {
        return serial.to_string();
    };

    if days < 1.0 {
        dt.format("%H:%M:%S").to_string()
    } else if seconds == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
