// Result workbook export (xlsx only)
//
// One table per workbook: bold header row, autofilter over every column,
// column widths fitted to content and capped.

use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use stimatrix_recon::Table;
use tracing::info;

use crate::error::IoError;

/// Widest a column gets, in Excel character units.
const MAX_COLUMN_WIDTH: f64 = 60.0;

/// Excel rejects sheet names over 31 characters or containing `[]:*?/\`.
pub fn sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(31)
        .collect();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

/// `min(longest value + 1.5, 60)`, header included.
pub fn column_width(table: &Table, col: usize) -> f64 {
    let longest = std::iter::once(table.headers.get(col))
        .chain(table.rows.iter().map(|r| r.get(col)))
        .flatten()
        .map(|s| s.chars().count())
        .max()
        .unwrap_or(0);
    (longest as f64 + 1.5).min(MAX_COLUMN_WIDTH)
}

/// Write `table` to a new workbook at `path`, replacing any existing file.
pub fn export_table(table: &Table, sheet: &str, path: &Path) -> Result<(), IoError> {
    let write_err = |e: rust_xlsxwriter::XlsxError| IoError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IoError::Write {
            path: parent.display().to_string(),
            message: e.to_string(),
        })?;
    }

    let header_format = Format::new().set_bold();
    let wrap_format = Format::new().set_text_wrap().set_align(FormatAlign::Top);

    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(sheet_name(sheet))
        .map_err(write_err)?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(write_err)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = row_idx as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            // Multi-line cells (difference text, enriched lists) need wrapping
            if value.contains('\n') {
                worksheet
                    .write_string_with_format(row_num, col as u16, value, &wrap_format)
                    .map_err(write_err)?;
            } else {
                worksheet.write_string(row_num, col as u16, value).map_err(write_err)?;
            }
        }
    }

    if !table.headers.is_empty() {
        let last_col = (table.headers.len() - 1) as u16;
        worksheet
            .autofilter(0, 0, table.rows.len() as u32, last_col)
            .map_err(write_err)?;
        for col in 0..table.headers.len() {
            worksheet
                .set_column_width(col as u16, column_width(table, col))
                .map_err(write_err)?;
        }
    }

    workbook.save(path).map_err(write_err)?;
    info!(path = %path.display(), rows = table.rows.len(), "exported");
    Ok(())
}
