//! PPD workbook to DOORS reference table.
//!
//! The PPD (project document plan) workbook lists every deliverable with its
//! title and revision. This export selects and renames its columns to the
//! DOORS import layout; the resulting tab-delimited file is the reference
//! table used to enrich consolidated identifiers, keyed by
//! `<N°>_<Référence ALSTOM>`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use stimatrix_recon::Table;
use tracing::{debug, info};

use crate::error::IoError;
use crate::sheet::{read_sheet, SheetData};
use crate::xlsx::export_table;

/// DOORS column and the PPD column it is read from, in DOORS order.
/// DOORS-only columns (no PPD counterpart) are not exported.
pub const DOORS_COLUMNS: &[(&str, &str)] = &[
    ("Titre", "Titre"),
    ("Référence ALSTOM", "N°ATSA"),
    ("Révision", "Indice de révision"),
    ("Métier", "Métier"),
    ("Type de document", "Type de document"),
    ("Référence SNCF", "N°SNCF"),
    ("Référence FNR", "N°Fournisseur"),
    ("Nom FNR", "Nom Fournisseur"),
    ("Numéro de bordereau", "N° Bordereau"),
    ("Date d'envoi", "Date d'envoi"),
    ("Date du retour SNCF", "Date du retour SNCF"),
    ("Statut du retour SNCF", "Statut du retour SNCF"),
];

/// DOORS object number, the first exported column. Read from the PPD column
/// of the same name when the sheet has one, numbered from 1 in export order
/// otherwise.
pub const NUMBER_COLUMN: &str = "N°";

/// DOORS columns holding dates, exported as `dd/mm/YYYY`.
pub const DATE_COLUMNS: &[&str] = &["Date d'envoi", "Date du retour SNCF"];

/// Rows whose alternate reference starts with this marker are placeholders.
const PLACEHOLDER_PREFIX: &str = "##";

#[derive(Debug, Clone)]
pub struct PpdOptions {
    pub sheet: String,
    pub header_row: usize,
}

impl Default for PpdOptions {
    fn default() -> Self {
        Self {
            sheet: "PPD".to_string(),
            header_row: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PpdExport {
    pub rows: usize,
    pub dropped_placeholders: usize,
    pub csv_path: PathBuf,
    pub xlsx_path: PathBuf,
}

/// Select, rename and clean the PPD columns into the DOORS layout.
///
/// Returns the table and the number of placeholder rows dropped.
pub fn to_doors(sheet: &SheetData) -> Result<(Table, usize), IoError> {
    let headers: Vec<String> = sheet.headers.iter().map(|h| h.trim().to_string()).collect();

    let mut missing = Vec::new();
    let mut indices = Vec::with_capacity(DOORS_COLUMNS.len());
    for (_, ppd) in DOORS_COLUMNS {
        match headers.iter().position(|h| h == ppd) {
            Some(i) => indices.push(i),
            None => missing.push(ppd.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(IoError::MissingColumns(missing));
    }
    let number_idx = headers.iter().position(|h| h == NUMBER_COLUMN);

    let mut table = Table::new(
        std::iter::once(NUMBER_COLUMN)
            .chain(DOORS_COLUMNS.iter().map(|(doors, _)| *doors))
            .map(str::to_string)
            .collect(),
    );
    let mut dropped = 0;

    for row in &sheet.rows {
        let mut cells: Vec<String> = DOORS_COLUMNS
            .iter()
            .zip(&indices)
            .map(|((doors, _), &i)| {
                let value = row.get(i).cloned().flatten().unwrap_or_default();
                if DATE_COLUMNS.contains(doors) {
                    french_date(&value)
                } else {
                    value
                }
            })
            .collect();

        if cells.iter().all(String::is_empty) {
            continue;
        }
        if cells[1].starts_with(PLACEHOLDER_PREFIX) {
            dropped += 1;
            continue;
        }

        let number = number_idx
            .and_then(|i| row.get(i).cloned().flatten())
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| (table.rows.len() + 1).to_string());
        cells.insert(0, number);
        table.push(cells);
    }

    debug!(rows = table.rows.len(), dropped, "ppd rows converted");
    Ok((table, dropped))
}

/// `YYYY-MM-DD[ HH:MM:SS]` to `dd/mm/YYYY`; anything else is kept as written.
fn french_date(value: &str) -> String {
    value
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Tab-delimited UTF-8 with a byte order mark, the encoding DOORS expects.
pub fn write_tsv(table: &Table, path: &Path) -> Result<(), IoError> {
    let write_err = |message: String| IoError::Write {
        path: path.display().to_string(),
        message,
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer("\u{feff}".as_bytes().to_vec());
    writer.write_record(&table.headers).map_err(|e| write_err(e.to_string()))?;
    for row in &table.rows {
        writer.write_record(row).map_err(|e| write_err(e.to_string()))?;
    }
    let bytes = writer.into_inner().map_err(|e| write_err(e.to_string()))?;
    std::fs::write(path, bytes).map_err(|e| write_err(e.to_string()))
}

/// Read the PPD workbook at `input` and write `output` (TSV) plus a sibling
/// `.xlsx` copy.
pub fn export(input: &Path, options: &PpdOptions, output: &Path) -> Result<PpdExport, IoError> {
    info!(
        input = %input.display(),
        sheet = %options.sheet,
        header_row = options.header_row,
        "reading PPD"
    );
    let sheet = read_sheet(input, Some(options.sheet.as_str()), options.header_row)?;
    let (table, dropped_placeholders) = to_doors(&sheet)?;

    write_tsv(&table, output)?;
    let xlsx_path = output.with_extension("xlsx");
    export_table(&table, "Sheet1", &xlsx_path)?;

    info!(
        csv = %output.display(),
        xlsx = %xlsx_path.display(),
        rows = table.rows.len(),
        dropped_placeholders,
        "PPD exported"
    );

    Ok(PpdExport {
        rows: table.rows.len(),
        dropped_placeholders,
        csv_path: output.to_path_buf(),
        xlsx_path,
    })
}
