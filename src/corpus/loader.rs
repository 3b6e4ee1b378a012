/// Knowledge-base loading.
///
/// Every row of the source becomes one document: non-empty cells joined by
/// a single space. Spreadsheets (xlsx, xls, xlsb, ods) go through calamine
/// and only the first sheet is read; `.csv` files go through the csv crate.
use std::path::{Path, PathBuf};

use calamine::{Data, DataType, Reader, open_workbook_auto};
use thiserror::Error;
use tracing::{debug, info};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("knowledge file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("workbook has no sheets: {}", .0.display())]
    NoSheets(PathBuf),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Load every non-empty row of the knowledge file as a document,
/// preserving row order.
pub fn load_documents(path: &Path) -> Result<Vec<String>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let documents = if is_csv {
        load_csv(path)?
    } else {
        load_spreadsheet(path)?
    };

    info!("Loaded {} rows from {}", documents.len(), path.display());
    Ok(documents)
}

fn load_spreadsheet(path: &Path) -> Result<Vec<String>, LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NoSheets(path.to_path_buf()))??;

    let mut documents = Vec::new();
    let mut skipped = 0usize;
    for row in range.rows() {
        match row_to_document(row) {
            Some(doc) => documents.push(doc),
            None => skipped += 1,
        }
    }
    debug!("Skipped {skipped} empty rows");
    Ok(documents)
}

fn load_csv(path: &Path) -> Result<Vec<String>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut documents = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(doc) = join_cells(record.iter()) {
            documents.push(doc);
        }
    }
    Ok(documents)
}

/// Turn one spreadsheet row into a document, or `None` if every cell is blank.
pub fn row_to_document(row: &[Data]) -> Option<String> {
    join_cells(row.iter().map(cell_text))
}

/// Dates render as `YYYY-MM-DD HH:MM:SS` rather than the raw Excel serial.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(dt) if dt.is_datetime() => datetime_text(cell),
        Data::DateTimeIso(_) => datetime_text(cell),
        other => other.to_string(),
    }
}

fn datetime_text(cell: &Data) -> String {
    cell.as_datetime()
        .map(|d| d.format(DATETIME_FORMAT).to_string())
        .unwrap_or_else(|| cell.to_string())
}

/// Join non-blank cell values with single spaces and trim the result.
pub fn join_cells<I, S>(cells: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = cells
        .into_iter()
        .filter(|c| !c.as_ref().trim().is_empty())
        .map(|c| c.as_ref().to_string())
        .collect::<Vec<String>>()
        .join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
