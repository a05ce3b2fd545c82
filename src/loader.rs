//! File readers for the front ends
//!
//! The census and member extracts are `;`-separated Latin-1 text; the
//! financial base is usually a spreadsheet. All cells come back as trimmed
//! strings in a [`RawTable`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};

use crate::error::ReadjustResult;
use crate::session::ManualAdjustment;
use crate::table::RawTable;

/// Delimiter of the census and member extracts
pub const EXTRACT_DELIMITER: u8 = b';';

const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "xlsb", "ods"];

/// Read a text file as UTF-8, falling back to Windows-1252 (a Latin-1 superset)
pub fn read_text(path: &Path) -> ReadjustResult<String> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    Ok(decode_text(bytes))
}

pub fn decode_text(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Parse delimited text whose first line is the header. Blank lines are skipped.
pub fn parse_delimited(content: &str, delimiter: u8) -> ReadjustResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(|f| f.trim().to_string()).collect());
    }

    Ok(RawTable::new(headers, rows))
}

/// Pick `;` or `,` by whichever splits the header line into more fields
pub fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");
    if header.matches(',').count() > header.matches(';').count() {
        b','
    } else {
        b';'
    }
}

pub fn load_delimited(path: &Path, delimiter: u8) -> ReadjustResult<RawTable> {
    let content = read_text(path)?;
    let table = parse_delimited(&content, delimiter)?;
    log::info!("Read {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Readjustment / census extract
pub fn load_census(path: &Path) -> ReadjustResult<RawTable> {
    load_delimited(path, EXTRACT_DELIMITER)
}

/// Member usage extract
pub fn load_members(path: &Path) -> ReadjustResult<RawTable> {
    load_delimited(path, EXTRACT_DELIMITER)
}

/// Financial base: spreadsheet by extension, otherwise delimited text
pub fn load_financial(path: &Path) -> ReadjustResult<RawTable> {
    let is_spreadsheet = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false);

    if is_spreadsheet {
        load_spreadsheet(path)
    } else {
        let content = read_text(path)?;
        let table = parse_delimited(&content, sniff_delimiter(&content))?;
        log::info!("Read {} rows from {}", table.len(), path.display());
        Ok(table)
    }
}

/// First worksheet of a workbook; first row is the header
pub fn load_spreadsheet(path: &Path) -> ReadjustResult<RawTable> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        log::warn!("{} contains no sheets", path.display());
        return Ok(RawTable::default());
    };
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(cell_text).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<String>> = rows
        .map(|r| r.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|r| r.iter().any(|c| !c.is_empty()))
        .collect();

    log::info!("Read {} rows from sheet '{}' of {}", rows.len(), sheet, path.display());
    Ok(RawTable::new(headers, rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        // integral floats without decimals so ids join with text extracts
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Float(n) => format!("{}", n),
        Data::Int(n) => format!("{}", n),
        other => other.to_string(),
    }
}

/// Operator edits (`id_corporacao, empresa, ajuste_mv, expurgo`)
pub fn load_edits(path: &Path) -> ReadjustResult<Vec<ManualAdjustment>> {
    let content = read_text(path)?;
    let table = parse_delimited(&content, sniff_delimiter(&content))?;
    ManualAdjustment::from_table(table)
}
