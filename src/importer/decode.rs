// src/importer/decode.rs
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::debug;

use crate::models::Result;

/// Decode uploaded spreadsheet bytes into a raw cell grid (first row is the
/// header row). CSV and Excel are handled by their respective crates; all
/// interpretation of the cells happens in the parser.
pub fn decode_spreadsheet(filename: &str, bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => decode_csv(bytes),
        "xlsx" | "xls" | "xlsm" => decode_excel(bytes),
        other => Err(format!("unsupported file type: .{} (expected .csv or .xlsx)", other).into()),
    }
}

fn decode_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(|c| c.to_string()).collect());
    }

    debug!("📄 Decoded CSV: {} rows", grid.len());
    Ok(grid)
}

fn decode_excel(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or("workbook contains no worksheets")??;

    let mut grid = Vec::new();
    for row in range.rows() {
        let cells = row
            .iter()
            .map(|cell| match cell {
                Data::Empty => String::new(),
                Data::String(s) => s.clone(),
                Data::Float(f) => {
                    if f.fract() == 0.0 {
                        format!("{}", *f as i64)
                    } else {
                        f.to_string()
                    }
                }
                Data::Int(i) => i.to_string(),
                Data::Bool(b) => b.to_string(),
                other => other.to_string(),
            })
            .collect();
        grid.push(cells);
    }

    debug!("📄 Decoded workbook: {} rows", grid.len());
    Ok(grid)
}
