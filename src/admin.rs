// Admin import: re-serialize an uploaded .xlsx workbook into the raw-input
// CSV consumed by the primary ingestion path.
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use log::info;

/// Shared-secret gate for the import entry point.
pub fn verify_password(entered: &str, expected: &str) -> bool {
    !expected.is_empty() && entered.trim() == expected
}

/// Convert the first worksheet of `workbook_path` into CSV at `dest_csv`.
///
/// Returns the number of data rows written (header excluded). The CSV is
/// written to a sibling temp file first and renamed into place, so a failed
/// import leaves any existing data file untouched.
pub fn import_workbook(workbook_path: &Path, dest_csv: &Path) -> Result<usize> {
    let mut workbook = open_workbook_auto(workbook_path)
        .with_context(|| format!("opening workbook {}", workbook_path.display()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        bail!("workbook has no sheets");
    };
    let range = workbook
        .worksheet_range(first)
        .with_context(|| format!("reading sheet '{}'", first))?;

    let (row_count, col_count) = range.get_size();
    info!("sheet '{}': {} rows x {} columns", first, row_count, col_count);
    if row_count < 2 {
        bail!("sheet '{}' has no data rows", first);
    }

    let tmp_path = dest_csv.with_extension("csv.tmp");
    let mut wtr = csv::Writer::from_path(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    let mut rows = 0usize;
    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(cell_to_string).collect();
        wtr.write_record(&cells)?;
        rows += 1;
    }
    wtr.flush()?;
    drop(wtr);
    fs::rename(&tmp_path, dest_csv)
        .with_context(|| format!("replacing {}", dest_csv.display()))?;

    Ok(rows.saturating_sub(1))
}

/// Cell text in the shape the CSV loader expects. Excel datetimes are
/// rendered day-first so the timestamp parser accepts them.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%d/%m/%Y %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_check_trims_input_and_rejects_empty_secret() {
        assert!(verify_password("admin1234", "admin1234"));
        assert!(verify_password("  admin1234\n", "admin1234"));
        assert!(!verify_password("wrong", "admin1234"));
        assert!(!verify_password("", "admin1234"));
        // An empty configured secret never matches; it does not open the gate.
        assert!(!verify_password("", ""));
    }

    #[test]
    fn cells_render_as_loader_compatible_text() {
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("มาก".to_string())), "มาก");
        assert_eq!(cell_to_string(&Data::Float(4.0)), "4");
        assert_eq!(cell_to_string(&Data::Float(4.5)), "4.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Bool(true)), "true");
    }

    #[test]
    fn missing_workbook_is_an_error() {
        let err = import_workbook(
            Path::new("no_such_workbook.xlsx"),
            Path::new("unused.csv"),
        );
        assert!(err.is_err());
    }
}
