//! Workbook access: spreadsheet files via calamine, or a directory of CSV
//! exports where sheet `NAME` lives in `NAME.csv`.

mod table;

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{Reader, Sheets};
use tracing::debug;

use crate::error::{Error, Result};

pub use table::{data_cell, text_cell, Cell, Table};

pub enum Workbook {
    Spreadsheet {
        path: PathBuf,
        sheets: Sheets<BufReader<File>>,
    },
    CsvDir {
        dir: PathBuf,
    },
}

impl Workbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::invalid(format!(
                "workbook not found: {}",
                path.display()
            )));
        }
        if path.is_dir() {
            debug!(dir = %path.display(), "opening CSV workbook");
            return Ok(Self::CsvDir {
                dir: path.to_path_buf(),
            });
        }
        debug!(path = %path.display(), "opening spreadsheet workbook");
        let sheets = calamine::open_workbook_auto(path)
            .map_err(|err| Error::Workbook(format!("{}: {err}", path.display())))?;
        Ok(Self::Spreadsheet {
            path: path.to_path_buf(),
            sheets,
        })
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Spreadsheet { path, .. } => path,
            Self::CsvDir { dir } => dir,
        }
    }

    pub fn sheet_names(&self) -> Result<Vec<String>> {
        match self {
            Self::Spreadsheet { sheets, .. } => Ok(sheets.sheet_names()),
            Self::CsvDir { dir } => {
                let entries = fs::read_dir(dir).map_err(|err| Error::io(dir, err))?;
                let mut names = Vec::new();
                for entry in entries {
                    let entry = entry.map_err(|err| Error::io(dir, err))?;
                    let path = entry.path();
                    let is_csv = path
                        .extension()
                        .map(|ext| ext.eq_ignore_ascii_case("csv"))
                        .unwrap_or(false);
                    if let (true, Some(stem)) = (is_csv, path.file_stem().and_then(|s| s.to_str()))
                    {
                        names.push(stem.to_string());
                    }
                }
                names.sort();
                Ok(names)
            }
        }
    }

    /// Read a whole sheet. Fails with [`Error::MissingSheet`] when the
    /// workbook has no sheet of that name.
    pub fn sheet(&mut self, name: &str) -> Result<Table> {
        let available = self.sheet_names()?;
        if !available.iter().any(|s| s == name) {
            return Err(Error::MissingSheet {
                sheet: name.to_string(),
                available,
            });
        }

        let (raw, header_row) = match self {
            Self::Spreadsheet { path, sheets } => {
                let range = sheets
                    .worksheet_range(name)
                    .map_err(|err| Error::Workbook(format!("{}[{name}]: {err}", path.display())))?;
                // calamine ranges begin at the first used cell; keep sheet
                // column positions by padding the skipped leading columns.
                // Leading blank rows move the header down the sheet.
                let (top, lead) = range
                    .start()
                    .map(|(row, col)| (row as usize, col as usize))
                    .unwrap_or((0, 0));
                let raw = range
                    .rows()
                    .map(|row| {
                        let mut cells: Vec<Cell> = vec![None; lead];
                        cells.extend(row.iter().map(data_cell));
                        cells
                    })
                    .collect();
                (raw, top + 1)
            }
            Self::CsvDir { dir } => (read_csv_sheet(&dir.join(format!("{name}.csv")))?, 1),
        };

        let table = Table::from_raw_rows_at(raw, header_row);
        debug!(
            sheet = name,
            header_row,
            rows = table.rows().len(),
            cols = table.width(),
            "sheet loaded"
        );
        Ok(table)
    }
}

fn read_csv_sheet(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|err| Error::Workbook(format!("{}: {err}", path.display())))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| Error::Workbook(format!("{}: {err}", path.display())))?;
        rows.push(record.iter().map(text_cell).collect());
    }
    Ok(rows)
}
