use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::dictionary::{DictionaryMapping, KEY_INDEX};
use crate::workbook::{Cell, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRow {
    /// 1-based row number in the source sheet.
    pub row: usize,
    pub key: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanSheet {
    /// Sheet headers with the key column renamed to its canonical name.
    pub headers: Vec<String>,
    pub key_column: usize,
    pub rows: Vec<CleanRow>,
}

impl CleanSheet {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.key.as_str())
    }
}

/// Drop keyless rows, then the single convention row that follows the
/// header in every site sheet. Surviving rows keep sheet order.
pub fn clean_schema_sheet(table: &Table, dict: &DictionaryMapping) -> Result<CleanSheet> {
    let key = dict.entry(KEY_INDEX)?;
    let key_column = table.column_index(key.column).ok_or_else(|| {
        Error::invalid(format!(
            "key column '{}' not found in schema sheet (columns: {})",
            key.column,
            table.headers().join(", ")
        ))
    })?;

    let mut headers = table.headers().to_vec();
    headers[key_column] = key.canonical.to_string();

    let keyed: Vec<CleanRow> = table
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(i, cells)| {
            let key = cells.get(key_column).cloned().flatten()?;
            Some(CleanRow {
                row: table.sheet_row(i),
                key,
                cells: cells.clone(),
            })
        })
        .collect();
    let dropped = table.rows().len() - keyed.len();

    let rows: Vec<CleanRow> = keyed.into_iter().skip(1).collect();

    let mut seen = HashSet::new();
    for row in &rows {
        if !seen.insert(row.key.as_str()) {
            return Err(Error::MalformedRow {
                row: row.row,
                reason: format!("duplicate key '{}'", row.key),
            });
        }
    }

    debug!(
        kept = rows.len(),
        keyless = dropped,
        "schema sheet cleaned"
    );
    Ok(CleanSheet {
        headers,
        key_column,
        rows,
    })
}
