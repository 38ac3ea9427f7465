//! Enumerated permitted values, joined onto records by key.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::clean::CleanSheet;
use crate::schema::records::{Record, SheetLayout};
use crate::workbook::Cell;

/// `None` unless the flag cell (first cell of the values region) is filled.
/// The list always starts with the empty "no selection" entry.
pub fn value_list(cells: &[Cell], values_column: usize) -> Option<Vec<String>> {
    cells.get(values_column)?.as_ref()?;
    let mut values = vec![String::new()];
    values.extend(cells[values_column..].iter().flatten().cloned());
    Some(values)
}

/// Attach `values` (or an explicit null) to every record, matching each
/// record to its sheet row by key rather than by position.
pub fn attach_value_lists(
    records: &mut [Record],
    sheet: &CleanSheet,
    layout: &SheetLayout,
) -> Result<()> {
    let lists: HashMap<&str, Option<Vec<String>>> = sheet
        .rows
        .iter()
        .map(|row| (row.key.as_str(), value_list(&row.cells, layout.values_column)))
        .collect();

    for (position, record) in records.iter_mut().enumerate() {
        let key = record
            .get(&layout.key_field)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| Error::MalformedRow {
                row: sheet.rows.get(position).map(|row| row.row).unwrap_or(0),
                reason: "record has no key".to_string(),
            })?;
        let list = lists.get(key.as_str()).ok_or_else(|| Error::MalformedRow {
            row: sheet.rows.get(position).map(|row| row.row).unwrap_or(0),
            reason: format!("no schema row for key '{key}'"),
        })?;
        let value = match list {
            Some(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
            None => Value::Null,
        };
        record.insert(layout.values_field.clone(), value);
    }
    Ok(())
}
