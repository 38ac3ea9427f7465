//! Intermediate field records: one JSON object per cleaned row, nulls kept.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::schema::clean::CleanSheet;
use crate::schema::dictionary::{DictionaryMapping, VALUES_INDEX};

/// Only the leading columns of a schema sheet describe a field; the rest
/// are reserved for enumerated values.
pub const DESCRIPTOR_COLUMNS: usize = 8;

pub type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    /// Output name of the key attribute.
    pub key_field: String,
    /// (sheet column, output attribute name), key and values columns excluded.
    pub attributes: Vec<(usize, String)>,
    /// First column of the values region; a filled cell here flags the row
    /// as enumerated.
    pub values_column: usize,
    pub values_field: String,
}

impl SheetLayout {
    pub fn resolve(sheet: &CleanSheet, dict: &DictionaryMapping) -> Result<Self> {
        let values = dict.entry(VALUES_INDEX)?;
        let values_column = sheet
            .headers
            .iter()
            .position(|h| h == values.column)
            .ok_or_else(|| {
                Error::invalid(format!(
                    "values column '{}' not found in schema sheet (columns: {})",
                    values.column,
                    sheet.headers.join(", ")
                ))
            })?;
        let key_field = sheet.headers[sheet.key_column].clone();

        let mut attributes: Vec<(usize, String)> = Vec::new();
        for (j, header) in sheet
            .headers
            .iter()
            .enumerate()
            .take(DESCRIPTOR_COLUMNS)
        {
            if j == sheet.key_column || j == values_column {
                continue;
            }
            let name = dict.canonical_for(header).unwrap_or(header);
            if name == key_field || attributes.iter().any(|(_, n)| n == name) {
                continue;
            }
            attributes.push((j, name.to_string()));
        }

        Ok(Self {
            key_field,
            attributes,
            values_column,
            values_field: values.canonical.to_string(),
        })
    }
}

/// Every present cell is emitted as a string; empty cells become `null`
/// for the pruner to remove.
pub fn build_records(sheet: &CleanSheet, layout: &SheetLayout) -> Vec<Record> {
    sheet
        .rows
        .iter()
        .map(|row| {
            let mut record = Record::new();
            record.insert(layout.key_field.clone(), Value::String(row.key.clone()));
            for (column, name) in &layout.attributes {
                let value = row
                    .cells
                    .get(*column)
                    .cloned()
                    .flatten()
                    .map(Value::String)
                    .unwrap_or(Value::Null);
                record.insert(name.clone(), value);
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::clean::clean_schema_sheet;
    use crate::workbook::{text_cell, Table};

    fn dict() -> DictionaryMapping {
        DictionaryMapping::from_pairs([
            ("key", "metakey"),
            ("description", "Description"),
            ("placeholder", "Placeholder"),
            ("type", "type"),
            ("required", "required"),
            ("unit", "unit"),
            ("group", "group"),
            ("values", "values"),
        ])
    }

    #[test]
    fn renames_site_headers_and_keeps_nulls() {
        let raw = [
            ["metakey", "Description", "Placeholder", "type", "note", "unit", "group", "values", "", "tail"],
            ["conv", "", "", "", "", "", "", "", "", ""],
            ["energy", "Beam energy", "", "float", "", "keV", "", "", "", "ignored"],
        ];
        let table = Table::from_raw_rows(
            raw.iter()
                .map(|row| row.iter().map(|v| text_cell(v)).collect())
                .collect(),
        );
        let sheet = clean_schema_sheet(&table, &dict()).expect("clean");
        let layout = SheetLayout::resolve(&sheet, &dict()).expect("layout");
        assert_eq!(layout.values_column, 7);
        let names: Vec<&str> = layout.attributes.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(
            names,
            ["description", "placeholder", "type", "note", "unit", "group"]
        );

        let records = build_records(&sheet, &layout);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.keys().next().map(String::as_str), Some("key"));
        assert_eq!(record["description"], Value::String("Beam energy".into()));
        assert_eq!(record["placeholder"], Value::Null);
        assert!(!record.contains_key("tail"));
    }

    #[test]
    fn missing_values_mapping_is_reported() {
        let short = DictionaryMapping::from_pairs([("key", "metakey")]);
        let table = Table::from_raw_rows(vec![vec![text_cell("metakey")], vec![text_cell("a")]]);
        let sheet = clean_schema_sheet(&table, &short).expect("clean");
        let err = SheetLayout::resolve(&sheet, &short).unwrap_err();
        assert!(matches!(err, Error::MissingMapping { index: 7, available: 1 }));
    }
}
