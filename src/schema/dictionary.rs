//! Site column headers ↔ canonical attribute names, from the `schema_dicts` sheet.

use crate::error::{Error, Result};
use crate::workbook::Table;

pub const DICTIONARY_SHEET: &str = "schema_dicts";

/// Row of the dictionary sheet naming the key column.
pub const KEY_INDEX: usize = 0;
/// Row of the dictionary sheet naming the first enumerated-values column.
pub const VALUES_INDEX: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
struct MappingRow {
    canonical: Option<String>,
    column: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry<'a> {
    pub canonical: &'a str,
    pub column: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryMapping {
    rows: Vec<MappingRow>,
}

impl DictionaryMapping {
    /// Column 0 holds the canonical name, column 1 the site's header; the
    /// sheet's own header row is already stripped by [`Table`].
    pub fn from_table(table: &Table) -> Self {
        let rows = table
            .rows()
            .iter()
            .map(|row| MappingRow {
                canonical: row.first().cloned().flatten(),
                column: row.get(1).cloned().flatten(),
            })
            .collect();
        Self { rows }
    }

    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let rows = pairs
            .into_iter()
            .map(|(canonical, column)| MappingRow {
                canonical: Some(canonical.into()),
                column: Some(column.into()),
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn entry(&self, index: usize) -> Result<MappingEntry<'_>> {
        let missing = || Error::MissingMapping {
            index,
            available: self.rows.len(),
        };
        let row = self.rows.get(index).ok_or_else(missing)?;
        match (row.canonical.as_deref(), row.column.as_deref()) {
            (Some(canonical), Some(column)) => Ok(MappingEntry { canonical, column }),
            _ => Err(missing()),
        }
    }

    /// Canonical name for a site header, if the dictionary mentions it.
    pub fn canonical_for(&self, header: &str) -> Option<&str> {
        self.rows.iter().find_map(|row| match (&row.canonical, &row.column) {
            (Some(canonical), Some(column)) if column == header => Some(canonical.as_str()),
            _ => None,
        })
    }
}
