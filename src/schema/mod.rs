//! Schema generation: a site's `<SITE>_schema` sheet plus the shared
//! `schema_dicts` sheet become a JSON array of field descriptors.
//!
//! Pipeline: clean the sheet, build one record per row, attach value lists,
//! prune nulls. The workbook and dictionary are always passed in explicitly.

pub mod clean;
pub mod dictionary;
pub mod prune;
pub mod records;
pub mod values;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{Error, Result};
use crate::workbook::{Table, Workbook};

pub use clean::{clean_schema_sheet, CleanRow, CleanSheet};
pub use dictionary::{DictionaryMapping, DICTIONARY_SHEET, KEY_INDEX, VALUES_INDEX};
pub use prune::prune_nulls;
pub use records::{build_records, Record, SheetLayout, DESCRIPTOR_COLUMNS};
pub use values::{attach_value_lists, value_list};

pub fn schema_sheet_name(site: &str) -> String {
    format!("{site}_schema")
}

/// `<output>.json`, or `<SITE>.json` when no output base name is given.
pub fn output_path(output: Option<&str>, site: &str) -> PathBuf {
    let base = output.filter(|o| !o.trim().is_empty()).unwrap_or(site);
    PathBuf::from(format!("{base}.json"))
}

pub fn load_dictionary(workbook: &mut Workbook) -> Result<DictionaryMapping> {
    let table = workbook.sheet(DICTIONARY_SHEET)?;
    Ok(DictionaryMapping::from_table(&table))
}

/// Field descriptors for an already loaded schema sheet.
pub fn build_schema(table: &Table, dict: &DictionaryMapping) -> Result<Value> {
    let sheet = clean_schema_sheet(table, dict)?;
    let layout = SheetLayout::resolve(&sheet, dict)?;
    let mut records = build_records(&sheet, &layout);
    attach_value_lists(&mut records, &sheet, &layout)?;

    let schema = Value::Array(records.into_iter().map(Value::Object).collect());
    Ok(prune_nulls(&schema))
}

/// Flat `{ key: null }` template in row order; nulls are the payload here,
/// so nothing is pruned.
pub fn build_key_template(table: &Table, dict: &DictionaryMapping) -> Result<Value> {
    let sheet = clean_schema_sheet(table, dict)?;
    let template: Map<String, Value> = sheet
        .keys()
        .map(|key| (key.to_string(), Value::Null))
        .collect();
    Ok(Value::Object(template))
}

pub fn generate_schema(workbook: &mut Workbook, site: &str) -> Result<Value> {
    let table = workbook.sheet(&schema_sheet_name(site))?;
    let dict = load_dictionary(workbook)?;
    let schema = build_schema(&table, &dict)?;
    info!(
        site,
        fields = schema.as_array().map(Vec::len).unwrap_or(0),
        "schema generated"
    );
    Ok(schema)
}

pub fn generate_key_template(workbook: &mut Workbook, site: &str) -> Result<Value> {
    let table = workbook.sheet(&schema_sheet_name(site))?;
    let dict = load_dictionary(workbook)?;
    build_key_template(&table, &dict)
}

/// Pretty JSON with four-space indentation; non-ASCII is written as-is.
pub fn render_json(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|err| Error::invalid(format!("non UTF-8 JSON output: {err}")))
}

/// Write the rendered document and hand it back for echoing.
pub fn write_json(path: &Path, value: &Value) -> Result<String> {
    let rendered = render_json(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }
    fs::write(path, &rendered).map_err(|err| Error::io(path, err))?;
    info!(path = %path.display(), bytes = rendered.len(), "schema written");
    Ok(rendered)
}
