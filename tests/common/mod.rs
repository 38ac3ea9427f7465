//! Workbook fixtures shared by the integration tests.
#![allow(dead_code)]

use std::path::Path;

use rust_xlsxwriter::{Workbook, XlsxError};

pub const SITE: &str = "ID1A3";

pub const DICTIONARY: &[(&str, &str)] = &[
    ("key", "metakey"),
    ("description", "description"),
    ("placeholder", "placeholder"),
    ("type", "Data Type"),
    ("required", "required"),
    ("unit", "unit"),
    ("group", "group"),
    ("values", "values"),
];

pub const SCHEMA_HEADER: &[&str] = &[
    "metakey",
    "description",
    "placeholder",
    "Data Type",
    "required",
    "unit",
    "group",
    "values",
];

/// Site sheet: convention row, three fields, one keyless row.
pub fn write_site_workbook(path: &Path) -> Result<(), XlsxError> {
    write_workbook(path, DICTIONARY)
}

pub fn write_workbook(path: &Path, dictionary: &[(&str, &str)]) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(&format!("{SITE}_schema"))?;
    for (col, header) in SCHEMA_HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    // Convention row repeated under the header in the master workbook.
    sheet.write_string(1, 0, "metadata key")?;
    sheet.write_string(1, 1, "what the field means")?;

    sheet.write_string(2, 0, "sample_name")?;
    sheet.write_string(2, 1, "Name of sample")?;
    sheet.write_string(2, 2, "e.g. Si-01")?;
    sheet.write_string(2, 3, "str")?;
    sheet.write_string(2, 4, "yes")?;
    sheet.write_string(2, 6, "sample")?;

    sheet.write_string(3, 1, "stray note without a key")?;

    sheet.write_string(4, 0, "beam_color")?;
    sheet.write_string(4, 1, "Beam color")?;
    sheet.write_string(4, 3, "str")?;
    sheet.write_string(4, 7, "red")?;
    sheet.write_string(4, 9, "blue")?;

    sheet.write_string(5, 0, "energy")?;
    sheet.write_string(5, 1, "Beam energy")?;
    sheet.write_number(5, 2, 40.0)?;
    sheet.write_string(5, 3, "float")?;
    sheet.write_string(5, 5, "keV")?;

    let dicts = workbook.add_worksheet();
    dicts.set_name("schema_dicts")?;
    dicts.write_string(0, 0, "ServiceDict")?;
    dicts.write_string(0, 1, "ExcelDict")?;
    for (row, (canonical, column)) in dictionary.iter().enumerate() {
        dicts.write_string(row as u32 + 1, 0, *canonical)?;
        dicts.write_string(row as u32 + 1, 1, *column)?;
    }

    workbook.save(path)
}
