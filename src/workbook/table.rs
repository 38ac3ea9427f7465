//! Header-plus-rows view of one sheet, with every cell reduced to trimmed text.

use calamine::Data;
use tracing::warn;

pub type Cell = Option<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    header_row: usize,
}

impl Table {
    /// The first raw row becomes the header row. Rows are padded to the widest
    /// row and trailing blank rows are dropped.
    pub fn from_raw_rows(raw: Vec<Vec<Cell>>) -> Self {
        Self::from_raw_rows_at(raw, 1)
    }

    /// Like [`Table::from_raw_rows`] for a sheet whose header sits on
    /// 1-based sheet row `header_row`.
    pub fn from_raw_rows_at(raw: Vec<Vec<Cell>>, header_row: usize) -> Self {
        let width = raw.iter().map(Vec::len).max().unwrap_or(0);
        let mut iter = raw.into_iter();
        let header_cells = iter.next().unwrap_or_default();

        let headers = (0..width)
            .map(|j| {
                header_cells
                    .get(j)
                    .cloned()
                    .flatten()
                    .unwrap_or_else(|| format!("col_{j}"))
            })
            .collect();

        let mut rows: Vec<Vec<Cell>> = iter
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        while rows
            .last()
            .map(|row| row.iter().all(Option::is_none))
            .unwrap_or(false)
        {
            rows.pop();
        }

        Self {
            headers,
            rows,
            header_row: header_row.max(1),
        }
    }

    /// 1-based sheet row of the header.
    pub fn header_row(&self) -> usize {
        self.header_row
    }

    /// 1-based sheet row of data row `index`.
    pub fn sheet_row(&self, index: usize) -> usize {
        self.header_row + 1 + index
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// Blank or whitespace-only text counts as an empty cell.
pub fn text_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn data_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => None,
        Data::String(s) => text_cell(s),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_float(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::Error(err) => {
            warn!(error = ?err, "spreadsheet error cell treated as empty");
            None
        }
        other => text_cell(&other.to_string()),
    }
}

/// Whole numbers stored as floats render without a fractional part.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
