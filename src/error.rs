use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("sheet '{sheet}' not found in workbook (available: {})", available.join(", "))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },

    /// The dictionary sheet has no usable row at a canonical position.
    #[error("dictionary mapping missing at row {index} (mapping sheet has {available} row(s))")]
    MissingMapping { index: usize, available: usize },

    /// `row` is the 1-based row number as shown by a spreadsheet application.
    #[error("malformed schema row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("failed to read workbook: {0}")]
    Workbook(String),

    #[error("failed to read document: {0}")]
    Document(String),

    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Sql(#[from] rusqlite::Error),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
