//! Free-text metadata store. MongoDB in production, SQLite FTS5 for local
//! catalogs and tests; both answer the same `$text`-style searches.

mod mongo;
mod sqlite;

use serde::{Deserialize, Serialize};

use crate::config::{CatalogParams, DEFAULT_COLLECTION};
use crate::error::{Error, Result};

pub use mongo::MongoMetaStore;
pub use sqlite::{fts_query, SqliteMetaStore};

/// One stored metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRecord {
    pub meta: String,
    pub dataset: String,
    pub did: i64,
}

pub trait MetaStore {
    /// Store a record, returning the backend's identifier for it.
    fn insert(&mut self, record: &MetaRecord) -> Result<String>;

    /// Records matching a free-text query, best match first.
    fn search(&mut self, query: &str) -> Result<Vec<MetaRecord>>;
}

/// Pick the backend from `dburi`: `mongodb://`/`mongodb+srv://` or `sqlite://PATH`.
pub fn open_meta_store(params: &CatalogParams) -> Result<Box<dyn MetaStore>> {
    let uri = params.get("dburi")?;
    if uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://") {
        params.require(&["dbname", "dbcoll"])?;
        let store = MongoMetaStore::connect(uri, params.get("dbname")?, params.get("dbcoll")?)?;
        return Ok(Box::new(store));
    }
    if let Some(path) = uri.strip_prefix("sqlite://") {
        let collection = params.dbcoll.as_deref().unwrap_or(DEFAULT_COLLECTION);
        let store = SqliteMetaStore::open(path, collection)?;
        return Ok(Box::new(store));
    }
    Err(Error::invalid(format!(
        "unsupported dburi '{uri}', expected mongodb://... or sqlite://PATH"
    )))
}

pub(crate) fn ensure_query(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::invalid("empty query"));
    }
    Ok(query)
}
