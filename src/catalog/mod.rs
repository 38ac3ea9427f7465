//! Metadata catalog: free-text documents in a [`MetaStore`] plus the files
//! of each `/experiment/processing/tier` dataset in a [`FilesDb`].

pub mod dataset;
pub mod document;
pub mod filesdb;
pub mod store;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::CatalogParams;
use crate::error::Result;

pub use dataset::DatasetPath;
pub use document::read_document_text;
pub use filesdb::{list_files, FilesDb};
pub use store::{open_meta_store, MetaRecord, MetaStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub dataset: String,
    pub did: i64,
    pub file_count: usize,
    pub meta_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub meta: String,
    pub dataset: String,
    pub did: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
}

const INGEST_KEYS: &[&str] = &[
    "fname",
    "path",
    "dburi",
    "filesdb",
    "experiment",
    "processing",
    "tier",
];

/// Create the files database tables.
pub fn init_db(params: &CatalogParams) -> Result<FilesDb> {
    params.require(&["filesdb"])?;
    FilesDb::open(params.get("filesdb")?)
}

/// Store a document's text and catalog the files of its dataset. Returns
/// `None`, touching neither database, when the document has no text.
pub fn ingest(params: &CatalogParams) -> Result<Option<IngestReport>> {
    params.require(INGEST_KEYS)?;
    let fname = params.get("fname")?;
    let dataset = DatasetPath::new(
        params.get("experiment")?,
        params.get("processing")?,
        params.get("tier")?,
    )?;

    let text = read_document_text(fname)?;
    if text.trim().is_empty() {
        warn!(fname, "document has no text, nothing inserted");
        return Ok(None);
    }
    let files = list_files(params.get("path")?)?;
    let mut store = open_meta_store(params)?;
    let mut filesdb = FilesDb::open(params.get("filesdb")?)?;

    ingest_into(store.as_mut(), &mut filesdb, &dataset, text, &files).map(Some)
}

/// Files first, so the metadata record can carry the dataset id.
pub fn ingest_into(
    store: &mut dyn MetaStore,
    filesdb: &mut FilesDb,
    dataset: &DatasetPath,
    text: String,
    files: &[String],
) -> Result<IngestReport> {
    let did = filesdb.insert_dataset(dataset, files)?;
    let record = MetaRecord {
        meta: text,
        dataset: dataset.to_string(),
        did,
    };
    let meta_id = store.insert(&record)?;
    info!(dataset = %dataset, did, meta_id = %meta_id, "metadata ingested");
    Ok(IngestReport {
        dataset: record.dataset,
        did,
        file_count: files.len(),
        meta_id,
    })
}

pub fn find(params: &CatalogParams, query: &str, with_files: bool) -> Result<Vec<SearchHit>> {
    params.require(&["dburi"])?;
    if with_files {
        params.require(&["filesdb"])?;
    }
    let mut store = open_meta_store(params)?;
    let filesdb = if with_files {
        Some(FilesDb::open(params.get("filesdb")?)?)
    } else {
        None
    };
    find_in(store.as_mut(), filesdb.as_ref(), query)
}

/// Search `store`; when `filesdb` is given, resolve each hit's files.
pub fn find_in(
    store: &mut dyn MetaStore,
    filesdb: Option<&FilesDb>,
    query: &str,
) -> Result<Vec<SearchHit>> {
    let records = store.search(query)?;
    info!(query, hits = records.len(), "metadata search done");

    let mut hits = Vec::with_capacity(records.len());
    for record in records {
        let files = match filesdb {
            Some(db) => Some(files_for(db, &record.dataset)?),
            None => None,
        };
        hits.push(SearchHit {
            meta: record.meta,
            dataset: record.dataset,
            did: record.did,
            files,
        });
    }
    Ok(hits)
}

/// Files of one dataset; an unknown dataset yields an empty list.
pub fn dataset_files(params: &CatalogParams, dataset: &str) -> Result<Vec<String>> {
    params.require(&["filesdb"])?;
    let filesdb = FilesDb::open(params.get("filesdb")?)?;
    files_for(&filesdb, dataset)
}

fn files_for(filesdb: &FilesDb, dataset: &str) -> Result<Vec<String>> {
    let path: DatasetPath = dataset.parse()?;
    match filesdb.find_files(&path)? {
        Some(files) => Ok(files),
        None => {
            warn!(dataset, "dataset has no catalog entry");
            Ok(Vec::new())
        }
    }
}
