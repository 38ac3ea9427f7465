//! Relational side-table: experiments, processing, tiers, datasets, files.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::catalog::dataset::DatasetPath;
use crate::error::{Error, Result};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS experiments (
    experiment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS processing (
    processing_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS tiers (
    tier_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS datasets (
    dataset_id INTEGER PRIMARY KEY AUTOINCREMENT,
    experiment_id INTEGER NOT NULL REFERENCES experiments(experiment_id),
    processing_id INTEGER NOT NULL REFERENCES processing(processing_id),
    tier_id INTEGER NOT NULL REFERENCES tiers(tier_id),
    tstamp INTEGER NOT NULL,
    UNIQUE (experiment_id, processing_id, tier_id)
);
CREATE TABLE IF NOT EXISTS files (
    file_id INTEGER PRIMARY KEY AUTOINCREMENT,
    dataset_id INTEGER NOT NULL REFERENCES datasets(dataset_id),
    name TEXT NOT NULL,
    UNIQUE (dataset_id, name)
);
";

/// Lookup tables keyed by name. Table and column names are fixed strings,
/// never user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Experiment,
    Processing,
    Tier,
}

impl Lookup {
    fn table(self) -> &'static str {
        match self {
            Self::Experiment => "experiments",
            Self::Processing => "processing",
            Self::Tier => "tiers",
        }
    }

    fn id_column(self) -> &'static str {
        match self {
            Self::Experiment => "experiment_id",
            Self::Processing => "processing_id",
            Self::Tier => "tier_id",
        }
    }
}

pub struct FilesDb {
    conn: Connection,
}

impl FilesDb {
    /// Open (creating if needed) the catalog database and its tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|err| {
            Error::StoreUnavailable(format!("files database '{}': {err}", path.display()))
        })?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|err| Error::StoreUnavailable(format!("in-memory files database: {err}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Register a dataset and its files in one transaction. Existing lookup
    /// and dataset rows are reused; already known files are skipped.
    pub fn insert_dataset(&mut self, dataset: &DatasetPath, files: &[String]) -> Result<i64> {
        let tx = self.conn.transaction()?;

        let eid = get_or_insert(&tx, Lookup::Experiment, &dataset.experiment)?;
        let pid = get_or_insert(&tx, Lookup::Processing, &dataset.processing)?;
        let tid = get_or_insert(&tx, Lookup::Tier, &dataset.tier)?;

        let did = match find_dataset(&tx, eid, pid, tid)? {
            Some(did) => did,
            None => {
                let tstamp = chrono::Utc::now().timestamp();
                tx.execute(
                    "INSERT INTO datasets (experiment_id, processing_id, tier_id, tstamp) VALUES (?1, ?2, ?3, ?4)",
                    params![eid, pid, tid, tstamp],
                )?;
                tx.last_insert_rowid()
            }
        };
        debug!(eid, pid, tid, did, dataset = %dataset, "dataset ids resolved");

        let mut inserted = 0usize;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO files (dataset_id, name) VALUES (?1, ?2)")?;
            for name in files {
                inserted += stmt.execute(params![did, name])?;
            }
        }
        tx.commit()?;

        info!(dataset = %dataset, did, files = inserted, "dataset registered");
        Ok(did)
    }

    pub fn dataset_id(&self, dataset: &DatasetPath) -> Result<Option<i64>> {
        let did = self
            .conn
            .query_row(
                "SELECT d.dataset_id FROM datasets d \
                 JOIN experiments e ON d.experiment_id = e.experiment_id \
                 JOIN processing p ON d.processing_id = p.processing_id \
                 JOIN tiers t ON d.tier_id = t.tier_id \
                 WHERE e.name = ?1 AND p.name = ?2 AND t.name = ?3",
                params![dataset.experiment, dataset.processing, dataset.tier],
                |row| row.get(0),
            )
            .optional()?;
        Ok(did)
    }

    /// Files registered for `dataset` in insertion order; `None` when the
    /// dataset is unknown.
    pub fn find_files(&self, dataset: &DatasetPath) -> Result<Option<Vec<String>>> {
        let Some(did) = self.dataset_id(dataset)? else {
            debug!(dataset = %dataset, "dataset not in files database");
            return Ok(None);
        };
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM files WHERE dataset_id = ?1 ORDER BY file_id")?;
        let names = stmt
            .query_map(params![did], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(names))
    }

    /// Row count of one of the catalog tables.
    pub fn count(&self, table: &str) -> Result<i64> {
        if !["experiments", "processing", "tiers", "datasets", "files"].contains(&table) {
            return Err(Error::invalid(format!("unknown catalog table '{table}'")));
        }
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }
}

fn get_or_insert(tx: &Transaction<'_>, lookup: Lookup, name: &str) -> Result<i64> {
    let select = format!(
        "SELECT {} FROM {} WHERE name = ?1",
        lookup.id_column(),
        lookup.table()
    );
    debug!(sql = %select, name, "lookup");
    if let Some(id) = tx
        .query_row(&select, params![name], |row| row.get(0))
        .optional()?
    {
        return Ok(id);
    }
    tx.execute(
        &format!("INSERT INTO {} (name) VALUES (?1)", lookup.table()),
        params![name],
    )?;
    Ok(tx.last_insert_rowid())
}

fn find_dataset(tx: &Transaction<'_>, eid: i64, pid: i64, tid: i64) -> Result<Option<i64>> {
    let did = tx
        .query_row(
            "SELECT dataset_id FROM datasets WHERE experiment_id = ?1 AND processing_id = ?2 AND tier_id = ?3",
            params![eid, pid, tid],
            |row| row.get(0),
        )
        .optional()?;
    Ok(did)
}

/// Regular files (or links to them) under `dir`, recursively, sorted by path.
pub fn list_files(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::invalid(format!(
            "dataset directory not found: {}",
            dir.display()
        )));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            Error::io(path, err.into())
        })?;
        // Symlinked files count; symlinked directories are not descended.
        if entry.path().is_file() {
            files.push(entry.path().to_string_lossy().into_owned());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn dataset() -> DatasetPath {
        "/exp1/reduced/raw".parse().expect("dataset")
    }

    #[test]
    fn repeated_insert_reuses_lookup_rows() {
        let mut db = FilesDb::open_in_memory().expect("db");
        let files = vec!["/data/a.h5".to_string(), "/data/b.h5".to_string()];
        let first = db.insert_dataset(&dataset(), &files).expect("first insert");
        let second = db.insert_dataset(&dataset(), &files).expect("second insert");
        assert_eq!(first, second);
        for table in ["experiments", "processing", "tiers", "datasets"] {
            assert_eq!(db.count(table).expect("count"), 1, "{table}");
        }
        assert_eq!(db.count("files").expect("count"), 2);
    }

    #[test]
    fn shared_lookups_across_datasets() {
        let mut db = FilesDb::open_in_memory().expect("db");
        let other: DatasetPath = "/exp1/reduced/derived".parse().expect("dataset");
        let a = db.insert_dataset(&dataset(), &[]).expect("insert");
        let b = db.insert_dataset(&other, &["/x".to_string()]).expect("insert");
        assert_ne!(a, b);
        assert_eq!(db.count("experiments").expect("count"), 1);
        assert_eq!(db.count("tiers").expect("count"), 2);
        assert_eq!(db.find_files(&dataset()).expect("files"), Some(Vec::new()));
        assert_eq!(db.find_files(&other).expect("files"), Some(vec!["/x".to_string()]));
    }

    #[test]
    fn failed_file_insert_rolls_back_lookup_rows() {
        let mut db = FilesDb::open_in_memory().expect("db");
        db.conn
            .execute_batch(
                "CREATE TRIGGER reject_files BEFORE INSERT ON files \
                 BEGIN SELECT RAISE(ABORT, 'files table is read-only'); END;",
            )
            .expect("trigger");

        let err = db
            .insert_dataset(&dataset(), &["/data/a.h5".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("read-only"), "{err}");
        for table in ["experiments", "processing", "tiers", "datasets", "files"] {
            assert_eq!(db.count(table).expect("count"), 0, "{table}");
        }
        assert_eq!(db.find_files(&dataset()).expect("query"), None);
    }

    #[test]
    fn unknown_dataset_has_no_files() {
        let db = FilesDb::open_in_memory().expect("db");
        assert_eq!(db.find_files(&dataset()).expect("query"), None);
        assert!(db.count("sqlite_master; DROP TABLE files").is_err());
    }

    #[test]
    fn list_files_walks_recursively_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("scan2")).expect("mkdir");
        fs::write(dir.path().join("b.tiff"), b"b").expect("write");
        fs::write(dir.path().join("a.tiff"), b"a").expect("write");
        fs::write(dir.path().join("scan2").join("c.tiff"), b"c").expect("write");

        let files = list_files(dir.path()).expect("list");
        let names: Vec<String> = files
            .iter()
            .map(|f| {
                Path::new(f)
                    .strip_prefix(dir.path())
                    .expect("under dir")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(names, vec!["a.tiff", "b.tiff", "scan2/c.tiff"]);

        assert!(list_files(dir.path().join("missing")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn list_files_includes_symlinked_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outside = tempfile::tempdir().expect("tempdir");
        let target = outside.path().join("frame.tiff");
        fs::write(&target, b"f").expect("write");
        std::os::unix::fs::symlink(&target, dir.path().join("linked.tiff")).expect("symlink");
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked_dir")).expect("symlink");
        fs::write(dir.path().join("local.tiff"), b"l").expect("write");

        let files = list_files(dir.path()).expect("list");
        let names: Vec<&str> = files
            .iter()
            .filter_map(|f| Path::new(f).file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["linked.tiff", "local.tiff"]);
    }
}
