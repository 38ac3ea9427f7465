use std::path::Path;

use rusqlite::{params, Connection};
use tracing::debug;

use super::{ensure_query, MetaRecord, MetaStore};
use crate::error::{Error, Result};

/// FTS5 adds hidden columns named after the table and `rank`; a table name
/// equal to any of these fails to build.
const RESERVED_NAMES: &[&str] = &["meta", "dataset", "did", "rank"];

pub struct SqliteMetaStore {
    conn: Connection,
    table: String,
}

impl SqliteMetaStore {
    pub fn open(path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|err| {
            Error::StoreUnavailable(format!("metadata database '{}': {err}", path.display()))
        })?;
        Self::with_connection(conn, collection)
    }

    pub fn open_in_memory(collection: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|err| Error::StoreUnavailable(format!("in-memory metadata database: {err}")))?;
        Self::with_connection(conn, collection)
    }

    fn with_connection(conn: Connection, collection: &str) -> Result<Self> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(Error::invalid(format!(
                "collection name '{collection}' must be alphanumeric or '_'"
            )));
        }
        if RESERVED_NAMES
            .iter()
            .any(|name| name.eq_ignore_ascii_case(collection))
        {
            return Err(Error::invalid(format!(
                "collection name '{collection}' clashes with a metadata column, pick another"
            )));
        }
        conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {collection} USING fts5(meta, dataset UNINDEXED, did UNINDEXED);"
        ))?;
        Ok(Self {
            conn,
            table: collection.to_string(),
        })
    }
}

impl MetaStore for SqliteMetaStore {
    fn insert(&mut self, record: &MetaRecord) -> Result<String> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (meta, dataset, did) VALUES (?1, ?2, ?3)",
                self.table
            ),
            params![record.meta, record.dataset, record.did],
        )?;
        Ok(self.conn.last_insert_rowid().to_string())
    }

    fn search(&mut self, query: &str) -> Result<Vec<MetaRecord>> {
        let expression = fts_query(query)?;
        debug!(query, fts = %expression, "metadata search");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT meta, dataset, CAST(did AS INTEGER) FROM {table} WHERE {table} MATCH ?1 ORDER BY rank",
            table = self.table
        ))?;
        let records = stmt
            .query_map(params![expression], |row| {
                Ok(MetaRecord {
                    meta: row.get(0)?,
                    dataset: row.get(1)?,
                    did: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

#[derive(Debug, Default)]
struct Terms {
    words: Vec<String>,
    phrases: Vec<String>,
    excluded: Vec<String>,
}

fn split_terms(query: &str) -> Terms {
    let mut terms = Terms::default();
    let mut chars = query.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let phrase: String = chars.by_ref().take_while(|&c| c != '"').collect();
            if !phrase.trim().is_empty() {
                terms.phrases.push(phrase.trim().to_string());
            }
            continue;
        }
        let word: String = chars
            .by_ref()
            .take_while(|c| !c.is_whitespace())
            .collect();
        match word.strip_prefix('-') {
            Some(rest) if !rest.is_empty() => terms.excluded.push(rest.to_string()),
            Some(_) => {}
            None => terms.words.push(word),
        }
    }
    terms
}

fn quote(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}

/// Translate a `$text`-style search string into an FTS5 MATCH expression:
/// words are OR-ed, quoted phrases are required (and then words only rank),
/// `-word` excludes.
pub fn fts_query(query: &str) -> Result<String> {
    let terms = split_terms(ensure_query(query)?);
    let positive = if terms.phrases.is_empty() {
        terms.words.iter().map(|w| quote(w)).collect::<Vec<_>>().join(" OR ")
    } else {
        terms.phrases.iter().map(|p| quote(p)).collect::<Vec<_>>().join(" AND ")
    };
    if positive.is_empty() {
        return Err(Error::invalid(format!(
            "query '{query}' has no search terms"
        )));
    }
    let mut expression = format!("({positive})");
    for word in &terms.excluded {
        expression.push_str(" NOT ");
        expression.push_str(&quote(word));
    }
    Ok(expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(meta: &str, did: i64) -> MetaRecord {
        MetaRecord {
            meta: meta.to_string(),
            dataset: format!("/exp{did}/proc/raw"),
            did,
        }
    }

    #[test]
    fn builds_text_search_expressions() {
        assert_eq!(fts_query("silicon wafer").unwrap(), r#"("silicon" OR "wafer")"#);
        assert_eq!(
            fts_query(r#"powder "beam energy" -calibration"#).unwrap(),
            r#"("beam energy") NOT "calibration""#
        );
        assert_eq!(fts_query(r#"say"hi"#).unwrap(), r#"("say""hi")"#);
        assert!(fts_query("   ").is_err());
        assert!(fts_query("-only").is_err());
    }

    #[test]
    fn search_matches_words_and_honours_exclusions() {
        let mut store = SqliteMetaStore::open_in_memory("chess").expect("store");
        store.insert(&record("Silicon wafer scanned at 40 keV", 1)).expect("insert");
        store.insert(&record("Powder diffraction of quartz", 2)).expect("insert");
        store.insert(&record("Silicon calibration run", 3)).expect("insert");

        let hits = store.search("silicon").expect("search");
        let mut dids: Vec<i64> = hits.iter().map(|r| r.did).collect();
        dids.sort();
        assert_eq!(dids, vec![1, 3]);

        let hits = store.search("silicon -calibration").expect("search");
        assert_eq!(hits, vec![record("Silicon wafer scanned at 40 keV", 1)]);

        let hits = store.search(r#""powder diffraction""#).expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].did, 2);

        assert!(store.search("nothing-here").expect("search").is_empty());
    }

    #[test]
    fn rejects_unsafe_collection_names() {
        assert!(SqliteMetaStore::open_in_memory("meta; DROP").is_err());
        assert!(SqliteMetaStore::open_in_memory("").is_err());
    }

    #[test]
    fn default_collection_opens_and_column_names_are_refused() {
        let mut store = SqliteMetaStore::open_in_memory(crate::config::DEFAULT_COLLECTION)
            .expect("default collection should open");
        store.insert(&record("Tomography of a steel weld", 7)).expect("insert");
        assert_eq!(store.search("weld").expect("search").len(), 1);

        for name in ["meta", "dataset", "did", "rank", "Meta"] {
            assert!(
                matches!(SqliteMetaStore::open_in_memory(name), Err(Error::InvalidInput(_))),
                "{name}"
            );
        }
    }
}
