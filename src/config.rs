//! Parameters file shared by the catalog commands (JSON, or YAML by extension).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Collection name used when a SQLite metadata store is given no `dbcoll`.
/// FTS5 reserves the table's own name as a hidden column, so this must not
/// match a content column.
pub const DEFAULT_COLLECTION: &str = "metadata";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogParams {
    /// Source document holding the free-text metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fname: Option<String>,
    /// Directory whose files belong to the dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dburi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbcoll: Option<String>,
    /// SQLite file holding the experiment/processing/tier catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

impl CatalogParams {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);
        let params = if is_yaml {
            serde_yaml::from_str(&raw)?
        } else {
            serde_json::from_str(&raw)?
        };
        Ok(params)
    }

    fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "fname" => &self.fname,
            "path" => &self.path,
            "dburi" => &self.dburi,
            "dbname" => &self.dbname,
            "dbcoll" => &self.dbcoll,
            "filesdb" => &self.filesdb,
            "experiment" => &self.experiment,
            "processing" => &self.processing,
            "tier" => &self.tier,
            _ => &None,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Fail on the first key that is missing or blank.
    pub fn require(&self, names: &[&str]) -> Result<()> {
        for name in names {
            if self.field(name).is_none() {
                let dump = serde_json::to_string(self).unwrap_or_default();
                return Err(Error::invalid(format!("key {name} not in {dump}")));
            }
        }
        Ok(())
    }

    /// Value of a key that has already passed [`CatalogParams::require`].
    pub fn get(&self, name: &str) -> Result<&str> {
        self.field(name)
            .ok_or_else(|| Error::invalid(format!("missing parameter '{name}'")))
    }
}
