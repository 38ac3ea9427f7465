use mongodb::bson::doc;
use mongodb::options::FindOptions;
use mongodb::sync::{Client, Collection};
use mongodb::IndexModel;
use tracing::{debug, info};

use super::{ensure_query, MetaRecord, MetaStore};
use crate::error::{Error, Result};

pub struct MongoMetaStore {
    collection: Collection<MetaRecord>,
}

impl MongoMetaStore {
    /// Connects and makes sure the `meta` text index exists, since `$text`
    /// queries fail on collections without one.
    pub fn connect(uri: &str, database: &str, collection: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .map_err(|err| Error::StoreUnavailable(format!("mongodb: {err}")))?;
        let collection = client
            .database(database)
            .collection::<MetaRecord>(collection);

        let index = IndexModel::builder().keys(doc! { "meta": "text" }).build();
        collection
            .create_index(index, None)
            .map_err(|err| Error::StoreUnavailable(format!("mongodb: {err}")))?;
        info!(database, collection = collection.name(), "connected to metadata store");
        Ok(Self { collection })
    }
}

impl MetaStore for MongoMetaStore {
    fn insert(&mut self, record: &MetaRecord) -> Result<String> {
        let result = self.collection.insert_one(record, None)?;
        let id = match result.inserted_id.as_object_id() {
            Some(oid) => oid.to_hex(),
            None => result.inserted_id.to_string(),
        };
        debug!(id = %id, dataset = %record.dataset, "metadata inserted");
        Ok(id)
    }

    fn search(&mut self, query: &str) -> Result<Vec<MetaRecord>> {
        let query = ensure_query(query)?;
        let filter = doc! { "$text": { "$search": query } };
        debug!(%filter, "metadata search");
        let options = FindOptions::builder()
            .sort(doc! { "score": { "$meta": "textScore" } })
            .build();
        let cursor = self.collection.find(filter, options)?;
        let mut records = Vec::new();
        for record in cursor {
            records.push(record?);
        }
        Ok(records)
    }
}
