//! MongoDB storage backend.

mod convert;
mod pipeline;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use rewards_dedup_core::{
    DedupTarget, DuplicateGroup, IndexSpec, RecordId, StoreSettings, APP_NAME,
};

use crate::error::StorageError;
use crate::traits::RecordStore;

#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Build a client for the configured database. The driver connects
    /// lazily; call [`RecordStore::ping`] to surface connectivity errors early.
    pub async fn connect(settings: &StoreSettings) -> Result<Self, StorageError> {
        let mut options = ClientOptions::parse(settings.uri.as_str()).await?;
        options.app_name = Some(APP_NAME.to_owned());
        options.server_selection_timeout = Some(settings.server_timeout);
        let client = Client::with_options(options)?;
        let db = client.database(&settings.database);
        tracing::info!(
            uri = %settings.redacted_uri(),
            database = %settings.database,
            "MongoStore initialized"
        );
        Ok(Self { client, db })
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn ping(&self) -> Result<(), StorageError> {
        self.client.database("admin").run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn find_duplicate_groups(
        &self,
        target: &DedupTarget,
    ) -> Result<Vec<DuplicateGroup>, StorageError> {
        let pipeline = pipeline::duplicate_groups_pipeline(target);
        let mut cursor = self
            .collection(&target.collection)
            .aggregate(pipeline)
            .allow_disk_use(true)
            .await?;

        let key_len = target.key.len();
        let mut groups = Vec::new();
        while let Some(raw) = cursor.try_next().await? {
            groups.push(pipeline::parse_group(&raw, key_len)?);
        }
        tracing::debug!(collection = %target.collection, groups = groups.len(), "duplicate scan finished");
        Ok(groups)
    }

    async fn delete_by_id(&self, collection: &str, id: &RecordId) -> Result<bool, StorageError> {
        let filter = doc! { "_id": convert::record_id_to_bson(id)? };
        let result = self.collection(collection).delete_one(filter).await?;
        Ok(result.deleted_count > 0)
    }

    async fn create_index(
        &self,
        collection: &str,
        spec: &IndexSpec,
    ) -> Result<String, StorageError> {
        let mut keys = Document::new();
        for field in &spec.fields {
            keys.insert(field.as_str(), 1_i32);
        }
        // No explicit name: the server default matches indexes created by the ingestion service.
        let model = if spec.unique {
            let options = IndexOptions::builder().unique(true).build();
            IndexModel::builder().keys(keys).options(options).build()
        } else {
            IndexModel::builder().keys(keys).build()
        };
        let result = self.collection(collection).create_index(model).await?;
        Ok(result.index_name)
    }

    async fn insert_record(
        &self,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<RecordId, StorageError> {
        let doc = convert::json_to_document(record)?;
        let result = self.collection(collection).insert_one(doc).await?;
        Ok(convert::record_id_from_bson(&result.inserted_id))
    }
}
