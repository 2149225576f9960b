use rewards_dedup_core::{
    index_layout, validate_collection, DedupTarget, FieldName, IndexSpec, LayoutReport, Preset,
    DEFAULT_TIMESTAMP_FIELD, MAX_REPORTED_COLLISIONS,
};
use rewards_dedup_storage::StorageError;

use super::DedupService;
use crate::ServiceError;

impl DedupService {
    /// Create a unique index. When the store rejects it because duplicates
    /// remain, rescan and report which key values still collide.
    pub(crate) async fn constrain(
        &self,
        target: &DedupTarget,
        spec: &IndexSpec,
    ) -> Result<String, ServiceError> {
        match self.store.create_index(&target.collection, spec).await {
            Ok(name) => {
                tracing::info!(collection = %target.collection, index = %name, "unique index created");
                Ok(name)
            },
            Err(StorageError::Duplicate(detail)) => {
                let groups = self.store.find_duplicate_groups(target).await?;
                let total = groups.len();
                let collisions: Vec<_> =
                    groups.into_iter().take(MAX_REPORTED_COLLISIONS).map(|g| g.key_value).collect();
                tracing::error!(
                    collection = %target.collection,
                    index = %spec.name(),
                    colliding = total,
                    "unique index rejected, duplicates remain"
                );
                Err(ServiceError::ResidualDuplicates {
                    collection: target.collection.clone(),
                    index: spec.name(),
                    collisions,
                    total,
                    detail,
                })
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Install the full index set the ingestion service expects on a
    /// collection of the given kind. The unique natural-key index goes first.
    pub async fn ensure_index_layout(
        &self,
        collection: &str,
        preset: Preset,
    ) -> Result<LayoutReport, ServiceError> {
        validate_collection(collection)?;
        let target =
            DedupTarget::new(collection, preset.key(), FieldName::new(DEFAULT_TIMESTAMP_FIELD)?)?;

        let mut indexes = Vec::new();
        for spec in index_layout(preset) {
            let name = if spec.unique {
                self.constrain(&target, &spec).await?
            } else {
                self.store.create_index(collection, &spec).await?
            };
            tracing::debug!(collection, index = %name, "index ensured");
            indexes.push(name);
        }
        tracing::info!(collection, preset = %preset, count = indexes.len(), "index layout ensured");
        Ok(LayoutReport { collection: collection.to_owned(), indexes })
    }
}
