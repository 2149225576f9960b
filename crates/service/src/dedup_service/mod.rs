mod constraint;
mod sweep;
#[cfg(test)]
mod race_tests;

use std::sync::Arc;

use rewards_dedup_core::{plan_all, DedupTarget, ScanReport};
use rewards_dedup_storage::RecordStore;

use crate::ServiceError;

pub struct DedupService {
    pub(crate) store: Arc<dyn RecordStore>,
}

impl DedupService {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn ping(&self) -> Result<(), ServiceError> {
        self.store.ping().await?;
        Ok(())
    }

    /// Read-only report of the duplicate groups in a collection and which
    /// record of each group would survive.
    pub async fn scan(&self, target: &DedupTarget) -> Result<ScanReport, ServiceError> {
        let groups = self.store.find_duplicate_groups(target).await?;
        let plans = plan_all(&groups);
        tracing::info!(
            collection = %target.collection,
            groups = plans.len(),
            surplus = plans.iter().map(|p| p.discard.len()).sum::<usize>(),
            "duplicate scan completed"
        );
        Ok(ScanReport { target: target.clone(), groups: plans })
    }
}
