use rewards_dedup_core::{
    plan_all, DedupOptions, DedupReport, DedupTarget, IndexOutcome, IndexSpec, Retention,
};

use super::DedupService;
use crate::ServiceError;

impl DedupService {
    /// Remove every duplicate but the latest record of each group, then
    /// install a unique index on the group key.
    ///
    /// Scan/delete passes repeat until a scan comes back clean or
    /// `options.max_passes` passes have run. A record that vanished before
    /// its delete is skipped. A dry run scans once and touches nothing.
    pub async fn deduplicate(
        &self,
        target: &DedupTarget,
        options: DedupOptions,
    ) -> Result<DedupReport, ServiceError> {
        let mut report = DedupReport::new(target.clone(), options.dry_run);
        tracing::info!(
            collection = %target.collection,
            key = %target.key,
            timestamp = %target.timestamp_field,
            dry_run = options.dry_run,
            "deduplicating collection"
        );

        if options.dry_run {
            let plans = plan_all(&self.store.find_duplicate_groups(target).await?);
            report.groups_found = plans.len();
            report.planned =
                plans.into_iter().flat_map(|p| p.discard.into_iter().map(|r| r.id)).collect();
            tracing::info!(
                collection = %target.collection,
                groups = report.groups_found,
                would_delete = report.planned.len(),
                "dry run completed"
            );
            return Ok(report);
        }

        for pass in 1..=options.max_passes.max(1) {
            let plans = plan_all(&self.store.find_duplicate_groups(target).await?);
            if plans.is_empty() {
                tracing::debug!(collection = %target.collection, pass, "no duplicate groups left");
                break;
            }
            report.passes = pass;
            report.groups_found = report.groups_found.saturating_add(plans.len());
            self.delete_surplus(target, &plans, &mut report).await?;
        }

        let spec = IndexSpec::unique_on(&target.key);
        let name = self.constrain(target, &spec).await?;
        report.index = IndexOutcome::Created { name };

        tracing::info!(
            collection = %target.collection,
            passes = report.passes,
            groups = report.groups_found,
            deleted = report.deleted.len(),
            skipped = report.skipped.len(),
            "deduplication completed"
        );
        Ok(report)
    }

    /// Run [`Self::deduplicate`] for each target in turn, stopping at the first failure.
    pub async fn deduplicate_all(
        &self,
        targets: &[DedupTarget],
        options: DedupOptions,
    ) -> Result<Vec<DedupReport>, ServiceError> {
        let mut reports = Vec::with_capacity(targets.len());
        for target in targets {
            reports.push(self.deduplicate(target, options).await?);
        }
        Ok(reports)
    }

    async fn delete_surplus(
        &self,
        target: &DedupTarget,
        plans: &[Retention],
        report: &mut DedupReport,
    ) -> Result<(), ServiceError> {
        for plan in plans {
            for record in &plan.discard {
                if self.store.delete_by_id(&target.collection, &record.id).await? {
                    tracing::info!(
                        collection = %target.collection,
                        id = %record.id,
                        key = %plan.key_value,
                        kept = %plan.keep.id,
                        "Deleted duplicate"
                    );
                    report.deleted.push(record.id.clone());
                } else {
                    tracing::warn!(
                        collection = %target.collection,
                        id = %record.id,
                        "duplicate already removed, skipping"
                    );
                    report.skipped.push(record.id.clone());
                }
            }
        }
        Ok(())
    }
}
