use anyhow::Result;
use rewards_dedup_core::{DedupOptions, DedupTarget};
use rewards_dedup_service::DedupService;

use super::emit;

pub(crate) async fn run(
    service: &DedupService,
    target: &DedupTarget,
    options: DedupOptions,
    json: bool,
) -> Result<()> {
    let report = service.deduplicate(target, options).await?;
    emit(&report, json)
}

pub(crate) async fn run_all(service: &DedupService, options: DedupOptions, json: bool) -> Result<()> {
    let targets = DedupTarget::known_targets();
    let reports = service.deduplicate_all(&targets, options).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{report}");
        }
        let deleted: usize = reports.iter().map(|r| r.deleted_count()).sum();
        println!("{} collections processed, {deleted} duplicates deleted", reports.len());
    }
    Ok(())
}
