use anyhow::Result;
use rewards_dedup_core::DedupTarget;
use rewards_dedup_service::DedupService;

use super::emit;

pub(crate) async fn run(service: &DedupService, target: &DedupTarget, json: bool) -> Result<()> {
    let report = service.scan(target).await?;
    emit(&report, json)
}
