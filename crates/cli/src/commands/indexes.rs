use anyhow::{Context, Result};
use rewards_dedup_core::Preset;
use rewards_dedup_service::DedupService;

/// Collection to index: the explicit one, else the preset's fixed collection.
pub(crate) fn collection_for(preset: Preset, collection: Option<String>) -> Result<String> {
    collection
        .filter(|c| !c.trim().is_empty())
        .or_else(|| preset.default_collection().map(str::to_owned))
        .with_context(|| format!("--collection is required for preset {preset}"))
}

pub(crate) async fn run(service: &DedupService, collection: &str, preset: Preset) -> Result<()> {
    let report = service.ensure_index_layout(collection, preset).await?;
    println!("{report}");
    Ok(())
}
