//! Ingest the posts directory and write the snapshot

use anyhow::Result;

use crate::content::IngestReport;
use crate::index::Collection;
use crate::snapshot::Snapshot;
use crate::Site;

/// Ingest, index and write the snapshot
pub fn run(site: &Site) -> Result<IngestReport> {
    let start = std::time::Instant::now();

    let (store, report) = site.open_store()?;
    let collection = store.snapshot();
    write_snapshot(site, &collection)?;

    tracing::info!(
        "Indexed {} posts ({} mode) in {:.2}s",
        collection.len(),
        site.mode.as_str(),
        start.elapsed().as_secs_f64()
    );

    Ok(report)
}

/// Persist `collection` to the site's snapshot file
pub fn write_snapshot(site: &Site, collection: &Collection) -> Result<()> {
    Snapshot::from_collection(collection).save(&site.cache_path)
}

/// One-line summary of an ingestion pass
pub fn summary(report: &IngestReport) -> String {
    if report.failed() == 0 {
        format!("{} posts loaded", report.succeeded())
    } else {
        format!(
            "{} posts loaded, {} failed: {}",
            report.succeeded(),
            report.failed(),
            report.failed_slugs().join(", ")
        )
    }
}
