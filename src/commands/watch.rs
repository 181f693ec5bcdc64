//! Rebuild the index whenever posts change

use anyhow::Result;
use std::sync::atomic::AtomicBool;

use crate::commands::build;
use crate::watch::watch_posts;
use crate::Site;

/// Build once, then keep the snapshot in sync with the posts directory
pub fn run(site: &Site) -> Result<()> {
    let (store, report) = site.open_store()?;
    build::write_snapshot(site, &store.snapshot())?;
    println!("{}", build::summary(&report));

    // Runs until the process is interrupted
    let stop = AtomicBool::new(false);
    let loader = store.loader().clone();
    watch_posts(&loader, &store, &stop, |outcome| {
        for failure in &outcome.failures {
            println!("Failed: {} ({})", failure.slug, failure.error);
        }
        let collection = store.snapshot();
        match build::write_snapshot(site, &collection) {
            Ok(()) => println!("Reindexed {} posts", collection.len()),
            Err(e) => tracing::error!("Failed to write snapshot: {}", e),
        }
    })
}
