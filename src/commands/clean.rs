//! Remove the snapshot file

use anyhow::Result;
use std::fs;

use crate::Site;

/// Delete the snapshot if it exists; returns whether anything was removed
pub fn run(site: &Site) -> Result<bool> {
    if !site.cache_path.exists() {
        return Ok(false);
    }
    fs::remove_file(&site.cache_path)?;
    tracing::info!("Deleted: {:?}", site.cache_path);
    Ok(true)
}
