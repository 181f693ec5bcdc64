//! postindex: ingests a directory of markdown posts into an ordered,
//! cross-linked collection
//!
//! Each `<posts_dir>/<slug>/index.md` carries a YAML front-matter block and a
//! markdown body. Posts are rendered to HTML with highlighted code, given a
//! reading-time estimate, filtered by publication state, ordered newest first
//! and linked to their neighbors.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod index;
pub mod server;
pub mod snapshot;
pub mod watch;

use anyhow::Result;
use std::path::{Path, PathBuf};

use config::{Mode, SiteConfig};
use content::{ContentLoader, IngestReport, PostAssembler};
use index::PostStore;

/// The main application: a site root and its configuration
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding one sub-directory per post
    pub posts_dir: PathBuf,
    /// Snapshot file
    pub cache_path: PathBuf,
    /// Effective publication mode
    pub mode: Mode,
}

impl Site {
    /// Open a site from a directory, reading `_config.yml` when present.
    ///
    /// `POSTINDEX_ENV` overrides the configured mode.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            SiteConfig::load(&config_path)?
        } else {
            SiteConfig::default()
        };

        let posts_dir = base_dir.join(&config.posts_dir);
        let cache_path = base_dir.join(&config.cache_file);
        let mode = Mode::from_env().unwrap_or(config.mode);

        Ok(Self {
            config,
            base_dir,
            posts_dir,
            cache_path,
            mode,
        })
    }

    /// Force a publication mode
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Loader for this site's posts directory
    pub fn loader(&self) -> Result<ContentLoader> {
        let assembler = PostAssembler::from_config(&self.config)?;
        Ok(ContentLoader::new(&self.posts_dir, assembler)
            .with_index_files(self.config.index_files.clone()))
    }

    /// Ingest every post and publish the first collection
    pub fn open_store(&self) -> Result<(PostStore, IngestReport)> {
        let (store, report) = PostStore::open(self.loader()?, self.mode)?;
        Ok((store, report))
    }
}
