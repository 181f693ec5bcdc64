//! Content loader - loads posts from the posts directory

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{Post, PostAssembler};
use crate::error::{IngestError, PostError};

/// A document that could not be turned into a post
#[derive(Debug)]
pub struct PostFailure {
    pub slug: String,
    pub error: PostError,
}

/// Outcome of one ingestion pass
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Assembled posts, in enumeration order, not yet indexed
    pub posts: Vec<Post>,
    pub failures: Vec<PostFailure>,
}

impl IngestReport {
    pub fn succeeded(&self) -> usize {
        self.posts.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn failed_slugs(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.slug.as_str()).collect()
    }
}

/// Loads posts from `<posts_dir>/<slug>/index.md`
#[derive(Debug, Clone)]
pub struct ContentLoader {
    posts_dir: PathBuf,
    index_files: Vec<String>,
    assembler: PostAssembler,
}

impl ContentLoader {
    /// Create a new content loader
    pub fn new<P: Into<PathBuf>>(posts_dir: P, assembler: PostAssembler) -> Self {
        Self {
            posts_dir: posts_dir.into(),
            index_files: vec!["index.md".to_string(), "index.markdown".to_string()],
            assembler,
        }
    }

    /// File names tried, in order, inside each slug directory
    pub fn with_index_files(mut self, index_files: Vec<String>) -> Self {
        if !index_files.is_empty() {
            self.index_files = index_files;
        }
        self
    }

    pub fn posts_dir(&self) -> &Path {
        &self.posts_dir
    }

    /// Enumerate slug directories in a stable (lexicographic) order.
    ///
    /// This is the only batch-fatal step: if the posts directory itself cannot
    /// be read there is nothing to ingest.
    pub fn slugs(&self) -> Result<Vec<String>, IngestError> {
        let source_dir_error = |source: std::io::Error| IngestError::SourceDir {
            path: self.posts_dir.clone(),
            source,
        };

        let metadata = fs::metadata(&self.posts_dir).map_err(source_dir_error)?;
        if !metadata.is_dir() {
            return Err(source_dir_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a directory",
            )));
        }
        // Fail early on unreadable directories rather than yielding nothing
        fs::read_dir(&self.posts_dir).map_err(source_dir_error)?;

        let mut slugs = Vec::new();
        for entry in WalkDir::new(&self.posts_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", self.posts_dir, e);
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                tracing::warn!("Skipping non UTF-8 directory {:?}", entry.path());
                continue;
            };

            if name.starts_with('.') || name.starts_with('_') {
                continue;
            }

            slugs.push(name.to_string());
        }

        Ok(slugs)
    }

    /// Path of the index file for `slug`, if one exists
    pub fn source_path(&self, slug: &str) -> Option<PathBuf> {
        let dir = self.posts_dir.join(slug);
        self.index_files
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Read the raw source of one post
    pub fn read_source(&self, slug: &str) -> Result<String, PostError> {
        let path = self
            .source_path(slug)
            .ok_or_else(|| PostError::MissingSource(self.posts_dir.join(slug)))?;
        fs::read_to_string(&path).map_err(|source| PostError::Read { path, source })
    }

    /// Load a single post
    pub fn load_post(&self, slug: &str) -> Result<Post, PostError> {
        let raw = self.read_source(slug)?;
        self.assembler.assemble(slug, &raw)
    }

    /// Load every post in the posts directory.
    ///
    /// Documents are read and assembled in parallel; the results are joined
    /// back in enumeration order. Per-document failures are collected in the
    /// report instead of failing the batch.
    pub fn load_posts(&self) -> Result<IngestReport, IngestError> {
        let slugs = self.slugs()?;

        let results: Vec<(String, Result<Post, PostError>)> = slugs
            .into_par_iter()
            .map(|slug| {
                let result = self.load_post(&slug);
                (slug, result)
            })
            .collect();

        let mut report = IngestReport::default();
        for (slug, result) in results {
            match result {
                Ok(post) => report.posts.push(post),
                Err(error) => {
                    tracing::warn!("Failed to load post {}: {}", slug, error);
                    report.failures.push(PostFailure { slug, error });
                }
            }
        }

        tracing::info!(
            "Loaded {} posts from {:?} ({} failed)",
            report.succeeded(),
            self.posts_dir,
            report.failed()
        );

        Ok(report)
    }

    /// Slug a changed path belongs to, if it lies inside a slug directory
    pub fn slug_for_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.posts_dir).ok()?;
        let first = relative.components().next()?;
        let name = first.as_os_str().to_str()?;
        if name.starts_with('.') || name.starts_with('_') {
            return None;
        }
        // A plain file directly in the posts directory is not a post
        if relative.components().count() == 1 && path.is_file() {
            return None;
        }
        Some(name.to_string())
    }
}
