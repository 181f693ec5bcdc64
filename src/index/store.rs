//! Post store - the current indexed collection behind an atomic pointer
//!
//! Readers take a snapshot (`Arc<Collection>`) without locking and keep a
//! consistent view for as long as they hold it. Writers rebuild a complete
//! collection off to the side and publish it with a single swap, so nobody
//! ever sees a half-updated index. Writers are serialized, which means the
//! last refresh to start is also the last one to publish.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::Collection;
use crate::config::Mode;
use crate::content::{ContentLoader, IngestReport, Post, PostFailure};
use crate::error::{IngestError, PostError};
use crate::watch::{ChangeEvent, ChangeKind};

/// Result of applying a batch of change events
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    /// Slugs re-assembled successfully
    pub updated: Vec<String>,
    /// Slugs dropped from the collection
    pub removed: Vec<String>,
    /// Documents that failed to re-assemble (and were dropped)
    pub failures: Vec<PostFailure>,
}

/// Owns the live post index
pub struct PostStore {
    loader: ContentLoader,
    mode: Mode,
    current: ArcSwap<Collection>,
    /// Assembled, unindexed posts keyed by slug; slug order is enumeration order
    sources: Mutex<BTreeMap<String, Post>>,
}

impl PostStore {
    /// Create an empty store; call `refresh` to populate it
    pub fn new(loader: ContentLoader, mode: Mode) -> Self {
        Self {
            loader,
            mode,
            current: ArcSwap::from_pointee(Collection::build(Vec::new(), mode)),
            sources: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a store and run the first ingestion
    pub fn open(loader: ContentLoader, mode: Mode) -> Result<(Self, IngestReport), IngestError> {
        let store = Self::new(loader, mode);
        let report = store.refresh()?;
        Ok((store, report))
    }

    /// Current collection. Lock-free; the returned view never changes.
    pub fn snapshot(&self) -> Arc<Collection> {
        self.current.load_full()
    }

    /// Convenience lookup against the current snapshot
    pub fn get_post(&self, slug: &str) -> Option<Post> {
        self.snapshot().get_post(slug).cloned()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    /// Whether `slug` was ingested successfully, visible or not
    pub fn contains_source(&self, slug: &str) -> bool {
        self.sources.lock().contains_key(slug)
    }

    /// Re-ingest everything and publish the result.
    ///
    /// On a batch-fatal error the previous collection stays in place.
    pub fn refresh(&self) -> Result<IngestReport, IngestError> {
        let mut sources = self.sources.lock();
        let report = self.loader.load_posts()?;

        *sources = report
            .posts
            .iter()
            .map(|post| (post.slug.clone(), post.clone()))
            .collect();
        self.publish(&sources);

        Ok(report)
    }

    /// Apply change events, then rebuild and publish the whole index.
    ///
    /// Only the touched documents are re-read, but ordering and context are
    /// always recomputed for the full set since a single change can move
    /// neighbors anywhere in the chain.
    pub fn apply(&self, events: &[ChangeEvent]) -> ApplyOutcome {
        let mut sources = self.sources.lock();
        let mut outcome = ApplyOutcome::default();

        for event in events {
            match event.kind {
                ChangeKind::Removed => {
                    if sources.remove(&event.slug).is_some() {
                        outcome.removed.push(event.slug.clone());
                    }
                }
                ChangeKind::Added | ChangeKind::Modified => {
                    match self.loader.load_post(&event.slug) {
                        Ok(post) => {
                            sources.insert(event.slug.clone(), post);
                            outcome.updated.push(event.slug.clone());
                        }
                        Err(PostError::MissingSource(_)) => {
                            if sources.remove(&event.slug).is_some() {
                                outcome.removed.push(event.slug.clone());
                            }
                        }
                        Err(error) => {
                            tracing::warn!("Failed to load post {}: {}", event.slug, error);
                            sources.remove(&event.slug);
                            outcome.failures.push(PostFailure {
                                slug: event.slug.clone(),
                                error,
                            });
                        }
                    }
                }
            }
        }

        self.publish(&sources);
        outcome
    }

    fn publish(&self, sources: &BTreeMap<String, Post>) {
        let collection = Collection::build(sources.values().cloned().collect(), self.mode);
        tracing::debug!(
            "Publishing {} of {} posts ({} mode)",
            collection.len(),
            sources.len(),
            self.mode.as_str()
        );
        self.current.store(Arc::new(collection));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PostAssembler;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_post(root: &Path, slug: &str, date: &str, published: bool) {
        let dir = root.join(slug);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("index.md"),
            format!(
                "---\ntitle: Post {slug}\ndate: {date}\npublished: {published}\n---\n\n\
                 Hello from {slug}.\n"
            ),
        )
        .unwrap();
    }

    fn store(root: &Path, mode: Mode) -> PostStore {
        let loader = ContentLoader::new(root, PostAssembler::default());
        PostStore::open(loader, mode).unwrap().0
    }

    fn slugs(collection: &Collection) -> Vec<String> {
        collection
            .list_posts()
            .iter()
            .map(|p| p.slug.clone())
            .collect()
    }

    #[test]
    fn test_scenario_from_disk() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "a", "2020-01-01", true);
        write_post(tmp.path(), "b", "2020-06-01", false);
        write_post(tmp.path(), "c", "2020-03-01", true);

        let prod = store(tmp.path(), Mode::Production);
        assert_eq!(slugs(&prod.snapshot()), vec!["c", "a"]);
        assert!(prod.get_post("b").is_none());
        assert!(prod.contains_source("b"));

        let dev = store(tmp.path(), Mode::Development);
        assert_eq!(slugs(&dev.snapshot()), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "a", "2020-01-01", true);
        write_post(tmp.path(), "c", "2020-03-01", true);

        let store = store(tmp.path(), Mode::Production);
        let first = store.snapshot();
        store.refresh().unwrap();
        let second = store.snapshot();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.list_posts(), second.list_posts());
    }

    #[test]
    fn test_old_snapshot_survives_swap() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "a", "2020-01-01", true);
        let store = store(tmp.path(), Mode::Production);

        let before = store.snapshot();
        write_post(tmp.path(), "z", "2021-01-01", true);
        store.apply(&[ChangeEvent::new(ChangeKind::Added, "z")]);

        assert_eq!(slugs(&before), vec!["a"]);
        assert_eq!(slugs(&store.snapshot()), vec!["z", "a"]);
    }

    #[test]
    fn test_apply_relinks_whole_chain() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "a", "2020-01-01", true);
        write_post(tmp.path(), "b", "2020-02-01", true);
        write_post(tmp.path(), "c", "2020-03-01", true);
        let store = store(tmp.path(), Mode::Production);

        // Move "a" to the front: neighbors change at both ends of the chain
        write_post(tmp.path(), "a", "2021-01-01", true);
        let outcome = store.apply(&[ChangeEvent::new(ChangeKind::Modified, "a")]);
        assert_eq!(outcome.updated, vec!["a"]);

        let snapshot = store.snapshot();
        assert_eq!(slugs(&snapshot), vec!["a", "c", "b"]);
        let b = snapshot.get_post("b").unwrap();
        assert_eq!(b.context.previous.as_ref().unwrap().slug, "c");
        assert!(b.context.next.is_none());
    }

    #[test]
    fn test_publishing_a_draft_links_it() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "a", "2020-01-01", true);
        write_post(tmp.path(), "b", "2020-02-01", false);
        write_post(tmp.path(), "c", "2020-03-01", true);
        let store = store(tmp.path(), Mode::Production);
        assert_eq!(
            store.get_post("c").unwrap().context.next.unwrap().slug,
            "a"
        );

        write_post(tmp.path(), "b", "2020-02-01", true);
        store.apply(&[ChangeEvent::new(ChangeKind::Modified, "b")]);
        assert_eq!(
            store.get_post("c").unwrap().context.next.unwrap().slug,
            "b"
        );
    }

    #[test]
    fn test_apply_remove_and_broken_edit() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "a", "2020-01-01", true);
        write_post(tmp.path(), "b", "2020-02-01", true);
        write_post(tmp.path(), "c", "2020-03-01", true);
        let store = store(tmp.path(), Mode::Production);

        fs::remove_dir_all(tmp.path().join("b")).unwrap();
        fs::write(tmp.path().join("c").join("index.md"), "oops, no front-matter").unwrap();

        let outcome = store.apply(&[
            ChangeEvent::new(ChangeKind::Removed, "b"),
            ChangeEvent::new(ChangeKind::Modified, "c"),
        ]);
        assert_eq!(outcome.removed, vec!["b"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].slug, "c");

        let snapshot = store.snapshot();
        assert_eq!(slugs(&snapshot), vec!["a"]);
        assert_eq!(snapshot.get_post("a").unwrap().context.previous, None);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_collection() {
        let tmp = TempDir::new().unwrap();
        let posts = tmp.path().join("posts");
        write_post(&posts, "a", "2020-01-01", true);
        let store = store(&posts, Mode::Production);

        fs::remove_dir_all(&posts).unwrap();
        assert!(store.refresh().is_err());
        assert_eq!(slugs(&store.snapshot()), vec!["a"]);
    }
}
