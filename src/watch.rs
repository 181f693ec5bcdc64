//! File watching - turns filesystem notifications into post change events

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use crate::content::ContentLoader;
use crate::index::{ApplyOutcome, PostStore};

/// Quiet period before a burst of filesystem events is handled
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// How often the watch loop checks its stop flag
const STOP_POLL: Duration = Duration::from_millis(200);

/// What happened to a post's source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// A change to one post, identified by slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub slug: String,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, slug: impl Into<String>) -> Self {
        Self {
            kind,
            slug: slug.into(),
        }
    }
}

/// Classify changed paths into one event per slug.
///
/// Debounced notifications don't say what happened, so the kind is derived
/// from whether the post's source still exists and whether the store already
/// knows the slug.
pub fn classify_paths<'a, I>(
    loader: &ContentLoader,
    store: &PostStore,
    paths: I,
) -> Vec<ChangeEvent>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut slugs = BTreeSet::new();
    for path in paths {
        if is_ignored(path) {
            continue;
        }
        if let Some(slug) = loader.slug_for_path(path) {
            slugs.insert(slug);
        }
    }

    slugs
        .into_iter()
        .map(|slug| {
            let kind = if loader.source_path(&slug).is_none() {
                ChangeKind::Removed
            } else if store.contains_source(&slug) {
                ChangeKind::Modified
            } else {
                ChangeKind::Added
            };
            ChangeEvent::new(kind, slug)
        })
        .collect()
}

/// Editor droppings and VCS internals never affect posts
fn is_ignored(path: &Path) -> bool {
    let in_ignored_dir = path
        .components()
        .any(|c| matches!(c.as_os_str().to_str(), Some(".git" | ".DS_Store")));
    let scratch_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with('~') || n.ends_with(".swp"))
        .unwrap_or(false);
    in_ignored_dir || scratch_file
}

/// Watch the posts directory and apply every change to `store`.
///
/// Blocks until `stop` is set or the notification channel closes. `on_change`
/// runs after each swap, e.g. to rewrite the snapshot or notify clients.
pub fn watch_posts<F>(
    loader: &ContentLoader,
    store: &PostStore,
    stop: &AtomicBool,
    mut on_change: F,
) -> Result<()>
where
    F: FnMut(&ApplyOutcome),
{
    let (tx, rx) = mpsc::channel();

    let mut debouncer = new_debouncer(DEBOUNCE, tx)?;
    debouncer
        .watcher()
        .watch(loader.posts_dir(), RecursiveMode::Recursive)?;
    tracing::info!("Watching {:?} for changes", loader.posts_dir());

    while !stop.load(Ordering::Relaxed) {
        match rx.recv_timeout(STOP_POLL) {
            Ok(Ok(events)) => {
                let changes = classify_paths(
                    loader,
                    store,
                    events.iter().map(|e| e.path.as_path()),
                );
                if changes.is_empty() {
                    continue;
                }

                for change in &changes {
                    tracing::info!("{:?}: {}", change.kind, change.slug);
                }

                let outcome = store.apply(&changes);
                on_change(&outcome);
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("Watch channel closed");
                break;
            }
        }
    }

    tracing::debug!("Stopped watching {:?}", loader.posts_dir());

    Ok(())
}
