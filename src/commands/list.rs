//! List indexed posts

use anyhow::{Context, Result};

use crate::config::Mode;
use crate::content::Post;
use crate::index::Collection;
use crate::snapshot::Snapshot;
use crate::Site;

/// Print the indexed posts, newest first.
///
/// With `cached`, the last snapshot is read instead of the posts directory.
pub fn run(site: &Site, cached: bool) -> Result<()> {
    let collection = if cached {
        let snapshot = Snapshot::load(&site.cache_path).with_context(|| {
            format!("No usable snapshot at {:?}, run `build` first", site.cache_path)
        })?;
        if let Some(warning) = mode_mismatch(site.mode, snapshot.mode) {
            tracing::warn!("{}", warning);
        }
        snapshot.into_collection()
    } else {
        let (store, _) = site.open_store()?;
        (*store.snapshot()).clone()
    };

    for line in render(&collection) {
        println!("{}", line);
    }
    Ok(())
}

/// Warning text when a snapshot was built for another mode than requested
pub fn mode_mismatch(requested: Mode, stored: Mode) -> Option<String> {
    (requested != stored).then(|| {
        format!(
            "Snapshot was built in {} mode, showing it as is; run `build` for {} mode",
            stored.as_str(),
            requested.as_str()
        )
    })
}

/// Listing lines: a header, then one line per post
pub fn render(collection: &Collection) -> Vec<String> {
    let show_drafts = collection.mode().is_development();
    let mut lines = Vec::with_capacity(collection.len() + 1);
    lines.push(format!(
        "Posts ({}, {}):",
        collection.len(),
        collection.mode().as_str()
    ));
    lines.extend(
        collection
            .list_posts()
            .iter()
            .map(|post| post_line(post, show_drafts)),
    );
    lines
}

fn post_line(post: &Post, show_drafts: bool) -> String {
    let marker = if show_drafts && !post.is_published() {
        " DRAFT"
    } else {
        ""
    };
    format!(
        "  {} - {} [{}] ({}){}",
        post.date().format("%Y-%m-%d"),
        post.title(),
        post.slug,
        post.stats.time_to_read.text,
        marker
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::post;
    use tempfile::TempDir;

    #[test]
    fn test_render_development_marks_drafts() {
        let collection = Collection::build(
            vec![post("a", (2020, 1, 1), true), post("b", (2020, 6, 1), false)],
            Mode::Development,
        );
        assert_eq!(
            render(&collection),
            vec![
                "Posts (2, development):".to_string(),
                "  2020-06-01 - B [b] (0 min read) DRAFT".to_string(),
                "  2020-01-01 - A [a] (0 min read)".to_string(),
            ]
        );
    }

    #[test]
    fn test_mode_mismatch() {
        assert_eq!(mode_mismatch(Mode::Production, Mode::Production), None);
        let warning = mode_mismatch(Mode::Development, Mode::Production).unwrap();
        assert!(warning.contains("built in production mode"));
        assert!(warning.contains("for development mode"));
    }

    #[test]
    fn test_cached_listing_uses_snapshot() {
        let tmp = TempDir::new().unwrap();
        let site = Site::new(tmp.path()).unwrap().with_mode(Mode::Development);
        assert!(run(&site, true).is_err());

        let collection = Collection::build(vec![post("a", (2020, 1, 1), true)], Mode::Production);
        Snapshot::from_collection(&collection).save(&site.cache_path).unwrap();
        assert!(run(&site, true).is_ok());
    }

    #[test]
    fn test_render_production() {
        let collection = Collection::build(
            vec![post("a", (2020, 1, 1), true), post("b", (2020, 6, 1), false)],
            Mode::Production,
        );
        assert_eq!(
            render(&collection),
            vec![
                "Posts (1, production):".to_string(),
                "  2020-01-01 - A [a] (0 min read)".to_string(),
            ]
        );
    }
}
