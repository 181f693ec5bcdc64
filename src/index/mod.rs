//! Collection indexing - ordering, draft filtering and prev/next links

mod store;

pub use store::{ApplyOutcome, PostStore};

use std::collections::{HashMap, HashSet};

use crate::config::Mode;
use crate::content::Post;
use crate::error::LookupError;

/// Drop drafts unless running in development mode
pub fn filter_published(posts: Vec<Post>, mode: Mode) -> Vec<Post> {
    if mode.is_development() {
        return posts;
    }
    posts.into_iter().filter(|post| post.stats.published).collect()
}

/// Sort newest first; ties keep their incoming order
pub fn sort_by_date(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.stats.date.cmp(&a.stats.date));
}

/// Point every post at its immediate neighbors in `posts`
pub fn link_context(posts: &mut [Post]) {
    let refs: Vec<_> = posts.iter().map(Post::to_ref).collect();
    for (i, post) in posts.iter_mut().enumerate() {
        post.context.previous = i.checked_sub(1).map(|j| refs[j].clone());
        post.context.next = refs.get(i + 1).cloned();
    }
}

/// Filter, order and link a set of posts.
///
/// Filtering happens first so that in production the neighbor chain only
/// ever runs through published posts.
pub fn organize(posts: Vec<Post>, mode: Mode) -> Vec<Post> {
    let mut posts = filter_published(posts, mode);
    sort_by_date(&mut posts);
    link_context(&mut posts);
    posts
}

/// One immutable, fully indexed view of the posts
#[derive(Debug, Clone, Default)]
pub struct Collection {
    posts: Vec<Post>,
    by_slug: HashMap<String, usize>,
    mode: Mode,
}

impl Collection {
    /// Index `posts` (in enumeration order) for `mode`.
    ///
    /// A repeated slug keeps its first occurrence.
    pub fn build(posts: Vec<Post>, mode: Mode) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(posts.len());
        for post in posts {
            if !seen.insert(post.slug.clone()) {
                tracing::warn!("Duplicate slug {}, keeping the first one", post.slug);
                continue;
            }
            unique.push(post);
        }

        let posts = organize(unique, mode);
        let by_slug = posts
            .iter()
            .enumerate()
            .map(|(i, post)| (post.slug.clone(), i))
            .collect();

        Self {
            posts,
            by_slug,
            mode,
        }
    }

    /// All visible posts, newest first
    pub fn list_posts(&self) -> &[Post] {
        &self.posts
    }

    /// Look up a post in the same view `list_posts` returns
    pub fn get_post(&self, slug: &str) -> Option<&Post> {
        self.by_slug.get(slug).map(|&i| &self.posts[i])
    }

    /// Like `get_post`, for callers that want an error value
    pub fn require_post(&self, slug: &str) -> Result<&Post, LookupError> {
        self.get_post(slug)
            .ok_or_else(|| LookupError::NotFound(slug.to_string()))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
