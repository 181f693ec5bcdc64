//! Show a single post

use anyhow::Result;

use crate::content::{Post, PostRef};
use crate::Site;

/// Print one post's metadata, neighbors and rendered HTML
pub fn run(site: &Site, slug: &str) -> Result<()> {
    let (store, _) = site.open_store()?;
    let collection = store.snapshot();
    let post = collection.require_post(slug)?;
    println!("{}", render(post, &site.config.site.default_description));
    Ok(())
}

/// Text shown for a post
pub fn render(post: &Post, default_description: &str) -> String {
    let neighbor = |link: &Option<PostRef>| match link {
        Some(r) => format!("{} ({})", r.title(), r.slug),
        None => "-".to_string(),
    };

    format!(
        "Title:       {}\n\
         Slug:        {}\n\
         Date:        {}\n\
         Published:   {}\n\
         Reading:     {} ({} words)\n\
         Description: {}\n\
         Previous:    {}\n\
         Next:        {}\n\
         \n{}",
        post.title(),
        post.slug,
        post.date().to_rfc3339(),
        post.is_published(),
        post.stats.time_to_read.text,
        post.stats.time_to_read.words,
        post.description_or(default_description),
        neighbor(&post.context.previous),
        neighbor(&post.context.next),
        post.content.html
    )
}
