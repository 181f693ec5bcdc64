//! Post assembly - one source document in, one post record out

use chrono_tz::Tz;

use super::{
    FrontMatter, MarkdownRenderer, Post, PostContent, PostContext, PostStats, ReadingTime,
};
use crate::config::SiteConfig;
use crate::error::{ConfigError, PostError};

/// Turns raw markdown documents into post records
#[derive(Debug, Clone)]
pub struct PostAssembler {
    renderer: MarkdownRenderer,
    words_per_minute: u32,
    timezone: Option<Tz>,
}

impl PostAssembler {
    /// Create an assembler with an explicit renderer and reading speed
    pub fn new(renderer: MarkdownRenderer, words_per_minute: u32) -> Self {
        Self {
            renderer,
            words_per_minute,
            timezone: None,
        }
    }

    /// Create an assembler from the site configuration
    pub fn from_config(config: &SiteConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(MarkdownRenderer::from_config(config), config.words_per_minute)
            .with_timezone(config.tz()?))
    }

    /// Interpret offset-less front-matter dates in `tz`
    pub fn with_timezone(mut self, tz: Option<Tz>) -> Self {
        self.timezone = tz;
        self
    }

    /// Build the post for `slug` from its raw source text.
    ///
    /// The returned post has an empty context; linking happens when the
    /// collection is indexed.
    pub fn assemble(&self, slug: &str, raw: &str) -> Result<Post, PostError> {
        let (front_matter, body) = FrontMatter::parse(raw, self.timezone)?;

        // Rendering works on the body; reading time counts the whole file
        let (html, time_to_read) = rayon::join(
            || self.renderer.render(body),
            || ReadingTime::estimate(raw, self.words_per_minute),
        );
        let html = html?;

        tracing::debug!(
            "Assembled {} ({} words, {} bytes of html)",
            slug,
            time_to_read.words,
            html.len()
        );

        Ok(Post {
            slug: slug.to_string(),
            content: PostContent {
                title: front_matter.title,
                description: front_matter.description,
                html,
            },
            stats: PostStats {
                date: front_matter.date,
                published: front_matter.published,
                time_to_read,
            },
            context: PostContext::default(),
        })
    }
}

impl Default for PostAssembler {
    fn default() -> Self {
        Self::new(
            MarkdownRenderer::default(),
            super::reading_time::DEFAULT_WORDS_PER_MINUTE,
        )
    }
}
