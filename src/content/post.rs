//! Post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReadingTime;

/// A blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Name of the directory the post lives in; the only stable identifier
    pub slug: String,

    pub content: PostContent,

    pub stats: PostStats,

    /// Neighbors in the indexed collection; empty until indexed
    #[serde(default)]
    pub context: PostContext,
}

/// Title, description and rendered body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostContent {
    pub title: String,
    pub description: Option<String>,
    pub html: String,
}

/// Publication metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    pub date: DateTime<Utc>,
    pub published: bool,
    pub time_to_read: ReadingTime,
}

/// Previous/next links within one view of the collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostContext {
    pub previous: Option<PostRef>,
    pub next: Option<PostRef>,
}

/// Reduced projection of a neighboring post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRef {
    pub slug: String,
    pub content: PostRefContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRefContent {
    pub title: String,
}

impl Post {
    /// Project this post down to a neighbor link
    pub fn to_ref(&self) -> PostRef {
        PostRef {
            slug: self.slug.clone(),
            content: PostRefContent {
                title: self.content.title.clone(),
            },
        }
    }

    /// Description, or `default` when the post has none
    pub fn description_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.content.description.as_deref().unwrap_or(default)
    }

    pub fn title(&self) -> &str {
        &self.content.title
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.stats.date
    }

    pub fn is_published(&self) -> bool {
        self.stats.published
    }
}

impl PostRef {
    pub fn title(&self) -> &str {
        &self.content.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Post {
        Post {
            slug: "hello-world".to_string(),
            content: PostContent {
                title: "Hello World".to_string(),
                description: None,
                html: "<p>Hi</p>\n".to_string(),
            },
            stats: PostStats {
                date: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                published: true,
                time_to_read: ReadingTime::estimate("Hi", 250),
            },
            context: PostContext::default(),
        }
    }

    #[test]
    fn test_description_fallback_at_render_time() {
        let mut post = sample();
        assert_eq!(post.description_or("An article"), "An article");
        post.content.description = Some("Greetings".to_string());
        assert_eq!(post.description_or("An article"), "Greetings");
    }

    #[test]
    fn test_ref_projection() {
        let post = sample();
        let r = post.to_ref();
        assert_eq!(r.slug, "hello-world");
        assert_eq!(r.title(), "Hello World");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["slug"], "hello-world");
        assert_eq!(json["content"]["description"], serde_json::Value::Null);
        assert_eq!(json["stats"]["timeToRead"]["text"], "0 min read");
        assert_eq!(json["stats"]["date"], "2020-01-01T00:00:00Z");
        assert_eq!(json["context"]["previous"], serde_json::Value::Null);
    }
}
