//! Site configuration (_config.yml)

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Environment variable that selects development or production filtering
pub const MODE_ENV: &str = "POSTINDEX_ENV";

/// Publication mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Drafts are visible so authors can preview them
    Development,
    /// Only published posts are visible
    #[default]
    Production,
}

impl Mode {
    /// Parse a mode name; anything other than development means production
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Mode::Development,
            _ => Mode::Production,
        }
    }

    /// Read the mode from `POSTINDEX_ENV`, if set
    pub fn from_env() -> Option<Self> {
        std::env::var(MODE_ENV).ok().map(|v| Self::from_name(&v))
    }

    pub fn is_development(self) -> bool {
        self == Mode::Development
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Directory
    pub posts_dir: String,
    pub index_files: Vec<String>,
    pub cache_file: String,

    // Filtering
    pub mode: Mode,

    // Dates without an explicit offset are read in this IANA zone (UTC if empty)
    pub timezone: String,

    // Reading time
    pub words_per_minute: u32,

    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub render: RenderConfig,

    // Metadata served next to the posts
    #[serde(default)]
    pub site: SiteMetadata,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            posts_dir: "public/blog".to_string(),
            index_files: vec!["index.md".to_string(), "index.markdown".to_string()],
            cache_file: "posts-cache.json".to_string(),
            mode: Mode::Production,
            timezone: String::new(),
            words_per_minute: 250,
            highlight: HighlightConfig::default(),
            render: RenderConfig::default(),
            site: SiteMetadata::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SiteConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.words_per_minute == 0 {
            return Err(ConfigError::ReadingSpeed);
        }
        self.tz()?;
        Ok(())
    }

    /// Resolve the configured timezone
    pub fn tz(&self) -> Result<Option<Tz>, ConfigError> {
        let name = self.timezone.trim();
        if name.is_empty() {
            return Ok(None);
        }
        name.parse::<Tz>()
            .map(Some)
            .map_err(|_| ConfigError::Timezone(name.to_string()))
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_numbers: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "InspiredGitHub".to_string(),
            line_numbers: false,
        }
    }
}

/// Markdown rendering switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Pass raw HTML in markdown through instead of escaping it
    pub allow_html: bool,
    /// Give headings slugified `id` attributes
    pub heading_anchors: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            allow_html: false,
            heading_anchors: true,
        }
    }
}

/// Site-wide metadata exposed to page renderers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteMetadata {
    pub title: String,
    pub author: String,
    pub description: String,
    #[serde(alias = "site_url", alias = "url")]
    pub site_url: String,
    /// Fallback for posts without a description, applied at render time
    #[serde(alias = "default_description")]
    pub default_description: String,
    #[serde(default)]
    pub social: SocialConfig,
}

impl Default for SiteMetadata {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            author: String::new(),
            description: String::new(),
            site_url: "http://localhost".to_string(),
            default_description: "An article".to_string(),
            social: SocialConfig::default(),
        }
    }
}

/// Social handles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    pub twitter: Option<String>,
    pub github: Option<String>,
}
