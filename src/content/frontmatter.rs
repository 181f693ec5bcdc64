//! Front-matter parsing and validation

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::PostError;

/// Fence line opening and closing the metadata block
const FENCE: &str = "---";

/// Loosely-typed front-matter, exactly as it appears in the YAML block
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFrontMatter {
    title: Option<String>,
    description: Option<String>,
    date: Option<serde_yaml::Value>,
    published: Option<bool>,
}

/// Validated front-matter of a post
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    /// Posts are drafts unless they opt in
    pub published: bool,
}

impl FrontMatter {
    /// Split a document into its front-matter and the remaining body.
    ///
    /// Dates without an offset are interpreted in `tz` (UTC when `None`).
    pub fn parse(content: &str, tz: Option<Tz>) -> Result<(Self, &str), PostError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let content = content.trim_start();

        let mut lines = content.split_inclusive('\n');
        let first = lines
            .next()
            .ok_or_else(|| PostError::malformed("document is empty"))?;
        if first.trim_end() != FENCE {
            return Err(PostError::malformed("missing front-matter block"));
        }

        let yaml_start = first.len();
        let mut offset = yaml_start;
        for line in lines {
            if line.trim_end() == FENCE {
                let yaml = &content[yaml_start..offset];
                let body = content[offset + line.len()..].trim_start_matches(['\n', '\r']);
                let front_matter = Self::from_yaml(yaml, tz)?;
                return Ok((front_matter, body));
            }
            offset += line.len();
        }

        Err(PostError::malformed("unclosed front-matter block"))
    }

    /// Classify a YAML block as a typed record or a rejection with a reason
    fn from_yaml(yaml: &str, tz: Option<Tz>) -> Result<Self, PostError> {
        if yaml.trim().is_empty() {
            return Err(PostError::malformed("front-matter block is empty"));
        }

        let raw: RawFrontMatter =
            serde_yaml::from_str(yaml).map_err(|e| PostError::malformed(e.to_string()))?;

        let title = raw
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PostError::malformed("`title` is required"))?;

        let date_value = raw
            .date
            .ok_or_else(|| PostError::malformed("`date` is required"))?;
        let date_text = scalar_to_string(&date_value)
            .ok_or_else(|| PostError::malformed("`date` must be a scalar"))?;
        let date = parse_date_string(&date_text, tz)
            .ok_or(PostError::InvalidDate { value: date_text })?;

        let description = raw
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            title,
            description,
            date,
            published: raw.published.unwrap_or(false),
        })
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a date string in the formats authors actually write
pub fn parse_date_string(s: &str, tz: Option<Tz>) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let offset_formats = ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%dT%H:%M:%S%.f%z"];
    for fmt in offset_formats {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(dt, tz);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return localize(d.and_hms_opt(0, 0, 0)?, tz);
        }
    }

    None
}

fn localize(naive: NaiveDateTime, tz: Option<Tz>) -> Option<DateTime<Utc>> {
    let Some(tz) = tz else {
        return Some(Utc.from_utc_datetime(&naive));
    };
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        // Skipped by a spring-forward gap: read it at the offset in force before the gap
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(naive - Duration::days(1)))
                .fix();
            let utc = naive - Duration::seconds(i64::from(before.local_minus_utc()));
            Some(Utc.from_utc_datetime(&utc))
        }
    }
}
