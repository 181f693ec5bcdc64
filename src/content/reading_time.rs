//! Reading-time estimate

use serde::{Deserialize, Serialize};

/// Default reading speed in words per minute
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 250;

/// Estimated reading time of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingTime {
    /// Human-readable form, e.g. "4 min read"
    pub text: String,
    pub minutes: f64,
    pub words: usize,
}

impl ReadingTime {
    /// Estimate reading time of `raw` at `words_per_minute`.
    ///
    /// Words are whitespace-delimited tokens of the full text, front-matter
    /// included.
    pub fn estimate(raw: &str, words_per_minute: u32) -> Self {
        let words = raw.split_whitespace().count();
        let speed = words_per_minute.max(1) as f64;
        let minutes = words as f64 / speed;

        // Round to hundredths first so 2.0000001 still reads as "2 min read"
        let displayed = ((minutes * 100.0).round() / 100.0).ceil() as u64;

        Self {
            text: format!("{} min read", displayed),
            minutes,
            words,
        }
    }
}
