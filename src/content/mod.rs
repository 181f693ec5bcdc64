//! Content module - turns markdown sources into post records

mod assembler;
mod frontmatter;
pub mod loader;
mod markdown;
mod post;
pub mod reading_time;

pub use assembler::PostAssembler;
pub use frontmatter::{parse_date_string, FrontMatter};
pub use loader::{ContentLoader, IngestReport, PostFailure};
pub use markdown::MarkdownRenderer;
pub use post::{Post, PostContent, PostContext, PostRef, PostRefContent, PostStats};
pub use reading_time::ReadingTime;
