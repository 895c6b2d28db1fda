//! Content module - scans articles, parses front-matter and renders Markdown

mod frontmatter;
pub mod image;
pub mod loader;
mod markdown;
mod post;
pub mod reading_time;
pub mod related;
pub mod slug;
pub mod taxonomy;

use std::path::PathBuf;
use thiserror::Error;

pub use frontmatter::{normalize_date, FrontMatter};
pub use loader::{MarkdownFile, ParseOptions};
pub use markdown::{MarkdownRenderer, TocEntry, COPY_SCRIPT};
pub use post::{BlogPost, PostSummary};
pub use reading_time::ReadingTime;
pub use taxonomy::{CategoryNode, TagCount};

/// Errors raised while reading an article
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid front-matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}
