//! Article models

use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

/// An article indexed from the content directory
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    /// URL identifier, e.g. `前端/vue/reactivity`
    pub slug: String,

    pub title: String,

    pub description: String,

    /// Publication day
    pub date: NaiveDate,

    /// `/`-separated category path
    pub category: String,

    pub tags: Vec<String>,

    /// Cover image path or URL
    pub image: Option<String>,

    /// Display form such as `5 min read`
    pub reading_time: String,

    /// Markdown body without front-matter
    #[serde(skip)]
    pub content: String,

    /// Path relative to the content directory
    pub relative_path: PathBuf,
}

impl BlogPost {
    /// Path of the article page
    pub fn url_path(&self) -> String {
        format!("/blog/{}", self.slug)
    }

    /// `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            slug: self.slug.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
        }
    }
}

/// The fields exposed by the article list API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub category: String,
}
