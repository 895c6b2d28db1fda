//! folio: a Markdown-driven personal blog server
//!
//! Articles live as Markdown files in a content directory. The crate indexes
//! them, renders pages with SEO metadata and JSON-LD, and counts views in a
//! key-value store.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;
pub mod seo;
pub mod server;
pub mod stats;
pub mod templates;
pub mod views;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cache::{ContentIndex, ContentSnapshot};
use content::ParseOptions;

/// The main application
#[derive(Clone)]
pub struct Folio {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown content directory
    pub content_dir: PathBuf,
    /// Static assets directory
    pub static_dir: PathBuf,
}

impl Folio {
    /// Create a new instance from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("no _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create from an already loaded configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let content_dir = base_dir.join(&config.content.dir);
        let static_dir = base_dir.join(&config.server.static_dir);

        Self {
            config,
            base_dir,
            content_dir,
            static_dir,
        }
    }

    /// A content index over the content directory
    pub fn index(&self, watch: bool) -> ContentIndex {
        ContentIndex::new(
            &self.content_dir,
            ParseOptions::from(&self.config.content),
            watch,
        )
    }

    /// Build the index once, for one-shot commands
    pub fn snapshot(&self) -> Arc<ContentSnapshot> {
        self.index(false).ensure()
    }

    /// Today's date (UTC)
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Start the HTTP server
    pub async fn serve(&self, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
        server::start(self, ip, port, watch, open).await
    }

    /// List site content
    pub fn list(&self, content_type: &str) -> Result<()> {
        commands::list::run(self, content_type)
    }
}
