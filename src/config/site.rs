//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Runtime environment, mirrors the production/development split of the deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub name: String,
    pub title: String,
    pub description: String,
    pub url: String,
    /// Open Graph locale, e.g. `zh_CN`
    pub locale: String,
    /// Content language used in JSON-LD, e.g. `zh-CN`
    pub language: String,
    pub theme_color: String,
    pub environment: Environment,

    #[serde(default)]
    pub author: AuthorConfig,
    #[serde(default)]
    pub seo: SeoConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub views: ViewsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Folio".to_string(),
            title: "Folio - Personal Blog".to_string(),
            description: "Notes on web development, tooling and performance.".to_string(),
            url: "http://localhost:3000".to_string(),
            locale: "zh_CN".to_string(),
            language: "zh-CN".to_string(),
            theme_color: "#4F46E5".to_string(),
            environment: Environment::Development,

            author: AuthorConfig::default(),
            seo: SeoConfig::default(),
            content: ContentConfig::default(),
            views: ViewsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("FOLIO_ENV").and_then(|v| Environment::parse(&v)) {
            self.environment = env;
        }
        if lookup("CONTENT_WATCH").as_deref() == Some("1") {
            self.content.watch = Some(true);
        }
        if let Some(url) = lookup("REDIS_URL").filter(|v| !v.trim().is_empty()) {
            self.views.redis_url = Some(url);
        }
        if lookup("ALLOW_RESET_VIEWS").as_deref() == Some("true") {
            self.views.allow_reset = true;
        }
        if let Some(url) = lookup("SITE_URL").filter(|v| !v.trim().is_empty()) {
            self.url = url;
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Whether the content index rescans the content tree on every query.
    ///
    /// Development watches by default; production builds the index once unless
    /// watching is switched on explicitly.
    pub fn watch_content(&self) -> bool {
        self.content.watch.unwrap_or(!self.is_production())
    }

    /// Site URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Author profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorConfig {
    pub name: String,
    pub email: String,
    pub bio: String,
    pub avatar: Option<String>,
    pub job_title: String,
    pub employer: String,
    pub locality: String,
    pub country: String,
    #[serde(default)]
    pub knows_about: Vec<String>,
    /// First day of work, `YYYY-MM-DD`
    pub career_start: Option<String>,
    #[serde(default)]
    pub social: SocialLinks,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            name: "Folio Author".to_string(),
            email: String::new(),
            bio: String::new(),
            avatar: None,
            job_title: "前端工程师".to_string(),
            employer: "独立开发者".to_string(),
            locality: String::new(),
            country: "CN".to_string(),
            knows_about: Vec::new(),
            career_start: None,
            social: SocialLinks::default(),
        }
    }
}

/// Social profile links
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
}

impl SocialLinks {
    /// Configured links in a stable order, empty entries skipped
    pub fn urls(&self) -> Vec<String> {
        [&self.github, &self.linkedin, &self.twitter]
            .into_iter()
            .flatten()
            .filter(|u| !u.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// SEO defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoConfig {
    pub keywords: Vec<String>,
    pub blog_keywords: Vec<String>,
    pub about_keywords: Vec<String>,
    pub home_keywords: Vec<String>,
    /// Fallback Open Graph image path
    pub og_image: String,
    /// Endpoint that renders dynamic Open Graph images, e.g. `/api/og`
    pub og_endpoint: Option<String>,
    pub google_verification: Option<String>,
}

impl Default for SeoConfig {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            blog_keywords: vec![
                "博客".to_string(),
                "前端开发".to_string(),
                "编程教程".to_string(),
                "Web开发经验".to_string(),
            ],
            about_keywords: vec![
                "前端工程师简历".to_string(),
                "个人简介".to_string(),
                "技术背景".to_string(),
            ],
            home_keywords: vec![
                "个人网站".to_string(),
                "技术分享".to_string(),
                "前端开发者".to_string(),
            ],
            og_image: "/og-default.svg".to_string(),
            og_endpoint: None,
            google_verification: None,
        }
    }
}

/// Content directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub dir: String,
    /// `None` means "decide from the environment"
    pub watch: Option<bool>,
    pub fallback_category: String,
    pub fallback_description: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: "content".to_string(),
            watch: None,
            fallback_category: "其他".to_string(),
            fallback_description: "暂无描述".to_string(),
        }
    }
}

/// View counter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    pub redis_url: Option<String>,
    pub throttle_seconds: u64,
    /// IANA timezone used for daily buckets
    pub timezone: String,
    pub allow_reset: bool,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            throttle_seconds: 60,
            timezone: "UTC".to_string(),
            allow_reset: false,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
    /// Directory with favicon, default OG image and other static assets
    pub static_dir: String,
    #[serde(default)]
    pub script_sources: Vec<String>,
    #[serde(default)]
    pub connect_sources: Vec<String>,
    #[serde(default)]
    pub frame_sources: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 3000,
            static_dir: "public".to_string(),
            script_sources: Vec::new(),
            connect_sources: Vec::new(),
            frame_sources: Vec::new(),
        }
    }
}
