//! Page metadata (`<title>`, description, Open Graph, Twitter cards)

use indexmap::IndexSet;
use url::form_urlencoded;

use crate::config::SiteConfig;
use crate::content::BlogPost;
use crate::helpers::{encode_uri_component, full_url_for, html_escape, meta_name, meta_property};

/// Size advertised for Open Graph images
const OG_IMAGE_WIDTH: u32 = 1200;
const OG_IMAGE_HEIGHT: u32 = 630;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageKind {
    #[default]
    Website,
    Article,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Website => "website",
            PageKind::Article => "article",
        }
    }
}

/// What a page knows about itself
#[derive(Debug, Clone)]
pub struct SeoInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Path relative to the site root, e.g. `/blog/rust/ownership`
    pub path: String,
    pub kind: PageKind,
    pub published_time: Option<String>,
    pub modified_time: Option<String>,
    pub tags: Vec<String>,
    pub noindex: bool,
    pub category: Option<String>,
    /// Append ` | {site name}` to the title
    pub with_site_name_suffix: bool,
}

impl Default for SeoInput {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            image: None,
            path: String::new(),
            kind: PageKind::Website,
            published_time: None,
            modified_time: None,
            tags: Vec::new(),
            noindex: false,
            category: None,
            with_site_name_suffix: true,
        }
    }
}

/// Fully resolved metadata of a page
#[derive(Debug, Clone, PartialEq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub canonical: String,
    /// Absolute Open Graph image URL
    pub image: String,
    pub site_name: String,
    pub locale: String,
    pub kind: PageKind,
    pub robots: String,
    pub googlebot: String,
    pub published_time: Option<String>,
    pub modified_time: Option<String>,
    pub article_tags: Vec<String>,
    pub verification: Option<String>,
    /// Extra `(key, value)` tags in output order
    pub other: Vec<(String, String)>,
}

impl PageMeta {
    pub fn build(config: &SiteConfig, input: &SeoInput) -> Self {
        let title = match (&input.title, input.with_site_name_suffix) {
            (Some(t), true) => format!("{} | {}", t, config.name),
            (Some(t), false) => t.clone(),
            (None, _) => config.title.clone(),
        };
        let description = input
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| config.description.clone());

        let image = match (&input.image, &input.title, &config.seo.og_endpoint) {
            (Some(image), _, _) => image.clone(),
            (None, Some(page_title), Some(endpoint)) => {
                let mut params = form_urlencoded::Serializer::new(String::new());
                params.append_pair("title", page_title);
                if let Some(category) = &input.category {
                    params.append_pair("badge", category);
                }
                format!("{}?{}", endpoint, params.finish())
            }
            _ => config.seo.og_image.clone(),
        };

        let robots_flags = if input.noindex {
            "noindex, nofollow"
        } else {
            "index, follow"
        };

        let is_article = input.kind == PageKind::Article;
        let mut other = Vec::new();
        if is_article {
            other.push(("article:author".to_string(), config.author.name.clone()));
            if let Some(category) = &input.category {
                other.push(("article:section".to_string(), category.clone()));
            }
        }
        other.push(("og:locale:alternate".to_string(), "en_US".to_string()));
        other.push(("apple-mobile-web-app-capable".to_string(), "yes".to_string()));
        other.push((
            "apple-mobile-web-app-status-bar-style".to_string(),
            "default".to_string(),
        ));
        other.push(("format-detection".to_string(), "telephone=no".to_string()));
        other.push(("msapplication-tap-highlight".to_string(), "no".to_string()));
        other.push(("theme-color".to_string(), config.theme_color.clone()));

        let has_article_times = is_article && input.published_time.is_some();

        Self {
            title,
            description,
            keywords: page_keywords(config, &input.path, &input.tags),
            author: config.author.name.clone(),
            canonical: format!("{}{}", config.base_url(), input.path),
            image: full_url_for(config, &image),
            site_name: config.name.clone(),
            locale: config.locale.clone(),
            kind: input.kind,
            robots: robots_flags.to_string(),
            googlebot: format!(
                "{}, max-video-preview:-1, max-image-preview:large, max-snippet:-1",
                robots_flags
            ),
            published_time: input.published_time.clone().filter(|_| has_article_times),
            modified_time: input.modified_time.clone().filter(|_| has_article_times),
            article_tags: if has_article_times {
                input.tags.clone()
            } else {
                Vec::new()
            },
            verification: config.seo.google_verification.clone(),
            other,
        }
    }

    /// Render the tags that belong in `<head>`
    pub fn to_html(&self) -> String {
        let mut tags = vec![
            format!("<title>{}</title>", html_escape(&self.title)),
            meta_name("description", &self.description),
        ];
        if !self.keywords.is_empty() {
            tags.push(meta_name("keywords", &self.keywords.join(", ")));
        }
        tags.push(meta_name("author", &self.author));
        tags.push(meta_name("creator", &self.author));
        tags.push(meta_name("publisher", &self.author));
        tags.push(format!(
            r#"<link rel="canonical" href="{}">"#,
            html_escape(&self.canonical)
        ));
        tags.push(r#"<link rel="icon" href="/favicon.svg">"#.to_string());
        tags.push(r#"<link rel="apple-touch-icon" href="/favicon.svg">"#.to_string());
        tags.push(meta_name("robots", &self.robots));
        tags.push(meta_name("googlebot", &self.googlebot));
        if let Some(code) = &self.verification {
            tags.push(meta_name("google-site-verification", code));
        }

        tags.push(meta_property("og:title", &self.title));
        tags.push(meta_property("og:description", &self.description));
        tags.push(meta_property("og:url", &self.canonical));
        tags.push(meta_property("og:site_name", &self.site_name));
        tags.push(meta_property("og:locale", &self.locale));
        tags.push(meta_property("og:image", &self.image));
        tags.push(meta_property("og:image:width", &OG_IMAGE_WIDTH.to_string()));
        tags.push(meta_property("og:image:height", &OG_IMAGE_HEIGHT.to_string()));
        tags.push(meta_property("og:image:alt", &self.title));
        tags.push(meta_property("og:type", self.kind.as_str()));
        if let Some(time) = &self.published_time {
            tags.push(meta_property("article:published_time", time));
        }
        if let Some(time) = &self.modified_time {
            tags.push(meta_property("article:modified_time", time));
        }
        for tag in &self.article_tags {
            tags.push(meta_property("article:tag", tag));
        }

        tags.push(meta_name("twitter:card", "summary_large_image"));
        tags.push(meta_name("twitter:title", &self.title));
        tags.push(meta_name("twitter:description", &self.description));
        tags.push(meta_name("twitter:image", &self.image));

        for (key, value) in &self.other {
            if key.starts_with("og:") || key.starts_with("article:") {
                tags.push(meta_property(key, value));
            } else {
                tags.push(meta_name(key, value));
            }
        }

        tags.join("\n")
    }
}

/// Site keywords, page-specific extras and tags, deduplicated in order
fn page_keywords(config: &SiteConfig, path: &str, tags: &[String]) -> Vec<String> {
    let mut keywords: IndexSet<String> = config.seo.keywords.iter().cloned().collect();

    let extras: &[String] = if path.contains("/blog/") {
        &config.seo.blog_keywords
    } else if path == "/about" {
        &config.seo.about_keywords
    } else if path == "/" {
        &config.seo.home_keywords
    } else {
        &[]
    };
    keywords.extend(extras.iter().cloned());
    keywords.extend(tags.iter().cloned());

    keywords.into_iter().collect()
}

/// Metadata of an article page
pub fn blog_post_seo(config: &SiteConfig, post: &BlogPost) -> PageMeta {
    PageMeta::build(
        config,
        &SeoInput {
            title: Some(post.title.clone()),
            description: Some(post.description.clone()),
            image: post.image.clone(),
            path: post.url_path(),
            kind: PageKind::Article,
            published_time: Some(post.date_string()),
            tags: post.tags.clone(),
            category: Some(post.category.clone()),
            with_site_name_suffix: false,
            ..Default::default()
        },
    )
}

/// Metadata of a listing filtered by category
pub fn category_seo(config: &SiteConfig, category: &str, post_count: usize) -> PageMeta {
    PageMeta::build(
        config,
        &SeoInput {
            title: Some(format!("{}分类文章", category)),
            description: Some(format!(
                "查看{}分类下的所有技术文章，共{}篇精选内容",
                category, post_count
            )),
            path: format!("/blog?category={}", encode_uri_component(category)),
            tags: vec![
                category.to_string(),
                "技术文章".to_string(),
                "分类".to_string(),
            ],
            ..Default::default()
        },
    )
}

/// Metadata of a listing filtered by tag
pub fn tag_seo(config: &SiteConfig, tag: &str, post_count: usize) -> PageMeta {
    PageMeta::build(
        config,
        &SeoInput {
            title: Some(format!("{}标签文章", tag)),
            description: Some(format!(
                "查看包含{}标签的所有技术文章，共{}篇相关内容",
                tag, post_count
            )),
            path: format!("/blog?tag={}", encode_uri_component(tag)),
            tags: vec![tag.to_string(), "技术文章".to_string(), "标签".to_string()],
            ..Default::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.name = "ITMirror".to_string();
        config.title = "ITMirror - 前端博客".to_string();
        config.description = "Site description".to_string();
        config.url = "https://itmirror.top".to_string();
        config.author.name = "Ke".to_string();
        config.seo.keywords = vec!["前端".to_string(), "博客".to_string()];
        config
    }

    fn post() -> BlogPost {
        BlogPost {
            slug: "前端/vue/reactivity".to_string(),
            title: "Vue 响应式".to_string(),
            description: "How reactivity works".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            category: "前端/Vue".to_string(),
            tags: vec!["vue".to_string(), "前端".to_string()],
            image: None,
            reading_time: "3 min read".to_string(),
            content: String::new(),
            relative_path: PathBuf::from("前端/Vue/reactivity.md"),
        }
    }

    #[test]
    fn test_defaults_without_title() {
        let meta = PageMeta::build(&config(), &SeoInput::default());
        assert_eq!(meta.title, "ITMirror - 前端博客");
        assert_eq!(meta.description, "Site description");
        assert_eq!(meta.image, "https://itmirror.top/og-default.svg");
        assert_eq!(meta.canonical, "https://itmirror.top");
        assert_eq!(meta.robots, "index, follow");
    }

    #[test]
    fn test_title_suffix_and_home_keywords() {
        let meta = PageMeta::build(
            &config(),
            &SeoInput {
                title: Some("首页".to_string()),
                path: "/".to_string(),
                noindex: true,
                ..Default::default()
            },
        );
        assert_eq!(meta.title, "首页 | ITMirror");
        assert_eq!(
            meta.keywords,
            vec!["前端", "博客", "个人网站", "技术分享", "前端开发者"]
        );
        assert_eq!(meta.robots, "noindex, nofollow");
        assert!(meta.googlebot.starts_with("noindex, nofollow, max-video-preview:-1"));
    }

    #[test]
    fn test_blog_post_seo() {
        let meta = blog_post_seo(&config(), &post());
        assert_eq!(meta.title, "Vue 响应式");
        assert_eq!(meta.kind, PageKind::Article);
        assert_eq!(meta.canonical, "https://itmirror.top/blog/前端/vue/reactivity");
        assert_eq!(meta.published_time.as_deref(), Some("2024-05-01"));
        assert_eq!(meta.article_tags, vec!["vue", "前端"]);
        // "博客" and "前端" are not repeated
        assert_eq!(
            meta.keywords,
            vec!["前端", "博客", "前端开发", "编程教程", "Web开发经验", "vue"]
        );
        assert!(meta
            .other
            .contains(&("article:section".to_string(), "前端/Vue".to_string())));
    }

    #[test]
    fn test_dynamic_og_image() {
        let mut config = config();
        config.seo.og_endpoint = Some("/api/og".to_string());
        let meta = blog_post_seo(&config, &post());
        assert_eq!(
            meta.image,
            "https://itmirror.top/api/og?title=Vue+%E5%93%8D%E5%BA%94%E5%BC%8F&badge=%E5%89%8D%E7%AB%AF%2FVue"
        );

        let mut with_cover = post();
        with_cover.image = Some("https://cdn.example.com/cover.png".to_string());
        assert_eq!(
            blog_post_seo(&config, &with_cover).image,
            "https://cdn.example.com/cover.png"
        );
    }

    #[test]
    fn test_category_and_tag_seo() {
        let meta = category_seo(&config(), "前端/Vue", 4);
        assert_eq!(meta.title, "前端/Vue分类文章 | ITMirror");
        assert_eq!(meta.description, "查看前端/Vue分类下的所有技术文章，共4篇精选内容");
        assert_eq!(
            meta.canonical,
            "https://itmirror.top/blog?category=%E5%89%8D%E7%AB%AF%2FVue"
        );

        let meta = tag_seo(&config(), "rust", 2);
        assert_eq!(meta.title, "rust标签文章 | ITMirror");
        assert!(meta.keywords.contains(&"标签".to_string()));
    }

    #[test]
    fn test_to_html_escapes() {
        let meta = PageMeta::build(
            &config(),
            &SeoInput {
                title: Some(r#"A "quoted" <title>"#.to_string()),
                ..Default::default()
            },
        );
        let html = meta.to_html();
        assert!(html.contains("<title>A &quot;quoted&quot; &lt;title&gt; | ITMirror</title>"));
        assert!(html.contains(r#"<link rel="canonical" href="https://itmirror.top">"#));
        assert!(html.contains(r#"<meta property="og:type" content="website">"#));
        assert!(html.contains(r#"<meta name="twitter:card" content="summary_large_image">"#));
        assert!(html.contains(r#"<meta property="og:locale:alternate" content="en_US">"#));
        assert!(!html.contains("article:published_time"));
    }
}
