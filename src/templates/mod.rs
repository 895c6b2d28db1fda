//! Built-in site templates using the Tera template engine
//!
//! Templates are embedded in the binary; page handlers build the context
//! structs below and hand them to [`TemplateRenderer`].

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{BlogPost, CategoryNode};
use crate::helpers::{category_url, strip_html, tag_url, truncate};

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Pages embed pre-rendered HTML (article body, head tags, JSON-LD);
        // user text is escaped explicitly with `| escape`
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("home.html", include_str!("site/home.html")),
            ("blog.html", include_str!("site/blog.html")),
            ("post.html", include_str!("site/post.html")),
            ("about.html", include_str!("site/about.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            // Partials
            (
                "partials/post_card.html",
                include_str!("site/partials/post_card.html"),
            ),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Context shared by every page: site data, `<head>` tags, JSON-LD and the CSP nonce
pub fn page_context(site: &SiteData, head: &str, json_ld: &str, nonce: &str, nav: &str) -> Context {
    let mut context = Context::new();
    context.insert("site", site);
    context.insert("head", head);
    context.insert("json_ld", json_ld);
    context.insert("nonce", nonce);
    context.insert("nav", nav);
    context
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    Ok(tera::Value::String(truncate(&s, length, Some(&omission))))
}

/// Tera filter: reformat a `YYYY-MM-DD` date
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") else {
        return Ok(tera::Value::String(s));
    };

    let formatted = match format.as_str() {
        // 2024年5月1日
        "LL" => format!("{}年{}月{}日", date.year(), date.month(), date.day()),
        "YYYY/MM/DD" => date.format("%Y/%m/%d").to_string(),
        _ => s,
    };
    Ok(tera::Value::String(formatted))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub name: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub language: String,
    pub theme_color: String,
    pub author_name: String,
    pub job_title: String,
    pub bio: String,
    pub avatar: Option<String>,
    pub email: String,
    pub knows_about: Vec<String>,
    pub social: Vec<SocialLink>,
    pub year: i32,
}

impl SiteData {
    pub fn new(config: &SiteConfig, today: NaiveDate) -> Self {
        let social = &config.author.social;
        let social = [
            ("GitHub", &social.github),
            ("LinkedIn", &social.linkedin),
            ("Twitter", &social.twitter),
        ]
        .into_iter()
        .filter_map(|(name, url)| {
            url.as_ref()
                .filter(|u| !u.trim().is_empty())
                .map(|u| SocialLink {
                    name: name.to_string(),
                    url: u.clone(),
                })
        })
        .collect();

        Self {
            name: config.name.clone(),
            title: config.title.clone(),
            description: config.description.clone(),
            url: config.base_url().to_string(),
            language: config.language.clone(),
            theme_color: config.theme_color.clone(),
            author_name: config.author.name.clone(),
            job_title: config.author.job_title.clone(),
            bio: config.author.bio.clone(),
            avatar: config.author.avatar.clone(),
            email: config.author.email.clone(),
            knows_about: config.author.knows_about.clone(),
            social,
            year: today.year(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SocialLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagLink {
    pub name: String,
    pub url: String,
}

/// A post as shown in listings
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub slug: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub category: String,
    pub category_url: String,
    pub tags: Vec<TagLink>,
    /// Tags beyond the two shown on a card
    pub more_tags: usize,
    pub reading_time: String,
    pub views: Option<u64>,
}

impl PostCard {
    pub fn new(post: &BlogPost, views: Option<u64>) -> Self {
        Self {
            slug: post.slug.clone(),
            url: post.url_path(),
            title: post.title.clone(),
            description: post.description.clone(),
            date: post.date_string(),
            category: post.category.clone(),
            category_url: category_url(&post.category),
            tags: post
                .tags
                .iter()
                .map(|t| TagLink {
                    name: t.clone(),
                    url: tag_url(t),
                })
                .collect(),
            more_tags: post.tags.len().saturating_sub(2),
            reading_time: post.reading_time.clone(),
            views,
        }
    }
}

/// One row of the category sidebar
#[derive(Debug, Clone, Serialize)]
pub struct CategoryItem {
    pub name: String,
    pub full_path: String,
    pub level: usize,
    pub post_count: usize,
    pub url: String,
}

/// Flatten the category tree depth-first for the sidebar
pub fn category_items(tree: &[CategoryNode]) -> Vec<CategoryItem> {
    let mut items = Vec::new();
    flatten(tree, &mut items);
    items
}

fn flatten(nodes: &[CategoryNode], items: &mut Vec<CategoryItem>) {
    for node in nodes {
        items.push(CategoryItem {
            name: node.name.clone(),
            full_path: node.full_path.clone(),
            level: node.level,
            post_count: node.post_count,
            url: category_url(&node.full_path),
        });
        flatten(&node.children, items);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BreadcrumbLink {
    pub name: String,
    pub url: String,
}

impl BreadcrumbLink {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}
