//! JSON-LD structured data builders

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::SiteConfig;
use crate::content::BlogPost;
use crate::helpers::{escape_script, full_url_for, html_escape};

const SCHEMA_CONTEXT: &str = "https://schema.org";

/// One level of a breadcrumb trail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreadcrumbItem {
    pub name: String,
    /// Absolute or site-relative URL; empty for the current page
    pub url: String,
}

impl BreadcrumbItem {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A question and answer pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

fn favicon_url(config: &SiteConfig) -> String {
    full_url_for(config, "/favicon.svg")
}

pub fn person(config: &SiteConfig) -> Value {
    let author = &config.author;
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Person",
        "name": author.name,
        "url": config.base_url(),
        "email": author.email,
        "jobTitle": author.job_title,
        "description": author.bio,
        "worksFor": {
            "@type": "Organization",
            "name": author.employer,
        },
        "knowsAbout": author.knows_about,
        "address": {
            "@type": "PostalAddress",
            "addressLocality": author.locality,
            "addressCountry": author.country,
        },
        "sameAs": author.social.urls(),
    })
}

pub fn article(config: &SiteConfig, post: &BlogPost) -> Value {
    let base = config.base_url();
    let image = post
        .image
        .as_deref()
        .unwrap_or(config.seo.og_image.as_str());
    let date = post.date_string();

    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BlogPosting",
        "headline": post.title,
        "description": post.description,
        "image": {
            "@type": "ImageObject",
            "url": full_url_for(config, image),
            "width": 1200,
            "height": 630,
        },
        "author": {
            "@type": "Person",
            "name": config.author.name,
            "url": base,
        },
        "publisher": {
            "@type": "Organization",
            "name": config.name,
            "logo": {
                "@type": "ImageObject",
                "url": favicon_url(config),
                "width": 60,
                "height": 60,
            },
        },
        "datePublished": date,
        "dateModified": date,
        "mainEntityOfPage": {
            "@type": "WebPage",
            "@id": format!("{}{}", base, post.url_path()),
        },
        "articleSection": post.category,
        "keywords": post.tags.join(", "),
        "timeRequired": post.reading_time,
        "inLanguage": config.language,
        "isAccessibleForFree": true,
    })
}

pub fn website(config: &SiteConfig) -> Value {
    let base = config.base_url();
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "WebSite",
        "name": config.name,
        "description": config.description,
        "url": base,
        "author": {
            "@type": "Person",
            "name": config.author.name,
        },
        "potentialAction": {
            "@type": "SearchAction",
            "target": {
                "@type": "EntryPoint",
                "urlTemplate": format!("{}/blog?search={{search_term_string}}", base),
            },
            "query-input": "required name=search_term_string",
        },
        "sameAs": config.author.social.urls(),
        "inLanguage": config.language,
    })
}

pub fn blog(config: &SiteConfig) -> Value {
    let base = config.base_url();
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Blog",
        "name": format!("{} - 博客", config.name),
        "description": config.description,
        "url": format!("{}/blog", base),
        "author": {
            "@type": "Person",
            "name": config.author.name,
            "url": base,
        },
        "publisher": {
            "@type": "Organization",
            "name": config.name,
            "logo": {
                "@type": "ImageObject",
                "url": favicon_url(config),
            },
        },
        "inLanguage": config.language,
    })
}

pub fn organization(config: &SiteConfig) -> Value {
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Organization",
        "name": config.name,
        "url": config.base_url(),
        "logo": {
            "@type": "ImageObject",
            "url": favicon_url(config),
        },
        "founder": {
            "@type": "Person",
            "name": config.author.name,
        },
        "sameAs": config.author.social.urls(),
    })
}

/// Breadcrumb list; item URLs must be absolute so relative ones are resolved
pub fn breadcrumb(config: &SiteConfig, items: &[BreadcrumbItem]) -> Value {
    let base = url::Url::parse(config.base_url()).ok();
    let elements: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut element = json!({
                "@type": "ListItem",
                "position": index + 1,
                "name": item.name,
            });
            if let Some(url) = absolute_url(base.as_ref(), config, &item.url) {
                element["item"] = Value::String(url);
            }
            element
        })
        .collect();

    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BreadcrumbList",
        "itemListElement": elements,
    })
}

fn absolute_url(base: Option<&url::Url>, config: &SiteConfig, url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return Some(url.to_string());
    }
    let resolved = base
        .and_then(|b| b.join(url).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| full_url_for(config, url));
    Some(resolved)
}

pub fn faq(items: &[FaqItem]) -> Value {
    let entities: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "@type": "Question",
                "name": item.question,
                "acceptedAnswer": {
                    "@type": "Answer",
                    "text": item.answer,
                },
            })
        })
        .collect();

    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "FAQPage",
        "mainEntity": entities,
    })
}

pub fn software_app(config: &SiteConfig, name: &str, description: &str, url: &str) -> Value {
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "SoftwareApplication",
        "name": name,
        "description": description,
        "url": url,
        "author": {
            "@type": "Person",
            "name": config.author.name,
        },
        "applicationCategory": "WebApplication",
        "operatingSystem": "Web",
        "offers": {
            "@type": "Offer",
            "price": "0",
            "priceCurrency": "CNY",
        },
    })
}

/// Embed a JSON-LD document in a script element
pub fn script_tag(value: &Value, nonce: Option<&str>) -> String {
    let nonce_attr = nonce
        .map(|n| format!(r#" nonce="{}""#, html_escape(n)))
        .unwrap_or_default();
    format!(
        r#"<script type="application/ld+json"{}>{}</script>"#,
        nonce_attr,
        escape_script(&value.to_string())
    )
}
