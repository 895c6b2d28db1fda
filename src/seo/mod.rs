//! Search engine metadata: head tags, JSON-LD, sitemap, robots and audits

pub mod audit;
pub mod manifest;
pub mod meta;
pub mod robots;
pub mod sitemap;
pub mod structured;

pub use audit::{audit_html, SeoMetrics, SeoReport};
pub use meta::{blog_post_seo, category_seo, tag_seo, PageKind, PageMeta, SeoInput};
pub use sitemap::{render_sitemap, sitemap_entries, ChangeFreq, SitemapEntry};
