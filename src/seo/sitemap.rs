//! sitemap.xml generation

use chrono::NaiveDate;
use serde::Serialize;

use crate::cache::ContentSnapshot;
use crate::config::SiteConfig;
use crate::helpers::{encode_uri, encode_uri_component};

/// Tags need at least this many posts to get a sitemap entry
const MIN_TAG_POSTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: NaiveDate,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

impl SitemapEntry {
    fn new(loc: String, lastmod: NaiveDate, changefreq: ChangeFreq, priority: f32) -> Self {
        Self {
            loc,
            lastmod,
            changefreq,
            priority,
        }
    }
}

/// Static pages, posts, categories and popular tags
pub fn sitemap_entries(
    config: &SiteConfig,
    snapshot: &ContentSnapshot,
    today: NaiveDate,
) -> Vec<SitemapEntry> {
    let base = config.base_url();
    let posts = snapshot.all_posts();

    let mut entries = vec![
        SitemapEntry::new(base.to_string(), today, ChangeFreq::Weekly, 1.0),
        SitemapEntry::new(format!("{}/about", base), today, ChangeFreq::Monthly, 0.8),
        SitemapEntry::new(
            format!("{}/blog", base),
            latest(posts.iter().map(|p| p.date), today),
            ChangeFreq::Daily,
            0.9,
        ),
    ];

    entries.extend(posts.iter().map(|post| {
        SitemapEntry::new(
            encode_uri(&format!("{}{}", base, post.url_path())),
            post.date,
            ChangeFreq::Monthly,
            0.7,
        )
    }));

    // Posts are sorted newest first, so the first match is the latest
    for category in snapshot.categories() {
        let lastmod = latest(
            posts
                .iter()
                .filter(|p| &p.category == category)
                .map(|p| p.date),
            today,
        );
        entries.push(SitemapEntry::new(
            format!("{}/blog?category={}", base, encode_uri_component(category)),
            lastmod,
            ChangeFreq::Weekly,
            0.6,
        ));
    }

    for tag in snapshot.tags() {
        let tagged: Vec<NaiveDate> = posts
            .iter()
            .filter(|p| p.tags.contains(tag))
            .map(|p| p.date)
            .collect();
        if tagged.len() < MIN_TAG_POSTS {
            continue;
        }
        entries.push(SitemapEntry::new(
            format!("{}/blog?tag={}", base, encode_uri_component(tag)),
            tagged[0],
            ChangeFreq::Weekly,
            0.5,
        ));
    }

    entries
}

fn latest(mut dates: impl Iterator<Item = NaiveDate>, fallback: NaiveDate) -> NaiveDate {
    dates.next().unwrap_or(fallback)
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Render entries as a sitemaps.org document
pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str(&format!(
            "<url>\n<loc>{}</loc>\n<lastmod>{}</lastmod>\n<changefreq>{}</changefreq>\n<priority>{:.1}</priority>\n</url>\n",
            xml_escape(&entry.loc),
            entry.lastmod.format("%Y-%m-%d"),
            entry.changefreq.as_str(),
            entry.priority
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::loader::scan_markdown_files;
    use crate::content::ParseOptions;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn snapshot() -> ContentSnapshot {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "前端/vue.md",
            "---\ndate: 2024-05-01\ntags: [vue, js]\n---\n",
        );
        write(dir.path(), "前端/react.md", "---\ndate: 2024-03-01\ntags: [js]\n---\n");
        write(dir.path(), "Rust/own.md", "---\ndate: 2023-01-01\ntags: [rust]\n---\n");
        ContentSnapshot::build(scan_markdown_files(dir.path()), &ParseOptions::default())
    }

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.url = "https://itmirror.top".to_string();
        config
    }

    #[test]
    fn test_sitemap_entries() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let entries = sitemap_entries(&config(), &snapshot(), today);
        let locs: Vec<&str> = entries.iter().map(|e| e.loc.as_str()).collect();

        assert_eq!(
            locs,
            vec![
                "https://itmirror.top",
                "https://itmirror.top/about",
                "https://itmirror.top/blog",
                "https://itmirror.top/blog/%E5%89%8D%E7%AB%AF/vue",
                "https://itmirror.top/blog/%E5%89%8D%E7%AB%AF/react",
                "https://itmirror.top/blog/rust/own",
                "https://itmirror.top/blog?category=%E5%89%8D%E7%AB%AF",
                "https://itmirror.top/blog?category=Rust",
                "https://itmirror.top/blog?tag=js",
            ]
        );

        assert_eq!(entries[0].lastmod, today);
        assert_eq!(entries[2].lastmod, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(entries[2].changefreq, ChangeFreq::Daily);
        assert_eq!(entries[7].lastmod, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(entries[8].priority, 0.5);
    }

    #[test]
    fn test_empty_index_uses_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let entries = sitemap_entries(&config(), &ContentSnapshot::default(), today);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].lastmod, today);
    }

    #[test]
    fn test_render_sitemap() {
        let entries = vec![SitemapEntry::new(
            "https://itmirror.top/blog?tag=a&b".to_string(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            ChangeFreq::Weekly,
            0.5,
        )];
        let xml = render_sitemap(&entries);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<loc>https://itmirror.top/blog?tag=a&amp;b</loc>"));
        assert!(xml.contains("<lastmod>2024-01-02</lastmod>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.contains("<priority>0.5</priority>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }
}
