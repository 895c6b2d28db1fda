//! robots.txt generation

use crate::config::SiteConfig;

/// Paths and asset patterns hidden from general crawlers
const GENERAL_DISALLOW: &[&str] = &[
    "/private/", "/admin/", "/api/", "/_next/", "/temp/", "/_vercel/", "/static/", "*.woff",
    "*.woff2", "*.ttf", "*.eot", "*.css", "*.js", "*.map", "*.json", "*.ico", "*.png", "*.jpg",
    "*.jpeg", "*.gif", "*.svg", "*.webp", "*.avif",
];

const GOOGLEBOT_DISALLOW: &[&str] = &[
    "/private/", "/admin/", "/api/", "/_next/", "/_vercel/", "/static/", "*.woff", "*.woff2",
    "*.ttf", "*.eot", "*.css", "*.js", "*.map",
];

const BINGBOT_DISALLOW: &[&str] = &["/private/", "/admin/", "/api/"];

/// A `User-agent` group
#[derive(Debug, Clone, PartialEq)]
pub struct RobotsRule {
    pub user_agent: &'static str,
    pub allow: Vec<&'static str>,
    pub disallow: Vec<&'static str>,
    pub crawl_delay: Option<u32>,
}

impl RobotsRule {
    fn render(&self, out: &mut String) {
        out.push_str(&format!("User-agent: {}\n", self.user_agent));
        for path in &self.allow {
            out.push_str(&format!("Allow: {}\n", path));
        }
        for path in &self.disallow {
            out.push_str(&format!("Disallow: {}\n", path));
        }
        if let Some(delay) = self.crawl_delay {
            out.push_str(&format!("Crawl-delay: {}\n", delay));
        }
    }
}

pub fn default_rules() -> Vec<RobotsRule> {
    vec![
        RobotsRule {
            user_agent: "*",
            allow: vec!["/"],
            disallow: GENERAL_DISALLOW.to_vec(),
            crawl_delay: Some(1),
        },
        RobotsRule {
            user_agent: "Googlebot",
            allow: vec!["/"],
            disallow: GOOGLEBOT_DISALLOW.to_vec(),
            crawl_delay: Some(0),
        },
        RobotsRule {
            user_agent: "Bingbot",
            allow: vec!["/"],
            disallow: BINGBOT_DISALLOW.to_vec(),
            crawl_delay: None,
        },
    ]
}

/// Whether a request host is the `www.` alias of the site
pub fn is_www_host(host: &str) -> bool {
    host.to_ascii_lowercase().starts_with("www.")
}

/// Render robots.txt for the host the request was made on
pub fn robots_txt(config: &SiteConfig, request_host: Option<&str>) -> String {
    if request_host.map(is_www_host).unwrap_or(false) {
        return "User-agent: *\nDisallow: /\n".to_string();
    }

    let mut out = String::new();
    for rule in default_rules() {
        rule.render(&mut out);
        out.push('\n');
    }
    out.push_str(&format!("Host: {}\n", config.base_url()));
    out.push_str(&format!("Sitemap: {}/sitemap.xml\n", config.base_url()));
    out
}
