//! Static SEO audit of rendered pages

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use crate::content::reading_time::count_words;
use crate::helpers::strip_html;

lazy_static! {
    static ref TITLE: Regex = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap();
    static ref META_TAG: Regex = Regex::new(r"(?is)<meta\b[^>]*>").unwrap();
    static ref LINK_TAG: Regex = Regex::new(r"(?is)<link\b[^>]*>").unwrap();
    static ref IMG_TAG: Regex = Regex::new(r"(?is)<img\b[^>]*>").unwrap();
    static ref ANCHOR_TAG: Regex = Regex::new(r"(?is)<a\b[^>]*>").unwrap();
    static ref H1_TAG: Regex = Regex::new(r"(?i)<h1\b").unwrap();
    static ref ATTRIBUTE: Regex =
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap();
    static ref BODY: Regex = Regex::new(r"(?is)<body[^>]*>(.*)</body>").unwrap();
    static ref NON_TEXT: Regex =
        Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>").unwrap();
}

const MIN_TITLE_LENGTH: usize = 30;
const MIN_DESCRIPTION_LENGTH: usize = 120;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoMetrics {
    pub title_length: usize,
    pub description_length: usize,
    pub word_count: usize,
    pub images_count: usize,
    pub h1_count: usize,
    pub internal_links_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoReport {
    pub score: u32,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub metrics: SeoMetrics,
}

impl SeoReport {
    /// Human readable report
    pub fn to_markdown(&self, page: &str) -> String {
        let mut out = format!("## {}\n\n### 总体评分: {}/100\n", page, self.score);
        if !self.issues.is_empty() {
            out.push_str("\n### 发现的问题:\n");
            for issue in &self.issues {
                out.push_str(&format!("- {}\n", issue));
            }
        }
        out.push_str("\n### 优化建议:\n");
        for rec in &self.recommendations {
            out.push_str(&format!("- {}\n", rec));
        }
        out.push_str(&format!(
            "\n### 页面指标:\n- 标题长度: {}\n- 描述长度: {}\n- 字数: {}\n- 图片数量: {}\n- H1 数量: {}\n- 站内链接: {}\n",
            self.metrics.title_length,
            self.metrics.description_length,
            self.metrics.word_count,
            self.metrics.images_count,
            self.metrics.h1_count,
            self.metrics.internal_links_count
        ));
        out
    }
}

fn attributes(tag: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(tag)
        .map(|c| {
            let value = c.get(2).or_else(|| c.get(3)).map(|m| m.as_str()).unwrap_or("");
            (c[1].to_ascii_lowercase(), value.to_string())
        })
        .collect()
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Attribute value of the first `<meta name=...>` tag
fn meta_content(html: &str, name: &str) -> Option<String> {
    META_TAG.find_iter(html).find_map(|m| {
        let attrs = attributes(m.as_str());
        if attrs.get("name").map(|n| n.eq_ignore_ascii_case(name)) == Some(true) {
            attrs.get("content").map(|c| decode_entities(c))
        } else {
            None
        }
    })
}

/// Score a rendered HTML page
pub fn audit_html(html: &str, base_url: &str) -> SeoReport {
    let mut issues = Vec::new();
    let mut score: i32 = 100;

    let title = TITLE
        .captures(html)
        .map(|c| decode_entities(c[1].trim()))
        .unwrap_or_default();
    let title_length = title.chars().count();
    if title_length < MIN_TITLE_LENGTH {
        issues.push("标题过短或缺失".to_string());
        score -= 15;
    }

    let description = meta_content(html, "description").unwrap_or_default();
    let description_length = description.chars().count();
    if description_length < MIN_DESCRIPTION_LENGTH {
        issues.push("描述过短或缺失".to_string());
        score -= 10;
    }

    let has_canonical = LINK_TAG.find_iter(html).any(|m| {
        let attrs = attributes(m.as_str());
        attrs.get("rel").map(|r| r.eq_ignore_ascii_case("canonical")) == Some(true)
            && attrs.get("href").map(|h| !h.is_empty()) == Some(true)
    });
    if !has_canonical {
        issues.push("缺少canonical URL".to_string());
        score -= 10;
    }

    let images: Vec<HashMap<String, String>> = IMG_TAG
        .find_iter(html)
        .map(|m| attributes(m.as_str()))
        .collect();
    let mut unoptimized = 0;
    for img in &images {
        if img.get("alt").map(|a| a.trim().is_empty()).unwrap_or(true) {
            unoptimized += 1;
        }
        let lazy = img.get("loading").map(String::as_str) == Some("lazy");
        let priority = img.get("data-priority").map(String::as_str) == Some("true");
        if !lazy && !priority {
            unoptimized += 1;
        }
    }
    if unoptimized > 0 {
        issues.push(format!("{}张图片未优化", unoptimized));
        score -= unoptimized * 2;
    }

    let viewport_ok = meta_content(html, "viewport")
        .map(|v| v.contains("width=device-width"))
        .unwrap_or(false);
    if !viewport_ok {
        issues.push("Viewport配置不当".to_string());
        score -= 15;
    }

    let recommendation = if score >= 90 {
        "SEO表现优秀，继续保持"
    } else if score >= 70 {
        "SEO表现良好，可进一步优化"
    } else {
        "SEO需要重点优化"
    };

    let body = BODY
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(html);
    let text = strip_html(&NON_TEXT.replace_all(body, " "));

    let base = base_url.trim_end_matches('/');
    let internal_links_count = ANCHOR_TAG
        .find_iter(html)
        .filter_map(|m| attributes(m.as_str()).remove("href"))
        .filter(|href| {
            (href.starts_with('/') && !href.starts_with("//"))
                || (!base.is_empty() && href.starts_with(base))
        })
        .count();

    SeoReport {
        score: score.max(0) as u32,
        issues,
        recommendations: vec![recommendation.to_string()],
        metrics: SeoMetrics {
            title_length,
            description_length,
            word_count: count_words(&decode_entities(&text)),
            images_count: images.len(),
            h1_count: H1_TAG.find_iter(html).count(),
            internal_links_count,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_PAGE: &str = r#"<!DOCTYPE html>
<html><head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>深入理解 Vue 3 响应式原理：从 Proxy 到依赖收集的完整实现</title>
<meta name="description" content="本文从源码层面分析 Vue 3 的响应式系统，介绍 Proxy 拦截、依赖收集、触发更新与调度器的工作方式，并对比 Vue 2 的 defineProperty 实现，帮助读者理解其设计取舍与性能表现，同时给出在实际业务中使用 reactive、ref 与 computed 的建议，以及调试响应式问题时常用的排查思路和工具，适合有一定基础的前端开发者阅读参考。">
<link rel="canonical" href="https://itmirror.top/blog/vue">
</head><body>
<h1>Vue 响应式</h1>
<p>Hello world <a href="/blog">博客</a> <a href="https://itmirror.top/about">关于</a> <a href="https://github.com">GitHub</a></p>
<img src="/a.png" alt="diagram" loading="lazy">
<script>var ignored = "a b c d";</script>
</body></html>"#;

    #[test]
    fn test_good_page_scores_full() {
        let report = audit_html(GOOD_PAGE, "https://itmirror.top");
        assert_eq!(report.issues, Vec::<String>::new());
        assert_eq!(report.score, 100);
        assert_eq!(report.recommendations, vec!["SEO表现优秀，继续保持"]);
        assert_eq!(report.metrics.images_count, 1);
        assert_eq!(report.metrics.h1_count, 1);
        assert_eq!(report.metrics.internal_links_count, 2);
        assert!(report.metrics.title_length >= 30);
        assert!(report.metrics.description_length >= 120);
    }

    #[test]
    fn test_bare_page_penalties() {
        let html = r#"<html><head><title>Short</title></head>
<body><img src="a.png"><img src="b.png" alt="b" data-priority="true"></body></html>"#;
        let report = audit_html(html, "");
        // title 15, description 10, canonical 10, images 2 * 2, viewport 15
        assert_eq!(report.score, 46);
        assert_eq!(report.issues.len(), 5);
        assert!(report.issues.contains(&"2张图片未优化".to_string()));
        assert_eq!(report.recommendations, vec!["SEO需要重点优化"]);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let html = "<img>".repeat(40);
        assert_eq!(audit_html(&html, "").score, 0);
    }

    #[test]
    fn test_word_count_ignores_scripts() {
        let report = audit_html(GOOD_PAGE, "https://itmirror.top");
        // "Vue 响应式 Hello world 博客 关于 GitHub"
        assert_eq!(report.metrics.word_count, 11);
    }

    #[test]
    fn test_markdown_report() {
        let report = audit_html(GOOD_PAGE, "https://itmirror.top");
        let md = report.to_markdown("/blog/vue");
        assert!(md.starts_with("## /blog/vue\n\n### 总体评分: 100/100\n"));
        assert!(md.contains("- SEO表现优秀，继续保持"));
    }
}
