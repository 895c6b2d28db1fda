//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use super::ContentError;

/// Accepts a list of scalars or a single string; anything else becomes an empty list
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_yaml::Value::String(s) => vec![s],
        serde_yaml::Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        _ => Vec::new(),
    })
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Front-matter data from an article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Kept raw; see [`normalize_date`]
    pub date: Option<serde_yaml::Value>,
    pub category: Option<String>,
    #[serde(deserialize_with = "string_or_vec", default)]
    pub tags: Vec<String>,
    pub image: Option<String>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), ContentError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let Some(rest) = strip_delimiter_line(content) else {
            return Ok((FrontMatter::default(), content));
        };

        // Find the closing --- on its own line
        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if line.trim_end() == "---" {
                let yaml_content = &rest[..offset];
                let remaining = &rest[offset + line.len()..];

                if yaml_content.trim().is_empty() {
                    return Ok((FrontMatter::default(), remaining));
                }

                let fm = serde_yaml::from_str::<FrontMatter>(yaml_content)?;
                return Ok((fm, remaining));
            }
            offset += line.len();
        }

        // No closing ---, treat as no front-matter
        Ok((FrontMatter::default(), content))
    }

    /// Date normalized to a calendar day
    pub fn parse_date(&self) -> Option<NaiveDate> {
        self.date.as_ref().and_then(normalize_date)
    }

    /// Non-empty title
    pub fn title(&self) -> Option<&str> {
        non_empty(self.title.as_deref())
    }

    /// Non-empty description
    pub fn description(&self) -> Option<&str> {
        non_empty(self.description.as_deref())
    }

    /// Non-empty category
    pub fn category(&self) -> Option<&str> {
        non_empty(self.category.as_deref())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Returns the text after an opening `---` line, if the content starts with one
fn strip_delimiter_line(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.trim_start_matches([' ', '\t']);
    if let Some(rest) = rest.strip_prefix("\r\n") {
        Some(rest)
    } else {
        rest.strip_prefix('\n')
    }
}

/// Normalize a front-matter date to a UTC calendar day.
///
/// Strings are parsed as RFC 3339 first, then as common date/datetime layouts,
/// and finally the `YYYY-MM-DD` head before a `T` or space is accepted.
pub fn normalize_date(value: &serde_yaml::Value) -> Option<NaiveDate> {
    match value {
        serde_yaml::Value::String(s) => parse_date_string(s),
        _ => None,
    }
}

/// Parse a date string in various formats
fn parse_date_string(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    let head = s.split(['T', ' ', '\t']).next().unwrap_or_default();
    let bytes = head.as_bytes();
    let looks_like_day = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if looks_like_day {
        return NaiveDate::parse_from_str(head, "%Y-%m-%d").ok();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15 10:30:00
category: 前端/Vue
tags:
  - rust
  - 2024
image: /images/cover.png
series: basics
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title(), Some("Hello World"));
        assert_eq!(fm.category(), Some("前端/Vue"));
        assert_eq!(fm.tags, vec!["rust", "2024"]);
        assert_eq!(fm.image.as_deref(), Some("/images/cover.png"));
        assert!(fm.extra.contains_key("series"));
        assert_eq!(
            fm.parse_date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
        assert!(remaining.contains("This is the content."));
        assert!(!remaining.contains("title:"));
    }

    #[test]
    fn test_single_string_tag() {
        let content = "---\ntitle: One\ntags: Notes\n---\nBody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.tags, vec!["Notes"]);
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_tags_of_unexpected_shape_are_dropped() {
        let content = "---\ntags:\n  key: value\n---\nBody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert!(fm.tags.is_empty());
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Title\n\nJust text.";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, content);
    }

    #[test]
    fn test_unclosed_frontmatter_is_content() {
        let content = "---\ntitle: dangling\n\nNo closing line.";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, content);
    }

    #[test]
    fn test_empty_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("---\n---\nBody").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let content = "---\ntitle: [unclosed\n---\nBody";
        assert!(FrontMatter::parse(content).is_err());
    }

    #[test]
    fn test_empty_title_is_ignored() {
        let (fm, _) = FrontMatter::parse("---\ntitle: ''\n---\nBody").unwrap();
        assert_eq!(fm.title(), None);
    }

    #[test]
    fn test_normalize_date_variants() {
        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        let s = |v: &str| serde_yaml::Value::String(v.to_string());

        assert_eq!(normalize_date(&s("2024-03-05")), day(2024, 3, 5));
        assert_eq!(normalize_date(&s("2024/03/05")), day(2024, 3, 5));
        assert_eq!(
            normalize_date(&s("2024-03-05T23:30:00-02:00")),
            day(2024, 3, 6)
        );
        assert_eq!(normalize_date(&s("2024-03-05 garbage")), day(2024, 3, 5));
        assert_eq!(normalize_date(&s("yesterday")), None);
        let number: serde_yaml::Value = serde_yaml::from_str("20240305").unwrap();
        assert_eq!(normalize_date(&number), None);
    }
}
