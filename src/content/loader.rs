//! Content loader - scans the content directory and parses articles

use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use super::reading_time::ReadingTime;
use super::slug::{category_from_path, slug_from_path, title_from_filename};
use super::{BlogPost, ContentError, FrontMatter};
use crate::config::ContentConfig;

lazy_static! {
    static ref FIRST_HEADING_LINE: Regex = Regex::new(r"(?m)^#[^\n]*\n").unwrap();
}

/// Maximum number of characters in an extracted description
const DESCRIPTION_LIMIT: usize = 200;

/// Directory names never scanned for articles
const SKIPPED_DIR: &str = "static";

/// A Markdown file found in the content tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownFile {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub mtime: SystemTime,
}

/// Fallbacks used while turning files into posts
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub fallback_category: String,
    pub fallback_description: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::from(&ContentConfig::default())
    }
}

impl From<&ContentConfig> for ParseOptions {
    fn from(config: &ContentConfig) -> Self {
        Self {
            fallback_category: config.fallback_category.clone(),
            fallback_description: config.fallback_description.clone(),
        }
    }
}

/// Recursively list Markdown files under `root`, sorted by relative path
pub fn scan_markdown_files(root: &Path) -> Vec<MarkdownFile> {
    if !root.exists() {
        tracing::warn!(dir = %root.display(), "content directory does not exist");
        return Vec::new();
    }

    let mut files: Vec<MarkdownFile> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !(e.file_type().is_dir() && e.file_name() == SKIPPED_DIR)
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_markdown_file(e.path()))
        .filter_map(|e| {
            let mtime = e.metadata().ok()?.modified().ok()?;
            let relative_path = e.path().strip_prefix(root).ok()?.to_path_buf();
            Some(MarkdownFile {
                path: e.path().to_path_buf(),
                relative_path,
                mtime,
            })
        })
        .collect();

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    files
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "mdx")
        .unwrap_or(false)
}

/// Read and parse a single article
pub fn parse_post(file: &MarkdownFile, options: &ParseOptions) -> Result<BlogPost, ContentError> {
    let raw = fs::read_to_string(&file.path).map_err(|source| ContentError::Io {
        path: file.path.clone(),
        source,
    })?;
    post_from_source(&raw, file, options)
}

/// Build a post from file contents already in memory
pub fn post_from_source(
    raw: &str,
    file: &MarkdownFile,
    options: &ParseOptions,
) -> Result<BlogPost, ContentError> {
    let (fm, body) = FrontMatter::parse(raw)?;

    let title = fm
        .title()
        .map(str::to_string)
        .unwrap_or_else(|| title_from_filename(&file.relative_path));

    let description = fm
        .description()
        .map(str::to_string)
        .unwrap_or_else(|| extract_description(body, &options.fallback_description));

    let date = fm.parse_date().unwrap_or_else(|| mtime_date(file.mtime));

    let category = fm
        .category()
        .map(str::to_string)
        .unwrap_or_else(|| category_from_path(&file.relative_path, &options.fallback_category));

    Ok(BlogPost {
        slug: slug_from_path(&file.relative_path, &options.fallback_category),
        title,
        description,
        date,
        category,
        tags: fm.tags.clone(),
        image: fm.image.clone(),
        reading_time: ReadingTime::of(body).text,
        content: body.to_string(),
        relative_path: file.relative_path.clone(),
    })
}

/// First paragraph after the first heading line, stripped of `#*[]` and capped
pub fn extract_description(content: &str, fallback: &str) -> String {
    let content = content.trim_start();
    let without_title = FIRST_HEADING_LINE.replace(content, "");
    let first_paragraph: String = without_title
        .split("\n\n")
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !matches!(c, '#' | '*' | '[' | ']'))
        .collect();
    let description: String = first_paragraph.trim().chars().take(DESCRIPTION_LIMIT).collect();

    if description.is_empty() {
        fallback.to_string()
    } else {
        description
    }
}

/// Calendar day (UTC) of a modification time
fn mtime_date(mtime: SystemTime) -> NaiveDate {
    DateTime::<Utc>::from(mtime).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn file(relative: &str) -> MarkdownFile {
        MarkdownFile {
            path: PathBuf::from("/nonexistent").join(relative),
            relative_path: PathBuf::from(relative),
            mtime: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_scan_skips_static_and_non_markdown() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "01. 前端/intro.md", "# Intro");
        write(dir.path(), "01. 前端/static/ignored.md", "# Ignored");
        write(dir.path(), "notes/draft.mdx", "Draft");
        write(dir.path(), "notes/readme.txt", "nope");
        write(dir.path(), "notes/img/logo.png", "png");

        let files = scan_markdown_files(dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|f| f.relative_path.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["01. 前端/intro.md", "notes/draft.mdx"]);
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_markdown_files(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_post_from_frontmatter() {
        let raw = r#"---
title: 响应式原理
description: Vue 3 reactivity internals
date: 2024-05-01
category: 前端/Vue
tags: [vue, 源码]
image: /covers/vue.png
---

# 响应式原理

Body text.
"#;
        let post = post_from_source(raw, &file("01. 前端/02. Vue/01. reactivity.md"), &ParseOptions::default())
            .unwrap();
        assert_eq!(post.slug, "前端/vue/reactivity");
        assert_eq!(post.title, "响应式原理");
        assert_eq!(post.description, "Vue 3 reactivity internals");
        assert_eq!(post.date_string(), "2024-05-01");
        assert_eq!(post.category, "前端/Vue");
        assert_eq!(post.tags, vec!["vue", "源码"]);
        assert_eq!(post.image.as_deref(), Some("/covers/vue.png"));
        assert_eq!(post.reading_time, "1 min read");
        assert!(post.content.contains("Body text."));
    }

    #[test]
    fn test_post_fallbacks() {
        let raw = "# Heading\nFirst **bold** [link] paragraph.\n\nSecond paragraph.";
        let post = post_from_source(raw, &file("02. Rust/03. Ownership Notes.md"), &ParseOptions::default())
            .unwrap();
        assert_eq!(post.title, "Ownership Notes");
        assert_eq!(post.description, "First bold link paragraph.");
        assert_eq!(post.category, "Rust");
        assert_eq!(post.slug, "rust/ownership-notes");
        assert_eq!(post.date_string(), "1970-01-01");
        assert!(post.tags.is_empty());
    }

    #[test]
    fn test_root_file_uses_fallback_category() {
        let post = post_from_source("Hello", &file("hello.md"), &ParseOptions::default()).unwrap();
        assert_eq!(post.category, "其他");
        assert_eq!(post.slug, "其他/hello");
    }

    #[test]
    fn test_extract_description() {
        assert_eq!(extract_description("", "暂无描述"), "暂无描述");
        assert_eq!(extract_description("# Only a title\n", "none"), "none");
        let long = "字".repeat(300);
        assert_eq!(extract_description(&long, "x").chars().count(), 200);
    }

    #[test]
    fn test_invalid_frontmatter_is_an_error() {
        let raw = "---\ntitle: [broken\n---\nBody";
        assert!(post_from_source(raw, &file("a.md"), &ParseOptions::default()).is_err());
    }

    #[test]
    fn test_parse_post_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "guide/setup.md", "---\ntitle: Setup\n---\nInstall things.");
        let files = scan_markdown_files(dir.path());
        let post = parse_post(&files[0], &ParseOptions::default()).unwrap();
        assert_eq!(post.title, "Setup");
        assert_eq!(post.description, "Install things.");
        assert_eq!(post.date, mtime_date(files[0].mtime));
    }
}
