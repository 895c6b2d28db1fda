//! Slugs, categories and titles derived from content paths

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Component, Path};

lazy_static! {
    /// Ordering prefix such as `01. ` in `01. Getting started.md`
    static ref ORDER_PREFIX: Regex = Regex::new(r"^\d+\.\s*").unwrap();
    static ref NON_SLUG_CHAR: Regex = Regex::new(r"[^A-Za-z0-9_\x{4e00}-\x{9fa5}]").unwrap();
    static ref NON_SLUG_RUN: Regex = Regex::new(r"[^A-Za-z0-9_\x{4e00}-\x{9fa5}]+").unwrap();
    static ref DASH_RUN: Regex = Regex::new(r"-+").unwrap();
}

/// Remove a leading ordering prefix (`01. `)
pub fn strip_order_prefix(s: &str) -> &str {
    match ORDER_PREFIX.find(s) {
        Some(m) => &s[m.end()..],
        None => s,
    }
}

/// Turn one path segment into its URL form.
///
/// ASCII word characters and CJK ideographs survive, everything else becomes
/// a single `-`; the result is lowercased and trimmed of dashes.
pub fn slugify_segment(input: &str) -> String {
    let stripped = strip_order_prefix(input);
    let dashed = NON_SLUG_CHAR.replace_all(stripped, "-");
    let collapsed = DASH_RUN.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_lowercase()
}

/// Anchor id for a heading
pub fn heading_id(text: &str) -> String {
    NON_SLUG_RUN
        .replace_all(&text.to_lowercase(), "-")
        .into_owned()
}

/// Directory names of a relative path, without the file name
fn directory_parts(relative_path: &Path) -> Vec<String> {
    relative_path
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Category from the directories a file lives in, e.g. `前端/Vue`
pub fn category_from_path(relative_path: &Path, fallback: &str) -> String {
    let parts: Vec<String> = directory_parts(relative_path)
        .iter()
        .map(|p| strip_order_prefix(p).to_string())
        .collect();

    if parts.is_empty() {
        fallback.to_string()
    } else {
        parts.join("/")
    }
}

/// Slug for a content file: the slugified path category followed by the slugified stem.
///
/// Files at the root of the content tree sit in the fallback category, which
/// then becomes their first slug segment.
pub fn slug_from_path(relative_path: &Path, fallback_category: &str) -> String {
    let stem = relative_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    category_from_path(relative_path, fallback_category)
        .split('/')
        .filter(|p| !p.is_empty())
        .map(slugify_segment)
        .chain(std::iter::once(slugify_segment(&stem)))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Human title from a file name
pub fn title_from_filename(relative_path: &Path) -> String {
    let stem = relative_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    strip_order_prefix(&stem).trim().to_string()
}
