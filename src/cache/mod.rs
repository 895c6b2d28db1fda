//! Content index with modification-time based staleness detection
//!
//! The index scans the content directory once and keeps the parsed posts in
//! memory. In watch mode every query rescans the file list and rebuilds the
//! snapshot when a file was added, removed or modified; otherwise the first
//! snapshot is kept for the lifetime of the process.

use indexmap::IndexSet;
use percent_encoding::percent_decode_str;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Instant, SystemTime};

use crate::content::loader::{parse_post, scan_markdown_files};
use crate::content::{BlogPost, MarkdownFile, ParseOptions, PostSummary};

/// Change detection result between two scans
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Files not present in the previous scan
    pub added: Vec<PathBuf>,
    /// Files whose modification time changed
    pub modified: Vec<PathBuf>,
    /// Files that disappeared
    pub removed: Vec<PathBuf>,
}

impl ChangeSet {
    /// Check if any changes were detected
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.modified.is_empty() || !self.removed.is_empty()
    }

    /// Get summary of changes for logging
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.added.is_empty() {
            parts.push(format!("{} added", self.added.len()));
        }
        if !self.modified.is_empty() {
            parts.push(format!("{} modified", self.modified.len()));
        }
        if !self.removed.is_empty() {
            parts.push(format!("{} removed", self.removed.len()));
        }

        if parts.is_empty() {
            "no changes".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Compare the files of a previous scan with a fresh one
pub fn detect_changes(previous: &[MarkdownFile], current: &[MarkdownFile]) -> ChangeSet {
    let before: HashMap<&Path, SystemTime> = previous
        .iter()
        .map(|f| (f.relative_path.as_path(), f.mtime))
        .collect();
    let now: HashSet<&Path> = current.iter().map(|f| f.relative_path.as_path()).collect();

    let mut changes = ChangeSet::default();
    for file in current {
        match before.get(file.relative_path.as_path()) {
            None => changes.added.push(file.relative_path.clone()),
            Some(mtime) if *mtime != file.mtime => {
                changes.modified.push(file.relative_path.clone())
            }
            Some(_) => {}
        }
    }
    for file in previous {
        if !now.contains(file.relative_path.as_path()) {
            changes.removed.push(file.relative_path.clone());
        }
    }

    changes
}

/// An immutable view of the indexed content
#[derive(Debug, Default)]
pub struct ContentSnapshot {
    /// Posts sorted by date descending, ties by slug
    posts: Vec<BlogPost>,
    by_slug: HashMap<String, usize>,
    categories: Vec<String>,
    tags: Vec<String>,
    /// Files the snapshot was built from
    files: Vec<MarkdownFile>,
}

impl ContentSnapshot {
    /// Parse every file and index the resulting posts
    pub fn build(files: Vec<MarkdownFile>, options: &ParseOptions) -> Self {
        let mut posts: Vec<BlogPost> = files
            .iter()
            .filter_map(|file| match parse_post(file, options) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!(path = %file.relative_path.display(), "skipping post: {}", e);
                    None
                }
            })
            .collect();

        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));

        let mut by_slug = HashMap::with_capacity(posts.len());
        // Later (older) posts overwrite earlier ones, so the oldest owns a shared slug
        for (idx, post) in posts.iter().enumerate() {
            if by_slug.insert(post.slug.clone(), idx).is_some() {
                tracing::warn!(
                    slug = %post.slug,
                    path = %post.relative_path.display(),
                    "duplicate slug, the older post wins"
                );
            }
        }

        let categories: IndexSet<String> = posts
            .iter()
            .map(|p| p.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        let tags: IndexSet<String> = posts
            .iter()
            .flat_map(|p| p.tags.iter().cloned())
            .filter(|t| !t.is_empty())
            .collect();

        Self {
            posts,
            by_slug,
            categories: categories.into_iter().collect(),
            tags: tags.into_iter().collect(),
            files,
        }
    }

    /// Slugs of every post, newest first
    pub fn slugs(&self) -> Vec<&str> {
        self.posts.iter().map(|p| p.slug.as_str()).collect()
    }

    pub fn all_posts(&self) -> &[BlogPost] {
        &self.posts
    }

    /// Look up a post, also accepting a percent-encoded slug
    pub fn post_by_slug(&self, slug: &str) -> Option<&BlogPost> {
        if let Some(&idx) = self.by_slug.get(slug) {
            return self.posts.get(idx);
        }

        let decoded = percent_decode_str(slug).decode_utf8().ok()?;
        match self.by_slug.get(decoded.as_ref()) {
            Some(&idx) => self.posts.get(idx),
            None => {
                tracing::debug!(slug = %slug, "post not found");
                None
            }
        }
    }

    /// Posts in a category or any of its descendants, case-insensitive
    pub fn posts_by_category(&self, category: &str) -> Vec<&BlogPost> {
        let target = normalize_category(category);
        let prefix = format!("{}/", target);
        self.posts
            .iter()
            .filter(|p| {
                let c = normalize_category(&p.category);
                c == target || c.starts_with(&prefix)
            })
            .collect()
    }

    /// Posts carrying a tag, case-insensitive
    pub fn posts_by_tag(&self, tag: &str) -> Vec<&BlogPost> {
        let tag = tag.to_lowercase();
        self.posts
            .iter()
            .filter(|p| p.tags.iter().any(|t| t.to_lowercase() == tag))
            .collect()
    }

    /// Distinct categories in first-seen order
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Distinct tags in first-seen order
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn summaries(&self) -> Vec<PostSummary> {
        self.posts.iter().map(BlogPost::summary).collect()
    }

    pub fn files(&self) -> &[MarkdownFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }
}

fn normalize_category(category: &str) -> String {
    category.trim().trim_end_matches('/').to_lowercase()
}

/// Memoized content index shared by the server and CLI commands
pub struct ContentIndex {
    root: PathBuf,
    options: ParseOptions,
    watch: bool,
    snapshot: RwLock<Option<Arc<ContentSnapshot>>>,
}

impl ContentIndex {
    pub fn new<P: Into<PathBuf>>(root: P, options: ParseOptions, watch: bool) -> Self {
        Self {
            root: root.into(),
            options,
            watch,
            snapshot: RwLock::new(None),
        }
    }

    /// Content directory being indexed
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_watching(&self) -> bool {
        self.watch
    }

    /// Return an up-to-date snapshot, building or rebuilding it as needed
    pub fn ensure(&self) -> Arc<ContentSnapshot> {
        let Some(snapshot) = self.current() else {
            return self.rebuild(scan_markdown_files(&self.root));
        };

        if !self.watch {
            return snapshot;
        }

        let files = scan_markdown_files(&self.root);
        let changes = detect_changes(snapshot.files(), &files);
        if changes.has_changes() {
            tracing::info!(changes = %changes.summary(), "content changed, rebuilding index");
            self.rebuild(files)
        } else {
            snapshot
        }
    }

    /// Force a rebuild from disk
    pub fn refresh(&self) -> Arc<ContentSnapshot> {
        self.rebuild(scan_markdown_files(&self.root))
    }

    /// Drop the cached snapshot; the next query rebuilds
    pub fn invalidate(&self) {
        let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    fn current(&self) -> Option<Arc<ContentSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn rebuild(&self, files: Vec<MarkdownFile>) -> Arc<ContentSnapshot> {
        let start = Instant::now();
        let file_count = files.len();
        let snapshot = Arc::new(ContentSnapshot::build(files, &self.options));

        tracing::info!(
            files = file_count,
            posts = snapshot.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "content index built"
        );

        let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::clone(&snapshot));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn touch(root: &Path, relative: &str, offset_secs: u64) {
        let file = fs::File::options()
            .write(true)
            .open(root.join(relative))
            .unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
            .unwrap();
    }

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "01. 前端/02. Vue/01. reactivity.md",
            "---\ntitle: Reactivity\ndate: 2024-05-01\ntags: [vue, JS]\n---\nBody",
        );
        write(
            dir.path(),
            "01. 前端/react.md",
            "---\ntitle: React\ndate: 2024-06-01\ntags: js\n---\nBody",
        );
        write(
            dir.path(),
            "02. Rust/ownership.md",
            "---\ntitle: Ownership\ndate: 2023-01-01\ntags: [rust]\n---\nBody",
        );
        write(dir.path(), "broken.md", "---\ntitle: [oops\n---\nBody");
        dir
    }

    fn index(root: &Path, watch: bool) -> ContentIndex {
        ContentIndex::new(root, ParseOptions::default(), watch)
    }

    #[test]
    fn test_build_sorts_and_indexes() {
        let dir = sample_tree();
        let snapshot = index(dir.path(), false).ensure();

        assert_eq!(
            snapshot.slugs(),
            vec!["前端/react", "前端/vue/reactivity", "rust/ownership"]
        );
        assert_eq!(snapshot.categories(), &["前端", "前端/Vue", "Rust"]);
        assert_eq!(snapshot.tags(), &["js", "vue", "JS", "rust"]);
        assert_eq!(
            snapshot.summaries()[0],
            PostSummary {
                slug: "前端/react".to_string(),
                title: "React".to_string(),
                category: "前端".to_string(),
            }
        );
    }

    #[test]
    fn test_post_by_slug_accepts_encoded_slug() {
        let dir = sample_tree();
        let snapshot = index(dir.path(), false).ensure();

        assert!(snapshot.post_by_slug("rust/ownership").is_some());
        let post = snapshot
            .post_by_slug("%E5%89%8D%E7%AB%AF/vue/reactivity")
            .unwrap();
        assert_eq!(post.title, "Reactivity");
        assert!(snapshot.post_by_slug("missing").is_none());
    }

    #[test]
    fn test_category_and_tag_queries() {
        let dir = sample_tree();
        let snapshot = index(dir.path(), false).ensure();

        assert_eq!(snapshot.posts_by_category("前端").len(), 2);
        assert_eq!(snapshot.posts_by_category("前端/vue/").len(), 1);
        assert_eq!(snapshot.posts_by_category(" rust ").len(), 1);
        assert!(snapshot.posts_by_category("前").is_empty());

        assert_eq!(snapshot.posts_by_tag("JS").len(), 2);
        assert_eq!(snapshot.posts_by_tag("Rust").len(), 1);
    }

    #[test]
    fn test_duplicate_slug_keeps_oldest() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes/a.md", "---\ntitle: Old\ndate: 2020-01-01\n---\n");
        write(dir.path(), "01. notes/a.md", "---\ntitle: New\ndate: 2024-01-01\n---\n");

        let snapshot = index(dir.path(), false).ensure();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.post_by_slug("notes/a").unwrap().title, "Old");
        assert_eq!(snapshot.all_posts()[0].title, "New");
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = index(&dir.path().join("nope"), true).ensure();
        assert!(snapshot.is_empty());
        assert!(snapshot.categories().is_empty());
    }

    #[test]
    fn test_non_watch_mode_reuses_snapshot() {
        let dir = sample_tree();
        let index = index(dir.path(), false);
        let first = index.ensure();

        write(dir.path(), "new.md", "# New");
        let second = index.ensure();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 3);

        let refreshed = index.refresh();
        assert_eq!(refreshed.len(), 4);

        index.invalidate();
        assert!(!Arc::ptr_eq(&refreshed, &index.ensure()));
    }

    #[test]
    fn test_watch_mode_detects_changes() {
        let dir = sample_tree();
        let index = index(dir.path(), true);
        let first = index.ensure();
        assert!(Arc::ptr_eq(&first, &index.ensure()));

        // modified
        write(
            dir.path(),
            "02. Rust/ownership.md",
            "---\ntitle: Ownership 2\ndate: 2023-01-01\n---\nBody",
        );
        touch(dir.path(), "02. Rust/ownership.md", 10);
        let second = index.ensure();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.post_by_slug("rust/ownership").unwrap().title, "Ownership 2");

        // added
        write(dir.path(), "02. Rust/traits.md", "---\ndate: 2022-01-01\n---\n");
        assert_eq!(index.ensure().len(), 4);

        // removed
        fs::remove_file(dir.path().join("01. 前端/react.md")).unwrap();
        let third = index.ensure();
        assert_eq!(third.len(), 3);
        assert!(third.post_by_slug("前端/react").is_none());
    }

    #[test]
    fn test_detect_changes_summary() {
        let file = |p: &str, secs: u64| MarkdownFile {
            path: PathBuf::from(p),
            relative_path: PathBuf::from(p),
            mtime: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        };
        let previous = vec![file("a.md", 1), file("b.md", 1)];
        let current = vec![file("a.md", 2), file("c.md", 1)];

        let changes = detect_changes(&previous, &current);
        assert_eq!(changes.added, vec![PathBuf::from("c.md")]);
        assert_eq!(changes.modified, vec![PathBuf::from("a.md")]);
        assert_eq!(changes.removed, vec![PathBuf::from("b.md")]);
        assert_eq!(changes.summary(), "1 added, 1 modified, 1 removed");

        assert!(!detect_changes(&previous, &previous).has_changes());
    }
}
