//! Category tree and tag statistics

use indexmap::IndexMap;
use serde::Serialize;

use super::BlogPost;

/// A node of the category hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub name: String,
    pub full_path: String,
    /// Depth, 0 for top-level categories
    pub level: usize,
    /// Posts in this category or any descendant
    pub post_count: usize,
    pub children: Vec<CategoryNode>,
}

/// A tag and the number of posts carrying it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// Build the category tree; children keep first-seen order
pub fn category_tree(posts: &[BlogPost]) -> Vec<CategoryNode> {
    let mut roots = Vec::new();
    for post in posts {
        let parts: Vec<&str> = post
            .category
            .split('/')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        insert(&mut roots, &parts, 0, "");
    }
    roots
}

fn insert(nodes: &mut Vec<CategoryNode>, parts: &[&str], level: usize, prefix: &str) {
    let Some((head, rest)) = parts.split_first() else {
        return;
    };
    let full_path = if prefix.is_empty() {
        head.to_string()
    } else {
        format!("{}/{}", prefix, head)
    };

    let idx = match nodes.iter().position(|n| n.name == *head) {
        Some(idx) => idx,
        None => {
            nodes.push(CategoryNode {
                name: head.to_string(),
                full_path: full_path.clone(),
                level,
                post_count: 0,
                children: Vec::new(),
            });
            nodes.len() - 1
        }
    };

    let node = &mut nodes[idx];
    node.post_count += 1;
    insert(&mut node.children, rest, level + 1, &full_path);
}

/// Tag usage sorted by count descending, then name
pub fn tag_counts(posts: &[BlogPost]) -> Vec<TagCount> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for tag in posts.iter().flat_map(|p| p.tags.iter()) {
        if !tag.is_empty() {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut result: Vec<TagCount> = counts
        .into_iter()
        .map(|(name, count)| TagCount {
            name: name.to_string(),
            count,
        })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn post(category: &str, tags: &[&str]) -> BlogPost {
        BlogPost {
            slug: format!("{}/post", category),
            title: "Post".to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            image: None,
            reading_time: "1 min read".to_string(),
            content: String::new(),
            relative_path: PathBuf::from("post.md"),
        }
    }

    #[test]
    fn test_category_tree_counts_ancestors() {
        let posts = vec![
            post("前端/Vue", &[]),
            post("前端/React", &[]),
            post("前端/Vue", &[]),
            post("Rust", &[]),
        ];
        let tree = category_tree(&posts);
        assert_eq!(tree.len(), 2);

        let frontend = &tree[0];
        assert_eq!(frontend.name, "前端");
        assert_eq!(frontend.post_count, 3);
        assert_eq!(frontend.level, 0);
        assert_eq!(frontend.children.len(), 2);
        assert_eq!(frontend.children[0].full_path, "前端/Vue");
        assert_eq!(frontend.children[0].post_count, 2);
        assert_eq!(frontend.children[0].level, 1);

        assert_eq!(tree[1].name, "Rust");
        assert_eq!(tree[1].post_count, 1);
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn test_tag_counts() {
        let posts = vec![
            post("a", &["vue", "js"]),
            post("b", &["js"]),
            post("c", &["css", ""]),
        ];
        let counts = tag_counts(&posts);
        assert_eq!(
            counts,
            vec![
                TagCount { name: "js".to_string(), count: 2 },
                TagCount { name: "css".to_string(), count: 1 },
                TagCount { name: "vue".to_string(), count: 1 },
            ]
        );
    }
}
