//! Related article suggestions

use super::BlogPost;

/// Dates closer than this count as published together
const NEARBY_DAYS: i64 = 30;

/// Similarity score between two posts, higher is more related
pub fn similarity(a: &BlogPost, b: &BlogPost) -> f64 {
    let mut score = 0.0;

    if a.category == b.category {
        score += 3.0;
    }

    let common_tags = a.tags.iter().filter(|t| b.tags.contains(t)).count();
    score += common_tags as f64 * 2.0;

    if (a.date - b.date).num_days().abs() <= NEARBY_DAYS {
        score += 1.0;
    }

    let title_a = a.title.to_lowercase();
    let title_b = b.title.to_lowercase();
    let words_b: Vec<&str> = title_b.split_whitespace().collect();
    let common_words = title_a
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && words_b.contains(w))
        .count();
    score += common_words as f64 * 0.5;

    score
}

/// Up to `max` posts most similar to `current`, excluding itself
pub fn related_posts<'a>(current: &BlogPost, all: &'a [BlogPost], max: usize) -> Vec<&'a BlogPost> {
    let mut scored: Vec<(f64, &BlogPost)> = all
        .iter()
        .filter(|p| p.slug != current.slug)
        .map(|p| (similarity(current, p), p))
        .collect();

    // Stable sort keeps the index order (newest first) among equal scores
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(max).map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn post(slug: &str, title: &str, category: &str, tags: &[&str], date: &str) -> BlogPost {
        BlogPost {
            slug: slug.to_string(),
            title: title.to_string(),
            description: String::new(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            image: None,
            reading_time: "1 min read".to_string(),
            content: String::new(),
            relative_path: PathBuf::from(format!("{}.md", slug)),
        }
    }

    #[test]
    fn test_similarity_components() {
        let a = post("a", "Rust async runtime", "Rust", &["async", "tokio"], "2024-01-01");
        let b = post("b", "Building an async runtime", "Rust", &["tokio"], "2024-01-20");
        // category 3 + one tag 2 + nearby date 1 + "async" and "runtime" 1.0
        assert_eq!(similarity(&a, &b), 7.0);

        let c = post("c", "CSS grid", "前端", &[], "2023-01-01");
        assert_eq!(similarity(&a, &c), 0.0);
    }

    #[test]
    fn test_related_posts_excludes_current_and_limits() {
        let current = post("a", "Vue reactivity", "前端/Vue", &["vue"], "2024-05-01");
        let all = vec![
            current.clone(),
            post("b", "Unrelated", "Rust", &[], "2020-01-01"),
            post("c", "Vue compiler", "前端/Vue", &["vue"], "2024-05-10"),
            post("d", "React hooks", "前端/React", &[], "2024-05-02"),
        ];
        let related = related_posts(&current, &all, 2);
        let slugs: Vec<_> = related.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "d"]);
    }
}
