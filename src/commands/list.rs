//! List site content

use anyhow::Result;
use std::fmt::Write;

use crate::cache::ContentSnapshot;
use crate::content::taxonomy::{category_tree, tag_counts};
use crate::content::CategoryNode;
use crate::Folio;

/// List site content by type
pub fn run(folio: &Folio, content_type: &str) -> Result<()> {
    let snapshot = folio.snapshot();
    print!("{}", render(&snapshot, content_type)?);
    Ok(())
}

/// Listing text for one content type
pub fn render(snapshot: &ContentSnapshot, content_type: &str) -> Result<String> {
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            writeln!(out, "Posts ({}):", snapshot.len())?;
            for post in snapshot.all_posts() {
                writeln!(
                    out,
                    "  {} - {} [{}] ({})",
                    post.date_string(),
                    post.title,
                    post.slug,
                    post.reading_time
                )?;
            }
        }
        "tag" | "tags" => {
            let tags = tag_counts(snapshot.all_posts());
            writeln!(out, "Tags ({}):", tags.len())?;
            for tag in tags {
                writeln!(out, "  {} ({})", tag.name, tag.count)?;
            }
        }
        "category" | "categories" => {
            let tree = category_tree(snapshot.all_posts());
            writeln!(out, "Categories ({}):", snapshot.categories().len())?;
            write_tree(&mut out, &tree)?;
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, tag, category",
                content_type
            );
        }
    }

    Ok(out)
}

fn write_tree(out: &mut String, nodes: &[CategoryNode]) -> std::fmt::Result {
    for node in nodes {
        writeln!(
            out,
            "{}{} ({})",
            "  ".repeat(node.level + 1),
            node.name,
            node.post_count
        )?;
        write_tree(out, &node.children)?;
    }
    Ok(())
}
