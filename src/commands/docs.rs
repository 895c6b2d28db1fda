//! Print generated documents: sitemap, robots.txt and article outlines

use anyhow::Result;
use std::fmt::Write;

use crate::cache::ContentSnapshot;
use crate::content::{MarkdownRenderer, TocEntry};
use crate::seo::robots::robots_txt;
use crate::seo::{render_sitemap, sitemap_entries};
use crate::Folio;

pub fn sitemap(folio: &Folio) -> Result<()> {
    let snapshot = folio.snapshot();
    let entries = sitemap_entries(&folio.config, &snapshot, folio.today());
    tracing::debug!(entries = entries.len(), "sitemap generated");
    print!("{}", render_sitemap(&entries));
    Ok(())
}

pub fn robots(folio: &Folio, host: Option<&str>) -> Result<()> {
    print!("{}", robots_txt(&folio.config, host));
    Ok(())
}

/// Print the table of contents of one article
pub fn toc(folio: &Folio, slug: &str) -> Result<()> {
    let snapshot = folio.snapshot();
    print!("{}", render_toc(&snapshot, slug)?);
    Ok(())
}

pub fn render_toc(snapshot: &ContentSnapshot, slug: &str) -> Result<String> {
    let Some(post) = snapshot.post_by_slug(slug) else {
        anyhow::bail!("No post with slug: {}", slug);
    };

    let entries = MarkdownRenderer::toc(&post.content);
    let mut out = String::new();
    writeln!(out, "{} ({} headings)", post.title, entries.len())?;
    let base = entries.iter().map(|e| e.level).min().unwrap_or(1);
    for TocEntry { id, text, level } in &entries {
        writeln!(
            out,
            "{}- {} (#{})",
            "  ".repeat((level - base) as usize + 1),
            text,
            id
        )?;
    }
    Ok(out)
}
