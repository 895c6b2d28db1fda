//! Site statistics as shown on the home and about pages

use anyhow::Result;
use chrono::NaiveDate;
use std::fmt::Write;

use crate::cache::ContentSnapshot;
use crate::stats::site_stats;
use crate::Folio;

pub fn run(folio: &Folio) -> Result<()> {
    let snapshot = folio.snapshot();
    let text = render(
        &snapshot,
        folio.config.author.career_start.as_deref(),
        folio.today(),
    )?;
    print!("{}", text);
    Ok(())
}

pub fn render(
    snapshot: &ContentSnapshot,
    career_start: Option<&str>,
    today: NaiveDate,
) -> Result<String> {
    let stats = site_stats(snapshot, career_start, today);
    let mut out = String::new();

    writeln!(out, "{}: {}", stats.articles_label, stats.articles)?;
    writeln!(out, "分类: {}", stats.categories)?;
    writeln!(out, "标签: {}", stats.tags)?;
    if let Some(experience) = &stats.experience {
        writeln!(out, "{}: {}", stats.experience_label, experience)?;
    }
    Ok(out)
}
