//! Site statistics shown on the home page and by `folio stats`

use chrono::NaiveDate;
use serde::Serialize;

use crate::cache::ContentSnapshot;

const DAYS_PER_YEAR: f64 = 365.25;

/// Length of a career as `N个月` under a year, else whole years rounded up from six months
pub fn work_experience(start: NaiveDate, today: NaiveDate) -> String {
    let years = (today - start).num_days().abs() as f64 / DAYS_PER_YEAR;

    if years < 1.0 {
        return format!("{}个月", (years * 12.0).floor() as u32);
    }

    let whole = years.floor();
    let months = ((years - whole) * 12.0).floor();
    let rounded = if months >= 6.0 { whole + 1.0 } else { whole };
    format!("{}年", rounded as u32)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    pub articles: usize,
    pub categories: usize,
    pub tags: usize,
    pub experience_label: &'static str,
    pub articles_label: &'static str,
}

/// Counts from the content index plus the experience string when a career start is known
pub fn site_stats(
    snapshot: &ContentSnapshot,
    career_start: Option<&str>,
    today: NaiveDate,
) -> SiteStats {
    let experience = career_start.and_then(|s| {
        match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            Ok(start) => Some(work_experience(start, today)),
            Err(_) => {
                tracing::warn!(career_start = %s, "invalid career_start, expected YYYY-MM-DD");
                None
            }
        }
    });

    SiteStats {
        experience,
        articles: snapshot.len(),
        categories: snapshot.categories().len(),
        tags: snapshot.tags().len(),
        experience_label: "工作经验",
        articles_label: "技术文章",
    }
}
