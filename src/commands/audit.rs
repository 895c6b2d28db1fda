//! Render every page in memory and run the SEO audit on it

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Extension;
use std::sync::Arc;

use crate::seo::{audit_html, SeoReport};
use crate::server::middleware::CspNonce;
use crate::server::pages::{self, BlogQuery};
use crate::server::AppState;
use crate::views::{KvStore, MemoryStore};
use crate::Folio;

/// Audit all pages; fails when any page scores below `min_score`
pub async fn run(folio: &Folio, min_score: u32, verbose: bool) -> Result<()> {
    let reports = audit_site(folio).await?;

    let mut failing = 0;
    for (path, report) in &reports {
        if verbose {
            println!("{}", report.to_markdown(path));
        } else {
            println!("{:>3}  {}", report.score, path);
            for issue in &report.issues {
                println!("       - {}", issue);
            }
        }
        if report.score < min_score {
            failing += 1;
        }
    }

    let average = reports.iter().map(|(_, r)| r.score).sum::<u32>() / reports.len().max(1) as u32;
    println!("\n{} pages audited, average score {}", reports.len(), average);

    if failing > 0 {
        anyhow::bail!("{} page(s) scored below {}", failing, min_score);
    }
    Ok(())
}

/// Reports for the fixed pages followed by every article, in index order
pub async fn audit_site(folio: &Folio) -> Result<Vec<(String, SeoReport)>> {
    // Counts are not needed for rendering, keep the audit off the real store
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let index = Arc::new(folio.index(false));
    let state = AppState::new(folio.config.clone(), index.clone(), store, folio.static_dir.clone())?;

    let mut paths = vec!["/".to_string(), "/blog".to_string(), "/about".to_string()];
    paths.extend(index.ensure().all_posts().iter().map(|p| p.url_path()));

    let mut reports = Vec::with_capacity(paths.len());
    for path in paths {
        let html = render_page(&state, &path).await?;
        let report = audit_html(&html, folio.config.base_url());
        tracing::debug!(path = %path, score = report.score, "page audited");
        reports.push((path, report));
    }
    Ok(reports)
}

async fn render_page(state: &AppState, path: &str) -> Result<String> {
    let nonce = Extension(CspNonce::generate());
    let state_ = State(state.clone());

    let response = match path {
        "/" => pages::home(state_, nonce).await.into_response(),
        "/blog" => pages::blog(state_, nonce, Query(BlogQuery::default()))
            .await
            .into_response(),
        "/about" => pages::about(state_, nonce).await.into_response(),
        other => {
            let slug = other.trim_start_matches("/blog/").to_string();
            pages::post(state_, nonce, Path(slug)).await.into_response()
        }
    };

    if !response.status().is_success() {
        anyhow::bail!("{} rendered with status {}", path, response.status());
    }
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;

    #[tokio::test]
    async fn test_audit_site() {
        let dir = tempfile::tempdir().unwrap();
        let post = dir.path().join("content/01. Rust/01. intro.md");
        fs::create_dir_all(post.parent().unwrap()).unwrap();
        fs::write(
            &post,
            "---\ntitle: Rust 入门\ndescription: short\n---\n# Rust 入门\n\n![](./img/missing.png)\n",
        )
        .unwrap();

        let mut config = SiteConfig::default();
        config.url = "https://example.com".to_string();
        let folio = Folio::with_config(dir.path().to_path_buf(), config);

        let reports = audit_site(&folio).await.unwrap();
        let paths: Vec<_> = reports.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["/", "/blog", "/about", "/blog/rust/intro"]);

        let (_, article) = &reports[3];
        assert!(article.score < 100);
        assert!(article.issues.iter().any(|i| i.contains("描述")));
        assert_eq!(article.metrics.images_count, 1);
    }
}
