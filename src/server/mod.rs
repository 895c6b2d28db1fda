//! HTTP server: pages, view counter API and content files

pub mod api;
mod error;
pub mod files;
pub mod middleware;
pub mod pages;

pub use error::ApiError;

use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::ContentIndex;
use crate::config::SiteConfig;
use crate::content::MarkdownRenderer;
use crate::templates::TemplateRenderer;
use crate::views::{self, KvStore, ViewCounter, ViewGuard};
use crate::Folio;
use middleware::CspNonce;

/// Syntax highlighting theme for code blocks
const CODE_THEME: &str = "base16-ocean.dark";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SiteConfig>,
    pub index: Arc<ContentIndex>,
    pub renderer: Arc<MarkdownRenderer>,
    pub templates: Arc<TemplateRenderer>,
    pub counter: ViewCounter,
    pub guard: ViewGuard,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        config: SiteConfig,
        index: Arc<ContentIndex>,
        store: Arc<dyn KvStore>,
        static_dir: PathBuf,
    ) -> Result<Self> {
        let renderer = MarkdownRenderer::with_options(CODE_THEME, &config.url)
            .with_content_root(index.root().to_path_buf());
        let counter = ViewCounter::new(store.clone(), &config.views, config.is_production());
        let guard = ViewGuard::new(store, config.views.throttle_seconds);

        Ok(Self {
            config: Arc::new(config),
            index,
            renderer: Arc::new(renderer),
            templates: Arc::new(TemplateRenderer::new()?),
            counter,
            guard,
            static_dir,
        })
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/views/increment",
            post(api::increment).options(api::preflight),
        )
        .route("/api/views/get", get(api::get_views).options(api::preflight))
        .route("/api/views/status", get(api::status).options(api::preflight))
        .route("/api/views/reset", post(api::reset).options(api::preflight))
        .route("/api/content/posts", get(api::posts).options(api::preflight));

    let page_routes = Router::new()
        .route("/", get(pages::home))
        .route("/blog", get(pages::blog))
        .route("/blog/*slug", get(pages::post))
        .route("/about", get(pages::about))
        .route("/content/*path", get(files::content_file))
        .route("/sitemap.xml", get(pages::sitemap))
        .route("/robots.txt", get(pages::robots))
        .route("/manifest.webmanifest", get(pages::manifest));

    page_routes
        .merge(api_routes)
        .fallback(fallback_handler)
        .layer(from_fn_with_state(state.clone(), middleware::security_headers))
        .layer(from_fn_with_state(state.clone(), middleware::redirects))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(folio: &Folio, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let store = views::connect(&folio.config).await?;
    tracing::info!(backend = ?store.kind(), "view counter ready");

    // File notifications replace per-query rescans when the watcher runs
    let rescan = folio.config.watch_content() && !watch;
    let index = Arc::new(folio.index(rescan));
    let snapshot = index.ensure();
    tracing::info!(posts = snapshot.len(), dir = %folio.content_dir.display(), "content indexed");

    let state = AppState::new(
        folio.config.clone(),
        index.clone(),
        store,
        folio.static_dir.clone(),
    )?;
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if watch {
        println!("Watching {} for changes...", folio.content_dir.display());
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let content_dir = folio.content_dir.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_refresh(&content_dir, &index) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Watch the content directory and rebuild the index on changes
fn watch_and_refresh(content_dir: &Path, index: &ContentIndex) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    if !content_dir.exists() {
        anyhow::bail!("content directory {} does not exist", content_dir.display());
    }
    debouncer
        .watcher()
        .watch(content_dir, RecursiveMode::Recursive)?;
    tracing::debug!("Watching: {:?}", content_dir);

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| is_relevant_change(&e.path))
                    .collect();
                if relevant.is_empty() {
                    continue;
                }

                for event in &relevant {
                    tracing::info!(path = %event.path.display(), "content changed");
                }
                let snapshot = index.refresh();
                tracing::info!(posts = snapshot.len(), "content index refreshed");
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Markdown files, directories and removed paths count; editor droppings and assets do not
fn is_relevant_change(path: &Path) -> bool {
    let ignored = path.components().any(|c| {
        matches!(c.as_os_str().to_str(), Some(".git") | Some(".DS_Store"))
    });
    if ignored || path.to_string_lossy().ends_with('~') {
        return false;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("md") | Some("mdx") => true,
        _ => path.is_dir() || !path.exists(),
    }
}

/// Static files from the configured directory, then the 404 page
async fn fallback_handler(
    State(state): State<AppState>,
    nonce: Option<Extension<CspNonce>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.static_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => pages::not_found(State(state), nonce).await.into_response(),
        Err(e) => {
            tracing::error!("static file error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
