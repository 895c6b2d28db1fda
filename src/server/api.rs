//! JSON API: view counters and the article list

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, USER_AGENT,
        },
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{AppState, ApiError};
use crate::content::PostSummary;
use crate::views::{backend_status, BackendStatus, GuardDecision};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Article,
    Site,
    /// Any other `type`; counts nothing
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementRequest {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: ViewKind,
    #[serde(default = "default_include_site")]
    pub include_site: bool,
}

fn default_include_site() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ViewsQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub slug: Option<String>,
    /// Comma-separated slugs for `type=batch`
    pub slugs: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_views: Option<IndexMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today_views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throttled: Option<bool>,
}

/// `POST /api/views/increment`
pub async fn increment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ViewsResponse>, ApiError> {
    let request: IncrementRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))?;

    let slug = request
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if request.kind == ViewKind::Article && slug.is_none() {
        return Err(ApiError::bad_request("Article slug is required"));
    }

    let ip = client_ip(&headers);
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    match state.guard.check(slug, &ip, user_agent).await {
        GuardDecision::Bot => {
            return Ok(Json(ViewsResponse {
                skipped: Some(true),
                ..Default::default()
            }))
        }
        GuardDecision::Throttled => {
            tracing::debug!(slug = slug.unwrap_or("site"), ip = %ip, "view throttled");
            return Ok(Json(ViewsResponse {
                throttled: Some(true),
                ..Default::default()
            }));
        }
        GuardDecision::Allow => {}
    }

    let mut response = ViewsResponse::default();
    if let (ViewKind::Article, Some(slug)) = (request.kind, slug) {
        response.article_views = Some(state.counter.increment_article(slug).await?);
    }
    if request.kind != ViewKind::Unknown && request.include_site {
        response.site_views = Some(state.counter.increment_site().await?);
        response.today_views = Some(state.counter.increment_today().await?);
    }

    Ok(Json(response))
}

/// `GET /api/views/get`
pub async fn get_views(
    State(state): State<AppState>,
    Query(query): Query<ViewsQuery>,
) -> Result<Json<ViewsResponse>, ApiError> {
    let kind = query.kind.as_deref().unwrap_or("article");
    let slug = query.slug.as_deref().filter(|s| !s.is_empty());
    let mut response = ViewsResponse::default();

    match (kind, slug) {
        ("article", Some(slug)) => {
            response.article_views = Some(state.counter.article_views(slug).await?);
            response.site_views = Some(state.counter.site_views().await?);
        }
        ("batch", _) => {
            if let Some(slugs) = query.slugs.as_deref() {
                let slugs = parse_slug_list(slugs);
                response.batch_views = Some(state.counter.batch_article_views(&slugs).await?);
            }
        }
        ("site", _) => {
            response.site_views = Some(state.counter.site_views().await?);
            response.today_views = Some(state.counter.today_views().await?);
        }
        _ => {}
    }

    tracing::debug!(kind, slug = slug.unwrap_or("none"), "views queried");
    Ok(Json(response))
}

/// `GET /api/views/status`
pub async fn status(State(state): State<AppState>) -> Json<BackendStatus> {
    Json(backend_status(&state.config, state.counter.store().as_ref()))
}

/// `POST /api/views/reset`, development or explicitly allowed deployments only
pub async fn reset(State(state): State<AppState>) -> Result<Json<ViewsResponse>, ApiError> {
    state.counter.reset_all().await?;
    Ok(Json(ViewsResponse {
        site_views: Some(state.counter.site_views().await?),
        today_views: Some(state.counter.today_views().await?),
        ..Default::default()
    }))
}

/// `GET /api/content/posts`
pub async fn posts(State(state): State<AppState>) -> Json<Vec<PostSummary>> {
    let snapshot = state.index.ensure();
    let posts = snapshot.summaries();
    tracing::debug!(count = posts.len(), "article list queried");
    Json(posts)
}

/// CORS preflight for the API routes
pub async fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
        .into_response()
}

/// First `x-forwarded-for` entry, then `x-real-ip`, else `unknown`
pub fn client_ip(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
        .unwrap_or("unknown")
        .to_string()
}

fn parse_slug_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
