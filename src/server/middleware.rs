//! Request middleware: canonical host and path redirects, CSP nonce, security and cache headers

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{CACHE_CONTROL, HOST, LOCATION},
        HeaderMap, HeaderName, HeaderValue, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use base64::Engine;
use lazy_static::lazy_static;
use regex::Regex;

use super::AppState;
use crate::config::ServerConfig;

lazy_static! {
    static ref ASSET_PATH: Regex =
        Regex::new(r"\.(ico|png|jpg|jpeg|gif|svg|webp|avif|woff|woff2|ttf|eot)$").unwrap();
}

const IMMUTABLE: &str = "public, max-age=31536000, immutable";
const NO_STORE: &str = "no-store, max-age=0";

/// Per-request CSP nonce, available to handlers as an extension
#[derive(Debug, Clone)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// 16 random bytes, base64
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(base64::engine::general_purpose::STANDARD.encode(bytes))
    }
}

/// `www.` hosts go to the bare host; `/index`, `/home` and trailing slashes are normalised
pub async fn redirects(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let uri = request.uri();
    let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");

    if let Some(host) = request.headers().get(HOST).and_then(|h| h.to_str().ok()) {
        if let Some(bare) = host.strip_prefix("www.") {
            let scheme = forwarded_proto(request.headers())
                .unwrap_or(if state.config.is_production() { "https" } else { "http" });
            let location = format!("{}://{}{}", scheme, bare, path_and_query);
            tracing::debug!(host, location = %location, "redirecting to bare host");
            return (StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response();
        }
    }

    if let Some(target) = normalized_path(uri.path()) {
        let location = match uri.query() {
            Some(query) => format!("{}?{}", target, query),
            None => target,
        };
        return Redirect::permanent(&location).into_response();
    }

    next.run(request).await
}

fn forwarded_proto(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| *v == "http" || *v == "https")
}

/// Canonical form of a page path, or `None` when it is already canonical
pub fn normalized_path(path: &str) -> Option<String> {
    match path {
        "/index" | "/home" => return Some("/".to_string()),
        "/" => return None,
        _ => {}
    }
    if path.starts_with("/api/") || path.starts_with("/static/") {
        return None;
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.len() == path.len() {
        return None;
    }
    Some(if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() })
}

/// Generate the nonce, run the request and decorate the response with security and cache headers
pub async fn security_headers(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let nonce = CspNonce::generate();
    let path = request.uri().path().to_string();
    request.extensions_mut().insert(nonce.clone());

    let mut response = next.run(request).await;
    let csp = content_security_policy(&state.config.server, state.config.is_production(), &nonce.0);

    let headers = response.headers_mut();
    set(headers, "x-nonce", &nonce.0);
    set(headers, "x-dns-prefetch-control", "on");
    set(headers, "x-content-type-options", "nosniff");
    set(headers, "referrer-policy", "strict-origin-when-cross-origin");
    set(headers, "x-frame-options", "DENY");
    set(headers, "content-security-policy", &csp);
    set(headers, "strict-transport-security", "max-age=15552000; includeSubDomains");
    set(
        headers,
        "permissions-policy",
        "geolocation=(), microphone=(), camera=(), browsing-topics=()",
    );

    if !headers.contains_key(CACHE_CONTROL) {
        if let Some(policy) = cache_policy(&path) {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static(policy));
        }
    }

    response
}

fn set(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(e) => tracing::warn!(header = name, "invalid header value: {}", e),
    }
}

/// Cache-Control for responses that did not set one
pub fn cache_policy(path: &str) -> Option<&'static str> {
    if path.starts_with("/api/") {
        Some(NO_STORE)
    } else if path.starts_with("/static/") || ASSET_PATH.is_match(path) {
        Some(IMMUTABLE)
    } else {
        None
    }
}

/// Content-Security-Policy for one response
pub fn content_security_policy(server: &ServerConfig, production: bool, nonce: &str) -> String {
    let mut directives = vec![
        "default-src 'self'".to_string(),
        "style-src 'self' 'unsafe-inline'".to_string(),
        "img-src 'self' data: https:".to_string(),
        "font-src 'self' data:".to_string(),
        "frame-ancestors 'none'".to_string(),
        "base-uri 'self'".to_string(),
        "form-action 'self'".to_string(),
    ];

    let mut script = vec!["'self'".to_string(), format!("'nonce-{}'", nonce)];
    let mut connect = vec!["'self'".to_string()];
    if !production {
        // dev tooling: eval-based source maps and websocket reloaders
        script.push("'unsafe-eval'".to_string());
        script.push("blob:".to_string());
        connect.push("ws:".to_string());
        connect.push("wss:".to_string());
    }
    script.extend(server.script_sources.iter().cloned());
    connect.extend(server.connect_sources.iter().cloned());

    directives.push(format!("script-src {}", script.join(" ")));
    directives.push(format!("connect-src {}", connect.join(" ")));
    if !server.frame_sources.is_empty() {
        directives.push(format!("frame-src {}", server.frame_sources.join(" ")));
    }

    directives.join("; ")
}
