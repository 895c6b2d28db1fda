//! Server-rendered pages and generated documents (sitemap, robots, manifest)

use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_TYPE, HOST},
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Response},
    Extension, Json,
};
use indexmap::IndexMap;
use serde::Deserialize;
use tera::Context;

use super::middleware::CspNonce;
use super::{ApiError, AppState};
use crate::content::related::related_posts;
use crate::content::taxonomy::category_tree;
use crate::content::{BlogPost, MarkdownRenderer, COPY_SCRIPT};
use crate::helpers::{category_url, escape_script, tag_url};
use crate::seo::robots::robots_txt;
use crate::seo::structured::{self, BreadcrumbItem};
use crate::seo::{
    blog_post_seo, category_seo, render_sitemap, sitemap_entries, tag_seo, PageMeta, SeoInput,
};
use crate::stats::site_stats;
use crate::templates::{category_items, page_context, BreadcrumbLink, PostCard, SiteData};

/// Posts shown on the home page
const RECENT_POSTS: usize = 6;

/// Related posts under an article
const RELATED_POSTS: usize = 3;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlogQuery {
    pub category: Option<String>,
    pub tag: Option<String>,
}

/// `GET /`
pub async fn home(
    State(state): State<AppState>,
    Extension(nonce): Extension<CspNonce>,
) -> Result<Html<String>, ApiError> {
    let snapshot = state.index.ensure();
    let today = state.counter.today();

    let recent: Vec<&BlogPost> = snapshot.all_posts().iter().take(RECENT_POSTS).collect();
    let views = views_of(&state, &recent).await;
    let cards: Vec<PostCard> = recent
        .iter()
        .map(|p| PostCard::new(p, views.get(&p.slug).copied()))
        .collect();

    let meta = PageMeta::build(
        &state.config,
        &SeoInput {
            title: Some("主页".to_string()),
            path: String::new(),
            ..Default::default()
        },
    );
    let json_ld = [
        structured::person(&state.config),
        structured::website(&state.config),
    ]
    .iter()
    .map(|v| structured::script_tag(v, Some(&nonce.0)))
    .collect::<Vec<_>>()
    .join("\n");

    let site = SiteData::new(&state.config, today);
    let mut context = page_context(&site, &meta.to_html(), &json_ld, &nonce.0, "home");
    context.insert(
        "stats",
        &site_stats(&snapshot, state.config.author.career_start.as_deref(), today),
    );
    context.insert("posts", &cards);

    render(&state, "home.html", &context)
}

/// `GET /blog`, optionally filtered by `?category=` or `?tag=`
pub async fn blog(
    State(state): State<AppState>,
    Extension(nonce): Extension<CspNonce>,
    Query(query): Query<BlogQuery>,
) -> Result<Html<String>, ApiError> {
    let snapshot = state.index.ensure();
    let config = &state.config;
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let mut posts: Vec<&BlogPost> = match (category, tag) {
        (Some(category), _) => snapshot.posts_by_category(category),
        (None, Some(tag)) => snapshot.posts_by_tag(tag),
        (None, None) => snapshot.all_posts().iter().collect(),
    };

    let views = views_of(&state, &posts).await;
    sort_by_views(&mut posts, &views);
    let cards: Vec<PostCard> = posts
        .iter()
        .map(|p| PostCard::new(p, Some(views.get(&p.slug).copied().unwrap_or(0))))
        .collect();

    let mut breadcrumb = vec![BreadcrumbLink::new("首页", "/"), BreadcrumbLink::new("博客", "/blog")];
    let (meta, heading, intro, filter_label, empty_message) = match (category, tag) {
        (Some(category), _) => {
            breadcrumb.push(BreadcrumbLink::new(category, category_url(category)));
            (
                category_seo(config, category, posts.len()),
                format!("{}分类", category),
                format!("查看{}分类下的所有技术文章，共{}篇精选内容", category, posts.len()),
                format!("「{}」分类", category),
                format!("分类\"{}\"下暂无文章", category),
            )
        }
        (None, Some(tag)) => {
            breadcrumb.push(BreadcrumbLink::new(format!("#{}", tag), tag_url(tag)));
            (
                tag_seo(config, tag, posts.len()),
                format!("#{}", tag),
                format!("查看包含{}标签的所有技术文章，共{}篇相关内容", tag, posts.len()),
                format!("「{}」标签", tag),
                format!("标签\"{}\"下暂无文章", tag),
            )
        }
        (None, None) => (
            PageMeta::build(
                config,
                &SeoInput {
                    title: Some("博客".to_string()),
                    description: Some("分享前端开发经验、技术心得和学习笔记".to_string()),
                    path: "/blog".to_string(),
                    ..Default::default()
                },
            ),
            "博客".to_string(),
            "分享前端开发经验、技术心得和学习笔记，记录技术成长的点点滴滴".to_string(),
            "全部文章".to_string(),
            "暂无文章".to_string(),
        ),
    };

    let json_ld = [
        structured::blog(config),
        structured::breadcrumb(config, &breadcrumb_items(&breadcrumb)),
    ]
    .iter()
    .map(|v| structured::script_tag(v, Some(&nonce.0)))
    .collect::<Vec<_>>()
    .join("\n");

    let site = SiteData::new(config, state.counter.today());
    let mut context = page_context(&site, &meta.to_html(), &json_ld, &nonce.0, "blog");
    context.insert("heading", &heading);
    context.insert("intro", &intro);
    context.insert("filter_label", &filter_label);
    context.insert("empty_message", &empty_message);
    context.insert("posts", &cards);
    context.insert("breadcrumb", &breadcrumb);
    context.insert("categories", &category_items(&category_tree(snapshot.all_posts())));
    context.insert("current_category", category.unwrap_or(""));
    context.insert("total", &snapshot.len());

    render(&state, "blog.html", &context)
}

/// `GET /blog/*slug`
pub async fn post(
    State(state): State<AppState>,
    Extension(nonce): Extension<CspNonce>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let snapshot = state.index.ensure();
    let Some(post) = snapshot.post_by_slug(&slug) else {
        return not_found_page(&state, &nonce, "文章未找到");
    };
    let config = &state.config;

    let content = state.renderer.render_article(&post.content, &post.relative_path);
    let toc = MarkdownRenderer::toc(&post.content);

    let related = related_posts(post, snapshot.all_posts(), RELATED_POSTS);
    let related: Vec<PostCard> = related.iter().map(|p| PostCard::new(p, None)).collect();

    let views = match state.counter.article_views(&post.slug).await {
        Ok(views) => Some(views),
        Err(e) => {
            tracing::warn!(slug = %post.slug, "failed to read article views: {}", e);
            None
        }
    };

    let breadcrumb = vec![
        BreadcrumbLink::new("首页", "/"),
        BreadcrumbLink::new("博客", "/blog"),
        BreadcrumbLink::new(post.category.clone(), category_url(&post.category)),
        BreadcrumbLink::new(post.title.clone(), post.url_path()),
    ];
    let json_ld = [
        structured::article(config, post),
        structured::breadcrumb(config, &breadcrumb_items(&breadcrumb)),
    ]
    .iter()
    .map(|v| structured::script_tag(v, Some(&nonce.0)))
    .collect::<Vec<_>>()
    .join("\n");

    let meta = blog_post_seo(config, post);
    let slug_json = serde_json::to_string(&post.slug).map_err(|e| ApiError::Internal(e.into()))?;

    let site = SiteData::new(config, state.counter.today());
    let mut context = page_context(&site, &meta.to_html(), &json_ld, &nonce.0, "blog");
    context.insert("post", &PostCard::new(post, views));
    context.insert("content", &content);
    context.insert("toc", &toc);
    context.insert("related", &related);
    context.insert("breadcrumb", &breadcrumb);
    context.insert("slug_json", &escape_script(&slug_json));
    context.insert("copy_script", COPY_SCRIPT);

    Ok(render(&state, "post.html", &context)?.into_response())
}

/// `GET /about`
pub async fn about(
    State(state): State<AppState>,
    Extension(nonce): Extension<CspNonce>,
) -> Result<Html<String>, ApiError> {
    let snapshot = state.index.ensure();
    let config = &state.config;
    let today = state.counter.today();

    let meta = PageMeta::build(
        config,
        &SeoInput {
            title: Some("关于我".to_string()),
            description: Some(if config.author.bio.is_empty() {
                config.description.clone()
            } else {
                config.author.bio.clone()
            }),
            path: "/about".to_string(),
            ..Default::default()
        },
    );
    let json_ld = structured::script_tag(&structured::person(config), Some(&nonce.0));

    let site = SiteData::new(config, today);
    let mut context = page_context(&site, &meta.to_html(), &json_ld, &nonce.0, "about");
    context.insert(
        "stats",
        &site_stats(&snapshot, config.author.career_start.as_deref(), today),
    );

    render(&state, "about.html", &context)
}

/// `GET /sitemap.xml`
pub async fn sitemap(State(state): State<AppState>) -> Response {
    let snapshot = state.index.ensure();
    let entries = sitemap_entries(&state.config, &snapshot, state.counter.today());
    (
        [(CONTENT_TYPE, "application/xml; charset=utf-8")],
        render_sitemap(&entries),
    )
        .into_response()
}

/// `GET /robots.txt`
pub async fn robots(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let host = headers.get(HOST).and_then(|h| h.to_str().ok());
    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_txt(&state.config, host),
    )
        .into_response()
}

/// `GET /manifest.webmanifest`
pub async fn manifest(State(state): State<AppState>) -> Response {
    (
        [(CONTENT_TYPE, "application/manifest+json")],
        Json(crate::seo::manifest::web_manifest(&state.config)),
    )
        .into_response()
}

/// 404 page for unknown routes
pub async fn not_found(
    State(state): State<AppState>,
    nonce: Option<Extension<CspNonce>>,
) -> Result<Response, ApiError> {
    let nonce = nonce.map(|Extension(n)| n).unwrap_or_else(CspNonce::generate);
    not_found_page(&state, &nonce, "页面不存在")
}

fn not_found_page(state: &AppState, nonce: &CspNonce, message: &str) -> Result<Response, ApiError> {
    let meta = PageMeta::build(
        &state.config,
        &SeoInput {
            title: Some(message.to_string()),
            noindex: true,
            ..Default::default()
        },
    );
    let site = SiteData::new(&state.config, state.counter.today());
    let mut context = page_context(&site, &meta.to_html(), "", &nonce.0, "");
    context.insert("message", message);

    let Html(html) = render(state, "not_found.html", &context)?;
    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}

fn render(state: &AppState, template: &str, context: &Context) -> Result<Html<String>, ApiError> {
    state
        .templates
        .render(template, context)
        .map(Html)
        .map_err(|e| ApiError::Internal(e.context(format!("rendering {}", template))))
}

/// View counts of the given posts; a failing store only hides the numbers
async fn views_of(state: &AppState, posts: &[&BlogPost]) -> IndexMap<String, u64> {
    let slugs: Vec<String> = posts.iter().map(|p| p.slug.clone()).collect();
    match state.counter.batch_article_views(&slugs).await {
        Ok(views) => views,
        Err(e) => {
            tracing::warn!(count = slugs.len(), "failed to read article views: {}", e);
            IndexMap::new()
        }
    }
}

/// Most viewed first; equal counts keep newest first
pub fn sort_by_views(posts: &mut [&BlogPost], views: &IndexMap<String, u64>) {
    posts.sort_by(|a, b| {
        let va = views.get(&a.slug).copied().unwrap_or(0);
        let vb = views.get(&b.slug).copied().unwrap_or(0);
        vb.cmp(&va).then_with(|| b.date.cmp(&a.date))
    });
}

fn breadcrumb_items(links: &[BreadcrumbLink]) -> Vec<BreadcrumbItem> {
    links
        .iter()
        .map(|l| BreadcrumbItem::new(l.name.clone(), l.url.clone()))
        .collect()
}
