//! HTTP server rendering pages on demand
//!
//! The home page is cached and revalidated in the background once it is
//! older than `revalidate` seconds. A post that has not been rendered yet
//! gets the loading placeholder while a single background task renders it.
//! Preview requests skip the cache.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{CookieManagerLayer, Cookie, Cookies};
use tower_http::trace::TraceLayer;

use crate::cache::{Lookup, PageCache};
use crate::cms::{CmsError, Cursor};
use crate::helpers::{load_more_path, post_path};
use crate::pages::{self, ListingState, LoadMoreResponse, PageRenderer, PostSettings, RenderMode};
use crate::Blog;

/// Route of the home page in the cache
const INDEX_ROUTE: &str = "/";

/// Errors a handler can answer with
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Cms(#[from] CmsError),

    #[error(transparent)]
    Render(#[from] anyhow::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Cms(CmsError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ServerError::Cms(CmsError::InvalidCursor(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_not_found(&self) -> bool {
        matches!(self, ServerError::Cms(e) if e.is_not_found())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Request failed: {}", self);
                "Internal server error".to_string()
            }
            StatusCode::NOT_FOUND => "Not found".to_string(),
            _ => self.to_string(),
        };
        (status, body).into_response()
    }
}

/// Server state
pub struct AppState {
    blog: Blog,
    renderer: PageRenderer,
    settings: PostSettings,
    cache: PageCache,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(blog: &Blog) -> Result<SharedState> {
        blog.config.validate()?;
        let revalidate = Duration::from_secs(blog.config.revalidate);
        Ok(Arc::new(Self {
            blog: blog.clone(),
            renderer: blog.renderer()?,
            settings: PostSettings::from(&blog.config),
            cache: PageCache::new(revalidate),
        }))
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    fn revalidate(&self) -> Duration {
        Duration::from_secs(self.blog.config.revalidate)
    }

    /// The preview ref carried by the request, if any
    fn preview_ref(&self, cookies: &Cookies) -> Option<String> {
        cookies
            .get(&self.blog.config.preview.cookie)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    async fn render_listing(&self, revision: Option<&str>) -> Result<String, ServerError> {
        let state = ListingState::load(
            self.blog.api.as_ref(),
            &self.blog.config.cms,
            revision,
            self.renderer.formatter(),
        )
        .await?;
        Ok(self.renderer.listing(&state)?)
    }

    async fn render_post(&self, slug: &str, mode: &RenderMode) -> Result<String, ServerError> {
        let page = pages::resolve(self.blog.api.as_ref(), &self.settings, slug, mode).await?;
        Ok(self.renderer.post(&page)?)
    }

    fn not_found_page(&self) -> Response {
        match self.renderer.not_found() {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(e) => ServerError::Render(e).into_response(),
        }
    }

    /// Render the home page and every listed post into the cache
    pub async fn warm(&self) -> Result<()> {
        let html = self.render_listing(None).await?;
        self.cache.store(INDEX_ROUTE, html);

        let slugs = pages::static_paths(self.blog.api.as_ref(), &self.blog.config.cms).await?;
        let mut rendered = 0;
        for slug in slugs {
            match self.render_post(&slug, &RenderMode::Published).await {
                Ok(html) => {
                    self.cache.store(&post_path(&slug), html);
                    rendered += 1;
                }
                Err(e) => tracing::warn!("Could not pre-render {}: {}", slug, e),
            }
        }

        tracing::info!("Pre-rendered {} posts", rendered);
        Ok(())
    }
}

/// Re-render the home page after it went stale
fn spawn_listing_refresh(state: SharedState) {
    tokio::spawn(async move {
        match state.render_listing(None).await {
            Ok(html) => {
                state.cache.store(INDEX_ROUTE, html);
                tracing::debug!("Revalidated {}", INDEX_ROUTE);
            }
            Err(e) => {
                tracing::error!("Failed to revalidate {}: {}", INDEX_ROUTE, e);
                state.cache.release(INDEX_ROUTE);
            }
        }
    });
}

/// Render a post that was requested before it existed in the cache
fn spawn_post_render(state: SharedState, slug: String) {
    tokio::spawn(async move {
        let route = post_path(&slug);
        match state.render_post(&slug, &RenderMode::Published).await {
            Ok(html) => {
                state.cache.store(&route, html);
                tracing::debug!("Rendered {} on demand", route);
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("No post at {}", route);
                state.cache.mark_not_found(&route);
            }
            Err(e) => {
                tracing::error!("Failed to render {}: {}", route, e);
                state.cache.release(&route);
            }
        }
    });
}

/// Build the router
pub fn router(state: SharedState) -> Router {
    let exit_route = state.blog.config.preview.exit_route.clone();

    Router::new()
        .route("/", get(index_handler))
        .route("/post/:slug", get(post_handler))
        .route("/api/posts", get(load_more_handler))
        .route("/api/preview", get(preview_handler))
        .route(&exit_route, get(exit_preview_handler))
        .fallback(fallback_handler)
        .with_state(state)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let state = AppState::new(blog)?;
    if let Err(e) = state.warm().await {
        tracing::warn!("Pre-rendering failed: {}", e);
    }
    if state.cache().is_empty() {
        tracing::warn!("Starting with an empty cache, pages render on first request");
    }

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    // Open browser if requested
    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(
    State(state): State<SharedState>,
    cookies: Cookies,
) -> Result<Html<String>, ServerError> {
    if let Some(revision) = state.preview_ref(&cookies) {
        return Ok(Html(state.render_listing(Some(&revision)).await?));
    }

    match state.cache.get(INDEX_ROUTE, Some(state.revalidate())) {
        Lookup::Hit { html, refresh } => {
            if refresh {
                spawn_listing_refresh(state.clone());
            }
            Ok(Html(html))
        }
        _ => {
            let html = state.render_listing(None).await?;
            state.cache.store(INDEX_ROUTE, html.clone());
            Ok(Html(html))
        }
    }
}

async fn post_handler(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    cookies: Cookies,
) -> Result<Response, ServerError> {
    if let Some(revision) = state.preview_ref(&cookies) {
        let mode = RenderMode::Preview { revision };
        return match state.render_post(&slug, &mode).await {
            Ok(html) => Ok(Html(html).into_response()),
            Err(e) if e.is_not_found() => Ok(state.not_found_page()),
            Err(e) => Err(e),
        };
    }

    let route = post_path(&slug);
    match state.cache.get(&route, None) {
        Lookup::Hit { html, .. } => Ok(Html(html).into_response()),
        Lookup::NotFound => Ok(state.not_found_page()),
        Lookup::Pending => Ok(Html(state.renderer.loading()?).into_response()),
        Lookup::Miss => {
            if state.cache.claim(&route) {
                spawn_post_render(state.clone(), slug);
            }
            Ok(Html(state.renderer.loading()?).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoadMoreParams {
    cursor: Option<String>,
}

async fn load_more_handler(
    State(state): State<SharedState>,
    Query(params): Query<LoadMoreParams>,
) -> Result<Json<LoadMoreResponse>, ServerError> {
    let cursor = params
        .cursor
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ServerError::BadRequest("missing cursor".to_string()))?;

    let page = pages::fetch_more(
        state.blog.api.as_ref(),
        &Cursor::new(cursor),
        state.renderer.formatter(),
    )
    .await?;
    let next_url = page.next_page.as_ref().map(|c| load_more_path(c.as_str()));
    Ok(Json(page.with_next_url(next_url)))
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// Enter preview mode and go to the previewed document
async fn preview_handler(
    State(state): State<SharedState>,
    Query(params): Query<PreviewParams>,
    cookies: Cookies,
) -> Result<Redirect, ServerError> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServerError::BadRequest("missing preview token".to_string()))?;

    let location = match params.document_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => {
            let doc = state.blog.api.get_by_id(id, Some(token.as_str())).await?;
            doc.uid.map(|uid| post_path(&uid)).unwrap_or_else(|| "/".to_string())
        }
        None => "/".to_string(),
    };

    let mut cookie = Cookie::new(state.blog.config.preview.cookie.clone(), token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookies.add(cookie);

    tracing::debug!("Entering preview, redirecting to {}", location);
    Ok(Redirect::to(&location))
}

/// Leave preview mode
async fn exit_preview_handler(State(state): State<SharedState>, cookies: Cookies) -> Redirect {
    let mut cookie = Cookie::new(state.blog.config.preview.cookie.clone(), "");
    cookie.set_path("/");
    cookies.remove(cookie);
    Redirect::to("/")
}

async fn fallback_handler(State(state): State<SharedState>) -> Response {
    state.not_found_page()
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
