use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, services::ServeFile,
    trace::TraceLayer,
};
use tracing::{debug, info};

use crate::{
    article::{ArticleListResponse, ArticleResponse, ArticleService},
    error::RestError,
    http::{image::resolve_image_path, query::ListQuery, response::with_image_headers},
};

#[derive(Clone)]
pub struct AppState {
    pub articles: Arc<ArticleService>,
}

impl AppState {
    pub fn new(articles: Arc<ArticleService>) -> Self {
        Self { articles }
    }
}

pub const ROUTES: &[(&str, &str, &str)] = &[
    ("GET", "/", "Root health check"),
    ("GET", "/api/health", "API health check"),
    ("GET", "/api/articles", "List articles"),
    ("GET", "/api/articles/{slug}", "Get article by slug"),
    ("GET", "/api/articles/{slug}/image/{filename}", "Serve image"),
    ("POST", "/api/refresh", "Refresh cache"),
];

/// The full API. CORS is layered on by the caller since it depends on
/// configuration.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/articles", get(list_articles))
        .route("/api/articles/{slug}", get(get_article))
        .route("/api/articles/{slug}/", get(get_article))
        .route("/api/articles/{slug}/image/{filename}", get(serve_image))
        .route("/api/refresh", post(refresh))
        .fallback(not_found)
        .layer(CompressionLayer::new())
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "Backend is running. API routes are under /api",
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ArticleListResponse> {
    let (page, limit) = query.normalize();
    Json(state.articles.get_articles(page, limit))
}

async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ArticleResponse>, RestError> {
    let slug = slug.trim_end_matches('/');

    let article = state
        .articles
        .get_article(slug)
        .ok_or(RestError::ArticleNotFound)?;

    Ok(Json(ArticleResponse { article }))
}

/// Serves a validated image path through `ServeFile`, which handles `Range`,
/// `Last-Modified` and conditional requests.
async fn serve_image(
    State(state): State<AppState>,
    Path((slug, filename)): Path<(String, String)>,
    request: Request,
) -> Result<Response, RestError> {
    let path = resolve_image_path(state.articles.articles_dir(), &slug, &filename)
        .ok_or(RestError::ImageNotFound)?;

    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        debug!("no image at {}", path.display());
        return Err(RestError::ImageNotFound);
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let response = ServeFile::new(&path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});

    Ok(with_image_headers(response.map(Body::new), &name))
}

async fn refresh(State(state): State<AppState>) -> Result<Json<Value>, RestError> {
    info!("article cache refresh requested");

    let articles = Arc::clone(&state.articles);
    tokio::task::spawn_blocking(move || articles.refresh_cache()).await??;

    Ok(Json(json!({"status": "cache refreshed"})))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    debug!("no route matched {}", uri.path());

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "path": uri.path(),
            "message": "Route not found. Available: /api/health, /api/articles, /api/articles/{slug}",
        })),
    )
}
