//! HTTP API for the review catalog.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/reviews?q=&domain=&year=&tags=a,b` | Published reviews, optionally searched |
//! | `POST` | `/api/reviews` | Create a review |
//! | `GET`  | `/api/reviews/{nid}/{slug}` | One review by public key |
//! | `GET`  | `/api/reviews/domain/{domain}` | Reviews in a domain |
//! | `GET`  | `/api/reviews/tag/{tag}` | Reviews carrying a tag |
//! | `GET`  | `/api/domains` | Distinct domains |
//! | `GET`  | `/api/tags` | Distinct tags |
//! | `GET`  | `/api/discover?q=&domain=&year=&tags=&readingTime=&sort=&page=` | Full discovery pipeline, one page |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "review not found: 1/missing" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use mlp_reviews_core::discovery::{DiscoveryOptions, DiscoveryView, ViewStatus};
use mlp_reviews_core::models::{
    NewReview, ReadingTimeBucket, RepositoryFilters, Review, SearchFilters, SortKey,
};
use mlp_reviews_core::store::ReviewStore;

use crate::config::Config;
use crate::db;
use crate::search::{discover, DiscoveryRequest};
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReviewStore>,
    pub options: DiscoveryOptions,
}

impl AppState {
    pub fn new(store: Arc<dyn ReviewStore>, options: DiscoveryOptions) -> Self {
        Self { store, options }
    }
}

/// Starts the HTTP server on `[server].bind` over the SQLite store.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let state = AppState::new(
        Arc::new(SqliteStore::new(pool)),
        config.discovery_options(),
    );

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("listening on http://{}", config.server.bind);
    println!("MLP Reviews server listening on http://{}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/reviews", get(handle_list_reviews).post(handle_create_review))
        .route("/api/reviews/domain/{domain}", get(handle_by_domain))
        .route("/api/reviews/tag/{tag}", get(handle_by_tag))
        .route("/api/reviews/{nid}/{slug}", get(handle_get_review))
        .route("/api/domains", get(handle_domains))
        .route("/api/tags", get(handle_tags))
        .route("/api/discover", get(handle_discover))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, code = %self.code, "{}", self.message);
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: format!("{:#}", err),
    }
}

/// Validation failures surface as 400; everything else the store reports is a 500.
fn classify_store_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();
    if msg.starts_with("invalid review") {
        bad_request(msg)
    } else {
        internal(err)
    }
}

// ============ Query parsing ============

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn split_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Zero, negative, or unparseable pages fall back to the first page.
fn parse_page(raw: Option<&str>) -> usize {
    raw.and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .map(|p| usize::try_from(p).unwrap_or(usize::MAX))
        .unwrap_or(1)
}

#[derive(Debug, Deserialize, Default)]
struct ReviewsQuery {
    q: Option<String>,
    domain: Option<String>,
    year: Option<String>,
    tags: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct DiscoverQuery {
    q: Option<String>,
    domain: Option<String>,
    year: Option<String>,
    tags: Option<String>,
    reading_time: Option<String>,
    sort: Option<String>,
    page: Option<String>,
}

// ============ Handlers ============

async fn handle_list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ReviewsQuery>,
) -> Result<Json<Vec<Review>>, AppError> {
    let query = non_empty(params.q).unwrap_or_default();
    let filters = RepositoryFilters {
        domain: non_empty(params.domain),
        year: non_empty(params.year),
        tags: split_tags(params.tags.as_deref()),
    };

    let reviews = if query.is_empty() && filters.is_empty() {
        state.store.list_published().await
    } else {
        state.store.search(&query, &filters).await
    }
    .map_err(internal)?;

    Ok(Json(reviews))
}

async fn handle_get_review(
    State(state): State<AppState>,
    Path((nid, slug)): Path<(String, String)>,
) -> Result<Json<Review>, AppError> {
    state
        .store
        .get_by_nid_and_slug(&nid, &slug)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found(format!("review not found: {}/{}", nid, slug)))
}

async fn handle_by_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = state.store.list_by_domain(&domain).await.map_err(internal)?;
    Ok(Json(reviews))
}

async fn handle_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = state.store.list_by_tag(&tag).await.map_err(internal)?;
    Ok(Json(reviews))
}

async fn handle_domains(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store.list_domains().await.map_err(internal)?))
}

async fn handle_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store.list_tags().await.map_err(internal)?))
}

async fn handle_create_review(
    State(state): State<AppState>,
    payload: Result<Json<NewReview>, JsonRejection>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let Json(review) = payload.map_err(|e| bad_request(e.body_text()))?;
    let created = state
        .store
        .create_review(review)
        .await
        .map_err(classify_store_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Runs the discovery pipeline for one request. Highlighted text is
/// HTML-escaped around the markers.
async fn handle_discover(
    State(state): State<AppState>,
    Query(params): Query<DiscoverQuery>,
) -> Result<Json<DiscoveryView>, AppError> {
    let sort = match non_empty(params.sort) {
        Some(raw) => raw
            .parse::<SortKey>()
            .map_err(|e| bad_request(e.to_string()))?,
        None => SortKey::default(),
    };

    let request = DiscoveryRequest {
        filters: SearchFilters {
            query: params.q.unwrap_or_default(),
            domain: non_empty(params.domain),
            year: non_empty(params.year),
            tags: split_tags(params.tags.as_deref()),
            reading_time: params
                .reading_time
                .as_deref()
                .and_then(ReadingTimeBucket::parse_lenient),
        },
        sort,
        page: parse_page(params.page.as_deref()),
    };

    let options = DiscoveryOptions {
        html_highlights: true,
        ..state.options.clone()
    };
    let mut controller = discover(state.store.as_ref(), options, &request).await;
    let view = controller.view();
    controller.unmount();

    if let ViewStatus::LoadError { message } = &view.status {
        return Err(internal(anyhow::anyhow!("unable to load reviews: {}", message)));
    }

    Ok(Json(view))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
