//! Request handlers.

use axum::extract::{Query, RawQuery, State};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::catalog::{CatalogPage, CatalogQuery, CategoryCount};
use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub records: usize,
}

/// `GET|HEAD /video-proxy?url=...`
pub async fn video_proxy(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    state.relay.handle(&method, query.as_deref(), &headers).await
}

/// `GET /api/movies`
pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Json<CatalogPage> {
    metrics::record_catalog_query();
    tracing::debug!(q = ?query.q, cat = ?query.cat, random = query.random, "Catalog query");
    Json(state.catalog.query(&query))
}

/// `GET /api/categories`
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategoryCount>> {
    Json(state.catalog.categories())
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        records: state.catalog.len(),
    })
}
