//! Catalog API, health and cross-cutting HTTP behaviour.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

mod common;

use media_relay::catalog::MediaRecord;
use media_relay::{Catalog, HttpServer};

fn record(category: &str, index: usize, title: &str) -> MediaRecord {
    MediaRecord {
        id: format!("{category}-{index}"),
        title: title.to_string(),
        poster_url: format!("http://img.example/{category}/{index}.jpg"),
        source_url: format!("http://cdn.example/{category}/{index}.mp4"),
        category: category.to_string(),
    }
}

fn router() -> Router {
    let config = common::test_config();
    let catalog = Catalog::from_records(
        &config.catalog,
        vec![
            record("Español", 0, "El Laberinto del Fauno"),
            record("Español", 1, "Relatos Salvajes"),
            record("Ingles", 0, "The Matrix"),
            record("Ingles", 1, "Matrix Reloaded"),
            record("Ingles", 2, "Alien"),
            record("Frances", 0, "La Haine"),
        ],
    );
    HttpServer::new(config, catalog).unwrap().router()
}

async fn get(router: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, json)
}

fn ids(page: &Value) -> Vec<String> {
    page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn movies_lists_everything_by_default() {
    let (status, headers, page) = get(router(), "/api/movies").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert_eq!(page["total"], 6);
    assert_eq!(page["data"].as_array().unwrap().len(), 6);

    let first = &page["data"][0];
    assert_eq!(first["id"], "Español-0");
    assert_eq!(first["title"], "El Laberinto del Fauno");
    assert_eq!(first["poster"], "http://img.example/Español/0.jpg");
    assert_eq!(first["url"], "http://cdn.example/Español/0.mp4");
    assert_eq!(first["category"], "Español");
}

#[tokio::test]
async fn movies_filters_by_category_and_title() {
    let (_, _, page) = get(router(), "/api/movies?cat=Ingles&q=matrix").await;
    assert_eq!(page["total"], 2);
    assert_eq!(ids(&page), ["Ingles-0", "Ingles-1"]);

    let (_, _, page) = get(router(), "/api/movies?cat=Todas&q=LA").await;
    assert_eq!(ids(&page), ["Español-0", "Español-1", "Frances-0"]);

    let (_, _, page) = get(router(), "/api/movies?cat=Espa%C3%B1ol").await;
    assert_eq!(ids(&page), ["Español-0", "Español-1"]);

    let (_, _, page) = get(router(), "/api/movies?cat=Aleman").await;
    assert_eq!(page["total"], 0);
    assert_eq!(page["data"], Value::Array(vec![]));

    let (_, _, page) = get(router(), "/api/movies?cat=").await;
    assert_eq!(page["total"], 0);

    let (_, _, page) = get(router(), "/api/movies?q=%20Matrix").await;
    assert_eq!(ids(&page), ["Ingles-0"]);
}

#[tokio::test]
async fn movies_paginates_after_filtering() {
    let (_, _, page) = get(router(), "/api/movies?offset=2&limit=3").await;
    assert_eq!(page["total"], 6);
    assert_eq!(ids(&page), ["Ingles-0", "Ingles-1", "Ingles-2"]);

    let (_, _, page) = get(router(), "/api/movies?cat=Ingles&offset=2&limit=5").await;
    assert_eq!(page["total"], 3);
    assert_eq!(ids(&page), ["Ingles-2"]);

    let (_, _, page) = get(router(), "/api/movies?offset=100").await;
    assert_eq!(page["total"], 6);
    assert!(page["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn movies_random_returns_same_set() {
    let (_, _, page) = get(router(), "/api/movies?random=true&cat=Ingles").await;
    let mut got = ids(&page);
    got.sort();
    assert_eq!(got, ["Ingles-0", "Ingles-1", "Ingles-2"]);
}

#[tokio::test]
async fn movies_rejects_malformed_pagination() {
    let (status, _, _) = get(router(), "/api/movies?limit=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn categories_lead_with_sentinel() {
    let (status, _, body) = get(router(), "/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!([
            {"name": "Todas", "count": 6},
            {"name": "Español", "count": 2},
            {"name": "Ingles", "count": 3},
            {"name": "Frances", "count": 1},
        ])
    );
}

#[tokio::test]
async fn health_reports_record_count() {
    let (status, _, body) = get(router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "operational");
    assert_eq!(body["records"], 6);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _, _) = get(router(), "/api/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let (_, headers, _) = get(router(), "/health").await;
    let id = headers["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());

    let response = router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "client-supplied")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "client-supplied");
}

#[tokio::test]
async fn cors_allows_any_origin_and_exposes_range_headers() {
    let response = router()
        .oneshot(
            Request::builder()
                .uri("/api/categories")
                .header("origin", "http://player.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let exposed = response.headers()["access-control-expose-headers"]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains("content-range"));
    assert!(exposed.contains("accept-ranges"));

    let preflight = router()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/video-proxy")
                .header("origin", "http://player.example")
                .header("access-control-request-method", "GET")
                .header("access-control-request-headers", "range")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(preflight.status(), StatusCode::OK);
    assert_eq!(preflight.headers()["access-control-allow-origin"], "*");
    assert!(to_bytes(preflight.into_body(), 1024).await.unwrap().is_empty());
}

#[tokio::test]
async fn cors_can_be_disabled() {
    let mut config = common::test_config();
    config.cors.enabled = false;
    let catalog = Catalog::from_records(&config.catalog, Vec::new());
    let router = HttpServer::new(config, catalog).unwrap().router();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "http://player.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn catalog_loaded_from_disk_is_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("espanol.json"),
        r#"[{"title": "", "poster": "p.jpg", "url": "http://cdn.example/1.mp4"}]"#,
    )
    .unwrap();

    let mut config = common::test_config();
    config.catalog.data_dir = dir.path().to_string_lossy().into_owned();
    let catalog = Catalog::load(&config.catalog);
    let server = common::start_server(config, catalog).await;

    let page: Value = common::client()
        .get(server.url("/api/movies"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["id"], "Español-0");
    assert_eq!(page["data"][0]["title"], "Sin título");
    assert_eq!(page["data"][0]["poster"], "p.jpg");
}
