//! Cross-origin access for browser players.
//!
//! Players on other origins need to send `Range` and read the range
//! headers of relayed responses.

use axum::http::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Permissive CORS policy: any origin, `Range` allowed, range headers exposed.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([RANGE])
        .expose_headers([CONTENT_RANGE, ACCEPT_RANGES, CONTENT_LENGTH])
}
