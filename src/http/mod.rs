//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, tracing span)
//!     → middleware/cors.rs (CORS headers, preflight)
//!     → handlers.rs
//!         /video-proxy     → relay subsystem
//!         /api/movies      → catalog query
//!         /api/categories  → catalog grouping
//!         /health          → liveness
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
