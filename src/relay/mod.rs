//! Streaming video relay subsystem.
//!
//! # Data Flow
//! ```text
//! GET /video-proxy?url=<target> (+ Range)
//!     → request.rs (decode + validate target, capture Range)
//!     → upstream.rs (dispatch with synthetic headers, under deadline)
//!         ↺ redirect.rs (301/302/307/308 → next Hop, bounded depth)
//!     → upstream.rs (mirror status, derive playback headers)
//!     → body.rs (chunk-by-chunk pass-through, idle timeout, drop = cancel)
//!     → Client
//! ```
//!
//! # Failure Handling
//! - Before any response byte: error.rs maps the failure to 400/502/504
//!   with an empty body
//! - After headers are sent: the body stream errors and the connection is
//!   aborted; the client sees a truncated body

pub mod body;
pub mod error;
pub mod redirect;
pub mod request;
pub mod upstream;

pub use error::RelayError;
pub use redirect::Hop;
pub use request::RelayRequest;
pub use upstream::{Relay, RelaySettings, RelaySetupError, UpstreamResponse};
