//! Redirect chasing as an explicit `(url, depth)` accumulator.
//!
//! # State Transitions
//! ```text
//! Hop { url, depth }
//!     → upstream answers 301/302/307/308 with Location
//!         → Hop { join(url, Location), depth + 1 }   (depth ≤ max_redirects)
//!         → TooManyRedirects                        (depth > max_redirects)
//!     → anything else
//!         → relay this response
//! ```

use axum::http::{HeaderValue, StatusCode};
use url::Url;

use crate::relay::error::RelayError;

/// Statuses that are chased on the client's behalf.
pub const REDIRECT_STATUSES: [StatusCode; 4] = [
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::TEMPORARY_REDIRECT,
    StatusCode::PERMANENT_REDIRECT,
];

pub fn is_redirect(status: StatusCode) -> bool {
    REDIRECT_STATUSES.contains(&status)
}

/// One upstream attempt in a redirect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub url: Url,
    /// Number of redirects followed to reach this hop.
    pub depth: u32,
}

impl Hop {
    pub fn first(url: Url) -> Self {
        Self { url, depth: 0 }
    }

    /// Decide where an upstream response leads.
    ///
    /// Returns `Ok(None)` when the response should be relayed as-is, which
    /// includes redirect statuses without a `Location` header.
    pub fn follow(
        &self,
        status: StatusCode,
        location: Option<&HeaderValue>,
        max_redirects: u32,
    ) -> Result<Option<Hop>, RelayError> {
        let Some(location) = location else {
            return Ok(None);
        };
        if !is_redirect(status) {
            return Ok(None);
        }

        let invalid = || RelayError::InvalidRedirect {
            url: self.url.clone(),
            location: String::from_utf8_lossy(location.as_bytes()).into_owned(),
        };
        let location = std::str::from_utf8(location.as_bytes()).map_err(|_| invalid())?;
        let next = self.url.join(location.trim()).map_err(|_| invalid())?;
        if !matches!(next.scheme(), "http" | "https") {
            return Err(invalid());
        }

        let depth = self.depth + 1;
        if depth > max_redirects {
            return Err(RelayError::TooManyRedirects {
                limit: max_redirects,
                url: next,
            });
        }
        Ok(Some(Hop { url: next, depth }))
    }
}
