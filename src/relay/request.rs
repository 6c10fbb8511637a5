//! Inbound relay request validation.
//!
//! Everything here runs before any network I/O: a request that fails to
//! validate never causes an upstream connection.

use axum::http::header::RANGE;
use axum::http::{HeaderMap, HeaderValue, Method};
use url::{form_urlencoded, Url};

use crate::relay::error::RelayError;

/// Query parameter carrying the upstream URL.
pub const TARGET_PARAM: &str = "url";

/// A validated relay request.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    /// `GET` or `HEAD`, repeated on every hop.
    pub method: Method,
    /// Absolute http(s) URL of the upstream resource.
    pub target: Url,
    /// Inbound `Range` header, forwarded byte-for-byte.
    pub range: Option<HeaderValue>,
}

impl RelayRequest {
    /// Validate a target URL that has already been percent-decoded.
    pub fn new(target: &str, range: Option<HeaderValue>) -> Result<Self, RelayError> {
        Ok(Self {
            method: Method::GET,
            target: parse_target(target)?,
            range,
        })
    }

    /// Build from the method, raw query string and inbound headers of a request.
    ///
    /// The `url` parameter is percent-decoded exactly once, as part of
    /// query-string decoding.
    pub fn from_parts(
        method: &Method,
        raw_query: Option<&str>,
        headers: &HeaderMap,
    ) -> Result<Self, RelayError> {
        if *method != Method::GET && *method != Method::HEAD {
            return Err(RelayError::InvalidRequest("unsupported method"));
        }
        let target = raw_query
            .and_then(|query| {
                form_urlencoded::parse(query.as_bytes())
                    .find(|(key, _)| key == TARGET_PARAM)
                    .map(|(_, value)| value.into_owned())
            })
            .ok_or(RelayError::InvalidRequest("missing url parameter"))?;

        let mut request = Self::new(&target, headers.get(RANGE).cloned())?;
        request.method = method.clone();
        Ok(request)
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }
}

fn parse_target(raw: &str) -> Result<Url, RelayError> {
    let url = Url::parse(raw).map_err(|_| RelayError::InvalidRequest("malformed url"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(RelayError::InvalidRequest("unsupported url scheme")),
    }
}
