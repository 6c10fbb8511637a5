//! Relay failure taxonomy and its mapping onto HTTP statuses.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use url::Url;

/// Why a relay operation failed.
///
/// Variants raised before the first response byte map to a status via
/// [`RelayError::status`]. `MidStreamFailure` and `StreamStalled` are only
/// ever yielded by the body stream, where the status line is already sent
/// and the connection is aborted instead.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid relay request: {0}")]
    InvalidRequest(&'static str),

    #[error("redirect limit of {limit} exceeded at {url}")]
    TooManyRedirects { limit: u32, url: Url },

    #[error("unusable redirect location {location:?} from {url}")]
    InvalidRedirect { url: Url, location: String },

    #[error("upstream sent no response within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] reqwest::Error),

    #[error("upstream body failed mid-stream: {0}")]
    MidStreamFailure(#[source] reqwest::Error),

    #[error("upstream body stalled for {0:?}")]
    StreamStalled(Duration),
}

impl RelayError {
    /// Status returned to the client when the error happens before streaming.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::TooManyRedirects { .. }
            | RelayError::InvalidRedirect { .. }
            | RelayError::UpstreamUnavailable(_)
            | RelayError::MidStreamFailure(_)
            | RelayError::StreamStalled(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Metric label for this outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::InvalidRequest(_) => "invalid_request",
            RelayError::TooManyRedirects { .. } => "too_many_redirects",
            RelayError::InvalidRedirect { .. } => "invalid_redirect",
            RelayError::UpstreamTimeout(_) => "upstream_timeout",
            RelayError::UpstreamUnavailable(_) => "upstream_unavailable",
            RelayError::MidStreamFailure(_) => "mid_stream_failure",
            RelayError::StreamStalled(_) => "stream_stalled",
        }
    }

    /// Translate a transport error from the upstream client.
    pub(crate) fn from_upstream(error: reqwest::Error, connect_timeout: Duration) -> Self {
        if error.is_timeout() {
            RelayError::UpstreamTimeout(connect_timeout)
        } else {
            RelayError::UpstreamUnavailable(error)
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}
