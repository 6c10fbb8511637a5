//! Upstream dispatch and response translation.
//!
//! # Responsibilities
//! - Own the outbound HTTP client (plain and TLS transports)
//! - Attach synthetic browser-like headers and the forwarded `Range`
//! - Drive the redirect loop under one overall deadline
//! - Turn the final upstream response into a streaming downstream response
//!
//! # Design Decisions
//! - The client never follows redirects itself; [`Hop::follow`] does
//! - The deadline covers connect + header receipt for the whole chain,
//!   body streaming is governed by the per-chunk idle timeout instead
//! - Never retries; a redirect is the only reason for a second request

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::header::{
    ACCEPT, ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, LOCATION, RANGE, REFERER,
};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::relay::body::{relay_body, TransferGuard};
use crate::relay::error::RelayError;
use crate::relay::redirect::Hop;
use crate::relay::request::RelayRequest;

/// Errors raised while building a [`Relay`].
#[derive(Debug, Error)]
pub enum RelaySetupError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid default content type {0:?}")]
    ContentType(String),
}

/// Runtime settings derived from [`UpstreamConfig`].
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub max_redirects: u32,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub default_content_type: HeaderValue,
}

impl TryFrom<&UpstreamConfig> for RelaySettings {
    type Error = RelaySetupError;

    fn try_from(config: &UpstreamConfig) -> Result<Self, Self::Error> {
        let default_content_type = HeaderValue::from_str(&config.default_content_type)
            .map_err(|_| RelaySetupError::ContentType(config.default_content_type.clone()))?;
        Ok(Self {
            max_redirects: config.max_redirects,
            timeout: Duration::from_secs(config.timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            default_content_type,
        })
    }
}

/// The final, non-redirect upstream response of a relay operation.
#[derive(Debug)]
pub struct UpstreamResponse {
    /// Hop that produced the response.
    pub hop: Hop,
    pub response: reqwest::Response,
}

/// Range-aware streaming relay.
///
/// Stateless apart from the pooled client; operations are independent.
#[derive(Debug, Clone)]
pub struct Relay {
    client: reqwest::Client,
    settings: RelaySettings,
}

impl Relay {
    /// Build a relay and its upstream client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, RelaySetupError> {
        let settings = RelaySettings::try_from(config)?;

        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(settings.connect_timeout)
            .user_agent(config.user_agent.as_str());
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            settings,
        })
    }

    /// Validate and relay one inbound request, mapping failures to statuses.
    pub async fn handle(
        &self,
        method: &Method,
        raw_query: Option<&str>,
        headers: &HeaderMap,
    ) -> Response {
        let result = match RelayRequest::from_parts(method, raw_query, headers) {
            Ok(request) => self.relay(request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => {
                metrics::record_relay_outcome("streamed");
                response
            }
            Err(e) => {
                match &e {
                    RelayError::InvalidRequest(reason) => {
                        tracing::warn!(reason = %reason, "Rejected relay request")
                    }
                    other => tracing::warn!(error = %other, status = %other.status(), "Relay failed"),
                }
                metrics::record_relay_outcome(e.outcome());
                e.into_response()
            }
        }
    }

    /// Open the upstream and build the streaming response.
    pub async fn relay(&self, request: RelayRequest) -> Result<Response, RelayError> {
        let started = Instant::now();
        let upstream = self.open(&request).await?;
        metrics::record_upstream_latency(started);

        tracing::debug!(
            method = %request.method,
            target_url = %request.target,
            upstream = %upstream.hop.url,
            redirects = upstream.hop.depth,
            status = %upstream.response.status(),
            range = ?request.range,
            "Relaying upstream response"
        );
        Ok(self.downstream_response(upstream, request.is_head()))
    }

    /// Follow the redirect chain until a response to relay, under the deadline.
    pub async fn open(&self, request: &RelayRequest) -> Result<UpstreamResponse, RelayError> {
        match tokio::time::timeout(self.settings.timeout, self.follow_redirects(request)).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::UpstreamTimeout(self.settings.timeout)),
        }
    }

    async fn follow_redirects(&self, request: &RelayRequest) -> Result<UpstreamResponse, RelayError> {
        let mut hop = Hop::first(request.target.clone());
        loop {
            let response = self
                .dispatch(&request.method, &hop, request.range.as_ref())
                .await
                .map_err(|e| RelayError::from_upstream(e, self.settings.connect_timeout))?;

            let status = response.status();
            let next = hop.follow(
                status,
                response.headers().get(LOCATION),
                self.settings.max_redirects,
            )?;
            match next {
                Some(next) => {
                    tracing::debug!(
                        from = %hop.url,
                        to = %next.url,
                        status = %status,
                        depth = next.depth,
                        "Following upstream redirect"
                    );
                    metrics::record_redirect();
                    // Unread body: dropping closes the connection instead of pooling it.
                    drop(response);
                    hop = next;
                }
                None => return Ok(UpstreamResponse { hop, response }),
            }
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        hop: &Hop,
        range: Option<&HeaderValue>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .client
            .request(method.clone(), hop.url.clone())
            .header(ACCEPT, "*/*")
            .header(REFERER, referer_for(&hop.url));
        if let Some(range) = range {
            request = request.header(RANGE, range.clone());
        }
        request.send().await
    }

    fn downstream_response(&self, upstream: UpstreamResponse, head: bool) -> Response {
        let UpstreamResponse { hop, response } = upstream;
        let status = response.status();
        let headers = playback_headers(response.headers(), &self.settings.default_content_type);

        // HEAD carries no body, so there is no transfer to track.
        let body = if head {
            Body::empty()
        } else {
            relay_body(
                response.bytes_stream(),
                self.settings.idle_timeout,
                TransferGuard::new(hop.url),
            )
        };

        let mut downstream = Response::new(body);
        *downstream.status_mut() = status;
        *downstream.headers_mut() = headers;
        downstream
    }
}

/// `Referer` presented upstream: the target's own origin.
pub fn referer_for(url: &Url) -> String {
    format!("{}/", url.origin().ascii_serialization())
}

/// Derive the downstream header set from upstream headers.
///
/// Only what playback needs crosses over: content type (with a default),
/// length and range, plus an unconditional `Accept-Ranges: bytes`.
pub fn playback_headers(upstream: &HeaderMap, default_content_type: &HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let content_type = upstream
        .get(CONTENT_TYPE)
        .filter(|v| !v.is_empty())
        .unwrap_or(default_content_type);
    headers.insert(CONTENT_TYPE, content_type.clone());
    headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    for name in [CONTENT_LENGTH, CONTENT_RANGE] {
        if let Some(value) = upstream.get(&name) {
            headers.insert(name, value.clone());
        }
    }
    headers
}
