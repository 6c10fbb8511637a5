//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, redirect bound, addresses parse)
//! - Check that timeouts nest (inbound request timeout covers the relay's)
//! - Detect duplicate or colliding category definitions
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RelayConfig;

/// Upper bound accepted for `relay.max_redirects`.
pub const MAX_REDIRECT_LIMIT: u32 = 20;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("relay.max_redirects must be between 1 and {max}, got {0}", max = MAX_REDIRECT_LIMIT)]
    RedirectBound(u32),

    #[error("timeouts.request_secs ({request}) must exceed relay.timeout_secs ({relay})")]
    TimeoutOrder { request: u64, relay: u64 },

    #[error("catalog.categories must not be empty")]
    NoCategories,

    #[error("catalog category at index {0} has an empty name or file")]
    EmptyCategory(usize),

    #[error("catalog category {0:?} is defined more than once")]
    DuplicateCategory(String),

    #[error("catalog.all_category {0:?} collides with a category name")]
    SentinelCollision(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let relay = &config.relay;
    if relay.max_redirects == 0 || relay.max_redirects > MAX_REDIRECT_LIMIT {
        errors.push(ValidationError::RedirectBound(relay.max_redirects));
    }
    for (name, value) in [
        ("relay.timeout_secs", relay.timeout_secs),
        ("relay.connect_timeout_secs", relay.connect_timeout_secs),
        ("relay.idle_timeout_secs", relay.idle_timeout_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
        }
    }
    if config.timeouts.request_secs <= relay.timeout_secs {
        errors.push(ValidationError::TimeoutOrder {
            request: config.timeouts.request_secs,
            relay: relay.timeout_secs,
        });
    }

    let catalog = &config.catalog;
    if catalog.max_results == 0 {
        errors.push(ValidationError::Zero("catalog.max_results"));
    }
    if catalog.categories.is_empty() {
        errors.push(ValidationError::NoCategories);
    }
    let mut seen = HashSet::new();
    for (i, category) in catalog.categories.iter().enumerate() {
        if category.name.trim().is_empty() || category.file.trim().is_empty() {
            errors.push(ValidationError::EmptyCategory(i));
            continue;
        }
        if !seen.insert(category.name.as_str()) {
            errors.push(ValidationError::DuplicateCategory(category.name.clone()));
        }
        if category.name == catalog.all_category {
            errors.push(ValidationError::SentinelCollision(category.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
