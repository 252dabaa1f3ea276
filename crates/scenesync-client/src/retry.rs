// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Retry policies with URL-based classification.
//!
//! Requests are split into two categories:
//!
//! - **Api**: calls to the platform REST API, i.e. URLs on the configured
//!   server whose path lies below the API root (`/api/...`).
//! - **External**: everything else, such as media or thumbnail downloads
//!   served from another host.
//!
//! ## Api Error Classification
//!
//! - **Never retry**: client errors (401, 403, 404, 409 ...), which indicate a
//!   problem with the request itself
//! - **Always retry**: 408 Timeout, 429 Too Many Requests, 5xx Server Errors
//! - **Retry transport errors**: Connection failures, DNS errors, timeouts
//!
//! ## External Error Classification
//!
//! - **Always retry**: 408, 409 Conflict, 423 Locked, 429, 5xx
//! - **Retry transport errors**: Connection failures, DNS errors, timeouts
//!
//! Both scopes share the retry count from
//! [`ClientConfig::max_retries`](crate::ClientConfig).
//!
//! # Examples
//!
//! ```rust
//! use scenesync_client::{RetryScope, classify_url};
//! use url::Url;
//!
//! let api = Url::parse("https://platform.example.com/api/v1/").unwrap();
//!
//! assert_eq!(
//!     classify_url("https://platform.example.com/api/v1/product_info", &api),
//!     RetryScope::Api
//! );
//! assert_eq!(
//!     classify_url("https://cdn.example.net/media/cat.png", &api),
//!     RetryScope::External
//! );
//! ```

use url::Url;

/// Retry scope of a request URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryScope {
    /// Platform REST API calls. These fail fast on client errors.
    Api,

    /// Requests to any other endpoint, retried on all transient failures.
    External,
}

/// Classifies `url` against the platform API root `api_base`.
///
/// A URL is an API call when it uses HTTP(S), has the same host and port as
/// `api_base`, and its path is `/api` or lies below `/api/`. Only the parsed
/// host is compared, so `https://attacker.com/platform.example.com/api` is
/// external.
///
/// ```rust
/// use scenesync_client::{RetryScope, classify_url};
/// use url::Url;
///
/// let api = Url::parse("http://localhost:8080/api/v1/").unwrap();
///
/// assert_eq!(
///     classify_url("http://localhost:8080/api/v1/workspaces?top=10", &api),
///     RetryScope::Api
/// );
/// assert_eq!(
///     classify_url("http://localhost:9090/api/v1/workspaces", &api),
///     RetryScope::External
/// );
/// assert_eq!(
///     classify_url("http://localhost:8080/apis", &api),
///     RetryScope::External
/// );
/// ```
pub fn classify_url(url: &str, api_base: &Url) -> RetryScope {
    if let Ok(parsed) = Url::parse(url) {
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return RetryScope::External;
        }

        let host_matches = parsed.host_str().is_some()
            && parsed.host_str() == api_base.host_str()
            && parsed.port_or_known_default() == api_base.port_or_known_default();

        // "/api" or "/api/..." but not "/apis"
        let path = parsed.path();
        let path_is_api = path == "/api" || path.starts_with("/api/");

        if host_matches && path_is_api {
            return RetryScope::Api;
        }
    }

    RetryScope::External
}

/// Creates a reqwest retry policy which classifies every request with
/// [`classify_url`].
///
/// | Scope | Retried statuses | Transport errors |
/// |-------|------------------|------------------|
/// | Api | 408, 429, 5xx | retried |
/// | External | 408, 409, 423, 429, 5xx | retried |
///
/// Reqwest only supports a single `max_retries_per_request`, so both scopes
/// share the same retry count and differ in classification only.
pub fn create_retry_policy(api_base: Url, max_retries: u32) -> reqwest::retry::Builder {
    reqwest::retry::for_host("*")
        .max_retries_per_request(max_retries)
        .classify_fn(move |req_rep| {
            let url = req_rep.uri().to_string();

            match classify_url(&url, &api_base) {
                RetryScope::Api => match req_rep.status() {
                    Some(status) => match status.as_u16() {
                        429 | 408 | 500..=599 => req_rep.retryable(),
                        _ => req_rep.success(),
                    },
                    // No status: connection error, timeout or other transport failure
                    None if req_rep.error().is_some() => req_rep.retryable(),
                    None => req_rep.success(),
                },
                RetryScope::External => match req_rep.status() {
                    Some(status) => match status.as_u16() {
                        429 | 408 | 500..=599 | 409 | 423 => req_rep.retryable(),
                        _ => req_rep.success(),
                    },
                    None if req_rep.error().is_some() => req_rep.retryable(),
                    None => req_rep.success(),
                },
            }
        })
}
