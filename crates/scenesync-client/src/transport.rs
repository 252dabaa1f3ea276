// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{Error, config::ClientConfig, retry::create_retry_policy};
use async_trait::async_trait;
use log::{Level, debug, error, log_enabled, trace};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// JSON request channel to the annotation platform.
///
/// URLs are either absolute or relative to the platform's REST API root.
/// Responses with a status other than 200 or 201 are reported as
/// [`Error::RequestError`] carrying the status code, so callers can recover
/// from specific statuses such as 204 or 404.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Value, Error>;

    async fn post(&self, url: &str, body: &Value) -> Result<Value, Error>;
}

/// [`Transport`] over HTTP(S) using reqwest.
///
/// # Example
///
/// ```rust,no_run
/// use scenesync_client::{ClientConfig, Error, HttpTransport, Transport};
///
/// # async fn example() -> Result<(), Error> {
/// let config = ClientConfig {
///     server: Some("https://platform.example.com".to_string()),
///     token: Some("my-token".to_string()),
///     ..Default::default()
/// };
/// let transport = HttpTransport::new(&config)?;
/// let info = transport.get("product_info").await?;
/// println!("{}", info["product-version"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
    api_base: Url,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let api_base = config.api_base()?;
        debug!(
            "HTTP transport for {} - max_retries={}, timeout={}s",
            api_base, config.max_retries, config.timeout
        );

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .retry(create_retry_policy(api_base.clone(), config.max_retries))
            .build()?;

        Ok(HttpTransport {
            http,
            api_base,
            token: config.token.clone(),
        })
    }

    /// The REST API root all relative URLs are resolved against.
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    fn resolve(&self, url: &str) -> Result<Url, Error> {
        Ok(self.api_base.join(url)?)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let req = self
            .http
            .request(method, url)
            .header("Accept", "application/json")
            .header("User-Agent", "SceneSync Client");
        match &self.token {
            Some(token) => req.header("x-api-key", token),
            None => req,
        }
    }

    async fn process_response(&self, res: reqwest::Response) -> Result<Value, Error> {
        let status = res.status();
        let body = res.bytes().await?;

        if log_enabled!(Level::Trace) {
            trace!("Response {}: {}", status, String::from_utf8_lossy(&body));
        }

        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(Error::RequestError(
                status.as_u16(),
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        match serde_json::from_slice(&body) {
            Ok(value) => Ok(value),
            Err(err) => {
                error!("Invalid JSON Response: {}", String::from_utf8_lossy(&body));
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Value, Error> {
        let url = self.resolve(url)?;
        debug!("GET {}", url);
        let res = self.request(reqwest::Method::GET, url).send().await?;
        self.process_response(res).await
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, Error> {
        let url = self.resolve(url)?;
        debug!("POST {}", url);
        if log_enabled!(Level::Trace) {
            trace!("Request: {}", serde_json::to_string_pretty(body)?);
        }
        let res = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await?;
        self.process_response(res).await
    }
}
