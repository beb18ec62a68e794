//! Low level HTTP helpers
//!
//! One request per call, no retries. Responses are returned raw so the caller
//! decides how to decode them.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{NotifyError, Result};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A single outgoing request
#[derive(Clone, Default)]
pub struct RequestOptions {
    pub url: String,
    /// Applied verbatim, in order
    pub headers: Vec<(String, String)>,
    /// Encoded `application/x-www-form-urlencoded` body
    pub form_body: Option<String>,
}

// Authorization ヘッダーをログに出さない
impl std::fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("RequestOptions")
            .field("url", &self.url)
            .field("headers", &header_names)
            .field("form_body", &self.form_body.as_ref().map(|b| b.len()))
            .finish()
    }
}

impl RequestOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// `Authorization: Bearer {token}`
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    /// Append one form parameter
    pub fn form(mut self, name: &str, value: &str) -> Self {
        let body = self.form_body.take().unwrap_or_default();
        let mut serializer = url::form_urlencoded::Serializer::for_suffix(body, 0);
        serializer.append_pair(name, value);
        self.form_body = Some(serializer.finish());
        self
    }

    /// Replace the form body with any serializable map, struct or list of pairs
    pub fn form_params<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self> {
        let body = serde_urlencoded::to_string(params)
            .map_err(|e| NotifyError::Encode(e.to_string()))?;
        self.form_body = Some(body);
        Ok(self)
    }

    /// Mark the request as form encoded even when there are no parameters
    pub fn empty_form(mut self) -> Self {
        self.form_body.get_or_insert_with(String::new);
        self
    }
}

/// Status code and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Thin wrapper over a configured `reqwest::Client`
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build the underlying client. TLS verification stays on unless the config opts out.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        if config.allow_insecure_tls {
            warn!("TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.allow_insecure_tls)
            .build()
            .map_err(NotifyError::Http)?;

        Ok(Self { client })
    }

    pub async fn get(&self, options: RequestOptions) -> Result<RawResponse> {
        debug!("GET {}", options.url);
        let request = self.client.get(&options.url);
        self.execute(request, options).await
    }

    pub async fn post(&self, options: RequestOptions) -> Result<RawResponse> {
        debug!("POST {}", options.url);
        let request = self.client.post(&options.url);
        self.execute(request, options).await
    }

    async fn execute(&self, mut request: RequestBuilder, options: RequestOptions) -> Result<RawResponse> {
        let has_content_type = options
            .headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("content-type"));

        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        if let Some(body) = options.form_body {
            if !has_content_type {
                request = request.header("Content-Type", FORM_CONTENT_TYPE);
            }
            request = request.body(body);
        }

        let response = request.send().await.map_err(NotifyError::Http)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(NotifyError::Http)?;

        debug!("{} responded with {}", options.url, status);
        Ok(RawResponse { status, body })
    }
}
