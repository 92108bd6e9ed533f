/*
[INPUT]:  HTTP configuration (timeouts) and signed requests
[OUTPUT]: Response status and body, surfaced verbatim
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use crate::error::{Result, XsignError};
use crate::http::SignedRequest;
use crate::types::HttpVerb;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Response of a unary request; non-2xx statuses are not errors
#[derive(Debug, Clone)]
pub struct UnaryResponse {
    pub status: StatusCode,
    pub body: String,
}

impl UnaryResponse {
    /// `"<code> <reason>"`, e.g. `"404 Not Found"`
    pub fn status_line(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => format!("{} {reason}", self.status.as_u16()),
            None => self.status.as_u16().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Sends signed unary requests
#[derive(Debug, Clone)]
pub struct SignedClient {
    http_client: Client,
}

impl SignedClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { http_client })
    }

    /// Send the request once. No retries.
    pub async fn send(&self, request: SignedRequest) -> Result<UnaryResponse> {
        let headers = auth_header_map(&request)?;
        let (verb, uri, body) = request.into_parts();

        info!(method = %verb, uri = %uri, "sending signed request");
        let mut builder = self
            .http_client
            .request(to_method(verb), uri.as_str())
            .headers(headers);
        if verb.carries_body() {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(UnaryResponse { status, body })
    }
}

fn auth_header_map(request: &SignedRequest) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in request.auth_headers() {
        let value = HeaderValue::from_str(value).map_err(|err| {
            XsignError::config(format!("invalid value for header {name}: {err}"))
        })?;
        headers.insert(HeaderName::from_static(name), value);
    }
    Ok(headers)
}

fn to_method(verb: HttpVerb) -> Method {
    match verb {
        HttpVerb::Get => Method::GET,
        HttpVerb::Post => Method::POST,
        HttpVerb::Put => Method::PUT,
        HttpVerb::Patch => Method::PATCH,
        HttpVerb::Delete => Method::DELETE,
        HttpVerb::Head => Method::HEAD,
        HttpVerb::Options => Method::OPTIONS,
    }
}
