/*
[INPUT]:  Method, URI, body, API key, replay token, and request signer
[OUTPUT]: Signed request envelopes for HTTP sends and WebSocket upgrades
[POS]:    HTTP layer - authenticated request assembly
[UPDATE]: When auth headers or envelope shape change
*/

use crate::auth::{ApiKey, ReplayToken};
use crate::error::{Result, XsignError};
use crate::http::RequestSigner;
use crate::types::HttpVerb;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request as HandshakeRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const SIGNATURE_HEADER: &str = "x-sign";

/// Fully signed request; consumed by exactly one transport call
#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: HttpVerb,
    uri: String,
    body: Vec<u8>,
    api_key: ApiKey,
    token: ReplayToken,
    token_header: &'static str,
    signature: String,
}

impl SignedRequest {
    pub fn method(&self) -> HttpVerb {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn token(&self) -> &ReplayToken {
        &self.token
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The three authentication headers, in display order
    pub fn auth_headers(&self) -> [(&'static str, &str); 3] {
        [
            (API_KEY_HEADER, self.api_key.as_str()),
            (SIGNATURE_HEADER, self.signature.as_str()),
            (self.token_header, self.token.as_str()),
        ]
    }

    /// Upgrade request carrying the auth headers; the session is authenticated once, here
    pub fn handshake_request(&self) -> Result<HandshakeRequest> {
        let mut request = self.uri.as_str().into_client_request().map_err(|err| {
            XsignError::config(format!("invalid websocket url '{}': {err}", self.uri))
        })?;

        let headers = request.headers_mut();
        for (name, value) in self.auth_headers() {
            let value = HeaderValue::from_str(value).map_err(|err| {
                XsignError::config(format!("invalid value for header {name}: {err}"))
            })?;
            headers.insert(HeaderName::from_static(name), value);
        }

        Ok(request)
    }

    pub(crate) fn into_parts(self) -> (HttpVerb, String, Vec<u8>) {
        (self.method, self.uri, self.body)
    }
}

/// Assembles signed requests from credentials and a replay token
#[derive(Debug)]
pub struct AuthenticatedRequestBuilder<'a> {
    signer: &'a RequestSigner,
    api_key: ApiKey,
    token_header: &'static str,
}

impl<'a> AuthenticatedRequestBuilder<'a> {
    /// `token_header` comes from the replay token provider in use
    pub fn new(signer: &'a RequestSigner, api_key: ApiKey, token_header: &'static str) -> Self {
        Self {
            signer,
            api_key,
            token_header,
        }
    }

    /// Sign a one-shot HTTP request.
    ///
    /// The body is dropped for verbs that do not carry a payload, so it is
    /// neither signed nor sent.
    pub fn unary(
        &self,
        method: HttpVerb,
        uri: impl Into<String>,
        body: Vec<u8>,
        token: ReplayToken,
    ) -> Result<SignedRequest> {
        let uri = uri.into();
        let body = if method.carries_body() { body } else { Vec::new() };
        let signature = self.signer.sign_request(&token, &uri, &body)?;

        Ok(SignedRequest {
            method,
            uri,
            body,
            api_key: self.api_key.clone(),
            token,
            token_header: self.token_header,
            signature,
        })
    }

    /// Sign a WebSocket upgrade; streaming handshakes never carry a body
    pub fn streaming(&self, uri: impl Into<String>, token: ReplayToken) -> Result<SignedRequest> {
        self.unary(HttpVerb::Get, uri, Vec::new(), token)
    }
}
