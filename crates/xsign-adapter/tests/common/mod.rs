/*
[INPUT]:  Test key fixtures and scripted peer behaviours
[OUTPUT]: Shared test utilities, fixtures, and mock servers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for xsign-adapter tests

#![allow(dead_code)]

use std::future::Future;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{HeaderMap, StatusCode};
use tokio_tungstenite::{WebSocketStream, accept_async, accept_hdr_async};
use wiremock::MockServer;
use xsign_adapter::auth::NONCE_HEADER;
use xsign_adapter::{ApiKey, AuthenticatedRequestBuilder, ReplayToken, RequestSigner, RsaSigner, SignedRequest};

pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/private.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("../fixtures/public.pem");
pub const TEST_API_KEY: &str = "test-api-key";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Request signer backed by the fixture key
pub fn fixture_signer() -> RequestSigner {
    RequestSigner::new(RsaSigner::from_pkcs1_pem(TEST_PRIVATE_KEY).expect("fixture key"))
}

/// Signed upgrade request for a local test server
pub fn streaming_request(signer: &RequestSigner, url: &str, nonce: &str) -> SignedRequest {
    AuthenticatedRequestBuilder::new(signer, ApiKey::new(TEST_API_KEY), NONCE_HEADER)
        .streaming(url, ReplayToken::new(nonce))
        .expect("streaming request")
}

/// Accept one WebSocket client and hand it to `peer`
pub async fn spawn_ws_peer<F, Fut>(peer: F) -> String
where
    F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let ws = accept_async(stream).await.expect("websocket accept");
        peer(ws).await;
    });
    format!("ws://{addr}/stream")
}

/// Accept one upgrade, report its headers, then close normally
pub async fn spawn_header_capturing_peer() -> (String, oneshot::Receiver<HeaderMap>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (headers_tx, headers_rx) = oneshot::channel();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            let _ = headers_tx.send(request.headers().clone());
            Ok(response)
        };
        let mut ws = accept_hdr_async(stream, callback).await.expect("websocket accept");
        let _ = ws.close(None).await;
        drain(&mut ws).await;
    });
    (format!("ws://{addr}/stream"), headers_rx)
}

/// Refuse the upgrade with the given status
pub async fn spawn_rejecting_peer(status: StatusCode) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let callback = move |_request: &Request, _response: Response| -> Result<Response, ErrorResponse> {
            let mut rejection = ErrorResponse::new(Some("invalid signature".to_string()));
            *rejection.status_mut() = status;
            Err(rejection)
        };
        let _ = accept_hdr_async(stream, callback).await;
    });
    format!("ws://{addr}/stream")
}

/// Read until the client goes away
pub async fn drain(ws: &mut WebSocketStream<TcpStream>) {
    use futures_util::StreamExt;
    while let Some(Ok(_)) = ws.next().await {}
}
