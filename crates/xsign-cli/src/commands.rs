/*
[INPUT]:  Resolved settings, operator input, OS shutdown signals
[OUTPUT]: Printed auth headers, HTTP responses, and stream messages
[POS]:    Command layer - sign, websocket, and send flows
[UPDATE]: When changing a command's flow or printed output
*/

use anyhow::{Context, Result};
use std::io::{self, Write};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use xsign_adapter::auth::load_signer;
use xsign_adapter::{
    ApiKey, AuthenticatedRequestBuilder, ClientConfig, CounterTokenProvider, FileCounterStore,
    ReplayTokenProvider, RequestDefinition, RequestSigner, SessionConfig, SignedClient,
    SignedRequest, StreamKind, StreamMessage, StreamSession, TimestampTokenProvider, TokenMode,
};

use crate::config::Settings;
use crate::prompt;

/// Sign a URL and JSON body and print the resulting headers
pub fn sign(settings: &Settings, url: Option<String>) -> Result<()> {
    let signer = request_signer(settings)?;
    let provider = token_provider(settings);
    let token = provider
        .next(settings.nonce.as_deref())
        .context("compute replay token")?;

    let url = match url {
        Some(url) => url,
        None => prompt::read_url()?,
    };
    let body = prompt::read_body()?;

    let signature = signer
        .sign_request(&token, &url, &body)
        .context("sign request")?;
    provider.commit(&token).context("persist replay token")?;

    let mut out = io::stdout().lock();
    writeln!(out, "x-sign: {signature}")?;
    writeln!(out, "{}: {token}", provider.header_name())?;
    Ok(())
}

/// Open an authenticated stream and print messages until the peer closes or
/// the process is interrupted
pub async fn websocket(settings: &Settings, url: Option<String>, kind: StreamKind) -> Result<()> {
    let signer = request_signer(settings)?;
    let api_key = api_key(settings)?;
    let provider = token_provider(settings);
    let token = provider
        .next(settings.nonce.as_deref())
        .context("compute replay token")?;

    let url = match url {
        Some(url) => url,
        None => prompt::read_url()?,
    };
    let request = AuthenticatedRequestBuilder::new(&signer, api_key, provider.header_name())
        .streaming(url, token.clone())
        .context("build handshake request")?;
    print_headers(&request)?;

    let config = SessionConfig {
        close_timeout: settings.close_timeout,
        ..SessionConfig::default()
    };
    let mut session = StreamSession::new(kind, config);
    let printer = match session.take_receiver() {
        Some(messages) => spawn_printer(messages),
        None => anyhow::bail!("stream session receiver already taken"),
    };

    let connected = session.connect(&request).await;
    provider.commit(&token).context("persist replay token")?;
    connected.context("connect stream")?;

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let outcome = session.run(shutdown).await;
    drop(session);
    if let Err(err) = printer.await {
        warn!(error = %err, "message printer stopped abnormally");
    }

    let reason = outcome.context("stream session")?;
    info!(?reason, "stream finished");
    Ok(())
}

/// Load a stored request definition, sign it, send it, and print the response
pub async fn send(settings: &Settings, name: &str) -> Result<()> {
    let definition = RequestDefinition::load(&settings.requests_dir, name)
        .with_context(|| format!("load request definition '{name}'"))?;
    let signer = request_signer(settings)?;
    let api_key = api_key(settings)?;
    let provider = token_provider(settings);
    let token = provider
        .next(settings.nonce.as_deref())
        .context("compute replay token")?;

    let request = AuthenticatedRequestBuilder::new(&signer, api_key, provider.header_name())
        .unary(definition.method, definition.uri, definition.body, token.clone())
        .context("sign request")?;
    {
        let mut out = io::stdout().lock();
        writeln!(out, "{} {}", request.method(), request.uri())?;
    }
    print_headers(&request)?;

    let client = SignedClient::with_config(ClientConfig::default()).context("build HTTP client")?;
    let sent = client.send(request).await;
    provider.commit(&token).context("persist replay token")?;
    let response = sent.context("send request")?;

    let mut out = io::stdout().lock();
    writeln!(out, "---")?;
    writeln!(out, "{}", response.status_line())?;
    writeln!(out, "{}", response.body)?;
    Ok(())
}

fn request_signer(settings: &Settings) -> Result<RequestSigner> {
    let signer = load_signer(&settings.pemfile)
        .with_context(|| format!("load private key {}", settings.pemfile.display()))?;
    Ok(RequestSigner::new(signer))
}

fn api_key(settings: &Settings) -> Result<ApiKey> {
    match &settings.apikey {
        Some(key) => Ok(ApiKey::new(key.clone())),
        None => ApiKey::from_file(&settings.keyfile)
            .with_context(|| format!("load API key {}", settings.keyfile.display())),
    }
}

fn token_provider(settings: &Settings) -> Box<dyn ReplayTokenProvider> {
    match settings.token_mode {
        TokenMode::Counter => Box::new(CounterTokenProvider::new(FileCounterStore::new(
            &settings.noncefile,
        ))),
        TokenMode::Timestamp => Box::new(TimestampTokenProvider::new()),
    }
}

fn print_headers(request: &SignedRequest) -> Result<()> {
    let mut out = io::stdout().lock();
    for (name, value) in request.auth_headers() {
        writeln!(out, "{name}: {value}")?;
    }
    out.flush()?;
    Ok(())
}

fn spawn_printer(mut messages: tokio::sync::mpsc::Receiver<StreamMessage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = messages.recv().await {
            let mut out = io::stdout().lock();
            if writeln!(out, "{message}\n").and_then(|()| out.flush()).is_err() {
                break;
            }
        }
    })
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
