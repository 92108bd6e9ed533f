/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public xsign adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod error;
pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::{
    ApiKey,
    CounterStore,
    CounterTokenProvider,
    FileCounterStore,
    MemoryCounterStore,
    ReplayToken,
    ReplayTokenProvider,
    RsaSigner,
    TimestampTokenProvider,
};

pub use error::{ErrorStage, Result, XsignError};

// Re-export commonly used types from http
pub use http::{
    AuthenticatedRequestBuilder,
    ClientConfig,
    RequestDefinition,
    RequestSigner,
    SignedClient,
    SignedRequest,
    UnaryResponse,
};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    CloseReason,
    SessionConfig,
    SessionState,
    StreamMessage,
    StreamSession,
};
