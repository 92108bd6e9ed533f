/*
[INPUT]:  HTTP client configuration, credentials, and request definitions
[OUTPUT]: Signed requests and raw HTTP responses
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding request shapes or changing client behavior
*/

pub mod client;
pub mod definition;
pub mod request;
pub mod signature;

pub use signature::RequestSigner;

pub use client::{ClientConfig, SignedClient, UnaryResponse};
pub use definition::{RequestDefinition, compact_json};
pub use request::{API_KEY_HEADER, AuthenticatedRequestBuilder, SIGNATURE_HEADER, SignedRequest};
