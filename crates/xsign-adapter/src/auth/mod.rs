/*
[INPUT]:  Key material, counter storage, and replay token configuration
[OUTPUT]: RSA signer, API key values, replay tokens
[POS]:    Auth layer - handles API request authentication
[UPDATE]: When auth flow or signature methods change
*/

pub mod credentials;
pub mod replay;
pub mod signer;
pub mod store;

pub use credentials::{ApiKey, load_signer};
pub use replay::{
    CounterTokenProvider, NONCE_HEADER, ReplayToken, ReplayTokenProvider, TIMESTAMP_HEADER,
    TimestampTokenProvider,
};
pub use signer::RsaSigner;
pub use store::{CounterStore, FileCounterStore, MemoryCounterStore};
