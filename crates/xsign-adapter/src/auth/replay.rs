/*
[INPUT]:  Counter store or wall clock, optional operator override
[OUTPUT]: Replay tokens for signing, persisted counter after each attempt
[POS]:    Auth layer - anti-replay token management
[UPDATE]: When adding replay schemes or changing counter semantics
*/

use crate::auth::store::CounterStore;
use crate::error::{Result, XsignError};
use crate::types::TokenMode;
use chrono::Utc;
use std::fmt;
use tracing::{debug, info};

/// Header carrying a counter token
pub const NONCE_HEADER: &str = "x-nonce";
/// Header carrying a timestamp token
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// Anti-replay value included in the signed message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplayToken(String);

impl ReplayToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ReplayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces the replay token for one signed operation.
///
/// `next` never persists anything. Callers invoke `commit` once the
/// request attempt has finished, whatever its outcome, so the counter keeps
/// advancing even when the server rejects the call. A crash between `next`
/// and `commit` leaves the store behind the value the server already saw.
pub trait ReplayTokenProvider: Send + Sync {
    fn next(&self, explicit: Option<&str>) -> Result<ReplayToken>;

    fn commit(&self, token: &ReplayToken) -> Result<()>;

    /// Request header the token travels in
    fn header_name(&self) -> &'static str;

    fn mode(&self) -> TokenMode;
}

/// Strictly increasing counter backed by a [`CounterStore`]
#[derive(Debug)]
pub struct CounterTokenProvider<S> {
    store: S,
}

impl<S: CounterStore> CounterTokenProvider<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn previous(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(value) = explicit {
            debug!(value, "using explicit previous counter value");
            return Ok(value.to_string());
        }

        match self.store.load()? {
            Some(value) => Ok(value),
            None => {
                info!("no stored counter found, starting from 0");
                Ok("0".to_string())
            }
        }
    }
}

impl<S: CounterStore> ReplayTokenProvider for CounterTokenProvider<S> {
    fn next(&self, explicit: Option<&str>) -> Result<ReplayToken> {
        let previous = self.previous(explicit)?;
        let value: i64 = previous.parse().map_err(|err| {
            XsignError::invalid_state(format!("counter value '{previous}' is not an integer: {err}"))
        })?;
        let next = value
            .checked_add(1)
            .ok_or_else(|| XsignError::invalid_state("counter value overflowed"))?;
        Ok(ReplayToken::new(next.to_string()))
    }

    fn commit(&self, token: &ReplayToken) -> Result<()> {
        self.store.save(token.as_str())?;
        debug!(nonce = %token, "counter persisted");
        Ok(())
    }

    fn header_name(&self) -> &'static str {
        NONCE_HEADER
    }

    fn mode(&self) -> TokenMode {
        TokenMode::Counter
    }
}

/// Unix epoch seconds; acceptable skew is decided by the server
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampTokenProvider;

impl TimestampTokenProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ReplayTokenProvider for TimestampTokenProvider {
    fn next(&self, explicit: Option<&str>) -> Result<ReplayToken> {
        match explicit {
            Some(value) => Ok(ReplayToken::new(value)),
            None => Ok(ReplayToken::new(Utc::now().timestamp().to_string())),
        }
    }

    fn commit(&self, _token: &ReplayToken) -> Result<()> {
        Ok(())
    }

    fn header_name(&self) -> &'static str {
        TIMESTAMP_HEADER
    }

    fn mode(&self) -> TokenMode {
        TokenMode::Timestamp
    }
}
