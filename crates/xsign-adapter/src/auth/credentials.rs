/*
[INPUT]:  Key file paths or literal API key values
[OUTPUT]: Loaded RSA signer and API key header value
[POS]:    Auth layer - credential loading from local storage
[UPDATE]: When key file formats or API key encoding change
*/

use crate::auth::RsaSigner;
use crate::error::{Result, XsignError};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use std::fmt;
use std::fs;
use std::path::Path;

/// API key sent in the `x-api-key` header
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Use a key string exactly as given
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw key bytes are sent as unpadded base64url
    pub fn from_key_bytes(bytes: &[u8]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| {
            XsignError::config(format!("failed to read API key file {}: {err}", path.display()))
        })?;
        Ok(Self::from_key_bytes(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Load a PKCS#1 PEM private key from disk
pub fn load_signer(path: impl AsRef<Path>) -> Result<RsaSigner> {
    let path = path.as_ref();
    let pem = fs::read_to_string(path).map_err(|err| {
        XsignError::config(format!("failed to read private key {}: {err}", path.display()))
    })?;
    RsaSigner::from_pkcs1_pem(&pem)
}
