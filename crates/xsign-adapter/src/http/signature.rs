/*
[INPUT]:  Replay token, request URI, request body, and RSA signer
[OUTPUT]: Signed request headers (x-sign)
[POS]:    HTTP layer - request signing for authenticated endpoints
[UPDATE]: When changing signing algorithm or header format
*/

use crate::auth::{ReplayToken, RsaSigner};
use crate::error::Result;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Signs requests for authenticated endpoints
#[derive(Debug)]
pub struct RequestSigner {
    signer: RsaSigner,
}

impl RequestSigner {
    /// Create a new request signer with the given RSA signer
    pub fn new(signer: RsaSigner) -> Self {
        Self { signer }
    }

    pub fn signer(&self) -> &RsaSigner {
        &self.signer
    }

    /// Bytes covered by the signature: `{token}{uri}{body}` with no separators
    pub fn canonical_message(token: &ReplayToken, uri: &str, body: &[u8]) -> Vec<u8> {
        let mut message = Vec::with_capacity(token.as_bytes().len() + uri.len() + body.len());
        message.extend_from_slice(token.as_bytes());
        message.extend_from_slice(uri.as_bytes());
        message.extend_from_slice(body);
        message
    }

    /// SHA-256 of the canonical message
    pub fn digest(token: &ReplayToken, uri: &str, body: &[u8]) -> [u8; 32] {
        Sha256::new()
            .chain_update(token.as_bytes())
            .chain_update(uri.as_bytes())
            .chain_update(body)
            .finalize()
            .into()
    }

    /// Sign a request
    ///
    /// The URI is signed exactly as it will be sent and the body is treated
    /// as opaque bytes. Returns an unpadded base64url signature.
    pub fn sign_request(&self, token: &ReplayToken, uri: &str, body: &[u8]) -> Result<String> {
        let digest = Self::digest(token, uri, body);
        debug!(digest = %hex::encode(digest), "request digest");
        let signature = self.signer.sign_digest(&digest)?;
        Ok(URL_SAFE_NO_PAD.encode(signature))
    }

    /// Check an encoded signature against the request it claims to cover
    pub fn verify_request(
        &self,
        token: &ReplayToken,
        uri: &str,
        body: &[u8],
        signature: &str,
    ) -> bool {
        let Ok(raw) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        self.signer
            .verify_digest(&Self::digest(token, uri, body), &raw)
    }
}
