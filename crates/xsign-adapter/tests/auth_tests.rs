/*
[INPUT]:  Fixture key pair and known request values
[OUTPUT]: Test results for request signing and replay tokens
[POS]:    Integration tests - authentication
[UPDATE]: When signing format or replay token semantics change
*/

mod common;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use common::{TEST_PUBLIC_KEY, fixture_signer};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};
use tokio_test::assert_ok;
use xsign_adapter::{
    CounterTokenProvider, FileCounterStore, ReplayToken, ReplayTokenProvider, RequestSigner,
    XsignError,
};

/// Produced with `openssl dgst -sha256 -sign private.pem` over `5https://api.example/orders{"qty":1}`
const ORDERS_SIGNATURE: &str = "Ej3vE0rHWbb4FJWKJpGfUffZx0_HMfhlILosoo9UPB1OXFrahsc5azn_SlC9S9vpC_k8zO4yk8TMunmdpIy1MQl2VidkQDq2BfKwjGOn_TdXxtbb-DmWWAVmSw_2nhgy9eGC2Wh_g9y_wNdJN0wfeMQ70QlQibU8sDMUI--SSkfzIEVSXVuOsmnE_-iK0sdgDPjLirzNDDkV9v45KDC2mldVQac-yf1JI4HoDZ-XoEmihpxDOv05SteSauROEiXBGSHLuCR1y3E1tg-mot9EhSRZMWSI4NveilZvELSuoYQ9JxuGNqHsK52XLeNZeb7OcUBQcrGmVOI8xqERF_bPyw";

/// Same tool, over `1https://api.example/time` (empty body)
const TIME_SIGNATURE: &str = "UWyq8ndXEtc8iSSdzGgX0RY7-ZmeB8iEIXRIyaCdH8QUfj5uvsOL9WevD1mWtweZvyNOSOrslJXUck3M_w5hSXqxGU4-FF8jSNIY6Iyc9w7jVqubGFwg_squqOnnUxgUX_rhpjRZfKKSZMwbOEkrJ48SLu1GSd7CrOqVBBH8rgVtrOMCCH1x0zkyKTcULGBK1lnQYK2yy4C642G6UB3MlPtWE3CIm6wBtMbtNE_uxhKn_0dpGoexcAiNrK3TMfL77kr1IHOHZTkD-JwJg8W4pVxOlF-gyH_-H9eIlWRVPfwwnB9NbyzHOo7aFh77nHHAm-DxBzbUFTSCm1lH-o0WaQ";

fn verify_with_public_key(message: &[u8], signature: &str) -> bool {
    let public_key = assert_ok!(RsaPublicKey::from_pkcs1_pem(TEST_PUBLIC_KEY));
    let raw = assert_ok!(URL_SAFE_NO_PAD.decode(signature));
    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(message), &raw)
        .is_ok()
}

#[test]
fn test_orders_signature_matches_known_answer() {
    let signer = fixture_signer();
    let signature = assert_ok!(signer.sign_request(
        &ReplayToken::new("5"),
        "https://api.example/orders",
        br#"{"qty":1}"#,
    ));
    assert_eq!(signature, ORDERS_SIGNATURE);
}

#[test]
fn test_empty_body_signature_matches_known_answer() {
    let signer = fixture_signer();
    let signature = assert_ok!(signer.sign_request(
        &ReplayToken::new("1"),
        "https://api.example/time",
        b"",
    ));
    assert_eq!(signature, TIME_SIGNATURE);
}

#[test]
fn test_signature_verifies_against_public_key_only_for_original_message() {
    let signer = fixture_signer();
    let token = ReplayToken::new("5");
    let signature = assert_ok!(signer.sign_request(&token, "https://api.example/orders", br#"{"qty":1}"#));

    let original = RequestSigner::canonical_message(&token, "https://api.example/orders", br#"{"qty":1}"#);
    assert!(verify_with_public_key(&original, &signature));

    for index in 0..original.len() {
        let mut altered = original.clone();
        altered[index] ^= 0x01;
        assert!(
            !verify_with_public_key(&altered, &signature),
            "flipping byte {index} must invalidate the signature"
        );
    }
}

#[test]
fn test_counter_file_advances_across_invocations() {
    let dir = assert_ok!(tempfile::tempdir());
    let path = dir.path().join("nonce");

    for expected in ["1", "2", "3"] {
        // a fresh provider per run, as each process invocation would build one
        let provider = CounterTokenProvider::new(FileCounterStore::new(&path));
        let token = assert_ok!(provider.next(None));
        assert_eq!(token.as_str(), expected);
        assert_ok!(provider.commit(&token));
    }

    assert_eq!(assert_ok!(std::fs::read_to_string(&path)), "3");
}

#[test]
fn test_corrupt_counter_file_is_invalid_state() {
    let dir = assert_ok!(tempfile::tempdir());
    let path = dir.path().join("nonce");
    assert_ok!(std::fs::write(&path, "twelve"));

    let provider = CounterTokenProvider::new(FileCounterStore::new(&path));
    assert!(matches!(provider.next(None), Err(XsignError::InvalidState(_))));
}
