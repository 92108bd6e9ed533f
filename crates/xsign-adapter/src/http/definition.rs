/*
[INPUT]:  Request definition directory (`<dir>/<name>/uri`, `<dir>/<name>/body`)
[OUTPUT]: Method, URI, and raw body ready for signing
[POS]:    HTTP layer - request definitions loaded from local storage
[UPDATE]: When request definition layout changes
*/

use crate::error::{Result, XsignError};
use crate::types::HttpVerb;
use serde::de::IgnoredAny;
use std::fs;
use std::path::Path;

/// A stored request: `METHOD URI` plus an optional raw body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDefinition {
    pub method: HttpVerb,
    pub uri: String,
    pub body: Vec<u8>,
}

impl RequestDefinition {
    /// Load `<requests_dir>/<name>/uri` and, for payload verbs, `<requests_dir>/<name>/body`
    pub fn load(requests_dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = requests_dir.as_ref().join(name);
        let uri_path = dir.join("uri");
        let line = fs::read_to_string(&uri_path).map_err(|err| {
            XsignError::config(format!("failed to read {}: {err}", uri_path.display()))
        })?;
        let (method, uri) = Self::parse_request_line(&line)?;

        let body = if method.carries_body() {
            let body_path = dir.join("body");
            fs::read(&body_path).map_err(|err| {
                XsignError::config(format!("failed to read {}: {err}", body_path.display()))
            })?
        } else {
            Vec::new()
        };

        Ok(Self { method, uri, body })
    }

    /// Parse `METHOD URI`; exactly one space separates the two words
    pub fn parse_request_line(line: &str) -> Result<(HttpVerb, String)> {
        let line = line.trim_matches(|c| c == '\n' || c == ' ');
        let words: Vec<&str> = line.split(' ').collect();
        let [method, uri] = words.as_slice() else {
            return Err(XsignError::config(format!(
                "invalid uri file: expected 'METHOD URI', got '{line}'"
            )));
        };
        Ok((method.parse()?, uri.to_string()))
    }
}

/// Strip insignificant whitespace from a JSON document.
///
/// Blank input yields an empty body. Every token is kept byte for byte, so
/// number literals and string escapes reach the signature as typed.
pub fn compact_json(input: &str) -> Result<Vec<u8>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<IgnoredAny>(input)
        .map_err(|err| XsignError::config(format!("request body is not valid JSON: {err}")))?;

    let mut compacted = Vec::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    for &byte in input.as_bytes() {
        if in_string {
            compacted.push(byte);
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b' ' | b'\t' | b'\n' | b'\r' => {}
            b'"' => {
                in_string = true;
                compacted.push(byte);
            }
            _ => compacted.push(byte),
        }
    }
    Ok(compacted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_definition(root: &Path, name: &str, uri: &str, body: Option<&[u8]>) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("uri"), uri).unwrap();
        if let Some(body) = body {
            fs::write(dir.join("body"), body).unwrap();
        }
        dir
    }

    #[test]
    fn test_parse_request_line_trims_newlines() {
        let (method, uri) =
            RequestDefinition::parse_request_line("POST https://api.example/orders\n").unwrap();
        assert_eq!(method, HttpVerb::Post);
        assert_eq!(uri, "https://api.example/orders");
    }

    #[test]
    fn test_parse_request_line_rejects_extra_words() {
        assert!(RequestDefinition::parse_request_line("GET").is_err());
        assert!(RequestDefinition::parse_request_line("GET  https://a.example").is_err());
        assert!(RequestDefinition::parse_request_line("GET https://a.example extra").is_err());
    }

    #[test]
    fn test_parse_request_line_rejects_unknown_verb() {
        let err = RequestDefinition::parse_request_line("FETCH https://a.example").unwrap_err();
        assert!(matches!(err, XsignError::Config(_)));
    }

    #[test]
    fn test_load_post_reads_raw_body() {
        let root = tempfile::tempdir().unwrap();
        write_definition(
            root.path(),
            "create-order",
            "POST https://api.example/orders\n",
            Some(b"{\"qty\": 1}\n"),
        );

        let definition = RequestDefinition::load(root.path(), "create-order").unwrap();
        assert_eq!(definition.method, HttpVerb::Post);
        assert_eq!(definition.body, b"{\"qty\": 1}\n");
    }

    #[test]
    fn test_load_get_ignores_body_file() {
        let root = tempfile::tempdir().unwrap();
        write_definition(
            root.path(),
            "list-orders",
            "GET https://api.example/orders",
            Some(b"ignored"),
        );

        let definition = RequestDefinition::load(root.path(), "list-orders").unwrap();
        assert!(definition.body.is_empty());
    }

    #[test]
    fn test_load_post_without_body_file_fails() {
        let root = tempfile::tempdir().unwrap();
        write_definition(root.path(), "broken", "PATCH https://api.example/orders/1", None);

        let err = RequestDefinition::load(root.path(), "broken").unwrap_err();
        assert!(matches!(err, XsignError::Config(_)));
    }

    #[test]
    fn test_load_missing_definition_fails() {
        let root = tempfile::tempdir().unwrap();
        assert!(RequestDefinition::load(root.path(), "nope").is_err());
    }

    #[test]
    fn test_compact_json_preserves_key_order() {
        let compacted = compact_json("{\n  \"qty\": 1,\n  \"asset\": \"BTC\"\n}\n").unwrap();
        assert_eq!(compacted, br#"{"qty":1,"asset":"BTC"}"#);
    }

    #[test]
    fn test_compact_json_keeps_tokens_verbatim() {
        let input = "{\"p\": 1e3, \"s\": \"\\u00e9\", \"n\": 12345678901234567890123}";
        let compacted = compact_json(input).unwrap();
        assert_eq!(
            compacted,
            br#"{"p":1e3,"s":"\u00e9","n":12345678901234567890123}"#
        );
    }

    #[test]
    fn test_compact_json_keeps_whitespace_inside_strings() {
        let input = "{ \"note\" : \"two  words\\t\\\"quoted \\\" \" ,\r\n \"k\":[ 1 , 2 ] }";
        let compacted = compact_json(input).unwrap();
        assert_eq!(
            compacted,
            br#"{"note":"two  words\t\"quoted \" ","k":[1,2]}"#
        );
    }

    #[test]
    fn test_compact_json_blank_and_invalid() {
        assert!(compact_json("  \n").unwrap().is_empty());
        assert!(matches!(compact_json("{qty"), Err(XsignError::Config(_))));
    }
}
