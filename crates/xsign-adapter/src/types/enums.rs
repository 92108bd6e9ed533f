/*
[INPUT]:  Verb names, stream endpoint kinds, and replay token modes from config/CLI
[OUTPUT]: Typed Rust enums with parsing and serialization support
[POS]:    Data layer - type definitions shared by signing and transport
[UPDATE]: When new verbs, stream kinds, or token schemes are supported
*/

use crate::error::XsignError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP verbs accepted for signed requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Head => "HEAD",
            HttpVerb::Options => "OPTIONS",
        }
    }

    /// Create/update style verbs; only these read and sign a body
    pub fn carries_body(self) -> bool {
        matches!(self, HttpVerb::Post | HttpVerb::Put | HttpVerb::Patch)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVerb {
    type Err = XsignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpVerb::Get),
            "POST" => Ok(HttpVerb::Post),
            "PUT" => Ok(HttpVerb::Put),
            "PATCH" => Ok(HttpVerb::Patch),
            "DELETE" => Ok(HttpVerb::Delete),
            "HEAD" => Ok(HttpVerb::Head),
            "OPTIONS" => Ok(HttpVerb::Options),
            other => Err(XsignError::config(format!("unsupported HTTP method '{other}'"))),
        }
    }
}

/// Message shape a streaming session decodes every frame into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    #[default]
    #[serde(rename = "raw")]
    Raw,
    #[serde(rename = "core-client", alias = "action")]
    ActionUpdate,
    #[serde(rename = "liquidity-hub", alias = "liquidity")]
    LiquidityUpdate,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Raw => "raw",
            StreamKind::ActionUpdate => "core-client",
            StreamKind::LiquidityUpdate => "liquidity-hub",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = XsignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(StreamKind::Raw),
            "core-client" | "action" => Ok(StreamKind::ActionUpdate),
            "liquidity-hub" | "liquidity" => Ok(StreamKind::LiquidityUpdate),
            other => Err(XsignError::config(format!("unknown stream kind '{other}'"))),
        }
    }
}

/// Replay protection scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenMode {
    /// Monotonic counter persisted between runs
    #[default]
    Counter,
    /// Unix epoch seconds
    Timestamp,
}

impl fmt::Display for TokenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenMode::Counter => f.write_str("counter"),
            TokenMode::Timestamp => f.write_str("timestamp"),
        }
    }
}

impl FromStr for TokenMode {
    type Err = XsignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "counter" | "nonce" => Ok(TokenMode::Counter),
            "timestamp" => Ok(TokenMode::Timestamp),
            other => Err(XsignError::config(format!("unknown token mode '{other}'"))),
        }
    }
}
