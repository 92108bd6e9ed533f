/*
[INPUT]:  Raw WebSocket frame payloads and the session's stream kind
[OUTPUT]: Parsed StreamMessage values with human-readable rendering
[POS]:    WebSocket layer - message parsing and validation
[UPDATE]: When adding new message types or changing format
*/

use crate::error::{Result, XsignError};
use crate::types::StreamKind;
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Action lifecycle update from the core-client stream.
///
/// Absent fields take their zero value; only a wrong type fails decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ActionUpdate {
    pub id: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub status: String,
    pub timestamp: i64,
    #[serde(rename = "expireTime")]
    pub expire_time: i64,
}

/// Transaction status update from the liquidity-hub stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LiquidityUpdate {
    #[serde(rename = "txID")]
    pub tx_id: String,
    pub status: String,
}

/// Decoded inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Raw(Map<String, Value>),
    ActionUpdate(ActionUpdate),
    LiquidityUpdate(LiquidityUpdate),
}

impl StreamMessage {
    pub fn kind(&self) -> StreamKind {
        match self {
            StreamMessage::Raw(_) => StreamKind::Raw,
            StreamMessage::ActionUpdate(_) => StreamKind::ActionUpdate,
            StreamMessage::LiquidityUpdate(_) => StreamKind::LiquidityUpdate,
        }
    }
}

/// Decode one frame payload as `kind`. There is no fallback to another kind.
pub fn decode(frame: &[u8], kind: StreamKind) -> Result<StreamMessage> {
    let decoded = match kind {
        StreamKind::Raw => serde_json::from_slice(frame).map(StreamMessage::Raw),
        StreamKind::ActionUpdate => decode_object(frame).map(StreamMessage::ActionUpdate),
        StreamKind::LiquidityUpdate => decode_object(frame).map(StreamMessage::LiquidityUpdate),
    };
    decoded.map_err(|source| XsignError::Decode { kind, source })
}

/// Typed updates only come from JSON objects; arrays are not read positionally
fn decode_object<T: DeserializeOwned>(frame: &[u8]) -> serde_json::Result<T> {
    let fields: Map<String, Value> = serde_json::from_slice(frame)?;
    serde_json::from_value(Value::Object(fields))
}

fn format_epoch(seconds: i64) -> String {
    match DateTime::from_timestamp(seconds, 0) {
        Some(time) => time.format("%d %b %y %H:%M UTC").to_string(),
        None => seconds.to_string(),
    }
}

impl fmt::Display for ActionUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "NEW ACTION: {}", self.id)?;
        writeln!(f, "Type: {}\tStatus: {}", self.action_type, self.status)?;
        write!(
            f,
            "Created: {}\tExpires: {}",
            format_epoch(self.timestamp),
            format_epoch(self.expire_time)
        )
    }
}

impl fmt::Display for LiquidityUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UPDATE IN LIQUIDITY HUB. TxID: {}, Status: {}",
            self.tx_id, self.status
        )
    }
}

impl fmt::Display for StreamMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamMessage::Raw(fields) => {
                let rendered = serde_json::to_string_pretty(fields).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
            StreamMessage::ActionUpdate(update) => fmt::Display::fmt(update, f),
            StreamMessage::LiquidityUpdate(update) => fmt::Display::fmt(update, f),
        }
    }
}
