//! JSON frames exchanged on the channel socket

use crate::domain::{AmbraError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientMessage {
    Subscribe { channel: String, sid: String },
    Unsubscribe { channel: String, sid: String },
    Ping,
}

/// An event published on a channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub channel: String,
    pub event: String,
    /// The whole frame, including `channel` and `event`
    pub payload: Value,
}

/// Reply to a client action
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReply {
    pub status: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
}

impl StatusReply {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("OK")
    }

    /// `Ok(())` for an OK reply, a `WebSocket` error otherwise
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            return Ok(());
        }
        Err(AmbraError::WebSocket(format!(
            "{} {} failed: {}",
            self.action.as_deref().unwrap_or("request"),
            self.channel.as_deref().unwrap_or("-"),
            self.error_type.as_deref().unwrap_or("unknown error"),
        )))
    }
}

/// Frame received from the server
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Event(ChannelEvent),
    Status(StatusReply),
    Other(Value),
}

impl ServerMessage {
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        let channel = value.get("channel").and_then(Value::as_str);
        let event = value.get("event").and_then(Value::as_str);
        if let (Some(channel), Some(event)) = (channel, event) {
            return Ok(ServerMessage::Event(ChannelEvent {
                channel: channel.to_string(),
                event: event.to_string(),
                payload: value,
            }));
        }

        if value.get("status").is_some() {
            let reply: StatusReply = serde_json::from_value(value)?;
            return Ok(ServerMessage::Status(reply));
        }

        Ok(ServerMessage::Other(value))
    }
}
