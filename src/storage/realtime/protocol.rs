//! Phoenix channel wire messages used by the realtime endpoint

use super::types::{ChangeEvent, ChangeFilter, ChangeKind};
use crate::storage::remote::Row;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Protocol version sent in the connection URL
pub const PROTOCOL_VSN: &str = "1.0.0";

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_POSTGRES_CHANGES: &str = "postgres_changes";

/// Topic reserved for connection-level messages
pub const PHOENIX_TOPIC: &str = "phoenix";

/// One frame on the socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl PhoenixMessage {
    pub fn new(topic: impl Into<String>, event: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            event: event.into(),
            payload,
            reference: None,
        }
    }

    pub fn with_ref(mut self, reference: u64) -> Self {
        self.reference = Some(reference.to_string());
        self
    }

    /// Join `topic` listening for the changes `filter` describes
    pub fn join(topic: &str, filter: &ChangeFilter, access_token: &str) -> Self {
        let payload = json!({
            "config": {
                "broadcast": { "self": false, "ack": false },
                "presence": { "key": "" },
                "postgres_changes": [{
                    "event": filter.event,
                    "schema": filter.schema,
                    "table": filter.collection,
                }],
            },
            "access_token": access_token,
        });
        Self::new(topic, EVENT_JOIN, payload)
    }

    pub fn leave(topic: &str) -> Self {
        Self::new(topic, EVENT_LEAVE, json!({}))
    }

    pub fn heartbeat() -> Self {
        Self::new(PHOENIX_TOPIC, EVENT_HEARTBEAT, json!({}))
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reply status (`ok` or `error`) of a `phx_reply`
    pub fn reply_status(&self) -> Option<&str> {
        if self.event != EVENT_REPLY {
            return None;
        }
        self.payload.get("status").and_then(Value::as_str)
    }

    /// Change carried by a `postgres_changes` frame
    ///
    /// Returns `None` for any other event or a payload that does not parse.
    pub fn change_event(&self) -> Option<ChangeEvent> {
        if self.event != EVENT_POSTGRES_CHANGES {
            return None;
        }
        let data = self.payload.get("data")?;
        let data: ChangeData = serde_json::from_value(data.clone()).ok()?;

        Some(ChangeEvent {
            kind: data.kind,
            schema: data.schema,
            collection: data.table,
            commit_timestamp: data
                .commit_timestamp
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|ts| ts.with_timezone(&Utc)),
            record: data.record.unwrap_or_default(),
            old_record: data.old_record.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChangeData {
    #[serde(rename = "type")]
    kind: ChangeKind,
    schema: String,
    table: String,
    #[serde(default)]
    commit_timestamp: Option<String>,
    #[serde(default)]
    record: Option<Row>,
    #[serde(default)]
    old_record: Option<Row>,
}
