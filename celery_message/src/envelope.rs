use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// A task published to a broker: an opaque, already-packed body plus the
/// metadata a worker needs to decode and route it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    /// The packed body, in the encoding named by `properties.body_encoding`.
    pub body: String,

    /// Always `"utf-8"`: the body is itself a UTF-8 transport string, whatever
    /// bytes it decodes to.
    #[serde(rename = "content-encoding")]
    pub content_encoding: String,

    /// The MIME type of the serializer that produced `body`.
    #[serde(rename = "content-type")]
    pub content_type: String,

    /// Free-form headers carried alongside the body.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// AMQP/transport-level properties.
    pub properties: TaskProperties,
}

/// The `properties` section of a [`TaskMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProperties {
    /// Correlates this task with its eventual [`ResultEnvelope`].
    pub correlation_id: Uuid,

    /// The queue a result should be replied to, for RPC-style backends.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reply_to: Option<Uuid>,

    /// Whether the broker should persist this message across restarts.
    pub delivery_mode: DeliveryMode,

    /// Routing metadata.
    pub delivery_info: DeliveryInfo,

    /// Broker-level priority, if the queue supports priorities.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub priority: Option<u8>,

    /// How `body` is encoded as a string (`"base64"` or `"utf-8"`).
    pub body_encoding: String,
}

/// Where a [`TaskMessage`] is routed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    /// The exchange to publish to. The empty string means the default
    /// exchange, routed directly by queue name.
    pub exchange: String,
    /// The routing key, conventionally the destination queue name.
    pub routing_key: String,
}

/// AMQP's `delivery-mode` property: whether a message survives a broker
/// restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Not persisted to disk (`1`).
    Transient,
    /// Persisted to disk (`2`).
    Persistent,
}

impl DeliveryMode {
    /// Returns the AMQP `delivery-mode` integer this variant represents.
    pub fn as_u8(self) -> u8 {
        match self {
            DeliveryMode::Transient => 1,
            DeliveryMode::Persistent => 2,
        }
    }

    fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(DeliveryMode::Transient),
            2 => Some(DeliveryMode::Persistent),
            _ => None,
        }
    }
}

impl Serialize for DeliveryMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for DeliveryMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DeliveryModeVisitor;

        impl Visitor<'_> for DeliveryModeVisitor {
            type Value = DeliveryMode;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("1 (transient) or 2 (persistent)")
            }

            fn visit_u64<E: de::Error>(self, raw: u64) -> Result<Self::Value, E> {
                DeliveryMode::from_u8(raw as u8)
                    .ok_or_else(|| E::custom(format!("invalid delivery-mode: {raw}")))
            }
        }

        deserializer.deserialize_u8(DeliveryModeVisitor)
    }
}

/// The lifecycle status of a task's [`ResultEnvelope`], mirroring the
/// Celery protocol's uppercase status strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// The task has not yet been picked up by a worker.
    Pending,
    /// A worker has acknowledged the task but not started executing it.
    Received,
    /// A worker is executing the task.
    Started,
    /// The task completed without raising.
    Success,
    /// The task raised.
    Failure,
    /// The task was revoked before or during execution.
    Revoked,
    /// The task is scheduled for a retry.
    Retry,
}

/// A task's result, as read back from a [`crate::Packer`]-compatible
/// backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// The task this result belongs to.
    pub task_id: Uuid,
    /// The task's current lifecycle status.
    pub status: TaskStatus,
    /// The task's return value, or a serialized exception descriptor when
    /// `status` is [`TaskStatus::Failure`].
    pub result: serde_json::Value,
    /// A formatted traceback, present only on failure.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub traceback: Option<String>,
    /// Results of any subtasks spawned by this task, in completion order.
    #[serde(default)]
    pub children: Vec<ResultEnvelope>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn delivery_mode_round_trips_as_an_integer() {
        // Given
        let json = serde_json::to_string(&DeliveryMode::Persistent).unwrap();

        // Then
        assert_eq!(json, "2");
        assert_eq!(
            serde_json::from_str::<DeliveryMode>(&json).unwrap(),
            DeliveryMode::Persistent
        );
    }

    #[test]
    fn task_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Success).unwrap(),
            "\"SUCCESS\""
        );
    }

    #[test]
    fn result_envelope_round_trips_through_json() {
        // Given
        let envelope = ResultEnvelope {
            task_id: Uuid::nil(),
            status: TaskStatus::Success,
            result: serde_json::json!(25),
            traceback: None,
            children: Vec::new(),
        };

        // When
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: ResultEnvelope = serde_json::from_str(&json).unwrap();

        // Then
        assert_eq!(parsed, envelope);
    }
}
