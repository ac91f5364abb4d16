use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medtrack_core::{AggregateId, UserId};

/// Envelope for an event, containing user + stream metadata.
///
/// This is the unit publishers hand to the bus.
///
/// Notes:
/// - **Ownership** is carried via `user_id`; consumers must scope their
///   effects to that user.
/// - `sequence_number` is monotonically increasing per stream. Publishers
///   that must serialize effects per medication (intake completions, cabinet
///   mutations) use the medication id as the stream id, so consumers can
///   observe and enforce that ordering.
/// - `payload` is the domain-agnostic event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    user_id: UserId,

    stream_id: AggregateId,
    stream_type: String,

    /// Monotonically increasing position in the stream.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        user_id: UserId,
        stream_id: AggregateId,
        stream_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            user_id,
            stream_id,
            stream_type: stream_type.into(),
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn stream_id(&self) -> AggregateId {
        self.stream_id
    }

    pub fn stream_type(&self) -> &str {
        &self.stream_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
