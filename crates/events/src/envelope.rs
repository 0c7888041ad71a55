use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire envelope for a message published to an external topic.
///
/// - `message_id` is unique per publish (UUIDv7, time-ordered); it is not a
///   deduplication key.
/// - `region` records which deployment region produced the message.
/// - `payload` is the message itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<M> {
    message_id: Uuid,
    topic: String,
    region: String,
    published_at: DateTime<Utc>,

    payload: M,
}

impl<M> Envelope<M> {
    pub fn new(
        message_id: Uuid,
        topic: impl Into<String>,
        region: impl Into<String>,
        published_at: DateTime<Utc>,
        payload: M,
    ) -> Self {
        Self {
            message_id,
            topic: topic.into(),
            region: region.into(),
            published_at,
            payload,
        }
    }

    /// Wrap `payload` with a fresh id and the current time.
    pub fn wrap(topic: impl Into<String>, region: impl Into<String>, payload: M) -> Self {
        Self::new(Uuid::now_v7(), topic, region, Utc::now(), payload)
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn payload(&self) -> &M {
        &self.payload
    }

    pub fn into_payload(self) -> M {
        self.payload
    }
}
