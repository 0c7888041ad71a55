//! Redis pub/sub-backed alert topic (optional).
//!
//! Redis pub/sub is not durable: subscribers that are offline when an alert is
//! published never see it. That matches the notification contract (no
//! retries, no dead-letter handling).

use std::sync::mpsc;
use std::thread;

use redis::Commands;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use fleetguard_events::{Envelope, Subscription, Topic};

#[derive(Debug, Error)]
pub enum RedisTopicError {
    #[error("redis error: {0}")]
    Redis(String),
    #[error("serialize error: {0}")]
    Serialize(String),
}

/// Redis pub/sub topic carrying JSON [`Envelope`]s.
///
/// The Redis channel name is the topic name.
#[derive(Debug, Clone)]
pub struct RedisTopic {
    client: redis::Client,
    channel: String,
    region: String,
}

impl RedisTopic {
    pub fn new(
        redis_url: impl AsRef<str>,
        channel: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self, RedisTopicError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| RedisTopicError::Redis(e.to_string()))?;
        Ok(Self {
            client,
            channel: channel.into(),
            region: region.into(),
        })
    }
}

impl<M> Topic<M> for RedisTopic
where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    type Error = RedisTopicError;

    fn name(&self) -> &str {
        &self.channel
    }

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let envelope = Envelope::wrap(self.channel.as_str(), self.region.as_str(), message);
        let payload = serde_json::to_string(&envelope)
            .map_err(|e| RedisTopicError::Serialize(e.to_string()))?;

        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| RedisTopicError::Redis(e.to_string()))?;

        let receivers: i64 = conn
            .publish(&self.channel, payload)
            .map_err(|e| RedisTopicError::Redis(e.to_string()))?;

        debug!(
            channel = %self.channel,
            message_id = %envelope.message_id(),
            receivers,
            "alert published"
        );
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();

        let client = self.client.clone();
        let channel = self.channel.clone();

        // Background thread forwarding decoded payloads until the receiver
        // is dropped or the connection dies.
        thread::spawn(move || {
            let mut conn = match client.get_connection() {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "redis subscribe: connection failed");
                    return;
                }
            };

            let mut pubsub = conn.as_pubsub();
            if let Err(e) = pubsub.subscribe(&channel) {
                warn!(error = %e, channel = %channel, "redis subscribe failed");
                return;
            }

            loop {
                let msg = match pubsub.get_message() {
                    Ok(m) => m,
                    Err(_) => return,
                };

                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(_) => continue,
                };

                let envelope: Envelope<M> = match serde_json::from_str(&payload) {
                    Ok(e) => e,
                    Err(e) => {
                        debug!(error = %e, "skipping undecodable message");
                        continue;
                    }
                };

                if tx.send(envelope.into_payload()).is_err() {
                    return;
                }
            }
        });

        Subscription::new(rx)
    }
}
