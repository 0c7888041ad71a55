//! In-memory topic for tests/dev.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, mpsc};

use thiserror::Error;

use crate::topic::{Subscription, Topic};

#[derive(Debug, Error)]
pub enum InMemoryTopicError {
    /// Publish failed due to internal lock poisoning.
    #[error("topic lock poisoned")]
    Poisoned,
}

/// In-memory pub/sub topic.
///
/// - No IO / no async
/// - Best-effort fan-out; dead subscribers are dropped on publish
/// - Counts accepted publishes so tests can assert on them without subscribing
#[derive(Debug)]
pub struct InMemoryTopic<M> {
    name: String,
    subscribers: Mutex<Vec<mpsc::Sender<M>>>,
    published: AtomicU64,
}

impl<M> InMemoryTopic<M> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: Mutex::new(Vec::new()),
            published: AtomicU64::new(0),
        }
    }

    /// Number of messages accepted since creation.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }
}

impl<M> Topic<M> for InMemoryTopic<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryTopicError;

    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut subs = self.subscribers.lock().map_err(|_| InMemoryTopicError::Poisoned)?;

        subs.retain(|tx| tx.send(message.clone()).is_ok());
        self.published.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();

        // A poisoned lock still yields a subscription; it just never receives.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        Subscription::new(rx)
    }
}
