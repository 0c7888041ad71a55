//! Topic publishing/subscription abstraction (mechanics only).
//!
//! A topic is the notification backend's view of the world: publishers push
//! messages to a named destination and every subscriber gets a copy.
//!
//! ## Delivery
//!
//! - **Fire-and-forget**: `publish()` returning `Ok` means the backend accepted
//!   the message, not that anybody read it.
//! - **No deduplication**: publishing the same message twice delivers it twice.
//! - **No persistence**: a subscriber that is not connected misses messages.
//!
//! Storage of the record happens before the alert is published, so a failed
//! publish never loses telemetry, only the alert.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a topic.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics). Designed for a single consuming thread.
///
/// ```ignore
/// let topic: Arc<dyn Topic<AlertNotification, Error = _>> = ...;
/// let subscription = topic.subscribe();
///
/// loop {
///     match subscription.recv_timeout(Duration::from_secs(1)) {
///         Ok(alert) => page_on_call(alert),
///         Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
///         Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Collect everything already queued without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Named pub/sub destination for outbound notifications.
///
/// Implementations must be `Send + Sync`; one topic instance is shared by
/// every invocation of the ingestion handler.
pub trait Topic<M>: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    /// Destination name (e.g. the configured alert topic).
    fn name(&self) -> &str;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, T> Topic<M> for Arc<T>
where
    T: Topic<M> + ?Sized,
{
    type Error = T::Error;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
