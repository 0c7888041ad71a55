//! Notification topics (pub/sub mechanics only).

pub mod envelope;
pub mod in_memory_topic;
pub mod topic;

pub use envelope::Envelope;
pub use in_memory_topic::{InMemoryTopic, InMemoryTopicError};
pub use topic::{Subscription, Topic};
