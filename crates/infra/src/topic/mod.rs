//! Infrastructure-backed alert topics.
//!
//! The topic abstraction lives in `fleetguard-events` as pure mechanics.
//! This module provides implementations backed by external brokers.

#[cfg(feature = "redis")]
pub mod redis_pubsub;

#[cfg(feature = "redis")]
pub use redis_pubsub::{RedisTopic, RedisTopicError};
