use async_trait::async_trait;
use thiserror::Error;

use super::message::Frame;
use crate::errors::Result;
use crate::market::{MarketSnapshot, MarketViewService};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("subscriber connection closed")]
    Closed,

    #[error("write deadline exceeded")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Write half of one subscriber connection.
///
/// Implementations serialize their own writes; the hub may call
/// `send_text` and `send_ping` from different tasks.
#[async_trait]
pub trait SubscriberSink: Send + Sync {
    async fn send_text(&self, frame: Frame) -> std::result::Result<(), SinkError>;

    async fn send_ping(&self) -> std::result::Result<(), SinkError>;

    /// Best-effort close. Must tolerate being called more than once.
    async fn close(&self);
}

/// Inbound traffic from a subscriber, reduced to what the hub cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Binary,
    Ping,
    Pong,
    Close,
}

/// Produces the state published to subscribers.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> Result<MarketSnapshot>;
}

#[async_trait]
impl SnapshotSource for MarketViewService {
    async fn snapshot(&self) -> Result<MarketSnapshot> {
        MarketViewService::snapshot(self).await
    }
}
