use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::Result;
use crate::market::MarketSnapshot;

/// A serialized message, shared across all recipients of one broadcast.
pub type Frame = Arc<str>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    #[serde(flatten)]
    pub snapshot: MarketSnapshot,
    /// Unix seconds.
    pub timestamp: i64,
}

/// Messages pushed to subscribers, tagged `"initial"` or `"update"`.
///
/// Wire form: `{"type":"initial","data":{"stocks":[..],"performance":{..},"overview":{..},"timestamp":1700000000}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum HubMessage {
    Initial(SnapshotPayload),
    Update(SnapshotPayload),
}

impl HubMessage {
    pub fn initial(snapshot: MarketSnapshot, at: DateTime<Utc>) -> Self {
        HubMessage::Initial(SnapshotPayload {
            snapshot,
            timestamp: at.timestamp(),
        })
    }

    pub fn update(snapshot: MarketSnapshot, at: DateTime<Utc>) -> Self {
        HubMessage::Update(SnapshotPayload {
            snapshot,
            timestamp: at.timestamp(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HubMessage::Initial(_) => "initial",
            HubMessage::Update(_) => "update",
        }
    }

    pub fn to_frame(&self) -> Result<Frame> {
        Ok(Arc::from(serde_json::to_string(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let frame = HubMessage::initial(MarketSnapshot::default(), at)
            .to_frame()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(value["type"], "initial");
        assert_eq!(value["data"]["timestamp"], at.timestamp());
        assert!(value["data"]["stocks"].is_array());
        assert!(value["data"]["performance"]["gainers"].is_array());
        assert!(value["data"]["overview"]["advancing"].is_number());
    }

    #[test]
    fn test_update_kind() {
        let msg = HubMessage::update(MarketSnapshot::default(), Utc::now());
        assert_eq!(msg.kind(), "update");
        assert!(msg.to_frame().unwrap().starts_with(r#"{"type":"update""#));
    }
}
