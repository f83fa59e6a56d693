use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry on a Redis stream: the routing metadata plus a typed payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StreamEnvelope<T> {
    pub stream: String,
    pub event_type: String,
    pub data: T,
    pub published_at: DateTime<Utc>,
}

impl<T: Serialize> StreamEnvelope<T> {
    pub fn new(stream: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            stream: stream.into(),
            event_type: event_type.into(),
            data,
            published_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| format!("Failed to serialize envelope: {}", e))
    }
}
