use fred::prelude::*;
use log::{info, warn};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::types::StreamEnvelope;

#[derive(Clone)]
pub struct RedisManager {
    client: RedisClient,
}

static INSTANCE: OnceCell<RedisManager> = OnceCell::new();

impl RedisManager {
    pub fn new(redis_url: &str) -> Result<Self, RedisError> {
        let config = RedisConfig::from_url(redis_url)?;
        let client = RedisClient::new(config, None, None, None);
        Ok(Self { client })
    }

    pub fn init_global(redis_url: &str) -> Result<&'static RedisManager, RedisError> {
        INSTANCE.get_or_try_init(|| Self::new(redis_url))
    }

    pub fn global() -> Option<&'static RedisManager> {
        INSTANCE.get()
    }

    pub async fn connect(&self) -> Result<(), RedisError> {
        self.client.connect();
        self.client.wait_for_connect().await?;
        info!("Connected to Redis");
        Ok(())
    }

    pub async fn stream_add(&self, stream: &str, pairs: &[(&str, &str)]) -> Result<(), RedisError> {
        let fields: Vec<(String, String)> = pairs
            .iter()
            .map(|(field, value)| ((*field).to_owned(), (*value).to_owned()))
            .collect();

        self.client
            .xadd::<(), _, _, _, _>(stream, false, None, "*", fields)
            .await
    }

    /// Appends `envelope` to its stream: `event_type` for routing, `data`
    /// holding the JSON envelope.
    pub async fn append_envelope<T: Serialize>(
        &self,
        envelope: &StreamEnvelope<T>,
    ) -> Result<(), String> {
        let payload = envelope.to_json()?;
        let fields = [("event_type", envelope.event_type.as_str()), ("data", payload.as_str())];
        self.stream_add(&envelope.stream, &fields)
            .await
            .map_err(|e| {
                warn!("XADD to {} failed: {}", envelope.stream, e);
                format!("Failed to append to stream {}: {}", envelope.stream, e)
            })
    }
}
