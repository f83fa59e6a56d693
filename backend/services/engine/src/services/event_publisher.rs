use futures_util::future::BoxFuture;
use log::{debug, error, warn};
use redis_client::{RedisManager, StreamEnvelope};
use tokio::sync::mpsc;

use crate::types::store_event_types::StoreEvent;

pub const MARKET_EVENTS_STREAM: &str = "market_events";
pub const EVENT_BUFFER: usize = 10_000;

pub async fn publish_store_event(event: StoreEvent) -> Result<(), String> {
    let redis_manager = match RedisManager::global() {
        Some(rm) => rm,
        None => {
            debug!("Redis manager not initialized, skipping {} event", event.event_type());
            return Err("Redis manager not initialized".into());
        }
    };

    let envelope = StreamEnvelope::new(MARKET_EVENTS_STREAM, event.event_type(), &event);
    redis_manager.append_envelope(&envelope).await
}

/// Hands store events to one long-lived task, which publishes them in the
/// order the store produced them.
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<StoreEvent>,
}

impl EventPublisher {
    /// Publisher writing to the `market_events` Redis stream, or `None`
    /// when Redis has not been initialised.
    pub fn spawn_redis() -> Option<Self> {
        RedisManager::global()?;
        Some(Self::spawn_with(EVENT_BUFFER, |event| {
            Box::pin(publish_store_event(event))
        }))
    }

    pub(crate) fn spawn_with<P>(buffer: usize, mut publish: P) -> Self
    where
        P: FnMut(StoreEvent) -> BoxFuture<'static, Result<(), String>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<StoreEvent>(buffer.max(1));
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let event_type = event.event_type();
                if let Err(e) = publish(event).await {
                    error!("Failed to publish {} event: {}", event_type, e);
                }
            }
            debug!("Event publisher stopped");
        });
        Self { tx }
    }

    /// Queues `events` without waiting; events are dropped when the queue is full.
    pub fn publish_all(&self, events: Vec<StoreEvent>) {
        for event in events {
            if let Err(e) = self.tx.try_send(event) {
                warn!("Dropping store event: {}", e);
            }
        }
    }
}
