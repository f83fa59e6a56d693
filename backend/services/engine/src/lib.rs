pub mod display;
pub mod error;
pub mod services;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use store::{spawn_market_actor, spawn_market_actor_with_sink, MarketStore};
