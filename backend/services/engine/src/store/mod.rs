mod actor;
mod api;
mod commands;
pub mod query;
mod registry;
pub mod settlement;
pub mod subscription;

pub use actor::{spawn_market_actor, spawn_market_actor_with_sink, DEFAULT_COMMAND_BUFFER};
pub use api::MarketStore;
pub use query::Query;
pub use settlement::{InMemoryLedger, PayoutSink};
pub use subscription::Subscription;
