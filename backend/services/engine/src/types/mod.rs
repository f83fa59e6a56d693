pub mod bet_types;
pub mod market_types;
pub mod settlement_types;
pub mod store_event_types;
