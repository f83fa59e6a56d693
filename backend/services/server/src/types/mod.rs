pub mod market_types;
pub mod bet_types;
