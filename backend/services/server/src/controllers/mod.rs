pub mod admin_market_controller;
pub mod bet_controller;
pub mod market_controller;
