pub mod admin;
pub mod wallet;
