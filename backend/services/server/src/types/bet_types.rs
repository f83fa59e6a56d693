use engine::types::bet_types::BetPosition;
use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize, Validate, Debug)]
pub struct PlaceBetInput {
    pub position: BetPosition,
    /// Lamports. Signed so a negative amount is a validation error, not a parse error.
    #[validate(range(min = 1, message = "Amount must be greater than 0"))]
    pub amount: i64,
}

#[derive(Deserialize, Debug, Default)]
pub struct BetQueryParams {
    pub scope: Option<String>,
    pub q: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct BetStreamParams {
    pub scope: Option<String>,
    pub q: Option<String>,
    pub enabled: Option<bool>,
}
