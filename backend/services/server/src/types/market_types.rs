use engine::display::{MarketOdds, MarketSummary};
use engine::types::market_types::{Market, MarketOutcome};
use engine::types::settlement_types::SettlementReport;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Validate, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketInput {
    #[validate(length(min = 1, max = 280, message = "Question must be 1 to 280 characters"))]
    pub question: String,
    #[serde(default)]
    pub category: String,
    #[validate(range(min = 1, message = "Days until resolution must be at least 1"))]
    pub days_until_resolution: Option<i64>,
    pub resolution_date: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct ResolveMarketInput {
    pub outcome: MarketOutcome,
}

#[derive(Deserialize, Debug, Default)]
pub struct MarketQueryParams {
    pub q: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct MarketStreamParams {
    pub q: Option<String>,
    pub live: Option<bool>,
}

/// A market with its derived odds and display fields.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MarketView {
    #[serde(flatten)]
    pub market: Market,
    pub odds: MarketOdds,
    pub summary: MarketSummary,
}

impl MarketView {
    pub fn new(market: Market, now: i64) -> Self {
        Self {
            odds: MarketOdds::of(&market),
            summary: MarketSummary::of(&market, now),
            market,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ResolutionView {
    pub market: Market,
    pub settlement: SettlementReport,
}
