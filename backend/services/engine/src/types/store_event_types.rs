use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::bet_types::BetPosition;
use crate::types::market_types::{Market, MarketOutcome, MarketStatus};
use crate::types::settlement_types::PayoutKind;

/// Change notifications emitted by the store after a mutation commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum StoreEvent {
    #[serde(rename = "market_created")]
    MarketCreated(MarketCreatedEvent),
    #[serde(rename = "market_updated")]
    MarketUpdated(MarketUpdatedEvent),
    #[serde(rename = "market_resolved")]
    MarketResolved(MarketResolvedEvent),
    #[serde(rename = "bet_placed")]
    BetPlaced(BetPlacedEvent),
    #[serde(rename = "bet_settled")]
    BetSettled(BetSettledEvent),
}

impl StoreEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            StoreEvent::MarketCreated(_) => "market_created",
            StoreEvent::MarketUpdated(_) => "market_updated",
            StoreEvent::MarketResolved(_) => "market_resolved",
            StoreEvent::BetPlaced(_) => "bet_placed",
            StoreEvent::BetSettled(_) => "bet_settled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketCreatedEvent {
    pub market_id: String,
    pub question: String,
    pub category: String,
    pub resolution_date: i64,
    pub timestamp: DateTime<Utc>,
}

impl From<&Market> for MarketCreatedEvent {
    fn from(market: &Market) -> Self {
        Self {
            market_id: market.id.clone(),
            question: market.question.clone(),
            category: market.category.clone(),
            resolution_date: market.resolution_date,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketUpdatedEvent {
    pub market_id: String,
    pub question: String,
    pub category: String,
    pub resolution_date: i64,
    pub status: MarketStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketResolvedEvent {
    pub market_id: String,
    pub outcome: MarketOutcome,
    pub total_yes_bets: u64,
    pub total_no_bets: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetPlacedEvent {
    pub bet_id: String,
    pub market_id: String,
    pub bettor: String,
    pub position: BetPosition,
    pub amount: u64,
    pub total_yes_bets: u64,
    pub total_no_bets: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetSettledEvent {
    pub bet_id: String,
    pub market_id: String,
    pub bettor: String,
    pub payout: u64,
    pub kind: PayoutKind,
    pub timestamp: DateTime<Utc>,
}
