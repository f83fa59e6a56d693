use serde::{Deserialize, Serialize};

use crate::types::bet_types::BetPosition;
use crate::types::market_types::MarketOutcome;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayoutKind {
    Winnings,
    Loss,
    Refund,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    pub bet_id: String,
    pub market_id: String,
    pub bettor: String,
    pub position: BetPosition,
    pub stake: u64,
    pub amount: u64,
    pub kind: PayoutKind,
    pub settled_at: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FailedPayout {
    pub bet_id: String,
    pub bettor: String,
    pub amount: u64,
    pub error: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub market_id: String,
    pub outcome: MarketOutcome,
    /// Every payout recorded for the market so far, in bet order.
    pub payouts: Vec<Payout>,
    pub newly_settled: usize,
    pub failed: Vec<FailedPayout>,
    /// Lamports left in the pot after flooring each winner's share.
    pub dust: u64,
}

impl SettlementReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_paid(&self) -> u64 {
        self.payouts.iter().map(|p| p.amount).sum()
    }
}
