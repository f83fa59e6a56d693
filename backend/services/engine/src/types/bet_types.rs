use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::market_types::MarketOutcome;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: String,
    pub market_id: String,
    pub bettor: String,
    pub position: BetPosition,
    pub amount: u64,
    pub resolved: bool,
    pub created_at: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BetPosition {
    Yes,
    No,
}

impl BetPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetPosition::Yes => "yes",
            BetPosition::No => "no",
        }
    }

    /// Whether this side wins under `outcome`. `None` for outcomes with no winning side.
    pub fn wins(&self, outcome: MarketOutcome) -> Option<bool> {
        match outcome {
            MarketOutcome::Yes => Some(*self == BetPosition::Yes),
            MarketOutcome::No => Some(*self == BetPosition::No),
            MarketOutcome::Pending | MarketOutcome::Cancelled => None,
        }
    }
}

impl fmt::Display for BetPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewBet {
    pub market_id: String,
    pub bettor: String,
    pub position: BetPosition,
    pub amount: u64,
}

impl NewBet {
    pub fn new(
        market_id: impl Into<String>,
        bettor: impl Into<String>,
        position: BetPosition,
        amount: u64,
    ) -> Self {
        Self {
            market_id: market_id.into(),
            bettor: bettor.into(),
            position,
            amount,
        }
    }
}

/// Builds a bet id that stays unique when one bettor places several bets
/// on the same market within one clock tick.
pub(crate) fn compose_bet_id(market_id: &str, bettor: &str, created_ms: i64, seq: u64) -> String {
    format!("{}-{}-{}-{}", market_id, bettor, created_ms, seq)
}
