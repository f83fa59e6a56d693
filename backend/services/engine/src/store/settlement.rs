use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::bet_types::Bet;
use crate::types::market_types::MarketOutcome;
use crate::types::settlement_types::{Payout, PayoutKind};

/// Destination for settlement credits, e.g. a wallet transfer.
///
/// `credit` is only called for non-zero payouts and at most once per bet
/// that ends up marked resolved; a returned error leaves the bet unresolved
/// so the next settlement run retries it. Credits run outside the store
/// actor, so a slow sink only delays the settle call that triggered it.
pub trait PayoutSink: Send + Sync {
    fn credit<'a>(&'a self, payout: &'a Payout) -> BoxFuture<'a, Result<(), String>>;
}

/// Keeps credited lamports per bettor in memory.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    balances: Arc<Mutex<HashMap<String, u64>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, bettor: &str) -> u64 {
        self.lock().get(bettor).copied().unwrap_or(0)
    }

    // Each credit is a single checked add, so the map is consistent even
    // after a panic elsewhere poisoned the lock.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.balances.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, payout: &Payout) -> Result<(), String> {
        let mut balances = self.lock();
        let balance = balances.entry(payout.bettor.clone()).or_insert(0);
        *balance = balance
            .checked_add(payout.amount)
            .ok_or_else(|| format!("balance overflow for {}", payout.bettor))?;
        Ok(())
    }
}

impl PayoutSink for InMemoryLedger {
    fn credit<'a>(&'a self, payout: &'a Payout) -> BoxFuture<'a, Result<(), String>> {
        Box::pin(async move { self.apply(payout) })
    }
}

pub(crate) type CreditResults = Vec<(Payout, Result<(), String>)>;

/// Credits `pending` in order. Zero payouts (losses) need no credit.
pub(crate) async fn credit_all(sink: &dyn PayoutSink, pending: Vec<Payout>) -> CreditResults {
    let mut results = Vec::with_capacity(pending.len());
    for payout in pending {
        let res = if payout.amount > 0 {
            sink.credit(&payout).await
        } else {
            Ok(())
        };
        results.push((payout, res));
    }
    results
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlannedPayout {
    pub amount: u64,
    pub kind: PayoutKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PayoutPlan {
    pub entries: Vec<PlannedPayout>,
    pub dust: u64,
}

/// Pari-mutuel split of a resolved market, one entry per bet in order.
///
/// Winners get their stake back plus `stake * losing / winning` of the
/// losing pool, floored. Cancelled markets and markets with nothing staked
/// on the winning side refund every stake.
pub(crate) fn plan_payouts(
    outcome: MarketOutcome,
    total_yes: u64,
    total_no: u64,
    bets: &[&Bet],
) -> PayoutPlan {
    let refund_all = |bets: &[&Bet]| PayoutPlan {
        entries: bets
            .iter()
            .map(|b| PlannedPayout {
                amount: b.amount,
                kind: PayoutKind::Refund,
            })
            .collect(),
        dust: 0,
    };

    let (winning_total, losing_total) = match outcome {
        MarketOutcome::Yes => (total_yes, total_no),
        MarketOutcome::No => (total_no, total_yes),
        MarketOutcome::Cancelled | MarketOutcome::Pending => return refund_all(bets),
    };
    if winning_total == 0 {
        return refund_all(bets);
    }

    let entries: Vec<PlannedPayout> = bets
        .iter()
        .map(|bet| match bet.position.wins(outcome) {
            Some(true) => {
                let share =
                    (bet.amount as u128) * (losing_total as u128) / (winning_total as u128);
                PlannedPayout {
                    amount: bet.amount.saturating_add(share as u64),
                    kind: PayoutKind::Winnings,
                }
            }
            _ => PlannedPayout {
                amount: 0,
                kind: PayoutKind::Loss,
            },
        })
        .collect();

    let pot = (total_yes as u128) + (total_no as u128);
    let paid: u128 = entries.iter().map(|e| e.amount as u128).sum();
    PayoutPlan {
        entries,
        dust: pot.saturating_sub(paid) as u64,
    }
}
