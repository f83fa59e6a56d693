use chrono::Utc;
use log::{info, warn};
use std::collections::{HashMap, HashSet};

use crate::error::{StoreError, StoreResult};
use crate::store::query::Query;
use crate::store::settlement::{plan_payouts, CreditResults};
use crate::types::bet_types::{compose_bet_id, Bet, BetPosition, NewBet};
use crate::types::market_types::{
    Market, MarketOutcome, MarketPatch, MarketStatus, NewMarket, DEFAULT_CATEGORY,
};
use crate::types::settlement_types::{FailedPayout, Payout, SettlementReport};
use crate::types::store_event_types::{
    BetPlacedEvent, BetSettledEvent, MarketCreatedEvent, MarketResolvedEvent, MarketUpdatedEvent,
    StoreEvent,
};

/// Markets, bets and recorded payouts owned by the store actor.
///
/// Every method either applies its whole mutation or returns an error
/// without touching state.
#[derive(Default)]
pub(crate) struct Registry {
    markets: Vec<Market>,
    market_index: HashMap<String, usize>,
    bets: Vec<Bet>,
    bet_index: HashMap<String, usize>,
    market_bets: HashMap<String, Vec<usize>>,
    payouts: HashMap<String, Payout>,
    /// Bets handed to the payout sink and not yet reported back.
    settling: HashSet<String>,
    bet_seq: u64,
}

/// Payouts planned inside the actor and credited outside it.
#[derive(Debug)]
pub(crate) struct SettlementBatch {
    pub market_id: String,
    pub pending: Vec<Payout>,
    pub dust: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_market(
        &mut self,
        id: String,
        new_market: NewMarket,
        now: i64,
    ) -> StoreResult<(Market, StoreEvent)> {
        if id.trim().is_empty() {
            return Err(StoreError::validation("market id must not be empty"));
        }
        if self.market_index.contains_key(&id) {
            return Err(StoreError::conflict(format!("market {} already exists", id)));
        }
        let new_market = new_market.normalized(now)?;

        let market = Market {
            id: id.clone(),
            question: new_market.question,
            category: new_market.category,
            resolution_date: new_market.resolution_date,
            status: MarketStatus::Active,
            outcome: MarketOutcome::Pending,
            total_yes_bets: 0,
            total_no_bets: 0,
            created_at: now,
            resolved_at: None,
        };

        self.market_index.insert(id.clone(), self.markets.len());
        self.markets.push(market.clone());
        self.market_bets.insert(id, Vec::new());

        info!("Market created: id={}, category={}", market.id, market.category);
        let event = StoreEvent::MarketCreated(MarketCreatedEvent::from(&market));
        Ok((market, event))
    }

    pub fn update_market(
        &mut self,
        market_id: &str,
        patch: MarketPatch,
        now: i64,
    ) -> StoreResult<(Market, StoreEvent)> {
        let idx = self.market_idx(market_id)?;
        let current = &self.markets[idx];

        if current.status == MarketStatus::Resolved {
            warn!("Rejected update to resolved market {}", market_id);
            return Err(StoreError::conflict(format!(
                "market {} is already resolved as {}",
                market_id, current.outcome
            )));
        }
        if patch.is_empty() {
            return Err(StoreError::validation("update has no fields"));
        }

        let status = patch.status.unwrap_or(current.status);
        let outcome = patch.outcome.unwrap_or(current.outcome);
        match status {
            MarketStatus::Resolved if !outcome.is_terminal() => {
                return Err(StoreError::validation(
                    "resolving a market requires an outcome of yes, no or cancelled",
                ));
            }
            MarketStatus::Active if outcome.is_terminal() => {
                return Err(StoreError::validation(
                    "outcome must stay pending while the market is active",
                ));
            }
            _ => {}
        }

        let question = match patch.question {
            Some(q) if q.trim().is_empty() => {
                return Err(StoreError::validation("question must not be empty"));
            }
            Some(q) => q.trim().to_string(),
            None => current.question.clone(),
        };
        let category = match patch.category {
            Some(c) if c.trim().is_empty() => DEFAULT_CATEGORY.to_string(),
            Some(c) => c.trim().to_string(),
            None => current.category.clone(),
        };
        let resolution_date = match patch.resolution_date {
            Some(date) if date <= now => {
                return Err(StoreError::validation(format!(
                    "resolution date {} is not in the future",
                    date
                )));
            }
            Some(date) => date,
            None => current.resolution_date,
        };

        let market = &mut self.markets[idx];
        market.question = question;
        market.category = category;
        market.resolution_date = resolution_date;
        market.status = status;
        market.outcome = outcome;

        let event = if status == MarketStatus::Resolved {
            market.resolved_at = Some(now);
            info!("Market resolved: id={}, outcome={}", market.id, outcome);
            StoreEvent::MarketResolved(MarketResolvedEvent {
                market_id: market.id.clone(),
                outcome,
                total_yes_bets: market.total_yes_bets,
                total_no_bets: market.total_no_bets,
                timestamp: Utc::now(),
            })
        } else {
            StoreEvent::MarketUpdated(MarketUpdatedEvent {
                market_id: market.id.clone(),
                question: market.question.clone(),
                category: market.category.clone(),
                resolution_date: market.resolution_date,
                status: market.status,
                timestamp: Utc::now(),
            })
        };

        Ok((market.clone(), event))
    }

    pub fn get_market(&self, market_id: &str) -> StoreResult<Market> {
        self.market_idx(market_id).map(|idx| self.markets[idx].clone())
    }

    pub fn query_markets(&self, query: &Query) -> Vec<Market> {
        query.select(&self.markets)
    }

    /// Records the bet and bumps the matching market total in one step.
    pub fn place_bet(
        &mut self,
        new_bet: NewBet,
        now: i64,
        now_ms: i64,
    ) -> StoreResult<(Bet, StoreEvent)> {
        if new_bet.amount == 0 {
            return Err(StoreError::validation("bet amount must be greater than zero"));
        }
        let bettor = new_bet.bettor.trim();
        if bettor.is_empty() {
            return Err(StoreError::validation("bettor must not be empty"));
        }

        let idx = self.market_index.get(&new_bet.market_id).copied().ok_or_else(|| {
            StoreError::validation(format!("market {} does not exist", new_bet.market_id))
        })?;
        let market = &self.markets[idx];
        if !market.is_active() {
            return Err(StoreError::validation(format!(
                "market {} is not active",
                market.id
            )));
        }
        if now >= market.resolution_date {
            return Err(StoreError::validation(format!(
                "market {} stopped taking bets at {}",
                market.id, market.resolution_date
            )));
        }

        let (total_yes, total_no) = match new_bet.position {
            BetPosition::Yes => (
                market.total_yes_bets.checked_add(new_bet.amount),
                Some(market.total_no_bets),
            ),
            BetPosition::No => (
                Some(market.total_yes_bets),
                market.total_no_bets.checked_add(new_bet.amount),
            ),
        };
        let (Some(total_yes), Some(total_no)) = (total_yes, total_no) else {
            return Err(StoreError::validation("bet amount overflows the market total"));
        };

        self.bet_seq += 1;
        let bet = Bet {
            id: compose_bet_id(&new_bet.market_id, bettor, now_ms, self.bet_seq),
            market_id: new_bet.market_id.clone(),
            bettor: bettor.to_string(),
            position: new_bet.position,
            amount: new_bet.amount,
            resolved: false,
            created_at: now,
        };

        let market = &mut self.markets[idx];
        market.total_yes_bets = total_yes;
        market.total_no_bets = total_no;

        let bet_idx = self.bets.len();
        self.bet_index.insert(bet.id.clone(), bet_idx);
        self.bets.push(bet.clone());
        self.market_bets
            .entry(bet.market_id.clone())
            .or_default()
            .push(bet_idx);

        let event = StoreEvent::BetPlaced(BetPlacedEvent {
            bet_id: bet.id.clone(),
            market_id: bet.market_id.clone(),
            bettor: bet.bettor.clone(),
            position: bet.position,
            amount: bet.amount,
            total_yes_bets: total_yes,
            total_no_bets: total_no,
            timestamp: Utc::now(),
        });
        Ok((bet, event))
    }

    pub fn get_bet(&self, bet_id: &str) -> StoreResult<Bet> {
        self.bet_index
            .get(bet_id)
            .map(|idx| self.bets[*idx].clone())
            .ok_or_else(|| StoreError::not_found(format!("bet {}", bet_id)))
    }

    /// Bets filtered by `query`, limited to one market when `scope` names it.
    pub fn query_bets(&self, scope: Option<&str>, query: &Query) -> Vec<Bet> {
        match scope {
            None => query.select(&self.bets),
            Some(market_id) => {
                let idxs = self.market_bets.get(market_id).map(Vec::as_slice).unwrap_or(&[]);
                query.select(idxs.iter().map(|idx| &self.bets[*idx]))
            }
        }
    }

    /// Plans payouts for every unresolved bet of a resolved market that is
    /// not already being credited by an earlier settle call.
    pub fn begin_settlement(&mut self, market_id: &str, now: i64) -> StoreResult<SettlementBatch> {
        let market = self.get_market(market_id)?;
        if market.status != MarketStatus::Resolved {
            return Err(StoreError::conflict(format!(
                "market {} has not been resolved",
                market_id
            )));
        }

        let idxs = self.market_bets.get(market_id).cloned().unwrap_or_default();
        let plan = {
            let bets: Vec<&Bet> = idxs.iter().map(|idx| &self.bets[*idx]).collect();
            plan_payouts(
                market.outcome,
                market.total_yes_bets,
                market.total_no_bets,
                &bets,
            )
        };

        let mut pending = Vec::new();
        for (idx, planned) in idxs.iter().zip(plan.entries.iter()) {
            let bet = &self.bets[*idx];
            if bet.resolved || !self.settling.insert(bet.id.clone()) {
                continue;
            }
            pending.push(Payout {
                bet_id: bet.id.clone(),
                market_id: bet.market_id.clone(),
                bettor: bet.bettor.clone(),
                position: bet.position,
                stake: bet.amount,
                amount: planned.amount,
                kind: planned.kind,
                settled_at: now,
            });
        }

        Ok(SettlementBatch {
            market_id: market_id.to_string(),
            pending,
            dust: plan.dust,
        })
    }

    /// Records the credit results of a batch: credited bets become resolved,
    /// failed ones stay unresolved for the next run.
    pub fn finish_settlement(
        &mut self,
        market_id: &str,
        credited: CreditResults,
        dust: u64,
    ) -> StoreResult<(SettlementReport, Vec<StoreEvent>)> {
        let market = self.get_market(market_id)?;

        let mut newly_settled = 0;
        let mut failed = Vec::new();
        let mut events = Vec::new();

        for (payout, res) in credited {
            self.settling.remove(&payout.bet_id);
            if let Err(e) = res {
                warn!("Payout for bet {} failed: {}", payout.bet_id, e);
                failed.push(FailedPayout {
                    bet_id: payout.bet_id,
                    bettor: payout.bettor,
                    amount: payout.amount,
                    error: e,
                });
                continue;
            }

            if let Some(idx) = self.bet_index.get(&payout.bet_id).copied() {
                self.bets[idx].resolved = true;
            }
            events.push(StoreEvent::BetSettled(BetSettledEvent {
                bet_id: payout.bet_id.clone(),
                market_id: payout.market_id.clone(),
                bettor: payout.bettor.clone(),
                payout: payout.amount,
                kind: payout.kind,
                timestamp: Utc::now(),
            }));
            self.payouts.insert(payout.bet_id.clone(), payout);
            newly_settled += 1;
        }

        let payouts: Vec<Payout> = self
            .market_bets
            .get(market_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter_map(|idx| self.payouts.get(&self.bets[*idx].id).cloned())
            .collect();

        info!(
            "Settled market {}: outcome={}, newly_settled={}, failed={}",
            market_id,
            market.outcome,
            newly_settled,
            failed.len()
        );

        Ok((
            SettlementReport {
                market_id: market_id.to_string(),
                outcome: market.outcome,
                payouts,
                newly_settled,
                failed,
                dust,
            },
            events,
        ))
    }

    fn market_idx(&self, market_id: &str) -> StoreResult<usize> {
        self.market_index
            .get(market_id)
            .copied()
            .ok_or_else(|| StoreError::not_found(format!("market {}", market_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::settlement::{credit_all, InMemoryLedger};
    use crate::types::settlement_types::PayoutKind;

    const NOW: i64 = 1_700_000_000;

    fn registry_with_market() -> Registry {
        let mut registry = Registry::new();
        registry
            .create_market(
                "m1".into(),
                NewMarket::new("Will it trend?", "Performance", NOW + 86_400),
                NOW,
            )
            .unwrap();
        registry
    }

    fn bet(registry: &mut Registry, bettor: &str, position: BetPosition, amount: u64) -> Bet {
        registry
            .place_bet(NewBet::new("m1", bettor, position, amount), NOW, NOW * 1_000)
            .unwrap()
            .0
    }

    #[test]
    fn duplicate_market_id_conflicts() {
        let mut registry = registry_with_market();
        let err = registry
            .create_market("m1".into(), NewMarket::new("again", "Content", NOW + 10), NOW)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn bets_accumulate_into_totals() {
        let mut registry = registry_with_market();
        bet(&mut registry, "alice", BetPosition::Yes, 7);
        bet(&mut registry, "bob", BetPosition::No, 3);
        bet(&mut registry, "alice", BetPosition::Yes, 1);

        let market = registry.get_market("m1").unwrap();
        assert_eq!(market.total_yes_bets, 8);
        assert_eq!(market.total_no_bets, 3);
    }

    #[test]
    fn same_instant_bets_get_distinct_ids() {
        let mut registry = registry_with_market();
        let a = bet(&mut registry, "alice", BetPosition::Yes, 1);
        let b = bet(&mut registry, "alice", BetPosition::Yes, 1);
        assert_ne!(a.id, b.id);
        assert_eq!(registry.query_bets(Some("m1"), &Query::all()).len(), 2);
    }

    #[test]
    fn rejected_bets_leave_totals_alone() {
        let mut registry = registry_with_market();
        let zero = registry.place_bet(NewBet::new("m1", "alice", BetPosition::Yes, 0), NOW, 0);
        assert!(matches!(zero, Err(StoreError::Validation(_))));

        let missing = registry.place_bet(NewBet::new("nope", "alice", BetPosition::Yes, 5), NOW, 0);
        assert!(matches!(missing, Err(StoreError::Validation(_))));

        let late = registry.place_bet(
            NewBet::new("m1", "alice", BetPosition::Yes, 5),
            NOW + 86_400,
            0,
        );
        assert!(matches!(late, Err(StoreError::Validation(_))));

        bet(&mut registry, "alice", BetPosition::No, u64::MAX);
        let overflow = registry.place_bet(NewBet::new("m1", "bob", BetPosition::No, 1), NOW, 0);
        assert!(matches!(overflow, Err(StoreError::Validation(_))));

        let market = registry.get_market("m1").unwrap();
        assert_eq!(market.total_yes_bets, 0);
        assert_eq!(market.total_no_bets, u64::MAX);
        assert_eq!(registry.query_bets(None, &Query::all()).len(), 1);
    }

    #[test]
    fn resolution_happens_once_and_freezes_market() {
        let mut registry = registry_with_market();
        registry
            .update_market("m1", MarketPatch::resolve(MarketOutcome::Yes), NOW)
            .unwrap();

        let again = registry.update_market("m1", MarketPatch::resolve(MarketOutcome::No), NOW);
        assert!(matches!(again, Err(StoreError::Conflict(_))));

        let rename = registry.update_market(
            "m1",
            MarketPatch {
                question: Some("changed".into()),
                ..MarketPatch::default()
            },
            NOW,
        );
        assert!(matches!(rename, Err(StoreError::Conflict(_))));

        let late_bet = registry.place_bet(NewBet::new("m1", "alice", BetPosition::Yes, 1), NOW, 0);
        assert!(matches!(late_bet, Err(StoreError::Validation(_))));

        let market = registry.get_market("m1").unwrap();
        assert_eq!(market.outcome, MarketOutcome::Yes);
        assert_eq!(market.resolved_at, Some(NOW));
    }

    #[test]
    fn status_and_outcome_must_agree() {
        let mut registry = registry_with_market();
        let resolved_pending = registry.update_market(
            "m1",
            MarketPatch {
                status: Some(MarketStatus::Resolved),
                ..MarketPatch::default()
            },
            NOW,
        );
        assert!(matches!(resolved_pending, Err(StoreError::Validation(_))));

        let active_terminal = registry.update_market(
            "m1",
            MarketPatch {
                outcome: Some(MarketOutcome::No),
                ..MarketPatch::default()
            },
            NOW,
        );
        assert!(matches!(active_terminal, Err(StoreError::Validation(_))));

        let unknown = registry.update_market("ghost", MarketPatch::resolve(MarketOutcome::No), NOW);
        assert!(matches!(unknown, Err(StoreError::NotFound(_))));
    }

    async fn settle(registry: &mut Registry, ledger: &InMemoryLedger) -> SettlementReport {
        let batch = registry.begin_settlement("m1", NOW).unwrap();
        let credited = credit_all(ledger, batch.pending).await;
        registry
            .finish_settlement(&batch.market_id, credited, batch.dust)
            .unwrap()
            .0
    }

    #[tokio::test]
    async fn settlement_is_idempotent() {
        let mut registry = registry_with_market();
        bet(&mut registry, "alice", BetPosition::Yes, 6);
        bet(&mut registry, "bob", BetPosition::No, 4);
        registry
            .update_market("m1", MarketPatch::resolve(MarketOutcome::Yes), NOW)
            .unwrap();

        let ledger = InMemoryLedger::new();
        let first = settle(&mut registry, &ledger).await;
        assert_eq!(first.newly_settled, 2);
        assert_eq!(ledger.balance_of("alice"), 10);
        assert_eq!(ledger.balance_of("bob"), 0);

        let batch = registry.begin_settlement("m1", NOW + 5).unwrap();
        assert!(batch.pending.is_empty());
        let (second, events) = registry
            .finish_settlement("m1", Vec::new(), batch.dust)
            .unwrap();
        assert_eq!(second.newly_settled, 0);
        assert!(events.is_empty());
        assert_eq!(second.payouts, first.payouts);
        assert_eq!(ledger.balance_of("alice"), 10);
        assert!(registry
            .query_bets(Some("m1"), &Query::all())
            .iter()
            .all(|b| b.resolved));
        assert_eq!(first.payouts[1].kind, PayoutKind::Loss);
    }

    #[test]
    fn in_flight_bets_are_not_planned_twice() {
        let mut registry = registry_with_market();
        bet(&mut registry, "alice", BetPosition::Yes, 6);
        registry
            .update_market("m1", MarketPatch::resolve(MarketOutcome::Yes), NOW)
            .unwrap();

        let first = registry.begin_settlement("m1", NOW).unwrap();
        assert_eq!(first.pending.len(), 1);
        let overlapping = registry.begin_settlement("m1", NOW).unwrap();
        assert!(overlapping.pending.is_empty());

        let failed = first
            .pending
            .into_iter()
            .map(|p| (p, Err("sink offline".to_string())))
            .collect();
        let (report, _) = registry.finish_settlement("m1", failed, first.dust).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(!registry.get_bet(&report.failed[0].bet_id).unwrap().resolved);

        let retry = registry.begin_settlement("m1", NOW).unwrap();
        assert_eq!(retry.pending.len(), 1);
    }

    #[test]
    fn settling_active_market_conflicts() {
        let mut registry = registry_with_market();
        assert!(matches!(
            registry.begin_settlement("m1", NOW),
            Err(StoreError::Conflict(_))
        ));
    }
}
