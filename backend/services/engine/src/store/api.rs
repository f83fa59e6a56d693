use chrono::Utc;
use tokio::sync::{mpsc, oneshot};

use crate::error::{StoreError, StoreResult};
use crate::store::commands::Command;
use crate::store::query::Query;
use crate::store::subscription::Subscription;
use crate::types::bet_types::{Bet, NewBet};
use crate::types::market_types::{
    Market, MarketOutcome, MarketPatch, MarketRecord, NewMarket,
};
use crate::types::settlement_types::SettlementReport;

/// Cloneable handle to the market store actor.
#[derive(Clone)]
pub struct MarketStore {
    pub(crate) tx: mpsc::Sender<Command>,
}

fn unavailable(what: &str) -> StoreError {
    StoreError::Unavailable(format!("failed to {}", what))
}

/// `*` or an empty scope covers every market.
fn parse_scope(scope: &str) -> Option<String> {
    match scope.trim() {
        "" | "*" => None,
        market_id => Some(market_id.to_string()),
    }
}

impl MarketStore {
    pub(crate) fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    async fn request<R>(
        &self,
        what: &str,
        build: impl FnOnce(oneshot::Sender<R>) -> Command,
    ) -> Result<R, StoreError> {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(build(tx)).await;
        rx.await.map_err(|_| unavailable(what))
    }

    /// Creates a market under a generated `market-<uuid>` id.
    pub async fn create_market(&self, new_market: NewMarket) -> StoreResult<Market> {
        self.request("create market", |tx| Command::CreateMarket(None, new_market, tx))
            .await?
    }

    /// Creates a market resolving `days` days from now.
    pub async fn create_market_in_days(
        &self,
        question: &str,
        category: &str,
        days: i64,
    ) -> StoreResult<Market> {
        let new_market =
            NewMarket::resolving_in_days(question, category, days, Utc::now().timestamp())?;
        self.create_market(new_market).await
    }

    /// Creates a market under a caller-chosen id.
    pub async fn insert_market(
        &self,
        market_id: &str,
        record: MarketRecord,
    ) -> StoreResult<Market> {
        let new_market = record.into_new_market()?;
        let id = market_id.to_string();
        self.request("create market", |tx| Command::CreateMarket(Some(id), new_market, tx))
            .await?
    }

    pub async fn update_market(&self, market_id: &str, patch: MarketPatch) -> StoreResult<Market> {
        let id = market_id.to_string();
        self.request("update market", |tx| Command::UpdateMarket(id, patch, tx))
            .await?
    }

    pub async fn resolve_market(
        &self,
        market_id: &str,
        outcome: MarketOutcome,
    ) -> StoreResult<Market> {
        if !outcome.is_terminal() {
            return Err(StoreError::validation("resolution outcome must be yes, no or cancelled"));
        }
        self.update_market(market_id, MarketPatch::resolve(outcome)).await
    }

    pub async fn get_market(&self, market_id: &str) -> StoreResult<Market> {
        let id = market_id.to_string();
        self.request("get market", |tx| Command::GetMarket(id, tx)).await?
    }

    pub async fn query_markets(&self, expression: &str) -> StoreResult<Vec<Market>> {
        let query = Query::parse_for::<Market>(expression)?;
        self.request("query markets", |tx| Command::QueryMarkets(query, tx))
            .await
    }

    /// Snapshot first; with `live` further snapshots follow every change to the result.
    pub async fn subscribe_markets(
        &self,
        live: bool,
        expression: &str,
    ) -> StoreResult<Subscription<Market>> {
        let query = Query::parse_for::<Market>(expression)?;
        self.request("subscribe to markets", |tx| {
            Command::SubscribeMarkets(live, query, tx)
        })
        .await
    }

    pub async fn place_bet(&self, new_bet: NewBet) -> StoreResult<Bet> {
        self.request("place bet", |tx| Command::PlaceBet(new_bet, tx))
            .await?
    }

    pub async fn get_bet(&self, bet_id: &str) -> StoreResult<Bet> {
        let id = bet_id.to_string();
        self.request("get bet", |tx| Command::GetBet(id, tx)).await?
    }

    /// `scope` is `*` for every market or a single market id.
    pub async fn query_bets(&self, scope: &str, expression: &str) -> StoreResult<Vec<Bet>> {
        let query = Query::parse_for::<Bet>(expression)?;
        let scope = parse_scope(scope);
        self.request("query bets", |tx| Command::QueryBets(scope, query, tx))
            .await
    }

    /// Live bet subscription; a disabled subscription ends without yielding.
    pub async fn subscribe_bets(
        &self,
        enabled: bool,
        scope: &str,
        expression: &str,
    ) -> StoreResult<Subscription<Bet>> {
        let query = Query::parse_for::<Bet>(expression)?;
        if !enabled {
            return Ok(Subscription::disabled());
        }
        let scope = parse_scope(scope);
        self.request("subscribe to bets", |tx| Command::SubscribeBets(scope, query, tx))
            .await
    }

    /// Credits run off the store task; other operations proceed while this waits.
    pub async fn settle_market(&self, market_id: &str) -> StoreResult<SettlementReport> {
        let id = market_id.to_string();
        self.request("settle market", |tx| Command::SettleMarket(id, tx))
            .await?
    }
}
