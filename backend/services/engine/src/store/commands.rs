use tokio::sync::oneshot;

use crate::error::StoreResult;
use crate::store::query::Query;
use crate::store::settlement::CreditResults;
use crate::store::subscription::Subscription;
use crate::types::bet_types::{Bet, NewBet};
use crate::types::market_types::{Market, MarketPatch, NewMarket};
use crate::types::settlement_types::SettlementReport;

#[derive(Debug)]
pub enum Command {
    CreateMarket(Option<String>, NewMarket, oneshot::Sender<StoreResult<Market>>),
    UpdateMarket(String, MarketPatch, oneshot::Sender<StoreResult<Market>>),
    GetMarket(String, oneshot::Sender<StoreResult<Market>>),
    QueryMarkets(Query, oneshot::Sender<Vec<Market>>),
    SubscribeMarkets(bool, Query, oneshot::Sender<Subscription<Market>>),

    PlaceBet(NewBet, oneshot::Sender<StoreResult<Bet>>),
    GetBet(String, oneshot::Sender<StoreResult<Bet>>),
    QueryBets(Option<String>, Query, oneshot::Sender<Vec<Bet>>),
    SubscribeBets(Option<String>, Query, oneshot::Sender<Subscription<Bet>>),

    SettleMarket(String, oneshot::Sender<StoreResult<SettlementReport>>),
    /// Sent back by the payout task once a settlement batch has been credited.
    FinishSettlement(
        String,
        CreditResults,
        u64,
        oneshot::Sender<StoreResult<SettlementReport>>,
    ),
}
