use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::services::event_publisher::EventPublisher;
use crate::store::api::MarketStore;
use crate::store::commands::Command;
use crate::store::registry::{Registry, SettlementBatch};
use crate::store::settlement::{credit_all, InMemoryLedger, PayoutSink};
use crate::store::subscription::{SubscriberSet, Subscription};
use crate::types::bet_types::Bet;
use crate::types::market_types::Market;
use crate::types::settlement_types::SettlementReport;
use crate::types::store_event_types::StoreEvent;

pub const DEFAULT_COMMAND_BUFFER: usize = 1000;

struct StoreActor {
    registry: Registry,
    market_subscribers: SubscriberSet<Market>,
    bet_subscribers: SubscriberSet<Bet>,
    sink: Arc<dyn PayoutSink>,
    events: Option<EventPublisher>,
    /// Route back into this actor for payout tasks. Must stay weak: the actor
    /// stops when the last `MarketStore` handle is dropped.
    commands: mpsc::WeakSender<Command>,
}

impl StoreActor {
    fn handle(&mut self, cmd: Command) {
        let now = Utc::now();
        let now_secs = now.timestamp();

        match cmd {
            Command::CreateMarket(id, new_market, reply) => {
                let id = id.unwrap_or_else(|| format!("market-{}", Uuid::new_v4().simple()));
                let res = self.registry.create_market(id, new_market, now_secs);
                let _ = reply.send(self.commit(res, true, false));
            }
            Command::UpdateMarket(id, patch, reply) => {
                let res = self.registry.update_market(&id, patch, now_secs);
                let _ = reply.send(self.commit(res, true, false));
            }
            Command::GetMarket(id, reply) => {
                let _ = reply.send(self.registry.get_market(&id));
            }
            Command::QueryMarkets(query, reply) => {
                let _ = reply.send(self.registry.query_markets(&query));
            }
            Command::SubscribeMarkets(live, query, reply) => {
                let snapshot = self.registry.query_markets(&query);
                let subscription = if live {
                    self.market_subscribers.register(query, None, snapshot)
                } else {
                    Subscription::once(snapshot)
                };
                let _ = reply.send(subscription);
            }
            Command::PlaceBet(new_bet, reply) => {
                let res = self
                    .registry
                    .place_bet(new_bet, now_secs, now.timestamp_millis());
                let _ = reply.send(self.commit(res, true, true));
            }
            Command::GetBet(id, reply) => {
                let _ = reply.send(self.registry.get_bet(&id));
            }
            Command::QueryBets(scope, query, reply) => {
                let _ = reply.send(self.registry.query_bets(scope.as_deref(), &query));
            }
            Command::SubscribeBets(scope, query, reply) => {
                let snapshot = self.registry.query_bets(scope.as_deref(), &query);
                let _ = reply.send(self.bet_subscribers.register(query, scope, snapshot));
            }
            Command::SettleMarket(id, reply) => {
                match self.registry.begin_settlement(&id, now_secs) {
                    Ok(batch) => self.spawn_payouts(batch, reply),
                    Err(e) => {
                        warn!("Settlement of {} rejected: {}", id, e);
                        let _ = reply.send(Err(e));
                    }
                }
            }
            Command::FinishSettlement(id, credited, dust, reply) => {
                let res = self
                    .registry
                    .finish_settlement(&id, credited, dust)
                    .map(|(report, events)| {
                        if !events.is_empty() {
                            self.notify(false, true);
                        }
                        self.publish(events);
                        report
                    });
                let _ = reply.send(res);
            }
        }
    }

    /// Credits the batch on its own task and reports back with `FinishSettlement`.
    fn spawn_payouts(
        &self,
        batch: SettlementBatch,
        reply: oneshot::Sender<crate::error::StoreResult<SettlementReport>>,
    ) {
        let SettlementBatch {
            market_id,
            pending,
            dust,
        } = batch;
        let sink = self.sink.clone();
        let commands = self.commands.clone();

        tokio::spawn(async move {
            let credited = credit_all(sink.as_ref(), pending).await;
            let Some(commands) = commands.upgrade() else {
                warn!("Store stopped before settlement of {} was recorded", market_id);
                return;
            };
            let finish = Command::FinishSettlement(market_id, credited, dust, reply);
            if commands.send(finish).await.is_err() {
                warn!("Store stopped before a settlement was recorded");
            }
        });
    }

    fn publish(&self, events: Vec<StoreEvent>) {
        if let Some(publisher) = &self.events {
            publisher.publish_all(events);
        }
    }

    /// Publishes the event of a successful mutation and wakes subscribers.
    fn commit<T>(
        &mut self,
        res: crate::error::StoreResult<(T, StoreEvent)>,
        markets_changed: bool,
        bets_changed: bool,
    ) -> crate::error::StoreResult<T> {
        match res {
            Ok((value, event)) => {
                self.notify(markets_changed, bets_changed);
                self.publish(vec![event]);
                Ok(value)
            }
            Err(e) => {
                warn!("Store mutation rejected: {}", e);
                Err(e)
            }
        }
    }

    fn notify(&mut self, markets_changed: bool, bets_changed: bool) {
        let registry = &self.registry;
        if markets_changed {
            self.market_subscribers
                .notify(|query, _| registry.query_markets(query));
        }
        if bets_changed {
            self.bet_subscribers
                .notify(|query, scope| registry.query_bets(scope, query));
        }
    }
}

pub fn spawn_market_actor(buffer: usize) -> MarketStore {
    spawn_market_actor_with_sink(buffer, Arc::new(InMemoryLedger::new()))
}

/// Starts the store task; every command is applied to completion before the next.
pub fn spawn_market_actor_with_sink(buffer: usize, sink: Arc<dyn PayoutSink>) -> MarketStore {
    let (tx, mut rx) = mpsc::channel::<Command>(buffer.max(1));
    let commands = tx.downgrade();

    tokio::spawn(async move {
        let mut actor = StoreActor {
            registry: Registry::new(),
            market_subscribers: SubscriberSet::default(),
            bet_subscribers: SubscriberSet::default(),
            sink,
            events: EventPublisher::spawn_redis(),
            commands,
        };

        while let Some(cmd) = rx.recv().await {
            actor.handle(cmd);
        }
        info!("Market store actor stopped");
    });

    MarketStore::new(tx)
}
