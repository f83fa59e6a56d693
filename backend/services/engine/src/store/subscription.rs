use futures_util::stream::{self, Stream};
use tokio::sync::watch;

use crate::store::query::Query;

/// Stream of result snapshots: the initial result first, then the latest
/// snapshot each time the matching set changes (live mode only). A reader
/// that falls behind skips intermediate snapshots.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: Option<watch::Receiver<Vec<T>>>,
    initial_pending: bool,
}

impl<T: Clone> Subscription<T> {
    /// Yields `snapshot` once, then ends.
    pub(crate) fn once(snapshot: Vec<T>) -> Self {
        let (_, rx) = watch::channel(snapshot);
        Self {
            rx: Some(rx),
            initial_pending: true,
        }
    }

    /// Ends without yielding anything.
    pub(crate) fn disabled() -> Self {
        Self {
            rx: None,
            initial_pending: false,
        }
    }

    pub async fn recv(&mut self) -> Option<Vec<T>> {
        let rx = self.rx.as_mut()?;
        if self.initial_pending {
            self.initial_pending = false;
            return Some(rx.borrow_and_update().clone());
        }
        match rx.changed().await {
            Ok(()) => Some(rx.borrow_and_update().clone()),
            Err(_) => {
                self.rx = None;
                None
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<Vec<T>> {
        let rx = self.rx.as_mut()?;
        if self.initial_pending {
            self.initial_pending = false;
            return Some(rx.borrow_and_update().clone());
        }
        match rx.has_changed() {
            Ok(true) => Some(rx.borrow_and_update().clone()),
            _ => None,
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Vec<T>>
    where
        T: Send + Sync + 'static,
    {
        stream::unfold(self, |mut sub| async move {
            let snapshot = sub.recv().await?;
            Some((snapshot, sub))
        })
    }
}

struct Subscriber<T> {
    query: Query,
    scope: Option<String>,
    tx: watch::Sender<Vec<T>>,
}

/// Live subscribers for one record type, kept by the store actor.
pub(crate) struct SubscriberSet<T> {
    subscribers: Vec<Subscriber<T>>,
}

impl<T> Default for SubscriberSet<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T: Clone + PartialEq> SubscriberSet<T> {
    pub fn register(
        &mut self,
        query: Query,
        scope: Option<String>,
        snapshot: Vec<T>,
    ) -> Subscription<T> {
        let (tx, rx) = watch::channel(snapshot);
        self.subscribers.push(Subscriber { query, scope, tx });
        Subscription {
            rx: Some(rx),
            initial_pending: true,
        }
    }

    /// Re-evaluates every subscriber and replaces snapshots that changed.
    /// Subscribers whose receiver was dropped are removed.
    pub fn notify<F>(&mut self, mut snapshot_for: F)
    where
        F: FnMut(&Query, Option<&str>) -> Vec<T>,
    {
        self.subscribers.retain(|sub| {
            if sub.tx.is_closed() {
                return false;
            }
            let snapshot = snapshot_for(&sub.query, sub.scope.as_deref());
            sub.tx.send_if_modified(|current| {
                if *current == snapshot {
                    return false;
                }
                *current = snapshot;
                true
            });
            true
        });
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }
}
