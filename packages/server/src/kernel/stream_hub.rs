//! In-process change fan-out for real-time subscriptions.
//!
//! Every committed write publishes a [`ChangeEvent`] on the channel of the
//! collection it touched. [`Snapshots`] turns those events into a sequence of
//! full re-queried result sets, never deltas.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::debug;

use crate::common::{RecipeResult, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Submissions,
    Publications,
    ModerationActions,
    Favorites,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: Collection,
    /// Owner of the changed record, when it has one.
    pub owner_id: Option<UserId>,
}

impl ChangeEvent {
    pub fn new(collection: Collection, owner_id: Option<UserId>) -> Self {
        Self {
            collection,
            owner_id,
        }
    }

    /// Whether a watcher scoped to `owner` must refresh.
    fn concerns(&self, owner: Option<&UserId>) -> bool {
        match (owner, &self.owner_id) {
            (Some(watched), Some(changed)) => watched == changed,
            _ => true,
        }
    }
}

/// Broadcast hub with one channel per collection.
///
/// Thread-safe and cloneable. Dropping every clone closes all subscriptions.
#[derive(Clone)]
pub struct ChangeHub {
    channels: Arc<HashMap<Collection, broadcast::Sender<ChangeEvent>>>,
}

impl ChangeHub {
    /// 256 buffered events per collection.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let channels = [
            Collection::Submissions,
            Collection::Publications,
            Collection::ModerationActions,
            Collection::Favorites,
        ]
        .into_iter()
        .map(|c| (c, broadcast::channel(capacity).0))
        .collect();

        Self {
            channels: Arc::new(channels),
        }
    }

    /// No-op when nobody is watching.
    pub fn publish(&self, collection: Collection, owner_id: Option<UserId>) {
        if let Some(tx) = self.channels.get(&collection) {
            let _ = tx.send(ChangeEvent::new(collection, owner_id));
        }
    }

    pub fn subscribe(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent> {
        match self.channels.get(&collection) {
            Some(tx) => tx.subscribe(),
            // Every collection gets a channel in `with_capacity`.
            None => broadcast::channel(1).1,
        }
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, RecipeResult<Vec<T>>> + Send + Sync>;

/// A live query: yields the current result set, then a fresh one after every
/// relevant change.
pub struct Snapshots<T> {
    rx: broadcast::Receiver<ChangeEvent>,
    owner: Option<UserId>,
    loader: Loader<T>,
    primed: bool,
}

impl<T: Send + 'static> Snapshots<T> {
    /// Subscribes before the first load so no change between the two is lost.
    pub fn new<F>(hub: &ChangeHub, collection: Collection, owner: Option<UserId>, loader: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, RecipeResult<Vec<T>>> + Send + Sync + 'static,
    {
        Self {
            rx: hub.subscribe(collection),
            owner,
            loader: Arc::new(loader),
            primed: false,
        }
    }

    /// `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<RecipeResult<Vec<T>>> {
        if !self.primed {
            self.primed = true;
            return Some((self.loader)().await);
        }

        loop {
            match self.rx.recv().await {
                Ok(event) if event.concerns(self.owner.as_ref()) => break,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Snapshot subscriber lagged, re-querying");
                    break;
                }
                Err(RecvError::Closed) => return None,
            }
        }

        // Events already queued are covered by the snapshot about to be taken.
        loop {
            match self.rx.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        Some((self.loader)().await)
    }

    pub fn into_stream(self) -> impl Stream<Item = RecipeResult<Vec<T>>> + Send {
        futures::stream::unfold(self, |mut snapshots| async move {
            snapshots.next().await.map(|item| (item, snapshots))
        })
    }
}
