use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use mirror_core::Event;
use mirror_logging::{mirror_debug, FANOUT_TARGET};
use tokio::sync::mpsc::{self, error::TrySendError};

pub type SubscriberId = u64;

/// One outstanding event per subscriber. Events are stateless triggers, so a
/// viewer that has not drained its inbox loses nothing by missing another.
pub const INBOX_CAPACITY: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Inbox still held an undrained event.
    pub dropped: usize,
    /// Receiver side already gone.
    pub closed: usize,
}

#[derive(Debug, Default)]
struct Members {
    next_id: AtomicU64,
    inboxes: RwLock<HashMap<SubscriberId, mpsc::Sender<Event>>>,
}

impl Members {
    fn remove(&self, id: SubscriberId) -> bool {
        let mut inboxes = self.inboxes.write().unwrap_or_else(PoisonError::into_inner);
        inboxes.remove(&id).is_some()
    }
}

/// Set of live viewer inboxes with lossy, non-blocking fan-out.
///
/// Membership changes take the write lock; broadcasts only read the set.
#[derive(Debug, Clone, Default)]
pub struct SubscriberRegistry {
    members: Arc<Members>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> Subscription {
        let id = self.members.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let count = {
            let mut inboxes = self
                .members
                .inboxes
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            inboxes.insert(id, tx);
            inboxes.len()
        };
        mirror_debug!(target: FANOUT_TARGET, "Subscriber {} registered ({} active)", id, count);
        Subscription {
            id,
            rx,
            members: Arc::downgrade(&self.members),
        }
    }

    /// Returns `false` if the subscriber was already gone.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.members.remove(id);
        if removed {
            mirror_debug!(target: FANOUT_TARGET, "Subscriber {} unregistered", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.members
            .inboxes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offers `event` to every inbox without waiting. Full inboxes skip this
    /// event; nothing is queued or retried.
    pub fn broadcast(&self, event: &Event) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let inboxes = self
            .members
            .inboxes
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for tx in inboxes.values() {
            match tx.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => report.dropped += 1,
                Err(TrySendError::Closed(_)) => report.closed += 1,
            }
        }
        drop(inboxes);

        mirror_debug!(
            target: FANOUT_TARGET,
            "Broadcast {}: delivered={} dropped={} closed={}",
            event,
            report.delivered,
            report.dropped,
            report.closed
        );
        report
    }
}

/// Receiving end of one registration. Dropping it unregisters the subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Event>,
    members: Weak<Members>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next event. `None` once unregistered or once the registry
    /// itself is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(members) = self.members.upgrade() {
            if members.remove(self.id) {
                mirror_debug!(target: FANOUT_TARGET, "Subscriber {} dropped", self.id);
            }
        }
    }
}
