//! Publish/subscribe feed of order-table mutations.
//!
//! ```text
//! OrderService ──publish()──► ChangeFeed
//!                               ├── mpsc ──► Subscription (student: updates, student_id = X)
//!                               ├── mpsc ──► Subscription (vendor: inserts, all rows)
//!                               └── ...
//! ```
//!
//! The order actor publishes from inside its serial loop, so every subscriber
//! sees events in commit order. Each registration has its own unbounded
//! queue: a slow subscriber never blocks the actor and never loses events.
//! Events are wake-up signals; handlers re-fetch authoritative state.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::domain::{CanteenId, Order, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One committed mutation of an order row.
#[derive(Debug, Clone)]
pub struct OrderChange {
    /// Position in the feed's commit sequence, starting at 1.
    pub seq: u64,
    pub kind: ChangeKind,
    /// Row before the change; `None` for inserts.
    pub old: Option<Order>,
    /// Row after the change; `None` for deletes.
    pub new: Option<Order>,
    pub committed_at: DateTime<Utc>,
}

impl OrderChange {
    pub fn insert(order: Order) -> Self {
        Self::build(ChangeKind::Insert, None, Some(order))
    }

    pub fn update(old: Order, new: Order) -> Self {
        Self::build(ChangeKind::Update, Some(old), Some(new))
    }

    pub fn delete(order: Order) -> Self {
        Self::build(ChangeKind::Delete, Some(order), None)
    }

    fn build(kind: ChangeKind, old: Option<Order>, new: Option<Order>) -> Self {
        Self {
            seq: 0,
            kind,
            old,
            new,
            committed_at: Utc::now(),
        }
    }

    /// The row the change is about: the new snapshot, or the old one for deletes.
    pub fn row(&self) -> Option<&Order> {
        self.new.as_ref().or(self.old.as_ref())
    }
}

/// Which mutation kinds a subscription wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    Any,
    Only(ChangeKind),
}

impl EventFilter {
    fn accepts(&self, kind: ChangeKind) -> bool {
        match self {
            EventFilter::Any => true,
            EventFilter::Only(wanted) => *wanted == kind,
        }
    }
}

/// Row predicate of a subscription, evaluated against the changed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowPredicate {
    All,
    StudentIs(UserId),
    CanteenIs(CanteenId),
}

impl RowPredicate {
    fn accepts(&self, order: &Order) -> bool {
        match self {
            RowPredicate::All => true,
            RowPredicate::StudentIs(student_id) => order.student_id == *student_id,
            RowPredicate::CanteenIs(canteen_id) => order.canteen_id == *canteen_id,
        }
    }
}

/// Subscription key: event kinds plus row predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub events: EventFilter,
    pub rows: RowPredicate,
}

impl ChannelSpec {
    /// Updates to one student's orders.
    pub fn student_updates(student_id: impl Into<UserId>) -> Self {
        Self {
            events: EventFilter::Only(ChangeKind::Update),
            rows: RowPredicate::StudentIs(student_id.into()),
        }
    }

    /// Every new order, unfiltered. Vendors scope the result by re-fetching.
    pub fn new_orders() -> Self {
        Self {
            events: EventFilter::Only(ChangeKind::Insert),
            rows: RowPredicate::All,
        }
    }

    pub fn matches(&self, change: &OrderChange) -> bool {
        self.events.accepts(change.kind) && change.row().is_some_and(|order| self.rows.accepts(order))
    }
}

struct Registration {
    name: String,
    spec: ChannelSpec,
    tx: mpsc::UnboundedSender<Arc<OrderChange>>,
}

struct FeedInner {
    next_id: AtomicU64,
    seq: AtomicU64,
    closed: AtomicBool,
    registrations: DashMap<u64, Registration>,
}

/// Cloneable handle to the order change feed.
#[derive(Clone)]
pub struct ChangeFeed {
    inner: Arc<FeedInner>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(FeedInner {
                next_id: AtomicU64::new(1),
                seq: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                registrations: DashMap::new(),
            }),
        }
    }

    /// Registers a subscriber. The registration lives until the returned
    /// handle is unsubscribed or dropped.
    pub fn subscribe(&self, name: impl Into<String>, spec: ChannelSpec) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let name = name.into();
        let (tx, rx) = mpsc::unbounded_channel();
        if self.inner.closed.load(Ordering::SeqCst) {
            // Dropping `tx` right away ends the stream on first recv.
            debug!(channel = %name, "Subscribe on closed feed");
        } else {
            debug!(channel = %name, subscription_id = id, ?spec, "Subscribed");
            self.inner.registrations.insert(id, Registration { name: name.clone(), spec, tx });
        }
        Subscription {
            id,
            name,
            rx,
            feed: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers `change` to every matching subscriber. Returns the number of
    /// subscribers it was queued for.
    pub fn publish(&self, mut change: OrderChange) -> usize {
        if self.inner.closed.load(Ordering::SeqCst) {
            return 0;
        }
        change.seq = self.inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let change = Arc::new(change);

        let mut delivered = 0;
        let mut gone = Vec::new();
        for entry in self.inner.registrations.iter() {
            let registration = entry.value();
            if !registration.spec.matches(&change) {
                continue;
            }
            if registration.tx.send(Arc::clone(&change)).is_ok() {
                delivered += 1;
            } else {
                gone.push(*entry.key());
            }
        }
        // Removing while iterating would deadlock the shard.
        for id in gone {
            self.inner.registrations.remove(&id);
        }

        debug!(seq = change.seq, kind = ?change.kind, delivered, "Published order change");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.registrations.len()
    }

    /// Names of live registrations, for diagnostics.
    pub fn channel_names(&self) -> Vec<String> {
        self.inner.registrations.iter().map(|entry| entry.value().name.clone()).collect()
    }

    /// Ends every open subscription stream and refuses further publishes.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let count = self.inner.registrations.len();
        self.inner.registrations.clear();
        info!(subscriptions = count, "Change feed closed");
    }
}

/// A live registration on the feed.
///
/// Dropping the handle releases the registration.
pub struct Subscription {
    id: u64,
    name: String,
    rx: mpsc::UnboundedReceiver<Arc<OrderChange>>,
    feed: Weak<FeedInner>,
}

impl Subscription {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for the next matching change. `None` once the feed is closed.
    pub async fn recv(&mut self) -> Option<Arc<OrderChange>> {
        self.rx.recv().await
    }

    /// Returns a change if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<OrderChange>> {
        self.rx.try_recv().ok()
    }

    /// Releases the registration explicitly.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.upgrade() {
            if feed.registrations.remove(&self.id).is_some() {
                debug!(channel = %self.name, subscription_id = self.id, "Unsubscribed");
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).field("name", &self.name).finish()
    }
}
