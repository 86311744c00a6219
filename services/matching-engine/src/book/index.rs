//! Ordered price-time index over order trackers.
//!
//! A `BTreeMap` keyed by a precomputed sort key gives logarithmic
//! insert/remove and deterministic forward iteration in priority order.
//! The order id participates in every key, so two distinct orders never
//! compare equal and duplicate keys are impossible.

use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use types::order::{OrderTracker, OrderType};

/// How an index builds sort keys from trackers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Matching priority: market orders first (earliest timestamp wins
    /// between two markets), then limit orders by price in the given
    /// direction, ties broken by earlier timestamp.
    Matching { descending: bool },
    /// Stop priority: price only, in the given direction, ties by
    /// timestamp. The order type is ignored because every parked stop is
    /// equally pending.
    Stop { descending: bool },
}

impl Priority {
    fn key(self, tracker: &OrderTracker) -> IndexKey {
        let (rank, price) = match self {
            Priority::Matching { descending } => {
                let rank = match tracker.order_type {
                    OrderType::Market => 0,
                    OrderType::Limit => 1,
                };
                (rank, directed(tracker.price, descending))
            }
            Priority::Stop { descending } => (0, directed(tracker.price, descending)),
        };
        IndexKey {
            rank,
            price,
            timestamp_ns: tracker.timestamp_ns,
            order_id: tracker.order_id.as_u64(),
        }
    }
}

/// Descending order is encoded by negating the projected price, which
/// keeps a single key type for every index flavor.
fn directed(price: f64, descending: bool) -> OrderedFloat<f64> {
    if descending {
        OrderedFloat(-price)
    } else {
        OrderedFloat(price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct IndexKey {
    rank: u8,
    price: OrderedFloat<f64>,
    timestamp_ns: i64,
    order_id: u64,
}

/// One side of a book: trackers sorted under the index's priority.
#[derive(Debug)]
pub struct OrderIndex {
    priority: Priority,
    entries: BTreeMap<IndexKey, OrderTracker>,
}

impl OrderIndex {
    pub fn new(priority: Priority) -> Self {
        Self {
            priority,
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, tracker: OrderTracker) {
        self.entries.insert(self.priority.key(&tracker), tracker);
    }

    /// Returns true when the tracker was present.
    pub fn remove(&mut self, tracker: &OrderTracker) -> bool {
        self.entries.remove(&self.priority.key(tracker)).is_some()
    }

    /// Walk trackers in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderTracker> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
