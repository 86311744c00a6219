//! Bid/ask tracker container with id lookup and stop-activation scans.

use std::collections::HashMap;
use tracing::warn;
use types::ids::OrderId;
use types::order::{OrderTracker, Side};

use super::index::{OrderIndex, Priority};

/// Bids and asks for one instrument plus an id map for O(1) retrieval.
///
/// The container stores trackers, not orders; the full orders live in
/// the book's active-order map keyed by the same ids.
#[derive(Debug)]
pub struct OrderContainer {
    bids: OrderIndex,
    asks: OrderIndex,
    trackers: HashMap<OrderId, OrderTracker>,
}

impl OrderContainer {
    /// Container for live orders: bids walk price-descending, asks
    /// price-ascending, market orders ahead of both.
    pub fn matching() -> Self {
        Self::with_priorities(
            Priority::Matching { descending: true },
            Priority::Matching { descending: false },
        )
    }

    /// Container for parked stop orders. Bids sort price-ascending and
    /// asks price-descending so the activation scans below can break out
    /// at the first tracker past the market price.
    pub fn stops() -> Self {
        Self::with_priorities(
            Priority::Stop { descending: false },
            Priority::Stop { descending: true },
        )
    }

    fn with_priorities(bid_priority: Priority, ask_priority: Priority) -> Self {
        Self {
            bids: OrderIndex::new(bid_priority),
            asks: OrderIndex::new(ask_priority),
            trackers: HashMap::new(),
        }
    }

    /// Insert a tracker. The id must not already be present.
    pub fn add(&mut self, tracker: OrderTracker) {
        match tracker.side {
            Side::Buy => self.bids.insert(tracker),
            Side::Sell => self.asks.insert(tracker),
        }
        self.trackers.insert(tracker.order_id, tracker);
    }

    /// Dual-delete from the side index and the id map. Unknown ids are a
    /// warned no-op.
    pub fn remove(&mut self, id: OrderId) {
        let Some(tracker) = self.trackers.remove(&id) else {
            warn!(order_id = %id, "cannot remove order: no tracker for id");
            return;
        };
        match tracker.side {
            Side::Buy => self.bids.remove(&tracker),
            Side::Sell => self.asks.remove(&tracker),
        };
    }

    pub fn get(&self, id: OrderId) -> Option<&OrderTracker> {
        self.trackers.get(&id)
    }

    /// Priority-sorted forward walk of one side.
    pub fn iter(&self, side: Side) -> impl Iterator<Item = &OrderTracker> {
        match side {
            Side::Buy => self.bids.iter(),
            Side::Sell => self.asks.iter(),
        }
    }

    pub fn len(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bids.len(),
            Side::Sell => self.asks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Stop bids whose stop price is at or below `limit`, re-sorted by
    /// timestamp because activation runs in time priority.
    ///
    /// Relies on the stop-bid index ascending in price: the scan ends at
    /// the first tracker above the limit.
    pub fn bids_at_or_below(&self, limit: f64) -> Vec<OrderTracker> {
        let mut trackers: Vec<OrderTracker> = self
            .bids
            .iter()
            .take_while(|tracker| tracker.price <= limit)
            .copied()
            .collect();
        trackers.sort_by_key(|tracker| tracker.timestamp_ns);
        trackers
    }

    /// Stop asks whose stop price is at or above `limit`, re-sorted by
    /// timestamp. Mirror of [`Self::bids_at_or_below`]: the stop-ask
    /// index descends in price, so the scan ends at the first tracker
    /// below the limit.
    pub fn asks_at_or_above(&self, limit: f64) -> Vec<OrderTracker> {
        let mut trackers: Vec<OrderTracker> = self
            .asks
            .iter()
            .take_while(|tracker| tracker.price >= limit)
            .copied()
            .collect();
        trackers.sort_by_key(|tracker| tracker.timestamp_ns);
        trackers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::order::OrderType;

    fn tracker(id: u64, side: Side, price: f64, timestamp_ns: i64) -> OrderTracker {
        OrderTracker {
            order_id: OrderId::new(id),
            order_type: OrderType::Limit,
            side,
            price,
            timestamp_ns,
        }
    }

    fn seeded() -> Vec<OrderTracker> {
        vec![
            tracker(1, Side::Buy, 20.25, 1),
            tracker(2, Side::Sell, 20.25, 2),
            tracker(3, Side::Buy, 20.50, 3),
            tracker(4, Side::Sell, 20.45, 4),
            tracker(5, Side::Buy, 20.10, 5),
            tracker(6, Side::Sell, 20.18, 6),
            tracker(7, Side::Buy, 20.25, 7),
            tracker(8, Side::Sell, 20.45, 8),
        ]
    }

    fn ids(trackers: &[OrderTracker]) -> Vec<u64> {
        trackers.iter().map(|t| t.order_id.as_u64()).collect()
    }

    #[test]
    fn matching_container_sorts_both_sides() {
        let mut container = OrderContainer::matching();
        for t in seeded() {
            container.add(t);
        }

        let bids: Vec<u64> = container.iter(Side::Buy).map(|t| t.order_id.as_u64()).collect();
        let asks: Vec<u64> = container.iter(Side::Sell).map(|t| t.order_id.as_u64()).collect();
        assert_eq!(bids, vec![3, 1, 7, 5]);
        assert_eq!(asks, vec![6, 2, 4, 8]);
        assert_eq!(container.len(Side::Buy), 4);
        assert_eq!(container.len(Side::Sell), 4);
    }

    #[test]
    fn remove_deletes_from_index_and_map() {
        let mut container = OrderContainer::matching();
        for t in seeded() {
            container.add(t);
        }

        container.remove(OrderId::new(3));
        assert!(container.get(OrderId::new(3)).is_none());
        assert_eq!(container.len(Side::Buy), 3);

        // unknown id is a no-op
        container.remove(OrderId::new(3));
        assert_eq!(container.len(Side::Buy), 3);
    }

    #[test]
    fn get_returns_tracker() {
        let mut container = OrderContainer::matching();
        for t in seeded() {
            container.add(t);
        }
        let found = container.get(OrderId::new(6)).unwrap();
        assert_eq!(found.price, 20.18);
        assert_eq!(found.side, Side::Sell);
    }

    #[test]
    fn stop_bids_at_or_below_is_time_sorted() {
        let mut container = OrderContainer::stops();
        for t in seeded() {
            container.add(t);
        }

        let triggered = container.bids_at_or_below(20.25);
        assert_eq!(ids(&triggered), vec![1, 5, 7]);
    }

    #[test]
    fn stop_asks_at_or_above_is_time_sorted() {
        let mut container = OrderContainer::stops();
        for t in seeded() {
            container.add(t);
        }

        let triggered = container.asks_at_or_above(20.25);
        assert_eq!(ids(&triggered), vec![2, 4, 8]);
    }

    #[test]
    fn stop_scans_exclude_past_limit() {
        let mut container = OrderContainer::stops();
        for t in seeded() {
            container.add(t);
        }

        assert!(container.bids_at_or_below(20.00).is_empty());
        assert!(container.asks_at_or_above(20.60).is_empty());
        assert_eq!(ids(&container.bids_at_or_below(20.10)), vec![5]);
        assert_eq!(ids(&container.asks_at_or_above(20.45)), vec![4, 8]);
    }
}
