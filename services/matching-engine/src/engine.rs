//! Order book: admission, matching, stop activation and order lifecycle.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, error, trace, warn};
use types::errors::{OrderBookError, StateError, ValidationError};
use types::ids::OrderId;
use types::numeric::Price;
use types::order::{Order, OrderParams, OrderTracker, OrderType, Side};
use types::time::current_time_nanos;
use types::trade::Trade;

use crate::book::OrderContainer;
use crate::callbacks::{OrderCallback, TradeCallback};
use crate::matching::{execution_price, Crossing};
use crate::repository::OrderRepository;
use crate::trade_book::TradeBook;

/// Quantities at or below this value are rejected at admission.
pub const MIN_QTY: i64 = 1;

/// Order state protected as a unit: the stored orders, the live book and
/// the parked stop book. Trackers and stored orders are keyed by the
/// same ids and mutate together.
struct BookState {
    active_orders: HashMap<OrderId, Order>,
    orders: OrderContainer,
    stop_orders: OrderContainer,
}

/// All active orders for one instrument. Handles matching, stop
/// activation and storage of orders and the trades they produce.
///
/// Writers are serialized per book; snapshot readers (`bids`, `asks`,
/// `market_price`, the stop views) run concurrently with them.
pub struct OrderBook {
    instrument: String,

    market_price: RwLock<Price>,

    trade_book: Arc<TradeBook>,
    order_repo: Arc<dyn OrderRepository>,

    state: RwLock<BookState>,
    /// Serializes the admission -> match -> activation pipeline.
    match_lock: Mutex<()>,

    on_order: RwLock<Option<OrderCallback>>,
    on_trade: RwLock<Option<TradeCallback>>,
}

impl OrderBook {
    /// Create a new order book seeded with an initial market price.
    pub fn new(
        instrument: impl Into<String>,
        market_price: Price,
        trade_book: Arc<TradeBook>,
        order_repo: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            market_price: RwLock::new(market_price),
            trade_book,
            order_repo,
            state: RwLock::new(BookState {
                active_orders: HashMap::new(),
                orders: OrderContainer::matching(),
                stop_orders: OrderContainer::stops(),
            }),
            match_lock: Mutex::new(()),
            on_order: RwLock::new(None),
            on_trade: RwLock::new(None),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Price of the most recent trade, or the initial seed before any
    /// trade has occurred.
    pub fn market_price(&self) -> Price {
        *self.market_price.read().expect("market price lock poisoned")
    }

    /// Publish a new market price and activate any stop orders it
    /// triggers. Activations can themselves move the price and trigger
    /// further stops; the chain drains iteratively.
    pub fn set_market_price(&self, price: Price) {
        let _serial = self.match_lock.lock().expect("match lock poisoned");
        let mut activations = VecDeque::new();
        self.publish_market_price(price, &mut activations);
        self.drain_activations(&mut activations);
    }

    /// Register an observer for committed order mutations.
    pub fn set_on_order<F>(&self, callback: F)
    where
        F: Fn(&Order) + Send + Sync + 'static,
    {
        *self.on_order.write().expect("callback lock poisoned") = Some(Box::new(callback));
    }

    /// Register an observer for recorded trades.
    pub fn set_on_trade<F>(&self, callback: F)
    where
        F: Fn(&Trade) + Send + Sync + 'static,
    {
        *self.on_trade.write().expect("callback lock poisoned") = Some(Box::new(callback));
    }

    /// Add a new order. Depending on its type and parameters it is
    /// matched immediately, parked as a pending stop, rested in the
    /// book, or cancelled after a partial fill.
    ///
    /// Returns true when at least one unit traded on admission.
    pub fn add(&self, order: Order) -> Result<bool, OrderBookError> {
        if order.qty <= MIN_QTY {
            return Err(ValidationError::InvalidQty.into());
        }
        if order.order_type == OrderType::Market && !order.price.is_zero() {
            return Err(ValidationError::InvalidMarketPrice.into());
        }
        if order.order_type == OrderType::Limit && order.price.is_zero() {
            return Err(ValidationError::InvalidLimitPrice.into());
        }
        if order.params.contains(OrderParams::STOP) && order.stop_price.is_zero() {
            return Err(ValidationError::InvalidStopPrice.into());
        }

        let _serial = self.match_lock.lock().expect("match lock poisoned");

        if order.params.contains(OrderParams::STOP) && !self.stop_triggered(&order) {
            trace!(instrument = %self.instrument, order_id = %order.id, "parking stop order");
            self.park_stop_order(order)?;
            return Ok(false);
        }

        let mut activations = VecDeque::new();
        let matched = self.submit(order, &mut activations)?;
        self.drain_activations(&mut activations);
        Ok(matched)
    }

    /// Mark an order cancelled. Unknown ids are a no-op. The tracker is
    /// left in place; the matching loop evicts cancelled orders lazily,
    /// so snapshots may keep showing the order until then.
    pub fn cancel(&self, id: OrderId) -> Result<(), OrderBookError> {
        let stored = {
            let state = self.state.read().expect("book state lock poisoned");
            state.active_orders.get(&id).cloned()
        };
        let Some(mut order) = stored else {
            return Ok(());
        };
        order.cancel();
        self.update_active_order(order)
    }

    /// All bids, ordered the same way they are matched.
    pub fn bids(&self) -> Vec<Order> {
        self.snapshot(Side::Buy, false)
    }

    /// All asks, ordered the same way they are matched.
    pub fn asks(&self) -> Vec<Order> {
        self.snapshot(Side::Sell, false)
    }

    /// Pending stop bids in activation scan order.
    pub fn stop_bids(&self) -> Vec<Order> {
        self.snapshot(Side::Buy, true)
    }

    /// Pending stop asks in activation scan order.
    pub fn stop_asks(&self) -> Vec<Order> {
        self.snapshot(Side::Sell, true)
    }

    fn snapshot(&self, side: Side, stops: bool) -> Vec<Order> {
        let state = self.state.read().expect("book state lock poisoned");
        let container = if stops { &state.stop_orders } else { &state.orders };
        container
            .iter(side)
            .map(|tracker| {
                state
                    .active_orders
                    .get(&tracker.order_id)
                    .cloned()
                    .unwrap_or_else(|| {
                        panic!("tracker exists but active order {} does not", tracker.order_id)
                    })
            })
            .collect()
    }

    /// True when the market has already crossed the order's stop price,
    /// i.e. the order must match immediately instead of parking.
    fn stop_triggered(&self, order: &Order) -> bool {
        let market_price = self.market_price();
        match order.side {
            // a buy stop waits for the market to rise to its trigger
            Side::Buy => market_price >= order.stop_price,
            // a sell stop waits for the market to fall to its trigger
            Side::Sell => market_price <= order.stop_price,
        }
    }

    /// Park a stop order: its tracker is priced at the stop price, not
    /// the limit price, because activation scans compare against the
    /// market price.
    fn park_stop_order(&self, order: Order) -> Result<(), OrderBookError> {
        let tracker = tracker_at(&order, order.stop_price)?;
        {
            let mut state = self.state.write().expect("book state lock poisoned");
            if state.active_orders.contains_key(&order.id) {
                return Err(StateError::DuplicateOrder(order.id).into());
            }
            state.stop_orders.add(tracker);
            state.active_orders.insert(order.id, order.clone());
        }
        self.persist(&order)
    }

    /// Match the order and dispose of the remainder: IOC remainders are
    /// cancelled and kept out of the book, anything else unfilled rests.
    fn submit(
        &self,
        mut order: Order,
        activations: &mut VecDeque<Order>,
    ) -> Result<bool, OrderBookError> {
        let matched = self.match_order(&mut order, activations)?;

        if order.params.contains(OrderParams::IOC) && !order.is_filled() {
            // cancel the rest; the order is stored but never rests
            order.cancel();
            self.persist(&order)?;
            return Ok(matched);
        }

        if order.is_filled() {
            self.persist(&order)?;
        } else {
            self.add_to_books(order)?;
        }
        Ok(matched)
    }

    /// Walk the opposite side in priority order, trading against each
    /// crossable candidate until the order fills or prices stop
    /// crossing. Cancelled and fully filled candidates are removed after
    /// the walk.
    fn match_order(
        &self,
        order: &mut Order,
        activations: &mut VecDeque<Order>,
    ) -> Result<bool, OrderBookError> {
        let opposite: Vec<OrderTracker> = {
            let state = self.state.read().expect("book state lock poisoned");
            state.orders.iter(order.side.opposite()).copied().collect()
        };

        let mut remove_ids: Vec<OrderId> = Vec::new();
        let incoming_aon = order.params.contains(OrderParams::AON);

        let walk = (|| -> Result<bool, OrderBookError> {
            let mut matched = false;
            for tracker in opposite {
                let mut resting = self.active_order(tracker.order_id).unwrap_or_else(|| {
                    panic!("tracker exists but active order {} does not", tracker.order_id)
                });

                if resting.is_cancelled() {
                    // evict lazily, never match
                    remove_ids.push(resting.id);
                    continue;
                }

                let qty = order.unfilled_qty().min(resting.unfilled_qty());
                // all-or-nothing on either side vetoes partial fills
                if incoming_aon && qty != order.unfilled_qty() {
                    continue;
                }
                if resting.params.contains(OrderParams::AON) && qty != resting.unfilled_qty() {
                    continue;
                }

                let price = match execution_price(order, &resting) {
                    Crossing::Execute(price) => price,
                    Crossing::Skip => continue,
                    Crossing::Exhausted => return Ok(matched),
                };

                order.filled_qty += qty;
                resting.filled_qty += qty;

                let (buyer, seller, bid_order_id, ask_order_id) = if order.is_bid() {
                    (order.customer_id, resting.customer_id, order.id, resting.id)
                } else {
                    (resting.customer_id, order.customer_id, resting.id, order.id)
                };
                let trade = self.trade_book.enter(Trade::new(
                    buyer,
                    seller,
                    self.instrument.clone(),
                    qty,
                    price,
                    current_time_nanos(),
                    bid_order_id,
                    ask_order_id,
                ));
                self.notify_trade(&trade);
                self.publish_market_price(price, activations);
                matched = true;

                if resting.is_filled() {
                    // record the final fill before eviction so removal
                    // persists the completed state
                    self.stash_active_order(resting.clone());
                    remove_ids.push(resting.id);
                } else {
                    self.update_active_order(resting)?;
                }

                if order.is_filled() {
                    return Ok(true);
                }
            }
            Ok(matched)
        })();

        for id in remove_ids {
            self.remove_from_books(id);
        }
        walk
    }

    /// Collect stop orders triggered by the price move into the
    /// activation queue and drop their parked state. Cancelled stops are
    /// discarded here instead of being resubmitted.
    fn publish_market_price(&self, price: Price, activations: &mut VecDeque<Order>) {
        *self.market_price.write().expect("market price lock poisoned") = price;

        let Some(limit) = price.to_f64() else {
            warn!(instrument = %self.instrument, %price, "market price has no float projection; skipping stop scan");
            return;
        };

        let mut state = self.state.write().expect("book state lock poisoned");
        let mut triggered = state.stop_orders.bids_at_or_below(limit);
        triggered.extend(state.stop_orders.asks_at_or_above(limit));
        for tracker in triggered {
            state.stop_orders.remove(tracker.order_id);
            match state.active_orders.remove(&tracker.order_id) {
                Some(stop_order) if stop_order.is_cancelled() => {
                    debug!(order_id = %tracker.order_id, "dropping cancelled stop order at activation");
                }
                Some(stop_order) => activations.push_back(stop_order),
                None => panic!(
                    "stop tracker exists but stored order {} does not",
                    tracker.order_id
                ),
            }
        }
    }

    /// Resubmit activated stop orders through the ordinary matching
    /// path. Failures are logged and do not abort the drain; activation
    /// is best-effort.
    fn drain_activations(&self, activations: &mut VecDeque<Order>) {
        while let Some(stop_order) = activations.pop_front() {
            let id = stop_order.id;
            trace!(instrument = %self.instrument, order_id = %id, "activating stop order");
            if let Err(err) = self.submit(stop_order, activations) {
                error!(order_id = %id, %err, "stop order activation failed");
            }
        }
    }

    /// Make an order matchable: tracker into the live book, order into
    /// the stored map, then persist.
    fn add_to_books(&self, order: Order) -> Result<(), OrderBookError> {
        let tracker = tracker_at(&order, order.price)?;
        {
            let mut state = self.state.write().expect("book state lock poisoned");
            if state.active_orders.contains_key(&order.id) {
                return Err(StateError::DuplicateOrder(order.id).into());
            }
            state.orders.add(tracker);
            state.active_orders.insert(order.id, order.clone());
        }
        self.persist(&order)
    }

    fn active_order(&self, id: OrderId) -> Option<Order> {
        let state = self.state.read().expect("book state lock poisoned");
        state.active_orders.get(&id).cloned()
    }

    /// Overwrite a stored order without persisting; used just before
    /// eviction, which persists the final state itself.
    fn stash_active_order(&self, order: Order) {
        let mut state = self.state.write().expect("book state lock poisoned");
        state.active_orders.insert(order.id, order);
    }

    fn update_active_order(&self, order: Order) -> Result<(), OrderBookError> {
        {
            let mut state = self.state.write().expect("book state lock poisoned");
            if !state.active_orders.contains_key(&order.id) {
                return Err(StateError::UnknownOrder(order.id).into());
            }
            state.active_orders.insert(order.id, order.clone());
        }
        self.persist(&order)
    }

    /// Remove an order from possible matches. The latest stored state is
    /// persisted first; a save failure here is logged rather than
    /// propagated so eviction always completes.
    fn remove_from_books(&self, id: OrderId) {
        let Some(order) = self.active_order(id) else {
            return;
        };
        if self.order_repo.save(&order).is_err() {
            warn!(order_id = %id, "cannot save order to the repository - repository data might be inconsistent");
        }
        self.notify_order(&order);

        let mut state = self.state.write().expect("book state lock poisoned");
        state.orders.remove(id);
        state.active_orders.remove(&id);
    }

    /// State first, then persist: save the order and notify observers.
    fn persist(&self, order: &Order) -> Result<(), OrderBookError> {
        self.order_repo.save(order)?;
        self.notify_order(order);
        Ok(())
    }

    fn notify_order(&self, order: &Order) {
        if let Some(callback) = self.on_order.read().expect("callback lock poisoned").as_ref() {
            callback(order);
        }
    }

    fn notify_trade(&self, trade: &Trade) {
        if let Some(callback) = self.on_trade.read().expect("callback lock poisoned").as_ref() {
            callback(trade);
        }
    }
}

/// Build the index record for an order at the given key price (the limit
/// price for live orders, the stop price for parked stops).
fn tracker_at(order: &Order, price: Price) -> Result<OrderTracker, OrderBookError> {
    let projected = price
        .to_f64()
        .ok_or_else(|| ValidationError::UnrepresentablePrice(price.to_string()))?;
    Ok(OrderTracker {
        order_id: order.id,
        order_type: order.order_type,
        side: order.side,
        price: projected,
        timestamp_ns: order.timestamp_ns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::NoopOrderRepository;
    use types::ids::CustomerId;

    fn setup() -> (Arc<TradeBook>, OrderBook) {
        let trade_book = Arc::new(TradeBook::new("TEST"));
        let book = OrderBook::new(
            "TEST",
            "20.25".parse().unwrap(),
            Arc::clone(&trade_book),
            Arc::new(NoopOrderRepository),
        );
        (trade_book, book)
    }

    fn order(
        id: u64,
        order_type: OrderType,
        params: OrderParams,
        qty: i64,
        price: &str,
        stop_price: &str,
        side: Side,
    ) -> Order {
        Order::new(
            OrderId::new(id),
            "TEST",
            CustomerId::nil(),
            order_type,
            params,
            qty,
            price.parse().unwrap(),
            stop_price.parse().unwrap(),
            side,
            current_time_nanos(),
        )
    }

    #[test]
    fn add_rejects_qty_at_or_below_minimum() {
        let (_, book) = setup();
        for qty in [-3, 0, 1] {
            let err = book
                .add(order(1, OrderType::Limit, OrderParams::NONE, qty, "20.10", "0", Side::Buy))
                .unwrap_err();
            assert_eq!(err, ValidationError::InvalidQty.into());
        }
    }

    #[test]
    fn add_rejects_priced_market_order() {
        let (_, book) = setup();
        let err = book
            .add(order(1, OrderType::Market, OrderParams::NONE, 5, "20.10", "0", Side::Buy))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidMarketPrice.into());
    }

    #[test]
    fn add_rejects_unpriced_limit_order() {
        let (_, book) = setup();
        let err = book
            .add(order(1, OrderType::Limit, OrderParams::NONE, 5, "0", "0", Side::Buy))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidLimitPrice.into());
    }

    #[test]
    fn add_rejects_stop_without_stop_price() {
        let (_, book) = setup();
        let err = book
            .add(order(1, OrderType::Limit, OrderParams::STOP, 5, "20.10", "0", Side::Buy))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidStopPrice.into());
    }

    #[test]
    fn duplicate_id_rejected_when_resting() {
        let (_, book) = setup();
        book.add(order(1, OrderType::Limit, OrderParams::NONE, 5, "20.10", "0", Side::Buy))
            .unwrap();
        let err = book
            .add(order(1, OrderType::Limit, OrderParams::NONE, 5, "20.11", "0", Side::Buy))
            .unwrap_err();
        assert_eq!(err, StateError::DuplicateOrder(OrderId::new(1)).into());
    }

    #[test]
    fn buy_stop_parks_below_trigger_and_activates_at_it() {
        let (_, book) = setup();
        // market 20.25 < stop 20.50: parked
        let matched = book
            .add(order(1, OrderType::Limit, OrderParams::STOP, 5, "20.60", "20.50", Side::Buy))
            .unwrap();
        assert!(!matched);
        assert_eq!(book.stop_bids().len(), 1);
        assert!(book.bids().is_empty());

        // price reaches the trigger: the stop converts to a live bid
        book.set_market_price("20.50".parse().unwrap());
        assert!(book.stop_bids().is_empty());
        assert_eq!(book.bids().len(), 1);
    }

    #[test]
    fn sell_stop_parks_above_trigger() {
        let (_, book) = setup();
        // market 20.25 > stop 20.00: parked
        let matched = book
            .add(order(1, OrderType::Limit, OrderParams::STOP, 5, "19.90", "20.00", Side::Sell))
            .unwrap();
        assert!(!matched);
        assert_eq!(book.stop_asks().len(), 1);

        // a fall through the trigger activates it
        book.set_market_price("19.95".parse().unwrap());
        assert!(book.stop_asks().is_empty());
        assert_eq!(book.asks().len(), 1);
    }

    #[test]
    fn stop_with_crossed_trigger_matches_immediately() {
        let (trade_book, book) = setup();
        book.add(order(1, OrderType::Limit, OrderParams::NONE, 5, "20.10", "0", Side::Sell))
            .unwrap();
        // market 20.25 >= stop 20.20: goes straight to matching
        let matched = book
            .add(order(2, OrderType::Limit, OrderParams::STOP, 5, "20.15", "20.20", Side::Buy))
            .unwrap();
        assert!(matched);
        assert_eq!(trade_book.len(), 1);
        assert!(book.stop_bids().is_empty());
    }

    #[test]
    fn cancelled_stop_is_dropped_at_activation() {
        let (_, book) = setup();
        book.add(order(1, OrderType::Limit, OrderParams::STOP, 5, "20.60", "20.50", Side::Buy))
            .unwrap();
        book.cancel(OrderId::new(1)).unwrap();

        book.set_market_price("20.55".parse().unwrap());
        assert!(book.stop_bids().is_empty());
        assert!(book.bids().is_empty());
    }

    #[test]
    fn market_price_tracks_last_trade() {
        let (_, book) = setup();
        assert_eq!(book.market_price(), "20.25".parse().unwrap());

        book.add(order(1, OrderType::Limit, OrderParams::NONE, 2, "20.10", "0", Side::Sell))
            .unwrap();
        book.add(order(2, OrderType::Limit, OrderParams::NONE, 5, "20.12", "0", Side::Buy))
            .unwrap();
        assert_eq!(book.market_price(), "20.12".parse().unwrap());
    }

    #[test]
    fn callbacks_observe_orders_and_trades() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (_, book) = setup();
        let order_events = Arc::new(AtomicUsize::new(0));
        let trade_events = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&order_events);
        book.set_on_order(move |_order| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&trade_events);
        book.set_on_trade(move |_trade| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        book.add(order(1, OrderType::Limit, OrderParams::NONE, 5, "20.10", "0", Side::Sell))
            .unwrap();
        book.add(order(2, OrderType::Limit, OrderParams::NONE, 5, "20.12", "0", Side::Buy))
            .unwrap();

        // rest of the ask, fill update + eviction of the ask, terminal
        // record of the bid
        assert!(order_events.load(Ordering::SeqCst) >= 3);
        assert_eq!(trade_events.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_repository_surfaces_persistence_error() {
        use types::errors::RepositoryError;

        struct FailingRepository;

        impl OrderRepository for FailingRepository {
            fn save(&self, _order: &Order) -> Result<(), RepositoryError> {
                Err(RepositoryError::Backend("disk full".into()))
            }

            fn get_by_id(&self, _id: OrderId) -> Result<Option<Order>, RepositoryError> {
                Ok(None)
            }
        }

        let trade_book = Arc::new(TradeBook::new("TEST"));
        let book = OrderBook::new(
            "TEST",
            "20.25".parse().unwrap(),
            trade_book,
            Arc::new(FailingRepository),
        );

        let err = book
            .add(order(1, OrderType::Limit, OrderParams::NONE, 5, "20.10", "0", Side::Buy))
            .unwrap_err();
        assert!(matches!(err, OrderBookError::Persistence(_)));
    }
}
