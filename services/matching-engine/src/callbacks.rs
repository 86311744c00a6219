//! Observer hooks for order and trade events.

use types::order::Order;
use types::trade::Trade;

/// Sink invoked synchronously after an order mutation is committed.
/// Must not call back into the book.
pub type OrderCallback = Box<dyn Fn(&Order) + Send + Sync>;

/// Sink invoked synchronously after a trade is recorded.
pub type TradeCallback = Box<dyn Fn(&Trade) + Send + Sync>;
