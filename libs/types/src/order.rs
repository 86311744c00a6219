//! Order model: sides, types, parameters and the tracker index record.

use crate::ids::{CustomerId, OrderId};
use crate::numeric::Price;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Basic order types: market executes at any counter-side price, limit
/// only at its own price or better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "Market"),
            OrderType::Limit => write!(f, "Limit"),
        }
    }
}

/// Order parameter bitset. Each bit changes the way an order is stored
/// and matched; parameters compose, e.g. `FOK == AON | IOC`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderParams(u64);

impl OrderParams {
    pub const NONE: OrderParams = OrderParams(0);
    /// Stop order; requires a stop price.
    pub const STOP: OrderParams = OrderParams(0x1);
    /// All-or-nothing: complete fill in one trade or no fill at all.
    pub const AON: OrderParams = OrderParams(0x2);
    /// Immediate-or-cancel: fill what is possible now, cancel the rest.
    pub const IOC: OrderParams = OrderParams(0x4);
    /// Fill-or-kill: immediately fill the whole order or cancel it.
    pub const FOK: OrderParams = OrderParams(0x2 | 0x4);
    /// Good-till-cancelled: active until explicitly cancelled.
    pub const GTC: OrderParams = OrderParams(0x10);
    /// Good-for-day: active until the end of the trading day.
    pub const GFD: OrderParams = OrderParams(0x20);
    /// Good-till-date: active until the provided date, inclusive.
    pub const GTD: OrderParams = OrderParams(0x40);

    /// Subset test: true when every bit of `param` is set on `self`.
    /// E.g. `FOK.contains(AON)` is true, `FOK.contains(STOP)` is false.
    pub fn contains(self, param: OrderParams) -> bool {
        self.0 & param.0 == param.0
    }
}

impl BitOr for OrderParams {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OrderParams {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for OrderParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::STOP) {
            names.push("STOP");
        }
        if self.contains(Self::FOK) {
            names.push("FOK");
        } else {
            if self.contains(Self::AON) {
                names.push("AON");
            }
            if self.contains(Self::IOC) {
                names.push("IOC");
            }
        }
        if self.contains(Self::GTC) {
            names.push("GTC");
        }
        if self.contains(Self::GFD) {
            names.push("GFD");
        }
        if self.contains(Self::GTD) {
            names.push("GTD");
        }
        write!(f, "{}", names.join(" "))
    }
}

/// A customer's intent to buy or sell a quantity of the instrument,
/// optionally bounded by a limit price and guarded by a stop price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub instrument: String,
    pub customer_id: CustomerId,
    /// Arrival instant, nanoseconds since the UNIX epoch. This value is
    /// the tiebreaker in price-time priority.
    pub timestamp_ns: i64,
    pub order_type: OrderType,
    pub params: OrderParams,
    /// Quantity; signed to keep accidental huge values out of range.
    pub qty: i64,
    pub filled_qty: i64,
    /// Limit price; zero for market orders.
    pub price: Price,
    /// Trigger price; zero unless the STOP parameter is set.
    pub stop_price: Price,
    pub side: Side,
    /// Monotone flag; a partially filled order can still be cancelled.
    pub cancelled: bool,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        instrument: impl Into<String>,
        customer_id: CustomerId,
        order_type: OrderType,
        params: OrderParams,
        qty: i64,
        price: Price,
        stop_price: Price,
        side: Side,
        timestamp_ns: i64,
    ) -> Self {
        Self {
            id,
            instrument: instrument.into(),
            customer_id,
            timestamp_ns,
            order_type,
            params,
            qty,
            filled_qty: 0,
            price,
            stop_price,
            side,
            cancelled: false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_filled(&self) -> bool {
        self.qty - self.filled_qty == 0
    }

    pub fn is_bid(&self) -> bool {
        self.side == Side::Buy
    }

    pub fn is_ask(&self) -> bool {
        self.side == Side::Sell
    }

    pub fn unfilled_qty(&self) -> i64 {
        self.qty - self.filled_qty
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}

/// Compact index record referencing an order by id.
///
/// Trackers are the values copied into the sorted book indexes; the full
/// order stays in the active-order map. The price is a lossy `f64`
/// projection (the stop price for parked stop orders, the limit price
/// otherwise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTracker {
    pub order_id: OrderId,
    pub order_type: OrderType,
    pub side: Side,
    pub price: f64,
    pub timestamp_ns: i64,
}
