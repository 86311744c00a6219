//! Executed trade records.

use crate::ids::{CustomerId, OrderId, TradeId};
use crate::numeric::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Two opposed matched orders: `qty` units changed hands at `price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Assigned by the trade book on entry; zero until then.
    pub id: TradeId,
    pub buyer: CustomerId,
    pub seller: CustomerId,
    pub instrument: String,
    pub qty: i64,
    pub price: Price,
    /// Notional value, `price * qty`.
    pub total: Decimal,
    pub timestamp_ns: i64,

    pub bid_order_id: OrderId,
    pub ask_order_id: OrderId,

    /// Set through the trade book when a counterparty rejects settlement.
    pub rejected: bool,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buyer: CustomerId,
        seller: CustomerId,
        instrument: impl Into<String>,
        qty: i64,
        price: Price,
        timestamp_ns: i64,
        bid_order_id: OrderId,
        ask_order_id: OrderId,
    ) -> Self {
        Self {
            id: TradeId::new(0),
            buyer,
            seller,
            instrument: instrument.into(),
            qty,
            price,
            total: price.as_decimal() * Decimal::from(qty),
            timestamp_ns,
            bid_order_id,
            ask_order_id,
            rejected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn trade_total() {
        let trade = Trade::new(
            CustomerId::nil(),
            CustomerId::nil(),
            "TEST",
            3,
            "20.10".parse().unwrap(),
            1,
            OrderId::new(1),
            OrderId::new(2),
        );
        assert_eq!(trade.total, Decimal::from_str("60.30").unwrap());
        assert!(!trade.rejected);
    }

    #[test]
    fn trade_serialization() {
        let trade = Trade::new(
            CustomerId::new(),
            CustomerId::new(),
            "TEST",
            2,
            "20.12".parse().unwrap(),
            1708123456789000000,
            OrderId::new(1),
            OrderId::new(2),
        );
        let json = serde_json::to_string(&trade).unwrap();
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, back);
    }
}
