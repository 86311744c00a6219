//! Append-only trade log for one instrument.

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::warn;
use types::ids::TradeId;
use types::trade::Trade;

/// Ordered record of executed trades with a daily snapshot view.
///
/// Entry is exclusive, the daily listing is shared; the book carries its
/// own guard so it can be read while the order book is matching.
pub struct TradeBook {
    instrument: String,
    inner: RwLock<Inner>,
}

struct Inner {
    trades: Vec<Trade>,
    /// trade id -> position in `trades`
    index: HashMap<TradeId, usize>,
    next_id: u64,
}

impl TradeBook {
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            inner: RwLock::new(Inner {
                trades: Vec::with_capacity(1024),
                index: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Assign the next sequential id to the trade and append it.
    /// Returns the trade with its id stamped.
    pub fn enter(&self, mut trade: Trade) -> Trade {
        let mut inner = self.inner.write().expect("trade book lock poisoned");
        inner.next_id += 1;
        trade.id = TradeId::new(inner.next_id);
        let position = inner.trades.len();
        inner.index.insert(trade.id, position);
        inner.trades.push(trade.clone());
        trade
    }

    /// Flag a recorded trade as rejected. Unknown ids are a warned no-op.
    pub fn reject(&self, id: TradeId) {
        let mut inner = self.inner.write().expect("trade book lock poisoned");
        let Some(&position) = inner.index.get(&id) else {
            warn!(trade_id = %id, "cannot reject trade: unknown id");
            return;
        };
        inner.trades[position].rejected = true;
    }

    /// Copy of all trades for the current session, sorted by timestamp
    /// non-decreasing.
    pub fn daily_trades(&self) -> Vec<Trade> {
        let inner = self.inner.read().expect("trade book lock poisoned");
        let mut trades = inner.trades.clone();
        trades.sort_by_key(|trade| trade.timestamp_ns);
        trades
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("trade book lock poisoned").trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
