//! Single-instrument central limit order book.
//!
//! Orders enter through [`OrderBook::add`], are validated and either
//! matched against the opposite side in price-time priority, parked as
//! pending stop orders, or rested in the book. Executed trades land in
//! the [`TradeBook`] and move the market price, which in turn activates
//! any stop orders the move has triggered.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced; market orders ahead of limits
//! - Every tracker in a book index has a stored order under the same id
//! - The market price equals the price of the most recent trade
//! - Trades appear in the trade book in the order matching produced them

pub mod book;
pub mod callbacks;
pub mod engine;
pub mod matching;
pub mod repository;
pub mod trade_book;

pub use callbacks::{OrderCallback, TradeCallback};
pub use engine::{OrderBook, MIN_QTY};
pub use repository::{NoopOrderRepository, NoopTradeRepository, OrderRepository, TradeRepository};
pub use trade_book::TradeBook;
