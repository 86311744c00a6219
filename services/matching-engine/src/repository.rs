//! Persistence seams for orders and trades.
//!
//! The book mutates its in-memory state first and persists second, so a
//! failed save leaves logical state ahead of durable state; callers are
//! expected to retry or escalate. Implementations should keep `save`
//! fast or hand off to a bounded queue, since it runs inside admission.

use types::errors::RepositoryError;
use types::ids::{OrderId, TradeId};
use types::order::Order;
use types::trade::Trade;

/// Persistent order storage hooks consumed by the book.
pub trait OrderRepository: Send + Sync {
    /// Called after every committed mutation to an order: admission,
    /// rest, fill progress, cancellation, removal.
    fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Retrieval for collaborators; the matching path never calls this.
    fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;
}

/// Persistent trade storage, symmetric to [`OrderRepository`].
pub trait TradeRepository: Send + Sync {
    fn store(&self, trade: &Trade) -> Result<(), RepositoryError>;

    fn get_by_id(&self, id: TradeId) -> Result<Option<Trade>, RepositoryError>;
}

/// Discards everything; the default for tests and books without
/// durability requirements.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOrderRepository;

impl OrderRepository for NoopOrderRepository {
    fn save(&self, _order: &Order) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn get_by_id(&self, _id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(None)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTradeRepository;

impl TradeRepository for NoopTradeRepository {
    fn store(&self, _trade: &Trade) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn get_by_id(&self, _id: TradeId) -> Result<Option<Trade>, RepositoryError> {
        Ok(None)
    }
}
