//! Error taxonomy for the matching engine.
//!
//! Validation and state errors are terminal for the submitted order.
//! Persistence errors surface after the in-memory mutation, so logical
//! state may be ahead of durable state; callers should retry or escalate
//! rather than drop them. Internal invariant violations (a tracker
//! without a stored order) are programmer errors and panic instead.

use crate::ids::OrderId;
use thiserror::Error;

/// Admission validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid quantity provided")]
    InvalidQty,

    #[error("price has to be zero for market orders")]
    InvalidMarketPrice,

    #[error("price has to be set for limit orders")]
    InvalidLimitPrice,

    #[error("stop price has to be set for a stop order")]
    InvalidStopPrice,

    #[error("price {0} has no finite float projection")]
    UnrepresentablePrice(String),
}

/// Violations of the book's bookkeeping rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("order with id {0} already exists")]
    DuplicateOrder(OrderId),

    #[error("order with id {0} hasn't yet been stored")]
    UnknownOrder(OrderId),
}

/// Failures raised by a repository backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Top-level error surfaced by book operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderBookError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        assert_eq!(
            ValidationError::InvalidQty.to_string(),
            "invalid quantity provided"
        );
        assert_eq!(
            ValidationError::InvalidMarketPrice.to_string(),
            "price has to be zero for market orders"
        );
    }

    #[test]
    fn state_error_display() {
        let err = StateError::DuplicateOrder(OrderId::new(7));
        assert_eq!(err.to_string(), "order with id 7 already exists");
    }

    #[test]
    fn order_book_error_from_parts() {
        let err: OrderBookError = ValidationError::InvalidLimitPrice.into();
        assert!(matches!(err, OrderBookError::Validation(_)));

        let err: OrderBookError = RepositoryError::Backend("disk full".into()).into();
        assert_eq!(err.to_string(), "persistence failure: storage backend failure: disk full");
    }
}
