//! Price selection for a taker against one resting candidate.
//!
//! The resting side is walked in priority order, so a failed limit/limit
//! cross means every later candidate is at least as bad and the walk can
//! end. A market/market pair has no reference price to settle on and is
//! skipped without ending the walk.

use types::numeric::Price;
use types::order::{Order, OrderType};

/// Outcome of inspecting one resting candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// Prices cross; execute at the given price.
    Execute(Price),
    /// This candidate cannot trade, but a later one still might.
    Skip,
    /// Prices only get worse from here; stop walking this side.
    Exhausted,
}

/// Decide whether `incoming` trades with `resting`, and at what price.
///
/// - market taker, limit maker: the maker's limit price
/// - limit taker, market maker: the taker's limit price
/// - limit bid taker, limit ask maker: the taker's bid when it reaches
///   the ask
/// - limit ask taker, limit bid maker: the maker's bid when the taker's
///   ask reaches down to it
pub fn execution_price(incoming: &Order, resting: &Order) -> Crossing {
    match incoming.order_type {
        OrderType::Market => match resting.order_type {
            // two opposing market orders never settle
            OrderType::Market => Crossing::Skip,
            OrderType::Limit => Crossing::Execute(resting.price),
        },
        OrderType::Limit => match resting.order_type {
            OrderType::Market => Crossing::Execute(incoming.price),
            OrderType::Limit => {
                if incoming.is_bid() {
                    if incoming.price < resting.price {
                        Crossing::Exhausted
                    } else {
                        // e.g. our bid is $20.10, their ask is $20 - the
                        // trade executes at $20.10
                        Crossing::Execute(incoming.price)
                    }
                } else if incoming.price > resting.price {
                    Crossing::Exhausted
                } else {
                    Crossing::Execute(resting.price)
                }
            }
        },
    }
}
