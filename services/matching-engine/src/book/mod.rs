//! Book infrastructure: the ordered index and the tracker container.

pub mod container;
pub mod index;

pub use container::OrderContainer;
pub use index::{OrderIndex, Priority};
