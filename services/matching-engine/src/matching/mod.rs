//! Matching decisions shared by the book's walk loop.

pub mod crossing;

pub use crossing::{execution_price, Crossing};
