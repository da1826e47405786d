//! Simple [`Brancher`](super::Brancher) implementations.
mod input_order;

pub use input_order::InputOrderBrancher;
