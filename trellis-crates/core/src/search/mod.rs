//! The search driver: it applies the decisions of a [`Brancher`](crate::branching::Brancher),
//! lets the engine propagate them and backtracks on contradictions.
mod depth_first_search;
mod solution;

pub use depth_first_search::*;
pub use solution::Solution;
