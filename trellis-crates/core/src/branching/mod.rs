//! Decisions, and the [`Brancher`] which chooses them.
mod brancher;
pub mod branchers;
mod decision;

pub use brancher::Brancher;
pub use decision::*;
