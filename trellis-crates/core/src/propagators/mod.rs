//! The propagators of the engine.
//!
//! Every propagator is created from an `*Args` struct which implements
//! [`PropagatorConstructor`](crate::propagation::PropagatorConstructor), and is added to the
//! engine with [`State::add_propagator`](crate::engine::State::add_propagator).
mod arithmetic;
mod circuit;
mod extension;
mod graph;

pub use arithmetic::*;
pub use circuit::*;
pub use extension::*;
pub use graph::*;
