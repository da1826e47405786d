//! The propagation core of the Trellis constraint solver.
//!
//! A [`State`] owns the integer and graph variables of a model together with the propagators
//! posted over them. It propagates to a fixpoint and can be checkpointed and restored, which is
//! all a search needs; [`search::DepthFirstSearch`] is the search that ships with the crate.
pub mod asserts;

pub mod basic_types;
pub mod branching;
pub mod containers;
pub mod engine;
pub mod graph;
pub(crate) mod math;
pub mod options;
pub mod propagation;
pub mod propagators;
pub mod search;
pub mod statistics;

pub use convert_case;
pub use engine::termination;
pub use engine::State;
pub use rand;
