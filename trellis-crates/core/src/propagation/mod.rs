//! The building blocks of propagators.
//!
//! A propagator removes values from the domains of its variables which cannot be part of any
//! solution of its constraint. It is created by a [`PropagatorConstructor`], which subscribes it
//! to events on its variables through the [`PropagatorConstructorContext`]. Once the domain of a
//! subscribed variable changes, the engine schedules the propagator according to its
//! [`Priority`] and eventually calls it with a [`PropagationContext`].
//!
//! Propagators are not required to be idempotent, but every concrete propagator in this crate
//! loops until it no longer prunes anything before returning to the engine.
mod constructor;
mod contexts;
mod local_id;
mod propagator;
mod propagator_id;
pub(crate) mod store;

pub use constructor::*;
pub use contexts::*;
pub use local_id::*;
pub use propagator::*;
pub use propagator_id::*;
pub use store::Propagators;
