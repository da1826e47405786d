//! Structural algorithms over graphs: connectivity with articulation points and bridges, and
//! dominator trees.
mod connectivity;
mod dominators;
mod static_graph;

pub use connectivity::*;
pub use dominators::*;
pub use static_graph::*;
