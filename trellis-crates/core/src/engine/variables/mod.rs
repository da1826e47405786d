//! The identifiers through which variables are referred to.
mod domain_id;
mod graph_id;
mod int_var;
mod variable_ref;

pub use domain_id::*;
pub use graph_id::*;
pub use int_var::*;
pub use variable_ref::*;
