mod circuit_dominator;

pub use circuit_dominator::*;
