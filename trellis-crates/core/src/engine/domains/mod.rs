mod graph_domain;
mod integer_domain;

pub use graph_domain::GraphKind;
pub(crate) use graph_domain::GraphDomain;
pub(crate) use integer_domain::*;
