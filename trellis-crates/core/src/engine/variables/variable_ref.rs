use std::fmt::Display;

use super::DomainId;
use super::GraphId;
use super::IntVar;

/// Any variable of the engine, regardless of the kind of its domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableRef {
    Integer(DomainId),
    Graph(GraphId),
}

impl From<DomainId> for VariableRef {
    fn from(domain: DomainId) -> Self {
        VariableRef::Integer(domain)
    }
}

impl From<IntVar> for VariableRef {
    fn from(variable: IntVar) -> Self {
        VariableRef::Integer(variable.domain())
    }
}

impl From<GraphId> for VariableRef {
    fn from(graph: GraphId) -> Self {
        VariableRef::Graph(graph)
    }
}

impl Display for VariableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableRef::Integer(domain) => write!(f, "{domain}"),
            VariableRef::Graph(graph) => write!(f, "{graph}"),
        }
    }
}
