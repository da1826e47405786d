mod assignments;
pub(crate) mod delta;
pub(crate) mod domains;
pub(crate) mod notifications;
mod propagator_queue;
mod state;
pub mod termination;
pub(crate) mod trailed;
pub mod variables;

pub use assignments::Assignments;
pub use assignments::GraphDomainRef;
pub use delta::DeltaEntry;
pub use delta::GraphDeltaMonitor;
pub use delta::GraphElement;
pub use delta::IntDeltaMonitor;
pub use delta::RemovedRange;
pub use domains::GraphKind;
pub use notifications::DomainEvent;
pub use notifications::DomainEvents;
pub(crate) use propagator_queue::PropagatorQueue;
pub use state::State;
