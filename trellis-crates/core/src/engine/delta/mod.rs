//! Per-variable logs of domain mutations, and the monitors through which propagators replay them.
mod delta;
mod delta_monitor;

pub use delta::*;
pub use delta_monitor::*;
