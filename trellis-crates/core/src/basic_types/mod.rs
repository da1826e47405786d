mod cause;
mod inconsistency;
mod trail;

pub use cause::*;
pub use inconsistency::*;
pub(crate) use trail::*;
