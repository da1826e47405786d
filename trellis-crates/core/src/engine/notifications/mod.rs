//! Domain events and the subscriptions of propagators to them.
mod domain_event;
mod event_sink;
mod watch_list;

pub use domain_event::*;
pub(crate) use event_sink::*;
pub use watch_list::*;
