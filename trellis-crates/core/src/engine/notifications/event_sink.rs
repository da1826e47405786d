use crate::basic_types::Cause;
use crate::engine::notifications::DomainEvent;
use crate::engine::variables::VariableRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Notification {
    pub(crate) variable: VariableRef,
    pub(crate) event: DomainEvent,
    pub(crate) cause: Cause,
}

/// Collects the events emitted by domain mutations until the engine dispatches them to the
/// subscribed propagators.
#[derive(Clone, Debug, Default)]
pub(crate) struct EventSink {
    notifications: Vec<Notification>,
}

impl EventSink {
    pub(crate) fn push(&mut self, variable: VariableRef, event: DomainEvent, cause: Cause) {
        self.notifications.push(Notification {
            variable,
            event,
            cause,
        });
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Notification> + '_ {
        self.notifications.drain(..)
    }

    pub(crate) fn clear(&mut self) {
        self.notifications.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::variables::DomainId;

    #[test]
    fn notifications_are_drained_in_emission_order() {
        let mut sink = EventSink::default();
        let x = DomainId::new(0);
        let y = DomainId::new(1);

        sink.push(x.into(), DomainEvent::LowerBound, Cause::Decision);
        sink.push(y.into(), DomainEvent::Assign, Cause::Null);

        let drained = sink.drain().map(|n| n.variable).collect::<Vec<_>>();
        assert_eq!(vec![VariableRef::from(x), VariableRef::from(y)], drained);
        assert!(sink.is_empty());
    }
}
