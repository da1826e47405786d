use enumset::EnumSet;

use super::DomainEvent;
use crate::containers::KeyedVec;
use crate::engine::variables::DomainId;
use crate::engine::variables::GraphId;
use crate::engine::variables::IntVar;
use crate::engine::variables::VariableRef;
use crate::engine::variables::ViewModifier;
use crate::engine::Assignments;
use crate::propagation::LocalId;
use crate::propagation::PropagatorId;

/// The subscription of a propagator to the events of one of its variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    propagator: PropagatorId,
    local_id: LocalId,
    events: EnumSet<DomainEvent>,
}

impl Request {
    pub(crate) fn new(propagator: PropagatorId, local_id: LocalId, events: EnumSet<DomainEvent>) -> Self {
        Request {
            propagator,
            local_id,
            events,
        }
    }

    pub fn propagator(&self) -> PropagatorId {
        self.propagator
    }

    pub fn local_id(&self) -> LocalId {
        self.local_id
    }

    pub fn events(&self) -> EnumSet<DomainEvent> {
        self.events
    }
}

/// A [`Request`] on a domain which the propagator observes through a view.
///
/// All bookkeeping is that of the wrapped request; only the event is rewritten for the view
/// before the mask of the request is consulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewRequestWrapper {
    original: Request,
    modifier: ViewModifier,
}

impl ViewRequestWrapper {
    pub fn new(original: Request, modifier: ViewModifier) -> Self {
        ViewRequestWrapper { original, modifier }
    }

    pub fn original(&self) -> Request {
        self.original
    }

    /// The event as seen through the view, if the wrapped request is interested in it.
    pub(crate) fn update(
        &self,
        event: DomainEvent,
        assignments: &Assignments,
        domain: DomainId,
    ) -> Option<DomainEvent> {
        let event = self.modifier.remap_event(event, assignments, domain);
        self.original.events.contains(event).then_some(event)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Subscription {
    Direct(Request),
    View(ViewRequestWrapper),
}

impl Subscription {
    pub(crate) fn request(&self) -> Request {
        match self {
            Subscription::Direct(request) => *request,
            Subscription::View(wrapper) => wrapper.original,
        }
    }

    /// The event to deliver for a mutation of `variable`, if any.
    pub(crate) fn deliver(
        &self,
        event: DomainEvent,
        assignments: &Assignments,
        variable: VariableRef,
    ) -> Option<DomainEvent> {
        match (self, variable) {
            (Subscription::View(wrapper), VariableRef::Integer(domain)) => {
                wrapper.update(event, assignments, domain)
            }
            _ => {
                let request = self.request();
                request.events.contains(event).then_some(event)
            }
        }
    }
}

/// The subscriptions of every variable.
#[derive(Clone, Debug, Default)]
pub(crate) struct Watchers {
    integer: KeyedVec<DomainId, Vec<Subscription>>,
    graph: KeyedVec<GraphId, Vec<Subscription>>,
}

impl Watchers {
    pub(crate) fn watch_integer(&mut self, variable: IntVar, request: Request) {
        let subscription = match variable.modifier() {
            ViewModifier::Identity => Subscription::Direct(request),
            modifier => Subscription::View(ViewRequestWrapper::new(request, modifier)),
        };
        self.integer.accommodate(variable.domain(), vec![]);
        self.integer[variable.domain()].push(subscription);
    }

    pub(crate) fn watch_graph(&mut self, graph: GraphId, request: Request) {
        self.graph.accommodate(graph, vec![]);
        self.graph[graph].push(Subscription::Direct(request));
    }

    pub(crate) fn subscriptions(&self, variable: VariableRef) -> &[Subscription] {
        let subscriptions = match variable {
            VariableRef::Integer(domain) => self.integer.get(domain),
            VariableRef::Graph(graph) => self.graph.get(graph),
        };
        subscriptions.map(Vec::as_slice).unwrap_or_default()
    }
}
