use std::fmt::Display;

use enumset::enum_set;
use enumset::EnumSet;
use enumset::EnumSetType;

/// The kind of a domain mutation. Every mutation emits exactly one event.
#[derive(Debug, EnumSetType, Hash)]
pub enum DomainEvent {
    /// An integer domain collapsed to a single value.
    Assign,
    /// The lower bound of an integer domain was raised.
    LowerBound,
    /// The upper bound of an integer domain was lowered.
    UpperBound,
    /// A value strictly between the bounds of an integer domain was removed.
    Removal,
    RemoveNode,
    RemoveArc,
    EnforceNode,
    EnforceArc,
}

impl Display for DomainEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainEvent::Assign => write!(f, "[Event:Assign]"),
            DomainEvent::LowerBound => write!(f, "[Event:LB]"),
            DomainEvent::UpperBound => write!(f, "[Event:UB]"),
            DomainEvent::Removal => write!(f, "[Event:Remove]"),
            DomainEvent::RemoveNode => write!(f, "[Event:RemoveNode]"),
            DomainEvent::RemoveArc => write!(f, "[Event:RemoveArc]"),
            DomainEvent::EnforceNode => write!(f, "[Event:EnforceNode]"),
            DomainEvent::EnforceArc => write!(f, "[Event:EnforceArc]"),
        }
    }
}

/// Commonly used subscription masks.
///
/// Since an instantiation is reported as [`DomainEvent::Assign`] rather than as a bound change,
/// every mask interested in a bound also contains the assignment.
#[derive(Clone, Copy, Debug)]
pub struct DomainEvents;

impl DomainEvents {
    pub const ASSIGN: EnumSet<DomainEvent> = enum_set!(DomainEvent::Assign);
    pub const LOWER_BOUND: EnumSet<DomainEvent> =
        enum_set!(DomainEvent::Assign | DomainEvent::LowerBound);
    pub const UPPER_BOUND: EnumSet<DomainEvent> =
        enum_set!(DomainEvent::Assign | DomainEvent::UpperBound);
    pub const BOUNDS: EnumSet<DomainEvent> =
        enum_set!(DomainEvent::Assign | DomainEvent::LowerBound | DomainEvent::UpperBound);
    pub const ANY_INT: EnumSet<DomainEvent> = enum_set!(
        DomainEvent::Assign
            | DomainEvent::LowerBound
            | DomainEvent::UpperBound
            | DomainEvent::Removal
    );
    pub const REMOVE_ARC: EnumSet<DomainEvent> = enum_set!(DomainEvent::RemoveArc);
    pub const ANY_GRAPH: EnumSet<DomainEvent> = enum_set!(
        DomainEvent::RemoveNode
            | DomainEvent::RemoveArc
            | DomainEvent::EnforceNode
            | DomainEvent::EnforceArc
    );
}
