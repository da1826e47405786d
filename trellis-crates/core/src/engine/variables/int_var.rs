use std::fmt::Display;

use super::DomainId;
use crate::basic_types::Cause;
use crate::basic_types::Contradiction;
use crate::engine::notifications::DomainEvent;
use crate::engine::Assignments;

/// How an [`IntVar`] relates to the domain it is defined over.
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewModifier {
    #[default]
    Identity,
    /// The view takes the value `-x`.
    Minus,
    /// The view takes the value `|x|`.
    Abs,
}

impl ViewModifier {
    /// Rewrites an event on the underlying domain into the event observed through the view.
    ///
    /// This has to be applied before a propagator inspects its deltas, since the kind of event
    /// decides which of its entry points is relevant.
    pub(crate) fn remap_event(
        &self,
        event: DomainEvent,
        assignments: &Assignments,
        domain: DomainId,
    ) -> DomainEvent {
        match self {
            ViewModifier::Identity => event,
            ViewModifier::Minus => match event {
                DomainEvent::LowerBound => DomainEvent::UpperBound,
                DomainEvent::UpperBound => DomainEvent::LowerBound,
                other => other,
            },
            ViewModifier::Abs => {
                let lower_bound = assignments.domain_lower_bound(domain);
                let upper_bound = assignments.domain_upper_bound(domain);
                let is_symmetric_pair = assignments.domain_size(domain) == 2
                    && lower_bound.checked_neg() == Some(upper_bound);

                if lower_bound == upper_bound || is_symmetric_pair {
                    DomainEvent::Assign
                } else {
                    event
                }
            }
        }
    }
}

/// An integer variable as seen by a propagator: a domain together with the view through which
/// it is observed and modified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntVar {
    domain: DomainId,
    modifier: ViewModifier,
}

impl From<DomainId> for IntVar {
    fn from(domain: DomainId) -> Self {
        IntVar {
            domain,
            modifier: ViewModifier::Identity,
        }
    }
}

impl Display for IntVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.modifier {
            ViewModifier::Identity => write!(f, "{}", self.domain),
            ViewModifier::Minus => write!(f, "-{}", self.domain),
            ViewModifier::Abs => write!(f, "|{}|", self.domain),
        }
    }
}

impl IntVar {
    pub fn new(domain: DomainId, modifier: ViewModifier) -> Self {
        IntVar { domain, modifier }
    }

    pub fn domain(&self) -> DomainId {
        self.domain
    }

    pub fn modifier(&self) -> ViewModifier {
        self.modifier
    }

    /// The negation of this view. Negating a negation gives back the domain itself; an absolute
    /// value view has no negation and gives `None`.
    pub fn negated(&self) -> Option<IntVar> {
        let modifier = match self.modifier {
            ViewModifier::Identity => ViewModifier::Minus,
            ViewModifier::Minus => ViewModifier::Identity,
            ViewModifier::Abs => return None,
        };
        Some(IntVar::new(self.domain, modifier))
    }

    pub fn absolute(&self) -> IntVar {
        IntVar::new(self.domain, ViewModifier::Abs)
    }

    pub fn lower_bound(&self, assignments: &Assignments) -> i32 {
        let domain = self.domain;
        match self.modifier {
            ViewModifier::Identity => assignments.domain_lower_bound(domain),
            ViewModifier::Minus => -assignments.domain_upper_bound(domain),
            ViewModifier::Abs => {
                let lower_bound = assignments.domain_lower_bound(domain);
                let upper_bound = assignments.domain_upper_bound(domain);
                if lower_bound >= 0 {
                    lower_bound
                } else if upper_bound <= 0 {
                    -upper_bound
                } else if assignments.domain_contains(domain, 0) {
                    0
                } else {
                    let closest_positive = assignments
                        .domain_next_value(domain, 0)
                        .unwrap_or(upper_bound);
                    let closest_negative = assignments
                        .domain_previous_value(domain, 0)
                        .unwrap_or(lower_bound);
                    closest_positive.min(-closest_negative)
                }
            }
        }
    }

    pub fn upper_bound(&self, assignments: &Assignments) -> i32 {
        let domain = self.domain;
        match self.modifier {
            ViewModifier::Identity => assignments.domain_upper_bound(domain),
            ViewModifier::Minus => -assignments.domain_lower_bound(domain),
            ViewModifier::Abs => (-assignments.domain_lower_bound(domain))
                .max(assignments.domain_upper_bound(domain)),
        }
    }

    pub fn contains(&self, assignments: &Assignments, value: i32) -> bool {
        let domain = self.domain;
        match self.modifier {
            ViewModifier::Identity => assignments.domain_contains(domain, value),
            ViewModifier::Minus => value
                .checked_neg()
                .is_some_and(|negated| assignments.domain_contains(domain, negated)),
            ViewModifier::Abs => {
                value >= 0
                    && (assignments.domain_contains(domain, value)
                        || assignments.domain_contains(domain, -value))
            }
        }
    }

    pub fn is_fixed(&self, assignments: &Assignments) -> bool {
        self.lower_bound(assignments) == self.upper_bound(assignments)
    }

    pub fn fixed_value(&self, assignments: &Assignments) -> Option<i32> {
        let lower_bound = self.lower_bound(assignments);
        (lower_bound == self.upper_bound(assignments)).then_some(lower_bound)
    }

    pub fn size(&self, assignments: &Assignments) -> usize {
        match self.modifier {
            ViewModifier::Identity | ViewModifier::Minus => assignments.domain_size(self.domain),
            ViewModifier::Abs => self.iterate_domain(assignments).count(),
        }
    }

    /// The smallest value in the domain which is strictly larger than `value`.
    pub fn next_value(&self, assignments: &Assignments, value: i32) -> Option<i32> {
        let domain = self.domain;
        match self.modifier {
            ViewModifier::Identity => assignments.domain_next_value(domain, value),
            ViewModifier::Minus => {
                // The negation of `i32::MIN` lies above every value of the domain.
                let previous = match value.checked_neg() {
                    Some(negated) => assignments.domain_previous_value(domain, negated),
                    None => Some(assignments.domain_upper_bound(domain)),
                };
                previous.map(|previous| -previous)
            }
            ViewModifier::Abs => {
                let from = value.saturating_add(1).max(0);
                let positive = assignments.domain_next_value(domain, from - 1);
                let negative = assignments
                    .domain_previous_value(domain, 1 - from)
                    .map(|previous| -previous);
                match (positive, negative) {
                    (Some(positive), Some(negative)) => Some(positive.min(negative)),
                    (positive, negative) => positive.or(negative),
                }
            }
        }
    }

    /// The largest value in the domain which is strictly smaller than `value`.
    pub fn previous_value(&self, assignments: &Assignments, value: i32) -> Option<i32> {
        let domain = self.domain;
        match self.modifier {
            ViewModifier::Identity => assignments.domain_previous_value(domain, value),
            ViewModifier::Minus => value
                .checked_neg()
                .and_then(|negated| assignments.domain_next_value(domain, negated))
                .map(|next| -next),
            ViewModifier::Abs => {
                if value <= 0 {
                    return None;
                }
                let to = value - 1;
                let positive = assignments
                    .domain_previous_value(domain, to + 1)
                    .filter(|&previous| previous >= 0);
                let negative = assignments
                    .domain_next_value(domain, -to - 1)
                    .filter(|&next| next <= 0)
                    .map(|next| -next);
                positive.max(negative)
            }
        }
    }

    pub fn iterate_domain<'a>(&self, assignments: &'a Assignments) -> impl Iterator<Item = i32> + 'a {
        let view = *self;
        let upper_bound = view.upper_bound(assignments);
        std::iter::successors(Some(view.lower_bound(assignments)), move |&value| {
            view.next_value(assignments, value)
        })
        .take_while(move |&value| value <= upper_bound)
    }

    pub(crate) fn update_lower_bound(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let domain = self.domain;
        match self.modifier {
            ViewModifier::Identity => assignments.tighten_domain_lower_bound(domain, value, cause),
            ViewModifier::Minus => match value.checked_neg() {
                Some(negated) => assignments.tighten_domain_upper_bound(domain, negated, cause),
                None => Ok(false),
            },
            ViewModifier::Abs => {
                if value <= 0 {
                    return Ok(false);
                }
                assignments.remove_range_from_domain(domain, 1 - value, value - 1, cause)
            }
        }
    }

    pub(crate) fn update_upper_bound(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let domain = self.domain;
        match self.modifier {
            ViewModifier::Identity => assignments.tighten_domain_upper_bound(domain, value, cause),
            ViewModifier::Minus => match value.checked_neg() {
                Some(negated) => assignments.tighten_domain_lower_bound(domain, negated, cause),
                None => Err(Contradiction::empty_domain(domain, cause)),
            },
            ViewModifier::Abs => {
                if value < 0 {
                    return Err(Contradiction::empty_domain(domain, cause));
                }
                let lower_changed = assignments.tighten_domain_lower_bound(domain, -value, cause)?;
                let upper_changed = assignments.tighten_domain_upper_bound(domain, value, cause)?;
                Ok(lower_changed || upper_changed)
            }
        }
    }

    pub(crate) fn remove_value(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let domain = self.domain;
        match self.modifier {
            ViewModifier::Identity => assignments.remove_from_domain(domain, value, cause),
            ViewModifier::Minus => match value.checked_neg() {
                Some(negated) => assignments.remove_from_domain(domain, negated, cause),
                None => Ok(false),
            },
            ViewModifier::Abs => {
                if value < 0 {
                    return Ok(false);
                }
                let positive_removed = assignments.remove_from_domain(domain, value, cause)?;
                let negative_removed = assignments.remove_from_domain(domain, -value, cause)?;
                Ok(positive_removed || negative_removed)
            }
        }
    }

    pub(crate) fn instantiate_to(
        &self,
        assignments: &mut Assignments,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let domain = self.domain;
        match self.modifier {
            ViewModifier::Identity => assignments.assign_domain(domain, value, cause),
            ViewModifier::Minus => match value.checked_neg() {
                Some(negated) => assignments.assign_domain(domain, negated, cause),
                None => Err(Contradiction::empty_domain(domain, cause)),
            },
            ViewModifier::Abs => {
                if !self.contains(assignments, value) {
                    return Err(Contradiction::empty_domain(domain, cause));
                }
                let upper_changed = self.update_upper_bound(assignments, value, cause)?;
                let lower_changed = self.update_lower_bound(assignments, value, cause)?;
                Ok(upper_changed || lower_changed)
            }
        }
    }
}
