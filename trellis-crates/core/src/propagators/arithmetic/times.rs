use enumset::EnumSet;

use crate::basic_types::Contradiction;
use crate::basic_types::FatalError;
use crate::basic_types::PropagationStatus;
use crate::containers::HashSet;
use crate::engine::notifications::DomainEvent;
use crate::engine::notifications::DomainEvents;
use crate::engine::variables::IntVar;
use crate::engine::Assignments;
use crate::math::num_ext::NumExt;
use crate::propagation::Entailment;
use crate::propagation::LocalId;
use crate::propagation::Priority;
use crate::propagation::PropagationContext;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorConstructorContext;

/// Above this number of pairs of values of `a` and `b`, the values are no longer checked for
/// support one by one.
const SUPPORT_FILTERING_THRESHOLD: usize = 1 << 12;

const ID_A: LocalId = LocalId::from(0);
const ID_B: LocalId = LocalId::from(1);
const ID_C: LocalId = LocalId::from(2);

/// The [`PropagatorConstructor`] for the [`TimesPropagator`].
#[derive(Clone, Debug)]
pub struct TimesArgs {
    pub a: IntVar,
    pub b: IntVar,
    pub c: IntVar,
}

impl PropagatorConstructor for TimesArgs {
    type PropagatorImpl = TimesPropagator;

    fn create(self, mut context: PropagatorConstructorContext) -> Result<Self::PropagatorImpl, FatalError> {
        let TimesArgs { a, b, c } = self;

        context.register(a, DomainEvents::ANY_INT, ID_A);
        context.register(b, DomainEvents::ANY_INT, ID_B);
        context.register(c, DomainEvents::ANY_INT, ID_C);

        Ok(TimesPropagator { a, b, c })
    }
}

/// A propagator for the constraint `a * b = c`.
///
/// It reasons on the signs of the variables, computes the third variable once two of them are
/// fixed, and keeps `c` within the products of the bounds of `a` and `b` (and `a` and `b` within
/// the quotients when the divisor does not contain 0). If there are few enough combinations of
/// values of `a` and `b`, every value without support is removed.
#[derive(Clone, Debug)]
pub struct TimesPropagator {
    a: IntVar,
    b: IntVar,
    c: IntVar,
}

impl Propagator for TimesPropagator {
    fn name(&self) -> &str {
        "Times"
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn propagate(&mut self, mut context: PropagationContext, _events: EnumSet<DomainEvent>) -> PropagationStatus {
        while self.propagate_once(&mut context)? {}

        if context.is_fixed(self.a) && context.is_fixed(self.b) {
            context.set_passive();
        }
        Ok(())
    }

    fn is_entailed(&self, assignments: &Assignments) -> Entailment {
        match (
            assignments.fixed_value(self.a),
            assignments.fixed_value(self.b),
            assignments.fixed_value(self.c),
        ) {
            (Some(a), Some(b), Some(c)) => Entailment::from_bool(a as i64 * b as i64 == c as i64),
            _ => Entailment::Undefined,
        }
    }
}

impl TimesPropagator {
    /// A single round of every rule; returns whether any domain changed.
    fn propagate_once(&self, context: &mut PropagationContext) -> Result<bool, Contradiction> {
        let mut changed = self.propagate_signs(context)?;
        changed |= self.propagate_instantiated(context)?;
        changed |= propagate_product_bounds(context, self.a, self.b, self.c)?;
        changed |= propagate_factor_bounds(context, self.a, self.b, self.c)?;
        changed |= propagate_factor_bounds(context, self.b, self.a, self.c)?;
        changed |= self.propagate_fixed_factor(context)?;
        changed |= self.filter_unsupported(context)?;
        Ok(changed)
    }

    fn propagate_signs(&self, context: &mut PropagationContext) -> Result<bool, Contradiction> {
        let mut changed = false;

        if !context.contains(self.c, 0) {
            changed |= context.remove_value(self.a, 0)?;
            changed |= context.remove_value(self.b, 0)?;
        }
        if context.fixed_value(self.a) == Some(0) || context.fixed_value(self.b) == Some(0) {
            changed |= context.instantiate_to(self.c, 0)?;
        }

        if context.lower_bound(self.c) > 0 {
            changed |= same_sign(context, self.a, self.b)?;
            changed |= same_sign(context, self.b, self.a)?;
        } else if context.upper_bound(self.c) < 0 {
            changed |= opposite_sign(context, self.a, self.b)?;
            changed |= opposite_sign(context, self.b, self.a)?;
        }

        Ok(changed)
    }

    fn propagate_instantiated(&self, context: &mut PropagationContext) -> Result<bool, Contradiction> {
        let a = context.fixed_value(self.a);
        let b = context.fixed_value(self.b);
        let c = context.fixed_value(self.c);

        match (a, b, c) {
            (Some(a), Some(b), _) => {
                let product = a as i64 * b as i64;
                let Ok(product) = i32::try_from(product) else {
                    return Err(context.contradiction("the product does not fit the domain").on(self.c.domain()));
                };
                context.instantiate_to(self.c, product)
            }
            (Some(a), None, Some(c)) => instantiate_quotient(context, self.b, c, a),
            (None, Some(b), Some(c)) => instantiate_quotient(context, self.a, c, b),
            _ => Ok(false),
        }
    }

    /// With one factor fixed, moves the bounds of the other factor to the closest values whose
    /// product lies in the domain of `c`.
    fn propagate_fixed_factor(&self, context: &mut PropagationContext) -> Result<bool, Contradiction> {
        if let Some(a) = context.fixed_value(self.a) {
            return scan_to_supported_bounds(context, self.b, a, self.c);
        }
        if let Some(b) = context.fixed_value(self.b) {
            return scan_to_supported_bounds(context, self.a, b, self.c);
        }
        Ok(false)
    }

    /// Removes every value for which there is no assignment of the other two variables such that
    /// the constraint holds.
    ///
    /// A product domain which only tracks its bounds is shrunk to the smallest and the largest
    /// supported product instead.
    fn filter_unsupported(&self, context: &mut PropagationContext) -> Result<bool, Contradiction> {
        if context.size(self.a).saturating_mul(context.size(self.b)) > SUPPORT_FILTERING_THRESHOLD {
            return Ok(false);
        }
        let a_values = context.assignments().iterate_domain(self.a).collect::<Vec<_>>();
        let b_values = context.assignments().iterate_domain(self.b).collect::<Vec<_>>();

        let mut supported_a: HashSet<i32> = HashSet::default();
        let mut supported_b: HashSet<i32> = HashSet::default();
        let mut supported_c: HashSet<i32> = HashSet::default();
        for &a in &a_values {
            for &b in &b_values {
                let Ok(product) = i32::try_from(a as i64 * b as i64) else {
                    continue;
                };
                if context.contains(self.c, product) {
                    let _ = supported_a.insert(a);
                    let _ = supported_b.insert(b);
                    let _ = supported_c.insert(product);
                }
            }
        }

        let mut changed = false;
        for a in a_values.into_iter().filter(|a| !supported_a.contains(a)) {
            changed |= context.remove_value(self.a, a)?;
        }
        for b in b_values.into_iter().filter(|b| !supported_b.contains(b)) {
            changed |= context.remove_value(self.b, b)?;
        }

        if !context.assignments().is_enumerated(self.c.domain()) {
            if let Some((&min, &max)) = supported_c.iter().min().zip(supported_c.iter().max()) {
                changed |= context.update_lower_bound(self.c, min)?;
                changed |= context.update_upper_bound(self.c, max)?;
            }
            return Ok(changed);
        }

        let c_values = context.assignments().iterate_domain(self.c).collect::<Vec<_>>();
        for c in c_values.into_iter().filter(|c| !supported_c.contains(c)) {
            changed |= context.remove_value(self.c, c)?;
        }

        Ok(changed)
    }
}

/// If `other` has a strict sign, `variable` takes the same sign.
fn same_sign(context: &mut PropagationContext, variable: IntVar, other: IntVar) -> Result<bool, Contradiction> {
    if context.lower_bound(other) > 0 {
        context.update_lower_bound(variable, 1)
    } else if context.upper_bound(other) < 0 {
        context.update_upper_bound(variable, -1)
    } else {
        Ok(false)
    }
}

fn opposite_sign(context: &mut PropagationContext, variable: IntVar, other: IntVar) -> Result<bool, Contradiction> {
    if context.lower_bound(other) > 0 {
        context.update_upper_bound(variable, -1)
    } else if context.upper_bound(other) < 0 {
        context.update_lower_bound(variable, 1)
    } else {
        Ok(false)
    }
}

/// Fixes `variable` to `product / factor`.
fn instantiate_quotient(
    context: &mut PropagationContext,
    variable: IntVar,
    product: i32,
    factor: i32,
) -> Result<bool, Contradiction> {
    if factor == 0 {
        if product != 0 {
            return Err(context.contradiction("a product of 0 is 0"));
        }
        return Ok(false);
    }

    let (product, factor) = (product as i64, factor as i64);
    if product % factor != 0 {
        return Err(context
            .contradiction("the quotient is not integral")
            .on(variable.domain()));
    }
    match i32::try_from(product / factor) {
        Ok(quotient) => context.instantiate_to(variable, quotient),
        Err(_) => Err(context.contradiction("the quotient does not fit the domain").on(variable.domain())),
    }
}

fn clamp_to_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// `c` lies between the smallest and the largest product of the bounds of `a` and `b`.
fn propagate_product_bounds(
    context: &mut PropagationContext,
    a: IntVar,
    b: IntVar,
    c: IntVar,
) -> Result<bool, Contradiction> {
    let a_bounds = [context.lower_bound(a) as i64, context.upper_bound(a) as i64];
    let b_bounds = [context.lower_bound(b) as i64, context.upper_bound(b) as i64];

    let corners = a_bounds
        .iter()
        .flat_map(|a| b_bounds.iter().map(move |b| a * b));
    let (min, max) = corners.fold((i64::MAX, i64::MIN), |(min, max), product| {
        (min.min(product), max.max(product))
    });

    let mut changed = context.update_lower_bound(c, clamp_to_i32(min))?;
    changed |= context.update_upper_bound(c, clamp_to_i32(max))?;
    Ok(changed)
}

/// If `divisor` does not contain 0, `variable` lies between the rounded quotients of the bounds
/// of `product` and `divisor`.
fn propagate_factor_bounds(
    context: &mut PropagationContext,
    variable: IntVar,
    divisor: IntVar,
    product: IntVar,
) -> Result<bool, Contradiction> {
    let divisor_bounds = [context.lower_bound(divisor) as i64, context.upper_bound(divisor) as i64];
    if divisor_bounds[0] <= 0 && divisor_bounds[1] >= 0 {
        return Ok(false);
    }
    let product_bounds = [context.lower_bound(product) as i64, context.upper_bound(product) as i64];

    let mut lower = i64::MAX;
    let mut upper = i64::MIN;
    for &numerator in &product_bounds {
        for &denominator in &divisor_bounds {
            lower = lower.min(NumExt::div_ceil(numerator, denominator));
            upper = upper.max(NumExt::div_floor(numerator, denominator));
        }
    }

    let mut changed = context.update_lower_bound(variable, clamp_to_i32(lower))?;
    changed |= context.update_upper_bound(variable, clamp_to_i32(upper))?;
    Ok(changed)
}

/// Raises the lower bound and lowers the upper bound of `variable` until `factor * bound` is in
/// the domain of `product`.
fn scan_to_supported_bounds(
    context: &mut PropagationContext,
    variable: IntVar,
    factor: i32,
    product: IntVar,
) -> Result<bool, Contradiction> {
    let is_supported = |context: &PropagationContext, value: i32| {
        i32::try_from(factor as i64 * value as i64).is_ok_and(|result| context.contains(product, result))
    };

    let mut changed = false;

    let mut lower_bound = context.lower_bound(variable);
    while !is_supported(context, lower_bound) {
        let Some(next) = lower_bound.checked_add(1) else {
            return Err(context.contradiction("no value has a supported product").on(variable.domain()));
        };
        changed |= context.update_lower_bound(variable, next)?;
        lower_bound = context.lower_bound(variable);
    }

    let mut upper_bound = context.upper_bound(variable);
    while !is_supported(context, upper_bound) {
        let Some(previous) = upper_bound.checked_sub(1) else {
            return Err(context.contradiction("no value has a supported product").on(variable.domain()));
        };
        changed |= context.update_upper_bound(variable, previous)?;
        upper_bound = context.upper_bound(variable);
    }

    Ok(changed)
}
