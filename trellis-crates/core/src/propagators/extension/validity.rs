use crate::engine::variables::IntVar;
use crate::engine::Assignments;

/// Checks whether a tuple is still compatible with the domains of a scope of variables.
///
/// The variables are kept in a sorted order (by ascending domain size), which is refreshed by
/// [`ValidityChecker::sort_variables`]. [`ValidityChecker::is_valid_at`] refers to a variable by
/// its index in this order; tuples are always indexed by the position in the scope.
#[derive(Clone, Debug)]
pub struct ValidityChecker {
    variables: Box<[IntVar]>,
    /// The positions of the variables in the scope, sorted by the size of their domains.
    sorted: Vec<usize>,
}

impl ValidityChecker {
    pub fn new(variables: impl Into<Box<[IntVar]>>) -> ValidityChecker {
        let variables = variables.into();
        let sorted = (0..variables.len()).collect();

        ValidityChecker { variables, sorted }
    }

    pub fn arity(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[IntVar] {
        &self.variables
    }

    pub fn sort_variables(&mut self, assignments: &Assignments) {
        let variables = &self.variables;
        self.sorted
            .sort_by_key(|&position| variables[position].size(assignments));
    }

    /// Whether every value of `tuple` is in the domain of the variable at its position.
    pub fn is_valid(&self, assignments: &Assignments, tuple: &[i32]) -> bool {
        self.variables
            .iter()
            .zip(tuple)
            .all(|(variable, &value)| variable.contains(assignments, value))
    }

    /// Whether the `index`-th variable in the sorted order supports its value in `tuple`.
    pub fn is_valid_at(&self, assignments: &Assignments, tuple: &[i32], index: usize) -> bool {
        let position = self.sorted[index];
        self.variables[position].contains(assignments, tuple[position])
    }
}

/// A [`ValidityChecker`] for scopes of 0/1 variables.
///
/// Since the variables are visited by increasing domain size, the instantiated variables come
/// first. Every value of an uninstantiated boolean variable is still in its domain, so the check
/// stops at the first one. This assumes the tuples only contain values which were in the initial
/// domains.
#[derive(Clone, Debug)]
pub struct FastBooleanValidityChecker {
    checker: ValidityChecker,
}

impl FastBooleanValidityChecker {
    pub fn new(variables: impl Into<Box<[IntVar]>>) -> FastBooleanValidityChecker {
        FastBooleanValidityChecker {
            checker: ValidityChecker::new(variables),
        }
    }

    pub fn arity(&self) -> usize {
        self.checker.arity()
    }

    pub fn sort_variables(&mut self, assignments: &Assignments) {
        self.checker.sort_variables(assignments)
    }

    pub fn is_valid(&self, assignments: &Assignments, tuple: &[i32]) -> bool {
        for &position in &self.checker.sorted {
            let Some(value) = self.checker.variables[position].fixed_value(assignments) else {
                break;
            };
            if value != tuple[position] {
                return false;
            }
        }
        true
    }

    pub fn is_valid_at(&self, assignments: &Assignments, tuple: &[i32], index: usize) -> bool {
        self.checker.is_valid_at(assignments, tuple, index)
    }
}
