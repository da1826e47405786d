use std::fmt::Display;
use std::marker::PhantomData;

use num::cast::AsPrimitive;

/// The mean of every term added so far, updated incrementally so that no sum can overflow.
#[derive(Debug, Clone, Copy)]
pub struct CumulativeMovingAverage<Term> {
    mean: f64,
    num_terms: u64,
    term: PhantomData<Term>,
}

impl<Term> Default for CumulativeMovingAverage<Term> {
    fn default() -> Self {
        CumulativeMovingAverage {
            mean: 0.0,
            num_terms: 0,
            term: PhantomData,
        }
    }
}

impl<Term: AsPrimitive<f64>> CumulativeMovingAverage<Term> {
    pub fn add_term(&mut self, new_term: Term) {
        self.num_terms += 1;
        self.mean += (new_term.as_() - self.mean) / self.num_terms as f64;
    }

    /// 0 if no term was added.
    pub fn value(&self) -> f64 {
        self.mean
    }
}

impl<Term> Display for CumulativeMovingAverage<Term> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mean)
    }
}

#[cfg(test)]
mod tests {
    use super::CumulativeMovingAverage;

    #[test]
    fn no_terms_average_to_zero() {
        let average: CumulativeMovingAverage<u64> = CumulativeMovingAverage::default();
        assert_eq!(0.0, average.value());
    }

    #[test]
    fn average_of_an_increasing_sequence() {
        let mut average = CumulativeMovingAverage::default();
        average.add_term(10_u64);
        assert_eq!(10.0, average.value());
        average.add_term(20);
        assert_eq!(15.0, average.value());
        average.add_term(30);
        assert_eq!(20.0, average.value());
    }
}
