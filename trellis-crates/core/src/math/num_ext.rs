//! Rounded integer division on top of [`num::Integer`].

use num::Integer;

pub(crate) trait NumExt {
    /// Division rounding towards positive infinity.
    fn div_ceil(self, other: Self) -> Self;

    /// Division rounding towards negative infinity, which differs from truncation for negative
    /// quotients.
    fn div_floor(self, other: Self) -> Self;
}

impl NumExt for i64 {
    fn div_ceil(self, other: Self) -> Self {
        Integer::div_ceil(&self, &other)
    }

    fn div_floor(self, other: Self) -> Self {
        Integer::div_floor(&self, &other)
    }
}
