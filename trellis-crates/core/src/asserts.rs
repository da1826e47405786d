//! Leveled assertions for the internal invariants of the engine.
//!
//! The active level is fixed at compile time. Release builds only run the simple checks, tests
//! additionally run the moderate ones, and the `debug-checks` feature enables everything up to the
//! advanced level. Extreme checks are never compiled in by default since they typically re-derive
//! whole data structures.

#[cfg(all(not(test), not(feature = "debug-checks")))]
pub const TRELLIS_ASSERT_LEVEL_DEFINITION: u8 = TRELLIS_ASSERT_SIMPLE;

#[cfg(all(test, not(feature = "debug-checks")))]
pub const TRELLIS_ASSERT_LEVEL_DEFINITION: u8 = TRELLIS_ASSERT_MODERATE;

#[cfg(feature = "debug-checks")]
pub const TRELLIS_ASSERT_LEVEL_DEFINITION: u8 = TRELLIS_ASSERT_ADVANCED;

pub const TRELLIS_ASSERT_SIMPLE: u8 = 1;
pub const TRELLIS_ASSERT_MODERATE: u8 = 2;
pub const TRELLIS_ASSERT_ADVANCED: u8 = 3;
pub const TRELLIS_ASSERT_EXTREME: u8 = 4;

#[macro_export]
#[doc(hidden)]
macro_rules! trellis_assert_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::TRELLIS_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRELLIS_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trellis_assert_eq_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::TRELLIS_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRELLIS_ASSERT_SIMPLE {
            assert_eq!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trellis_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::asserts::TRELLIS_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRELLIS_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trellis_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::asserts::TRELLIS_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRELLIS_ASSERT_ADVANCED {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trellis_assert_extreme {
    ($($arg:tt)*) => {
        if $crate::asserts::TRELLIS_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRELLIS_ASSERT_EXTREME {
            assert!($($arg)*);
        }
    };
}
