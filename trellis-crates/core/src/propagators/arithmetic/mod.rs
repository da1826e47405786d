mod times;

pub use times::*;
