mod trailed_bit_set;
mod trailed_integer;
mod trailed_values;

pub(crate) use trailed_bit_set::*;
pub(crate) use trailed_integer::*;
pub(crate) use trailed_values::*;
