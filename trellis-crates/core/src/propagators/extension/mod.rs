mod table;
mod validity;

pub use table::*;
pub use validity::*;
