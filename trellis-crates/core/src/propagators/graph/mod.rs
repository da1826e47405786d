mod arborescence;
mod k_connected_components;

pub use arborescence::*;
pub use k_connected_components::*;
