pub mod error;
mod filter;
mod model;
mod ownership;
mod principal;

pub use filter::*;
pub use model::*;
pub use ownership::*;
pub use principal::*;

/// Source tag assigned to readings which don't name their producer
pub static DEFAULT_READING_SOURCE: &str = "simulator";
