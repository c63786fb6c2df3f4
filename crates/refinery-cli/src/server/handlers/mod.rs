//! API request handlers.

mod catalog;
mod data;
mod transformations;

pub use catalog::*;
pub use data::*;
pub use transformations::*;
