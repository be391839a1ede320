//! Value model, alias rule model, and declarative map loading for the remap engine.

pub mod load;
mod rules;
mod value;

pub use load::{LoadError, LoadRule};
pub use rules::*;
pub use value::{Record, Value, record, record_from_json};
