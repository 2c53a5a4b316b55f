//! Domain layer: pure models, errors, and ports. No IO lives here.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DispatchError, DispatchResult};
