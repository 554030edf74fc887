pub mod value;

// Re-export types for convenience.
pub use crate::types::value::{TryFromValue, Value};
