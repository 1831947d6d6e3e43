// ============================================================================
// ripple - Core Module
// Event records, violation types, and the report channel
// ============================================================================

pub mod constants;
pub mod error;
pub(crate) mod report;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use error::Violation;
pub use types::{CountUpdate, DictChange, DictUpdate, ListChange, ListUpdate};
