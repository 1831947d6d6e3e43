// ============================================================================
// ripple - Collections Module
// The owning observable containers everything else derives from
// ============================================================================

pub mod dict;
pub mod list;

pub use dict::ObservableDictionary;
pub use list::ObservableList;
