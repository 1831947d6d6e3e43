// ============================================================================
// ripple - Event Records
// The structured payloads published by observable containers and views
// ============================================================================
//
// Every mutation on an observable container publishes exactly one of these
// records through the owning hub. Listeners receive them by reference;
// containers clone items into the record at publish time.
//
// Index conventions for list events:
// - Add: the position the item occupies *after* the mutation.
// - Remove: the position the item occupied *before* removal.
// ============================================================================

// =============================================================================
// LIST EVENTS
// =============================================================================

/// An element added to or removed from a list, with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListChange<T> {
    pub index: usize,
    pub item: T,
}

/// An in-place replacement at a list index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListUpdate<T> {
    pub index: usize,
    pub old: T,
    pub new: T,
}

// =============================================================================
// DICTIONARY EVENTS
// =============================================================================

/// An entry added to or removed from a dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictChange<K, V> {
    pub key: K,
    pub value: V,
}

/// An in-place replacement of the value stored under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictUpdate<K, V> {
    pub key: K,
    pub old: V,
    pub new: V,
}

// =============================================================================
// SCALAR EVENTS
// =============================================================================

/// A cardinality change observed by a count view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountUpdate {
    pub old: usize,
    pub new: usize,
}

// =============================================================================
// TESTS
// =============================================================================
