// ============================================================================
// ripple - Violations
// Typed records for invariant violations surfaced through the report channel
// ============================================================================
//
// These are *not* control-flow errors. Per the error policy, an invariant
// violation (duplicate key, mirror desync, missing group) is reported through
// the logging channel and the offending operation becomes a no-op, leaving
// the container unmodified. Caller misuse (out-of-range indexer access)
// panics instead and never produces a Violation.
// ============================================================================

use thiserror::Error;

/// An invariant violation detected inside a container, view, or relay.
///
/// Carried through [`crate::core::report`] so every report has the operation
/// name plus enough context (key, index, conflicting values) to diagnose.
#[derive(Debug, Error)]
pub enum Violation {
    /// A listener with the same identity is already registered on the relay.
    #[error("{op}: listener already registered")]
    DuplicateListener { op: &'static str },

    /// `add` on a dictionary whose key is already present.
    #[error("{op}: duplicate key {key}")]
    DuplicateKey { op: &'static str, key: String },

    /// A key the mirror was expected to hold is missing (upstream/mirror desync).
    #[error("{op}: key {key} missing from mirror")]
    MissingKey { op: &'static str, key: String },

    /// A handler received an index its mirror cannot satisfy.
    #[error("{op}: index {index} out of range (len {len})")]
    IndexOutOfRange {
        op: &'static str,
        index: usize,
        len: usize,
    },

    /// Two distinct source keys mapped to the same derived key.
    #[error("{op}: derived key {key} collides (kept {kept}, rejected {rejected})")]
    KeyCollision {
        op: &'static str,
        key: String,
        kept: String,
        rejected: String,
    },

    /// The value stored in the mirror no longer matches the upstream pair.
    #[error("{op}: stored value for {key} diverged (expected {expected}, found {found})")]
    ValueDiverged {
        op: &'static str,
        key: String,
        expected: String,
        found: String,
    },

    /// A removed or updated member's group is not present in the grouped view.
    #[error("{op}: group {key} not found")]
    GroupNotFound { op: &'static str, key: String },

    /// A member was expected in a group bucket but a scan found no equal element.
    #[error("{op}: member not found in group {key}")]
    MemberNotFound { op: &'static str, key: String },

    /// A listener panicked during dispatch; remaining listeners still ran.
    #[error("{op}: listener panicked during dispatch")]
    ListenerPanic { op: &'static str },
}

// =============================================================================
// TESTS
// =============================================================================
