// ============================================================================
// ripple - Report Channel
// Invariant violations and tolerated no-ops go through here, never panics
// ============================================================================
//
// The split mirrors the error policy:
// - `invariant` - a real bug signal (desync, collision, missing key). Logged
//   at ERROR with the full violation record; the caller then no-ops.
// - `disposed_op` - an operation on an already-released resource. Part of
//   the disposal contract, logged at DEBUG only.
// ============================================================================

use tracing::{debug, error};

use crate::core::error::Violation;

/// Report an invariant violation. The offending operation must leave the
/// container unmodified; this call is the only externally visible trace.
pub(crate) fn invariant(violation: &Violation) {
    error!(target: "ripple", %violation, "invariant violation");
}

/// Report an operation that arrived after dispose. Silent no-op by contract.
pub(crate) fn disposed_op(op: &'static str) {
    debug!(target: "ripple", op, "operation on disposed container ignored");
}

/// Report a listener panic caught during dispatch. The remaining listeners
/// in the same pass still run.
pub(crate) fn listener_panic(op: &'static str) {
    invariant(&Violation::ListenerPanic { op });
}
