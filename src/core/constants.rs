// ============================================================================
// ripple - Constants
// Tuning knobs for the relay slot storage
// ============================================================================

/// Initial slot capacity of a freshly created relay.
///
/// Most relays carry a handful of listeners (one per derived view), so the
/// starting allocation is deliberately small. Capacity doubles on overflow,
/// compacting dead slots in the same pass.
pub const RELAY_INITIAL_SLOTS: usize = 4;
