// ============================================================================
// ripple - Events Module
// Relay multicast, subscription tokens, and the four-channel hub
// ============================================================================
//
// The propagation vocabulary every container and derived view speaks:
//
// 1. Relay<E>: weak-referencing multicast dispatcher, one per channel
// 2. Subscription: revocation token, single binding or ordered group
// 3. EventHub<C, U>: the Add/Remove/Update/Dispose bundle per collection
// ============================================================================

pub mod hub;
pub mod relay;
pub mod subscription;

pub use hub::{DictHub, EventHub, HubCallbacks, ListHub};
pub use relay::{listener, Listener, Relay};
pub use subscription::Subscription;
