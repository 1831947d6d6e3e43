// ============================================================================
// ripple - Subscription
// Revocation token for relay registrations, single or grouped
// ============================================================================
//
// A binding owns the strong reference to its listener closure and a weak,
// type-erased handle to the owning relay. Revoking removes the slot by id;
// dropping without revoking just releases the listener, which the relay
// sweeps lazily. Either way no relay ever outlives into a dangling callback.
//
// Groups hold an ordered list of child subscriptions and revoke them all on
// release, the way an effect scope drains its effects.
// ============================================================================

use std::any::Any;
use std::mem;
use std::rc::Weak;

use crate::events::relay::AnyRelay;

// =============================================================================
// SUBSCRIPTION
// =============================================================================

enum State {
    /// Already revoked (or constructed empty).
    Released,

    /// One listener on one relay.
    Binding {
        relay: Weak<dyn AnyRelay>,
        slot_id: u64,
        /// Owns the listener `Rc`, type-erased. Dropping this is what lets
        /// the relay's weak slot die.
        keep_alive: Box<dyn Any>,
    },

    /// An ordered group of child subscriptions, revoked together.
    Group(Vec<Subscription>),
}

/// A revocable registration on one or more relays.
///
/// `unsubscribe` is idempotent: revoking twice, or revoking a binding whose
/// relay or listener is already gone, is a no-op, never an error. Dropping a
/// live subscription releases the listener without touching the relay; the
/// dead slot is swept on the next dispatch.
pub struct Subscription {
    state: State,
}

impl Subscription {
    pub(crate) fn binding(
        relay: Weak<dyn AnyRelay>,
        slot_id: u64,
        keep_alive: Box<dyn Any>,
    ) -> Self {
        Self {
            state: State::Binding {
                relay,
                slot_id,
                keep_alive,
            },
        }
    }

    /// An already-released subscription. Useful as a placeholder.
    pub fn released() -> Self {
        Self {
            state: State::Released,
        }
    }

    /// Bundle subscriptions so they revoke together, in order.
    pub fn group(children: Vec<Subscription>) -> Self {
        Self {
            state: State::Group(children),
        }
    }

    /// Whether this subscription still holds a registration.
    pub fn is_active(&self) -> bool {
        match &self.state {
            State::Released => false,
            State::Binding { .. } => true,
            State::Group(children) => children.iter().any(Subscription::is_active),
        }
    }

    /// Revoke the registration(s). Idempotent; safe to call from inside a
    /// dispatch in progress.
    pub fn unsubscribe(&mut self) {
        match mem::replace(&mut self.state, State::Released) {
            State::Released => {}
            State::Binding {
                relay,
                slot_id,
                keep_alive,
            } => {
                if let Some(relay) = relay.upgrade() {
                    relay.remove_slot(slot_id);
                }
                drop(keep_alive);
            }
            State::Group(mut children) => {
                for child in &mut children {
                    child.unsubscribe();
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::relay::{listener, Relay};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn unsubscribe_removes_the_slot() {
        let relay: Relay<()> = Relay::new();
        let calls = Rc::new(Cell::new(0));

        let calls_clone = calls.clone();
        let l = listener(move |_: &()| calls_clone.set(calls_clone.get() + 1));
        let mut sub = relay.add_listener(&l).unwrap();

        relay.dispatch(&());
        assert_eq!(calls.get(), 1);

        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(relay.live_count(), 0);

        relay.dispatch(&());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let relay: Relay<()> = Relay::new();
        let l = listener(|_: &()| {});
        let mut sub = relay.add_listener(&l).unwrap();

        sub.unsubscribe();
        sub.unsubscribe(); // must not panic or double-free
        assert!(!sub.is_active());

        // Revoking after the relay itself is gone is also a no-op.
        let l2 = listener(|_: &()| {});
        let mut orphan = relay.add_listener(&l2).unwrap();
        drop(relay);
        orphan.unsubscribe();
    }

    #[test]
    fn group_unsubscribes_all_children() {
        let relay: Relay<()> = Relay::new();
        let calls = Rc::new(Cell::new(0));

        let mut children = Vec::new();
        let mut keep = Vec::new();
        for _ in 0..3 {
            let calls_clone = calls.clone();
            let l = listener(move |_: &()| calls_clone.set(calls_clone.get() + 1));
            children.push(relay.add_listener(&l).unwrap());
            keep.push(l);
        }

        let mut group = Subscription::group(children);
        assert!(group.is_active());

        relay.dispatch(&());
        assert_eq!(calls.get(), 3);

        group.unsubscribe();
        assert!(!group.is_active());
        assert_eq!(relay.live_count(), 0);

        relay.dispatch(&());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn dropping_subscription_releases_listener_for_lazy_sweep() {
        let relay: Relay<()> = Relay::new();
        let calls = Rc::new(Cell::new(0));

        {
            let calls_clone = calls.clone();
            let l = listener(move |_: &()| calls_clone.set(calls_clone.get() + 1));
            let _sub = relay.add_listener(&l).unwrap();
            // Both the local Rc and the subscription drop here.
        }

        assert_eq!(relay.live_count(), 0);
        relay.dispatch(&());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn released_placeholder_is_inert() {
        let mut sub = Subscription::released();
        assert!(!sub.is_active());
        sub.unsubscribe();
    }
}
