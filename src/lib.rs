// ============================================================================
// ripple - Observable Collections for Rust
// ============================================================================
//
// Push-based, synchronous reactive collections. Mutate an observable list or
// dictionary and every mutation is published, in order, as a structured
// event through a four-channel hub (add / remove / update / dispose).
// Derived views subscribe to those events and keep their own state in step
// incrementally, then republish through hubs of their own, so views compose.
//
// Everything is single-threaded and immediate: by the time a mutating call
// returns, every subscriber has run.
// ============================================================================

//! Observable collections with incrementally-maintained derived views.
//!
//! # Quick start
//!
//! ```
//! use ripple::collections::ObservableList;
//! use ripple::views;
//!
//! let numbers = ObservableList::from_vec(vec![1, 2, 3]);
//!
//! // Derived views stay in step with the source, no refresh step.
//! let doubled = views::map(&numbers, |n| n * 2);
//! let by_parity = views::group_by(&numbers, |n| n % 2 == 0);
//! let total = views::count(&numbers);
//!
//! numbers.push(4);
//! assert_eq!(doubled.to_vec(), vec![2, 4, 6, 8]);
//! assert_eq!(by_parity.group(&true).unwrap().to_vec(), vec![2, 4]);
//! assert_eq!(total.get(), 4);
//!
//! // Disposing the source cascades through every view.
//! numbers.dispose();
//! assert!(doubled.is_disposed());
//! ```
//!
//! # Structure
//!
//! - [`collections`]: the owning containers, [`ObservableList`] and
//!   [`ObservableDictionary`]
//! - [`events`]: the propagation layer, [`Relay`], [`Subscription`] and the
//!   [`EventHub`] channel bundle
//! - [`views`]: derived views (map, rekey, value map, filter, group-by,
//!   count, projections)
//! - [`core`]: event record types, violation reporting
//!
//! # Error policy
//!
//! Out-of-range indexer access panics, like the standard containers.
//! Internal invariant violations (a mirror out of step with its upstream, a
//! key collision in a rekeyed view) are reported through `tracing` at error
//! level and the offending operation becomes a no-op. Listener panics are
//! caught, reported, and do not stop delivery to the remaining listeners.

pub mod collections;
pub mod core;
pub mod events;
pub mod views;

pub use collections::{ObservableDictionary, ObservableList};
pub use self::core::types::{CountUpdate, DictChange, DictUpdate, ListChange, ListUpdate};
pub use self::core::Violation;
pub use events::{DictHub, EventHub, HubCallbacks, ListHub, Relay, Subscription};
pub use views::{
    Countable, DictProjection, DictSource, FilteredDict, GroupedList, ListProjection, ListSource,
    MappedList, MappedValuesDict, ObservedCount, RekeyedDict,
};
