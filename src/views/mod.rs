// ============================================================================
// ripple - Views Module
// Derived views: live, incrementally-maintained transformations
// ============================================================================
//
// Every view subscribes to its source's hub, keeps whatever state it needs
// in step with the event stream (most keep a materialized mirror, the
// projections compute on read), and republishes through a hub of its own so
// views observe views. The constructors accept any ListSource or DictSource,
// which is what makes chains possible: a mapped list is itself a list
// source, a filtered dictionary a dict source, and so on. Disposal cascades
// downstream through on_dispose.
// ============================================================================

use std::fmt::Debug;
use std::hash::Hash;

pub mod count;
pub mod filter;
pub mod group_by;
pub mod map_list;
pub mod map_values;
pub mod projection;
pub mod rekey;
pub mod source;

pub use count::{count, Countable, ObservedCount};
pub use filter::FilteredDict;
pub use group_by::GroupedList;
pub use map_list::MappedList;
pub use map_values::MappedValuesDict;
pub use projection::{DictProjection, ListProjection};
pub use rekey::RekeyedDict;
pub use source::{DictSource, ListSource};

/// A live, materialized element-map of a list-shaped source.
///
/// The transform runs once per arriving element; see [`MappedList`] for the
/// exact replay contract. Mapped lists are list sources themselves, so maps
/// stack.
pub fn map<S, T, U>(source: &S, transform: impl Fn(&T) -> U + 'static) -> MappedList<T, U>
where
    S: ListSource<T> + Clone + 'static,
    T: Clone + 'static,
    U: Clone + 'static,
{
    MappedList::new(source, transform)
}

/// A live dictionary view carrying derived keys computed from source keys.
///
/// The rekey function should be injective over the live key set; collisions
/// are reported and dropped, first entry kept.
pub fn select_key<S, KIn, KOut, V>(
    source: &S,
    rekey: impl Fn(&KIn) -> KOut + 'static,
) -> RekeyedDict<KIn, KOut, V>
where
    S: DictSource<KIn, V> + Clone + 'static,
    KIn: Eq + Hash + Clone + Debug + 'static,
    KOut: Eq + Hash + Clone + Debug + 'static,
    V: Clone + PartialEq + Debug + 'static,
{
    RekeyedDict::new(source, rekey)
}

/// A live dictionary view with the source's keys and transformed values.
pub fn select_value<S, K, VIn, VOut>(
    source: &S,
    transform: impl Fn(&VIn) -> VOut + 'static,
) -> MappedValuesDict<K, VIn, VOut>
where
    S: DictSource<K, VIn> + Clone + 'static,
    K: Eq + Hash + Clone + Debug + 'static,
    VIn: Clone + 'static,
    VOut: Clone + 'static,
{
    MappedValuesDict::new(source, transform)
}

/// A live dictionary view holding only the entries the predicate admits.
pub fn filter<S, K, V>(
    source: &S,
    predicate: impl Fn(&K, &V) -> bool + 'static,
) -> FilteredDict<K, V>
where
    S: DictSource<K, V> + Clone + 'static,
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    FilteredDict::new(source, predicate)
}

/// A live partition of a list-shaped source into per-key observable buckets.
pub fn group_by<S, G, T>(source: &S, group: impl Fn(&T) -> G + 'static) -> GroupedList<G, T>
where
    S: ListSource<T> + Clone + 'static,
    G: Eq + Hash + Clone + Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    GroupedList::new(source, group)
}
