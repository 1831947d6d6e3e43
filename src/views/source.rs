// ============================================================================
// ripple - Upstream Sources
// What a derived view can be built on: containers and list/dict-shaped views
// ============================================================================
//
// A view needs three things from its upstream: the current contents to seed
// from, the hub to ride, and a cheap clonable handle to keep the upstream
// alive. Both owning containers provide those, and so does every view that
// is itself list- or dict-shaped, which is what lets views derive from
// views: map over a mapped list, filter over a value-mapped dictionary,
// count over anything.
// ============================================================================

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use crate::collections::dict::ObservableDictionary;
use crate::collections::list::ObservableList;
use crate::events::hub::{DictHub, ListHub};
use crate::views::filter::FilteredDict;
use crate::views::group_by::GroupedList;
use crate::views::map_list::MappedList;
use crate::views::map_values::MappedValuesDict;
use crate::views::projection::{DictProjection, ListProjection};
use crate::views::rekey::RekeyedDict;

// =============================================================================
// LIST-SHAPED SOURCES
// =============================================================================

/// An upstream a list-shaped view can derive from.
pub trait ListSource<T: Clone + 'static> {
    /// Current number of elements.
    fn current_len(&self) -> usize;

    /// Clone out the element at `index`.
    fn item_at(&self, index: usize) -> Option<T>;

    /// Clone the current contents, in order. Views seed from this.
    fn snapshot(&self) -> Vec<T>;

    /// The hub publishing this source's mutations.
    fn hub(&self) -> Rc<ListHub<T>>;
}

impl<T: Clone + 'static> ListSource<T> for ObservableList<T> {
    fn current_len(&self) -> usize {
        self.len()
    }

    fn item_at(&self, index: usize) -> Option<T> {
        self.get(index)
    }

    fn snapshot(&self) -> Vec<T> {
        self.to_vec()
    }

    fn hub(&self) -> Rc<ListHub<T>> {
        self.events()
    }
}

impl<T: Clone + 'static, U: Clone + 'static> ListSource<U> for MappedList<T, U> {
    fn current_len(&self) -> usize {
        self.len()
    }

    fn item_at(&self, index: usize) -> Option<U> {
        self.get(index)
    }

    fn snapshot(&self) -> Vec<U> {
        self.to_vec()
    }

    fn hub(&self) -> Rc<ListHub<U>> {
        self.events()
    }
}

impl<T: Clone + 'static, U: Clone + 'static> ListSource<U> for ListProjection<T, U> {
    fn current_len(&self) -> usize {
        self.len()
    }

    fn item_at(&self, index: usize) -> Option<U> {
        self.get(index)
    }

    fn snapshot(&self) -> Vec<U> {
        self.to_vec()
    }

    fn hub(&self) -> Rc<ListHub<U>> {
        self.events()
    }
}

impl<K, V, TOut> ListSource<TOut> for DictProjection<K, V, TOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
    TOut: Clone + 'static,
{
    fn current_len(&self) -> usize {
        self.len()
    }

    fn item_at(&self, index: usize) -> Option<TOut> {
        self.get(index)
    }

    fn snapshot(&self) -> Vec<TOut> {
        self.to_vec()
    }

    fn hub(&self) -> Rc<ListHub<TOut>> {
        self.events()
    }
}

// Upstream handles returned by a view's source() are sources themselves.
impl<T: Clone + 'static, S: ListSource<T> + ?Sized> ListSource<T> for Rc<S> {
    fn current_len(&self) -> usize {
        (**self).current_len()
    }

    fn item_at(&self, index: usize) -> Option<T> {
        (**self).item_at(index)
    }

    fn snapshot(&self) -> Vec<T> {
        (**self).snapshot()
    }

    fn hub(&self) -> Rc<ListHub<T>> {
        (**self).hub()
    }
}

// =============================================================================
// DICT-SHAPED SOURCES
// =============================================================================

/// An upstream a dictionary-shaped view can derive from.
pub trait DictSource<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    /// Current number of entries.
    fn current_len(&self) -> usize;

    /// Clone the current entries. Views seed from this.
    fn snapshot(&self) -> HashMap<K, V>;

    /// The hub publishing this source's mutations.
    fn hub(&self) -> Rc<DictHub<K, V>>;
}

impl<K, V> DictSource<K, V> for ObservableDictionary<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    fn current_len(&self) -> usize {
        self.len()
    }

    fn snapshot(&self) -> HashMap<K, V> {
        self.to_map()
    }

    fn hub(&self) -> Rc<DictHub<K, V>> {
        self.events()
    }
}

impl<KIn, KOut, V> DictSource<KOut, V> for RekeyedDict<KIn, KOut, V>
where
    KIn: Eq + Hash + Clone + Debug + 'static,
    KOut: Eq + Hash + Clone + Debug + 'static,
    V: Clone + PartialEq + Debug + 'static,
{
    fn current_len(&self) -> usize {
        self.len()
    }

    fn snapshot(&self) -> HashMap<KOut, V> {
        self.to_map()
    }

    fn hub(&self) -> Rc<DictHub<KOut, V>> {
        self.events()
    }
}

impl<K, VIn, VOut> DictSource<K, VOut> for MappedValuesDict<K, VIn, VOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    VIn: Clone + 'static,
    VOut: Clone + 'static,
{
    fn current_len(&self) -> usize {
        self.len()
    }

    fn snapshot(&self) -> HashMap<K, VOut> {
        self.to_map()
    }

    fn hub(&self) -> Rc<DictHub<K, VOut>> {
        self.events()
    }
}

impl<K, V> DictSource<K, V> for FilteredDict<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    fn current_len(&self) -> usize {
        self.len()
    }

    fn snapshot(&self) -> HashMap<K, V> {
        self.to_map()
    }

    fn hub(&self) -> Rc<DictHub<K, V>> {
        self.events()
    }
}

impl<G, T> DictSource<G, ObservableList<T>> for GroupedList<G, T>
where
    G: Eq + Hash + Clone + Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    fn current_len(&self) -> usize {
        self.len()
    }

    fn snapshot(&self) -> HashMap<G, ObservableList<T>> {
        self.with(|groups| groups.clone())
    }

    fn hub(&self) -> Rc<DictHub<G, ObservableList<T>>> {
        self.events()
    }
}

impl<K, V, S> DictSource<K, V> for Rc<S>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
    S: DictSource<K, V> + ?Sized,
{
    fn current_len(&self) -> usize {
        (**self).current_len()
    }

    fn snapshot(&self) -> HashMap<K, V> {
        (**self).snapshot()
    }

    fn hub(&self) -> Rc<DictHub<K, V>> {
        (**self).hub()
    }
}

// =============================================================================
// TESTS
// =============================================================================
