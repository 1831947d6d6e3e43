// ============================================================================
// ripple - MappedValuesDict
// Materialized value-mapping view over an observable dictionary
// ============================================================================
//
// Keys pass through untouched; values are transformed once on arrival and
// once per replacement. Removals re-emit the stored mirror value, never a
// recomputation, matching the list map's contract.
// ============================================================================

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::core::error::Violation;
use crate::core::report;
use crate::core::types::{DictChange, DictUpdate};
use crate::events::hub::{DictHub, EventHub, HubCallbacks};
use crate::events::subscription::Subscription;
use crate::views::source::DictSource;

// =============================================================================
// MAPPED VALUES DICT
// =============================================================================

struct MappedValuesDictInner<K, VIn, VOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    VIn: Clone + 'static,
    VOut: Clone + 'static,
{
    source: Rc<dyn DictSource<K, VIn>>,
    transform: Rc<dyn Fn(&VIn) -> VOut>,
    mirror: RefCell<HashMap<K, VOut>>,
    hub: OnceCell<Rc<DictHub<K, VOut>>>,
    upstream: RefCell<Option<Subscription>>,
    disposed: Cell<bool>,
}

/// A live dictionary view with the source's keys and transformed values.
///
/// Created through [`crate::views::select_value`].
pub struct MappedValuesDict<K, VIn, VOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    VIn: Clone + 'static,
    VOut: Clone + 'static,
{
    inner: Rc<MappedValuesDictInner<K, VIn, VOut>>,
}

impl<K, VIn, VOut> Clone for MappedValuesDict<K, VIn, VOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    VIn: Clone + 'static,
    VOut: Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, VIn, VOut> MappedValuesDict<K, VIn, VOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    VIn: Clone + 'static,
    VOut: Clone + 'static,
{
    pub(crate) fn new<S>(source: &S, transform: impl Fn(&VIn) -> VOut + 'static) -> Self
    where
        S: DictSource<K, VIn> + Clone + 'static,
    {
        let transform: Rc<dyn Fn(&VIn) -> VOut> = Rc::new(transform);
        let seeded: HashMap<K, VOut> = source
            .snapshot()
            .into_iter()
            .map(|(key, value)| {
                let mapped = transform(&value);
                (key, mapped)
            })
            .collect();

        let inner = Rc::new(MappedValuesDictInner {
            source: Rc::new(source.clone()),
            transform,
            mirror: RefCell::new(seeded),
            hub: OnceCell::new(),
            upstream: RefCell::new(None),
            disposed: Cell::new(false),
        });

        let weak_add: Weak<MappedValuesDictInner<K, VIn, VOut>> = Rc::downgrade(&inner);
        let weak_remove = weak_add.clone();
        let weak_update = weak_add.clone();
        let weak_dispose = weak_add.clone();

        let sub = source.hub().subscribe(
            HubCallbacks::new()
                .on_add(move |change: &DictChange<K, VIn>| {
                    if let Some(inner) = weak_add.upgrade() {
                        inner.source_added(change);
                    }
                })
                .on_remove(move |change: &DictChange<K, VIn>| {
                    if let Some(inner) = weak_remove.upgrade() {
                        inner.source_removed(change);
                    }
                })
                .on_update(move |update: &DictUpdate<K, VIn>| {
                    if let Some(inner) = weak_update.upgrade() {
                        inner.source_updated(update);
                    }
                })
                .on_dispose(move || {
                    if let Some(inner) = weak_dispose.upgrade() {
                        Self {
                            inner,
                        }
                        .dispose();
                    }
                }),
        );
        *inner.upstream.borrow_mut() = Some(sub);

        Self { inner }
    }

    /// Number of mirrored entries.
    pub fn len(&self) -> usize {
        self.inner.mirror.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone out the transformed value stored under `key`.
    pub fn try_get(&self, key: &K) -> Option<VOut> {
        self.inner.mirror.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.mirror.borrow().contains_key(key)
    }

    /// Run a closure over the mirror without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&HashMap<K, VOut>) -> R) -> R {
        f(&self.inner.mirror.borrow())
    }

    /// Clone the mirror into a plain map.
    pub fn to_map(&self) -> HashMap<K, VOut> {
        self.inner.mirror.borrow().clone()
    }

    /// The upstream this view derives from. The handle is itself a
    /// [`DictSource`], so further views can be built on it.
    pub fn source(&self) -> Rc<dyn DictSource<K, VIn>> {
        self.inner.source.clone()
    }

    /// The view's own event hub, created lazily.
    pub fn events(&self) -> Rc<DictHub<K, VOut>> {
        self.inner
            .hub
            .get_or_init(|| Rc::new(EventHub::new()))
            .clone()
    }

    /// Subscribe the supplied callbacks to this view's hub.
    pub fn subscribe(
        &self,
        callbacks: HubCallbacks<DictChange<K, VOut>, DictUpdate<K, VOut>>,
    ) -> Subscription {
        self.events().subscribe(callbacks)
    }

    /// Dispose the view: fire its own `on_dispose`, release the mirror,
    /// detach from the source, clear its relay slots. Idempotent; also runs
    /// when the source disposes.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        if let Some(hub) = self.inner.hub.get() {
            hub.publish_dispose();
        }
        self.inner.mirror.borrow_mut().clear();
        if let Some(mut sub) = self.inner.upstream.borrow_mut().take() {
            sub.unsubscribe();
        }
        if let Some(hub) = self.inner.hub.get() {
            hub.clear_all();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<K, VIn, VOut> MappedValuesDictInner<K, VIn, VOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    VIn: Clone + 'static,
    VOut: Clone + 'static,
{
    fn source_added(&self, change: &DictChange<K, VIn>) {
        let mapped = (self.transform)(&change.value);
        {
            let mut mirror = self.mirror.borrow_mut();
            if mirror.contains_key(&change.key) {
                drop(mirror);
                report::invariant(&Violation::DuplicateKey {
                    op: "select_value.on_add",
                    key: format!("{:?}", change.key),
                });
                return;
            }
            mirror.insert(change.key.clone(), mapped.clone());
        }
        if let Some(hub) = self.hub.get() {
            hub.publish_add(&DictChange {
                key: change.key.clone(),
                value: mapped,
            });
        }
    }

    fn source_removed(&self, change: &DictChange<K, VIn>) {
        let removed = self.mirror.borrow_mut().remove(&change.key);
        let Some(stored) = removed else {
            report::invariant(&Violation::MissingKey {
                op: "select_value.on_remove",
                key: format!("{:?}", change.key),
            });
            return;
        };
        if let Some(hub) = self.hub.get() {
            hub.publish_remove(&DictChange {
                key: change.key.clone(),
                value: stored,
            });
        }
    }

    fn source_updated(&self, update: &DictUpdate<K, VIn>) {
        let mapped_new = (self.transform)(&update.new);
        let replaced = {
            let mut mirror = self.mirror.borrow_mut();
            mirror
                .get_mut(&update.key)
                .map(|stored| std::mem::replace(stored, mapped_new.clone()))
        };
        let Some(mapped_old) = replaced else {
            report::invariant(&Violation::MissingKey {
                op: "select_value.on_update",
                key: format!("{:?}", update.key),
            });
            return;
        };
        if let Some(hub) = self.hub.get() {
            hub.publish_update(&DictUpdate {
                key: update.key.clone(),
                old: mapped_old,
                new: mapped_new,
            });
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::dict::ObservableDictionary;

    #[test]
    fn values_are_transformed_keys_pass_through() {
        let dict: ObservableDictionary<&str, i32> = ObservableDictionary::new();
        let view = MappedValuesDict::new(&dict, |n| n.to_string());

        dict.add("a", 1);
        dict.add("b", 2);

        assert_eq!(view.try_get(&"a"), Some("1".to_string()));
        assert_eq!(view.try_get(&"b"), Some("2".to_string()));
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn update_recomputes_and_emits_old_mirror_value() {
        let dict = ObservableDictionary::from_iter([("a", 1)]);
        let view = MappedValuesDict::new(&dict, |n| n * 10);

        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();
        let _sub = view.subscribe(HubCallbacks::new().on_update(
            move |u: &DictUpdate<&str, i32>| log_clone.borrow_mut().push((u.key, u.old, u.new)),
        ));

        dict.upsert("a", 2);
        assert_eq!(*log.borrow(), vec![("a", 10, 20)]);
        assert_eq!(view.try_get(&"a"), Some(20));
    }

    #[test]
    fn removal_reemits_the_stored_value() {
        // A stateful transform: the removal must carry the value announced
        // on add, not a recomputation.
        let counter = Rc::new(Cell::new(0));
        let dict: ObservableDictionary<&str, i32> = ObservableDictionary::new();

        let counter_clone = counter.clone();
        let view = MappedValuesDict::new(&dict, move |n: &i32| {
            counter_clone.set(counter_clone.get() + 1);
            (*n, counter_clone.get())
        });

        let removed = Rc::new(RefCell::new(Vec::new()));
        let removed_clone = removed.clone();
        let _sub = view.subscribe(HubCallbacks::new().on_remove(
            move |c: &DictChange<&str, (i32, i32)>| removed_clone.borrow_mut().push(c.value),
        ));

        dict.add("a", 5);
        dict.remove(&"a");

        assert_eq!(*removed.borrow(), vec![(5, 1)]);
        assert!(view.is_empty());
    }

    #[test]
    fn dispose_cascades_from_the_source() {
        let dict = ObservableDictionary::from_iter([("a", 1)]);
        let view = MappedValuesDict::new(&dict, |n| *n);

        dict.dispose();
        assert!(view.is_disposed());
        assert!(view.is_empty());
    }
}
