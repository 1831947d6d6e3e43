// ============================================================================
// ripple - RekeyedDict
// Materialized key-rekeying view over an observable dictionary
// ============================================================================
//
// Mirrors the source dictionary under derived keys computed from the source
// keys alone. The rekey function is expected to be injective over the live
// key set; a collision keeps the first entry, reports a violation, and drops
// the newcomer. Removals and updates cross-check the stored value against
// the event payload before touching the mirror, so a desync is reported
// instead of silently compounding.
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
// REKEYED DICT
// =============================================================================

struct RekeyedDictInner<KIn, KOut, V>
where
    KIn: Eq + Hash + Clone + Debug + 'static,
    KOut: Eq + Hash + Clone + Debug + 'static,
    V: Clone + PartialEq + Debug + 'static,
{
    source: Rc<dyn DictSource<KIn, V>>,
    rekey: Rc<dyn Fn(&KIn) -> KOut>,
    mirror: RefCell<HashMap<KOut, V>>,
    hub: OnceCell<Rc<DictHub<KOut, V>>>,
    upstream: RefCell<Option<Subscription>>,
    disposed: Cell<bool>,
}

/// A live dictionary view whose entries carry derived keys.
///
/// Created through [`crate::views::select_key`]. Values pass through
/// unchanged; only the key is recomputed, from the source key alone.
pub struct RekeyedDict<KIn, KOut, V>
where
    KIn: Eq + Hash + Clone + Debug + 'static,
    KOut: Eq + Hash + Clone + Debug + 'static,
    V: Clone + PartialEq + Debug + 'static,
{
    inner: Rc<RekeyedDictInner<KIn, KOut, V>>,
}

impl<KIn, KOut, V> Clone for RekeyedDict<KIn, KOut, V>
where
    KIn: Eq + Hash + Clone + Debug + 'static,
    KOut: Eq + Hash + Clone + Debug + 'static,
    V: Clone + PartialEq + Debug + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<KIn, KOut, V> RekeyedDict<KIn, KOut, V>
where
    KIn: Eq + Hash + Clone + Debug + 'static,
    KOut: Eq + Hash + Clone + Debug + 'static,
    V: Clone + PartialEq + Debug + 'static,
{
    pub(crate) fn new<S>(source: &S, rekey: impl Fn(&KIn) -> KOut + 'static) -> Self
    where
        S: DictSource<KIn, V> + Clone + 'static,
    {
        let rekey: Rc<dyn Fn(&KIn) -> KOut> = Rc::new(rekey);
        let mut seeded: HashMap<KOut, V> = HashMap::with_capacity(source.current_len());
        for (key, value) in source.snapshot() {
            let derived = rekey(&key);
            if let Some(kept) = seeded.get(&derived) {
                report::invariant(&Violation::KeyCollision {
                    op: "select_key.seed",
                    key: format!("{derived:?}"),
                    kept: format!("{kept:?}"),
                    rejected: format!("{value:?}"),
                });
                continue;
            }
            seeded.insert(derived, value);
        }

        let inner = Rc::new(RekeyedDictInner {
            source: Rc::new(source.clone()),
            rekey,
            mirror: RefCell::new(seeded),
            hub: OnceCell::new(),
            upstream: RefCell::new(None),
            disposed: Cell::new(false),
        });

        let weak_add: Weak<RekeyedDictInner<KIn, KOut, V>> = Rc::downgrade(&inner);
        let weak_remove = weak_add.clone();
        let weak_update = weak_add.clone();
        let weak_dispose = weak_add.clone();

        let sub = source.hub().subscribe(
            HubCallbacks::new()
                .on_add(move |change: &DictChange<KIn, V>| {
                    if let Some(inner) = weak_add.upgrade() {
                        inner.source_added(change);
                    }
                })
                .on_remove(move |change: &DictChange<KIn, V>| {
                    if let Some(inner) = weak_remove.upgrade() {
                        inner.source_removed(change);
                    }
                })
                .on_update(move |update: &DictUpdate<KIn, V>| {
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

    /// Clone out the value stored under the derived `key`.
    pub fn try_get(&self, key: &KOut) -> Option<V> {
        self.inner.mirror.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &KOut) -> bool {
        self.inner.mirror.borrow().contains_key(key)
    }

    /// Run a closure over the mirror without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&HashMap<KOut, V>) -> R) -> R {
        f(&self.inner.mirror.borrow())
    }

    /// Clone the mirror into a plain map.
    pub fn to_map(&self) -> HashMap<KOut, V> {
        self.inner.mirror.borrow().clone()
    }

    /// The upstream this view derives from. The handle is itself a
    /// [`DictSource`], so further views can be built on it.
    pub fn source(&self) -> Rc<dyn DictSource<KIn, V>> {
        self.inner.source.clone()
    }

    /// The view's own event hub, created lazily.
    pub fn events(&self) -> Rc<DictHub<KOut, V>> {
        self.inner
            .hub
            .get_or_init(|| Rc::new(EventHub::new()))
            .clone()
    }

    /// Subscribe the supplied callbacks to this view's hub.
    pub fn subscribe(
        &self,
        callbacks: HubCallbacks<DictChange<KOut, V>, DictUpdate<KOut, V>>,
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

impl<KIn, KOut, V> RekeyedDictInner<KIn, KOut, V>
where
    KIn: Eq + Hash + Clone + Debug + 'static,
    KOut: Eq + Hash + Clone + Debug + 'static,
    V: Clone + PartialEq + Debug + 'static,
{
    fn source_added(&self, change: &DictChange<KIn, V>) {
        let derived = (self.rekey)(&change.key);
        let kept = self.mirror.borrow().get(&derived).cloned();
        if let Some(kept) = kept {
            report::invariant(&Violation::KeyCollision {
                op: "select_key.on_add",
                key: format!("{derived:?}"),
                kept: format!("{kept:?}"),
                rejected: format!("{:?}", change.value),
            });
            return;
        }
        self.mirror
            .borrow_mut()
            .insert(derived.clone(), change.value.clone());
        if let Some(hub) = self.hub.get() {
            hub.publish_add(&DictChange {
                key: derived,
                value: change.value.clone(),
            });
        }
    }

    fn source_removed(&self, change: &DictChange<KIn, V>) {
        let derived = (self.rekey)(&change.key);
        let stored = self.mirror.borrow().get(&derived).cloned();
        match stored {
            None => {
                report::invariant(&Violation::MissingKey {
                    op: "select_key.on_remove",
                    key: format!("{derived:?}"),
                });
                return;
            }
            Some(stored) if stored != change.value => {
                report::invariant(&Violation::ValueDiverged {
                    op: "select_key.on_remove",
                    key: format!("{derived:?}"),
                    expected: format!("{:?}", change.value),
                    found: format!("{stored:?}"),
                });
                return;
            }
            Some(_) => {
                self.mirror.borrow_mut().remove(&derived);
            }
        }
        if let Some(hub) = self.hub.get() {
            hub.publish_remove(&DictChange {
                key: derived,
                value: change.value.clone(),
            });
        }
    }

    fn source_updated(&self, update: &DictUpdate<KIn, V>) {
        let derived = (self.rekey)(&update.key);
        let stored = self.mirror.borrow().get(&derived).cloned();
        match stored {
            None => {
                report::invariant(&Violation::MissingKey {
                    op: "select_key.on_update",
                    key: format!("{derived:?}"),
                });
                return;
            }
            Some(stored) if stored != update.old => {
                report::invariant(&Violation::ValueDiverged {
                    op: "select_key.on_update",
                    key: format!("{derived:?}"),
                    expected: format!("{:?}", update.old),
                    found: format!("{stored:?}"),
                });
                return;
            }
            Some(_) => {
                self.mirror
                    .borrow_mut()
                    .insert(derived.clone(), update.new.clone());
            }
        }
        if let Some(hub) = self.hub.get() {
            hub.publish_update(&DictUpdate {
                key: derived,
                old: update.old.clone(),
                new: update.new.clone(),
            });
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
