//! Benchmarks for ripple
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::cell::Cell;
use std::rc::Rc;

use ripple::collections::{ObservableDictionary, ObservableList};
use ripple::events::{listener, HubCallbacks, Relay};
use ripple::views;
use ripple::ListChange;

// =============================================================================
// RELAY BENCHMARKS
// =============================================================================

fn bench_relay_dispatch_one(c: &mut Criterion) {
    let relay: Relay<i32> = Relay::new();
    let sink = Rc::new(Cell::new(0));
    let sink_clone = sink.clone();
    let l = listener(move |n: &i32| sink_clone.set(*n));
    let _sub = relay.add_listener(&l).unwrap();

    c.bench_function("relay_dispatch_one_listener", |b| {
        b.iter(|| relay.dispatch(black_box(&7)))
    });
}

fn bench_relay_dispatch_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay_dispatch_fanout");
    for listeners in [4usize, 32, 256] {
        let relay: Relay<i32> = Relay::new();
        let sink = Rc::new(Cell::new(0));
        let mut keep = Vec::new();
        for _ in 0..listeners {
            let sink_clone = sink.clone();
            let l = listener(move |n: &i32| sink_clone.set(sink_clone.get() + n));
            keep.push((relay.add_listener(&l).unwrap(), l));
        }
        group.bench_with_input(BenchmarkId::from_parameter(listeners), &listeners, |b, _| {
            b.iter(|| relay.dispatch(black_box(&1)))
        });
    }
    group.finish();
}

fn bench_relay_subscribe_unsubscribe(c: &mut Criterion) {
    let relay: Relay<i32> = Relay::new();
    c.bench_function("relay_subscribe_unsubscribe", |b| {
        b.iter(|| {
            let l = listener(|_: &i32| {});
            let mut sub = relay.add_listener(&l).unwrap();
            sub.unsubscribe();
        })
    });
}

// =============================================================================
// CONTAINER BENCHMARKS
// =============================================================================

fn bench_list_push_no_subscribers(c: &mut Criterion) {
    c.bench_function("list_push_100_no_subscribers", |b| {
        b.iter_batched(
            ObservableList::new,
            |list| {
                for n in 0..100 {
                    list.push(black_box(n));
                }
                list
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_list_push_with_subscriber(c: &mut Criterion) {
    c.bench_function("list_push_100_with_subscriber", |b| {
        b.iter_batched(
            || {
                let list: ObservableList<i32> = ObservableList::new();
                let sink = Rc::new(Cell::new(0));
                let sink_clone = sink.clone();
                let sub = list.subscribe(HubCallbacks::new().on_add(
                    move |change: &ListChange<i32>| sink_clone.set(change.item),
                ));
                (list, sub, sink)
            },
            |(list, sub, sink)| {
                for n in 0..100 {
                    list.push(black_box(n));
                }
                (list, sub, sink)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_dict_upsert(c: &mut Criterion) {
    c.bench_function("dict_upsert_100", |b| {
        b.iter_batched(
            ObservableDictionary::new,
            |dict| {
                for n in 0..100u32 {
                    dict.upsert(black_box(n % 32), n);
                }
                dict
            },
            BatchSize::SmallInput,
        )
    });
}

// =============================================================================
// VIEW MAINTENANCE BENCHMARKS
// =============================================================================

fn bench_mapped_view_maintenance(c: &mut Criterion) {
    c.bench_function("mapped_view_100_mutations", |b| {
        b.iter_batched(
            || {
                let list: ObservableList<i32> = ObservableList::new();
                let view = views::map(&list, |n| n * 2);
                (list, view)
            },
            |(list, view)| {
                for n in 0..50 {
                    list.push(black_box(n));
                }
                for _ in 0..50 {
                    list.remove_at(0);
                }
                (list, view)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_group_by_maintenance(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by_maintenance");
    for size in [10usize, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let list: ObservableList<usize> = ObservableList::new();
                    let grouped = views::group_by(&list, |n| n % 8);
                    (list, grouped)
                },
                |(list, grouped)| {
                    for n in 0..size {
                        list.push(black_box(n));
                    }
                    (list, grouped)
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    relay_benches,
    bench_relay_dispatch_one,
    bench_relay_dispatch_fanout,
    bench_relay_subscribe_unsubscribe,
);

criterion_group!(
    container_benches,
    bench_list_push_no_subscribers,
    bench_list_push_with_subscriber,
    bench_dict_upsert,
);

criterion_group!(
    view_benches,
    bench_mapped_view_maintenance,
    bench_group_by_maintenance,
);

criterion_main!(relay_benches, container_benches, view_benches);
