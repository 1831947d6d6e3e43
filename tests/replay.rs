// ============================================================================
// ripple - Replay Equivalence Tests
// A view built at any point converges to the same state as one built at the
// start, because the event stream fully describes the mutation history
// ============================================================================

use ripple::collections::{ObservableDictionary, ObservableList};
use ripple::views;

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[derive(Clone, Debug)]
enum ListOp {
    Push(i32),
    Insert(usize, i32),
    RemoveAt(usize),
    Set(usize, i32),
    Move(usize, usize),
}

fn apply(list: &ObservableList<i32>, op: &ListOp) {
    match *op {
        ListOp::Push(v) => list.push(v),
        ListOp::Insert(i, v) => list.insert(i, v),
        ListOp::RemoveAt(i) => {
            list.remove_at(i);
        }
        ListOp::Set(i, v) => {
            list.set(i, v);
        }
        ListOp::Move(from, to) => list.move_item(from, to),
    }
}

fn scripted_ops() -> Vec<ListOp> {
    vec![
        ListOp::Push(3),
        ListOp::Push(1),
        ListOp::Insert(1, 7),
        ListOp::Push(7),
        ListOp::Set(0, 4),
        ListOp::RemoveAt(2),
        ListOp::Move(0, 2),
        ListOp::Push(9),
        ListOp::Insert(0, 2),
        ListOp::RemoveAt(3),
        ListOp::Set(2, 5),
        ListOp::Move(3, 0),
    ]
}

#[test]
fn early_and_late_mirrors_agree_with_the_source() {
    init_tracing();
    let list: ObservableList<i32> = ObservableList::new();
    let early = list.mirror();

    let ops = scripted_ops();
    let (head, tail) = ops.split_at(ops.len() / 2);

    for op in head {
        apply(&list, op);
    }

    // A view created mid-history seeds from the current contents and rides
    // the rest of the stream; it must land exactly where the early one does.
    let late = list.mirror();

    for op in tail {
        apply(&list, op);
    }

    assert_eq!(early.to_vec(), list.to_vec());
    assert_eq!(late.to_vec(), list.to_vec());
}

#[test]
fn mapped_view_matches_a_batch_recomputation() {
    init_tracing();
    let list: ObservableList<i32> = ObservableList::new();
    let doubled = views::map(&list, |n| n * 2);

    for op in &scripted_ops() {
        apply(&list, op);
        let expected: Vec<i32> = list.to_vec().iter().map(|n| n * 2).collect();
        assert_eq!(doubled.to_vec(), expected, "diverged after {op:?}");
    }
}

#[test]
fn chained_maps_match_a_batch_recomputation() {
    init_tracing();
    let list: ObservableList<i32> = ObservableList::new();
    let doubled = views::map(&list, |n| n * 2);
    let shifted = views::map(&doubled, |n| n + 1);

    for op in &scripted_ops() {
        apply(&list, op);
        let expected: Vec<i32> = list.to_vec().iter().map(|n| n * 2 + 1).collect();
        assert_eq!(shifted.to_vec(), expected, "diverged after {op:?}");
    }
}

#[test]
fn count_matches_length_after_every_op() {
    init_tracing();
    let list: ObservableList<i32> = ObservableList::new();
    let total = views::count(&list);

    for op in &scripted_ops() {
        apply(&list, op);
        assert_eq!(total.get(), list.len(), "diverged after {op:?}");
    }
    list.clear();
    assert_eq!(total.get(), 0);
}

#[test]
fn group_cardinality_is_preserved_throughout() {
    init_tracing();
    let list: ObservableList<i32> = ObservableList::new();
    let grouped = views::group_by(&list, |n| n % 3);

    for op in &scripted_ops() {
        apply(&list, op);
        let spread: usize = grouped.with(|groups| groups.values().map(|b| b.len()).sum());
        assert_eq!(spread, list.len(), "members lost or duplicated after {op:?}");
        grouped.with(|groups| {
            for (key, bucket) in groups {
                assert!(!bucket.is_empty(), "empty bucket {key} survived");
                bucket.with(|members| {
                    assert!(members.iter().all(|m| m % 3 == *key));
                });
            }
        });
    }
}

#[test]
fn filtered_view_matches_a_batch_filter() {
    init_tracing();
    let dict: ObservableDictionary<u32, i32> = ObservableDictionary::new();
    let positives = views::filter(&dict, |_, v| *v > 0);

    let script: Vec<(u32, Option<i32>)> = vec![
        (1, Some(5)),
        (2, Some(-3)),
        (3, Some(0)),
        (2, Some(4)),  // enters
        (1, Some(-1)), // leaves
        (3, None),     // removed while excluded
        (4, Some(9)),
        (1, None),     // removed while excluded
        (2, Some(-2)), // leaves again
    ];

    for (key, action) in script {
        match action {
            Some(value) => dict.upsert(key, value),
            None => {
                dict.remove(&key);
            }
        }
        let expected: std::collections::HashMap<u32, i32> = dict
            .to_map()
            .into_iter()
            .filter(|(_, v)| *v > 0)
            .collect();
        assert_eq!(positives.to_map(), expected);
    }
}

#[test]
fn rekeyed_and_value_mapped_views_match_batch_transforms() {
    init_tracing();
    let dict: ObservableDictionary<String, i32> = ObservableDictionary::new();
    let upper = views::select_key(&dict, |k: &String| k.to_uppercase());
    let squared = views::select_value(&dict, |v| v * v);

    dict.add("a".to_string(), 2);
    dict.add("b".to_string(), 3);
    dict.upsert("a".to_string(), 4);
    dict.remove(&"b".to_string());
    dict.add("c".to_string(), 5);

    let expected_upper: std::collections::HashMap<String, i32> = dict
        .to_map()
        .into_iter()
        .map(|(k, v)| (k.to_uppercase(), v))
        .collect();
    let expected_squared: std::collections::HashMap<String, i32> = dict
        .to_map()
        .into_iter()
        .map(|(k, v)| (k, v * v))
        .collect();

    assert_eq!(upper.to_map(), expected_upper);
    assert_eq!(squared.to_map(), expected_squared);
}

#[test]
fn dict_projections_track_the_store() {
    init_tracing();
    let dict: ObservableDictionary<&str, i32> = ObservableDictionary::new();
    let keys = dict.keys();
    let pairs = dict.pairs();

    dict.add("x", 1);
    dict.add("y", 2);
    dict.remove(&"x");
    dict.add("z", 3);
    dict.upsert("y", 20);

    assert_eq!(keys.to_vec(), vec!["y", "z"]);
    assert_eq!(pairs.to_vec(), vec![("y", 20), ("z", 3)]);
    assert_eq!(keys.len(), dict.len());
}
