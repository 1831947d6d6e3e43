// ============================================================================
// ripple - End-to-End Scenarios
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use ripple::collections::{ObservableDictionary, ObservableList};
use ripple::events::HubCallbacks;
use ripple::views;
use ripple::{DictChange, ListChange};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[test]
fn removing_a_mapped_item_announces_exactly_one_removal() {
    init_tracing();
    let items = ObservableList::from_vec(vec![
        "item-1".to_string(),
        "item-2".to_string(),
        "item-3".to_string(),
    ]);
    let labels = views::map(&items, |name: &String| format!("Label({name})"));

    let removals = Rc::new(RefCell::new(Vec::new()));
    let removals_clone = removals.clone();
    let _sub = labels.subscribe(HubCallbacks::new().on_remove(
        move |c: &ListChange<String>| removals_clone.borrow_mut().push((c.index, c.item.clone())),
    ));

    items.remove_at(1);

    assert_eq!(*removals.borrow(), vec![(1, "Label(item-2)".to_string())]);
    assert_eq!(
        labels.to_vec(),
        vec!["Label(item-1)".to_string(), "Label(item-3)".to_string()]
    );
}

#[test]
fn fruit_stock_filter_follows_membership_transitions() {
    init_tracing();
    let stock: ObservableDictionary<String, u32> = ObservableDictionary::new();
    let a_fruits = views::filter(&stock, |name: &String, _| name.starts_with('a'));

    let log = Rc::new(RefCell::new(Vec::new()));
    let add_log = log.clone();
    let remove_log = log.clone();
    let _sub = a_fruits.subscribe(
        HubCallbacks::new()
            .on_add(move |c: &DictChange<String, u32>| {
                add_log.borrow_mut().push(format!("+{}", c.key))
            })
            .on_remove(move |c: &DictChange<String, u32>| {
                remove_log.borrow_mut().push(format!("-{}", c.key))
            }),
    );

    stock.add("apple".to_string(), 10);
    stock.add("banana".to_string(), 5);
    stock.add("avocado".to_string(), 3);
    stock.add("blueberry".to_string(), 20);

    assert_eq!(a_fruits.len(), 2);
    assert!(a_fruits.contains_key(&"apple".to_string()));
    assert!(a_fruits.contains_key(&"avocado".to_string()));
    assert_eq!(*log.borrow(), vec!["+apple", "+avocado"]);

    stock.remove(&"banana".to_string());
    stock.remove(&"apple".to_string());
    assert_eq!(*log.borrow(), vec!["+apple", "+avocado", "-apple"]);
    assert_eq!(a_fruits.len(), 1);
}

#[test]
fn inventory_pipeline_composes_views() {
    init_tracing();
    // A store inventory: dictionary of item name to quantity, with a
    // filtered low-stock board, a rekeyed display index, and a live count.
    let inventory: ObservableDictionary<String, u32> = ObservableDictionary::new();
    let low_stock = views::filter(&inventory, |_, qty| *qty < 5);
    let display = views::select_key(&inventory, |name: &String| format!("sku:{name}"));
    let distinct_items = views::count(&inventory);

    inventory.add("bolts".to_string(), 100);
    inventory.add("nuts".to_string(), 3);
    inventory.add("washers".to_string(), 7);

    assert_eq!(distinct_items.get(), 3);
    assert_eq!(low_stock.len(), 1);
    assert!(low_stock.contains_key(&"nuts".to_string()));
    assert_eq!(display.try_get(&"sku:bolts".to_string()), Some(100));

    // Selling down the washers moves them onto the low-stock board.
    inventory.upsert("washers".to_string(), 2);
    assert!(low_stock.contains_key(&"washers".to_string()));
    assert_eq!(display.try_get(&"sku:washers".to_string()), Some(2));

    // Restocking clears them off again.
    inventory.upsert("washers".to_string(), 50);
    assert!(!low_stock.contains_key(&"washers".to_string()));

    inventory.remove(&"nuts".to_string());
    assert_eq!(distinct_items.get(), 2);
    assert!(low_stock.is_empty());

    inventory.dispose();
    assert!(low_stock.is_disposed());
    assert!(display.is_disposed());
    assert!(distinct_items.is_disposed());
}

#[test]
fn roster_pipeline_groups_and_counts() {
    init_tracing();
    #[derive(Clone, Debug, PartialEq)]
    struct Player {
        name: &'static str,
        team: &'static str,
    }

    let roster: ObservableList<Player> = ObservableList::new();
    let by_team = views::group_by(&roster, |p: &Player| p.team);
    let names = views::map(&roster, |p: &Player| p.name);
    let headcount = views::count(&roster);

    roster.push(Player { name: "ada", team: "red" });
    roster.push(Player { name: "bob", team: "blue" });
    roster.push(Player { name: "cy", team: "red" });

    assert_eq!(by_team.len(), 2);
    assert_eq!(by_team.group(&"red").unwrap().len(), 2);
    assert_eq!(names.to_vec(), vec!["ada", "bob", "cy"]);
    assert_eq!(headcount.get(), 3);

    // A transfer is an in-place update; the grouped view migrates it.
    roster.set(1, Player { name: "bob", team: "red" });
    assert!(by_team.group(&"blue").is_none());
    assert_eq!(by_team.group(&"red").unwrap().len(), 3);
    assert_eq!(headcount.get(), 3, "transfers do not change headcount");

    roster.remove(&Player { name: "ada", team: "red" });
    assert_eq!(by_team.group(&"red").unwrap().len(), 2);
    assert_eq!(names.to_vec(), vec!["bob", "cy"]);
    assert_eq!(headcount.get(), 2);
}

#[test]
fn subscription_tokens_control_delivery_precisely() {
    init_tracing();
    let list: ObservableList<i32> = ObservableList::new();

    let a_calls = Rc::new(RefCell::new(0));
    let b_calls = Rc::new(RefCell::new(0));

    let a = a_calls.clone();
    let mut sub_a = list.subscribe(
        HubCallbacks::new().on_add(move |_: &ListChange<i32>| *a.borrow_mut() += 1),
    );
    let b = b_calls.clone();
    let _sub_b = list.subscribe(
        HubCallbacks::new().on_add(move |_: &ListChange<i32>| *b.borrow_mut() += 1),
    );

    list.push(1);
    sub_a.unsubscribe();
    list.push(2);

    assert_eq!(*a_calls.borrow(), 1);
    assert_eq!(*b_calls.borrow(), 2);
}
