use avl_treemap::{ByFn, Error, Order, Reverse, TreeMap};

fn keys<K: Copy, V, C>(map: &TreeMap<K, V, C>, order: Order) -> Vec<K> {
    map.traverse(order).map(|(k, _)| *k).collect()
}

#[test]
fn insert_then_traverse_all_orders() {
    let mut map = TreeMap::new();
    for key in [5, 3, 8, 1, 4, 7, 9] {
        assert!(map.insert(key, key * 100));
    }
    assert_eq!(map.len(), 7);
    assert_eq!(keys(&map, Order::Ascending), [1, 3, 4, 5, 7, 8, 9]);
    assert_eq!(keys(&map, Order::Descending), [9, 8, 7, 5, 4, 3, 1]);
    assert_eq!(keys(&map, Order::LevelOrder), [5, 3, 8, 1, 4, 7, 9]);

    assert_eq!(map.erase(&5), 1);
    assert_eq!(map.erase(&5), 0);
    assert_eq!(keys(&map, Order::Ascending), [1, 3, 4, 7, 8, 9]);
    assert_eq!(map.at(&100), Err(Error::KeyNotFound));
}

#[test]
fn ascending_inserts_rebalance_into_perfect_tree() {
    let mut map = TreeMap::new();
    for key in 1..=7 {
        map.insert(key, ());
    }
    assert_eq!(keys(&map, Order::LevelOrder), [4, 2, 6, 1, 3, 5, 7]);
}

#[test]
fn duplicate_insert_keeps_first_value() {
    let mut map = TreeMap::new();
    assert!(map.insert("k", 1));
    let (cursor, inserted) = map.emplace("k", 2);
    assert!(!inserted);
    assert_eq!(cursor.value(), Some(&1));
    assert_eq!(map.len(), 1);
}

#[test]
fn empty_map_edges() {
    let mut map: TreeMap<i32, i32> = TreeMap::new();
    assert!(map.is_empty());
    assert!(map.find(&1).is_end());
    assert_eq!(map.lower_bound(&1), map.cursor_end());
    assert_eq!(map.erase(&1), 0);
    assert_eq!(map.erase_range(0..10), 0);
    assert!(map.pop_first().is_none());
    assert_eq!(map.traverse(Order::LevelOrder).count(), 0);
    map.clear();
    assert!(map.is_empty());
}

#[test]
fn mutable_traversal_updates_values() {
    let mut map: TreeMap<u32, u32> = (1..=10).map(|k| (k, 0)).collect();
    for (key, value) in map.traverse_mut(Order::LevelOrder) {
        *value = key * key;
    }
    assert!(map.iter().all(|(k, v)| *v == k * k));
    *map.at_mut(&3).unwrap() = 0;
    assert_eq!(map.get(&3), Some(&0));
}

#[test]
fn traverse_with_collects_through_callback() {
    let map = TreeMap::from([(2, "b"), (1, "a"), (3, "c")]);
    let mut seen = String::new();
    let _ = map.traverse_descending(|_, v| seen.push_str(v));
    assert_eq!(seen, "cba");

    let mut total = 0;
    let _ = map.traverse_with(Order::Ascending, |k, _| total += k);
    assert_eq!(total, 6);
}

#[test]
fn custom_comparators() {
    let mut map = TreeMap::with_comparator(Reverse);
    map.extend([(1, 'a'), (3, 'c'), (2, 'b')]);
    assert_eq!(keys(&map, Order::Ascending), [3, 2, 1]);
    assert_eq!(map.pop_first(), Some((3, 'c')));

    let mut map = TreeMap::with_comparator(ByFn(|a: &i32, b: &i32| a.abs().cmp(&b.abs())));
    assert!(map.insert(-2, "minus two"));
    assert!(!map.insert(2, "two"));
    assert!(map.insert(1, "one"));
    assert_eq!(map.get(&2), Some(&"minus two"));
    assert_eq!(keys(&map, Order::Ascending), [1, -2]);
}

#[test]
fn cursor_walk_and_hinted_inserts() {
    let mut map = TreeMap::new();
    {
        let mut cursor = map.cursor_end_mut();
        for key in (0..100).step_by(10) {
            assert!(cursor.emplace_hint(key, ()));
        }
        // Hint at 50 for 55 lands between 50 and 60.
        let mut cursor = map.find_mut(&50);
        assert!(cursor.emplace_hint(55, ()));
        cursor.move_next();
        assert_eq!(cursor.key(), Some(&60));
    }
    assert_eq!(map.len(), 11);

    let mut cursor = map.cursor_end();
    cursor.move_prev();
    assert_eq!(cursor.key(), Some(&90));
    cursor.move_next();
    assert!(cursor.is_end());
}

#[test]
fn batch_insert_all_or_nothing_success() {
    let mut map = TreeMap::from([(1, 1)]);
    assert_eq!(map.try_extend((0..50).map(|k| (k, k))), Ok(49));
    assert_eq!(map.len(), 50);
    assert_eq!(map.try_extend(std::iter::empty()), Ok(0));
    assert!(map.iter().map(|(k, _)| *k).eq(0..50));
}

#[test]
fn into_iter_both_ends() {
    let map: TreeMap<_, _> = (0..5).map(|k| (k, k.to_string())).collect();
    let mut iter = map.into_iter();
    assert_eq!(iter.len(), 5);
    assert_eq!(iter.next(), Some((0, String::from("0"))));
    assert_eq!(iter.next_back(), Some((4, String::from("4"))));
    assert_eq!(iter.map(|(k, _)| k).collect::<Vec<_>>(), [1, 2, 3]);
}

#[test]
fn debug_formats_as_map() {
    let map = TreeMap::from([(2, 'b'), (1, 'a')]);
    assert_eq!(format!("{map:?}"), "{1: 'a', 2: 'b'}");
}
