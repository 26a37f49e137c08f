use avl_treemap::{ByFn, TreeMap};

fn main() {
    let mut map = TreeMap::new();
    map.insert(0, "zero");
    map.insert(1, "one");
    map.insert(2, "two");
    map.insert(2, "two");
    map.insert(3, "three");
    map.insert(4, "four");
    map.insert(5, "five");
    assert_eq!(map.get(&1), Some(&"one"));
    map.remove(&1);
    assert!(map.get(&1).is_none());

    for (k, v) in &map {
        println!("{k} => {v}");
    }

    let mut cursor = map.lower_bound_mut(&3);
    while let Some((k, v)) = cursor.remove_current() {
        println!("removed {k} => {v}");
    }
    assert_eq!(map.len(), 2);

    let mut by_len = TreeMap::with_comparator(ByFn(|a: &&str, b: &&str| {
        a.len().cmp(&b.len()).then(a.cmp(b))
    }));
    for word in ["pear", "fig", "banana", "kiwi"] {
        by_len.insert(word, word.len());
    }

    print!("{{ ");
    for (word, _) in &by_len {
        print!("{word}, ");
    }
    println!("}}");

    match by_len.at(&"apple") {
        Ok(len) => println!("apple has {len} letters"),
        Err(err) => println!("apple: {err}"),
    }
}
