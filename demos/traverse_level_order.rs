use avl_treemap::{Order, TreeMap};
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG=avl_treemap=trace shows the rotations
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut map = TreeMap::new();
    map.insert(1, "1");
    map.insert(2, "2");
    map.insert(3, "3");
    map.insert(4, "4");
    map.insert(5, "5");
    map.insert(6, "6");

    println!("Level-order traversal:");
    let _ = map.traverse_level_order(|k, v| {
        println!("Key: {}, Value: {}", k, v);
    });

    println!("Descending:");
    let mut visited = 0;
    let _ = map.traverse_with(Order::Descending, |k, _| {
        print!("{k} ");
        visited += 1;
    });
    println!("({visited} keys)");
}
