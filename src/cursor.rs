//! Positions inside a map.
//!
//! A cursor points either at an element or at the end position, which sits
//! between the last and the first element. Stepping past either end lands on
//! the end position, and stepping once more wraps around.
//!
//! Cursors compare by the identity of the node they point at, not by key.

use std::fmt;
use std::marker::PhantomData;

use crate::compare::{Compare, Natural};
use crate::map::TreeMap;
use crate::node::{leftmost, predecessor, rightmost, successor, Link, Node};

/// A read-only position in a [`TreeMap`].
pub struct Cursor<'a, K, V> {
    root: Link<K, V>,
    current: Link<K, V>,
    marker: PhantomData<&'a Node<K, V>>,
}

/// A position in a [`TreeMap`] that can modify the map around it.
///
/// ```
/// use avl_treemap::TreeMap;
/// let mut map = TreeMap::new();
/// let mut cursor = map.cursor_end_mut();
/// for key in 0..5 {
///     cursor.emplace_hint(key, key * 10);
/// }
/// assert_eq!(cursor.key(), Some(&4));
///
/// let mut cursor = map.find_mut(&2);
/// assert_eq!(cursor.remove_current(), Some((2, 20)));
/// assert_eq!(cursor.key(), Some(&3));
/// ```
pub struct CursorMut<'a, K, V, C = Natural> {
    map: &'a mut TreeMap<K, V, C>,
    current: Link<K, V>,
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) fn new(root: Link<K, V>, current: Link<K, V>) -> Self {
        Self {
            root,
            current,
            marker: PhantomData,
        }
    }

    /// Returns true if the cursor is at the end position.
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the key of the element at the cursor.
    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(key, _)| key)
    }

    /// Returns the value of the element at the cursor.
    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_, value)| value)
    }

    /// Returns the key-value pair at the cursor.
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        self.current.map(|node_ptr| {
            let node = unsafe { &*node_ptr.as_ptr() };
            (&node.key, &node.value)
        })
    }

    /// Moves to the next element in ascending order.
    pub fn move_next(&mut self) {
        self.current = match self.current {
            None => self.root.map(leftmost),
            Some(node_ptr) => successor(node_ptr),
        };
    }

    /// Moves to the previous element in ascending order.
    pub fn move_prev(&mut self) {
        self.current = match self.current {
            None => self.root.map(rightmost),
            Some(node_ptr) => predecessor(node_ptr),
        };
    }
}

// Auto derived Clone seems to have an invalid type bound of K: Clone
impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.key_value()).finish()
    }
}

impl<'a, K, V, C> CursorMut<'a, K, V, C> {
    pub(crate) fn new(map: &'a mut TreeMap<K, V, C>, current: Link<K, V>) -> Self {
        Self { map, current }
    }

    /// Returns true if the cursor is at the end position.
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the key of the element at the cursor.
    pub fn key(&self) -> Option<&K> {
        self.current
            .map(|node_ptr| &unsafe { &*node_ptr.as_ptr() }.key)
    }

    /// Returns the value of the element at the cursor.
    pub fn value(&self) -> Option<&V> {
        self.current
            .map(|node_ptr| &unsafe { &*node_ptr.as_ptr() }.value)
    }

    /// Returns a mutable reference to the value at the cursor.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.current
            .map(|node_ptr| &mut unsafe { &mut *node_ptr.as_ptr() }.value)
    }

    /// Returns the key and a mutable reference to the value at the cursor.
    /// Keys are never mutable, since that could break the order.
    pub fn key_value_mut(&mut self) -> Option<(&K, &mut V)> {
        self.current.map(|node_ptr| {
            let node = unsafe { &mut *node_ptr.as_ptr() };
            (&node.key, &mut node.value)
        })
    }

    /// Converts the cursor into a mutable reference to the value at it,
    /// borrowing from the map for the cursor's whole lifetime.
    pub fn into_value_mut(self) -> Option<&'a mut V> {
        self.current
            .map(|node_ptr| &mut unsafe { &mut *node_ptr.as_ptr() }.value)
    }

    /// Moves to the next element in ascending order.
    pub fn move_next(&mut self) {
        self.current = match self.current {
            None => self.map.root.map(leftmost),
            Some(node_ptr) => successor(node_ptr),
        };
    }

    /// Moves to the previous element in ascending order.
    pub fn move_prev(&mut self) {
        self.current = match self.current {
            None => self.map.root.map(rightmost),
            Some(node_ptr) => predecessor(node_ptr),
        };
    }

    /// Returns a read-only cursor at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.map.root, self.current)
    }

    /// Removes the element at the cursor and moves to the element that
    /// followed it. Does nothing at the end position.
    ///
    /// If the removed node had two children, the following element's payload
    /// is moved into the removed element's node; the cursor then points at
    /// that node. References obtained before the call are gone either way,
    /// since they borrow from the cursor.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        let node_ptr = self.current?;
        let (key, value, next) = self.map.remove_node(node_ptr);
        self.current = next;
        Some((key, value))
    }

    /// Inserts a key-value pair using the cursor as a position hint, then
    /// moves to the element stored under `key`.
    ///
    /// When the element at the cursor precedes `key` and the element after it
    /// (if any) succeeds `key`, the new node is attached right there without
    /// searching, which makes ascending insertion sequences cheap. Any other
    /// hint, including the end position, falls back to an ordinary insert.
    /// Returns whether the pair was inserted.
    pub fn emplace_hint(&mut self, key: K, value: V) -> bool
    where
        C: Compare<K>,
    {
        let (node_ptr, inserted) = self.map.emplace_hint_node(self.current, key, value);
        self.current = Some(node_ptr);
        inserted
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for CursorMut<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.as_cursor().key_value()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::TreeMap;

    #[test]
    fn test_cursor_wraps_through_end() {
        let map = TreeMap::from([(1, 'a'), (2, 'b'), (3, 'c')]);

        let mut cursor = map.cursor_front();
        assert_eq!(cursor.key(), Some(&1));
        cursor.move_prev();
        assert!(cursor.is_end());
        assert_eq!(cursor, map.cursor_end());
        cursor.move_prev();
        assert_eq!(cursor.key_value(), Some((&3, &'c')));
        cursor.move_next();
        assert!(cursor.is_end());
        cursor.move_next();
        assert_eq!(cursor.value(), Some(&'a'));
    }

    #[test]
    fn test_cursor_identity() {
        let map = TreeMap::from([(1, ()), (2, ())]);
        let mut front = map.cursor_front();
        assert_ne!(front, map.find(&2));
        front.move_next();
        assert_eq!(front, map.find(&2));
        assert_eq!(map.find(&42), map.cursor_end());
    }

    #[test]
    fn test_remove_current_at_end() {
        let mut map = TreeMap::from([(1, ())]);
        let mut cursor = map.cursor_end_mut();
        assert!(cursor.remove_current().is_none());
        assert!(cursor.is_end());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_current_two_children() {
        //   2
        //  / \
        // 1   3
        let mut map = TreeMap::from([(2, "two"), (1, "one"), (3, "three")]);
        let mut cursor = map.find_mut(&2);
        assert_eq!(cursor.remove_current(), Some((2, "two")));
        assert_eq!(cursor.key(), Some(&3));
        assert_eq!(cursor.remove_current(), Some((3, "three")));
        assert!(cursor.is_end());
        map.check_consistency();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_emplace_hint_into_successor_slot() {
        //   20
        //  /  \
        // 10   30
        let mut map = TreeMap::from([(20, ()), (10, ()), (30, ())]);
        // 15 belongs between 10 and 20; 10 has no right child.
        let mut cursor = map.find_mut(&10);
        assert!(cursor.emplace_hint(15, ()));
        assert_eq!(cursor.key(), Some(&15));
        // 25 belongs between 20 and 30; 20 has a right child, so 25 goes below 30.
        let mut cursor = map.find_mut(&20);
        assert!(cursor.emplace_hint(25, ()));
        assert_eq!(cursor.key(), Some(&25));
        map.check_consistency();
        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, [10, 15, 20, 25, 30]);
    }

    #[test]
    fn test_mutate_values_in_place() {
        let mut map = TreeMap::from([(1, 10), (2, 20), (3, 30)]);

        let mut cursor = map.upper_bound_mut(&1);
        assert_eq!(cursor.key(), Some(&2));
        *cursor.value_mut().unwrap() += 1;
        cursor.move_next();
        if let Some((key, value)) = cursor.key_value_mut() {
            *value = key * 100;
        }
        cursor.move_next();
        assert!(cursor.is_end());
        assert!(cursor.value_mut().is_none());

        *map.find_mut(&1).into_value_mut().unwrap() = 0;
        assert!(map.upper_bound_mut(&3).into_value_mut().is_none());
        for (key, value) in map.ascending_mut() {
            *value += key;
        }
        let values: Vec<_> = map.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, [1, 23, 303]);

        let mut copy: TreeMap<i32, i32> = TreeMap::new();
        copy.extend(&map);
        assert_eq!(copy.get(&3), Some(&303));
        copy.check_consistency();
    }

    #[test]
    fn test_emplace_hint_poor_hint_falls_back() {
        let mut map = TreeMap::from([(1, 1), (5, 5), (9, 9)]);
        let mut cursor = map.find_mut(&9);
        assert!(cursor.emplace_hint(3, 3));
        assert_eq!(cursor.key(), Some(&3));
        assert!(!cursor.emplace_hint(5, 50));
        assert_eq!(cursor.value(), Some(&5));
        map.check_consistency();
        assert_eq!(map.len(), 4);
    }
}
