//! The map type: lookups, inserts, removals and the structural invariants.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Bound, RangeBounds};
use std::ptr::NonNull;

use tracing::debug;

use crate::compare::{Compare, Natural};
use crate::cursor::{Cursor, CursorMut};
use crate::error::{Error, Result};
use crate::node::{leftmost, rightmost, successor, Link, LinkPtr, Node, NodePtr};

/// An ordered map implemented with an AVL tree.
///
/// Keys are kept in the order given by the comparator `C`, which defaults to
/// [`Natural`] (the key's [`Ord`] implementation). Inserting a key that is
/// already present leaves the map unchanged.
///
/// ```
/// use avl_treemap::TreeMap;
/// let mut map = TreeMap::new();
/// map.insert(0, "zero");
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(map.get(&1), Some(&"one"));
/// map.remove(&1);
/// assert!(map.get(&1).is_none());
/// ```
pub struct TreeMap<K, V, C = Natural> {
    pub(crate) root: Link<K, V>,
    pub(crate) num_nodes: usize,
    pub(crate) comparator: C,
    marker: PhantomData<Box<Node<K, V>>>,
}

// Where a key lives, or the empty link it would be attached to.
enum Slot<K, V> {
    Occupied(NodePtr<K, V>),
    Vacant(Link<K, V>, LinkPtr<K, V>),
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K, V> TreeMap<K, V> {
    /// Creates an empty map ordered by the key's [`Ord`] implementation.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<K, V, C> TreeMap<K, V, C> {
    /// Creates an empty map ordered by `comparator`.
    /// No memory is allocated until the first item is inserted.
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            root: None,
            num_nodes: 0,
            comparator,
            marker: PhantomData,
        }
    }

    /// Returns the comparator that orders the keys.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        if self.num_nodes > 0 {
            debug!(nodes = self.num_nodes, "clearing map");
        }
        self.destroy_all();
    }

    /// Returns the first key-value pair in the map.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root_ptr| {
            let node = unsafe { &*leftmost(root_ptr).as_ptr() };
            (&node.key, &node.value)
        })
    }

    /// Returns the last key-value pair in the map.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root_ptr| {
            let node = unsafe { &*rightmost(root_ptr).as_ptr() };
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the first element in the map.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let node_ptr = leftmost(self.root?);
        let (key, value, _) = self.remove_node(node_ptr);
        Some((key, value))
    }

    /// Removes and returns the last element in the map.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let node_ptr = rightmost(self.root?);
        let (key, value, _) = self.remove_node(node_ptr);
        Some((key, value))
    }

    /// Returns a cursor at the first element, or at the end if the map is empty.
    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.root, self.root.map(leftmost))
    }

    /// Returns a mutable cursor at the first element, or at the end if the map is empty.
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, K, V, C> {
        let current = self.root.map(leftmost);
        CursorMut::new(self, current)
    }

    /// Returns a cursor at the end position, one past the last element.
    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        Cursor::new(self.root, None)
    }

    /// Returns a mutable cursor at the end position, one past the last element.
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, K, V, C> {
        CursorMut::new(self, None)
    }

    /// Exchanges the contents of two maps, comparators included.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Moves all elements out into a new map, leaving `self` empty.
    pub fn take(&mut self) -> Self
    where
        C: Clone,
    {
        let empty = Self::with_comparator(self.comparator.clone());
        mem::replace(self, empty)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find_node(key)
            .map(|node_ptr| &unsafe { &*node_ptr.as_ptr() }.value)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find_node(key)
            .map(|node_ptr| &mut unsafe { &mut *node_ptr.as_ptr() }.value)
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find_node(key).map(|node_ptr| {
            let node = unsafe { &*node_ptr.as_ptr() };
            (&node.key, &node.value)
        })
    }

    /// Returns a reference to the value corresponding to the key,
    /// or [`Error::KeyNotFound`] if the key is absent.
    ///
    /// ```
    /// use avl_treemap::{Error, TreeMap};
    /// let map = TreeMap::from([(1, "a")]);
    /// assert_eq!(map.at(&1), Ok(&"a"));
    /// assert_eq!(map.at(&2), Err(Error::KeyNotFound));
    /// ```
    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value corresponding to the key,
    /// or [`Error::KeyNotFound`] if the key is absent.
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns true if the map contains a value for the key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find_node(key).is_some()
    }

    /// Returns the number of elements with the given key, which is 0 or 1.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        usize::from(self.contains_key(key))
    }

    /// Returns a cursor at the element with the given key, or at the end.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        Cursor::new(self.root, self.find_node(key))
    }

    /// Returns a mutable cursor at the element with the given key, or at the end.
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, C>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let current = self.find_node(key);
        CursorMut::new(self, current)
    }

    /// Returns a cursor at the first element whose key is not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        Cursor::new(self.root, self.lower_bound_node(key))
    }

    /// Returns a mutable cursor at the first element whose key is not less than `key`.
    pub fn lower_bound_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, C>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let current = self.lower_bound_node(key);
        CursorMut::new(self, current)
    }

    /// Returns a cursor at the first element whose key is greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        Cursor::new(self.root, self.upper_bound_node(key))
    }

    /// Returns a mutable cursor at the first element whose key is greater than `key`.
    pub fn upper_bound_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, C>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let current = self.upper_bound_node(key);
        CursorMut::new(self, current)
    }

    /// Returns the pair `(lower_bound(key), upper_bound(key))`.
    /// The two cursors are equal iff the key is absent.
    pub fn equal_range<Q>(&self, key: &Q) -> (Cursor<'_, K, V>, Cursor<'_, K, V>)
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        (self.lower_bound(key), self.upper_bound(key))
    }

    /// Inserts a key-value pair into the map.
    /// Returns whether the pair was inserted; an existing entry for the key
    /// is left untouched and `value` is dropped.
    pub fn insert(&mut self, key: K, value: V) -> bool
    where
        C: Compare<K>,
    {
        self.emplace(key, value).1
    }

    /// Inserts a key-value pair into the map.
    ///
    /// Returns a cursor at the element stored under `key` and whether it was
    /// newly inserted. If the key was already present the map is unchanged.
    pub fn emplace(&mut self, key: K, value: V) -> (CursorMut<'_, K, V, C>, bool)
    where
        C: Compare<K>,
    {
        let (node_ptr, inserted) = self.emplace_infallible(key, value);
        (CursorMut::new(self, Some(node_ptr)), inserted)
    }

    /// Like [`emplace`](Self::emplace), but reports allocation failure instead
    /// of aborting. On failure the map is unchanged.
    pub fn try_emplace(&mut self, key: K, value: V) -> Result<(CursorMut<'_, K, V, C>, bool)>
    where
        C: Compare<K>,
    {
        let (node_ptr, inserted) =
            self.emplace_node(key, |parent, key| Node::try_create(parent, key, value))?;
        Ok((CursorMut::new(self, Some(node_ptr)), inserted))
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `V::default()` first if the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
        C: Compare<K>,
    {
        let placed = self.emplace_node(key, |parent, key| {
            Ok::<_, Infallible>(Node::create(parent, key, V::default()))
        });
        let (node_ptr, _) = match placed {
            Ok(placed) => placed,
            Err(never) => match never {},
        };
        &mut unsafe { &mut *node_ptr.as_ptr() }.value
    }

    /// Inserts all pairs of `iter` that are not yet present, all or nothing.
    ///
    /// Pairs are first staged in a separate tree; only when every node has
    /// been allocated are they moved into `self`. If an allocation fails the
    /// staged nodes are released and `self` is exactly as before the call.
    /// As with single inserts, the first pair for a key wins.
    /// Returns the number of inserted pairs.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        C: Compare<K> + Clone,
    {
        let mut staging = Self::with_comparator(self.comparator.clone());
        for (key, value) in iter {
            if self.find_node(&key).is_some() {
                continue;
            }
            if let Err(err) = staging.emplace_node(key, |parent, key| Node::try_create(parent, key, value)) {
                debug!(staged = staging.len(), error = %err, "rolling back batch insert");
                return Err(err);
            }
        }

        let added = staging.len();
        while let Some(node_ptr) = staging.detach_first() {
            self.link_node(node_ptr);
        }
        debug!(added, "committed batch insert");
        Ok(added)
    }

    /// Removes a key from the map.
    /// Returns the value at the key if the key was previously in the map.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map.
    /// Returns the stored key and value if the key was previously in the map.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let node_ptr = self.find_node(key)?;
        let (key, value, _) = self.remove_node(node_ptr);
        Some((key, value))
    }

    /// Removes a key from the map.
    /// Returns the number of removed elements, which is 0 or 1.
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        usize::from(self.remove_entry(key).is_some())
    }

    /// Removes every element whose key lies in `range`.
    /// Returns the number of removed elements.
    ///
    /// ```
    /// use avl_treemap::TreeMap;
    /// let mut map: TreeMap<i32, i32> = (0..10).map(|k| (k, k)).collect();
    /// assert_eq!(map.erase_range(3..7), 4);
    /// assert_eq!(map.erase_range(20..), 0);
    /// assert_eq!(map.len(), 6);
    /// ```
    pub fn erase_range<Q, R>(&mut self, range: R) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
        R: RangeBounds<Q>,
    {
        let mut current = match range.start_bound() {
            Bound::Included(key) => self.lower_bound_node(key),
            Bound::Excluded(key) => self.upper_bound_node(key),
            Bound::Unbounded => self.root.map(leftmost),
        };

        let mut erased = 0;
        while let Some(node_ptr) = current {
            let key: &Q = unsafe { node_ptr.as_ref().key.borrow() };
            let in_range = match range.end_bound() {
                Bound::Included(last) => self.comparator.compare(key, last) != Ordering::Greater,
                Bound::Excluded(last) => self.comparator.compare(key, last) == Ordering::Less,
                Bound::Unbounded => true,
            };
            if !in_range {
                break;
            }
            // Each removal may restructure the tree, so continue from
            // the position it reports rather than a precomputed one.
            let (_, _, next) = self.remove_node(node_ptr);
            current = next;
            erased += 1;
        }
        erased
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self)
    where
        C: Compare<K>,
    {
        use crate::balance::height;

        unsafe {
            // Check root link
            if let Some(root_node_ptr) = self.root {
                assert!(root_node_ptr.as_ref().parent.is_none());
            }

            // Check tree nodes
            let mut num_nodes = 0;
            self.preorder(|node_ptr| {
                let node = node_ptr.as_ref();

                // Check link for left child node
                if let Some(left_ptr) = node.left {
                    assert!(left_ptr.as_ref().parent == Some(node_ptr));
                    assert_eq!(
                        self.comparator.compare(&left_ptr.as_ref().key, &node.key),
                        Ordering::Less
                    );
                }

                // Check link for right child node
                if let Some(right_ptr) = node.right {
                    assert!(right_ptr.as_ref().parent == Some(node_ptr));
                    assert_eq!(
                        self.comparator.compare(&right_ptr.as_ref().key, &node.key),
                        Ordering::Greater
                    );
                }

                // Check height
                let left_height = height(node.left);
                let right_height = height(node.right);
                assert_eq!(node.height, 1 + left_height.max(right_height));

                // Check AVL condition (nearly balance)
                assert!((left_height - right_height).abs() <= 1);

                num_nodes += 1;
            });

            // Check number of nodes
            assert_eq!(num_nodes, self.num_nodes);

            // Check global order
            let mut previous: Option<&K> = None;
            self.inorder(|node_ptr| {
                let key = &(*node_ptr.as_ptr()).key;
                if let Some(previous) = previous {
                    assert_eq!(self.comparator.compare(previous, key), Ordering::Less);
                }
                previous = Some(key);
            });
        }
    }

    #[cfg(test)]
    pub(crate) fn height(&self) -> isize {
        crate::balance::height(self.root)
    }

    fn find_node<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                match self.comparator.compare(key, node_ptr.as_ref().key.borrow()) {
                    Ordering::Equal => break,
                    Ordering::Less => node_ptr.as_ref().left,
                    Ordering::Greater => node_ptr.as_ref().right,
                }
            }
        }
        current
    }

    fn lower_bound_node<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let mut bound = None;
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                let node_key: &Q = node_ptr.as_ref().key.borrow();
                if self.comparator.compare(node_key, key) == Ordering::Less {
                    node_ptr.as_ref().right
                } else {
                    bound = Some(node_ptr);
                    node_ptr.as_ref().left
                }
            }
        }
        bound
    }

    fn upper_bound_node<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let mut bound = None;
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                if self.comparator.compare(key, node_ptr.as_ref().key.borrow()) == Ordering::Less {
                    bound = Some(node_ptr);
                    node_ptr.as_ref().left
                } else {
                    node_ptr.as_ref().right
                }
            }
        }
        bound
    }

    fn find_insert_pos(&mut self, key: &K) -> Slot<K, V>
    where
        C: Compare<K>,
    {
        let mut parent: Link<K, V> = None;
        let mut link_ptr: LinkPtr<K, V> = NonNull::from(&mut self.root);
        unsafe {
            while let Some(mut node_ptr) = *link_ptr.as_ref() {
                link_ptr = match self.comparator.compare(key, &node_ptr.as_ref().key) {
                    Ordering::Equal => return Slot::Occupied(node_ptr),
                    Ordering::Less => NonNull::from(&mut node_ptr.as_mut().left),
                    Ordering::Greater => NonNull::from(&mut node_ptr.as_mut().right),
                };
                parent = Some(node_ptr);
            }
        }
        Slot::Vacant(parent, link_ptr)
    }

    /// Attaches a node built by `create` for `key` unless the key is present.
    /// Returns the node holding the key and whether it was created.
    fn emplace_node<E, F>(&mut self, key: K, create: F) -> std::result::Result<(NodePtr<K, V>, bool), E>
    where
        C: Compare<K>,
        F: FnOnce(Link<K, V>, K) -> std::result::Result<NodePtr<K, V>, E>,
    {
        match self.find_insert_pos(&key) {
            Slot::Occupied(node_ptr) => Ok((node_ptr, false)),
            Slot::Vacant(parent, mut link_ptr) => {
                let node_ptr = create(parent, key)?;
                unsafe {
                    *link_ptr.as_mut() = Some(node_ptr);
                }
                self.num_nodes += 1;
                self.balance_upper_once(parent);
                Ok((node_ptr, true))
            }
        }
    }

    fn emplace_infallible(&mut self, key: K, value: V) -> (NodePtr<K, V>, bool)
    where
        C: Compare<K>,
    {
        let placed = self.emplace_node(key, |parent, key| {
            Ok::<_, Infallible>(Node::create(parent, key, value))
        });
        match placed {
            Ok(placed) => placed,
            Err(never) => match never {},
        }
    }

    /// Inserts next to `hint` when the hint pins the insertion slot, i.e. the
    /// hint's key precedes `key` and the following key (if any) succeeds it.
    /// Otherwise falls back to a search from the root.
    pub(crate) fn emplace_hint_node(&mut self, hint: Link<K, V>, key: K, value: V) -> (NodePtr<K, V>, bool)
    where
        C: Compare<K>,
    {
        if let Some(hint_ptr) = hint {
            let next = successor(hint_ptr);
            let after_hint =
                self.comparator.compare(unsafe { &hint_ptr.as_ref().key }, &key) == Ordering::Less;
            let before_next = match next {
                None => true,
                Some(next_ptr) => {
                    self.comparator.compare(&key, unsafe { &next_ptr.as_ref().key }) == Ordering::Less
                }
            };

            if after_hint && before_next {
                // The free slot between hint and successor is the hint's right
                // link, or else the left link of the successor below it.
                let (mut parent_ptr, as_left) = match next {
                    Some(next_ptr) if unsafe { hint_ptr.as_ref().right.is_some() } => (next_ptr, true),
                    _ => (hint_ptr, false),
                };
                let node_ptr = Node::create(Some(parent_ptr), key, value);
                unsafe {
                    if as_left {
                        debug_assert!(parent_ptr.as_ref().left.is_none());
                        parent_ptr.as_mut().left = Some(node_ptr);
                    } else {
                        debug_assert!(parent_ptr.as_ref().right.is_none());
                        parent_ptr.as_mut().right = Some(node_ptr);
                    }
                }
                self.num_nodes += 1;
                self.balance_upper_once(Some(parent_ptr));
                return (node_ptr, true);
            }
        }
        self.emplace_infallible(key, value)
    }

    /// Removes the element stored in `node_ptr`.
    /// Returns its payload and the position of the element that followed it.
    ///
    /// A node with two children swaps payloads with its in-order successor and
    /// the successor's node is freed instead, so the follower of the removed
    /// element ends up in `node_ptr` itself.
    pub(crate) fn remove_node(&mut self, mut node_ptr: NodePtr<K, V>) -> (K, V, Link<K, V>) {
        debug_assert!(self.num_nodes >= 1);
        unsafe {
            if let (Some(_), Some(right_ptr)) = (node_ptr.as_ref().left, node_ptr.as_ref().right) {
                let mut successor_ptr = leftmost(right_ptr);
                mem::swap(&mut node_ptr.as_mut().key, &mut successor_ptr.as_mut().key);
                mem::swap(&mut node_ptr.as_mut().value, &mut successor_ptr.as_mut().value);
                self.unlink_node(successor_ptr);
                self.num_nodes -= 1;
                let (key, value) = Node::destroy(successor_ptr);
                return (key, value, Some(node_ptr));
            }

            let next = successor(node_ptr);
            self.unlink_node(node_ptr);
            self.num_nodes -= 1;
            let (key, value) = Node::destroy(node_ptr);
            (key, value, next)
        }
    }

    /// Unlinks a stem or leaf node from the tree and rebalances above it.
    /// The node itself is not freed.
    fn unlink_node(&mut self, node_ptr: NodePtr<K, V>) {
        unsafe {
            debug_assert!(node_ptr.as_ref().left.is_none() || node_ptr.as_ref().right.is_none());
            let child = node_ptr.as_ref().left.or(node_ptr.as_ref().right);
            if let Some(mut child_ptr) = child {
                child_ptr.as_mut().parent = node_ptr.as_ref().parent;
            }
            self.replace_child(node_ptr, child);
            // Parent node might be out of balance now
            self.balance_upper(node_ptr.as_ref().parent);
        }
    }

    /// Unlinks the first node and returns it as a detached leaf.
    fn detach_first(&mut self) -> Link<K, V> {
        let mut node_ptr = leftmost(self.root?);
        self.unlink_node(node_ptr);
        self.num_nodes -= 1;
        unsafe {
            let node = node_ptr.as_mut();
            node.right = None;
            node.parent = None;
            node.height = 0;
        }
        Some(node_ptr)
    }

    /// Attaches a detached leaf, freeing it if its key is already present.
    fn link_node(&mut self, mut node_ptr: NodePtr<K, V>)
    where
        C: Compare<K>,
    {
        let key = unsafe { &(*node_ptr.as_ptr()).key };
        match self.find_insert_pos(key) {
            Slot::Occupied(_) => drop(unsafe { Node::destroy(node_ptr) }),
            Slot::Vacant(parent, mut link_ptr) => {
                unsafe {
                    node_ptr.as_mut().parent = parent;
                    *link_ptr.as_mut() = Some(node_ptr);
                }
                self.num_nodes += 1;
                self.balance_upper_once(parent);
            }
        }
    }

    fn destroy_all(&mut self) {
        self.postorder(|node_ptr| unsafe {
            Node::destroy(node_ptr);
        });
        self.root = None;
        self.num_nodes = 0;
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn preorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse_links(f, |_| {}, |_| {});
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn inorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse_links(|_| {}, f, |_| {});
    }

    fn postorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse_links(|_| {}, |_| {}, f);
    }

    /// Walks the tree along parent links without auxiliary memory.
    fn traverse_links<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(NodePtr<K, V>),
        In: FnMut(NodePtr<K, V>),
        Post: FnMut(NodePtr<K, V>),
    {
        if let Some(mut node_ptr) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(node_ptr);
                        if let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
                            node_ptr = left_ptr;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(node_ptr);
                        if let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
                            node_ptr = right_ptr;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        // Post order traversal is used for node deletion,
                        // so make sure not to use node pointer after postorder call.
                        if let Some(parent_ptr) = unsafe { node_ptr.as_ref().parent } {
                            if Some(node_ptr) == unsafe { parent_ptr.as_ref().left } {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            postorder(node_ptr);
                            node_ptr = parent_ptr;
                        } else {
                            postorder(node_ptr);
                            break;
                        }
                    }
                }
            }
        }
    }
}

// The map owns its nodes exclusively, so it is as thread-safe as its contents.
unsafe impl<K: Send, V: Send, C: Send> Send for TreeMap<K, V, C> {}
unsafe impl<K: Sync, V: Sync, C: Sync> Sync for TreeMap<K, V, C> {}

impl<K, V, C> Drop for TreeMap<K, V, C> {
    fn drop(&mut self) {
        self.destroy_all();
    }
}

impl<K, V, C: Default> Default for TreeMap<K, V, C> {
    /// Creates an empty map.
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, C> Clone for TreeMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K> + Clone,
{
    /// Builds an independent tree by re-inserting every element in order.
    fn clone(&self) -> Self {
        let mut map = Self::with_comparator(self.comparator.clone());
        map.extend(self.iter().map(|(key, value)| (key.clone(), value.clone())));
        map
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for TreeMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Compare<K>> Extend<(K, V)> for TreeMap<K, V, C> {
    /// Inserts all pairs, keeping the first pair for each key.
    /// Each insert is hinted with the previously inserted element, which makes
    /// extending with ascending keys cheap.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let mut hint = None;
        for (key, value) in iter {
            let (node_ptr, _) = self.emplace_hint_node(hint, key, value);
            hint = Some(node_ptr);
        }
    }
}

impl<'a, K, V, C> Extend<(&'a K, &'a V)> for TreeMap<K, V, C>
where
    K: Copy + 'a,
    V: Copy + 'a,
    C: Compare<K>,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(&key, &value)| (key, value)));
    }
}

impl<K, V, C: Compare<K> + Default> FromIterator<(K, V)> for TreeMap<K, V, C> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for TreeMap<K, V> {
    /// Builds a map from a literal list; the first pair for each key wins.
    ///
    /// ```
    /// use avl_treemap::TreeMap;
    /// let map = TreeMap::from([(1, "a"), (2, "b"), (2, "c")]);
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.get(&2), Some(&"b"));
    /// ```
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}
