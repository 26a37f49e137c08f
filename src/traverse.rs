//! Traversal orders over the nodes of a map.
//!
//! All orders share one walker whose pending work is either a stack (in-order
//! ascending or descending) or a queue (level order). The map itself does not
//! know which traversal is running.

use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::map::TreeMap;
use crate::node::{Link, Node, NodePtr};

/// The order in which a traversal visits the elements of a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Order {
    /// In-order, smallest key first.
    Ascending,
    /// In-order, largest key first.
    Descending,
    /// Breadth-first: the root, then its children left to right, and so on.
    LevelOrder,
}

enum Frontier<K, V> {
    // The top of the stack is the next node; below it are the ancestors
    // still waiting to be visited.
    Stack {
        stack: Vec<NodePtr<K, V>>,
        descending: bool,
    },
    Queue(VecDeque<NodePtr<K, V>>),
}

struct Walker<K, V> {
    frontier: Frontier<K, V>,
    remaining: usize,
}

impl<K, V> Walker<K, V> {
    fn new(root: Link<K, V>, len: usize, order: Order) -> Self {
        let frontier = match order {
            Order::Ascending | Order::Descending => {
                let descending = order == Order::Descending;
                let mut stack = Vec::new();
                Self::push_spine(&mut stack, root, descending);
                Frontier::Stack { stack, descending }
            }
            Order::LevelOrder => Frontier::Queue(root.into_iter().collect()),
        };
        Self {
            frontier,
            remaining: len,
        }
    }

    // Pushes the path from `link` down to its first node in traversal order.
    fn push_spine(stack: &mut Vec<NodePtr<K, V>>, mut link: Link<K, V>, descending: bool) {
        while let Some(node_ptr) = link {
            stack.push(node_ptr);
            link = unsafe {
                if descending {
                    node_ptr.as_ref().right
                } else {
                    node_ptr.as_ref().left
                }
            };
        }
    }

    fn next(&mut self) -> Option<NodePtr<K, V>> {
        let node_ptr = match &mut self.frontier {
            Frontier::Stack { stack, descending } => {
                let node_ptr = stack.pop()?;
                let branch = unsafe {
                    if *descending {
                        node_ptr.as_ref().left
                    } else {
                        node_ptr.as_ref().right
                    }
                };
                Self::push_spine(stack, branch, *descending);
                node_ptr
            }
            Frontier::Queue(queue) => {
                let node_ptr = queue.pop_front()?;
                unsafe {
                    queue.extend(node_ptr.as_ref().left);
                    queue.extend(node_ptr.as_ref().right);
                }
                node_ptr
            }
        };
        self.remaining -= 1;
        Some(node_ptr)
    }
}

impl<K, V> Clone for Walker<K, V> {
    fn clone(&self) -> Self {
        let frontier = match &self.frontier {
            Frontier::Stack { stack, descending } => Frontier::Stack {
                stack: stack.clone(),
                descending: *descending,
            },
            Frontier::Queue(queue) => Frontier::Queue(queue.clone()),
        };
        Self {
            frontier,
            remaining: self.remaining,
        }
    }
}

/// An iterator over the entries of a map in a chosen [`Order`].
pub struct Traverse<'a, K, V> {
    walker: Walker<K, V>,
    marker: PhantomData<&'a Node<K, V>>,
}

/// A mutable iterator over the entries of a map in a chosen [`Order`].
pub struct TraverseMut<'a, K, V> {
    walker: Walker<K, V>,
    marker: PhantomData<&'a mut Node<K, V>>,
}

/// An owning iterator over the entries of a map in ascending order.
pub struct IntoIter<K, V, C> {
    map: TreeMap<K, V, C>,
}

impl<K, V, C> TreeMap<K, V, C> {
    /// Gets an iterator over the entries of the map in the given order.
    pub fn traverse(&self, order: Order) -> Traverse<'_, K, V> {
        Traverse {
            walker: Walker::new(self.root, self.num_nodes, order),
            marker: PhantomData,
        }
    }

    /// Gets a mutable iterator over the entries of the map in the given order.
    pub fn traverse_mut(&mut self, order: Order) -> TraverseMut<'_, K, V> {
        TraverseMut {
            walker: Walker::new(self.root, self.num_nodes, order),
            marker: PhantomData,
        }
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Traverse<'_, K, V> {
        self.traverse(Order::Ascending)
    }

    /// Gets a mutable iterator over the entries of the map, sorted by key.
    pub fn iter_mut(&mut self) -> TraverseMut<'_, K, V> {
        self.traverse_mut(Order::Ascending)
    }

    /// Same as [`iter`](Self::iter).
    pub fn ascending(&self) -> Traverse<'_, K, V> {
        self.traverse(Order::Ascending)
    }

    /// Same as [`iter_mut`](Self::iter_mut).
    pub fn ascending_mut(&mut self) -> TraverseMut<'_, K, V> {
        self.traverse_mut(Order::Ascending)
    }

    /// Gets an iterator over the entries of the map, largest key first.
    pub fn descending(&self) -> Traverse<'_, K, V> {
        self.traverse(Order::Descending)
    }

    /// Gets a mutable iterator over the entries of the map, largest key first.
    pub fn descending_mut(&mut self) -> TraverseMut<'_, K, V> {
        self.traverse_mut(Order::Descending)
    }

    /// Gets an iterator over the entries of the map level by level.
    pub fn level_order(&self) -> Traverse<'_, K, V> {
        self.traverse(Order::LevelOrder)
    }

    /// Gets a mutable iterator over the entries of the map level by level.
    pub fn level_order_mut(&mut self) -> TraverseMut<'_, K, V> {
        self.traverse_mut(Order::LevelOrder)
    }

    /// Calls `f` on every entry in the given order and returns `f`,
    /// so any state it accumulated can be recovered.
    ///
    /// ```
    /// use avl_treemap::{Order, TreeMap};
    /// let map = TreeMap::from([(2, 20), (1, 10), (3, 30)]);
    /// let mut keys = Vec::new();
    /// let _ = map.traverse_with(Order::LevelOrder, |k, _| keys.push(*k));
    /// assert_eq!(keys, [2, 1, 3]);
    /// ```
    pub fn traverse_with<F>(&self, order: Order, mut f: F) -> F
    where
        F: FnMut(&K, &V),
    {
        for (key, value) in self.traverse(order) {
            f(key, value);
        }
        f
    }

    /// Calls `f` on every entry, smallest key first.
    pub fn traverse_ascending<F: FnMut(&K, &V)>(&self, f: F) -> F {
        self.traverse_with(Order::Ascending, f)
    }

    /// Calls `f` on every entry, largest key first.
    pub fn traverse_descending<F: FnMut(&K, &V)>(&self, f: F) -> F {
        self.traverse_with(Order::Descending, f)
    }

    /// Calls `f` on every entry level by level.
    pub fn traverse_level_order<F: FnMut(&K, &V)>(&self, f: F) -> F {
        self.traverse_with(Order::LevelOrder, f)
    }
}

impl<'a, K, V> Iterator for Traverse<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.next().map(|node_ptr| {
            let node = unsafe { &*node_ptr.as_ptr() };
            (&node.key, &node.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.walker.remaining, Some(self.walker.remaining))
    }
}

// Traversals hand out shared keys and values (and exclusive values for the
// mutable one), so they are as thread-safe as the matching references.
unsafe impl<K: Sync, V: Sync> Send for Traverse<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Traverse<'_, K, V> {}
unsafe impl<K: Sync, V: Send> Send for TraverseMut<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for TraverseMut<'_, K, V> {}

impl<K, V> ExactSizeIterator for Traverse<'_, K, V> {}

impl<K, V> FusedIterator for Traverse<'_, K, V> {}

// Auto derived Clone seems to have an invalid type bound of K: Clone
impl<K, V> Clone for Traverse<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            walker: self.walker.clone(),
            marker: PhantomData,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Traverse<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for TraverseMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.next().map(|node_ptr| {
            let node = unsafe { &mut *node_ptr.as_ptr() };
            (&node.key, &mut node.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.walker.remaining, Some(self.walker.remaining))
    }
}

impl<K, V> ExactSizeIterator for TraverseMut<'_, K, V> {}

impl<K, V> FusedIterator for TraverseMut<'_, K, V> {}

impl<K, V, C> Iterator for IntoIter<K, V, C> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.map.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.map.len(), Some(self.map.len()))
    }
}

impl<K, V, C> DoubleEndedIterator for IntoIter<K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.map.pop_last()
    }
}

impl<K, V, C> ExactSizeIterator for IntoIter<K, V, C> {}

impl<K, V, C> FusedIterator for IntoIter<K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for IntoIter<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.map.iter()).finish()
    }
}

impl<'a, K, V, C> IntoIterator for &'a TreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Traverse<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a mut TreeMap<K, V, C> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = TraverseMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, C> IntoIterator for TreeMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, C>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter { map: self }
    }
}
