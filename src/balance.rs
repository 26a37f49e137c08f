//! Height bookkeeping and AVL rotations.

use std::cmp;

use tracing::trace;

use crate::map::TreeMap;
use crate::node::{Link, NodePtr};

/// Height of a subtree: -1 for the sentinel, 0 for a leaf.
pub(crate) fn height<K, V>(link: Link<K, V>) -> isize {
    match link {
        None => -1,
        Some(node_ptr) => unsafe { node_ptr.as_ref().height },
    }
}

/// Left height minus right height; 0 for the sentinel.
pub(crate) fn balance_factor<K, V>(link: Link<K, V>) -> isize {
    match link {
        None => 0,
        Some(node_ptr) => unsafe { height(node_ptr.as_ref().left) - height(node_ptr.as_ref().right) },
    }
}

fn adjust_height<K, V>(mut node_ptr: NodePtr<K, V>) {
    unsafe {
        node_ptr.as_mut().height =
            1 + cmp::max(height(node_ptr.as_ref().left), height(node_ptr.as_ref().right));
    }
}

impl<K, V, C> TreeMap<K, V, C> {
    /// Makes `new_ptr` take the place of `old_ptr` in the parent's child slot,
    /// or in the root link when `old_ptr` hangs off the sentinel.
    pub(crate) fn replace_child(&mut self, old_ptr: NodePtr<K, V>, new_link: Link<K, V>) {
        unsafe {
            match old_ptr.as_ref().parent {
                None => self.root = new_link,
                Some(mut parent_ptr) => {
                    if parent_ptr.as_ref().left == Some(old_ptr) {
                        parent_ptr.as_mut().left = new_link;
                    } else {
                        parent_ptr.as_mut().right = new_link;
                    }
                }
            }
        }
    }

    //   node          right
    //   /  \          /   \
    //  a   right -> node   c
    //      /  \     /  \
    //     b    c   a    b
    pub(crate) fn rotate_left(&mut self, mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        unsafe {
            let Some(mut right_ptr) = node_ptr.as_ref().right else {
                return node_ptr;
            };

            node_ptr.as_mut().right = right_ptr.as_ref().left;
            if let Some(mut right_left_ptr) = right_ptr.as_ref().left {
                right_left_ptr.as_mut().parent = Some(node_ptr);
            }

            right_ptr.as_mut().parent = node_ptr.as_ref().parent;
            self.replace_child(node_ptr, Some(right_ptr));

            right_ptr.as_mut().left = Some(node_ptr);
            node_ptr.as_mut().parent = Some(right_ptr);

            adjust_height(node_ptr);
            adjust_height(right_ptr);
            right_ptr
        }
    }

    //      node      left
    //      /  \      /  \
    //    left  c -> a   node
    //    /  \           /  \
    //   a    b         b    c
    pub(crate) fn rotate_right(&mut self, mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        unsafe {
            let Some(mut left_ptr) = node_ptr.as_ref().left else {
                return node_ptr;
            };

            node_ptr.as_mut().left = left_ptr.as_ref().right;
            if let Some(mut left_right_ptr) = left_ptr.as_ref().right {
                left_right_ptr.as_mut().parent = Some(node_ptr);
            }

            left_ptr.as_mut().parent = node_ptr.as_ref().parent;
            self.replace_child(node_ptr, Some(left_ptr));

            left_ptr.as_mut().right = Some(node_ptr);
            node_ptr.as_mut().parent = Some(left_ptr);

            adjust_height(node_ptr);
            adjust_height(left_ptr);
            left_ptr
        }
    }

    /// Restores the AVL condition at `node_ptr` if necessary and adjusts its height.
    /// The initial balance factor must lie within -2..=2, which always holds
    /// after a single insert or removal below it.
    /// Returns the head of the subtree, which differs from `node_ptr` iff a
    /// rotation took place.
    pub(crate) fn balance(&mut self, node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        adjust_height(node_ptr);
        let factor = balance_factor(Some(node_ptr));
        debug_assert!((-2..=2).contains(&factor));
        let (left, right) = unsafe { (node_ptr.as_ref().left, node_ptr.as_ref().right) };

        if factor > 1 {
            if let Some(left_ptr) = left {
                if balance_factor(left) < 0 {
                    trace!(height = height(Some(node_ptr)), "rebalance left-right");
                    self.rotate_left(left_ptr);
                } else {
                    trace!(height = height(Some(node_ptr)), "rebalance left-left");
                }
            }
            return self.rotate_right(node_ptr);
        }

        if factor < -1 {
            if let Some(right_ptr) = right {
                if balance_factor(right) > 0 {
                    trace!(height = height(Some(node_ptr)), "rebalance right-left");
                    self.rotate_right(right_ptr);
                } else {
                    trace!(height = height(Some(node_ptr)), "rebalance right-right");
                }
            }
            return self.rotate_left(node_ptr);
        }

        node_ptr
    }

    /// Rebalances nodes starting from given position up to the root node.
    ///
    /// Rotations re-attach the new subtree head in the parent's slot, so the
    /// walk simply continues with the parent captured before balancing.
    pub(crate) fn balance_upper(&mut self, start_from: Link<K, V>) {
        let mut current = start_from;
        while let Some(node_ptr) = current {
            let parent = unsafe { node_ptr.as_ref().parent };
            self.balance(node_ptr);
            current = parent;
        }
    }

    /// Rebalances nodes starting from given position up to the root node.
    /// Stops after first rotation.
    /// This is enough to restore balance after a single insert operation,
    /// since the rotated subtree regains its height from before the insert.
    pub(crate) fn balance_upper_once(&mut self, start_from: Link<K, V>) {
        let mut current = start_from;
        while let Some(node_ptr) = current {
            let parent = unsafe { node_ptr.as_ref().parent };
            if self.balance(node_ptr) != node_ptr {
                break;
            }
            current = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn test_sentinel_height() {
        assert_eq!(height::<i32, ()>(None), -1);
        assert_eq!(balance_factor::<i32, ()>(None), 0);
    }

    #[test]
    fn test_rotate_right_relinks() {
        //     3        2
        //    /        / \
        //   2   ->   1   3
        //  /
        // 1
        let mut map = TreeMap::new();
        map.insert(3, ());
        let mut three = map.root.unwrap();
        let mut two = Node::create(Some(three), 2, ());
        let one = Node::create(Some(two), 1, ());
        unsafe {
            three.as_mut().left = Some(two);
            two.as_mut().left = Some(one);
            two.as_mut().height = 1;
            three.as_mut().height = 2;
        }
        map.num_nodes = 3;
        assert_eq!(balance_factor(Some(three)), 2);

        let head = map.rotate_right(three);
        assert_eq!(head, two);
        assert_eq!(map.root, Some(two));
        unsafe {
            assert!(two.as_ref().parent.is_none());
            assert_eq!(two.as_ref().left, Some(one));
            assert_eq!(two.as_ref().right, Some(three));
            assert_eq!(three.as_ref().parent, Some(two));
            assert!(three.as_ref().left.is_none());
        }
        assert_eq!(height(Some(two)), 1);
        assert_eq!(height(Some(three)), 0);
        map.check_consistency();
    }

    #[test]
    fn test_balance_left_right() {
        //   3        2
        //  /        / \
        // 1    ->  1   3
        //  \
        //   2
        let mut map = TreeMap::new();
        map.insert(3, ());
        let mut three = map.root.unwrap();
        let mut one = Node::create(Some(three), 1, ());
        let two = Node::create(Some(one), 2, ());
        unsafe {
            three.as_mut().left = Some(one);
            one.as_mut().right = Some(two);
            one.as_mut().height = 1;
        }
        map.num_nodes = 3;

        let head = map.balance(three);
        assert_eq!(head, two);
        assert_eq!(map.root, Some(two));
        map.check_consistency();
    }
}
