//! Tree cells and the raw links between them.
//!
//! Every node is a separate heap allocation owned by exactly one link: either
//! the map's root link or the `left`/`right` link of its parent. The `parent`
//! link is a non-owning back reference.
//!
//! The empty link (`None`) plays the part of the sentinel: it is the parent of
//! the root, the end position of every cursor and has height -1.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::{Error, Result};

pub(crate) type NodePtr<K, V> = NonNull<Node<K, V>>;
pub(crate) type Link<K, V> = Option<NodePtr<K, V>>;
pub(crate) type LinkPtr<K, V> = NonNull<Link<K, V>>;

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
    pub(crate) parent: Link<K, V>,
    pub(crate) height: isize,
}

impl<K, V> Node<K, V> {
    /// Allocates a detached leaf, aborting on allocation failure like `Box::new`.
    pub(crate) fn create(parent: Link<K, V>, key: K, value: V) -> NodePtr<K, V> {
        let boxed = Box::new(Self::leaf(parent, key, value));
        unsafe { NodePtr::new_unchecked(Box::into_raw(boxed)) }
    }

    /// Allocates a detached leaf, reporting allocation failure as an error.
    ///
    /// The returned pointer is compatible with [`Node::destroy`], since the
    /// memory comes from the global allocator with the layout `Box` uses.
    pub(crate) fn try_create(parent: Link<K, V>, key: K, value: V) -> Result<NodePtr<K, V>> {
        let layout = Layout::new::<Self>();
        // Never zero-sized: a node always carries its height.
        let raw = unsafe { alloc::alloc(layout) } as *mut Self;
        match NonNull::new(raw) {
            None => Err(Error::AllocationFailed {
                size: layout.size(),
            }),
            Some(node_ptr) => {
                unsafe { node_ptr.as_ptr().write(Self::leaf(parent, key, value)) };
                Ok(node_ptr)
            }
        }
    }

    /// Frees a node and hands back its payload.
    ///
    /// # Safety
    ///
    /// `node_ptr` must come from [`Node::create`] or [`Node::try_create`], must
    /// no longer be reachable from any link and must not be used afterwards.
    pub(crate) unsafe fn destroy(node_ptr: NodePtr<K, V>) -> (K, V) {
        let boxed = Box::from_raw(node_ptr.as_ptr());
        (boxed.key, boxed.value)
    }

    fn leaf(parent: Link<K, V>, key: K, value: V) -> Self {
        Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            height: 0,
        }
    }
}

/// Returns the leftmost node of the subtree rooted at `node_ptr`.
pub(crate) fn leftmost<K, V>(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
    while let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
        node_ptr = left_ptr;
    }
    node_ptr
}

/// Returns the rightmost node of the subtree rooted at `node_ptr`.
pub(crate) fn rightmost<K, V>(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
    while let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
        node_ptr = right_ptr;
    }
    node_ptr
}

/// Returns the in-order successor, or the sentinel after the last node.
pub(crate) fn successor<K, V>(node_ptr: NodePtr<K, V>) -> Link<K, V> {
    unsafe {
        if let Some(right_ptr) = node_ptr.as_ref().right {
            return Some(leftmost(right_ptr));
        }
        // Climb while coming up from a right subtree
        let mut child_ptr = node_ptr;
        let mut current = node_ptr.as_ref().parent;
        while let Some(parent_ptr) = current {
            if parent_ptr.as_ref().left == Some(child_ptr) {
                break;
            }
            child_ptr = parent_ptr;
            current = parent_ptr.as_ref().parent;
        }
        current
    }
}

/// Returns the in-order predecessor, or the sentinel before the first node.
pub(crate) fn predecessor<K, V>(node_ptr: NodePtr<K, V>) -> Link<K, V> {
    unsafe {
        if let Some(left_ptr) = node_ptr.as_ref().left {
            return Some(rightmost(left_ptr));
        }
        // Climb while coming up from a left subtree
        let mut child_ptr = node_ptr;
        let mut current = node_ptr.as_ref().parent;
        while let Some(parent_ptr) = current {
            if parent_ptr.as_ref().right == Some(child_ptr) {
                break;
            }
            child_ptr = parent_ptr;
            current = parent_ptr.as_ref().parent;
        }
        current
    }
}
