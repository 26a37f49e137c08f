//! Key orderings a map can be configured with.

use std::cmp::Ordering;

/// A total order over values of type `T`.
///
/// The map only ever asks its comparator to compare two keys, so any strict
/// weak ordering that is consistent for the lifetime of the map works.
/// Lookups by a borrowed form `Q` of the key require `Compare<Q>` and the
/// ordering on `Q` *must* match the ordering on the key type.
pub trait Compare<T: ?Sized> {
    fn compare(&self, lhs: &T, rhs: &T) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation. This is the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl<T: Ord + ?Sized> Compare<T> for Natural {
    #[inline]
    fn compare(&self, lhs: &T, rhs: &T) -> Ordering {
        lhs.cmp(rhs)
    }
}

/// Orders keys by the reverse of their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reverse;

impl<T: Ord + ?Sized> Compare<T> for Reverse {
    #[inline]
    fn compare(&self, lhs: &T, rhs: &T) -> Ordering {
        rhs.cmp(lhs)
    }
}

/// Orders keys with a closure.
///
/// ```
/// use avl_treemap::{ByFn, TreeMap};
/// // Keys are equal when they share the last decimal digit.
/// let mut map = TreeMap::with_comparator(ByFn(|a: &i32, b: &i32| (a % 10).cmp(&(b % 10))));
/// assert!(map.insert(13, "thirteen"));
/// assert!(!map.insert(3, "three"));
/// assert!(map.insert(21, "twenty-one"));
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.get(&23), Some(&"thirteen"));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ByFn<F>(pub F);

impl<T, F> Compare<T> for ByFn<F>
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, lhs: &T, rhs: &T) -> Ordering {
        (self.0)(lhs, rhs)
    }
}
