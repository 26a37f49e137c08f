//! An ordered map implemented with an AVL tree.
//!
//! [`TreeMap`] keeps its keys sorted by a configurable [`Compare`] ordering and
//! stays height balanced under any sequence of inserts and removals, so every
//! single-key operation runs in O(log n).
//!
//! Besides the usual map operations it offers
//! - positions ([`Cursor`], [`CursorMut`]) returned by lookups and bound
//!   queries, which can remove elements and take insertion hints,
//! - three traversal orders ([`Order`]): ascending, descending and level order,
//!   each available read-only and mutable,
//! - an all-or-nothing batch insert ([`TreeMap::try_extend`]) that reports
//!   allocation failure instead of aborting.
//!
//! ```
//! use avl_treemap::{Order, TreeMap};
//!
//! let mut map = TreeMap::new();
//! for key in [5, 3, 8, 1, 4, 7, 9] {
//!     map.insert(key, key.to_string());
//! }
//! assert!(map.iter().map(|(k, _)| *k).eq([1, 3, 4, 5, 7, 8, 9]));
//! assert!(map.traverse(Order::LevelOrder).map(|(k, _)| *k).eq([5, 3, 8, 1, 4, 7, 9]));
//!
//! assert_eq!(map.erase(&5), 1);
//! assert_eq!(map.len(), 6);
//! assert!(map.at(&100).is_err());
//! ```

mod balance;
mod compare;
mod cursor;
mod error;
mod map;
mod node;
mod traverse;

pub use compare::{ByFn, Compare, Natural, Reverse};
pub use cursor::{Cursor, CursorMut};
pub use error::{Error, Result};
pub use map::TreeMap;
pub use traverse::{IntoIter, Order, Traverse, TraverseMut};
