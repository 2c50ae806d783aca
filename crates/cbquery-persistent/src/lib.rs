//! Persistent containers for the cbquery builder kernel.
//!
//! Both containers are immutable: every update returns a new value that
//! shares the untouched part of its structure with the value it was derived
//! from. Handles are cheap to clone and safe to share across threads.
//!
//! - [`List`] - a singly linked sequence with O(1) prepend
//! - [`Map`] - a hash-partitioned binary tree keyed by strings
//!
//! # Examples
//!
//! ```
//! use cbquery_persistent::{List, Map};
//!
//! let empty = List::new();
//! let one = empty.prepend(1);
//! let two = one.prepend(2);
//! assert_eq!(two.size(), 2);
//! assert_eq!(one.size(), 1);
//!
//! let map = Map::new().set("a", 1).set("b", 2);
//! assert_eq!(map.lookup("a"), Some(&1));
//! assert_eq!(map.delete("a").lookup("a"), None);
//! assert_eq!(map.lookup("a"), Some(&1));
//! ```

pub mod list;
pub mod map;

pub use list::List;
pub use map::{Map, hash_key};
