//! Persistent hash map keyed by strings.
//!
//! The map is a binary tree partitioned by the key hash: at depth `d` an
//! element lives in child `(hash >> 3d) % 2`. Every node stores one element
//! and the number of elements in its subtree. Updates copy the nodes on the
//! path from the root to the change and share everything else.
//!
//! Two keys with the same 64-bit hash are treated as the same key. The hash
//! is FNV-1a, so for the short identifier-like keys the builders use a
//! collision is not a practical concern.

use std::fmt;
use std::sync::Arc;

const CHILD_COUNT: usize = 2;
const SHIFT_SIZE: u32 = 3;

const FNV_OFFSET_BASIS: u64 = 14_695_981_039_346_656_037;
const FNV_PRIME: u64 = 1_099_511_628_211;

/// Hashes `key` with 64-bit FNV-1a over its Unicode scalar values.
///
/// # Examples
///
/// ```
/// use cbquery_persistent::hash_key;
///
/// assert_eq!(hash_key(""), 14_695_981_039_346_656_037);
/// assert_eq!(hash_key("where_parts"), hash_key("where_parts"));
/// ```
pub fn hash_key(key: &str) -> u64 {
	let mut hash = FNV_OFFSET_BASIS;
	for c in key.chars() {
		hash ^= u64::from(c);
		hash = hash.wrapping_mul(FNV_PRIME);
	}
	hash
}

fn slot(partial: u64) -> usize {
	(partial % CHILD_COUNT as u64) as usize
}

/// An immutable string-keyed map with path-copying updates.
///
/// # Examples
///
/// ```
/// use cbquery_persistent::Map;
///
/// let before = Map::new().set("from", "users");
/// let after = before.set("from", "orders");
///
/// assert_eq!(before.lookup("from"), Some(&"users"));
/// assert_eq!(after.lookup("from"), Some(&"orders"));
/// assert_eq!(after.size(), 1);
/// ```
pub struct Map<V> {
	root: Option<Arc<Node<V>>>,
}

#[derive(Clone)]
struct Node<V> {
	count: usize,
	hash: u64,
	key: Arc<str>,
	value: V,
	children: [Map<V>; CHILD_COUNT],
}

impl<V> Node<V> {
	fn is_leaf(&self) -> bool {
		self.count == 1
	}

	fn recount(&mut self) {
		self.count = 1 + self.children.iter().map(Map::size).sum::<usize>();
	}
}

impl<V> Map<V> {
	/// Returns the empty map.
	pub const fn new() -> Self {
		Self { root: None }
	}

	fn from_node(node: Node<V>) -> Self {
		Self {
			root: Some(Arc::new(node)),
		}
	}

	/// Returns `true` if the map has no entries.
	pub fn is_empty(&self) -> bool {
		self.root.is_none()
	}

	/// Returns the number of entries. O(1).
	pub fn size(&self) -> usize {
		self.root.as_ref().map_or(0, |node| node.count)
	}

	/// Returns the value stored under `key`.
	pub fn lookup(&self, key: &str) -> Option<&V> {
		let hash = hash_key(key);
		let mut partial = hash;
		let mut current = self;
		while let Some(node) = &current.root {
			if node.hash == hash {
				return Some(&node.value);
			}
			current = &node.children[slot(partial)];
			partial >>= SHIFT_SIZE;
		}
		None
	}

	/// Returns `true` if `key` has an entry.
	pub fn contains_key(&self, key: &str) -> bool {
		self.lookup(key).is_some()
	}

	/// Calls `f` on every entry, pre-order: a node, then its child 0
	/// subtree, then its child 1 subtree.
	pub fn for_each<F>(&self, mut f: F)
	where
		F: FnMut(&str, &V),
	{
		for (key, value) in self.iter() {
			f(key, value);
		}
	}

	/// Returns every key in [`Map::for_each`] order.
	pub fn keys(&self) -> Vec<String> {
		self.iter().map(|(key, _)| key.to_owned()).collect()
	}

	/// Returns a borrowing iterator in [`Map::for_each`] order.
	pub fn iter(&self) -> Iter<'_, V> {
		Iter {
			stack: self.root.as_deref().into_iter().collect(),
			remaining: self.size(),
		}
	}

	/// Returns `true` if both maps share the same root node.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		match (&self.root, &other.root) {
			(Some(a), Some(b)) => Arc::ptr_eq(a, b),
			(None, None) => true,
			_ => false,
		}
	}
}

impl<V: Clone> Map<V> {
	/// Returns a map where `key` maps to `value`.
	///
	/// An existing entry with the same key is replaced and the size is
	/// unchanged; otherwise the size grows by one.
	#[must_use]
	pub fn set(&self, key: &str, value: V) -> Self {
		let hash = hash_key(key);
		Self::from_node(Self::set_node(self, hash, hash, key, value))
	}

	fn set_node(tree: &Self, partial: u64, hash: u64, key: &str, value: V) -> Node<V> {
		let Some(node) = &tree.root else {
			return Node {
				count: 1,
				hash,
				key: Arc::from(key),
				value,
				children: [Map::new(), Map::new()],
			};
		};

		let mut copy = Node::clone(node);
		if node.hash == hash {
			copy.value = value;
			return copy;
		}

		let index = slot(partial);
		copy.children[index] = Self::from_node(Self::set_node(
			&node.children[index],
			partial >> SHIFT_SIZE,
			hash,
			key,
			value,
		));
		copy.recount();
		copy
	}

	/// Returns a map without `key`.
	///
	/// Deleting a missing key returns a map sharing the root of `self`.
	#[must_use]
	pub fn delete(&self, key: &str) -> Self {
		let hash = hash_key(key);
		Self::delete_node(self, hash, hash).unwrap_or_else(|| self.clone())
	}

	// `None` means the key was not found below `tree`.
	fn delete_node(tree: &Self, partial: u64, hash: u64) -> Option<Self> {
		let node = tree.root.as_ref()?;

		if node.hash != hash {
			let index = slot(partial);
			let child = Self::delete_node(&node.children[index], partial >> SHIFT_SIZE, hash)?;
			let mut copy = Node::clone(node);
			copy.children[index] = child;
			copy.recount();
			return Some(Self::from_node(copy));
		}

		if node.is_leaf() {
			return Some(Self::new());
		}

		// Promote the leftmost element of the largest child; ties go to the
		// lowest index.
		let mut chosen = 0;
		for (index, child) in node.children.iter().enumerate() {
			if child.size() > node.children[chosen].size() {
				chosen = index;
			}
		}
		let (promoted, remainder) = match &node.children[chosen].root {
			Some(child) => Self::delete_leftmost(child),
			None => unreachable!("non-leaf map node without children"),
		};

		let mut replacement = Node {
			count: 0,
			hash: promoted.hash,
			key: Arc::clone(&promoted.key),
			value: promoted.value.clone(),
			children: node.children.clone(),
		};
		replacement.children[chosen] = remainder;
		replacement.recount();
		Some(Self::from_node(replacement))
	}

	fn delete_leftmost(node: &Arc<Node<V>>) -> (Arc<Node<V>>, Self) {
		if node.is_leaf() {
			return (Arc::clone(node), Self::new());
		}

		for (index, child) in node.children.iter().enumerate() {
			if let Some(child) = &child.root {
				let (deleted, remainder) = Self::delete_leftmost(child);
				let mut copy = Node::clone(node);
				copy.children[index] = remainder;
				copy.recount();
				return (deleted, Self::from_node(copy));
			}
		}

		unreachable!("non-leaf map node without children")
	}
}

impl<V> Clone for Map<V> {
	fn clone(&self) -> Self {
		Self {
			root: self.root.clone(),
		}
	}
}

impl<V> Default for Map<V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<V: fmt::Debug> fmt::Debug for Map<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<V: fmt::Display> fmt::Display for Map<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("{")?;
		for (i, (key, value)) in self.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{key}: {value}")?;
		}
		f.write_str("}")
	}
}

impl<V: PartialEq> PartialEq for Map<V> {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
			|| (self.size() == other.size()
				&& self
					.iter()
					.all(|(key, value)| other.lookup(key) == Some(value)))
	}
}

impl<K: AsRef<str>, V: Clone> FromIterator<(K, V)> for Map<V> {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		iter.into_iter()
			.fold(Self::new(), |map, (key, value)| map.set(key.as_ref(), value))
	}
}

impl<'a, V> IntoIterator for &'a Map<V> {
	type Item = (&'a str, &'a V);
	type IntoIter = Iter<'a, V>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Borrowing pre-order iterator over a [`Map`].
pub struct Iter<'a, V> {
	stack: Vec<&'a Node<V>>,
	remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
	type Item = (&'a str, &'a V);

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.stack.pop()?;
		for child in node.children.iter().rev() {
			if let Some(child) = child.root.as_deref() {
				self.stack.push(child);
			}
		}
		self.remaining -= 1;
		Some((&*node.key, &node.value))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.remaining, Some(self.remaining))
	}
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;
	use rstest::rstest;

	fn assert_counts<V>(map: &Map<V>) -> usize {
		match &map.root {
			None => 0,
			Some(node) => {
				let below: usize = node.children.iter().map(assert_counts).sum();
				assert_eq!(node.count, below + 1, "stale count at key {}", node.key);
				node.count
			}
		}
	}

	fn sample(keys: &[&str]) -> Map<usize> {
		keys.iter()
			.enumerate()
			.fold(Map::new(), |map, (i, key)| map.set(key, i))
	}

	#[rstest]
	#[case::empty("", 14_695_981_039_346_656_037)]
	#[case::single_char("a", 0xaf63_dc4c_8601_ec8c)]
	fn test_hash_key(#[case] key: &str, #[case] expected: u64) {
		assert_eq!(hash_key(key), expected);
	}

	#[rstest]
	fn test_set_then_lookup() {
		// Arrange
		let map = Map::new();

		// Act
		let map = map.set("columns", 1).set("from", 2).set("where_parts", 3);

		// Assert
		assert_eq!(map.size(), 3);
		assert_eq!(map.lookup("columns"), Some(&1));
		assert_eq!(map.lookup("from"), Some(&2));
		assert_eq!(map.lookup("where_parts"), Some(&3));
		assert_eq!(map.lookup("limit"), None);
		assert_counts(&map);
	}

	#[rstest]
	fn test_set_existing_key_replaces_value() {
		// Arrange
		let original = Map::new().set("k", 1);

		// Act
		let updated = original.set("k", 2);

		// Assert
		assert_eq!(updated.size(), 1);
		assert_eq!(updated.lookup("k"), Some(&2));
		assert_eq!(original.lookup("k"), Some(&1));
	}

	#[rstest]
	fn test_delete_missing_key_shares_root() {
		// Arrange
		let map = sample(&["a", "b", "c"]);

		// Act
		let same = map.delete("zzz");

		// Assert
		assert!(same.ptr_eq(&map));
	}

	#[rstest]
	fn test_delete_on_empty_map() {
		let map: Map<i32> = Map::new();

		assert!(map.delete("anything").is_empty());
	}

	#[rstest]
	fn test_delete_root_promotes_descendant() {
		// Arrange
		let keys = ["root", "a", "b", "c", "d", "e", "f", "g"];
		let map = sample(&keys);

		// Act
		let without_root = map.delete("root");

		// Assert
		assert_eq!(without_root.size(), keys.len() - 1);
		assert_eq!(without_root.lookup("root"), None);
		for (i, key) in keys.iter().enumerate().skip(1) {
			assert_eq!(without_root.lookup(key), Some(&i));
		}
		assert_counts(&without_root);
		assert_eq!(map.size(), keys.len());
	}

	#[rstest]
	fn test_for_each_is_pre_order_from_root() {
		// Arrange
		let map = sample(&["first", "second", "third"]);
		let mut keys = Vec::new();

		// Act
		map.for_each(|key, _| keys.push(key.to_owned()));

		// Assert
		assert_eq!(keys[0], "first");
		assert_eq!(keys.len(), 3);
		assert_eq!(map.keys(), keys);
	}

	#[rstest]
	fn test_display_lists_entries() {
		let map = Map::new().set("only", 7);

		assert_eq!(map.to_string(), "{only: 7}");
		assert_eq!(format!("{map:?}"), "{\"only\": 7}");
	}

	proptest! {
		#[test]
		fn prop_counts_stay_consistent(
			inserts in prop::collection::vec("[a-z]{1,6}", 0..64),
			deletes in prop::collection::vec("[a-z]{1,6}", 0..32),
		) {
			let mut map = Map::new();
			let mut model = std::collections::BTreeMap::new();
			for (i, key) in inserts.iter().enumerate() {
				map = map.set(key, i);
				model.insert(key.clone(), i);
			}
			for key in &deletes {
				map = map.delete(key);
				model.remove(key);
			}

			prop_assert_eq!(assert_counts(&map), model.len());
			for (key, value) in &model {
				prop_assert_eq!(map.lookup(key), Some(value));
			}
			for key in &deletes {
				prop_assert!(!map.contains_key(key));
			}
		}
	}
}
