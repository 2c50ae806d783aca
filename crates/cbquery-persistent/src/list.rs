//! Persistent singly linked list.
//!
//! Every list ends at the shared empty list. Prepending allocates exactly
//! one node and shares the whole existing chain, so any number of lists can
//! be derived from a common tail without copying it.

use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

/// An immutable sequence with O(1) `prepend`, `head`, `tail` and `size`.
///
/// The newest element is the head. Cloning a list clones one `Arc`.
///
/// # Examples
///
/// ```
/// use cbquery_persistent::List;
///
/// let list = List::new().prepend("b").prepend("a");
/// assert_eq!(*list.head(), "a");
/// assert_eq!(*list.tail().head(), "b");
/// assert!(list.tail().tail().is_empty());
/// ```
pub struct List<T> {
	node: Option<Arc<Node<T>>>,
}

struct Node<T> {
	value: T,
	tail: List<T>,
	len: usize,
}

impl<T> List<T> {
	/// Returns the empty list.
	pub const fn new() -> Self {
		Self { node: None }
	}

	/// Returns `true` if the list has no elements.
	pub fn is_empty(&self) -> bool {
		self.node.is_none()
	}

	/// Returns the number of elements. Cached per node, so O(1).
	pub fn size(&self) -> usize {
		self.node.as_ref().map_or(0, |node| node.len)
	}

	/// Returns a new list with `value` in front of `self`.
	#[must_use]
	pub fn prepend(&self, value: T) -> Self {
		Self {
			node: Some(Arc::new(Node {
				len: self.size() + 1,
				value,
				tail: self.clone(),
			})),
		}
	}

	/// Returns the first element.
	///
	/// # Panics
	///
	/// Panics if the list is empty. Use [`List::first`] for a checked access.
	pub fn head(&self) -> &T {
		match &self.node {
			Some(node) => &node.value,
			None => panic!("called `List::head()` on an empty list"),
		}
	}

	/// Returns the list without its first element.
	///
	/// # Panics
	///
	/// Panics if the list is empty. Use [`List::rest`] for a checked access.
	pub fn tail(&self) -> Self {
		match &self.node {
			Some(node) => node.tail.clone(),
			None => panic!("called `List::tail()` on an empty list"),
		}
	}

	/// Returns the first element, or `None` for the empty list.
	pub fn first(&self) -> Option<&T> {
		self.node.as_ref().map(|node| &node.value)
	}

	/// Returns the list without its first element, or `None` for the empty list.
	pub fn rest(&self) -> Option<Self> {
		self.node.as_ref().map(|node| node.tail.clone())
	}

	/// Calls `f` on every element from head to last.
	pub fn for_each<F>(&self, mut f: F)
	where
		F: FnMut(&T),
	{
		for value in self.iter() {
			f(value);
		}
	}

	/// Returns a borrowing iterator from head to last.
	pub fn iter(&self) -> Iter<'_, T> {
		Iter {
			next: self.node.as_deref(),
			remaining: self.size(),
		}
	}

	/// Returns `true` if both lists are the same chain (not merely equal).
	pub fn ptr_eq(&self, other: &Self) -> bool {
		match (&self.node, &other.node) {
			(Some(a), Some(b)) => Arc::ptr_eq(a, b),
			(None, None) => true,
			_ => false,
		}
	}
}

impl<T: Clone> List<T> {
	/// Returns a new list with the elements in the opposite order.
	#[must_use]
	pub fn reverse(&self) -> Self {
		let mut reversed = Self::new();
		for value in self.iter() {
			reversed = reversed.prepend(value.clone());
		}
		reversed
	}
}

impl<T> Clone for List<T> {
	fn clone(&self) -> Self {
		Self {
			node: self.node.clone(),
		}
	}
}

impl<T> Default for List<T> {
	fn default() -> Self {
		Self::new()
	}
}

// Unlink uniquely owned nodes one at a time; the default recursive drop
// would use one stack frame per element.
impl<T> Drop for List<T> {
	fn drop(&mut self) {
		let mut next = self.node.take();
		while let Some(node) = next {
			match Arc::try_unwrap(node) {
				Ok(mut node) => next = node.tail.node.take(),
				Err(_) => break,
			}
		}
	}
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.iter()).finish()
	}
}

impl<T: PartialEq> PartialEq for List<T> {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other) || (self.size() == other.size() && self.iter().eq(other.iter()))
	}
}

impl<T: Eq> Eq for List<T> {}

/// Collects so that iteration order equals the input order.
impl<T> FromIterator<T> for List<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		let items: Vec<T> = iter.into_iter().collect();
		let mut list = Self::new();
		for value in items.into_iter().rev() {
			list = list.prepend(value);
		}
		list
	}
}

impl<'a, T> IntoIterator for &'a List<T> {
	type Item = &'a T;
	type IntoIter = Iter<'a, T>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Borrowing iterator over a [`List`].
pub struct Iter<'a, T> {
	next: Option<&'a Node<T>>,
	remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
	type Item = &'a T;

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.next?;
		self.next = node.tail.node.as_deref();
		self.remaining -= 1;
		Some(&node.value)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.remaining, Some(self.remaining))
	}
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	fn test_empty_list() {
		// Arrange
		let list: List<i32> = List::new();

		// Assert
		assert!(list.is_empty());
		assert_eq!(list.size(), 0);
		assert_eq!(list.first(), None);
		assert!(list.rest().is_none());
	}

	#[rstest]
	fn test_prepend_shares_tail() {
		// Arrange
		let base = List::new().prepend(1);

		// Act
		let left = base.prepend(2);
		let right = base.prepend(3);

		// Assert
		assert!(left.tail().ptr_eq(&base));
		assert!(right.tail().ptr_eq(&base));
		assert_eq!(base.size(), 1);
		assert_eq!(left.iter().copied().collect::<Vec<_>>(), vec![2, 1]);
		assert_eq!(right.iter().copied().collect::<Vec<_>>(), vec![3, 1]);
	}

	#[rstest]
	#[should_panic(expected = "empty list")]
	fn test_head_of_empty_panics() {
		let list: List<i32> = List::new();
		let _ = list.head();
	}

	#[rstest]
	#[should_panic(expected = "empty list")]
	fn test_tail_of_empty_panics() {
		let list: List<i32> = List::new();
		let _ = list.tail();
	}

	#[rstest]
	#[case::empty(vec![], vec![])]
	#[case::single(vec![1], vec![1])]
	#[case::several(vec![1, 2, 3], vec![3, 2, 1])]
	fn test_reverse(#[case] input: Vec<i32>, #[case] expected: Vec<i32>) {
		// Arrange
		let list: List<i32> = input.into_iter().collect();

		// Act
		let reversed = list.reverse();

		// Assert
		assert_eq!(reversed.iter().copied().collect::<Vec<_>>(), expected);
		assert_eq!(reversed.size(), list.size());
	}

	#[rstest]
	fn test_for_each_visits_head_first() {
		// Arrange
		let list = List::new().prepend("c").prepend("b").prepend("a");
		let mut seen = Vec::new();

		// Act
		list.for_each(|value| seen.push(*value));

		// Assert
		assert_eq!(seen, vec!["a", "b", "c"]);
	}

	#[rstest]
	fn test_from_iter_keeps_order() {
		let list: List<_> = (1..=4).collect();

		assert_eq!(*list.head(), 1);
		assert_eq!(list.size(), 4);
		assert_eq!(format!("{list:?}"), "[1, 2, 3, 4]");
	}

	#[rstest]
	fn test_long_list_drops_without_overflow() {
		// Arrange
		let mut list = List::new();
		for i in 0..200_000 {
			list = list.prepend(i);
		}

		// Act
		let reversed = list.reverse();

		// Assert
		assert_eq!(*reversed.head(), 0);
		drop(list);
		drop(reversed);
	}
}
