use core::fmt;

use crate::error::IndexError;
use crate::iter::Iter;
use crate::options::IndexOptions;
use crate::ordered_index::OrderedIndex;
use crate::policy::{Comparator, NaturalOrder, PartialEqValues, ValueEquality};
use crate::query::RangeQuery;
use crate::raw::RawTree;

/// An ordered multi-valued index backed by an [AVL tree].
///
/// Every node caches the height of its subtree. After each insert or delete
/// that changes the tree's shape, the nodes on the path from the change up to
/// the root have their heights recomputed and are rotated wherever the left and
/// right heights differ by more than one. The height therefore stays below
/// about 1.44·log<sub>2</sub>(n + 2), whatever the insertion order.
///
/// Searches and range queries behave exactly like [`BstIndex`](crate::BstIndex).
///
/// # Examples
///
/// ```
/// use bucket_tree::{AvlIndex, OrderedIndex};
///
/// let mut index = AvlIndex::new();
/// for key in 1..=7 {
///     index.insert(key, key.to_string()).unwrap();
/// }
///
/// // Sorted inserts would form a chain of 7 in a plain BST.
/// assert_eq!(index.height(), 3);
/// index.check_invariants().unwrap();
///
/// index.delete(&4, None).unwrap();
/// assert!(index.search(&4).unwrap().is_empty());
/// assert_eq!(index.number_of_keys(), 6);
/// ```
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlIndex<K, V, C = NaturalOrder, E = PartialEqValues> {
    raw: RawTree<K, V, C, E>,
}

impl<K, V> AvlIndex<K, V> {
    /// Makes a new, empty index with natural key order and duplicate keys allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucket_tree::{AvlIndex, OrderedIndex};
    ///
    /// let index: AvlIndex<String, u64> = AvlIndex::new();
    /// assert_eq!(index.height(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(IndexOptions::new())
    }
}

impl<K, V> Default for AvlIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, E> AvlIndex<K, V, C, E> {
    /// Makes a new, empty index with the given policies.
    #[must_use]
    pub fn with_options(options: IndexOptions<C, E>) -> Self {
        Self {
            raw: RawTree::new(options),
        }
    }

    /// Returns whether duplicate keys are rejected.
    #[must_use]
    pub fn has_unique_keys(&self) -> bool {
        self.raw.unique_keys()
    }

    /// Returns the number of keys the index can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Removes every key, keeping the policies.
    pub fn clear(&mut self) {
        self.raw.clear();
    }
}

impl<K, V, C, E> OrderedIndex<K, V> for AvlIndex<K, V, C, E>
where
    C: Comparator<K>,
    E: ValueEquality<V>,
{
    fn insert(&mut self, key: K, value: V) -> Result<(), IndexError<K>> {
        let root = self.raw.avl_insert(key, value)?;
        self.raw.set_root(root);
        Ok(())
    }

    fn delete(&mut self, key: &K, value: Option<&V>) -> Result<(), IndexError<K>> {
        let root = self.raw.avl_delete(key, value)?;
        self.raw.set_root(root);
        Ok(())
    }

    fn search(&self, key: &K) -> Result<&[V], IndexError<K>> {
        Ok(self.raw.search(key)?)
    }

    fn between_bounds(&self, query: &RangeQuery<K>) -> Result<Vec<&V>, IndexError<K>> {
        Ok(self.raw.between_bounds(query)?)
    }

    fn number_of_keys(&self) -> usize {
        self.raw.number_of_keys()
    }

    fn iter(&self) -> Iter<'_, K, V> {
        self.raw.iter()
    }

    fn min_key(&self) -> Option<&K> {
        self.raw.min_key()
    }

    fn max_key(&self) -> Option<&K> {
        self.raw.max_key()
    }

    /// Reads the root's cached height in O(1).
    fn height(&self) -> usize {
        self.raw.root().map_or(0, |root| self.raw.node(root).height() as usize)
    }

    fn check_invariants(&self) -> Result<(), IndexError<K>> {
        self.raw.check_ordering()?;
        self.raw.check_parent_links()?;
        self.raw.check_buckets()?;
        self.raw.check_reachability()?;
        self.raw.check_heights()?;
        self.raw.check_balance_factors()?;
        Ok(())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C, E> fmt::Debug for AvlIndex<K, V, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.raw.iter()).finish()
    }
}
