use core::fmt;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::error::IndexError;
use crate::iter::Iter;
use crate::options::IndexOptions;
use crate::ordered_index::OrderedIndex;
use crate::policy::{Comparator, NaturalOrder, PartialEqValues, ValueEquality};
use crate::query::RangeQuery;
use crate::raw::RawTree;

/// An ordered multi-valued index backed by a plain binary search tree.
///
/// Keys are placed by repeated comparison and never moved to rebalance, so the
/// height depends on insertion order: ascending inserts produce a chain. When a
/// key with two children is deleted, a coin flip from the index's random source
/// decides whether its in-order predecessor or successor takes its place.
///
/// Use [`AvlIndex`](crate::AvlIndex) when inserts may arrive sorted.
///
/// # Examples
///
/// ```
/// use bucket_tree::{BstIndex, OrderedIndex, RangeQuery};
///
/// let mut index = BstIndex::new();
/// index.insert(15, "a").unwrap();
/// index.insert(12, "b").unwrap();
/// index.insert(18, "c").unwrap();
/// index.insert(18, "d").unwrap();
///
/// assert_eq!(index.search(&15).unwrap(), ["a"]);
/// assert_eq!(index.search(&18).unwrap(), ["c", "d"]);
/// assert!(index.search(&1).unwrap().is_empty());
///
/// let found = index.between_bounds(&RangeQuery::new().gte(12).lt(18)).unwrap();
/// assert_eq!(found, [&"b", &"a"]);
/// ```
///
/// Deterministic deletions for tests:
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use bucket_tree::{BstIndex, IndexOptions, OrderedIndex};
///
/// let mut index = BstIndex::with_rng(IndexOptions::new(), StdRng::seed_from_u64(7));
/// for key in [5, 3, 8] {
///     index.insert(key, key * 2).unwrap();
/// }
/// index.delete(&5, None).unwrap();
/// assert_eq!(index.number_of_keys(), 2);
/// ```
pub struct BstIndex<K, V, C = NaturalOrder, E = PartialEqValues, R = SmallRng> {
    raw: RawTree<K, V, C, E>,
    rng: R,
}

impl<K, V> BstIndex<K, V> {
    /// Makes a new, empty index with natural key order and duplicate keys allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucket_tree::{BstIndex, OrderedIndex};
    ///
    /// let index: BstIndex<u32, &str> = BstIndex::new();
    /// assert!(index.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(IndexOptions::new())
    }
}

impl<K, V> Default for BstIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, E> BstIndex<K, V, C, E> {
    /// Makes a new, empty index with the given policies and an entropy-seeded
    /// random source.
    #[must_use]
    pub fn with_options(options: IndexOptions<C, E>) -> Self {
        Self::with_rng(options, SmallRng::from_entropy())
    }
}

impl<K, V, C, E, R> BstIndex<K, V, C, E, R> {
    /// Makes a new, empty index that draws deletion coin flips from `rng`.
    #[must_use]
    pub fn with_rng(options: IndexOptions<C, E>, rng: R) -> Self {
        Self {
            raw: RawTree::new(options),
            rng,
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

impl<K, V, C, E, R> OrderedIndex<K, V> for BstIndex<K, V, C, E, R>
where
    C: Comparator<K>,
    E: ValueEquality<V>,
    R: RngCore,
{
    fn insert(&mut self, key: K, value: V) -> Result<(), IndexError<K>> {
        let root = self.raw.bst_insert(key, value)?;
        self.raw.set_root(root);
        Ok(())
    }

    fn delete(&mut self, key: &K, value: Option<&V>) -> Result<(), IndexError<K>> {
        let root = self.raw.bst_delete(key, value, &mut self.rng)?;
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

    fn height(&self) -> usize {
        self.raw.height()
    }

    fn check_invariants(&self) -> Result<(), IndexError<K>> {
        self.raw.check_ordering()?;
        self.raw.check_parent_links()?;
        self.raw.check_buckets()?;
        self.raw.check_reachability()?;
        Ok(())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C, E, R> fmt::Debug for BstIndex<K, V, C, E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.raw.iter()).finish()
    }
}
