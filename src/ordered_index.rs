use crate::error::IndexError;
use crate::iter::Iter;
use crate::query::RangeQuery;

/// The operations shared by [`BstIndex`](crate::BstIndex) and [`AvlIndex`](crate::AvlIndex).
///
/// An ordered index maps each key to a non-empty bucket of values kept in
/// insertion order. Reads never mutate the index. Mutations re-anchor the
/// index's root internally, so a handle stays valid across rotations and root
/// deletions.
///
/// Every operation that compares keys is fallible: a comparator may report
/// [`NotComparable`](crate::NotComparable), which is surfaced before anything is
/// mutated.
pub trait OrderedIndex<K, V> {
    /// Adds `value` to `key`'s bucket, creating the key if needed.
    ///
    /// # Errors
    ///
    /// - [`IndexError::UniqueConstraintViolation`] if the index enforces unique keys
    ///   and `key` is present. The existing bucket is left unchanged.
    /// - [`IndexError::NotComparable`] if the comparator fails.
    fn insert(&mut self, key: K, value: V) -> Result<(), IndexError<K>>;

    /// Removes values stored under `key`.
    ///
    /// With `Some(value)` and a bucket of several entries, only the entries equal
    /// to `value` under the index's value equality are removed, and the key
    /// disappears if that empties its bucket. Otherwise, including a single-entry
    /// bucket whatever its value, the key and its whole bucket are removed.
    /// Deleting an absent key does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotComparable`] if the comparator fails.
    fn delete(&mut self, key: &K, value: Option<&V>) -> Result<(), IndexError<K>>;

    /// Returns the bucket stored under `key`, or an empty slice.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotComparable`] if the comparator fails.
    fn search(&self, key: &K) -> Result<&[V], IndexError<K>>;

    /// Returns the values of every key admitted by `query`, in ascending key
    /// order and bucket order within a key.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotComparable`] if the comparator fails.
    fn between_bounds(&self, query: &RangeQuery<K>) -> Result<Vec<&V>, IndexError<K>>;

    /// Number of distinct keys.
    fn number_of_keys(&self) -> usize;

    /// Iterates over keys and their buckets in ascending key order.
    fn iter(&self) -> Iter<'_, K, V>;

    /// Smallest key, if any.
    fn min_key(&self) -> Option<&K>;

    /// Largest key, if any.
    fn max_key(&self) -> Option<&K>;

    /// Number of nodes on the longest root-to-leaf path; 0 when empty.
    fn height(&self) -> usize;

    /// Runs every structural diagnostic this variant guarantees.
    ///
    /// Intended for tests. A failure means the index is corrupted.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`](crate::InvariantViolation) found, or
    /// [`IndexError::NotComparable`] if the comparator fails.
    fn check_invariants(&self) -> Result<(), IndexError<K>>;

    /// Returns `true` if the index holds no keys.
    fn is_empty(&self) -> bool {
        self.number_of_keys() == 0
    }

    /// Calls `visitor` with every key and its bucket, in ascending key order.
    fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&K, &[V]),
    {
        for (key, bucket) in self.iter() {
            visitor(key, bucket);
        }
    }
}
