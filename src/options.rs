use crate::policy::{NaturalOrder, PartialEqValues};

/// Construction-time configuration shared by [`BstIndex`](crate::BstIndex) and
/// [`AvlIndex`](crate::AvlIndex).
///
/// The comparator, value equality and uniqueness flag are fixed for the lifetime
/// of the index they build.
///
/// # Examples
///
/// ```
/// use bucket_tree::{AvlIndex, IndexOptions, OrderedIndex};
///
/// let options = IndexOptions::new()
///     .unique_keys(true)
///     .comparator(|a: &String, b: &String| a.to_lowercase().cmp(&b.to_lowercase()));
/// let mut users: AvlIndex<String, u32, _> = AvlIndex::with_options(options);
///
/// users.insert("Alice".to_owned(), 1).unwrap();
/// assert!(users.insert("ALICE".to_owned(), 2).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct IndexOptions<C = NaturalOrder, E = PartialEqValues> {
    pub(crate) comparator: C,
    pub(crate) equality: E,
    pub(crate) unique_keys: bool,
    pub(crate) capacity: usize,
}

impl IndexOptions {
    /// Natural key order, `PartialEq` values, duplicate keys allowed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            comparator: NaturalOrder,
            equality: PartialEqValues,
            unique_keys: false,
            capacity: 0,
        }
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> IndexOptions<C, E> {
    /// Rejects inserts of a key that is already present.
    #[must_use]
    pub fn unique_keys(mut self, unique_keys: bool) -> Self {
        self.unique_keys = unique_keys;
        self
    }

    /// Pre-allocates room for `capacity` distinct keys.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Replaces the key comparator.
    #[must_use]
    pub fn comparator<C2>(self, comparator: C2) -> IndexOptions<C2, E> {
        IndexOptions {
            comparator,
            equality: self.equality,
            unique_keys: self.unique_keys,
            capacity: self.capacity,
        }
    }

    /// Replaces the value equality used by value-targeted deletes.
    #[must_use]
    pub fn equality<E2>(self, equality: E2) -> IndexOptions<C, E2> {
        IndexOptions {
            comparator: self.comparator,
            equality,
            unique_keys: self.unique_keys,
            capacity: self.capacity,
        }
    }

    /// Returns whether duplicate keys are rejected.
    #[must_use]
    pub fn has_unique_keys(&self) -> bool {
        self.unique_keys
    }
}
