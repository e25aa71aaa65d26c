use thiserror::Error;

/// The comparator could not place two keys relative to each other.
///
/// Raised by [`NaturalOrder`](crate::NaturalOrder) when `partial_cmp` returns `None`,
/// e.g. when a key is `f64::NAN`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("keys cannot be ordered: they are neither less, greater, nor equal")]
pub struct NotComparable;

/// A structural invariant does not hold.
///
/// These are reported by the `check_*` diagnostics and always indicate a bug in
/// the mutation logic rather than bad input. `node` is the arena slot index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// An in-order walk met a key that is not strictly greater than its predecessor.
    #[error("key at node {node} is not strictly greater than its in-order predecessor")]
    Ordering { node: usize },

    /// A child does not point back at the node that holds it.
    #[error("node {node} does not point back at its parent {parent}")]
    ParentLink { node: usize, parent: usize },

    /// The root carries a parent link.
    #[error("root node {node} has a parent")]
    RootHasParent { node: usize },

    /// A node holds a key with no values.
    #[error("node {node} holds an empty bucket")]
    EmptyBucket { node: usize },

    /// The arena holds nodes that cannot be reached from the root.
    #[error("{reachable} nodes are reachable from the root but {allocated} are allocated")]
    Unreachable { reachable: usize, allocated: usize },

    /// The cached height differs from the computed one.
    #[error("node {node} caches height {cached} but its subtree has height {actual}")]
    Height { node: usize, cached: u32, actual: u32 },

    /// Left and right subtree heights differ by more than one.
    #[error("node {node} has balance factor {balance}")]
    Balance { node: usize, balance: i64 },
}

/// The error type returned by index operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError<K> {
    /// The index enforces unique keys and `key` is already present.
    #[error("unique constraint violated: key {key:?} already exists")]
    UniqueConstraintViolation { key: K },

    /// The comparator failed to order two keys.
    #[error(transparent)]
    NotComparable(#[from] NotComparable),

    /// A diagnostic check found a corrupted tree.
    #[error(transparent)]
    InvariantViolation(#[from] InvariantViolation),
}
