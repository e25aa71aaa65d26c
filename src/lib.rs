//! Ordered multi-valued index trees for Rust.
//!
//! This crate provides two in-memory secondary-index structures that map each key
//! to an ordered bucket of values:
//!
//! - [`BstIndex`] - a plain binary search tree with randomized two-children deletion
//! - [`AvlIndex`] - a self-balancing AVL tree with O(log n) height
//!
//! Both implement [`OrderedIndex`]: point lookup, range queries with any mix of
//! inclusive and exclusive bounds, value- or key-level deletion and in-order
//! traversal. Keys may repeat unless the index is built with unique keys.
//!
//! # Example
//!
//! ```
//! use bucket_tree::{AvlIndex, IndexError, IndexOptions, OrderedIndex, RangeQuery};
//!
//! let mut ages = AvlIndex::new();
//! ages.insert(31, "carol").unwrap();
//! ages.insert(25, "alice").unwrap();
//! ages.insert(25, "bob").unwrap();
//! ages.insert(40, "dave").unwrap();
//!
//! assert_eq!(ages.search(&25).unwrap(), ["alice", "bob"]);
//!
//! // 25 < age <= 40
//! let older = ages.between_bounds(&RangeQuery::new().gt(25).lte(40)).unwrap();
//! assert_eq!(older, [&"carol", &"dave"]);
//!
//! // Drop one value, then a whole key.
//! ages.delete(&25, Some(&"alice")).unwrap();
//! ages.delete(&40, None).unwrap();
//! assert_eq!(ages.number_of_keys(), 2);
//!
//! // Unique indexes reject a second value for a key.
//! let mut emails = AvlIndex::with_options(IndexOptions::new().unique_keys(true));
//! emails.insert("a@example.com", 1).unwrap();
//! assert_eq!(
//!     emails.insert("a@example.com", 2),
//!     Err(IndexError::UniqueConstraintViolation { key: "a@example.com" })
//! );
//! ```
//!
//! # Policies
//!
//! Key order comes from a [`Comparator`] and value identity (for value-level
//! deletes) from a [`ValueEquality`]; both are fixed when the index is built via
//! [`IndexOptions`]. The defaults are [`NaturalOrder`] and [`PartialEqValues`].
//! `NaturalOrder` refuses keys that `PartialOrd` cannot order, such as `NaN`,
//! with [`NotComparable`].
//!
//! # Implementation
//!
//! Nodes live in a slot arena and refer to their children and parent by index,
//! so parent links never own anything. Mutations return the possibly new root to
//! the index, which re-anchors itself; callers always hold the same handle.
//! Neither index is safe for concurrent mutation; wrap it in a lock if shared.

// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod error;
mod iter;
mod options;
mod ordered_index;
mod policy;
mod query;
mod raw;

pub mod avl_index;
pub mod bst_index;

pub use avl_index::AvlIndex;
pub use bst_index::BstIndex;
pub use error::{IndexError, InvariantViolation, NotComparable};
pub use iter::Iter;
pub use options::IndexOptions;
pub use ordered_index::OrderedIndex;
pub use policy::{Comparator, NaturalOrder, PartialEqValues, ValueEquality};
pub use query::RangeQuery;
