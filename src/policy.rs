//! Tree-wide key ordering and value equality policies.
//!
//! Both are fixed when an index is constructed and apply to every node it ever
//! holds. Closures implement the traits directly, so most callers never name
//! these types.

use core::cmp::Ordering;

use crate::error::NotComparable;

/// A three-way comparison over keys.
///
/// Implementations must describe a total order over the keys actually stored;
/// keys that cannot be ordered are reported as [`NotComparable`] instead of being
/// silently misplaced.
///
/// # Examples
///
/// ```
/// use core::cmp::Ordering;
/// use bucket_tree::{Comparator, NaturalOrder, NotComparable};
///
/// assert_eq!(NaturalOrder.compare(&1.5, &2.0), Ok(Ordering::Less));
/// assert_eq!(NaturalOrder.compare(&f64::NAN, &2.0), Err(NotComparable));
///
/// let reversed = |a: &i32, b: &i32| b.cmp(a);
/// assert_eq!(reversed.compare(&1, &2), Ok(Ordering::Greater));
/// ```
pub trait Comparator<K: ?Sized> {
    /// Orders `a` relative to `b`.
    ///
    /// # Errors
    ///
    /// Returns [`NotComparable`] if the two keys have no defined order.
    fn compare(&self, a: &K, b: &K) -> Result<Ordering, NotComparable>;
}

/// Orders keys by their [`PartialOrd`] implementation.
///
/// This covers numbers, strings and time types. Pairs for which `partial_cmp`
/// returns `None` fail with [`NotComparable`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: ?Sized + PartialOrd> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Result<Ordering, NotComparable> {
        a.partial_cmp(b).ok_or(NotComparable)
    }
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Result<Ordering, NotComparable> {
        Ok(self(a, b))
    }
}

/// Decides whether two stored values are the same entry, for value-targeted deletes.
pub trait ValueEquality<V: ?Sized> {
    /// Returns `true` if `a` and `b` denote the same value.
    fn equals(&self, a: &V, b: &V) -> bool;
}

/// Compares values with [`PartialEq`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartialEqValues;

impl<V: ?Sized + PartialEq> ValueEquality<V> for PartialEqValues {
    #[inline]
    fn equals(&self, a: &V, b: &V) -> bool {
        a == b
    }
}

impl<V: ?Sized, F> ValueEquality<V> for F
where
    F: Fn(&V, &V) -> bool,
{
    #[inline]
    fn equals(&self, a: &V, b: &V) -> bool {
        self(a, b)
    }
}
