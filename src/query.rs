use core::cmp::Ordering;
use core::ops::Bound;

use crate::error::NotComparable;
use crate::policy::Comparator;

/// Bounds for [`between_bounds`](crate::OrderedIndex::between_bounds).
///
/// Each side may carry an exclusive and an inclusive bound at once; the tighter
/// of the two is applied. Unset sides are unbounded.
///
/// # Examples
///
/// ```
/// use bucket_tree::RangeQuery;
///
/// // 12 <= key < 18
/// let query = RangeQuery::new().gte(12).lt(18);
/// assert_eq!(query.lower_inclusive(), Some(&12));
/// assert_eq!(query.upper_exclusive(), Some(&18));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeQuery<K> {
    gt: Option<K>,
    gte: Option<K>,
    lt: Option<K>,
    lte: Option<K>,
}

impl<K> RangeQuery<K> {
    /// A query without bounds; it matches every key.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            gt: None,
            gte: None,
            lt: None,
            lte: None,
        }
    }

    /// Builds a query from standard library bounds.
    ///
    /// ```
    /// use core::ops::Bound;
    /// use bucket_tree::RangeQuery;
    ///
    /// let query = RangeQuery::from_bounds(Bound::Excluded(3), Bound::Unbounded);
    /// assert_eq!(query, RangeQuery::new().gt(3));
    /// ```
    #[must_use]
    pub fn from_bounds(start: Bound<K>, end: Bound<K>) -> Self {
        let mut query = Self::new();
        match start {
            Bound::Included(key) => query.gte = Some(key),
            Bound::Excluded(key) => query.gt = Some(key),
            Bound::Unbounded => {}
        }
        match end {
            Bound::Included(key) => query.lte = Some(key),
            Bound::Excluded(key) => query.lt = Some(key),
            Bound::Unbounded => {}
        }
        query
    }

    /// Keys must compare strictly greater than `key`.
    #[must_use]
    pub fn gt(mut self, key: K) -> Self {
        self.gt = Some(key);
        self
    }

    /// Keys must compare greater than or equal to `key`.
    #[must_use]
    pub fn gte(mut self, key: K) -> Self {
        self.gte = Some(key);
        self
    }

    /// Keys must compare strictly less than `key`.
    #[must_use]
    pub fn lt(mut self, key: K) -> Self {
        self.lt = Some(key);
        self
    }

    /// Keys must compare less than or equal to `key`.
    #[must_use]
    pub fn lte(mut self, key: K) -> Self {
        self.lte = Some(key);
        self
    }

    /// The exclusive lower bound (`gt`), if set.
    #[must_use]
    pub fn lower_exclusive(&self) -> Option<&K> {
        self.gt.as_ref()
    }

    /// The inclusive lower bound (`gte`), if set.
    #[must_use]
    pub fn lower_inclusive(&self) -> Option<&K> {
        self.gte.as_ref()
    }

    /// The exclusive upper bound (`lt`), if set.
    #[must_use]
    pub fn upper_exclusive(&self) -> Option<&K> {
        self.lt.as_ref()
    }

    /// The inclusive upper bound (`lte`), if set.
    #[must_use]
    pub fn upper_inclusive(&self) -> Option<&K> {
        self.lte.as_ref()
    }
}

impl<K> Default for RangeQuery<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Predicate for the lower side of a range query.
pub(crate) struct LowerMatcher<'q, K>(Bound<&'q K>);

impl<'q, K> LowerMatcher<'q, K> {
    /// Picks the active lower bound: `gte` wins only when strictly greater than `gt`.
    pub(crate) fn new<C>(query: &'q RangeQuery<K>, comparator: &C) -> Result<Self, NotComparable>
    where
        C: Comparator<K>,
    {
        let bound = match (&query.gt, &query.gte) {
            (None, None) => Bound::Unbounded,
            (Some(gt), None) => Bound::Excluded(gt),
            (None, Some(gte)) => Bound::Included(gte),
            (Some(gt), Some(gte)) => {
                if comparator.compare(gte, gt)? == Ordering::Greater {
                    Bound::Included(gte)
                } else {
                    Bound::Excluded(gt)
                }
            }
        };
        Ok(Self(bound))
    }

    pub(crate) fn matches<C>(&self, key: &K, comparator: &C) -> Result<bool, NotComparable>
    where
        C: Comparator<K>,
    {
        Ok(match self.0 {
            Bound::Unbounded => true,
            Bound::Included(bound) => comparator.compare(key, bound)? != Ordering::Less,
            Bound::Excluded(bound) => comparator.compare(key, bound)? == Ordering::Greater,
        })
    }
}

/// Predicate for the upper side of a range query.
pub(crate) struct UpperMatcher<'q, K>(Bound<&'q K>);

impl<'q, K> UpperMatcher<'q, K> {
    /// Picks the active upper bound: `lte` wins only when strictly less than `lt`.
    pub(crate) fn new<C>(query: &'q RangeQuery<K>, comparator: &C) -> Result<Self, NotComparable>
    where
        C: Comparator<K>,
    {
        let bound = match (&query.lt, &query.lte) {
            (None, None) => Bound::Unbounded,
            (Some(lt), None) => Bound::Excluded(lt),
            (None, Some(lte)) => Bound::Included(lte),
            (Some(lt), Some(lte)) => {
                if comparator.compare(lte, lt)? == Ordering::Less {
                    Bound::Included(lte)
                } else {
                    Bound::Excluded(lt)
                }
            }
        };
        Ok(Self(bound))
    }

    pub(crate) fn matches<C>(&self, key: &K, comparator: &C) -> Result<bool, NotComparable>
    where
        C: Comparator<K>,
    {
        Ok(match self.0 {
            Bound::Unbounded => true,
            Bound::Included(bound) => comparator.compare(key, bound)? != Ordering::Greater,
            Bound::Excluded(bound) => comparator.compare(key, bound)? == Ordering::Less,
        })
    }
}
