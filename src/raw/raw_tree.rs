use core::cmp::Ordering;

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, Side};
use crate::error::{IndexError, InvariantViolation, NotComparable};
use crate::iter::Iter;
use crate::options::IndexOptions;
use crate::policy::{Comparator, ValueEquality};
use crate::query::{LowerMatcher, RangeQuery, UpperMatcher};

/// Ancestors visited while descending, root first.
pub(crate) type Path = SmallVec<[Handle; 32]>;

/// The arena-backed binary search tree shared by both index variants.
///
/// This type owns the node storage, the tree-wide policies and every read path.
/// The variant-specific insert and delete algorithms live in `raw/bst.rs` and
/// `raw/avl.rs`; both return the (possibly new) root, which the public wrapper
/// stores back with [`RawTree::set_root`].
pub(crate) struct RawTree<K, V, C, E> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node, `None` for the empty tree.
    root: Option<Handle>,
    comparator: C,
    equality: E,
    unique_keys: bool,
}

impl<K, V, C, E> RawTree<K, V, C, E> {
    /// Creates a new, empty tree.
    pub(crate) fn new(options: IndexOptions<C, E>) -> Self {
        Self {
            nodes: Arena::with_capacity(options.capacity),
            root: None,
            comparator: options.comparator,
            equality: options.equality,
            unique_keys: options.unique_keys,
        }
    }

    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    /// Re-anchors the tree after a structural mutation.
    pub(crate) fn set_root(&mut self, root: Option<Handle>) {
        if let Some(root) = root {
            debug_assert!(self.node(root).parent().is_none(), "new root still has a parent");
        }
        self.root = root;
    }

    pub(crate) fn unique_keys(&self) -> bool {
        self.unique_keys
    }

    /// Number of distinct keys; every live node holds exactly one.
    pub(crate) fn number_of_keys(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Drops every node, returning to the empty tree.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V> {
        self.nodes.get_mut(handle)
    }

    /// Allocates the first node of an empty tree.
    pub(crate) fn alloc_root(&mut self, key: K, value: V) -> Handle {
        debug_assert!(self.root.is_none(), "`alloc_root()` on a non-empty tree");
        let handle = self.nodes.alloc(Node::new(key, value, None));
        trace!(node = ?handle, "created root");
        handle
    }

    /// Allocates a leaf under `parent` in its empty `side` slot.
    pub(crate) fn alloc_child(&mut self, parent: Handle, side: Side, key: K, value: V) -> Handle {
        debug_assert!(self.node(parent).child(side).is_none(), "child slot is occupied");
        let child = self.nodes.alloc(Node::new(key, value, Some(parent)));
        self.node_mut(parent).set_child(side, Some(child));
        trace!(node = ?child, parent = ?parent, ?side, "created leaf");
        child
    }

    /// Releases a node that has already been unlinked.
    pub(crate) fn free(&mut self, handle: Handle) -> Node<K, V> {
        self.nodes.take(handle)
    }

    /// Returns the parent of `handle` and the slot it occupies there.
    pub(crate) fn position(&self, handle: Handle) -> Option<(Handle, Side)> {
        let parent = self.node(handle).parent()?;
        let side = if self.node(parent).left() == Some(handle) {
            Side::Left
        } else {
            Side::Right
        };
        Some((parent, side))
    }

    /// Puts `replacement` where `node` hangs from its parent.
    ///
    /// `node`'s own links are left untouched. When `node` is the root, the
    /// replacement comes back parentless and the caller must re-anchor the tree.
    pub(crate) fn splice(&mut self, node: Handle, replacement: Option<Handle>) {
        let position = self.position(node);
        if let Some(replacement) = replacement {
            self.node_mut(replacement).set_parent(position.map(|(parent, _)| parent));
        }
        if let Some((parent, side)) = position {
            self.node_mut(parent).set_child(side, replacement);
        }
    }

    /// Leftmost node of the subtree rooted at `handle`.
    pub(crate) fn min_descendant(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self.node(handle).left() {
            handle = left;
        }
        handle
    }

    /// Rightmost node of the subtree rooted at `handle`.
    pub(crate) fn max_descendant(&self, mut handle: Handle) -> Handle {
        while let Some(right) = self.node(handle).right() {
            handle = right;
        }
        handle
    }

    pub(crate) fn min_key(&self) -> Option<&K> {
        self.root.map(|root| self.node(self.min_descendant(root)).key())
    }

    pub(crate) fn max_key(&self) -> Option<&K> {
        self.root.map(|root| self.node(self.max_descendant(root)).key())
    }

    /// Cached height of an optional subtree; absent subtrees have height 0.
    #[inline]
    pub(crate) fn height_of(&self, handle: Option<Handle>) -> u32 {
        handle.map_or(0, |handle| self.node(handle).height())
    }

    /// Recomputes `handle`'s cached height from its children.
    pub(crate) fn update_height(&mut self, handle: Handle) {
        let node = self.node(handle);
        let height = 1 + self.height_of(node.left()).max(self.height_of(node.right()));
        self.node_mut(handle).set_height(height);
    }

    /// Left height minus right height, from the cached heights.
    pub(crate) fn balance_factor(&self, handle: Handle) -> i64 {
        let node = self.node(handle);
        i64::from(self.height_of(node.left())) - i64::from(self.height_of(node.right()))
    }

    /// Height of the tree measured by walking it; 0 when empty.
    pub(crate) fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(Handle, usize)> = self.root.into_iter().map(|root| (root, 1)).collect();
        while let Some((handle, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let node = self.node(handle);
            stack.extend(node.left().into_iter().chain(node.right()).map(|child| (child, depth + 1)));
        }
        deepest
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.nodes, self.root)
    }

    /// Appends `value` to an existing key's bucket, unless keys must be unique.
    pub(crate) fn append_value(&mut self, handle: Handle, key: K, value: V) -> Result<(), IndexError<K>> {
        if self.unique_keys {
            debug!(node = ?handle, "rejected insert of an existing key into a unique index");
            return Err(IndexError::UniqueConstraintViolation { key });
        }
        self.node_mut(handle).bucket_mut().push(value);
        Ok(())
    }

    /// Every node reachable from the root, parents before children.
    fn reachable(&self) -> Vec<Handle> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<Handle> = self.root.into_iter().collect();
        while let Some(handle) = stack.pop() {
            order.push(handle);
            let node = self.node(handle);
            stack.extend(node.right());
            stack.extend(node.left());
        }
        order
    }

    /// Checks that every child points back at its parent and the root has none.
    pub(crate) fn check_parent_links(&self) -> Result<(), InvariantViolation> {
        if let Some(root) = self.root
            && self.node(root).parent().is_some()
        {
            return Err(InvariantViolation::RootHasParent { node: root.to_index() });
        }
        for handle in self.reachable() {
            let node = self.node(handle);
            for child in node.left().into_iter().chain(node.right()) {
                if self.node(child).parent() != Some(handle) {
                    return Err(InvariantViolation::ParentLink {
                        node: child.to_index(),
                        parent: handle.to_index(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Checks that no key is left with an empty bucket.
    pub(crate) fn check_buckets(&self) -> Result<(), InvariantViolation> {
        match self.reachable().into_iter().find(|&handle| self.node(handle).bucket().is_empty()) {
            Some(handle) => Err(InvariantViolation::EmptyBucket { node: handle.to_index() }),
            None => Ok(()),
        }
    }

    /// Checks that the arena holds no node detached from the tree.
    pub(crate) fn check_reachability(&self) -> Result<(), InvariantViolation> {
        let reachable = self.reachable().len();
        let allocated = self.nodes.len();
        if reachable == allocated {
            Ok(())
        } else {
            Err(InvariantViolation::Unreachable { reachable, allocated })
        }
    }

    /// Checks every cached height against the heights of the children.
    pub(crate) fn check_heights(&self) -> Result<(), InvariantViolation> {
        match self.root {
            Some(root) => self.verified_height(root).map(drop),
            None => Ok(()),
        }
    }

    fn verified_height(&self, handle: Handle) -> Result<u32, InvariantViolation> {
        let node = self.node(handle);
        let left = node.left().map_or(Ok(0), |left| self.verified_height(left))?;
        let right = node.right().map_or(Ok(0), |right| self.verified_height(right))?;
        let actual = 1 + left.max(right);
        if node.height() != actual {
            return Err(InvariantViolation::Height {
                node: handle.to_index(),
                cached: node.height(),
                actual,
            });
        }
        Ok(actual)
    }

    /// Checks that every balance factor lies in `[-1, 1]`. Assumes exact heights.
    pub(crate) fn check_balance_factors(&self) -> Result<(), InvariantViolation> {
        for handle in self.reachable() {
            let balance = self.balance_factor(handle);
            if !(-1..=1).contains(&balance) {
                return Err(InvariantViolation::Balance {
                    node: handle.to_index(),
                    balance,
                });
            }
        }
        Ok(())
    }
}

impl<K, V, C: Comparator<K>, E> RawTree<K, V, C, E> {
    #[inline]
    pub(crate) fn compare(&self, a: &K, b: &K) -> Result<Ordering, NotComparable> {
        self.comparator.compare(a, b)
    }

    /// Locates the node holding `key`.
    pub(crate) fn find(&self, key: &K) -> Result<Option<Handle>, NotComparable> {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            current = match self.compare(key, node.key())? {
                Ordering::Equal => return Ok(Some(handle)),
                Ordering::Less => node.left(),
                Ordering::Greater => node.right(),
            };
        }
        Ok(None)
    }

    /// The bucket stored under `key`, or an empty slice.
    pub(crate) fn search(&self, key: &K) -> Result<&[V], NotComparable> {
        let bucket: &[V] = match self.find(key)? {
            Some(handle) => self.node(handle).bucket(),
            None => &[],
        };
        Ok(bucket)
    }

    /// Collects the buckets of every key admitted by `query`, in ascending key order.
    ///
    /// A subtree is only entered when the matcher on its side still admits the
    /// current key: if the lower bound rejects a key, every key to its left is
    /// smaller and rejected too, and symmetrically for the upper bound.
    pub(crate) fn between_bounds(&self, query: &RangeQuery<K>) -> Result<Vec<&V>, NotComparable> {
        let lower = LowerMatcher::new(query, &self.comparator)?;
        let upper = UpperMatcher::new(query, &self.comparator)?;

        let mut found = Vec::new();
        // Pending nodes with the lower-matcher verdict for their own key.
        let mut stack: SmallVec<[(Handle, bool); 32]> = SmallVec::new();
        let mut current = self.root;
        loop {
            while let Some(handle) = current {
                let node = self.node(handle);
                let above_lower = lower.matches(node.key(), &self.comparator)?;
                stack.push((handle, above_lower));
                current = if above_lower { node.left() } else { None };
            }
            let Some((handle, above_lower)) = stack.pop() else {
                break;
            };
            let node = self.node(handle);
            let below_upper = upper.matches(node.key(), &self.comparator)?;
            if above_lower && below_upper {
                found.extend(node.bucket());
            }
            current = if below_upper { node.right() } else { None };
        }
        Ok(found)
    }

    /// Checks that an in-order walk yields strictly increasing keys.
    pub(crate) fn check_ordering(&self) -> Result<(), IndexError<K>> {
        let mut previous: Option<&K> = None;
        let mut stack: Vec<Handle> = Vec::new();
        let mut current = self.root;
        loop {
            while let Some(handle) = current {
                stack.push(handle);
                current = self.node(handle).left();
            }
            let Some(handle) = stack.pop() else {
                return Ok(());
            };
            let node = self.node(handle);
            if let Some(previous) = previous
                && self.compare(previous, node.key())? != Ordering::Less
            {
                return Err(InvariantViolation::Ordering { node: handle.to_index() }.into());
            }
            previous = Some(node.key());
            current = node.right();
        }
    }
}

impl<K, V, C, E: ValueEquality<V>> RawTree<K, V, C, E> {
    /// Applies a value-targeted delete to `handle`'s bucket.
    ///
    /// A bucket with several entries loses those equal to `value`. A single-entry
    /// bucket is left as is, since the whole node goes regardless of the value.
    /// Returns `true` when the node must stay in the tree.
    pub(crate) fn remove_values(&mut self, handle: Handle, value: &V) -> bool {
        let equality = &self.equality;
        let bucket = self.nodes.get_mut(handle).bucket_mut();
        let before = bucket.len();
        if before == 1 {
            return false;
        }
        bucket.retain(|stored| !equality.equals(stored, value));
        trace!(node = ?handle, removed = before - bucket.len(), "removed matching values");
        !bucket.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::policy::{NaturalOrder, PartialEqValues};
    use pretty_assertions::assert_eq;

    type Tree = RawTree<i32, &'static str, NaturalOrder, PartialEqValues>;

    /// Builds
    ///
    /// ```text
    ///        15
    ///       /  \
    ///     12    18
    ///    /     /  \
    ///   4     16   20
    /// ```
    fn sample() -> (Tree, [Handle; 6]) {
        let mut tree = Tree::new(IndexOptions::new());
        let root = tree.alloc_root(15, "a");
        let n12 = tree.alloc_child(root, Side::Left, 12, "b");
        let n18 = tree.alloc_child(root, Side::Right, 18, "c");
        let n4 = tree.alloc_child(n12, Side::Left, 4, "d");
        let n16 = tree.alloc_child(n18, Side::Left, 16, "e");
        let n20 = tree.alloc_child(n18, Side::Right, 20, "f");
        tree.set_root(Some(root));
        (tree, [root, n12, n18, n4, n16, n20])
    }

    fn values(found: Vec<&&'static str>) -> Vec<&'static str> {
        found.into_iter().copied().collect()
    }

    #[test]
    fn search_follows_a_single_path() {
        let (tree, _) = sample();
        assert_eq!(tree.search(&16).unwrap(), ["e"]);
        assert_eq!(tree.search(&4).unwrap(), ["d"]);
        assert!(tree.search(&17).unwrap().is_empty());
        assert!(tree.search(&-1).unwrap().is_empty());
    }

    #[test]
    fn between_bounds_is_in_key_order() {
        let (tree, _) = sample();
        let all = tree.between_bounds(&RangeQuery::new()).unwrap();
        assert_eq!(values(all), ["d", "b", "a", "e", "c", "f"]);

        let middle = tree.between_bounds(&RangeQuery::new().gt(4).lte(18)).unwrap();
        assert_eq!(values(middle), ["b", "a", "e", "c"]);

        let none = tree.between_bounds(&RangeQuery::new().gt(20)).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn between_bounds_prunes_rejected_subtrees() {
        use core::cell::Cell;

        let calls = Cell::new(0);
        let counting = |a: &i32, b: &i32| {
            calls.set(calls.get() + 1);
            a.cmp(b)
        };
        let mut tree = RawTree::new(IndexOptions::new().comparator(counting));
        let root = tree.alloc_root(15, "a");
        let n12 = tree.alloc_child(root, Side::Left, 12, "b");
        tree.alloc_child(n12, Side::Left, 4, "d");
        tree.alloc_child(root, Side::Right, 18, "c");
        tree.set_root(Some(root));

        calls.set(0);
        let found = tree.between_bounds(&RangeQuery::new().gte(16)).unwrap();
        assert_eq!(values(found), ["c"]);
        // 15 and 18 against the lower bound; 12 and 4 are never visited.
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn splice_relinks_parent_and_child() {
        let (mut tree, [root, n12, n18, n4, ..]) = sample();
        tree.splice(n12, Some(n4));
        tree.free(n12);

        assert_eq!(tree.node(root).left(), Some(n4));
        assert_eq!(tree.node(n4).parent(), Some(root));
        assert_eq!(tree.position(n18), Some((root, Side::Right)));
        tree.check_parent_links().unwrap();
        tree.check_reachability().unwrap();
        tree.check_ordering().unwrap();
    }

    #[test]
    fn splice_of_root_leaves_replacement_parentless() {
        let (mut tree, [root, n12, ..]) = sample();
        tree.splice(root, Some(n12));
        assert_eq!(tree.node(n12).parent(), None);
    }

    #[test]
    fn descendants_and_extremes() {
        let (tree, [root, _, n18, n4, n16, n20]) = sample();
        assert_eq!(tree.min_descendant(root), n4);
        assert_eq!(tree.max_descendant(root), n20);
        assert_eq!(tree.min_descendant(n18), n16);
        assert_eq!(tree.min_key(), Some(&4));
        assert_eq!(tree.max_key(), Some(&20));
        assert_eq!(tree.height(), 3);
    }

    #[test]
    fn diagnostics_catch_corruption() {
        let (mut tree, [root, n12, n18, ..]) = sample();
        tree.check_ordering().unwrap();

        tree.node_mut(n18).set_parent(Some(n12));
        assert_eq!(
            tree.check_parent_links(),
            Err(InvariantViolation::ParentLink {
                node: n18.to_index(),
                parent: root.to_index()
            })
        );
        tree.node_mut(n18).set_parent(Some(root));

        tree.node_mut(n12).replace_payload(40, smallvec::smallvec!["b"]);
        assert_eq!(
            tree.check_ordering(),
            Err(IndexError::InvariantViolation(InvariantViolation::Ordering { node: root.to_index() }))
        );
    }

    #[test]
    fn height_and_balance_diagnostics() {
        let (mut tree, [root, n12, n18, n4, n16, n20]) = sample();
        // Heights were never maintained by the raw primitives.
        assert!(tree.check_heights().is_err());

        for handle in [n4, n16, n20, n12, n18, root] {
            tree.update_height(handle);
        }
        tree.check_heights().unwrap();
        tree.check_balance_factors().unwrap();
        assert_eq!(tree.balance_factor(root), 0);
        assert_eq!(tree.balance_factor(n12), 1);
    }

    #[test]
    fn remove_values_reports_remaining_entries() {
        let (mut tree, [root, ..]) = sample();
        tree.append_value(root, 15, "z").unwrap();
        tree.append_value(root, 15, "a").unwrap();

        assert!(tree.remove_values(root, &"a"));
        assert_eq!(tree.node(root).bucket(), ["z"]);

        // A lone entry means the node goes, whatever the value.
        assert!(!tree.remove_values(root, &"missing"));
        assert_eq!(tree.node(root).bucket(), ["z"]);

        tree.append_value(root, 15, "y").unwrap();
        assert!(tree.remove_values(root, &"missing"));
        assert_eq!(tree.node(root).bucket(), ["z", "y"]);

        tree.append_value(root, 15, "z").unwrap();
        assert!(tree.remove_values(root, &"z"));
        assert_eq!(tree.node(root).bucket(), ["y"]);

        tree.append_value(root, 15, "y").unwrap();
        assert!(!tree.remove_values(root, &"y"));
        assert_eq!(tree.check_buckets(), Err(InvariantViolation::EmptyBucket { node: root.to_index() }));
    }

    #[test]
    fn unique_tree_rejects_appends() {
        let mut tree: Tree = RawTree::new(IndexOptions::new().unique_keys(true));
        let root = tree.alloc_root(1, "a");
        tree.set_root(Some(root));
        assert_eq!(
            tree.append_value(root, 1, "b"),
            Err(IndexError::UniqueConstraintViolation { key: 1 })
        );
        assert_eq!(tree.node(root).bucket(), ["a"]);
    }
}
