//! Height-balanced insert and delete.
//!
//! Both operations record the nodes they descend through, mutate the tree like
//! the unbalanced variant would, then walk that path back up recomputing heights
//! and rotating wherever a balance factor left `[-1, 1]`.

use core::cmp::Ordering;

use smallvec::SmallVec;
use tracing::trace;

use super::handle::Handle;
use super::node::Side;
use super::raw_tree::{Path, RawTree};
use crate::error::{IndexError, NotComparable};
use crate::policy::{Comparator, ValueEquality};

impl<K, V, C, E> RawTree<K, V, C, E> {
    /// Promotes the left child of `node` into its place and returns it.
    ///
    /// The promoted node's right subtree becomes `node`'s left subtree. Heights
    /// of both nodes are recomputed; a `node` without a left child is returned as is.
    pub(crate) fn rotate_right(&mut self, node: Handle) -> Handle {
        let Some(pivot) = self.node(node).left() else {
            return node;
        };
        let inner = self.node(pivot).right();

        self.splice(node, Some(pivot));
        self.node_mut(pivot).set_child(Side::Right, Some(node));
        self.node_mut(node).set_parent(Some(pivot));
        self.node_mut(node).set_child(Side::Left, inner);
        if let Some(inner) = inner {
            self.node_mut(inner).set_parent(Some(node));
        }

        self.update_height(node);
        self.update_height(pivot);
        trace!(node = ?node, pivot = ?pivot, "rotated right");
        pivot
    }

    /// Mirror image of [`RawTree::rotate_right`].
    pub(crate) fn rotate_left(&mut self, node: Handle) -> Handle {
        let Some(pivot) = self.node(node).right() else {
            return node;
        };
        let inner = self.node(pivot).left();

        self.splice(node, Some(pivot));
        self.node_mut(pivot).set_child(Side::Left, Some(node));
        self.node_mut(node).set_parent(Some(pivot));
        self.node_mut(node).set_child(Side::Right, inner);
        if let Some(inner) = inner {
            self.node_mut(inner).set_parent(Some(node));
        }

        self.update_height(node);
        self.update_height(pivot);
        trace!(node = ?node, pivot = ?pivot, "rotated left");
        pivot
    }

    /// Fixes a node whose left side is two levels taller than its right.
    fn rebalance_left_heavy(&mut self, node: Handle) -> Handle {
        if let Some(left) = self.node(node).left()
            && self.balance_factor(left) < 0
        {
            self.rotate_left(left);
        }
        self.rotate_right(node)
    }

    /// Fixes a node whose right side is two levels taller than its left.
    fn rebalance_right_heavy(&mut self, node: Handle) -> Handle {
        if let Some(right) = self.node(node).right()
            && self.balance_factor(right) > 0
        {
            self.rotate_right(right);
        }
        self.rotate_left(node)
    }

    /// Restores heights and balance along `path`, deepest node first.
    ///
    /// `path[0]` must be the current root. Returns the root afterwards, which
    /// differs from `path[0]` when a rotation happened there.
    pub(crate) fn rebalance_along_path(&mut self, path: &[Handle]) -> Option<Handle> {
        let mut root = path.first().copied();
        for (depth, &handle) in path.iter().enumerate().rev() {
            self.update_height(handle);
            let balance = self.balance_factor(handle);
            let top = if balance > 1 {
                self.rebalance_left_heavy(handle)
            } else if balance < -1 {
                self.rebalance_right_heavy(handle)
            } else {
                continue;
            };
            if depth == 0 {
                root = Some(top);
            }
        }
        root
    }
}

impl<K, V, C: Comparator<K>, E> RawTree<K, V, C, E> {
    /// Inserts and rebalances. Returns the (possibly new) root.
    pub(crate) fn avl_insert(&mut self, key: K, value: V) -> Result<Option<Handle>, IndexError<K>> {
        let Some(root) = self.root() else {
            return Ok(Some(self.alloc_root(key, value)));
        };

        let mut path: Path = SmallVec::new();
        let mut current = root;
        loop {
            let side = match self.compare(&key, self.node(current).key())? {
                Ordering::Equal => {
                    // Same key set, same shape: nothing to rebalance.
                    self.append_value(current, key, value)?;
                    return Ok(Some(root));
                }
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            path.push(current);
            match self.node(current).child(side) {
                Some(child) => current = child,
                None => {
                    let leaf = self.alloc_child(current, side, key, value);
                    path.push(leaf);
                    break;
                }
            }
        }
        Ok(self.rebalance_along_path(&path))
    }
}

impl<K, V, C: Comparator<K>, E: ValueEquality<V>> RawTree<K, V, C, E> {
    /// Deletes `value` from `key`'s bucket, or the whole key when `value` is
    /// `None`, then rebalances. Returns the (possibly new) root.
    ///
    /// A node with two children always takes over its in-order predecessor's key
    /// and bucket.
    pub(crate) fn avl_delete(&mut self, key: &K, value: Option<&V>) -> Result<Option<Handle>, NotComparable> {
        let Some(root) = self.root() else {
            return Ok(None);
        };

        // Ancestors of the target, root first; the target itself is not included.
        let mut path: Path = SmallVec::new();
        let mut target = root;
        loop {
            let side = match self.compare(key, self.node(target).key())? {
                Ordering::Equal => break,
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            path.push(target);
            match self.node(target).child(side) {
                Some(child) => target = child,
                None => return Ok(Some(root)),
            }
        }

        if let Some(value) = value
            && self.remove_values(target, value)
        {
            return Ok(Some(root));
        }

        let node = self.node(target);
        let (left, right) = (node.left(), node.right());
        match (left, right) {
            (None, None) => {
                trace!(node = ?target, "deleting leaf");
                self.splice(target, None);
                self.free(target);
                if target == root {
                    return Ok(None);
                }
                Ok(self.rebalance_along_path(&path))
            }
            (Some(child), None) | (None, Some(child)) => {
                trace!(node = ?target, child = ?child, "deleting node with one child");
                self.splice(target, Some(child));
                self.free(target);
                if target == root {
                    // A balanced root with one child has a single leaf below it.
                    return Ok(Some(child));
                }
                Ok(self.rebalance_along_path(&path))
            }
            (Some(left), Some(_)) => {
                path.push(target);
                let mut donor = left;
                while let Some(right) = self.node(donor).right() {
                    path.push(donor);
                    donor = right;
                }
                trace!(node = ?target, donor = ?donor, "deleting node with two children");

                let donor_left = self.node(donor).left();
                self.splice(donor, donor_left);
                let (donor_key, donor_bucket) = self.free(donor).into_payload();
                self.node_mut(target).replace_payload(donor_key, donor_bucket);
                Ok(self.rebalance_along_path(&path))
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::options::IndexOptions;
    use crate::policy::{NaturalOrder, PartialEqValues};
    use pretty_assertions::assert_eq;

    type Tree = RawTree<i32, i32, NaturalOrder, PartialEqValues>;

    fn insert_all(tree: &mut Tree, keys: impl IntoIterator<Item = i32>) {
        for key in keys {
            let root = tree.avl_insert(key, key * 10).unwrap();
            tree.set_root(root);
            assert_valid(tree);
        }
    }

    fn delete(tree: &mut Tree, key: i32) {
        let root = tree.avl_delete(&key, None).unwrap();
        tree.set_root(root);
        assert_valid(tree);
    }

    fn assert_valid(tree: &Tree) {
        tree.check_ordering().unwrap();
        tree.check_parent_links().unwrap();
        tree.check_reachability().unwrap();
        tree.check_buckets().unwrap();
        tree.check_heights().unwrap();
        tree.check_balance_factors().unwrap();
    }

    fn key_of(tree: &Tree, handle: Option<Handle>) -> Option<i32> {
        handle.map(|handle| *tree.node(handle).key())
    }

    #[test]
    fn rotate_right_promotes_left_child() {
        //     3          2
        //    /          / \
        //   2    ->    1   3
        //  /
        // 1
        let mut tree = Tree::new(IndexOptions::new());
        let n3 = tree.alloc_root(3, 30);
        let n2 = tree.alloc_child(n3, Side::Left, 2, 20);
        let n1 = tree.alloc_child(n2, Side::Left, 1, 10);
        tree.update_height(n2);
        tree.update_height(n3);

        let top = tree.rotate_right(n3);
        tree.set_root(Some(top));

        assert_eq!(top, n2);
        assert_eq!(tree.node(n2).left(), Some(n1));
        assert_eq!(tree.node(n2).right(), Some(n3));
        assert_eq!(tree.node(n3).left(), None);
        assert_eq!(tree.node(n2).height(), 2);
        assert_eq!(tree.node(n3).height(), 1);
        assert_valid(&tree);
    }

    #[test]
    fn rotate_left_moves_inner_subtree_across() {
        //   1              3
        //    \            / \
        //     3    ->    1   4
        //    / \          \
        //   2   4          2
        let mut tree = Tree::new(IndexOptions::new());
        let n1 = tree.alloc_root(1, 10);
        let n3 = tree.alloc_child(n1, Side::Right, 3, 30);
        let n2 = tree.alloc_child(n3, Side::Left, 2, 20);
        tree.alloc_child(n3, Side::Right, 4, 40);
        tree.update_height(n3);
        tree.update_height(n1);

        let top = tree.rotate_left(n1);
        tree.set_root(Some(top));

        assert_eq!(top, n3);
        assert_eq!(tree.node(n1).right(), Some(n2));
        assert_eq!(tree.node(n2).parent(), Some(n1));
        assert_eq!(tree.node(n3).height(), 3);
        tree.check_heights().unwrap();
        tree.check_parent_links().unwrap();
    }

    #[test]
    fn rotation_without_pivot_is_a_no_op() {
        let mut tree = Tree::new(IndexOptions::new());
        let root = tree.alloc_root(1, 10);
        assert_eq!(tree.rotate_right(root), root);
        assert_eq!(tree.rotate_left(root), root);
    }

    #[test]
    fn rotation_below_root_relinks_grandparent() {
        let mut tree = Tree::new(IndexOptions::new());
        insert_all(&mut tree, [4, 2, 6, 1, 3]);
        let root = tree.root().unwrap();
        let two = tree.node(root).left().unwrap();

        let top = tree.rotate_right(two);
        assert_eq!(tree.node(root).left(), Some(top));
        assert_eq!(tree.node(top).parent(), Some(root));
        tree.update_height(root);
        tree.check_heights().unwrap();
        tree.check_ordering().unwrap();
    }

    #[test]
    fn single_rotation_cases() {
        let mut ascending = Tree::new(IndexOptions::new());
        insert_all(&mut ascending, [1, 2, 3]);
        assert_eq!(key_of(&ascending, ascending.root()), Some(2));

        let mut descending = Tree::new(IndexOptions::new());
        insert_all(&mut descending, [3, 2, 1]);
        assert_eq!(key_of(&descending, descending.root()), Some(2));
    }

    #[test]
    fn double_rotation_cases() {
        let mut left_right = Tree::new(IndexOptions::new());
        insert_all(&mut left_right, [3, 1, 2]);
        let root = left_right.root();
        assert_eq!(key_of(&left_right, root), Some(2));
        assert_eq!(key_of(&left_right, left_right.node(root.unwrap()).left()), Some(1));

        let mut right_left = Tree::new(IndexOptions::new());
        insert_all(&mut right_left, [1, 3, 2]);
        let root = right_left.root();
        assert_eq!(key_of(&right_left, root), Some(2));
        assert_eq!(key_of(&right_left, right_left.node(root.unwrap()).right()), Some(3));
    }

    #[test]
    fn ascending_inserts_stay_logarithmic() {
        let mut tree = Tree::new(IndexOptions::new());
        insert_all(&mut tree, 1..=1023);
        assert_eq!(tree.height(), 10);
        assert_eq!(tree.number_of_keys(), 1023);
    }

    #[test]
    fn deleting_the_root_leaf_empties_the_tree() {
        let mut tree = Tree::new(IndexOptions::new());
        insert_all(&mut tree, [7]);
        delete(&mut tree, 7);
        assert!(tree.is_empty());
    }

    #[test]
    fn deleting_a_root_with_one_child_promotes_it() {
        let mut tree = Tree::new(IndexOptions::new());
        insert_all(&mut tree, [7, 9]);
        delete(&mut tree, 7);
        assert_eq!(key_of(&tree, tree.root()), Some(9));
        assert_eq!(tree.node(tree.root().unwrap()).height(), 1);
    }

    #[test]
    fn leaf_deletion_triggers_rotation_at_root() {
        //     2                 3
        //    / \               / \
        //   1   3      ->     2   4
        //        \
        //         4
        let mut tree = Tree::new(IndexOptions::new());
        insert_all(&mut tree, [2, 1, 3, 4]);
        delete(&mut tree, 1);
        assert_eq!(key_of(&tree, tree.root()), Some(3));
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn two_children_deletion_uses_predecessor() {
        let mut tree = Tree::new(IndexOptions::new());
        insert_all(&mut tree, [50, 30, 70, 20, 40, 60, 80, 35]);
        let root = tree.root().unwrap();
        delete(&mut tree, 50);
        assert_eq!(tree.root(), Some(root));
        assert_eq!(*tree.node(root).key(), 40);
        assert_eq!(tree.node(root).bucket(), [400]);
        assert!(tree.search(&50).unwrap().is_empty());

        // Predecessor directly below: 30's left child is 20, which has no right child.
        delete(&mut tree, 30);
        let keys: Vec<i32> = tree.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, [20, 35, 40, 60, 70, 80]);
    }

    #[test]
    fn missing_keys_and_partial_value_deletes_keep_shape() {
        let mut tree = Tree::new(IndexOptions::new());
        insert_all(&mut tree, [2, 1, 3]);
        let root = tree.avl_insert(2, 21).unwrap();
        tree.set_root(root);

        assert_eq!(tree.avl_delete(&9, None), Ok(root));
        assert_eq!(tree.avl_delete(&2, Some(&21)), Ok(root));
        assert_eq!(tree.search(&2).unwrap(), [20]);
        assert_eq!(tree.number_of_keys(), 3);

        // Lone entry: the key goes even though the value does not match.
        let root = tree.avl_delete(&2, Some(&99)).unwrap();
        tree.set_root(root);
        assert_valid(&tree);
        assert!(tree.search(&2).unwrap().is_empty());
        assert_eq!(tree.number_of_keys(), 2);
    }

    #[test]
    fn draining_every_key_in_any_order() {
        let mut tree = Tree::new(IndexOptions::new());
        insert_all(&mut tree, (0..200).map(|i| (i * 37) % 200));
        for key in (0..200).map(|i| (i * 91) % 200) {
            delete(&mut tree, key);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.number_of_keys(), 0);
    }
}
