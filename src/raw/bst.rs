//! Insert and delete for the unbalanced variant.

use core::cmp::Ordering;

use rand::{Rng, RngCore};
use tracing::trace;

use super::handle::Handle;
use super::node::Side;
use super::raw_tree::RawTree;
use crate::error::{IndexError, NotComparable};
use crate::policy::{Comparator, ValueEquality};

impl<K, V, C: Comparator<K>, E> RawTree<K, V, C, E> {
    /// Inserts without rebalancing. Returns the root, which only changes when
    /// the tree was empty.
    pub(crate) fn bst_insert(&mut self, key: K, value: V) -> Result<Option<Handle>, IndexError<K>> {
        let Some(root) = self.root() else {
            return Ok(Some(self.alloc_root(key, value)));
        };

        let mut current = root;
        loop {
            let side = match self.compare(&key, self.node(current).key())? {
                Ordering::Equal => {
                    self.append_value(current, key, value)?;
                    break;
                }
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            match self.node(current).child(side) {
                Some(child) => current = child,
                None => {
                    self.alloc_child(current, side, key, value);
                    break;
                }
            }
        }
        Ok(Some(root))
    }
}

impl<K, V, C: Comparator<K>, E: ValueEquality<V>> RawTree<K, V, C, E> {
    /// Deletes `value` from `key`'s bucket, or the whole key when `value` is
    /// `None`. Returns the (possibly new) root.
    ///
    /// A node with two children takes the key and bucket of its in-order
    /// predecessor or successor, picked by a fair coin from `rng`, and that donor
    /// is spliced out instead.
    pub(crate) fn bst_delete<R>(
        &mut self,
        key: &K,
        value: Option<&V>,
        rng: &mut R,
    ) -> Result<Option<Handle>, NotComparable>
    where
        R: RngCore,
    {
        let root = self.root();
        let Some(target) = self.find(key)? else {
            return Ok(root);
        };
        if let Some(value) = value
            && self.remove_values(target, value)
        {
            return Ok(root);
        }

        let node = self.node(target);
        let (left, right) = (node.left(), node.right());
        match (left, right) {
            (None, None) => {
                trace!(node = ?target, "deleting leaf");
                self.splice(target, None);
                self.free(target);
                Ok(if root == Some(target) { None } else { root })
            }
            (Some(child), None) | (None, Some(child)) => {
                trace!(node = ?target, child = ?child, "deleting node with one child");
                self.splice(target, Some(child));
                self.free(target);
                Ok(if root == Some(target) { Some(child) } else { root })
            }
            (Some(left), Some(right)) => {
                let use_predecessor = rng.gen_bool(0.5);
                let (donor, donor_child) = if use_predecessor {
                    let donor = self.max_descendant(left);
                    (donor, self.node(donor).left())
                } else {
                    let donor = self.min_descendant(right);
                    (donor, self.node(donor).right())
                };
                trace!(node = ?target, donor = ?donor, use_predecessor, "deleting node with two children");

                self.splice(donor, donor_child);
                let (donor_key, donor_bucket) = self.free(donor).into_payload();
                self.node_mut(target).replace_payload(donor_key, donor_bucket);
                Ok(root)
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
    use rand::rngs::mock::StepRng;

    type Tree = RawTree<i32, char, NaturalOrder, PartialEqValues>;

    // `gen_bool(0.5)` is true below 2^63: zero always picks the predecessor.
    fn predecessor_rng() -> StepRng {
        StepRng::new(0, 0)
    }

    fn successor_rng() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    fn build(keys: &[i32]) -> Tree {
        let mut tree = Tree::new(IndexOptions::new());
        for &key in keys {
            let root = tree.bst_insert(key, char::from(b'a' + u8::try_from(key % 26).unwrap())).unwrap();
            tree.set_root(root);
        }
        tree
    }

    fn keys(tree: &Tree) -> Vec<i32> {
        tree.iter().map(|(key, _)| *key).collect()
    }

    fn delete(tree: &mut Tree, key: i32, rng: &mut StepRng) {
        let root = tree.bst_delete(&key, None, rng).unwrap();
        tree.set_root(root);
        tree.check_ordering().unwrap();
        tree.check_parent_links().unwrap();
        tree.check_reachability().unwrap();
    }

    #[test]
    fn insert_places_keys_by_comparison() {
        let tree = build(&[10, 5, 15, 7]);
        let root = tree.root().unwrap();
        assert_eq!(*tree.node(root).key(), 10);
        let five = tree.node(root).left().unwrap();
        assert_eq!(*tree.node(five).key(), 5);
        assert_eq!(tree.node(five).left(), None);
        assert_eq!(*tree.node(tree.node(five).right().unwrap()).key(), 7);
    }

    #[test]
    fn ascending_inserts_degenerate() {
        let tree = build(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(tree.height(), 7);
    }

    #[test]
    fn two_children_uses_the_injected_coin() {
        let mut tree = build(&[10, 5, 15, 3, 7, 12, 20]);
        let root = tree.root().unwrap();
        delete(&mut tree, 10, &mut predecessor_rng());
        assert_eq!(tree.root(), Some(root));
        assert_eq!(*tree.node(root).key(), 7);

        let mut tree = build(&[10, 5, 15, 3, 7, 12, 20]);
        delete(&mut tree, 10, &mut successor_rng());
        assert_eq!(*tree.node(tree.root().unwrap()).key(), 12);
        assert_eq!(keys(&tree), [3, 5, 7, 12, 15, 20]);
    }

    #[test]
    fn donor_directly_below_target() {
        let mut tree = build(&[10, 5, 15, 3]);
        // Predecessor of 10 is 5, the left child itself; its child 3 moves up.
        delete(&mut tree, 10, &mut predecessor_rng());
        let root = tree.root().unwrap();
        assert_eq!(*tree.node(root).key(), 5);
        assert_eq!(*tree.node(tree.node(root).left().unwrap()).key(), 3);
    }

    #[test]
    fn root_with_one_child_is_replaced_by_it() {
        let mut tree = build(&[10, 15, 12]);
        let old_root = tree.root().unwrap();
        delete(&mut tree, 10, &mut predecessor_rng());
        let root = tree.root().unwrap();
        assert_ne!(root, old_root);
        assert_eq!(*tree.node(root).key(), 15);
        assert_eq!(keys(&tree), [12, 15]);
    }

    #[test]
    fn deleting_the_last_key_empties_the_tree() {
        let mut tree = build(&[42]);
        delete(&mut tree, 42, &mut predecessor_rng());
        assert!(tree.is_empty());
        assert_eq!(tree.number_of_keys(), 0);
    }

    #[test]
    fn value_deletes_trim_shared_buckets() {
        let mut tree = build(&[4]);
        let root = tree.bst_insert(4, 'x').unwrap();
        tree.set_root(root);

        let root = tree.bst_delete(&4, Some(&'q'), &mut predecessor_rng()).unwrap();
        tree.set_root(root);
        assert_eq!(tree.search(&4).unwrap(), ['e', 'x']);

        let root = tree.bst_delete(&4, Some(&'x'), &mut predecessor_rng()).unwrap();
        tree.set_root(root);
        assert_eq!(tree.search(&4).unwrap(), ['e']);
    }

    #[test]
    fn value_delete_on_a_lone_entry_removes_the_node() {
        let mut tree = build(&[2, 4, 1]);
        let root = tree.bst_delete(&4, Some(&'q'), &mut predecessor_rng()).unwrap();
        tree.set_root(root);
        assert!(tree.search(&4).unwrap().is_empty());
        assert_eq!(keys(&tree), [1, 2]);
        tree.check_parent_links().unwrap();
    }

    #[test]
    fn value_delete_draining_a_shared_bucket_removes_the_node() {
        let mut tree = build(&[4]);
        let root = tree.bst_insert(4, 'e').unwrap();
        tree.set_root(root);

        let root = tree.bst_delete(&4, Some(&'e'), &mut predecessor_rng()).unwrap();
        tree.set_root(root);
        assert!(tree.is_empty());
    }

    #[test]
    fn deleting_a_missing_key_changes_nothing() {
        let mut tree = build(&[2, 1, 3]);
        let root = tree.root();
        assert_eq!(tree.bst_delete(&9, None, &mut predecessor_rng()), Ok(root));
        assert_eq!(keys(&tree), [1, 2, 3]);
    }
}
