use core::iter::FusedIterator;

use crate::raw::{Arena, Handle, Node};

/// An in-order iterator over the keys of an index and their buckets.
///
/// This `struct` is created by the [`iter`](crate::OrderedIndex::iter) method of
/// [`OrderedIndex`](crate::OrderedIndex).
///
/// # Examples
///
/// ```
/// use bucket_tree::{BstIndex, OrderedIndex};
///
/// let mut index = BstIndex::new();
/// index.insert(2, 'b').unwrap();
/// index.insert(1, 'a').unwrap();
/// index.insert(2, 'c').unwrap();
///
/// let mut iter = index.iter();
/// assert_eq!(iter.next(), Some((&1, &['a'][..])));
/// assert_eq!(iter.next(), Some((&2, &['b', 'c'][..])));
/// assert_eq!(iter.next(), None);
/// ```
pub struct Iter<'a, K, V> {
    nodes: &'a Arena<Node<K, V>>,
    // Nodes whose left subtree has been emitted, deepest last.
    stack: Vec<Handle>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(nodes: &'a Arena<Node<K, V>>, root: Option<Handle>) -> Self {
        let mut iter = Self {
            nodes,
            stack: Vec::new(),
            remaining: nodes.len(),
        };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut current: Option<Handle>) {
        while let Some(handle) = current {
            self.stack.push(handle);
            current = self.nodes.get(handle).left();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a [V]);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.stack.pop()?;
        let nodes = self.nodes;
        let node = nodes.get(handle);
        self.push_left_spine(node.right());
        self.remaining -= 1;
        Some((node.key(), node.bucket()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}
