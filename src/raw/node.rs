use smallvec::SmallVec;

use super::handle::Handle;

/// The values stored under one key, in insertion order.
pub(crate) type Bucket<V> = SmallVec<[V; 1]>;

/// Which child slot of its parent a node occupies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

// A keyed node. Empty subtrees are `None` links, never allocated nodes.
pub(crate) struct Node<K, V> {
    key: K,
    // Never empty while the node is linked into a tree.
    bucket: Bucket<V>,
    parent: Option<Handle>,
    left: Option<Handle>,
    right: Option<Handle>,
    // Height of the subtree rooted here, counting this node as 1.
    // Only the self-balancing variant keeps it exact.
    height: u32,
}

impl<K, V> Node<K, V> {
    /// Creates a detached leaf holding a single value.
    pub(crate) fn new(key: K, value: V, parent: Option<Handle>) -> Self {
        let mut bucket = Bucket::new();
        bucket.push(value);
        Self {
            key,
            bucket,
            parent,
            left: None,
            right: None,
            height: 1,
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub(crate) fn bucket(&self) -> &[V] {
        &self.bucket
    }

    pub(crate) fn bucket_mut(&mut self) -> &mut Bucket<V> {
        &mut self.bucket
    }

    /// Overwrites this node's payload with a donor's key and bucket.
    pub(crate) fn replace_payload(&mut self, key: K, bucket: Bucket<V>) {
        self.key = key;
        self.bucket = bucket;
    }

    /// Consumes the node, returning its key and bucket.
    pub(crate) fn into_payload(self) -> (K, Bucket<V>) {
        (self.key, self.bucket)
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    #[inline]
    pub(crate) fn left(&self) -> Option<Handle> {
        self.left
    }

    #[inline]
    pub(crate) fn right(&self) -> Option<Handle> {
        self.right
    }

    #[inline]
    pub(crate) fn child(&self, side: Side) -> Option<Handle> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn set_child(&mut self, side: Side, child: Option<Handle>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }

    #[inline]
    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn set_height(&mut self, height: u32) {
        self.height = height;
    }
}
