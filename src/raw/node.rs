use smallvec::SmallVec;

use super::handle::Handle;
use crate::Key;

/// Inline capacity for node contents. Orders up to 7 (plus the transient overflow entry of a
/// split) stay on the node itself; larger orders spill to the heap.
pub(crate) const INLINE_KEYS: usize = 8;

pub(crate) type Payload = Box<[u8]>;

pub(crate) type Keys = SmallVec<[Key; INLINE_KEYS]>;
pub(crate) type Children = SmallVec<[Handle; INLINE_KEYS + 1]>;
pub(crate) type Payloads = SmallVec<[Payload; INLINE_KEYS]>;

#[derive(Clone, Debug)]
pub(crate) enum Node {
    Branch(BranchNode),
    Leaf(LeafNode),
}

// B+Tree: branches route with separator keys; child[i] holds keys in [keys[i-1], keys[i]).
#[derive(Clone, Debug)]
pub(crate) struct BranchNode {
    parent: Option<Handle>,
    keys: Keys,
    children: Children,
}

// B+Tree: leaves own every entry and form a doubly linked chain in key order.
#[derive(Clone, Debug)]
pub(crate) struct LeafNode {
    parent: Option<Handle>,
    prev: Option<Handle>,
    next: Option<Handle>,
    keys: Keys,
    payloads: Payloads,
}

/// Result of searching for a key in a leaf.
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted.
    NotFound(usize),
}

impl Node {
    /// Returns the leaf node, panicking if this is not a leaf.
    pub(crate) fn as_leaf(&self) -> &LeafNode {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the leaf node mutably, panicking if this is not a leaf.
    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the branch node, panicking if this is not a branch.
    pub(crate) fn as_branch(&self) -> &BranchNode {
        match self {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }

    /// Returns the branch node mutably, panicking if this is not a branch.
    pub(crate) fn as_branch_mut(&mut self) -> &mut BranchNode {
        match self {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        match self {
            Node::Branch(branch) => branch.key_count(),
            Node::Leaf(leaf) => leaf.key_count(),
        }
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        match self {
            Node::Branch(branch) => branch.parent,
            Node::Leaf(leaf) => leaf.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        match self {
            Node::Branch(branch) => branch.parent = parent,
            Node::Leaf(leaf) => leaf.parent = parent,
        }
    }
}

impl BranchNode {
    /// Creates a root branch over two children split apart by `separator`.
    pub(crate) fn new_root(left: Handle, separator: Key, right: Handle) -> Self {
        let mut keys = Keys::new();
        keys.push(separator);
        let mut children = Children::new();
        children.push(left);
        children.push(right);
        Self {
            parent: None,
            keys,
            children,
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> Key {
        self.keys[index]
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub(crate) fn set_key(&mut self, index: usize, key: Key) {
        self.keys[index] = key;
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    #[cfg(test)]
    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns the index of the child whose range covers `key`.
    ///
    /// A key equal to a separator routes right: the result is the first `i` with `keys[i] > key`.
    #[inline]
    pub(crate) fn route(&self, key: Key) -> usize {
        self.keys.partition_point(|&separator| separator <= key)
    }

    /// Returns the position of `child` among this node's children.
    pub(crate) fn position_of(&self, child: Handle) -> usize {
        self.children
            .iter()
            .position(|&candidate| candidate == child)
            .expect("`BranchNode::position_of()` - `child` is not linked to its parent!")
    }

    /// Inserts `key` at `index` with `child` directly to its right.
    pub(crate) fn insert_child(&mut self, index: usize, key: Key, child: Handle) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, child);
    }

    /// Removes the child at `child_index` along with the separator that bounds it.
    ///
    /// The first child is paired with the separator on its right, every other child with the
    /// separator on its left.
    pub(crate) fn remove_child(&mut self, child_index: usize) -> (Key, Handle) {
        let key = self.keys.remove(child_index.saturating_sub(1));
        let child = self.children.remove(child_index);
        (key, child)
    }

    pub(crate) fn push(&mut self, key: Key, child: Handle) {
        self.keys.push(key);
        self.children.push(child);
    }

    pub(crate) fn push_front(&mut self, key: Key, child: Handle) {
        self.keys.insert(0, key);
        self.children.insert(0, child);
    }

    /// Pops the last key and the last child.
    pub(crate) fn pop(&mut self) -> (Key, Handle) {
        match (self.keys.pop(), self.children.pop()) {
            (Some(key), Some(child)) => (key, child),
            _ => panic!("`BranchNode::pop()` - node is empty!"),
        }
    }

    /// Pops the first key and the first child.
    pub(crate) fn pop_front(&mut self) -> (Key, Handle) {
        assert!(!self.keys.is_empty(), "`BranchNode::pop_front()` - node is empty!");
        (self.keys.remove(0), self.children.remove(0))
    }

    /// Splits an overflowed branch. Returns (`promoted_key`, `right_node`).
    ///
    /// This node keeps the first `split_index` keys; the key at `split_index` moves up and the
    /// remaining keys and children move to the new right sibling, which shares this node's parent.
    pub(crate) fn split_off(&mut self, split_index: usize) -> (Key, BranchNode) {
        let right = BranchNode {
            parent: self.parent,
            keys: self.keys.drain(split_index + 1..).collect(),
            children: self.children.drain(split_index + 1..).collect(),
        };
        let promoted = self.keys.pop().expect("`BranchNode::split_off()` - nothing to promote!");
        (promoted, right)
    }

    /// Appends `right` after this node, pulling `separator` down between the two key runs.
    pub(crate) fn append(&mut self, separator: Key, right: BranchNode) {
        self.keys.push(separator);
        self.keys.extend(right.keys);
        self.children.extend(right.children);
    }

    /// Prepends `left` before this node, pulling `separator` down between the two key runs.
    pub(crate) fn prepend(&mut self, left: BranchNode, separator: Key) {
        let mut keys = left.keys;
        keys.push(separator);
        keys.extend(self.keys.drain(..));
        self.keys = keys;

        let mut children = left.children;
        children.extend(self.children.drain(..));
        self.children = children;
    }
}

impl LeafNode {
    /// Creates a parentless leaf holding a single entry.
    pub(crate) fn singleton(key: Key, payload: Payload) -> Self {
        let mut leaf = Self {
            parent: None,
            prev: None,
            next: None,
            keys: Keys::new(),
            payloads: Payloads::new(),
        };
        leaf.push(key, payload);
        leaf
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn prev(&self) -> Option<Handle> {
        self.prev
    }

    pub(crate) fn set_prev(&mut self, prev: Option<Handle>) {
        self.prev = prev;
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> Key {
        self.keys[index]
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &[Key] {
        &self.keys
    }

    #[inline]
    pub(crate) fn payload(&self, index: usize) -> &[u8] {
        &self.payloads[index]
    }

    pub(crate) fn first_key(&self) -> Option<Key> {
        self.keys.first().copied()
    }

    pub(crate) fn last_key(&self) -> Option<Key> {
        self.keys.last().copied()
    }

    #[inline]
    pub(crate) fn search(&self, key: Key) -> SearchResult {
        match self.keys.binary_search(&key) {
            Ok(idx) => SearchResult::Found(idx),
            Err(idx) => SearchResult::NotFound(idx),
        }
    }

    /// Returns the index of the first entry whose key is `>= key`.
    pub(crate) fn lower_bound(&self, key: Key) -> usize {
        self.keys.partition_point(|&candidate| candidate < key)
    }

    pub(crate) fn insert(&mut self, index: usize, key: Key, payload: Payload) {
        self.keys.insert(index, key);
        self.payloads.insert(index, payload);
    }

    pub(crate) fn remove(&mut self, index: usize) -> (Key, Payload) {
        (self.keys.remove(index), self.payloads.remove(index))
    }

    pub(crate) fn push(&mut self, key: Key, payload: Payload) {
        self.keys.push(key);
        self.payloads.push(payload);
    }

    pub(crate) fn push_front(&mut self, key: Key, payload: Payload) {
        self.keys.insert(0, key);
        self.payloads.insert(0, payload);
    }

    pub(crate) fn pop(&mut self) -> (Key, Payload) {
        match (self.keys.pop(), self.payloads.pop()) {
            (Some(key), Some(payload)) => (key, payload),
            _ => panic!("`LeafNode::pop()` - leaf is empty!"),
        }
    }

    pub(crate) fn pop_front(&mut self) -> (Key, Payload) {
        assert!(!self.keys.is_empty(), "`LeafNode::pop_front()` - leaf is empty!");
        (self.keys.remove(0), self.payloads.remove(0))
    }

    /// Splits an overflowed leaf, keeping the first `split_index` entries.
    ///
    /// The returned right sibling shares this leaf's parent and is chained after this leaf as
    /// `prev`; the caller links it in once it has a handle.
    pub(crate) fn split_off(&mut self, split_index: usize, this: Handle) -> LeafNode {
        LeafNode {
            parent: self.parent,
            prev: Some(this),
            next: self.next,
            keys: self.keys.drain(split_index..).collect(),
            payloads: self.payloads.drain(split_index..).collect(),
        }
    }

    /// Appends every entry of `right`, which must hold strictly larger keys.
    pub(crate) fn append(&mut self, right: LeafNode) {
        self.keys.extend(right.keys);
        self.payloads.extend(right.payloads);
        self.next = right.next;
    }

    /// Prepends every entry of `left`, which must hold strictly smaller keys.
    pub(crate) fn prepend(&mut self, left: LeafNode) {
        let mut keys = left.keys;
        keys.extend(self.keys.drain(..));
        self.keys = keys;

        let mut payloads = left.payloads;
        payloads.extend(self.payloads.drain(..));
        self.payloads = payloads;

        self.prev = left.prev;
    }
}
