use tracing::{debug, trace};

use super::handle::Handle;
use super::node::{BranchNode, Children, LeafNode, Node, Payload, SearchResult};
use super::raw_tree::RawBPlusTree;
use crate::Key;
use crate::error::{Error, Result};

impl RawBPlusTree {
    /// Inserts a new entry, rejecting keys that are already present.
    pub(crate) fn insert(&mut self, key: Key, payload: Payload) -> Result<()> {
        let Some(leaf_handle) = self.find_leaf(key) else {
            // Handle empty tree case
            let leaf_handle = self.nodes.alloc(Node::Leaf(LeafNode::singleton(key, payload)));
            self.root = Some(leaf_handle);
            self.first_leaf = Some(leaf_handle);
            self.last_leaf = Some(leaf_handle);
            self.len = 1;
            debug!(target: "bptree::insert", height = 1, "created root leaf");
            return Ok(());
        };

        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let idx = match leaf.search(key) {
            SearchResult::Found(_) => return Err(Error::DuplicateKey(key)),
            SearchResult::NotFound(idx) => idx,
        };

        // A full leaf briefly holds `max_keys + 1` entries before it is split.
        leaf.insert(idx, key, payload);
        self.len += 1;

        if leaf.key_count() > self.config.max_keys() {
            self.split_leaf(leaf_handle);
        }
        Ok(())
    }

    /// Splits an overflowed leaf and hands the new sibling's first key to the parent.
    fn split_leaf(&mut self, leaf_handle: Handle) {
        let split_index = self.config.split_index();
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let right_leaf = leaf.split_off(split_index, leaf_handle);

        // Leaves keep every key, so the separator is a copy of the right half's smallest key.
        let separator = right_leaf
            .first_key()
            .expect("`RawBPlusTree::split_leaf()` - right half is empty!");
        let old_next = right_leaf.next();
        let right_handle = self.nodes.alloc(Node::Leaf(right_leaf));

        // Fix up the chain links around the new leaf
        self.nodes.get_mut(leaf_handle).as_leaf_mut().set_next(Some(right_handle));
        match old_next {
            Some(next) => self.nodes.get_mut(next).as_leaf_mut().set_prev(Some(right_handle)),
            None => self.last_leaf = Some(right_handle),
        }

        trace!(
            target: "bptree::insert",
            left = ?leaf_handle,
            right = ?right_handle,
            separator,
            "split leaf"
        );

        self.insert_into_parent(leaf_handle, separator, right_handle);
    }

    /// Links `right` into the parent of `left`, splitting branches up the tree as needed.
    fn insert_into_parent(&mut self, mut left: Handle, mut separator: Key, mut right: Handle) {
        let max_keys = self.config.max_keys();
        let split_index = self.config.split_index();

        loop {
            let Some(parent_handle) = self.nodes.get(left).parent() else {
                self.grow_root(left, separator, right);
                return;
            };

            let parent = self.nodes.get_mut(parent_handle).as_branch_mut();
            let idx = parent.position_of(left);
            parent.insert_child(idx, separator, right);

            if parent.key_count() <= max_keys {
                return;
            }

            // The separator at `split_index` moves up and stays in neither half.
            let (promoted, right_branch) = parent.split_off(split_index);
            let moved: Children = right_branch.children().iter().copied().collect();
            let right_handle = self.nodes.alloc(Node::Branch(right_branch));
            for child in moved {
                self.nodes.get_mut(child).set_parent(Some(right_handle));
            }

            trace!(
                target: "bptree::insert",
                left = ?parent_handle,
                right = ?right_handle,
                separator = promoted,
                "split branch"
            );

            left = parent_handle;
            separator = promoted;
            right = right_handle;
        }
    }

    /// Replaces the root with a new branch over the two halves of a root split.
    fn grow_root(&mut self, left: Handle, separator: Key, right: Handle) {
        let root_handle = self.nodes.alloc(Node::Branch(BranchNode::new_root(left, separator, right)));
        self.nodes.get_mut(left).set_parent(Some(root_handle));
        self.nodes.get_mut(right).set_parent(Some(root_handle));
        self.root = Some(root_handle);

        debug!(
            target: "bptree::insert",
            height = self.height(),
            nodes = self.node_count(),
            "root split"
        );
    }
}
