use tracing::{debug, trace};

use super::handle::Handle;
use super::node::{Node, Payload, SearchResult};
use super::raw_tree::RawBPlusTree;
use crate::Key;
use crate::error::{Error, Result};

/// The neighbour an underfull node is repaired against.
///
/// The left neighbour is preferred; only the first child of a branch falls back to its right
/// neighbour. The choice fixes the direction of both redistribution and merge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Sibling {
    Left(Handle),
    Right(Handle),
}

impl Sibling {
    fn handle(self) -> Handle {
        match self {
            Sibling::Left(handle) | Sibling::Right(handle) => handle,
        }
    }
}

/// Where an underfull node sits under its parent.
struct Underflow {
    node: Handle,
    parent: Handle,
    /// Position of `node` among the parent's children.
    child_index: usize,
    sibling: Sibling,
}

impl RawBPlusTree {
    /// Removes the entry stored under `key` and returns its payload.
    pub(crate) fn delete(&mut self, key: Key) -> Result<Payload> {
        let leaf_handle = self.find_leaf(key).ok_or(Error::KeyNotFound(key))?;
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let idx = match leaf.search(key) {
            SearchResult::Found(idx) => idx,
            SearchResult::NotFound(_) => return Err(Error::KeyNotFound(key)),
        };

        let (_, payload) = leaf.remove(idx);
        self.len -= 1;
        self.rebalance(leaf_handle);
        Ok(payload)
    }

    /// Repairs underflow starting at `node`, climbing while merges empty out parents.
    fn rebalance(&mut self, mut node: Handle) {
        let max_keys = self.config.max_keys();
        let min_keys = self.config.min_keys();

        loop {
            if Some(node) == self.root {
                self.adjust_root();
                return;
            }

            let count = self.nodes.get(node).key_count();
            if count >= min_keys {
                return;
            }

            let underflow = self.locate(node);
            let sibling_count = self.nodes.get(underflow.sibling.handle()).key_count();

            if sibling_count + count >= max_keys {
                // The pair cannot share one node: move a single entry across instead.
                self.redistribute(&underflow);
                return;
            }

            self.merge(&underflow);
            node = underflow.parent;
        }
    }

    fn locate(&self, node: Handle) -> Underflow {
        let parent = self
            .nodes
            .get(node)
            .parent()
            .expect("`RawBPlusTree::locate()` - non-root node has no parent!");
        let branch = self.nodes.get(parent).as_branch();
        let child_index = branch.position_of(node);
        let sibling = if child_index == 0 {
            Sibling::Right(branch.child(1))
        } else {
            Sibling::Left(branch.child(child_index - 1))
        };

        Underflow {
            node,
            parent,
            child_index,
            sibling,
        }
    }

    /// Borrows one entry from the sibling across the shared boundary and moves the separator.
    fn redistribute(&mut self, underflow: &Underflow) {
        let &Underflow {
            node,
            parent,
            child_index,
            sibling,
        } = underflow;

        let separator = match (self.nodes.get(node), sibling) {
            (Node::Leaf(_), Sibling::Left(left)) => {
                let (key, payload) = self.nodes.get_mut(left).as_leaf_mut().pop();
                self.nodes.get_mut(node).as_leaf_mut().push_front(key, payload);
                // The borrowed key is now the smallest key on the right of the boundary.
                self.nodes.get_mut(parent).as_branch_mut().set_key(child_index - 1, key);
                key
            }
            (Node::Leaf(_), Sibling::Right(right)) => {
                let right_leaf = self.nodes.get_mut(right).as_leaf_mut();
                let (key, payload) = right_leaf.pop_front();
                let boundary = right_leaf
                    .first_key()
                    .expect("`RawBPlusTree::redistribute()` - donor leaf emptied!");
                self.nodes.get_mut(node).as_leaf_mut().push(key, payload);
                self.nodes.get_mut(parent).as_branch_mut().set_key(0, boundary);
                boundary
            }
            (Node::Branch(_), Sibling::Left(left)) => {
                // Rotate right: the parent separator comes down, the donor's last key goes up.
                let down = self.nodes.get(parent).as_branch().key(child_index - 1);
                let (up, child) = self.nodes.get_mut(left).as_branch_mut().pop();
                self.nodes.get_mut(node).as_branch_mut().push_front(down, child);
                self.nodes.get_mut(child).set_parent(Some(node));
                self.nodes.get_mut(parent).as_branch_mut().set_key(child_index - 1, up);
                up
            }
            (Node::Branch(_), Sibling::Right(right)) => {
                // Rotate left: the parent separator comes down, the donor's first key goes up.
                let down = self.nodes.get(parent).as_branch().key(0);
                let (up, child) = self.nodes.get_mut(right).as_branch_mut().pop_front();
                self.nodes.get_mut(node).as_branch_mut().push(down, child);
                self.nodes.get_mut(child).set_parent(Some(node));
                self.nodes.get_mut(parent).as_branch_mut().set_key(0, up);
                up
            }
        };

        trace!(
            target: "bptree::remove",
            node = ?node,
            donor = ?sibling.handle(),
            separator,
            "redistributed"
        );
    }

    /// Absorbs the underfull node into its sibling and unlinks it from the parent.
    fn merge(&mut self, underflow: &Underflow) {
        let &Underflow {
            node,
            parent,
            child_index,
            sibling,
        } = underflow;

        match self.nodes.take(node) {
            Node::Leaf(absorbed) => match sibling {
                Sibling::Left(left) => {
                    let next = absorbed.next();
                    self.nodes.get_mut(left).as_leaf_mut().append(absorbed);
                    match next {
                        Some(next) => self.nodes.get_mut(next).as_leaf_mut().set_prev(Some(left)),
                        None => self.last_leaf = Some(left),
                    }
                }
                Sibling::Right(right) => {
                    let prev = absorbed.prev();
                    self.nodes.get_mut(right).as_leaf_mut().prepend(absorbed);
                    match prev {
                        Some(prev) => self.nodes.get_mut(prev).as_leaf_mut().set_next(Some(right)),
                        None => self.first_leaf = Some(right),
                    }
                }
            },
            Node::Branch(absorbed) => {
                let survivor = sibling.handle();
                for &child in absorbed.children() {
                    self.nodes.get_mut(child).set_parent(Some(survivor));
                }
                match sibling {
                    Sibling::Left(left) => {
                        let separator = self.nodes.get(parent).as_branch().key(child_index - 1);
                        self.nodes.get_mut(left).as_branch_mut().append(separator, absorbed);
                    }
                    Sibling::Right(right) => {
                        let separator = self.nodes.get(parent).as_branch().key(0);
                        self.nodes.get_mut(right).as_branch_mut().prepend(absorbed, separator);
                    }
                }
            }
        }

        // Drop the separator and the pointer that led to the absorbed node.
        let (separator, _) = self.nodes.get_mut(parent).as_branch_mut().remove_child(child_index);

        trace!(
            target: "bptree::remove",
            absorbed = ?node,
            survivor = ?sibling.handle(),
            separator,
            "merged"
        );
    }

    /// Shrinks the root after a deletion reached it.
    fn adjust_root(&mut self) {
        let root = self.root.expect("`RawBPlusTree::adjust_root()` - tree has no root!");

        match self.nodes.get(root) {
            Node::Leaf(leaf) if leaf.key_count() == 0 => {
                self.clear();
                debug!(target: "bptree::remove", height = 0, "tree emptied");
            }
            Node::Branch(branch) if branch.key_count() == 0 => {
                let child = branch.child(0);
                self.nodes.free(root);
                self.nodes.get_mut(child).set_parent(None);
                self.root = Some(child);
                debug!(
                    target: "bptree::remove",
                    height = self.height(),
                    nodes = self.node_count(),
                    "root collapsed"
                );
            }
            _ => {}
        }
    }
}
