use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, SearchResult};
use crate::Key;
use crate::config::Config;
use crate::error::{Error, Result};

/// The core B+Tree implementation backing `BPlusTree`.
///
/// Nodes own their children through handles into `nodes`. Parent links and the leaf chain are
/// plain handles too and never decide when a node is freed.
#[derive(Clone, Debug)]
pub(crate) struct RawBPlusTree {
    /// Arena storing all tree nodes.
    pub(super) nodes: Arena<Node>,
    /// Handle to the root node, if the tree is non-empty.
    pub(super) root: Option<Handle>,
    /// Total number of entries in the tree.
    pub(super) len: usize,
    /// Head of the leaf chain.
    pub(super) first_leaf: Option<Handle>,
    /// Tail of the leaf chain.
    pub(super) last_leaf: Option<Handle>,
    pub(super) config: Config,
}

impl RawBPlusTree {
    /// Creates a new, empty tree. `config` must already be validated.
    pub(crate) const fn new(config: Config) -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
            first_leaf: None,
            last_leaf: None,
            config,
        }
    }

    pub(crate) const fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
        self.first_leaf = None;
        self.last_leaf = None;
    }

    pub(crate) fn first_leaf(&self) -> Option<Handle> {
        self.first_leaf
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node {
        self.nodes.get(handle)
    }

    /// Number of levels from the root down to the leaves; zero for an empty tree.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            height += 1;
            current = match self.nodes.get(handle) {
                Node::Branch(branch) => Some(branch.child(0)),
                Node::Leaf(_) => None,
            };
        }
        height
    }

    /// Descends from the root to the only leaf whose range covers `key`.
    pub(crate) fn find_leaf(&self, key: Key) -> Option<Handle> {
        let mut current = self.root?;

        loop {
            match self.nodes.get(current) {
                Node::Branch(branch) => current = branch.child(branch.route(key)),
                Node::Leaf(_) => return Some(current),
            }
        }
    }

    /// Returns the payload stored under `key`.
    pub(crate) fn find(&self, key: Key) -> Result<&[u8]> {
        let leaf_handle = self.find_leaf(key).ok_or(Error::KeyNotFound(key))?;
        let leaf = self.nodes.get(leaf_handle).as_leaf();
        match leaf.search(key) {
            SearchResult::Found(idx) => Ok(leaf.payload(idx)),
            SearchResult::NotFound(_) => Err(Error::KeyNotFound(key)),
        }
    }

    pub(crate) fn first_key_value(&self) -> Option<(Key, &[u8])> {
        let leaf = self.nodes.get(self.first_leaf?).as_leaf();
        Some((leaf.first_key()?, leaf.payload(0)))
    }

    pub(crate) fn last_key_value(&self) -> Option<(Key, &[u8])> {
        let leaf = self.nodes.get(self.last_leaf?).as_leaf();
        let key = leaf.last_key()?;
        Some((key, leaf.payload(leaf.key_count() - 1)))
    }

    /// Node count, reported in structural log events.
    pub(super) fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    impl RawBPlusTree {
        /// Validates all B+Tree invariants. Panics with a descriptive message if any are violated.
        pub(crate) fn validate_invariants(&self) {
            let Some(root) = self.root else {
                assert_eq!(self.len, 0, "Empty tree should have len 0");
                assert!(self.first_leaf.is_none(), "Empty tree should have no first_leaf");
                assert!(self.last_leaf.is_none(), "Empty tree should have no last_leaf");
                assert_eq!(self.nodes.len(), 0, "Empty tree should hold no nodes");
                return;
            };

            let mut errors: Vec<String> = Vec::new();

            if self.nodes.get(root).parent().is_some() {
                errors.push(format!("Root {root:?} has a parent"));
            }

            // 1. Validate tree structure and collect all leaves
            let mut all_leaves: Vec<Handle> = Vec::new();
            let mut leaf_depth: Option<usize> = None;
            let mut node_count = 0;
            self.validate_node(
                root,
                (None, None),
                0,
                &mut leaf_depth,
                &mut node_count,
                &mut all_leaves,
                &mut errors,
            );

            // 2. Validate leaf chain matches collected leaves
            self.validate_leaf_chain(&all_leaves, &mut errors);

            // 3. Validate len and arena occupancy
            let actual_count: usize = all_leaves.iter().map(|&h| self.nodes.get(h).key_count()).sum();
            if self.len != actual_count {
                errors.push(format!("len mismatch: self.len={}, actual count={actual_count}", self.len));
            }
            if self.nodes.len() != node_count {
                errors.push(format!(
                    "Arena holds {} nodes but {node_count} are reachable",
                    self.nodes.len()
                ));
            }

            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        #[allow(clippy::too_many_arguments)]
        fn validate_node(
            &self,
            handle: Handle,
            bounds: (Option<Key>, Option<Key>),
            depth: usize,
            leaf_depth: &mut Option<usize>,
            node_count: &mut usize,
            all_leaves: &mut Vec<Handle>,
            errors: &mut Vec<String>,
        ) {
            *node_count += 1;
            let node = self.nodes.get(handle);
            let is_root = Some(handle) == self.root;
            let count = node.key_count();

            if count > self.config.max_keys() {
                errors.push(format!("Node {handle:?} holds {count} keys, above max"));
            }
            if !is_root && count < self.config.min_keys() {
                errors.push(format!("Node {handle:?} holds {count} keys, below min"));
            }

            let keys = match node {
                Node::Branch(branch) => branch.keys(),
                Node::Leaf(leaf) => leaf.keys(),
            };
            for pair in keys.windows(2) {
                if pair[0] >= pair[1] {
                    errors.push(format!("Keys not strictly ascending at {handle:?}: {keys:?}"));
                }
            }
            let (lower, upper) = bounds;
            for &key in keys {
                if lower.is_some_and(|lower| key < lower) || upper.is_some_and(|upper| key >= upper) {
                    errors.push(format!("Key {key} at {handle:?} escapes bounds {bounds:?}"));
                }
            }

            match node {
                Node::Leaf(_) => {
                    if count == 0 {
                        errors.push(format!("Empty leaf {handle:?} left in tree"));
                    }
                    match *leaf_depth {
                        None => *leaf_depth = Some(depth),
                        Some(expected) if expected != depth => {
                            errors.push(format!("Leaf depth mismatch: expected {expected}, got {depth} at {handle:?}"));
                        }
                        Some(_) => {}
                    }
                    all_leaves.push(handle);
                }
                Node::Branch(branch) => {
                    if branch.child_count() != count + 1 {
                        errors.push(format!(
                            "Branch {handle:?} has {} children for {count} keys",
                            branch.child_count()
                        ));
                    }
                    if count == 0 {
                        errors.push(format!("Branch {handle:?} holds no keys"));
                    }
                    for (i, &child) in branch.children().iter().enumerate() {
                        if self.nodes.get(child).parent() != Some(handle) {
                            errors.push(format!("Child {child:?} of {handle:?} has a stale parent link"));
                        }
                        let child_lower = if i == 0 { lower } else { Some(branch.key(i - 1)) };
                        let child_upper = if i < count { Some(branch.key(i)) } else { upper };
                        self.validate_node(
                            child,
                            (child_lower, child_upper),
                            depth + 1,
                            leaf_depth,
                            node_count,
                            all_leaves,
                            errors,
                        );
                    }
                }
            }
        }

        fn validate_leaf_chain(&self, all_leaves: &[Handle], errors: &mut Vec<String>) {
            if self.first_leaf != all_leaves.first().copied() {
                errors.push(format!(
                    "first_leaf mismatch: expected {:?}, got {:?}",
                    all_leaves.first(),
                    self.first_leaf
                ));
            }
            if self.last_leaf != all_leaves.last().copied() {
                errors.push(format!(
                    "last_leaf mismatch: expected {:?}, got {:?}",
                    all_leaves.last(),
                    self.last_leaf
                ));
            }

            for (i, &handle) in all_leaves.iter().enumerate() {
                let leaf = self.nodes.get(handle).as_leaf();
                let expected_next = all_leaves.get(i + 1).copied();
                let expected_prev = i.checked_sub(1).map(|prev| all_leaves[prev]);
                if leaf.next() != expected_next {
                    errors.push(format!(
                        "Leaf chain next mismatch at index {i}: expected {expected_next:?}, got {:?}",
                        leaf.next()
                    ));
                }
                if leaf.prev() != expected_prev {
                    errors.push(format!(
                        "Leaf chain prev mismatch at index {i}: expected {expected_prev:?}, got {:?}",
                        leaf.prev()
                    ));
                }
            }
        }

        /// Returns the keys of every node, level by level, left to right.
        pub(crate) fn levels(&self) -> Vec<Vec<Vec<Key>>> {
            let mut levels = Vec::new();
            let mut level: Vec<Handle> = self.root.into_iter().collect();
            while !level.is_empty() {
                let mut next = Vec::new();
                let mut keys = Vec::new();
                for handle in level {
                    match self.nodes.get(handle) {
                        Node::Branch(branch) => {
                            keys.push(branch.keys().to_vec());
                            next.extend_from_slice(branch.children());
                        }
                        Node::Leaf(leaf) => keys.push(leaf.keys().to_vec()),
                    }
                }
                levels.push(keys);
                level = next;
            }
            levels
        }

        /// Keys in leaf chain order.
        pub(crate) fn chain_keys(&self) -> Vec<Key> {
            let mut keys = Vec::new();
            let mut current = self.first_leaf;
            while let Some(handle) = current {
                let leaf = self.nodes.get(handle).as_leaf();
                keys.extend_from_slice(leaf.keys());
                current = leaf.next();
            }
            keys
        }
    }

    pub(crate) fn tree(order: usize) -> RawBPlusTree {
        RawBPlusTree::new(Config::new(order).unwrap())
    }

    pub(crate) fn payload(key: Key) -> Box<[u8]> {
        format!("value-{key}").into_bytes().into_boxed_slice()
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(Key),
        Delete(Key),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i64..1000).prop_map(Op::Insert),
            2 => (0i64..1000).prop_map(Op::Delete),
        ]
    }

    fn order_strategy() -> impl Strategy<Value = usize> {
        prop_oneof![Just(3usize), Just(5), Just(7), Just(9), Just(17)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn tree_invariants_maintained_after_operations(
            order in order_strategy(),
            ops in prop::collection::vec(op_strategy(), 0..400),
        ) {
            let mut tree = tree(order);
            let mut model = std::collections::BTreeSet::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        let expected = if model.insert(key) { Ok(()) } else { Err(Error::DuplicateKey(key)) };
                        prop_assert_eq!(tree.insert(key, payload(key)), expected);
                    }
                    Op::Delete(key) => {
                        let result = tree.delete(key).map(|_| ());
                        let expected = if model.remove(&key) { Ok(()) } else { Err(Error::KeyNotFound(key)) };
                        prop_assert_eq!(result, expected);
                    }
                }
                tree.validate_invariants();
            }

            prop_assert_eq!(tree.chain_keys(), model.into_iter().collect::<Vec<_>>());
        }

        #[test]
        fn draining_in_random_order_empties_tree(
            order in order_strategy(),
            keys in prop::collection::hash_set(-500i64..500, 0..300),
        ) {
            let mut tree = tree(order);
            for &key in &keys {
                tree.insert(key, payload(key)).unwrap();
            }
            tree.validate_invariants();

            for &key in &keys {
                prop_assert_eq!(tree.delete(key), Ok(payload(key)));
                prop_assert_eq!(tree.find(key), Err(Error::KeyNotFound(key)));
                tree.validate_invariants();
            }

            prop_assert!(tree.is_empty());
            prop_assert_eq!(tree.height(), 0);
        }
    }

    #[test]
    fn empty_tree_queries() {
        let tree = tree(5);
        tree.validate_invariants();

        assert_eq!(tree.find(1), Err(Error::KeyNotFound(1)));
        assert_eq!(tree.find_leaf(1), None);
        assert_eq!(tree.height(), 0);
        assert!(tree.first_key_value().is_none());
        assert!(tree.last_key_value().is_none());
    }

    #[test]
    fn first_and_last_follow_chain_ends() {
        let mut tree = tree(3);
        for key in [40, 10, 30, 20, 50] {
            tree.insert(key, payload(key)).unwrap();
        }
        assert_eq!(tree.first_key_value(), Some((10, &payload(10)[..])));
        assert_eq!(tree.last_key_value(), Some((50, &payload(50)[..])));
    }

    #[test]
    fn height_grows_one_level_per_root_split() {
        let mut tree = tree(3);
        let mut heights = Vec::new();
        for key in 0..10 {
            tree.insert(key, payload(key)).unwrap();
            heights.push(tree.height());
        }
        // Order 3 nodes hold two keys: the root leaf splits on the third insert, and ascending
        // inserts leave every left half at the minimum.
        assert_eq!(heights, [1, 1, 2, 2, 3, 3, 3, 3, 4, 4]);
        tree.validate_invariants();
    }

    #[test]
    fn clear_resets_everything() {
        let mut tree = tree(5);
        for key in 0..100 {
            tree.insert(key, payload(key)).unwrap();
        }
        tree.clear();
        tree.validate_invariants();
        assert!(tree.is_empty());
        tree.insert(7, payload(7)).unwrap();
        assert_eq!(tree.find(7), Ok(&payload(7)[..]));
    }
}
