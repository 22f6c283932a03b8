//! Ordered iteration over the leaf chain.

use core::fmt;
use core::iter::FusedIterator;

use crate::Key;
use crate::raw::{Handle, RawBPlusTree};

/// An iterator over a sub-range of entries in a [`BPlusTree`](crate::BPlusTree).
///
/// This `struct` is created by the [`find_range`] and [`iter`] methods on
/// [`BPlusTree`](crate::BPlusTree). It descends the tree once, to the leaf that covers the lower
/// bound, and from there walks the leaf chain. Every leaf after the first is scanned from its
/// start, so entries are never skipped at a leaf boundary.
///
/// # Examples
///
/// ```
/// use bptree::BPlusTree;
///
/// let mut tree = BPlusTree::new();
/// for key in [1, 2, 3] {
///     tree.insert(key, key.to_string()).unwrap();
/// }
///
/// let mut range = tree.find_range(2, 3);
/// assert_eq!(range.next(), Some((2, &b"2"[..])));
/// assert_eq!(range.next(), Some((3, &b"3"[..])));
/// assert_eq!(range.next(), None);
/// ```
///
/// [`find_range`]: crate::BPlusTree::find_range
/// [`iter`]: crate::BPlusTree::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a> {
    tree: &'a RawBPlusTree,
    leaf: Option<Handle>,
    index: usize,
    /// Inclusive upper bound.
    max: Key,
}

impl<'a> Range<'a> {
    /// Entries with keys in `[min, max]`. Empty when `min > max`.
    pub(crate) fn new(tree: &'a RawBPlusTree, min: Key, max: Key) -> Self {
        let start = if min > max { None } else { tree.find_leaf(min) };
        let index = start.map_or(0, |leaf| tree.node(leaf).as_leaf().lower_bound(min));

        Self {
            tree,
            leaf: start,
            index,
            max,
        }
    }

    /// Every entry, from the head of the leaf chain.
    pub(crate) fn full(tree: &'a RawBPlusTree) -> Self {
        Self {
            tree,
            leaf: tree.first_leaf(),
            index: 0,
            max: Key::MAX,
        }
    }
}

impl<'a> Iterator for Range<'a> {
    type Item = (Key, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;

        loop {
            let leaf = tree.node(self.leaf?).as_leaf();

            // The lower bound can land past the end of the start leaf.
            if self.index >= leaf.key_count() {
                self.leaf = leaf.next();
                self.index = 0;
                continue;
            }

            let key = leaf.key(self.index);
            if key > self.max {
                self.leaf = None;
                return None;
            }

            let payload = leaf.payload(self.index);
            self.index += 1;
            return Some((key, payload));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.leaf {
            Some(_) => (0, Some(self.tree.len())),
            None => (0, Some(0)),
        }
    }
}

impl FusedIterator for Range<'_> {}

impl fmt::Debug for Range<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Range")
            .field("leaf", &self.leaf)
            .field("index", &self.index)
            .field("max", &self.max)
            .finish()
    }
}
