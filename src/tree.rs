//! The public B+ tree index.

use core::fmt;

use crate::Key;
use crate::config::{Config, DEFAULT_ORDER};
use crate::error::Result;
use crate::range::Range;
use crate::raw::RawBPlusTree;

/// An ordered in-memory index from integer keys to byte payloads, based on a [B+ tree].
///
/// Every entry lives in a leaf. Branch nodes only hold separator keys that route a search to
/// the one leaf covering a key, and the leaves are chained in key order so that a range scan
/// descends the tree once and then walks sideways.
///
/// The order `m` of the tree (see [`Config`]) bounds every node: no node holds more than `m - 1`
/// keys, and every node other than the root holds at least `floor(m / 2)`. Insertion splits
/// overfull nodes on the way back up; deletion repairs underfull nodes by borrowing a single
/// entry from a neighbour or by merging with it. All leaves stay at the same depth, so lookups,
/// insertions and deletions are O(log n).
///
/// Keys are unique. Inserting a key that is already present is rejected rather than
/// overwriting, and deleting or finding a missing key is reported as an error. A rejected
/// operation never modifies the tree.
///
/// # Examples
///
/// ```
/// use bptree::{BPlusTree, Error};
///
/// let mut index = BPlusTree::new();
/// index.insert(20, "twenty").unwrap();
/// index.insert(10, "ten").unwrap();
/// index.insert(30, "thirty").unwrap();
///
/// assert_eq!(index.find(10), Ok(&b"ten"[..]));
/// assert_eq!(index.insert(10, "again"), Err(Error::DuplicateKey(10)));
///
/// let keys: Vec<_> = index.find_range(15, 40).map(|(key, _)| key).collect();
/// assert_eq!(keys, [20, 30]);
///
/// assert_eq!(index.delete(20).unwrap(), b"twenty");
/// assert_eq!(index.find(20), Err(Error::KeyNotFound(20)));
/// assert_eq!(index.len(), 2);
/// ```
///
/// [B+ tree]: https://en.wikipedia.org/wiki/B%2B_tree
#[derive(Clone)]
pub struct BPlusTree {
    raw: RawBPlusTree,
}

impl BPlusTree {
    /// Makes a new, empty `BPlusTree` of order [`DEFAULT_ORDER`].
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let tree = BPlusTree::new();
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.config().order, bptree::DEFAULT_ORDER);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            raw: RawBPlusTree::new(Config { order: DEFAULT_ORDER }),
        }
    }

    /// Makes a new, empty `BPlusTree` with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`](crate::Error::InvalidOrder) if the configured order is
    /// even or below [`MIN_ORDER`](crate::MIN_ORDER).
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::{BPlusTree, Config, Error};
    ///
    /// let tree = BPlusTree::with_config(Config { order: 9 }).unwrap();
    /// assert_eq!(tree.config().max_keys(), 8);
    ///
    /// assert_eq!(BPlusTree::with_config(Config { order: 4 }).err(), Some(Error::InvalidOrder(4)));
    /// ```
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            raw: RawBPlusTree::new(config),
        })
    }

    /// Returns the configuration the tree was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        self.raw.config()
    }

    /// Returns the number of entries in the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new();
    /// assert_eq!(tree.len(), 0);
    /// tree.insert(1, "a").unwrap();
    /// assert_eq!(tree.len(), 1);
    /// ```
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the number of levels between the root and the leaves, inclusive.
    ///
    /// An empty tree has height 0 and a tree whose root is a leaf has height 1.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Clears the tree, removing all entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new();
    /// tree.insert(1, "a").unwrap();
    /// tree.clear();
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.height(), 0);
    /// ```
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Inserts a new entry.
    ///
    /// A leaf that overflows is split in two and the smallest key of the new right half is
    /// copied into the parent as a separator. Splits cascade upwards; a split root grows the
    /// tree by one level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`](crate::Error::DuplicateKey) if `key` is already present.
    /// The stored payload is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::{BPlusTree, Error};
    ///
    /// let mut tree = BPlusTree::new();
    /// assert_eq!(tree.insert(37, "a"), Ok(()));
    /// assert_eq!(tree.insert(37, "b"), Err(Error::DuplicateKey(37)));
    /// assert_eq!(tree.find(37), Ok(&b"a"[..]));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, key: Key, payload: impl Into<Vec<u8>>) -> Result<()> {
        self.raw.insert(key, payload.into().into_boxed_slice())
    }

    /// Removes a key from the tree, returning the payload stored under it.
    ///
    /// A node left below its minimum occupancy first tries to borrow one entry from a
    /// neighbouring sibling and otherwise merges with it. Merges can cascade up to the root,
    /// which is discarded once it has a single child left.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`](crate::Error::KeyNotFound) if `key` is not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::{BPlusTree, Error};
    ///
    /// let mut tree = BPlusTree::new();
    /// tree.insert(1, "a").unwrap();
    /// assert_eq!(tree.delete(1), Ok(b"a".to_vec()));
    /// assert_eq!(tree.delete(1), Err(Error::KeyNotFound(1)));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn delete(&mut self, key: Key) -> Result<Vec<u8>> {
        self.raw.delete(key).map(<[u8]>::into_vec)
    }

    /// Returns the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`](crate::Error::KeyNotFound) if `key` is not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::{BPlusTree, Error};
    ///
    /// let mut tree = BPlusTree::new();
    /// tree.insert(1, [0xde, 0xad]).unwrap();
    /// assert_eq!(tree.find(1), Ok(&[0xde, 0xad][..]));
    /// assert_eq!(tree.find(2), Err(Error::KeyNotFound(2)));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn find(&self, key: Key) -> Result<&[u8]> {
        self.raw.find(key)
    }

    /// Returns `true` if the tree contains an entry for `key`.
    #[must_use]
    pub fn contains_key(&self, key: Key) -> bool {
        self.raw.find(key).is_ok()
    }

    /// Returns a lazy iterator over the entries with keys in `min..=max`, in ascending key order.
    ///
    /// When `min > max` the iterator is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new();
    /// for key in (3..=123).step_by(10) {
    ///     tree.insert(key, key.to_string()).unwrap();
    /// }
    ///
    /// let keys: Vec<_> = tree.find_range(50, 100).map(|(key, _)| key).collect();
    /// assert_eq!(keys, [53, 63, 73, 83, 93]);
    ///
    /// assert_eq!(tree.find_range(100, 50).next(), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) to reach the first entry, then O(1) amortized per entry.
    pub fn find_range(&self, min: Key, max: Key) -> Range<'_> {
        Range::new(&self.raw, min, max)
    }

    /// Gets an iterator over all entries of the tree, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new();
    /// tree.insert(3, "c").unwrap();
    /// tree.insert(2, "b").unwrap();
    /// tree.insert(1, "a").unwrap();
    ///
    /// let (first_key, first_payload) = tree.iter().next().unwrap();
    /// assert_eq!((first_key, first_payload), (1, &b"a"[..]));
    /// ```
    pub fn iter(&self) -> Range<'_> {
        Range::full(&self.raw)
    }

    /// Returns the entry with the smallest key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new();
    /// assert_eq!(tree.first_key_value(), None);
    /// tree.insert(2, "b").unwrap();
    /// tree.insert(1, "a").unwrap();
    /// assert_eq!(tree.first_key_value(), Some((1, &b"a"[..])));
    /// ```
    #[must_use]
    pub fn first_key_value(&self) -> Option<(Key, &[u8])> {
        self.raw.first_key_value()
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(Key, &[u8])> {
        self.raw.last_key_value()
    }
}

impl fmt::Debug for BPlusTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Default for BPlusTree {
    /// Creates an empty `BPlusTree` of order [`DEFAULT_ORDER`].
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a BPlusTree {
    type Item = (Key, &'a [u8]);
    type IntoIter = Range<'a>;

    fn into_iter(self) -> Range<'a> {
        self.iter()
    }
}
