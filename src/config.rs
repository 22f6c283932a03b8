//! Tree configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Order used by [`Config::default`].
pub const DEFAULT_ORDER: usize = 5;

/// Smallest order that keeps every branch at two or more children after a split.
pub const MIN_ORDER: usize = 3;

/// Configuration for a [`BPlusTree`](crate::BPlusTree).
///
/// The order `m` is the maximum number of children a branch may hold. It fixes the occupancy
/// bounds of every node other than the root:
///
/// - [`max_keys`](Config::max_keys) is `m - 1`
/// - [`min_keys`](Config::min_keys) is `floor(m / 2)`
///
/// Only odd orders of at least [`MIN_ORDER`] are accepted. For an even order, splitting a full
/// branch cannot leave both halves at `min_keys`.
///
/// # Examples
///
/// ```
/// use bptree::Config;
///
/// let config = Config::new(7).unwrap();
/// assert_eq!(config.max_keys(), 6);
/// assert_eq!(config.min_keys(), 3);
///
/// assert!(Config::new(6).is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Config {
    /// Branching factor of the tree.
    pub order: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { order: DEFAULT_ORDER }
    }
}

impl Config {
    /// Creates a validated configuration with the given order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`] if `order` is even or below [`MIN_ORDER`].
    pub fn new(order: usize) -> Result<Self> {
        let config = Self { order };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the order yields consistent occupancy bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`] if `order` is even or below [`MIN_ORDER`].
    pub fn validate(&self) -> Result<()> {
        if self.order < MIN_ORDER || self.order.is_multiple_of(2) {
            return Err(Error::InvalidOrder(self.order));
        }
        Ok(())
    }

    /// Maximum number of keys any node may hold.
    #[must_use]
    pub const fn max_keys(&self) -> usize {
        self.order - 1
    }

    /// Minimum number of keys any non-root node must hold.
    #[must_use]
    pub const fn min_keys(&self) -> usize {
        self.order / 2
    }

    /// Number of entries a splitting node keeps out of its `max_keys + 1` overflowed entries.
    ///
    /// For a branch, the key at this index is promoted to the parent and kept by neither half.
    #[must_use]
    pub const fn split_index(&self) -> usize {
        let max_keys = self.max_keys();
        if max_keys.is_multiple_of(2) { max_keys / 2 } else { max_keys / 2 + 1 }
    }
}
