//! Error types for [`BPlusTree`](crate::BPlusTree) operations.

use thiserror::Error;

use crate::Key;

/// Result type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Recoverable outcomes reported by the tree.
///
/// Every mutating operation either completes or is rejected before the tree is touched, so
/// receiving one of these never leaves the tree half-modified. Structural corruption is not an
/// `Error`: it panics.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// `insert` was given a key that is already present.
    #[error("duplicate key: {0}")]
    DuplicateKey(Key),

    /// `find` or `delete` was given a key that is not present.
    #[error("key not found: {0}")]
    KeyNotFound(Key),

    /// The configured order cannot keep every node between its minimum and maximum occupancy.
    #[error("invalid order {0}: order must be odd and at least 3")]
    InvalidOrder(usize),
}
