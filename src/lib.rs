//! An ordered in-memory key/value index backed by a B+ tree.
//!
//! This crate provides [`BPlusTree`], which maps unique `i64` keys to opaque byte payloads and
//! supports:
//!
//! - [`insert`](BPlusTree::insert) - Add an entry, rejecting duplicate keys
//! - [`find`](BPlusTree::find) - Look up the payload stored under a key
//! - [`find_range`](BPlusTree::find_range) - Iterate lazily over an inclusive key range
//! - [`delete`](BPlusTree::delete) - Remove an entry, rebalancing the tree
//!
//! # Example
//!
//! ```
//! use bptree::{BPlusTree, Config};
//!
//! let mut index = BPlusTree::with_config(Config::new(3).unwrap()).unwrap();
//! for key in (3..=123).step_by(10) {
//!     index.insert(key, format!("payload-{key}")).unwrap();
//! }
//!
//! assert_eq!(index.find(53), Ok(&b"payload-53"[..]));
//!
//! let keys: Vec<_> = index.find_range(50, 100).map(|(key, _)| key).collect();
//! assert_eq!(keys, [53, 63, 73, 83, 93]);
//!
//! for key in (3..=123).step_by(10) {
//!     index.delete(key).unwrap();
//! }
//! assert!(index.is_empty());
//! ```
//!
//! # Implementation
//!
//! Nodes live in a generational arena and refer to each other through handles. Branches own
//! their children; parent links and the doubly linked leaf chain are plain handles that are
//! rewired whenever a split, merge or redistribution moves a node.
//!
//! Structural changes are reported through [`tracing`] under the `bptree::insert` and
//! `bptree::remove` targets.

// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod config;
mod error;
mod range;
mod raw;
mod tree;

pub use config::{Config, DEFAULT_ORDER, MIN_ORDER};
pub use error::{Error, Result};
pub use range::Range;
pub use tree::BPlusTree;

/// Key type of the index.
pub type Key = i64;
