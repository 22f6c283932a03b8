mod arena;
mod handle;
mod insert;
mod node;
mod raw_tree;
mod remove;

pub(crate) use handle::Handle;
pub(crate) use raw_tree::RawBPlusTree;
