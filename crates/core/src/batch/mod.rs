//! Batch conversion of whole directories.
//!
//! [`DirectoryWalker`] lists the `.m4a` files of a directory (optionally
//! recursively) and hands each one to a
//! [`SegmentConverter`](crate::converter::SegmentConverter). Results are
//! collected per file into a [`BatchResult`] ordered by file name.

mod types;
mod walker;

pub use types::BatchResult;
pub use walker::DirectoryWalker;
