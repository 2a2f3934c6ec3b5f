//! Example call sites for the `closecore` scope types.
//!
//! The scope types are deliberately small; what they look like in use is
//! easier to show than to describe. The [`spool`] module builds a little
//! on-disk spool out of resources with real, fallible cleanup (directories
//! to sweep, lock files to remove, journals to flush) and acquires them
//! through `ChainScope` and `CollectScope` the way application code would.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod spool;
