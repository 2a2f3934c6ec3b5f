//! `Closecore` - scoped ownership of closable handles
//!
//! Acquiring several fallibly-closable resources in a row has a classic
//! leak: if the third acquisition fails, the first two must still be
//! released, in the right order, before the failure propagates. And once
//! everything is acquired, the finished result has to reach the caller
//! *without* being released on the way out. This crate provides three small
//! scope types that own handles during such sequences:
//!
//! - [`ChainScope`] holds at most one handle at a time, for chains where
//!   each construction step wraps and owns the previous step's handle.
//! - [`WrapperScope`] owns any number of handles and closes them all,
//!   last-added-first, aggregating failures into one [`CloseError`].
//! - [`CollectScope`] collects handles for a composite object under
//!   construction, then hands them off as a `WrapperScope` the finished
//!   composite keeps as its close delegate.
//!
//! A handle is anything implementing [`Close`]: one release operation that
//! may fail. Scopes are closables themselves, so they nest.
//!
//! Dropping a scope that still owns handles closes them best-effort and
//! logs failures; calling `close()` explicitly is how failures are
//! observed. Hand-off operations ([`ChainScope::release`],
//! [`CollectScope::release`]) leave the scope empty, which is what keeps
//! the happy path from releasing the result prematurely.
//!
//! ```
//! use closecore::{closer, CollectScope};
//!
//! fn build() -> Result<closecore::WrapperScope, closecore::HandleError> {
//!     let mut scope = CollectScope::new();
//!     scope.add(closer(|| Ok(())));
//!     scope.add(closer(|| Ok(())));
//!     // if anything fails here, dropping `scope` releases both handles
//!     Ok(scope.release())
//! }
//!
//! let mut owner = build()?;
//! owner.close()?;
//! # Ok::<(), closecore::HandleError>(())
//! ```
//!
//! None of the scope types is safe for concurrent use; ownership transfer
//! is not synchronized. Every operation runs to completion on the calling
//! thread.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chain;
pub mod close;
pub mod collect;
pub mod errors;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod wrapper;

pub use chain::ChainScope;
pub use close::{closer, Close, Closer, HandleError};
pub use collect::CollectScope;
pub use errors::{CloseError, CloseResult};
pub use wrapper::WrapperScope;
