//! Transient builder that hands its handles to a long-lived owner.
//!
//! A [`CollectScope`] guards a composite object's construction sequence.
//! Handles acquired along the way are added to the scope; if construction
//! fails partway, the scope (or its drop) releases everything collected so
//! far, in reverse order. When construction succeeds, [`CollectScope::release`]
//! detaches the collected handles as a [`WrapperScope`] that the finished
//! composite keeps as its close delegate, leaving the builder empty.

use std::fmt;
use std::mem;

use crate::close::{Close, HandleError};
use crate::errors::CloseResult;
use crate::wrapper::WrapperScope;

/// A builder scope that collects handles for a composite object and hands
/// them off once construction succeeds.
///
/// ```
/// use closecore::{closer, CollectScope, WrapperScope};
///
/// struct Service {
///     guard: WrapperScope,
/// }
///
/// impl Service {
///     fn start() -> Result<Self, closecore::HandleError> {
///         let mut scope = CollectScope::new();
///         scope.add(closer(|| Ok(()))); // a worker, a lock file, ...
///         scope.add(closer(|| Ok(())));
///         // fallible construction steps run here, protected by the scope
///         Ok(Self {
///             guard: scope.release(),
///         })
///     }
///
///     fn shutdown(&mut self) -> closecore::CloseResult<()> {
///         self.guard.close()
///     }
/// }
///
/// let mut service = Service::start()?;
/// service.shutdown()?;
/// # Ok::<(), closecore::HandleError>(())
/// ```
pub struct CollectScope {
    wrapper: WrapperScope,
}

impl CollectScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wrapper: WrapperScope::new(),
        }
    }

    /// Take ownership of a handle for the composite under construction.
    ///
    /// The handle is owned by the internal wrapper and will be released if
    /// construction fails before [`CollectScope::release`] runs. Returns a
    /// borrow of the stored handle.
    pub fn add<C: Close>(&mut self, handle: C) -> &mut C {
        self.wrapper.add(handle)
    }

    /// Number of handles collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.wrapper.len()
    }

    /// Whether the scope owns no handles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wrapper.is_empty()
    }

    /// Close every collected handle, last-added-first.
    ///
    /// This is the construction-failed path; the normal path is
    /// [`CollectScope::release`], after which this is a no-op.
    pub fn close(&mut self) -> CloseResult<()> {
        self.wrapper.close()
    }

    /// Detach the collected handles as the composite's long-term owner.
    ///
    /// The internal wrapper moves out whole, handles in their original
    /// order, and a brand-new empty wrapper takes its place, so the scope
    /// owns nothing afterwards and remains usable for a new collection.
    /// Dropping the returned wrapper closes every handle in it; the caller
    /// is expected to store it.
    #[must_use = "dropping the returned WrapperScope closes every handle in it"]
    pub fn release(&mut self) -> WrapperScope {
        mem::take(&mut self.wrapper)
    }
}

impl Default for CollectScope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CollectScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectScope")
            .field("collected", &self.wrapper.len())
            .finish()
    }
}

impl Close for CollectScope {
    fn close(&mut self) -> Result<(), HandleError> {
        CollectScope::close(self).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_log, Probe};

    #[test]
    fn release_hands_off_the_collected_handles() {
        let log = new_log();
        let mut scope = CollectScope::new();
        scope.add(Probe::new("a", &log));
        scope.add(Probe::new("b", &log));

        let mut owner = scope.release();

        // the builder owns nothing anymore; its close is a no-op
        assert!(scope.is_empty());
        scope.close().unwrap();
        assert!(log.borrow().is_empty());

        owner.close().unwrap();
        assert_eq!(*log.borrow(), vec!["b", "a"]);
    }

    #[test]
    fn close_releases_what_was_collected_before_a_failure() {
        let log = new_log();
        let mut scope = CollectScope::new();
        scope.add(Probe::new("a", &log));
        // construction of the next resource failed before it was added

        scope.close().unwrap();

        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn dropping_the_builder_releases_what_was_collected() {
        let log = new_log();
        {
            let mut scope = CollectScope::new();
            scope.add(Probe::new("a", &log));
            scope.add(Probe::new("b", &log));
        }
        assert_eq!(*log.borrow(), vec!["b", "a"]);
    }

    #[test]
    fn the_builder_is_reusable_after_release() {
        let log = new_log();
        let mut scope = CollectScope::new();
        scope.add(Probe::new("first-batch", &log));
        let first = scope.release();

        scope.add(Probe::new("second-batch", &log));
        scope.close().unwrap();
        assert_eq!(*log.borrow(), vec!["second-batch"]);

        drop(first);
        assert_eq!(*log.borrow(), vec!["second-batch", "first-batch"]);
    }

    #[test]
    fn failures_on_the_failure_path_aggregate_like_a_wrapper() {
        let log = new_log();
        let mut scope = CollectScope::new();
        scope.add(Probe::failing("a", &log, "a failed"));
        scope.add(Probe::new("b", &log));

        let err = scope.close().unwrap_err();

        assert_eq!(*log.borrow(), vec!["b", "a"]);
        assert_eq!(err.primary().to_string(), "a failed");
        assert!(scope.is_empty());
    }
}
