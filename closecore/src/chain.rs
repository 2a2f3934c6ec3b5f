//! Single-slot scope for chained initialization.
//!
//! A chain builds one result out of several handles, each constructed from
//! (and taking ownership of) the one before it: raw transport, then a
//! framed layer over it, then a session over that. While a step is in
//! flight the newest handle sits hooked in a [`ChainScope`]; if anything
//! fails before the chain completes, dropping the scope releases it, which
//! cascades down the chain. When the chain completes, [`ChainScope::release`]
//! hands the finished handle to the caller without closing anything.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::close::{Close, HandleError};
use crate::errors::{CloseError, CloseResult};

/// A scope that owns at most one handle at a time while a chain of
/// constructions runs to completion.
///
/// The scope has two states: empty, and holding one hooked handle. Hooking
/// replaces the previous handle without closing it, because each handle in
/// a chain is assumed to own the one it was built from; closing the newest
/// is what releases the whole chain.
///
/// ```
/// use closecore::{ChainScope, Close, HandleError};
///
/// struct Transport;
/// struct Session {
///     transport: Transport,
/// }
///
/// impl Close for Transport {
///     fn close(&mut self) -> Result<(), HandleError> {
///         Ok(())
///     }
/// }
///
/// impl Close for Session {
///     fn close(&mut self) -> Result<(), HandleError> {
///         self.transport.close()
///     }
/// }
///
/// fn open_session() -> Result<Session, HandleError> {
///     let mut scope = ChainScope::new();
///     scope.hook(Transport);
///     // any fallible work here leaves the transport protected by the scope
///     let scope = scope.rehook(|transport| Ok::<_, HandleError>(Session { transport }))?;
///     Ok(scope.release())
/// }
///
/// let mut session = open_session()?;
/// session.close()?;
/// # Ok::<(), HandleError>(())
/// ```
pub struct ChainScope<T: Close> {
    hooked: Option<T>,
}

impl<T: Close> ChainScope<T> {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self { hooked: None }
    }

    /// Hook a handle into the scope, replacing whatever was hooked before.
    ///
    /// The replaced handle is discarded, not closed: it is assumed to
    /// already be owned by the new one. Returns a borrow of the hooked
    /// handle so it can be used while the scope protects it.
    pub fn hook(&mut self, handle: T) -> &mut T {
        self.hooked.insert(handle)
    }

    /// Whether the scope currently holds a handle.
    #[must_use]
    pub fn is_holding(&self) -> bool {
        self.hooked.is_some()
    }

    /// Advance the chain by one construction step.
    ///
    /// Takes the hooked handle, feeds it by value to `step`, and hooks the
    /// result in a fresh scope. On failure the step's error propagates
    /// unchanged; the consumed handle is the step's to clean up, per the
    /// usual contract of fallible consuming constructors.
    ///
    /// # Panics
    ///
    /// Panics if the scope is empty. Rehooking an empty chain is a
    /// programming error, not a recoverable condition.
    pub fn rehook<U, E, F>(mut self, step: F) -> Result<ChainScope<U>, E>
    where
        U: Close,
        F: FnOnce(T) -> Result<U, E>,
    {
        let current = self
            .hooked
            .take()
            .expect("rehook() called on an empty ChainScope");
        let mut next = ChainScope::new();
        next.hook(step(current)?);
        Ok(next)
    }

    /// Hand the hooked handle to the caller as the chain's finished result.
    ///
    /// The scope ends empty, so a later `close` (explicit or on drop) is a
    /// no-op and the returned handle stays open.
    ///
    /// # Panics
    ///
    /// Panics if the scope is empty. Releasing a handle that was never
    /// hooked (or was already released) is a programming error.
    #[must_use]
    pub fn release(mut self) -> T {
        self.hooked
            .take()
            .expect("release() called on an empty ChainScope")
    }

    /// Close the hooked handle, if any.
    ///
    /// The slot is cleared before the release attempt, so the handle is
    /// attempted exactly once even when closing fails, and a second call is
    /// always a no-op.
    pub fn close(&mut self) -> CloseResult<()> {
        match self.hooked.take() {
            None => Ok(()),
            Some(mut handle) => handle.close().map_err(CloseError::new),
        }
    }
}

impl<T: Close> Default for ChainScope<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Close> fmt::Debug for ChainScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainScope")
            .field("holding", &self.hooked.is_some())
            .finish()
    }
}

impl<T: Close> Close for ChainScope<T> {
    fn close(&mut self) -> Result<(), HandleError> {
        ChainScope::close(self).map_err(Into::into)
    }
}

impl<T: Close> Drop for ChainScope<T> {
    fn drop(&mut self) {
        if self.hooked.is_none() {
            return;
        }
        match panic::catch_unwind(AssertUnwindSafe(|| self.close())) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                tracing::error!(%error, "chain scope dropped a handle that failed to close");
            }
            Err(_) => {
                tracing::error!("hooked handle panicked while closing during drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_log, Probe};

    #[test]
    fn close_is_idempotent() {
        let log = new_log();
        let mut scope = ChainScope::new();
        scope.hook(Probe::new("resource", &log));

        scope.close().unwrap();
        scope.close().unwrap();

        assert_eq!(*log.borrow(), vec!["resource"]);
    }

    #[test]
    fn close_is_idempotent_on_failure() {
        let log = new_log();
        let mut scope = ChainScope::new();
        scope.hook(Probe::failing("resource", &log, "flush failed"));

        scope.close().unwrap_err();
        // the handle must not be attempted a second time
        scope.close().unwrap();

        assert_eq!(*log.borrow(), vec!["resource"]);
    }

    #[test]
    fn recoverable_failure_is_wrapped() {
        let log = new_log();
        let mut scope = ChainScope::new();
        scope.hook(Probe::failing("resource", &log, "flush failed"));

        let err = scope.close().unwrap_err();
        assert_eq!(err.failure_count(), 1);
        assert_eq!(err.primary().to_string(), "flush failed");
        assert!(err.suppressed().is_empty());
    }

    #[test]
    fn release_prevents_closing_the_handle() {
        let log = new_log();
        let mut scope = ChainScope::new();
        scope.hook(Probe::new("resource", &log));

        let handle = scope.release();
        drop(handle);

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn hook_replaces_without_closing() {
        let log = new_log();
        let mut scope = ChainScope::new();
        scope.hook(Probe::new("first", &log));
        scope.hook(Probe::new("second", &log));

        scope.close().unwrap();

        assert_eq!(*log.borrow(), vec!["second"]);
    }

    #[test]
    fn dropping_the_scope_closes_the_hooked_handle() {
        let log = new_log();
        {
            let mut scope = ChainScope::new();
            scope.hook(Probe::new("resource", &log));
        }
        assert_eq!(*log.borrow(), vec!["resource"]);
    }

    #[test]
    fn dropping_an_empty_scope_releases_nothing() {
        let log = new_log();
        {
            let mut scope = ChainScope::new();
            scope.hook(Probe::new("resource", &log));
            let _handle = scope.release();
        }
        // only the probe's own drop ran, which records nothing
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn rehook_hooks_the_step_result() {
        let log = new_log();
        let mut scope = ChainScope::new();
        scope.hook(Probe::new("inner", &log));

        let outer = log.clone();
        let scope = scope
            .rehook(|inner| {
                // the new handle owns the one it was built from
                let mut wrapped = crate::WrapperScope::new();
                wrapped.add(inner);
                wrapped.add(Probe::new("outer", &outer));
                Ok::<_, HandleError>(wrapped)
            })
            .unwrap();

        drop(scope);
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn rehook_failure_propagates_the_step_error() {
        let log = new_log();
        let mut scope = ChainScope::new();
        scope.hook(Probe::new("inner", &log));

        let result = scope.rehook(|_inner| Err::<Probe, &str>("construction failed"));
        assert_eq!(result.unwrap_err(), "construction failed");
    }

    #[test]
    #[should_panic(expected = "release() called on an empty ChainScope")]
    fn releasing_an_empty_scope_panics() {
        let scope: ChainScope<Probe> = ChainScope::new();
        let _ = scope.release();
    }

    #[test]
    #[should_panic(expected = "rehook() called on an empty ChainScope")]
    fn rehooking_an_empty_scope_panics() {
        let scope: ChainScope<Probe> = ChainScope::new();
        let _ = scope.rehook(|probe| Ok::<Probe, HandleError>(probe));
    }
}
