//! Multi-slot scope with ordered, failure-aggregating bulk release.
//!
//! A [`WrapperScope`] owns any number of handles and releases them all,
//! last-added-first. The last handle added is typically the one most
//! dependent on the handles before it, so it goes first. Failures never cut
//! the release short: every owned handle is attempted, and everything that
//! went wrong is reported as one [`CloseError`].

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::close::{Close, HandleError};
use crate::errors::{CloseError, CloseResult};

/// A scope that owns an ordered collection of handles and closes them in
/// reverse order of addition.
///
/// Besides serving acquisition sequences directly, a `WrapperScope` is the
/// long-term owner a [`CollectScope`](crate::CollectScope) hands off: a
/// composite object keeps the wrapper and delegates its own close to it.
///
/// ```
/// use closecore::{closer, WrapperScope};
///
/// let mut scope = WrapperScope::new();
/// scope.add(closer(|| Ok(())));
/// scope.add(closer(|| Ok(())));
/// assert_eq!(scope.len(), 2);
///
/// scope.close()?;
/// assert!(scope.is_empty());
/// # Ok::<(), closecore::CloseError>(())
/// ```
pub struct WrapperScope {
    owned: Vec<Box<dyn Close>>,
}

impl WrapperScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self { owned: Vec::new() }
    }

    /// Take ownership of a handle, appending it to the release order.
    ///
    /// Handles are closed in the reverse order of addition. Returns a
    /// borrow of the stored handle so it can still be used while the scope
    /// owns it.
    pub fn add<C: Close>(&mut self, handle: C) -> &mut C {
        self.owned.push(Box::new(handle));
        let stored = self.owned.last_mut().expect("handle was just pushed");
        let stored: &mut dyn Any = &mut **stored;
        stored
            .downcast_mut::<C>()
            .expect("freshly stored handle has the type it was added with")
    }

    /// Number of handles currently owned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owned.len()
    }

    /// Whether the scope owns no handles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    /// Close every owned handle, last-added-first.
    ///
    /// Every handle is attempted exactly once, even when earlier releases
    /// in the same call fail. The first failure in release order becomes
    /// the primary cause of the returned [`CloseError`]; later failures are
    /// attached as suppressed causes. A handle that panics while closing
    /// does not stop the drain either: the panic resumes only after the
    /// remaining handles have been attempted, and any recoverable failures
    /// gathered up to that point are logged before it does.
    ///
    /// The collection is empty once this returns, so a second call is a
    /// no-op.
    pub fn close(&mut self) -> CloseResult<()> {
        let mut failure: Option<CloseError> = None;
        let mut first_panic: Option<Box<dyn Any + Send>> = None;

        while let Some(mut handle) = self.owned.pop() {
            match panic::catch_unwind(AssertUnwindSafe(|| handle.close())) {
                Ok(Ok(())) => {}
                Ok(Err(cause)) => match failure {
                    None => failure = Some(CloseError::new(cause)),
                    Some(ref mut failure) => failure.suppress(cause),
                },
                Err(payload) => {
                    if first_panic.is_none() {
                        first_panic = Some(payload);
                    } else {
                        tracing::error!("another handle panicked while closing; first panic wins");
                    }
                }
            }
        }

        if let Some(payload) = first_panic {
            if let Some(failure) = failure {
                tracing::error!(error = %failure, "release failures discarded by a panicking handle");
            }
            panic::resume_unwind(payload);
        }

        match failure {
            None => Ok(()),
            Some(failure) => Err(failure),
        }
    }
}

impl Default for WrapperScope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WrapperScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperScope")
            .field("owned", &self.owned.len())
            .finish()
    }
}

impl Close for WrapperScope {
    fn close(&mut self) -> Result<(), HandleError> {
        WrapperScope::close(self).map_err(Into::into)
    }
}

impl Drop for WrapperScope {
    fn drop(&mut self) {
        if self.owned.is_empty() {
            return;
        }
        match panic::catch_unwind(AssertUnwindSafe(|| self.close())) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                tracing::error!(%error, "wrapper scope dropped handles that failed to close");
            }
            Err(_) => {
                tracing::error!("owned handle panicked while closing during drop");
            }
        }
    }
}
