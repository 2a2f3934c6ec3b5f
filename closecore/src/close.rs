//! The closable-handle capability.
//!
//! Everything the scope machinery owns is a [`Close`] handle: an opaque
//! value with a single release operation that may fail. The scopes in this
//! crate never inspect a handle beyond calling [`Close::close`] on it
//! exactly once.

use std::any::Any;
use std::error::Error;

/// Boxed error raised by a handle's own release operation.
///
/// Recoverable release failures surface as this type and are wrapped into a
/// [`CloseError`](crate::errors::CloseError) by the owning scope.
/// Unrecoverable failures are panics and are not represented here.
pub type HandleError = Box<dyn Error + Send + Sync + 'static>;

/// A handle with a single, fallible release operation.
///
/// Implementations release whatever resource sits behind the handle: flush
/// and close a file, tear down a connection, join a worker, remove a lock.
/// The scope machinery guarantees that `close` is invoked at most once per
/// handle it owns, so implementations do not need their own idempotence
/// bookkeeping (though defensive implementations may keep it).
///
/// `Any` is a supertrait so that type-erased scopes can hand a typed
/// borrow of a freshly added handle back to the caller.
pub trait Close: Any {
    /// Release the resource behind this handle.
    fn close(&mut self) -> Result<(), HandleError>;
}

impl<T: Close + ?Sized> Close for Box<T> {
    fn close(&mut self) -> Result<(), HandleError> {
        (**self).close()
    }
}

/// An anonymous handle built from a release closure.
///
/// Created by [`closer`]. The closure runs the first time the handle is
/// closed; later attempts are no-ops.
pub struct Closer<F> {
    release: Option<F>,
}

impl<F> std::fmt::Debug for Closer<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Closer")
            .field("pending", &self.release.is_some())
            .finish()
    }
}

/// Wrap a release closure as a [`Close`] handle.
///
/// Useful for resources whose cleanup is a one-off action rather than a
/// method on an owned value:
///
/// ```
/// use closecore::{closer, WrapperScope};
///
/// let mut scope = WrapperScope::new();
/// scope.add(closer(|| {
///     // remove a pid file, signal a peer, ...
///     Ok(())
/// }));
/// assert!(scope.close().is_ok());
/// ```
pub fn closer<F>(release: F) -> Closer<F>
where
    F: FnOnce() -> Result<(), HandleError> + 'static,
{
    Closer {
        release: Some(release),
    }
}

impl<F> Close for Closer<F>
where
    F: FnOnce() -> Result<(), HandleError> + 'static,
{
    fn close(&mut self) -> Result<(), HandleError> {
        match self.release.take() {
            Some(release) => release(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closer_runs_the_closure_once() {
        use std::cell::Cell;
        use std::rc::Rc;

        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let mut handle = closer(move || {
            seen.set(seen.get() + 1);
            Ok(())
        });
        handle.close().unwrap();
        handle.close().unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn closer_propagates_the_closure_error() {
        let mut handle = closer(|| Err("backing store unreachable".into()));
        let err = handle.close().unwrap_err();
        assert_eq!(err.to_string(), "backing store unreachable");
        // second attempt is a no-op, the closure is gone
        assert!(handle.close().is_ok());
    }

    #[test]
    fn boxed_handles_are_handles() {
        let mut boxed: Box<dyn Close> = Box::new(closer(|| Ok(())));
        assert!(boxed.close().is_ok());
    }
}
