//! Failure aggregation for scope close operations.
//!
//! Closing a scope attempts every handle it owns, even when some of those
//! releases fail. The failures collected along the way are reported as a
//! single [`CloseError`]: the first failure in release order is the primary
//! cause, and every later failure is attached as a suppressed cause rather
//! than replacing it or being dropped.

use thiserror::Error;

use crate::close::HandleError;

/// Raised when one or more handles fail to close while a scope releases
/// its contents.
///
/// The primary cause is the first failure encountered in release order and
/// is exposed both through [`CloseError::primary`] and through
/// [`std::error::Error::source`]. Failures from the remaining release
/// attempts are kept in [`CloseError::suppressed`], in the order they
/// occurred.
#[derive(Debug, Error)]
#[error("{} handle(s) failed to close; primary cause: {primary}", .suppressed.len() + 1)]
pub struct CloseError {
    #[source]
    primary: HandleError,
    suppressed: Vec<HandleError>,
}

impl CloseError {
    /// Wrap the first release failure of a close operation.
    pub(crate) fn new(primary: HandleError) -> Self {
        Self {
            primary,
            suppressed: Vec::new(),
        }
    }

    /// Attach a failure from a later release attempt.
    pub(crate) fn suppress(&mut self, failure: HandleError) {
        self.suppressed.push(failure);
    }

    /// The first failure encountered in release order.
    #[must_use]
    pub fn primary(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.primary.as_ref()
    }

    /// Failures from release attempts made after the primary one, in the
    /// order they occurred.
    #[must_use]
    pub fn suppressed(&self) -> &[HandleError] {
        &self.suppressed
    }

    /// Total number of release attempts that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.suppressed.len() + 1
    }
}

/// Type alias for scope close results.
pub type CloseResult<T> = Result<T, CloseError>;
