//! Probe handles for exercising scope behavior in tests.
//!
//! The probes record every release into a shared log so tests can assert
//! on release order and multiplicity, and can be configured to fail or
//! panic when closed. Enabled for this crate's own tests and, through the
//! `testing` feature, for downstream crates.

use std::cell::RefCell;
use std::rc::Rc;

use crate::close::{Close, HandleError};

/// Shared log of release events, in occurrence order.
pub type ReleaseLog = Rc<RefCell<Vec<String>>>;

/// Create an empty release log to share between probes.
#[must_use]
pub fn new_log() -> ReleaseLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// What a [`Probe`] does when closed, after recording itself.
#[derive(Debug, Clone)]
enum OnClose {
    Succeed,
    Fail(String),
    Panic,
}

/// A handle that records its name into a shared log when closed.
#[derive(Debug)]
pub struct Probe {
    name: String,
    log: ReleaseLog,
    on_close: OnClose,
}

impl Probe {
    /// A probe whose close succeeds.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &ReleaseLog) -> Self {
        Self {
            name: name.into(),
            log: Rc::clone(log),
            on_close: OnClose::Succeed,
        }
    }

    /// A probe whose close fails with `message` after recording itself.
    #[must_use]
    pub fn failing(name: impl Into<String>, log: &ReleaseLog, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log: Rc::clone(log),
            on_close: OnClose::Fail(message.into()),
        }
    }

    /// A probe whose close panics after recording itself.
    #[must_use]
    pub fn panicking(name: impl Into<String>, log: &ReleaseLog) -> Self {
        Self {
            name: name.into(),
            log: Rc::clone(log),
            on_close: OnClose::Panic,
        }
    }

    /// The name this probe records itself under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Close for Probe {
    fn close(&mut self) -> Result<(), HandleError> {
        self.log.borrow_mut().push(self.name.clone());
        match &self.on_close {
            OnClose::Succeed => Ok(()),
            OnClose::Fail(message) => Err(message.clone().into()),
            OnClose::Panic => panic!("probe {} panicked on close", self.name),
        }
    }
}
