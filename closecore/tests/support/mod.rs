//! Shared fixtures for the integration tests.

use std::cell::RefCell;
use std::rc::Rc;

use closecore::{Close, HandleError};

/// Shared, ordered record of which handles were released.
pub type Trace = Rc<RefCell<Vec<String>>>;

/// Create an empty trace to share between handles.
pub fn trace() -> Trace {
    Rc::new(RefCell::new(Vec::new()))
}

/// A handle that appends its name to a [`Trace`] when closed, optionally
/// failing afterwards with the message `"<name> failed"`.
#[derive(Debug)]
pub struct TracedHandle {
    name: String,
    trace: Trace,
    fails: bool,
}

impl TracedHandle {
    /// A handle whose close succeeds.
    pub fn ok(name: &str, trace: &Trace) -> Self {
        Self {
            name: name.to_string(),
            trace: Rc::clone(trace),
            fails: false,
        }
    }

    /// A handle whose close fails after recording itself.
    pub fn failing(name: &str, trace: &Trace) -> Self {
        Self {
            name: name.to_string(),
            trace: Rc::clone(trace),
            fails: true,
        }
    }
}

impl Close for TracedHandle {
    fn close(&mut self) -> Result<(), HandleError> {
        self.trace.borrow_mut().push(self.name.clone());
        if self.fails {
            Err(format!("{} failed", self.name).into())
        } else {
            Ok(())
        }
    }
}
