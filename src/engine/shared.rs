//! Thread-safe handle to a machine.

use crate::core::StateName;
use crate::engine::context::{Extras, PendingTransition};
use crate::engine::error::FireError;
use crate::engine::machine::{FireResult, Machine};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::Arc;

/// Cloneable handle that serializes access to one [`Machine`].
///
/// Callers on different threads wait for each other. A callback that fires
/// or resumes through a handle to its own machine gets [`FireError::Busy`]
/// rather than deadlocking, and sees the machine as not idle.
#[derive(Clone)]
pub struct SharedMachine {
    inner: Arc<ReentrantMutex<RefCell<Machine>>>,
}

impl SharedMachine {
    pub fn new(machine: Machine) -> Self {
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(machine))),
        }
    }

    pub fn fire(&self, event: &str) -> Result<FireResult, FireError> {
        self.fire_with(event, Extras::new())
    }

    pub fn fire_with(&self, event: &str, extras: Extras) -> Result<FireResult, FireError> {
        let guard = self.inner.lock();
        let mut machine = guard.try_borrow_mut().map_err(|_| FireError::Busy {
            event: event.to_string(),
        })?;
        machine.fire_with(event, extras)
    }

    pub fn resume_transition(&self, ticket: &PendingTransition) -> Result<FireResult, FireError> {
        let guard = self.inner.lock();
        let mut machine = guard.try_borrow_mut().map_err(|_| FireError::Busy {
            event: ticket.event.clone(),
        })?;
        machine.resume_transition(ticket)
    }

    pub fn abandon_transition(&self, ticket: &PendingTransition) -> Result<(), FireError> {
        let guard = self.inner.lock();
        let mut machine = guard.try_borrow_mut().map_err(|_| FireError::Busy {
            event: ticket.event.clone(),
        })?;
        machine.abandon_transition(ticket)
    }

    /// Current state, or `None` when called from inside one of the
    /// machine's own callbacks.
    pub fn current(&self) -> Option<StateName> {
        self.read(|machine| machine.current().clone())
    }

    pub fn is_state(&self, state: &str) -> bool {
        self.read(|machine| machine.is_state(state)).unwrap_or(false)
    }

    pub fn can(&self, event: &str) -> bool {
        self.read(|machine| machine.can(event)).unwrap_or(false)
    }

    pub fn cannot(&self, event: &str) -> bool {
        !self.can(event)
    }

    pub fn pending(&self) -> Option<PendingTransition> {
        self.read(Machine::pending).flatten()
    }

    /// Run `f` with shared access, unless the machine is mid-dispatch on
    /// this thread.
    pub fn read<R>(&self, f: impl FnOnce(&Machine) -> R) -> Option<R> {
        let guard = self.inner.lock();
        let machine = guard.try_borrow().ok()?;
        Some(f(&machine))
    }

    /// Run `f` with exclusive access, e.g. to register callbacks.
    pub fn with<R>(&self, f: impl FnOnce(&mut Machine) -> R) -> Option<R> {
        let guard = self.inner.lock();
        let mut machine = guard.try_borrow_mut().ok()?;
        Some(f(&mut machine))
    }
}

impl From<Machine> for SharedMachine {
    fn from(machine: Machine) -> Self {
        Self::new(machine)
    }
}
