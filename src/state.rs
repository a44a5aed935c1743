// src/state.rs
//! Client state store: in-flight gate, last error, last output

use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::{Operation, TailorError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InFlight {
    pub single: bool,
    pub batch: bool,
}

impl InFlight {
    fn flag(&mut self, operation: Operation) -> &mut bool {
        match operation {
            Operation::Single => &mut self.single,
            Operation::Batch => &mut self.batch,
        }
    }
}

/// Point-in-time copy of the store for presentation code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    pub in_flight: InFlight,
    pub last_error: Option<String>,
    pub last_output: Option<String>,
    pub last_plan: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
pub struct ClientStateStore {
    inner: Mutex<StateSnapshot>,
}

impl ClientStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StateSnapshot> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.lock().clone()
    }

    pub fn is_in_flight(&self, operation: Operation) -> bool {
        *self.lock().in_flight.flag(operation)
    }

    /// Enter the gate for `operation`.
    ///
    /// Starting clears the last error; starting a single operation also clears
    /// the last output so a stale result never sits next to a fresh error.
    /// A rejected start leaves the store untouched.
    pub fn begin(&self, operation: Operation) -> Result<InFlightGuard<'_>, TailorError> {
        self.enter(operation, operation == Operation::Single)
    }

    /// Enter the gate without touching the last output (plan, extraction, export)
    pub fn begin_preserving_output(
        &self,
        operation: Operation,
    ) -> Result<InFlightGuard<'_>, TailorError> {
        self.enter(operation, false)
    }

    fn enter(
        &self,
        operation: Operation,
        clear_output: bool,
    ) -> Result<InFlightGuard<'_>, TailorError> {
        let mut state = self.lock();
        let flag = state.in_flight.flag(operation);
        if *flag {
            return Err(TailorError::InFlight(operation));
        }
        *flag = true;
        state.last_error = None;
        if clear_output {
            state.last_output = None;
        }
        debug!("{} started", operation);

        Ok(InFlightGuard {
            store: self,
            operation,
        })
    }

    /// Surface an error raised outside any gate, e.g. a failed precondition
    pub fn record_error(&self, message: impl Into<String>) {
        self.lock().last_error = Some(message.into());
    }
}

/// Held while an operation is in flight. Dropping it always releases the gate.
#[must_use = "dropping the guard ends the operation immediately"]
pub struct InFlightGuard<'a> {
    store: &'a ClientStateStore,
    operation: Operation,
}

impl InFlightGuard<'_> {
    pub fn succeed(self) {
        self.store.lock().last_error = None;
    }

    /// Replace the tailored output entirely
    pub fn succeed_with_output(self, output: String) {
        let mut state = self.store.lock();
        state.last_output = Some(output);
        state.last_error = None;
    }

    pub fn succeed_with_plan(self, plan: serde_json::Value) {
        let mut state = self.store.lock();
        state.last_plan = Some(plan);
        state.last_error = None;
    }

    /// Record the failure; the last output is left as it is
    pub fn fail(self, message: impl Into<String>) {
        self.store.lock().last_error = Some(message.into());
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.store.lock();
        *state.in_flight.flag(self.operation) = false;
        debug!("{} finished", self.operation);
    }
}
