//! Builder for constructing machines.

use crate::builder::error::BuildError;
use crate::core::StateName;
use crate::definition::{Definition, EventSpec, Initial, Sources};
use crate::engine::{CallbackRegistry, CallbackResult, EventContext, Machine, Slot};

/// Builder for constructing machines with a fluent API.
#[derive(Debug, Default)]
pub struct MachineBuilder {
    definition: Definition,
    callbacks: CallbackRegistry,
    history_limit: Option<usize>,
}

impl MachineBuilder {
    /// Create a new builder with no events and no initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing definition, e.g. one loaded from JSON.
    pub fn from_definition(definition: Definition) -> Self {
        Self {
            definition,
            callbacks: CallbackRegistry::new(),
            history_limit: None,
        }
    }

    /// Enter `state` through `startup` at construction.
    pub fn initial(mut self, state: impl Into<StateName>) -> Self {
        self.definition.initial = Some(Initial::State(state.into()));
        self
    }

    /// Enter `state` through a custom `event` at construction.
    pub fn initial_event(mut self, state: impl Into<StateName>, event: impl Into<String>) -> Self {
        self.definition.initial = Some(Initial::Detailed {
            state: state.into(),
            event: Some(event.into()),
            defer: false,
        });
        self
    }

    /// Declare `event` as the way into `state`, leaving it for the caller to fire.
    pub fn deferred_initial(mut self, state: impl Into<StateName>, event: impl Into<String>) -> Self {
        self.definition.initial = Some(Initial::Detailed {
            state: state.into(),
            event: Some(event.into()),
            defer: true,
        });
        self
    }

    /// Add an event moving any of `src` to `dst`.
    pub fn event(
        mut self,
        name: impl Into<String>,
        src: impl Into<Sources>,
        dst: impl Into<StateName>,
    ) -> Self {
        self.definition.events.push(EventSpec::new(name, src, dst));
        self
    }

    /// Add multiple event specs at once.
    pub fn events(mut self, specs: Vec<EventSpec>) -> Self {
        self.definition.events.extend(specs);
        self
    }

    /// Register a callback for `slot`.
    pub fn on<F>(mut self, slot: Slot, callback: F) -> Self
    where
        F: Fn(&mut EventContext) -> CallbackResult + Send + Sync + 'static,
    {
        self.callbacks.on(slot, callback);
        self
    }

    /// Register a callback that only observes.
    pub fn observe<F>(mut self, slot: Slot, callback: F) -> Self
    where
        F: Fn(&mut EventContext) + Send + Sync + 'static,
    {
        self.callbacks.observe(slot, callback);
        self
    }

    /// Replace all callbacks with `callbacks`.
    pub fn callbacks(mut self, callbacks: CallbackRegistry) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Retain at most `limit` committed transitions in the history.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    /// Build the machine.
    /// Returns an error if the definition is invalid or the initial
    /// transition fails.
    pub fn build(self) -> Result<Machine, BuildError> {
        let mut machine = Machine::new(self.definition, self.callbacks)?;
        if self.history_limit.is_some() {
            machine.set_history_limit(self.history_limit);
        }
        Ok(machine)
    }
}
