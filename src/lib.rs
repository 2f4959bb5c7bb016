//! Turnstile: a declarative finite state machine runtime
//!
//! Describe states, events and transitions as data, and Turnstile builds a
//! live machine that enforces legal transitions and runs lifecycle callbacks
//! around each one.
//!
//! # Core Concepts
//!
//! - **Definition**: declarative `initial` + `events`, validated up front
//! - **Machine**: owns the current state and runs the firing protocol
//! - **Callbacks**: `before`, `leave`, `enter`, `changestate` and `after` slots
//! - **Holds**: a `leave` callback may defer a transition until resumed
//! - **Chaining**: a callback may request a follow-up transition
//!
//! # Example
//!
//! ```rust
//! use turnstile::builder::MachineBuilder;
//! use turnstile::engine::{FireResult, Slot, Verdict};
//!
//! let mut fsm = MachineBuilder::new()
//!     .initial("green")
//!     .event("warn", "green", "yellow")
//!     .event("panic", "yellow", "red")
//!     .event("calm", "red", "yellow")
//!     .event("clear", "yellow", "green")
//!     .on(Slot::leave("yellow"), |ctx| {
//!         // Hold the transition out of yellow until the caller resumes it
//!         if ctx.event == "panic" {
//!             Ok(Verdict::Defer)
//!         } else {
//!             Ok(Verdict::Continue)
//!         }
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(fsm.fire("warn").unwrap(), FireResult::Committed);
//!
//! let held = fsm.fire("panic").unwrap();
//! assert!(fsm.is_state("yellow"));
//!
//! fsm.resume_transition(held.pending().unwrap()).unwrap();
//! assert!(fsm.is_state("red"));
//! ```

pub mod builder;
pub mod core;
pub mod definition;
pub mod engine;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder};
pub use crate::core::{StateHistory, StateName, StateTransition};
pub use definition::{Definition, DefinitionError, EventSpec};
pub use engine::{
    CallbackRegistry, DispatchStatus, EventContext, FireError, FireResult, Machine,
    PendingTransition, SharedMachine, Slot, Verdict,
};
