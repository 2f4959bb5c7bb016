//! Transition engine.
//!
//! Owns the current state and runs the firing protocol around each event:
//!
//! 1. `before:<event>` may cancel
//! 2. `leave:<state>` may hold the transition until the caller resumes it
//! 3. the new state is committed
//! 4. `enter:<state>`, `changestate` and `after:<event>` are notified
//! 5. a chained transition requested by any callback runs last
//!
//! Every callback of one firing receives the same [`EventContext`].

mod callbacks;
mod context;
mod error;
mod machine;
mod shared;

pub use callbacks::{
    Callback, CallbackError, CallbackRegistry, CallbackResult, Slot, SlotParseError, Verdict,
};
pub use context::{into_extras, EventContext, Extras, MachineId, PendingTransition, CHAINED_EVENT};
pub use error::FireError;
pub use machine::{DispatchStatus, FireResult, Machine};
pub use shared::SharedMachine;
