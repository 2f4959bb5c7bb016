//! Firing errors.

use crate::core::StateName;
use crate::engine::callbacks::{CallbackError, Slot};
use thiserror::Error;

/// Errors returned when firing or resuming a transition.
///
/// Apart from `CallbackFailed { committed: true, .. }` and
/// `InvalidChainTarget`, which is raised after the originating firing
/// committed, none of these change the machine's state.
#[derive(Debug, Error)]
pub enum FireError {
    #[error("No such event '{event}'")]
    NoSuchEvent { event: String },

    #[error("Event '{event}' inappropriate in current state '{from}'")]
    InvalidTransition { event: String, from: StateName },

    #[error("Event '{event}' rejected because the previous transition did not complete")]
    Busy { event: String },

    #[error("No transition is pending")]
    NotPending,

    #[error("Context for '{event}' ({src} -> {dst}) does not match the pending transition")]
    StaleContext {
        event: String,
        src: StateName,
        dst: StateName,
    },

    #[error("Invalid chained transition target '{target}'")]
    InvalidChainTarget { target: StateName },

    /// A callback returned an error. When `committed` is true the state
    /// change already happened and the remaining notifications were skipped.
    #[error("Callback '{slot}' failed (committed: {committed}): {source}")]
    CallbackFailed {
        slot: Slot,
        committed: bool,
        source: CallbackError,
    },
}

impl FireError {
    /// Whether the machine's state was changed before the error.
    pub fn is_committed(&self) -> bool {
        matches!(
            self,
            Self::CallbackFailed {
                committed: true,
                ..
            } | Self::InvalidChainTarget { .. }
        )
    }
}
