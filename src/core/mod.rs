//! Core value types shared by the definition model and the engine:
//! - State names via the `StateName` token
//! - Immutable history of committed transitions

mod history;
mod state;

pub use history::{StateHistory, StateTransition};
pub use state::StateName;
