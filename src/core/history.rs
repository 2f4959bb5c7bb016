//! Committed transition history.
//!
//! Every transition a machine commits is appended here, including the
//! construction-time startup event and chained transitions.

use super::state::StateName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single committed transition.
///
/// # Example
///
/// ```rust
/// use turnstile::core::{StateName, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     event: "warn".to_string(),
///     from: StateName::from("green"),
///     to: StateName::from("yellow"),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.to, "yellow");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Event that caused the transition
    pub event: String,
    /// The state being transitioned from
    pub from: StateName,
    /// The state being transitioned to
    pub to: StateName,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of committed transitions.
///
/// `push` appends in place. `record` returns a new history with the
/// transition added and leaves `self` untouched. With a limit set, only the
/// most recent transitions are retained.
///
/// # Example
///
/// ```rust
/// use turnstile::core::{StateHistory, StateName, StateTransition};
/// use chrono::Utc;
///
/// let history = StateHistory::new()
///     .record(StateTransition {
///         event: "warn".to_string(),
///         from: StateName::from("green"),
///         to: StateName::from("yellow"),
///         timestamp: Utc::now(),
///     })
///     .record(StateTransition {
///         event: "panic".to_string(),
///         from: StateName::from("yellow"),
///         to: StateName::from("red"),
///         timestamp: Utc::now(),
///     });
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 3); // green -> yellow -> red
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: Vec<StateTransition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
}

impl StateHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
            limit: None,
        }
    }

    /// Create an empty history that keeps at most `limit` transitions.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Append a transition, dropping the oldest ones beyond the limit.
    pub fn push(&mut self, transition: StateTransition) {
        self.transitions.push(transition);
        self.trim();
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut history = self.clone();
        history.push(transition);
        history
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Change the retention limit, trimming immediately if needed.
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
        self.trim();
    }

    fn trim(&mut self) {
        if let Some(limit) = self.limit {
            let excess = self.transitions.len().saturating_sub(limit);
            if excess > 0 {
                self.transitions.drain(..excess);
            }
        }
    }

    /// Get the path of states traversed.
    ///
    /// Returns the source of the first retained transition, then the `to`
    /// state of each transition.
    pub fn get_path(&self) -> Vec<&StateName> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Names of the events that produced each transition, in order.
    pub fn events(&self) -> Vec<&str> {
        self.transitions.iter().map(|t| t.event.as_str()).collect()
    }

    /// Time between the first and last recorded transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all transitions.
    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
