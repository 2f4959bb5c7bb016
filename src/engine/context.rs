//! Per-firing event context.

use crate::core::StateName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Caller-supplied data carried by a firing.
pub type Extras = serde_json::Map<String, Value>;

/// Event name used in the context of a chained transition.
pub const CHAINED_EVENT: &str = "<chain>";

/// Convert arbitrary JSON into extras: objects are used as-is, `null`
/// yields no extras, and any other value is stored under `"value"`.
pub fn into_extras(value: Value) -> Extras {
    match value {
        Value::Object(map) => map,
        Value::Null => Extras::new(),
        other => {
            let mut extras = Extras::new();
            extras.insert("value".to_string(), other);
            extras
        }
    }
}

/// Identity of a machine instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineId(Uuid);

impl MachineId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The record shared by every callback of one firing.
///
/// One instance is created per firing and the same instance is handed to
/// `before`, `leave`, `enter`, `changestate` and `after`. Anything a callback
/// writes into `extras` is visible to the callbacks that run after it,
/// including those that run when a held transition is resumed.
#[derive(Clone, Debug)]
pub struct EventContext {
    /// Identity of this firing
    pub id: Uuid,
    /// Machine that is firing
    pub machine: MachineId,
    /// Event name, or [`CHAINED_EVENT`] for a chained transition
    pub event: String,
    /// Source state
    pub src: StateName,
    /// Destination state
    pub dst: StateName,
    /// Caller-supplied data
    pub extras: Extras,
    /// When the firing started
    pub fired_at: DateTime<Utc>,
    next: Option<StateName>,
}

impl EventContext {
    pub(crate) fn new(
        machine: MachineId,
        event: impl Into<String>,
        src: StateName,
        dst: StateName,
        extras: Extras,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            machine,
            event: event.into(),
            src,
            dst,
            extras,
            fired_at: Utc::now(),
            next: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    /// Store a value for callbacks that run later in this firing.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extras.insert(key.into(), value.into());
    }

    /// Request a transition to `target` once this firing completes.
    ///
    /// Only one request is kept per firing; a later call replaces an earlier
    /// one. The chained transition bypasses the transition table and runs
    /// only the `enter`, `changestate` and `after` stages. A request made
    /// before a `leave` hold is kept with the held firing and runs after
    /// `resume_transition`. It is discarded if the `before` callback
    /// cancels, if the firing is abandoned, or if the machine is already in
    /// `target` when the chain would run.
    pub fn transition_to(&mut self, target: impl Into<StateName>) {
        self.next = Some(target.into());
    }

    pub fn requested_transition(&self) -> Option<&StateName> {
        self.next.as_ref()
    }

    pub(crate) fn take_requested_transition(&mut self) -> Option<StateName> {
        self.next.take()
    }

    pub fn is_chained(&self) -> bool {
        self.event == CHAINED_EVENT
    }

    /// Ticket identifying this firing for a later resume.
    pub fn ticket(&self) -> PendingTransition {
        PendingTransition {
            id: self.id,
            machine: self.machine,
            event: self.event.clone(),
            src: self.src.clone(),
            dst: self.dst.clone(),
        }
    }
}

/// Handle to a firing held by a `leave` callback.
///
/// Hand it back to `resume_transition` to complete the transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransition {
    pub id: Uuid,
    pub machine: MachineId,
    pub event: String,
    pub src: StateName,
    pub dst: StateName,
}

impl PendingTransition {
    /// Check that this ticket was issued for `context`.
    pub fn matches(&self, context: &EventContext) -> bool {
        self.id == context.id
            && self.machine == context.machine
            && self.event == context.event
            && self.src == context.src
            && self.dst == context.dst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> EventContext {
        EventContext::new(
            MachineId::new(),
            "warn",
            StateName::from("green"),
            StateName::from("yellow"),
            Extras::new(),
        )
    }

    #[test]
    fn extras_conversion() {
        let extras = into_extras(json!({"msg": "killer bees"}));
        assert_eq!(extras.get("msg"), Some(&json!("killer bees")));

        assert!(into_extras(Value::Null).is_empty());
        assert_eq!(into_extras(json!(42)).get("value"), Some(&json!(42)));
    }

    #[test]
    fn set_and_get_extras() {
        let mut ctx = context();
        ctx.set("download", "started");
        assert_eq!(ctx.get("download"), Some(&json!("started")));
        assert!(ctx.get("missing").is_none());
    }

    #[test]
    fn last_transition_request_wins() {
        let mut ctx = context();
        assert!(ctx.requested_transition().is_none());

        ctx.transition_to("red");
        ctx.transition_to("green");
        assert_eq!(ctx.requested_transition().unwrap(), "green");

        assert_eq!(ctx.take_requested_transition().unwrap(), "green");
        assert!(ctx.requested_transition().is_none());
    }

    #[test]
    fn ticket_matches_only_its_context() {
        let ctx = context();
        let ticket = ctx.ticket();
        assert!(ticket.matches(&ctx));

        let other = context();
        assert!(!ticket.matches(&other));

        let mut forged = ticket.clone();
        forged.dst = StateName::from("red");
        assert!(!forged.matches(&ctx));
    }

    #[test]
    fn ticket_serializes() {
        let ticket = context().ticket();
        let json = serde_json::to_string(&ticket).unwrap();
        let deserialized: PendingTransition = serde_json::from_str(&json).unwrap();
        assert_eq!(ticket, deserialized);
    }
}
