//! Declarative machine definitions.
//!
//! A [`Definition`] lists the events of a machine and how it initializes.
//! Validation uses Stillwater's `Validation` so that every problem in a
//! definition is reported at once; construction then fails on the first.
//!
//! # Example
//!
//! ```rust
//! use turnstile::definition::{Definition, InitializationPolicy};
//!
//! let definition = Definition::from_json(r#"{
//!     "initial": "green",
//!     "events": [
//!         {"name": "warn",  "src": "green",  "dst": "yellow"},
//!         {"name": "panic", "src": "yellow", "dst": "red"},
//!         {"name": "calm",  "src": "red",    "dst": "yellow"},
//!         {"name": "clear", "src": "yellow", "dst": "green"}
//!     ]
//! }"#).unwrap();
//!
//! assert!(definition.validate().is_success());
//! assert!(matches!(definition.policy(), InitializationPolicy::NamedInitial { .. }));
//! ```

mod error;
mod table;

pub use error::DefinitionError;
pub use table::{EventOperation, TransitionTable};

use crate::core::StateName;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Event synthesized for a named initial state when no custom name is given.
pub const STARTUP_EVENT: &str = "startup";

/// Source states of an event spec: a single state or a list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sources {
    One(StateName),
    Many(Vec<StateName>),
}

impl Sources {
    pub fn as_slice(&self) -> &[StateName] {
        match self {
            Self::One(state) => std::slice::from_ref(state),
            Self::Many(states) => states,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StateName> {
        self.as_slice().iter()
    }

    pub fn contains(&self, state: &str) -> bool {
        self.iter().any(|s| s == state)
    }
}

impl From<&str> for Sources {
    fn from(state: &str) -> Self {
        Self::One(StateName::from(state))
    }
}

impl From<StateName> for Sources {
    fn from(state: StateName) -> Self {
        Self::One(state)
    }
}

impl From<Vec<&str>> for Sources {
    fn from(states: Vec<&str>) -> Self {
        Self::Many(states.into_iter().map(StateName::from).collect())
    }
}

impl From<Vec<StateName>> for Sources {
    fn from(states: Vec<StateName>) -> Self {
        Self::Many(states)
    }
}

/// `{name, src, dst}`: event `name` moves any of `src` to `dst`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    pub name: String,
    pub src: Sources,
    pub dst: StateName,
}

impl EventSpec {
    pub fn new(name: impl Into<String>, src: impl Into<Sources>, dst: impl Into<StateName>) -> Self {
        Self {
            name: name.into(),
            src: src.into(),
            dst: dst.into(),
        }
    }
}

/// The `initial` entry of a definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Initial {
    /// Bare state name; fires `startup` at construction.
    State(StateName),
    /// `{state, event, defer}`
    Detailed {
        state: StateName,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event: Option<String>,
        #[serde(default)]
        defer: bool,
    },
}

impl Initial {
    pub fn state(&self) -> &StateName {
        match self {
            Self::State(state) | Self::Detailed { state, .. } => state,
        }
    }
}

impl From<&str> for Initial {
    fn from(state: &str) -> Self {
        Self::State(StateName::from(state))
    }
}

/// How a machine leaves `none` after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitializationPolicy {
    /// No `initial`: the machine starts in `none`.
    ImplicitNone,
    /// Bare initial state, reached through `startup` at construction.
    NamedInitial { state: StateName },
    /// Initial state reached through a custom event at construction.
    CustomEvent { state: StateName, event: String },
    /// Initial event is synthesized but left for the caller to fire.
    Deferred { state: StateName, event: String },
}

impl InitializationPolicy {
    /// The synthesized `(event, state)` pair, if any.
    pub fn initial_event(&self) -> Option<(&str, &StateName)> {
        match self {
            Self::ImplicitNone => None,
            Self::NamedInitial { state } => Some((STARTUP_EVENT, state)),
            Self::CustomEvent { state, event } | Self::Deferred { state, event } => {
                Some((event.as_str(), state))
            }
        }
    }

    pub fn fires_at_construction(&self) -> bool {
        matches!(self, Self::NamedInitial { .. } | Self::CustomEvent { .. })
    }
}

/// Declarative description of a machine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<Initial>,
    #[serde(default)]
    pub events: Vec<EventSpec>,
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON form `{"initial": ..., "events": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(json).map_err(|e| DefinitionError::Malformed(e.to_string()))
    }

    pub fn policy(&self) -> InitializationPolicy {
        match &self.initial {
            None => InitializationPolicy::ImplicitNone,
            Some(Initial::State(state)) => InitializationPolicy::NamedInitial {
                state: state.clone(),
            },
            Some(Initial::Detailed {
                state,
                event,
                defer,
            }) => {
                let state = state.clone();
                match (event, *defer) {
                    (event, true) => InitializationPolicy::Deferred {
                        state,
                        event: event.clone().unwrap_or_else(|| STARTUP_EVENT.to_string()),
                    },
                    (Some(event), false) => InitializationPolicy::CustomEvent {
                        state,
                        event: event.clone(),
                    },
                    (None, false) => InitializationPolicy::NamedInitial { state },
                }
            }
        }
    }

    /// A declared `{event, none -> state}` spec counts as deliberate reuse
    /// of the initial event name.
    fn declares_initial_event(&self, event: &str, state: &StateName) -> bool {
        self.events
            .iter()
            .any(|spec| spec.name == event && spec.dst == *state && spec.src.contains(StateName::NONE))
    }

    /// The synthesized initial event spec, unless the events already declare it.
    fn synthesized_spec(&self) -> Option<EventSpec> {
        let policy = self.policy();
        let (event, state) = policy.initial_event()?;
        if self.declares_initial_event(event, state) {
            return None;
        }
        Some(EventSpec::new(event, StateName::none(), state.clone()))
    }

    /// All event specs the machine is built from, synthesized initial first.
    pub fn resolved_specs(&self) -> Vec<EventSpec> {
        self.synthesized_spec()
            .into_iter()
            .chain(self.events.iter().cloned())
            .collect()
    }

    /// Validate the definition, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<DefinitionError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<DefinitionError>>> = Vec::new();

        if let Some(initial) = &self.initial {
            checks.push(check_state(initial.state(), "initial state"));
        }
        if let Some((event, _)) = self.policy().initial_event() {
            checks.push(check_identifier(event, "initial event"));
        }

        for spec in &self.events {
            checks.push(check_identifier(&spec.name, "event name"));
            checks.push(check_state(&spec.dst, "destination"));
            for source in spec.src.iter() {
                checks.push(check_identifier(source.as_str(), "source"));
            }
        }

        let synthesized = self.synthesized_spec();
        if let Some(spec) = &synthesized {
            if self.events.iter().any(|declared| declared.name == spec.name) {
                checks.push(Validation::fail(DefinitionError::NameCollision {
                    event: spec.name.clone(),
                }));
            }
        }

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for spec in synthesized.iter().chain(self.events.iter()) {
            for source in spec.src.iter() {
                if !seen.insert((spec.name.as_str(), source.as_str())) {
                    checks.push(Validation::fail(DefinitionError::AmbiguousTransition {
                        event: spec.name.clone(),
                        source_state: source.to_string(),
                    }));
                }
            }
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Validate and return the first violation, if any.
    pub fn check(&self) -> Result<(), DefinitionError> {
        match self.validate() {
            Validation::Success(_) => Ok(()),
            Validation::Failure(errors) => match errors.iter().next() {
                Some(first) => Err(first.clone()),
                None => Ok(()),
            },
        }
    }

    /// Flattened table of the resolved specs.
    pub fn table(&self) -> TransitionTable {
        TransitionTable::from_specs(&self.resolved_specs())
    }
}

fn check_identifier(value: &str, role: &'static str) -> Validation<(), NonEmptyVec<DefinitionError>> {
    if StateName::is_valid_identifier(value) {
        Validation::success(())
    } else {
        Validation::fail(DefinitionError::InvalidIdentifier {
            role,
            value: value.to_string(),
        })
    }
}

/// States that can be entered: valid identifiers other than `none`.
fn check_state(state: &StateName, role: &'static str) -> Validation<(), NonEmptyVec<DefinitionError>> {
    if state.is_none() {
        Validation::fail(DefinitionError::InvalidIdentifier {
            role,
            value: state.to_string(),
        })
    } else {
        check_identifier(state.as_str(), role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traffic_events() -> Vec<EventSpec> {
        vec![
            EventSpec::new("warn", "green", "yellow"),
            EventSpec::new("panic", "yellow", "red"),
            EventSpec::new("calm", "red", "yellow"),
            EventSpec::new("clear", "yellow", "green"),
        ]
    }

    fn failures(definition: &Definition) -> Vec<DefinitionError> {
        match definition.validate() {
            Validation::Success(_) => Vec::new(),
            Validation::Failure(errors) => errors.iter().cloned().collect(),
        }
    }

    #[test]
    fn policy_follows_initial_shape() {
        let mut definition = Definition::new();
        assert_eq!(definition.policy(), InitializationPolicy::ImplicitNone);

        definition.initial = Some(Initial::from("green"));
        assert_eq!(
            definition.policy(),
            InitializationPolicy::NamedInitial {
                state: StateName::from("green")
            }
        );

        definition.initial = Some(Initial::Detailed {
            state: StateName::from("green"),
            event: Some("init".to_string()),
            defer: false,
        });
        assert_eq!(
            definition.policy(),
            InitializationPolicy::CustomEvent {
                state: StateName::from("green"),
                event: "init".to_string()
            }
        );

        definition.initial = Some(Initial::Detailed {
            state: StateName::from("green"),
            event: Some("init".to_string()),
            defer: true,
        });
        assert!(!definition.policy().fires_at_construction());
        assert_eq!(definition.policy().initial_event().unwrap().0, "init");
    }

    #[test]
    fn deferred_without_event_uses_startup() {
        let definition = Definition::from_json(
            r#"{"initial": {"state": "green", "defer": true}, "events": []}"#,
        )
        .unwrap();

        assert_eq!(
            definition.policy(),
            InitializationPolicy::Deferred {
                state: StateName::from("green"),
                event: STARTUP_EVENT.to_string()
            }
        );
    }

    #[test]
    fn parses_source_lists() {
        let definition = Definition::from_json(
            r#"{"events": [{"name": "rest", "src": ["hungry", "full"], "dst": "hungry"}]}"#,
        )
        .unwrap();

        assert_eq!(definition.events[0].src.as_slice().len(), 2);
        assert!(definition.initial.is_none());
    }

    #[test]
    fn malformed_json_is_reported() {
        let result = Definition::from_json(r#"{"events": [{"name": "warn"}]}"#);
        assert!(matches!(result, Err(DefinitionError::Malformed(_))));
    }

    #[test]
    fn valid_definition_passes() {
        let definition = Definition {
            initial: Some(Initial::from("green")),
            events: traffic_events(),
        };

        assert!(definition.validate().is_success());
        assert!(definition.check().is_ok());
    }

    #[test]
    fn duplicate_event_source_is_ambiguous() {
        let definition = Definition {
            initial: None,
            events: vec![
                EventSpec::new("eat", "hungry", "satisfied"),
                EventSpec::new("eat", vec!["full", "hungry"], "sick"),
            ],
        };

        assert_eq!(
            definition.check(),
            Err(DefinitionError::AmbiguousTransition {
                event: "eat".to_string(),
                source_state: "hungry".to_string()
            })
        );
    }

    #[test]
    fn invalid_identifiers_are_rejected() {
        let definition = Definition {
            initial: Some(Initial::from("")),
            events: vec![
                EventSpec::new("go now", "a", "b"),
                EventSpec::new("reset", "a", "none"),
            ],
        };

        let errors = failures(&definition);
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .all(|e| matches!(e, DefinitionError::InvalidIdentifier { .. })));
    }

    #[test]
    fn initial_event_colliding_with_declared_event() {
        let definition = Definition {
            initial: Some(Initial::Detailed {
                state: StateName::from("green"),
                event: Some("panic".to_string()),
                defer: false,
            }),
            events: traffic_events(),
        };

        assert_eq!(
            definition.check(),
            Err(DefinitionError::NameCollision {
                event: "panic".to_string()
            })
        );
    }

    #[test]
    fn intentional_reuse_of_initial_event_is_allowed() {
        let mut events = traffic_events();
        events.push(EventSpec::new("startup", "none", "green"));
        let definition = Definition {
            initial: Some(Initial::from("green")),
            events,
        };

        assert!(definition.check().is_ok());
        let startups = definition
            .resolved_specs()
            .into_iter()
            .filter(|spec| spec.name == STARTUP_EVENT)
            .count();
        assert_eq!(startups, 1);
    }

    #[test]
    fn validation_accumulates_all_violations() {
        let definition = Definition {
            initial: Some(Initial::Detailed {
                state: StateName::from("green"),
                event: Some("warn".to_string()),
                defer: false,
            }),
            events: vec![
                EventSpec::new("warn", "green", "yellow"),
                EventSpec::new("warn", "green", "red"),
                EventSpec::new("", "red", "green"),
            ],
        };

        let errors = failures(&definition);
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| matches!(e, DefinitionError::NameCollision { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, DefinitionError::AmbiguousTransition { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, DefinitionError::InvalidIdentifier { .. })));
    }

    #[test]
    fn table_includes_synthesized_startup() {
        let definition = Definition {
            initial: Some(Initial::from("green")),
            events: traffic_events(),
        };

        let table = definition.table();
        assert_eq!(table.lookup(STARTUP_EVENT, "none").unwrap(), "green");
        assert_eq!(table.operations().count(), 5);
    }
}
