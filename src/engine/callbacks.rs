//! Callback slots and the registry consulted at dispatch time.

use crate::core::StateName;
use crate::engine::context::EventContext;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Outcome a callback reports for its stage.
///
/// `Cancel` is honoured only from `before:<event>` and `Defer` only from
/// `leave:<state>`; any other stage treats them as `Continue`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Verdict {
    /// Proceed with the firing
    #[default]
    Continue,

    /// Abort the firing before it starts
    Cancel,

    /// Hold the firing until the caller resumes it
    Defer,
}

/// Error raised by user callback code.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

pub type CallbackResult = Result<Verdict, CallbackError>;

/// A registered callback. Receives the firing's shared context.
pub type Callback = Arc<dyn Fn(&mut EventContext) -> CallbackResult + Send + Sync>;

/// Named callback extension point.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// `before:<event>`
    Before(String),
    /// `leave:<state>`
    Leave(StateName),
    /// `enter:<state>`
    Enter(StateName),
    /// `after:<event>`
    After(String),
    /// `changestate`, called for every committed transition
    ChangeState,
    /// Bare `<name>`: shorthand for `enter:<name>` and `after:<name>`
    Named(String),
}

impl Slot {
    pub fn before(event: impl Into<String>) -> Self {
        Self::Before(event.into())
    }

    pub fn leave(state: impl Into<StateName>) -> Self {
        Self::Leave(state.into())
    }

    pub fn enter(state: impl Into<StateName>) -> Self {
        Self::Enter(state.into())
    }

    pub fn after(event: impl Into<String>) -> Self {
        Self::After(event.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before(event) => write!(f, "before:{event}"),
            Self::Leave(state) => write!(f, "leave:{state}"),
            Self::Enter(state) => write!(f, "enter:{state}"),
            Self::After(event) => write!(f, "after:{event}"),
            Self::ChangeState => f.write_str("changestate"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SlotParseError {
    #[error("Unknown slot kind '{0}'")]
    UnknownKind(String),

    #[error("Slot '{0}' has an empty name")]
    EmptyName(String),
}

impl FromStr for Slot {
    type Err = SlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((kind, name)) = s.split_once(':') else {
            return match s {
                "" => Err(SlotParseError::EmptyName(s.to_string())),
                "changestate" => Ok(Self::ChangeState),
                _ => Ok(Self::Named(s.to_string())),
            };
        };

        if name.is_empty() {
            return Err(SlotParseError::EmptyName(s.to_string()));
        }

        match kind {
            "before" => Ok(Self::before(name)),
            "leave" => Ok(Self::leave(name)),
            "enter" => Ok(Self::enter(name)),
            "after" => Ok(Self::after(name)),
            _ => Err(SlotParseError::UnknownKind(kind.to_string())),
        }
    }
}

/// Mapping from slot to callback. Entries may be added or removed at any
/// time; a missing entry is simply skipped.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    slots: HashMap<Slot, Callback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, returning the one it replaces.
    pub fn on<F>(&mut self, slot: Slot, callback: F) -> Option<Callback>
    where
        F: Fn(&mut EventContext) -> CallbackResult + Send + Sync + 'static,
    {
        self.slots.insert(slot, Arc::new(callback))
    }

    /// Register a callback that never affects the firing.
    pub fn observe<F>(&mut self, slot: Slot, callback: F) -> Option<Callback>
    where
        F: Fn(&mut EventContext) + Send + Sync + 'static,
    {
        self.on(slot, move |ctx| {
            callback(ctx);
            Ok(Verdict::Continue)
        })
    }

    /// Builder-style [`on`](Self::on).
    pub fn with<F>(mut self, slot: Slot, callback: F) -> Self
    where
        F: Fn(&mut EventContext) -> CallbackResult + Send + Sync + 'static,
    {
        self.on(slot, callback);
        self
    }

    pub fn insert(&mut self, slot: Slot, callback: Callback) -> Option<Callback> {
        self.slots.insert(slot, callback)
    }

    pub fn remove(&mut self, slot: &Slot) -> Option<Callback> {
        self.slots.remove(slot)
    }

    pub fn get(&self, slot: &Slot) -> Option<&Callback> {
        self.slots.get(slot)
    }

    pub fn contains(&self, slot: &Slot) -> bool {
        self.slots.contains_key(slot)
    }

    /// First registered callback among `primary` and its alias.
    pub(crate) fn resolve(&self, primary: Slot, alias: Option<Slot>) -> Option<(Slot, Callback)> {
        if let Some(callback) = self.slots.get(&primary) {
            return Some((primary, Arc::clone(callback)));
        }
        let alias = alias?;
        let callback = Arc::clone(self.slots.get(&alias)?);
        Some((alias, callback))
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.keys()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut slots: Vec<String> = self.slots.keys().map(Slot::to_string).collect();
        slots.sort();
        f.debug_struct("CallbackRegistry")
            .field("slots", &slots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slot_names() {
        assert_eq!("before:warn".parse::<Slot>().unwrap(), Slot::before("warn"));
        assert_eq!("leave:green".parse::<Slot>().unwrap(), Slot::leave("green"));
        assert_eq!("enter:red".parse::<Slot>().unwrap(), Slot::enter("red"));
        assert_eq!("after:panic".parse::<Slot>().unwrap(), Slot::after("panic"));
        assert_eq!("changestate".parse::<Slot>().unwrap(), Slot::ChangeState);
        assert_eq!("yellow".parse::<Slot>().unwrap(), Slot::named("yellow"));
    }

    #[test]
    fn rejects_malformed_slots() {
        assert_eq!(
            "during:warn".parse::<Slot>(),
            Err(SlotParseError::UnknownKind("during".to_string()))
        );
        assert!(matches!(
            "enter:".parse::<Slot>(),
            Err(SlotParseError::EmptyName(_))
        ));
        assert!(matches!("".parse::<Slot>(), Err(SlotParseError::EmptyName(_))));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for name in ["before:warn", "leave:green", "enter:red", "after:calm", "changestate", "red"] {
            let slot: Slot = name.parse().unwrap();
            assert_eq!(slot.to_string(), name);
        }
    }

    #[test]
    fn registry_add_and_remove() {
        let mut registry = CallbackRegistry::new();
        assert!(registry.is_empty());

        registry.observe(Slot::enter("green"), |_| {});
        registry.on(Slot::before("warn"), |_| Ok(Verdict::Cancel));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&Slot::enter("green")));

        assert!(registry.remove(&Slot::enter("green")).is_some());
        assert!(!registry.contains(&Slot::enter("green")));
        assert!(registry.remove(&Slot::enter("green")).is_none());
    }

    #[test]
    fn registering_twice_replaces() {
        let mut registry = CallbackRegistry::new();
        assert!(registry.observe(Slot::ChangeState, |_| {}).is_none());
        assert!(registry.observe(Slot::ChangeState, |_| {}).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn resolve_prefers_primary_over_alias() {
        let registry = CallbackRegistry::new()
            .with(Slot::enter("red"), |_| Ok(Verdict::Continue))
            .with(Slot::named("red"), |_| Ok(Verdict::Continue));

        let (slot, _) = registry
            .resolve(Slot::enter("red"), Some(Slot::named("red")))
            .unwrap();
        assert_eq!(slot, Slot::enter("red"));

        let registry = CallbackRegistry::new().with(Slot::named("red"), |_| Ok(Verdict::Continue));
        let (slot, _) = registry
            .resolve(Slot::enter("red"), Some(Slot::named("red")))
            .unwrap();
        assert_eq!(slot, Slot::named("red"));

        assert!(registry.resolve(Slot::before("red"), None).is_none());
    }

    #[test]
    fn debug_lists_slot_names() {
        let registry = CallbackRegistry::new().with(Slot::ChangeState, |_| Ok(Verdict::Continue));
        assert!(format!("{registry:?}").contains("changestate"));
    }
}
