//! Flattened transition table.

use crate::core::StateName;
use crate::definition::EventSpec;
use std::collections::BTreeMap;

/// One generated event operation.
///
/// An operation may lead to different destinations depending on the state
/// it is fired from.
#[derive(Clone, Debug, PartialEq)]
pub struct EventOperation {
    name: String,
    routes: BTreeMap<StateName, StateName>,
}

impl EventOperation {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Destination reached when firing from `source`, if any.
    pub fn destination(&self, source: &str) -> Option<&StateName> {
        self.routes.get(source)
    }

    /// All `(source, destination)` pairs, ordered by source.
    pub fn routes(&self) -> impl Iterator<Item = (&StateName, &StateName)> {
        self.routes.iter()
    }

    pub fn sources(&self) -> impl Iterator<Item = &StateName> {
        self.routes.keys()
    }
}

/// Mapping from `(event, source)` to destination.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionTable {
    operations: BTreeMap<String, EventOperation>,
}

impl TransitionTable {
    /// Flatten event specs into a table. Later pairs overwrite earlier
    /// ones, so specs must be validated first.
    pub fn from_specs<'a>(specs: impl IntoIterator<Item = &'a EventSpec>) -> Self {
        let mut table = Self::default();
        for spec in specs {
            for source in spec.src.iter() {
                table.insert(&spec.name, source.clone(), spec.dst.clone());
            }
        }
        table
    }

    fn insert(&mut self, event: &str, source: StateName, destination: StateName) {
        self.operations
            .entry(event.to_string())
            .or_insert_with(|| EventOperation {
                name: event.to_string(),
                routes: BTreeMap::new(),
            })
            .routes
            .insert(source, destination);
    }

    pub fn contains_event(&self, event: &str) -> bool {
        self.operations.contains_key(event)
    }

    /// Destination for `(event, source)`.
    pub fn lookup(&self, event: &str, source: &str) -> Option<&StateName> {
        self.operations.get(event)?.destination(source)
    }

    pub fn operation(&self, event: &str) -> Option<&EventOperation> {
        self.operations.get(event)
    }

    /// Generated operations, one per distinct event name.
    pub fn operations(&self) -> impl Iterator<Item = &EventOperation> {
        self.operations.values()
    }

    /// Every state mentioned as a source or destination.
    pub fn states(&self) -> Vec<&StateName> {
        let mut states: Vec<&StateName> = self
            .operations
            .values()
            .flat_map(|op| op.routes.iter().flat_map(|(src, dst)| [src, dst]))
            .collect();
        states.sort();
        states.dedup();
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Sources;

    fn spec(name: &str, src: Sources, dst: &str) -> EventSpec {
        EventSpec {
            name: name.to_string(),
            src,
            dst: StateName::from(dst),
        }
    }

    #[test]
    fn flattens_source_lists() {
        let specs = vec![
            spec("eat", Sources::from("hungry"), "satisfied"),
            spec("eat", Sources::from("satisfied"), "full"),
            spec(
                "rest",
                Sources::from(vec!["hungry", "satisfied", "full"]),
                "hungry",
            ),
        ];
        let table = TransitionTable::from_specs(&specs);

        assert_eq!(table.lookup("eat", "hungry").unwrap(), "satisfied");
        assert_eq!(table.lookup("eat", "satisfied").unwrap(), "full");
        assert!(table.lookup("eat", "full").is_none());
        assert_eq!(table.lookup("rest", "full").unwrap(), "hungry");
        assert_eq!(table.operations().count(), 2);
        assert_eq!(table.operation("rest").unwrap().sources().count(), 3);
    }

    #[test]
    fn unknown_event_is_absent() {
        let table = TransitionTable::from_specs(&[spec("warn", Sources::from("green"), "yellow")]);

        assert!(table.contains_event("warn"));
        assert!(!table.contains_event("panic"));
        assert!(table.lookup("panic", "green").is_none());
    }

    #[test]
    fn states_are_deduplicated() {
        let specs = vec![
            spec("warn", Sources::from("green"), "yellow"),
            spec("clear", Sources::from("yellow"), "green"),
        ];
        let table = TransitionTable::from_specs(&specs);

        let states: Vec<&str> = table.states().into_iter().map(|s| s.as_str()).collect();
        assert_eq!(states, vec!["green", "yellow"]);
    }
}
