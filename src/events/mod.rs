//! Split events and the catalog of known events
//!
//! A [`GameEvent`] is a predicate over a [`Snapshot`]. The closed set of
//! variants is dispatched by a match; the [`EventCatalog`] maps stable
//! identifiers to the concrete events offered for selection.

mod maps;

pub use maps::{find_map, MapInfo, MAPS};

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::state::{GamePhase, Snapshot};

/// Identifier prefix for map load events
pub const LOADED_MAP_PREFIX: &str = "loaded:";
/// Identifier of the end-of-game event
pub const END_ID: &str = "end";
/// Identifier of the sentinel event
pub const EMPTY_ID: &str = "empty";
/// Identifier prefix used by older settings files
pub const LEGACY_LOADED_MAP_PREFIX: &str = "loaded_map_";
/// Map on which pressing the final button finishes the game
pub const FINAL_MAP: &str = "boss2";

/// A milestone the autosplitter can react to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameEvent {
    /// Entering play on a specific map
    LoadedMap { map: String },
    /// Pressing the final button on the last map
    End { final_map: String },
    /// Sentinel that never fires
    Empty,
}

impl GameEvent {
    pub fn loaded_map(map: impl Into<String>) -> Self {
        GameEvent::LoadedMap { map: map.into() }
    }

    pub fn end() -> Self {
        GameEvent::End {
            final_map: FINAL_MAP.to_string(),
        }
    }

    /// Stable identifier used for persistence
    pub fn id(&self) -> String {
        match self {
            GameEvent::LoadedMap { map } => format!("{}{}", LOADED_MAP_PREFIX, map),
            GameEvent::End { .. } => END_ID.to_string(),
            GameEvent::Empty => EMPTY_ID.to_string(),
        }
    }

    /// Human-readable description for selection lists
    pub fn description(&self) -> String {
        match self {
            GameEvent::LoadedMap { map } => match find_map(map) {
                Some(info) if info.secret => format!("Loaded '{}' (secret map)", map),
                _ => format!("Loaded '{}'", map),
            },
            GameEvent::End { final_map } => {
                format!("Pressed the final button on '{}'", final_map)
            }
            GameEvent::Empty => "No event".to_string(),
        }
    }

    /// Grouping key (the map's unit) for selection lists
    ///
    /// Carries no weight in [`GameEvent::has_occurred`].
    pub fn unit(&self) -> Option<u32> {
        match self {
            GameEvent::LoadedMap { map } => find_map(map).map(|m| m.unit),
            _ => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, GameEvent::Empty)
    }

    /// Whether the event fires for this snapshot
    pub fn has_occurred(&self, snapshot: &Snapshot) -> bool {
        match self {
            // Requiring the previous phase to be outside play keeps the event
            // from firing again on every poll spent on the same map
            GameEvent::LoadedMap { map } => {
                snapshot.prev_phase != GamePhase::InGame
                    && snapshot.in_game
                    && snapshot.curr_map == *map
            }
            GameEvent::End { final_map } => {
                snapshot.curr_map == *final_map && snapshot.final_button_pressed == Some(true)
            }
            GameEvent::Empty => false,
        }
    }

    /// Translate an identifier written by older versions
    ///
    /// Anything unrecognized becomes the sentinel.
    pub fn from_legacy_id(id: &str) -> GameEvent {
        match id.strip_prefix(LEGACY_LOADED_MAP_PREFIX) {
            Some(map) if !map.is_empty() => GameEvent::loaded_map(map),
            _ => {
                if id != EMPTY_ID {
                    log::warn!("Unknown legacy event id '{}', ignoring", id);
                }
                GameEvent::Empty
            }
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

static CATALOG: Lazy<EventCatalog> = Lazy::new(EventCatalog::build);

/// Every selectable event, keyed by identifier
///
/// Built once and read-only afterwards.
#[derive(Debug)]
pub struct EventCatalog {
    events: Vec<GameEvent>,
    index: HashMap<String, usize>,
}

impl EventCatalog {
    /// The shared catalog instance
    pub fn global() -> &'static EventCatalog {
        &CATALOG
    }

    fn build() -> Self {
        let mut events: Vec<GameEvent> = MAPS.iter().map(|m| GameEvent::loaded_map(m.name)).collect();
        events.push(GameEvent::end());

        let index = events
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id(), i))
            .collect();

        Self { events, index }
    }

    /// Look up an event by its current identifier
    pub fn get(&self, id: &str) -> Option<&GameEvent> {
        self.index.get(id).map(|&i| &self.events[i])
    }

    /// Resolve a persisted identifier, trying the legacy scheme second
    ///
    /// Returns `None` for identifiers that resolve to nothing usable.
    pub fn resolve(&self, id: &str) -> Option<GameEvent> {
        if let Some(event) = self.get(id) {
            return Some(event.clone());
        }
        // Map events outside the table (custom or mod maps) are saved too
        if let Some(map) = id.strip_prefix(LOADED_MAP_PREFIX).filter(|m| !m.is_empty()) {
            return Some(GameEvent::loaded_map(map));
        }
        if id.starts_with(LEGACY_LOADED_MAP_PREFIX) || id == EMPTY_ID {
            let event = GameEvent::from_legacy_id(id);
            if !event.is_sentinel() {
                log::debug!("Translated legacy event id '{}' to '{}'", id, event.id());
                return Some(event);
            }
        }
        None
    }

    /// All events in catalog order
    pub fn all(&self) -> &[GameEvent] {
        &self.events
    }

    /// Events filtered by grouping key; `None` means no filter
    pub fn in_unit(&self, unit: Option<u32>) -> Vec<&GameEvent> {
        match unit {
            None => self.events.iter().collect(),
            Some(unit) => self
                .events
                .iter()
                .filter(|e| e.unit() == Some(unit))
                .collect(),
        }
    }

    /// Distinct grouping keys in ascending order
    pub fn units(&self) -> Vec<u32> {
        let mut units: Vec<u32> = self.events.iter().filter_map(|e| e.unit()).collect();
        units.sort_unstable();
        units.dedup();
        units
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
