//! The user's ordered list of split events

use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::{EventCatalog, GameEvent};

static SENTINEL: GameEvent = GameEvent::Empty;

/// Ordered split events: the first one starts the run, each later one splits
///
/// Never contains the sentinel event. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSequence {
    events: Vec<GameEvent>,
}

impl EventSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from persisted identifiers
    ///
    /// Identifiers that resolve to nothing are dropped with a warning.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let catalog = EventCatalog::global();
        let mut sequence = Self::new();
        for id in ids {
            let id = id.as_ref();
            match catalog.resolve(id) {
                Some(event) => sequence.events.push(event),
                None => log::warn!("Dropping unknown split event '{}'", id),
            }
        }
        sequence
    }

    /// Append an event; the sentinel is ignored
    pub fn push(&mut self, event: GameEvent) {
        if !event.is_sentinel() {
            self.events.push(event);
        }
    }

    /// Insert at `index`, clamped to the end of the list
    pub fn insert(&mut self, index: usize, event: GameEvent) {
        if event.is_sentinel() {
            return;
        }
        let index = index.min(self.events.len());
        self.events.insert(index, event);
    }

    pub fn remove(&mut self, index: usize) -> Option<GameEvent> {
        if index < self.events.len() {
            Some(self.events.remove(index))
        } else {
            None
        }
    }

    /// Swap the event at `index` with its predecessor
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.events.len() {
            return false;
        }
        self.events.swap(index - 1, index);
        true
    }

    /// Swap the event at `index` with its successor
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.events.len() {
            return false;
        }
        self.events.swap(index, index + 1);
        true
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GameEvent> {
        self.events.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    /// Identifiers in order, for persistence
    pub fn ids(&self) -> Vec<String> {
        self.events.iter().map(GameEvent::id).collect()
    }

    /// Position of the event after `index`; `None` means before the run
    pub fn next_position(index: Option<usize>) -> usize {
        index.map_or(0, |i| i + 1)
    }

    /// The event after `index`, or the sentinel past the end
    pub fn next_after(&self, index: Option<usize>) -> &GameEvent {
        self.events
            .get(Self::next_position(index))
            .unwrap_or(&SENTINEL)
    }
}

impl Extend<GameEvent> for EventSequence {
    fn extend<T: IntoIterator<Item = GameEvent>>(&mut self, iter: T) {
        for event in iter {
            self.push(event);
        }
    }
}

impl FromIterator<GameEvent> for EventSequence {
    fn from_iter<T: IntoIterator<Item = GameEvent>>(iter: T) -> Self {
        let mut sequence = Self::new();
        sequence.extend(iter);
        sequence
    }
}

/// Shared, swappable reference to the active sequence
///
/// Readers take a cheap snapshot with [`SequenceHandle::current`]; a
/// replacement published mid-tick is only seen on the next tick.
#[derive(Debug, Clone, Default)]
pub struct SequenceHandle {
    inner: Arc<RwLock<Arc<EventSequence>>>,
}

impl SequenceHandle {
    pub fn new(sequence: EventSequence) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(sequence))),
        }
    }

    pub fn current(&self) -> Arc<EventSequence> {
        Arc::clone(&self.inner.read())
    }

    pub fn replace(&self, sequence: EventSequence) {
        log::debug!("Split sequence replaced ({} events)", sequence.len());
        *self.inner.write() = Arc::new(sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EventSequence {
        EventSequence::from_ids(["loaded:base1", "loaded:base2", "end"])
    }

    #[test]
    fn test_from_ids_drops_unknown() {
        let sequence = EventSequence::from_ids([
            "loaded:base1",
            "nonexistent_event_17",
            "empty",
            "loaded_map_base3",
        ]);
        assert_eq!(sequence.ids(), vec!["loaded:base1", "loaded:base3"]);
    }

    #[test]
    fn test_sentinel_never_stored() {
        let mut sequence = EventSequence::new();
        sequence.push(GameEvent::Empty);
        sequence.insert(0, GameEvent::Empty);
        sequence.extend([GameEvent::Empty, GameEvent::end()]);
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.get(0), Some(&GameEvent::end()));
    }

    #[test]
    fn test_duplicates_allowed() {
        let sequence: EventSequence =
            [GameEvent::loaded_map("base1"), GameEvent::loaded_map("base1")]
                .into_iter()
                .collect();
        assert_eq!(sequence.len(), 2);
    }

    #[test]
    fn test_editing() {
        let mut sequence = sample();

        assert!(sequence.move_down(0));
        assert_eq!(sequence.ids(), vec!["loaded:base2", "loaded:base1", "end"]);
        assert!(sequence.move_up(2));
        assert_eq!(sequence.ids(), vec!["loaded:base2", "end", "loaded:base1"]);
        assert!(!sequence.move_up(0));
        assert!(!sequence.move_down(2));

        sequence.insert(100, GameEvent::loaded_map("base3"));
        assert_eq!(sequence.get(3), Some(&GameEvent::loaded_map("base3")));

        assert_eq!(sequence.remove(1), Some(GameEvent::end()));
        assert_eq!(sequence.remove(10), None);

        sequence.clear();
        assert!(sequence.is_empty());
    }

    #[test]
    fn test_next_after() {
        let sequence = sample();
        assert_eq!(sequence.next_after(None), &GameEvent::loaded_map("base1"));
        assert_eq!(sequence.next_after(Some(0)), &GameEvent::loaded_map("base2"));
        assert_eq!(sequence.next_after(Some(1)), &GameEvent::end());
        assert_eq!(sequence.next_after(Some(2)), &GameEvent::Empty);
        assert_eq!(EventSequence::new().next_after(None), &GameEvent::Empty);
    }

    #[test]
    fn test_handle_replace() {
        let handle = SequenceHandle::new(sample());
        let before = handle.current();

        handle.replace(EventSequence::from_ids(["end"]));
        assert_eq!(before.len(), 3);
        assert_eq!(handle.current().ids(), vec!["end"]);

        let clone = handle.clone();
        clone.replace(EventSequence::new());
        assert!(handle.current().is_empty());
    }
}
