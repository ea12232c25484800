//! Polling state tracker
//!
//! Turns raw memory cells into a [`Snapshot`] of the game. A read that fails
//! leaves the corresponding field at its previous value, so a momentarily
//! unreadable process produces stale data rather than garbage.

use std::time::Duration;

use crate::layout::MemoryLayout;
use crate::memory::MemoryReader;

/// Raw coarse game state code
///
/// Only two codes carry meaning; every other value is kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    MainMenu,
    InGame,
    Other(i32),
}

impl GamePhase {
    pub const MAIN_MENU_CODE: i32 = 1;
    pub const IN_GAME_CODE: i32 = 7;

    /// The raw code as read from memory
    pub fn code(&self) -> i32 {
        match self {
            GamePhase::MainMenu => Self::MAIN_MENU_CODE,
            GamePhase::InGame => Self::IN_GAME_CODE,
            GamePhase::Other(code) => *code,
        }
    }
}

impl From<i32> for GamePhase {
    fn from(code: i32) -> Self {
        match code {
            Self::MAIN_MENU_CODE => GamePhase::MainMenu,
            Self::IN_GAME_CODE => GamePhase::InGame,
            other => GamePhase::Other(other),
        }
    }
}

impl Default for GamePhase {
    fn default() -> Self {
        GamePhase::Other(0)
    }
}

/// Semantic view of the game after a poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub prev_phase: GamePhase,
    pub curr_phase: GamePhase,
    pub prev_map: String,
    pub curr_map: String,
    /// True only on the poll where `curr_map` actually changed
    pub map_changed: bool,
    pub in_intermission: bool,
    /// `curr_phase == InGame && !in_intermission`
    pub in_game: bool,
    /// In-game clock, when the layout has one and reading it is enabled
    pub clock: Option<Duration>,
    /// Final button state, when the layout has the button cells
    pub final_button_pressed: Option<bool>,
}

impl Snapshot {
    /// Level signal for load removal: game time stands still outside play
    pub fn is_time_paused(&self) -> bool {
        !self.in_game || self.in_intermission
    }
}

/// Owns the evolving [`Snapshot`] for one attached process
#[derive(Debug, Clone)]
pub struct StateTracker {
    layout: MemoryLayout,
    read_clock: bool,
    snapshot: Snapshot,
    last_button_y: Option<f32>,
    last_pause_counter: Option<i32>,
}

impl StateTracker {
    pub fn new(layout: MemoryLayout) -> Self {
        Self {
            layout,
            read_clock: false,
            snapshot: Snapshot::default(),
            last_button_y: None,
            last_pause_counter: None,
        }
    }

    /// Enable reading the in-game clock (only effective if the layout has one)
    pub fn with_clock(mut self, enabled: bool) -> Self {
        self.read_clock = enabled;
        self
    }

    pub fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Forget the previous-poll fields; current values are kept
    pub fn clear_history(&mut self) {
        self.snapshot.prev_phase = GamePhase::default();
        self.snapshot.prev_map.clear();
        self.snapshot.map_changed = false;
    }

    /// Poll the process once and refresh the snapshot
    pub fn update(&mut self, reader: &dyn MemoryReader) -> &Snapshot {
        self.update_phase(reader);

        if self.snapshot.curr_phase != self.snapshot.prev_phase {
            log::debug!(
                "Game phase {} -> {}",
                self.snapshot.prev_phase.code(),
                self.snapshot.curr_phase.code()
            );
            self.update_map(reader);
        } else {
            // Map changes without a phase change are not observed
            self.snapshot.prev_map.clone_from(&self.snapshot.curr_map);
            self.snapshot.map_changed = false;
        }

        self.update_in_game(reader);
        self.update_clock(reader);
        self.update_final_button(reader);

        &self.snapshot
    }

    fn update_phase(&mut self, reader: &dyn MemoryReader) {
        self.snapshot.prev_phase = self.snapshot.curr_phase;
        if let Some(code) = self.layout.game_phase.read_i32(reader) {
            self.snapshot.curr_phase = GamePhase::from(code);
        }
    }

    fn update_map(&mut self, reader: &dyn MemoryReader) {
        self.snapshot.prev_map.clone_from(&self.snapshot.curr_map);
        self.snapshot.map_changed = false;

        let Some(map) = self
            .layout
            .map_name
            .read_string(reader, self.layout.map_name_len)
        else {
            return;
        };

        if !map.is_empty() && map != self.snapshot.curr_map {
            log::debug!("Map '{}' -> '{}'", self.snapshot.curr_map, map);
            self.snapshot.curr_map = map;
            self.snapshot.map_changed = true;
        }
    }

    fn update_in_game(&mut self, reader: &dyn MemoryReader) {
        if let Some(value) = self.layout.intermission.read_i32(reader) {
            self.snapshot.in_intermission = value != 0;
        }
        self.snapshot.in_game =
            self.snapshot.curr_phase == GamePhase::InGame && !self.snapshot.in_intermission;
    }

    fn update_clock(&mut self, reader: &dyn MemoryReader) {
        let Some(clock) = self.layout.clock.as_ref().filter(|_| self.read_clock) else {
            self.snapshot.clock = None;
            return;
        };

        match clock.read_i32(reader) {
            Some(ms) if ms >= 0 => {
                self.snapshot.clock = Some(Duration::from_millis(ms as u64));
            }
            _ => {}
        }
    }

    fn update_final_button(&mut self, reader: &dyn MemoryReader) {
        let Some(button_y) = self.layout.final_button_y.as_ref() else {
            self.snapshot.final_button_pressed = None;
            return;
        };

        if let Some(y) = button_y.read_f32(reader) {
            self.last_button_y = Some(y);
        }
        if let Some(counter) = self.layout.pause_counter.as_ref() {
            if let Some(value) = counter.read_i32(reader) {
                self.last_pause_counter = Some(value);
            }
        }

        let Some(y) = self.last_button_y else {
            return;
        };
        let counter_ok = match self.layout.pause_counter {
            Some(_) => self.last_pause_counter.is_some_and(|c| c > 0),
            None => true,
        };
        self.snapshot.final_button_pressed =
            Some(self.layout.button_thresholds.is_pressed(y) && counter_ok);
    }
}
