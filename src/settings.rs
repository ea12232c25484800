//! Persisted user settings

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sequence::EventSequence;

fn default_pause_game_time() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    15
}

/// User-chosen split events and timer options
///
/// Stored as TOML or JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitterSettings {
    /// Ordered event identifiers; the first starts the run
    #[serde(default)]
    pub used_events: Vec<String>,
    /// Signal the host to pause game time outside play
    #[serde(default = "default_pause_game_time")]
    pub pause_game_time: bool,
    /// Forward the in-game clock to the host when the build exposes one
    #[serde(default)]
    pub game_time: bool,
    /// Refuse to attach to unrecognized builds
    #[serde(default)]
    pub strict_version_check: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SplitterSettings {
    fn default() -> Self {
        Self {
            used_events: Vec::new(),
            pause_game_time: default_pause_game_time(),
            game_time: false,
            strict_version_check: false,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl SplitterSettings {
    /// Settings holding the identifiers of `sequence`
    pub fn from_sequence(sequence: &EventSequence) -> Self {
        Self {
            used_events: sequence.ids(),
            ..Self::default()
        }
    }

    pub fn set_sequence(&mut self, sequence: &EventSequence) {
        self.used_events = sequence.ids();
    }

    /// Resolve the stored identifiers; unknown ones are dropped
    pub fn to_sequence(&self) -> EventSequence {
        EventSequence::from_ids(&self.used_events)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
