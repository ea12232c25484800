//! Per-build memory layouts
//!
//! q2pro moves its globals around between releases, so every supported
//! build has its own set of cell offsets. Builds are told apart by the size
//! of the loaded main module. Adding a build is a data entry: either a new
//! row in [`LayoutTable::builtin`] or a `[[layout]]` table in an override
//! file loaded with [`LayoutTable::with_overrides_toml`].

use serde::{Deserialize, Serialize};

use crate::error::{AutosplitterError, Result};
use crate::memory::Pointer;

/// Build-distinguishing property of the attached process image
///
/// Currently the in-memory size of the main module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BinaryIdentity(pub usize);

impl BinaryIdentity {
    /// Identity of a module with the given image size
    pub fn from_module_size(size: usize) -> Self {
        Self(size)
    }

    pub fn module_size(&self) -> usize {
        self.0
    }
}

/// Y-position bounds beyond which the final button counts as pressed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonThresholds {
    /// Pressed when the Y position is at or above this value
    pub high: f32,
    /// Pressed when the Y position is at or below this value
    pub low: f32,
}

impl ButtonThresholds {
    pub const fn new(high: f32, low: f32) -> Self {
        Self { high, low }
    }

    /// Whether `y` lies outside the resting band of the button
    pub fn is_pressed(&self, y: f32) -> bool {
        y >= self.high || y <= self.low
    }
}

impl Default for ButtonThresholds {
    fn default() -> Self {
        Self::new(164.0, -2084.0)
    }
}

fn default_map_name_len() -> usize {
    32
}

/// Cell locations for one game build
///
/// Optional cells are `None` on builds that do not expose them; a missing
/// cell is never confused with an offset of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryLayout {
    /// Human-readable build name (e.g. "v2016_01_12")
    pub name: String,
    /// Raw game phase code (1 = main menu, 7 = in game)
    pub game_phase: Pointer,
    /// Current map name buffer
    pub map_name: Pointer,
    /// Non-zero while the intermission scoreboard is shown
    pub intermission: Pointer,
    /// Maximum map name length read from `map_name`
    #[serde(default = "default_map_name_len")]
    pub map_name_len: usize,
    /// In-game clock in milliseconds
    #[serde(default)]
    pub clock: Option<Pointer>,
    /// Y position of the final button
    #[serde(default)]
    pub final_button_y: Option<Pointer>,
    /// Counter that must be positive for a button press to count
    #[serde(default)]
    pub pause_counter: Option<Pointer>,
    #[serde(default)]
    pub button_thresholds: ButtonThresholds,
}

impl MemoryLayout {
    /// Layout with only the three mandatory cells, all static offsets
    pub fn basic(name: impl Into<String>, game_phase: i64, map_name: i64, intermission: i64) -> Self {
        Self {
            name: name.into(),
            game_phase: Pointer::offset(game_phase),
            map_name: Pointer::offset(map_name),
            intermission: Pointer::offset(intermission),
            map_name_len: default_map_name_len(),
            clock: None,
            final_button_y: None,
            pause_counter: None,
            button_thresholds: ButtonThresholds::default(),
        }
    }

    pub fn supports_clock(&self) -> bool {
        self.clock.is_some()
    }

    pub fn supports_final_button(&self) -> bool {
        self.final_button_y.is_some()
    }
}

/// A single table row: identity and the layout it selects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub module_size: usize,
    #[serde(flatten)]
    pub layout: MemoryLayout,
}

#[derive(Debug, Deserialize)]
struct LayoutOverrides {
    #[serde(default)]
    layout: Vec<LayoutEntry>,
}

/// Mapping from binary identity to memory layout
///
/// Entries keep insertion order; the first entry is the earliest known
/// build and serves as the fallback for unrecognized binaries.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTable {
    entries: Vec<LayoutEntry>,
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LayoutTable {
    /// The q2pro builds known out of the box
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                // Latest original Q2PRO release, built Dec 3 2014
                LayoutEntry {
                    module_size: 5029888,
                    layout: MemoryLayout::basic("v2014_12_03", 0x31BDC0, 0x3086C4, 0x2C679C),
                },
                // First release of the modified Q2PRO, built Jan 12 2016
                LayoutEntry {
                    module_size: 5033984,
                    layout: MemoryLayout::basic("v2016_01_12", 0x286400, 0x33FF44, 0x2FDF28),
                },
            ],
        }
    }

    /// Build a table from explicit entries
    pub fn from_entries(entries: Vec<LayoutEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(AutosplitterError::LayoutConfig(
                "layout table must contain at least one entry".to_string(),
            ));
        }
        Ok(Self { entries })
    }

    /// Merge `[[layout]]` entries from a TOML document into this table
    ///
    /// An entry whose module size is already known replaces that row in
    /// place; new sizes are appended.
    pub fn with_overrides_toml(mut self, content: &str) -> Result<Self> {
        let overrides: LayoutOverrides =
            toml::from_str(content).map_err(|e| AutosplitterError::LayoutConfig(e.to_string()))?;

        for entry in overrides.layout {
            if entry.layout.map_name_len == 0 {
                return Err(AutosplitterError::LayoutConfig(format!(
                    "layout '{}' has a zero map_name_len",
                    entry.layout.name
                )));
            }

            match self
                .entries
                .iter_mut()
                .find(|e| e.module_size == entry.module_size)
            {
                Some(existing) => {
                    log::info!(
                        "Replacing layout for module size {} with '{}'",
                        entry.module_size,
                        entry.layout.name
                    );
                    *existing = entry;
                }
                None => {
                    log::info!(
                        "Adding layout '{}' for module size {}",
                        entry.layout.name,
                        entry.module_size
                    );
                    self.entries.push(entry);
                }
            }
        }

        Ok(self)
    }

    /// Exact-match lookup
    pub fn lookup(&self, identity: BinaryIdentity) -> Option<&MemoryLayout> {
        self.entries
            .iter()
            .find(|e| e.module_size == identity.module_size())
            .map(|e| &e.layout)
    }

    /// The earliest known layout
    pub fn fallback(&self) -> &MemoryLayout {
        &self.entries[0].layout
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
