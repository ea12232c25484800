//! Quake II Autosplitter
//!
//! A memory-reading autosplitter library for Quake II running on the q2pro
//! client. Detects the game build, follows the game phase, map and
//! intermission state, and tells a timer when to start, split and pause.
//!
//! Typical use:
//! - hosts with their own process handling feed a [`MemoryReader`] to a
//!   [`SplitOrchestrator`] and call [`SplitOrchestrator::tick`] every poll
//! - standalone frontends use the [`Autosplitter`] driver, which finds the
//!   process itself and polls on a background thread

pub mod error;
pub mod events;
pub mod layout;
pub mod memory;
pub mod orchestrator;
pub mod runner;
pub mod sequence;
pub mod settings;
pub mod state;
pub mod version;

// Re-export commonly used types
pub use error::{AutosplitterError, Result};
pub use events::{EventCatalog, GameEvent, MapInfo};
pub use layout::{BinaryIdentity, ButtonThresholds, LayoutTable, MemoryLayout};
pub use memory::{MemoryReader, Pointer, ProcessFinder};
pub use orchestrator::{Decision, OrchestratorOptions, SplitOrchestrator, TickOutcome, TimerHost};
pub use runner::{Autosplitter, AutosplitterState, PROCESS_NAMES};
pub use sequence::{EventSequence, SequenceHandle};
pub use settings::SplitterSettings;
pub use state::{GamePhase, Snapshot, StateTracker};
pub use version::{Detection, VersionDetector};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
