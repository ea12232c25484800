//! Tick-driven start/split decisions
//!
//! [`SplitOrchestrator`] is the only stateful piece a host needs: attach a
//! reader once a process is found, call [`SplitOrchestrator::tick`] once per
//! poll, detach when the process is gone.

use std::time::Duration;

use crate::error::Result;
use crate::layout::BinaryIdentity;
use crate::memory::MemoryReader;
use crate::sequence::{EventSequence, SequenceHandle};
use crate::settings::SplitterSettings;
use crate::state::{Snapshot, StateTracker};
use crate::version::{Detection, VersionDetector};

/// Run-state API of the timer the autosplitter drives
pub trait TimerHost {
    fn start_run(&mut self);

    fn split(&mut self);

    fn set_time_paused(&mut self, paused: bool);

    fn is_running(&self) -> bool;

    /// Receives the in-game clock when game time reading is enabled
    fn set_game_time(&mut self, _time: Duration) {}
}

/// What a tick decided about the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Decision {
    #[default]
    Idle,
    Start,
    Split,
}

/// Everything a tick emitted to the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub decision: Decision,
    /// The pause level sent this tick, if pausing is enabled
    pub time_paused: Option<bool>,
    /// The game time sent this tick, if the clock is being read
    pub game_time: Option<Duration>,
}

/// Orchestrator options derived from [`SplitterSettings`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    pub pause_game_time: bool,
    pub game_time: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            pause_game_time: true,
            game_time: false,
        }
    }
}

impl From<&SplitterSettings> for OrchestratorOptions {
    fn from(settings: &SplitterSettings) -> Self {
        Self {
            pause_game_time: settings.pause_game_time,
            game_time: settings.game_time,
        }
    }
}

struct Attached {
    reader: Box<dyn MemoryReader>,
    tracker: StateTracker,
    detection: Detection,
}

/// Evaluates the next expected event every tick and drives the host timer
pub struct SplitOrchestrator {
    detector: VersionDetector,
    sequence: SequenceHandle,
    options: OrchestratorOptions,
    attached: Option<Attached>,
    /// Position of the last event that fired; `None` before the run starts
    index: Option<usize>,
}

impl SplitOrchestrator {
    pub fn new(detector: VersionDetector, sequence: SequenceHandle, options: OrchestratorOptions) -> Self {
        Self {
            detector,
            sequence,
            options,
            attached: None,
            index: None,
        }
    }

    /// Build from persisted settings with the built-in layout table
    pub fn from_settings(settings: &SplitterSettings) -> Self {
        let detector = VersionDetector::default().strict(settings.strict_version_check);
        Self::new(
            detector,
            SequenceHandle::new(settings.to_sequence()),
            OrchestratorOptions::from(settings),
        )
    }

    pub fn with_detector(mut self, detector: VersionDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn options(&self) -> OrchestratorOptions {
        self.options
    }

    /// The clock flag only applies from the next attach
    pub fn set_options(&mut self, options: OrchestratorOptions) {
        self.options = options;
    }

    /// Handle for swapping the sequence between ticks
    pub fn sequence_handle(&self) -> SequenceHandle {
        self.sequence.clone()
    }

    pub fn set_sequence(&self, sequence: EventSequence) {
        self.sequence.replace(sequence);
    }

    /// Identify the build behind `reader` and start tracking it
    ///
    /// Replaces any previous attachment. The split index is kept, so a game
    /// restarted mid-run continues from where it was.
    pub fn attach(&mut self, reader: Box<dyn MemoryReader>) -> Result<Detection> {
        let identity = BinaryIdentity::from_module_size(reader.module_size());
        let detection = self.detector.detect(identity)?;

        let tracker = StateTracker::new(detection.layout.clone()).with_clock(self.options.game_time);
        log::info!(
            "Attached to game build {} (recognized: {})",
            detection.layout.name,
            detection.recognized
        );

        self.attached = Some(Attached {
            reader,
            tracker,
            detection: detection.clone(),
        });
        Ok(detection)
    }

    /// Drop the reader and all tracked game state
    pub fn detach(&mut self) {
        if self.attached.take().is_some() {
            log::info!("Detached from game process");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// Whether the attached process still looks alive
    pub fn is_process_alive(&self) -> bool {
        self.attached.as_ref().is_some_and(|a| a.reader.is_valid())
    }

    pub fn detection(&self) -> Option<&Detection> {
        self.attached.as_ref().map(|a| &a.detection)
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.attached.as_ref().map(|a| a.tracker.snapshot())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.index
    }

    /// External run reset: rewind the sequence and forget previous-poll state
    pub fn reset(&mut self) {
        self.index = None;
        if let Some(attached) = self.attached.as_mut() {
            attached.tracker.clear_history();
        }
        log::info!("Run reset");
    }

    /// Run one poll against the attached process
    ///
    /// Does nothing while detached. At most one of start and split is sent.
    pub fn tick(&mut self, host: &mut dyn TimerHost) -> TickOutcome {
        let Some(attached) = self.attached.as_mut() else {
            return TickOutcome::default();
        };

        if self.index.is_some() && !host.is_running() {
            log::info!("Timer is no longer running, rewinding split sequence");
            self.index = None;
            attached.tracker.clear_history();
        }

        let snapshot = attached.tracker.update(&*attached.reader);
        let sequence = self.sequence.current();
        let next = sequence.next_after(self.index);

        let mut outcome = TickOutcome::default();

        if next.has_occurred(snapshot) {
            let position = EventSequence::next_position(self.index);
            if host.is_running() {
                log::info!("Split {} on '{}'", position, next);
                host.split();
                outcome.decision = Decision::Split;
            } else {
                log::info!("Starting run on '{}'", next);
                host.set_time_paused(false);
                host.start_run();
                outcome.decision = Decision::Start;
            }
            self.index = Some(position);
        }

        if self.options.pause_game_time {
            let paused = snapshot.is_time_paused();
            host.set_time_paused(paused);
            outcome.time_paused = Some(paused);
        }

        if let Some(clock) = snapshot.clock {
            host.set_game_time(clock);
            outcome.game_time = Some(clock);
        }

        outcome
    }
}
