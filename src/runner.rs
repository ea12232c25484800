//! Background poll driver
//!
//! Finds the game process, attaches the orchestrator to it and ticks it at
//! a fixed cadence until stopped. The core itself stays single-threaded: the
//! driver thread is the only caller of [`SplitOrchestrator::tick`].

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{AutosplitterError, Result};
use crate::memory::ProcessFinder;
use crate::orchestrator::{SplitOrchestrator, TickOutcome, TimerHost};
use crate::settings::SplitterSettings;

/// Executable names of supported game clients
pub const PROCESS_NAMES: &[&str] = &["q2pro", "q2pro.exe"];

/// Serializable view of the driver for frontends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutosplitterState {
    /// Whether the poll thread is running
    pub running: bool,
    pub process_attached: bool,
    pub process_id: Option<u32>,
    /// Name of the memory layout in use
    pub game_version: Option<String>,
    /// False when an unknown build is read with the fallback layout
    pub recognized: bool,
    /// Position of the last fired event in the split sequence
    pub current_index: Option<usize>,
}

impl AutosplitterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Drives a [`SplitOrchestrator`] against a live process
pub struct Autosplitter<H: TimerHost + Send + 'static> {
    finder: Arc<dyn ProcessFinder>,
    orchestrator: Arc<Mutex<SplitOrchestrator>>,
    host: Arc<Mutex<H>>,
    state: Arc<Mutex<AutosplitterState>>,
    running: Arc<AtomicBool>,
    /// Process refused by strict version checking, skipped until it exits
    rejected: Arc<Mutex<Option<u32>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    poll_interval: Duration,
}

impl<H: TimerHost + Send + 'static> Autosplitter<H> {
    pub fn new(finder: Arc<dyn ProcessFinder>, orchestrator: SplitOrchestrator, host: H) -> Self {
        Self {
            finder,
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            host: Arc::new(Mutex::new(host)),
            state: Arc::new(Mutex::new(AutosplitterState::default())),
            running: Arc::new(AtomicBool::new(false)),
            rejected: Arc::new(Mutex::new(None)),
            worker: Mutex::new(None),
            poll_interval: Duration::from_millis(15),
        }
    }

    /// Driver configured from persisted settings
    pub fn from_settings(finder: Arc<dyn ProcessFinder>, settings: &SplitterSettings, host: H) -> Self {
        Self::new(finder, SplitOrchestrator::from_settings(settings), host)
            .with_poll_interval(Duration::from_millis(settings.poll_interval_ms))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Current state snapshot
    pub fn state(&self) -> AutosplitterState {
        let mut state = self.state.lock().clone();
        state.running = self.is_running();
        state
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn orchestrator(&self) -> Arc<Mutex<SplitOrchestrator>> {
        Arc::clone(&self.orchestrator)
    }

    pub fn host(&self) -> Arc<Mutex<H>> {
        Arc::clone(&self.host)
    }

    /// Run one poll: attach if needed, detach if the process is gone, tick otherwise
    ///
    /// Returns the tick outcome when a tick ran.
    pub fn poll_once(&self) -> Result<Option<TickOutcome>> {
        poll(
            &*self.finder,
            &self.orchestrator,
            &self.host,
            &self.state,
            &self.rejected,
        )
    }

    /// Spawn the poll thread
    pub fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(AutosplitterError::AlreadyRunning);
        }

        let finder = Arc::clone(&self.finder);
        let orchestrator = Arc::clone(&self.orchestrator);
        let host = Arc::clone(&self.host);
        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);
        let rejected = Arc::clone(&self.rejected);
        let interval = self.poll_interval;

        let handle = thread::spawn(move || {
            log::info!("Autosplitter started, waiting for {:?}", PROCESS_NAMES);
            while running.load(Ordering::SeqCst) {
                if let Err(e) = poll(&*finder, &orchestrator, &host, &state, &rejected) {
                    log::warn!("{}", e);
                    thread::sleep(Duration::from_millis(1000));
                }
                thread::sleep(interval);
            }
            log::info!("Autosplitter stopped");
        });
        *self.worker.lock() = Some(handle);

        Ok(())
    }

    /// Stop the poll thread and drop the attachment
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                log::warn!("Autosplitter poll thread panicked");
            }
        }
        self.orchestrator.lock().detach();

        let mut state = self.state.lock();
        state.process_attached = false;
        state.process_id = None;
        state.game_version = None;
    }

    /// External run reset
    pub fn reset(&self) {
        self.orchestrator.lock().reset();
        self.state.lock().current_index = None;
    }
}

impl<H: TimerHost + Send + 'static> Drop for Autosplitter<H> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn poll<H: TimerHost>(
    finder: &dyn ProcessFinder,
    orchestrator: &Mutex<SplitOrchestrator>,
    host: &Mutex<H>,
    state: &Mutex<AutosplitterState>,
    rejected: &Mutex<Option<u32>>,
) -> Result<Option<TickOutcome>> {
    let mut orchestrator = orchestrator.lock();

    if !orchestrator.is_attached() {
        let Some((pid, name)) = finder.find_process(PROCESS_NAMES) else {
            *rejected.lock() = None;
            return Ok(None);
        };
        if *rejected.lock() == Some(pid) {
            return Ok(None);
        }

        let reader = finder
            .open_process(pid)
            .ok_or(AutosplitterError::ProcessOpenFailed(pid))?;
        let detection = match orchestrator.attach(reader) {
            Ok(detection) => detection,
            Err(e) => {
                *rejected.lock() = Some(pid);
                return Err(e);
            }
        };
        *rejected.lock() = None;
        log::info!("Attached to {} (pid {})", name, pid);

        let mut state = state.lock();
        state.process_attached = true;
        state.process_id = Some(pid);
        state.game_version = Some(detection.layout.name.clone());
        state.recognized = detection.recognized;
    } else if !orchestrator.is_process_alive() {
        log::info!("Game process exited");
        orchestrator.detach();

        let mut state = state.lock();
        state.process_attached = false;
        state.process_id = None;
        state.game_version = None;
        return Ok(None);
    }

    let outcome = orchestrator.tick(&mut *host.lock());
    state.lock().current_index = orchestrator.current_index();
    Ok(Some(outcome))
}
