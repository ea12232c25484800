//! Full runs against a simulated q2pro process

use std::sync::Arc;
use std::time::Duration;

use quake2_autosplitter::memory::{MockMemoryReader, MockProcessFinder, ProcessFinder};
use quake2_autosplitter::{
    Autosplitter, Decision, EventSequence, GameEvent, GamePhase, SplitOrchestrator,
    SplitterSettings, TimerHost,
};

const BASE: usize = 0x400000;
const SIZE_2016: usize = 5033984;
const PHASE: usize = BASE + 0x286400;
const MAP: usize = BASE + 0x33FF44;
const INTERMISSION: usize = BASE + 0x2FDF28;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Start,
    Split,
    Paused(bool),
}

#[derive(Default)]
struct RecordingHost {
    running: bool,
    calls: Vec<Call>,
}

impl RecordingHost {
    fn decisions(&self) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, Call::Paused(_)))
            .cloned()
            .collect()
    }

    fn last_pause(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Paused(p) => Some(*p),
            _ => None,
        })
    }
}

impl TimerHost for RecordingHost {
    fn start_run(&mut self) {
        self.running = true;
        self.calls.push(Call::Start);
    }

    fn split(&mut self) {
        self.calls.push(Call::Split);
    }

    fn set_time_paused(&mut self, paused: bool) {
        self.calls.push(Call::Paused(paused));
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A q2pro 2016 process sitting in the main menu
fn q2pro() -> MockMemoryReader {
    let game = MockMemoryReader::new().with_base(BASE).with_size(SIZE_2016);
    game.write_i32(PHASE, GamePhase::MAIN_MENU_CODE);
    game.write_string(MAP, "", 32);
    game.write_i32(INTERMISSION, 0);
    game
}

fn load(game: &MockMemoryReader, map: &str) {
    game.write_i32(PHASE, 3);
    game.write_string(MAP, map, 32);
}

fn play(game: &MockMemoryReader) {
    game.write_i32(PHASE, GamePhase::IN_GAME_CODE);
}

fn settings(ids: &[&str]) -> SplitterSettings {
    SplitterSettings {
        used_events: ids.iter().map(|s| s.to_string()).collect(),
        ..SplitterSettings::default()
    }
}

#[test]
fn test_two_event_run() {
    init_logging();
    let game = q2pro();
    let mut orchestrator = SplitOrchestrator::from_settings(&settings(&["loaded:base1", "loaded:base2"]));
    let mut host = RecordingHost::default();
    orchestrator.attach(Box::new(game.clone())).unwrap();

    orchestrator.tick(&mut host);

    load(&game, "base1");
    orchestrator.tick(&mut host);
    play(&game);
    assert_eq!(orchestrator.tick(&mut host).decision, Decision::Start);

    for _ in 0..10 {
        assert_eq!(orchestrator.tick(&mut host).decision, Decision::Idle);
    }

    game.write_i32(INTERMISSION, 1);
    orchestrator.tick(&mut host);
    assert_eq!(host.last_pause(), Some(true));

    game.write_i32(INTERMISSION, 0);
    load(&game, "base2");
    orchestrator.tick(&mut host);
    play(&game);
    assert_eq!(orchestrator.tick(&mut host).decision, Decision::Split);
    assert_eq!(host.last_pause(), Some(false));

    assert_eq!(host.decisions(), vec![Call::Start, Call::Split]);
    assert_eq!(orchestrator.current_index(), Some(1));
}

#[test]
fn test_loaded_map_fires_once_per_entry() {
    init_logging();
    let game = q2pro();
    let mut orchestrator = SplitOrchestrator::from_settings(&settings(&[
        "loaded:base1",
        "loaded:base1",
        "loaded:base1",
    ]));
    let mut host = RecordingHost::default();
    orchestrator.attach(Box::new(game.clone())).unwrap();

    // Quickload back into the same map: one event per entry into play
    for _ in 0..3 {
        load(&game, "base1");
        orchestrator.tick(&mut host);
        play(&game);
        orchestrator.tick(&mut host);
        orchestrator.tick(&mut host);
    }

    assert_eq!(host.decisions(), vec![Call::Start, Call::Split, Call::Split]);
}

#[test]
fn test_map_change_without_phase_change_is_missed() {
    init_logging();
    let game = q2pro();
    let mut orchestrator = SplitOrchestrator::from_settings(&settings(&["loaded:base1", "loaded:base2"]));
    let mut host = RecordingHost::default();
    orchestrator.attach(Box::new(game.clone())).unwrap();

    load(&game, "base1");
    orchestrator.tick(&mut host);
    play(&game);
    orchestrator.tick(&mut host);

    game.write_string(MAP, "base2", 32);
    orchestrator.tick(&mut host);
    let snapshot = orchestrator.snapshot().unwrap();
    assert_eq!(snapshot.curr_map, "base1");
    assert!(!snapshot.map_changed);
    assert_eq!(host.decisions(), vec![Call::Start]);
}

#[test]
fn test_unmapped_process_never_splits() {
    init_logging();
    let game = MockMemoryReader::new().with_base(BASE).with_size(SIZE_2016);
    let mut orchestrator = SplitOrchestrator::from_settings(&settings(&["loaded:base1"]));
    let mut host = RecordingHost::default();
    orchestrator.attach(Box::new(game)).unwrap();

    for _ in 0..5 {
        let outcome = orchestrator.tick(&mut host);
        assert_eq!(outcome.decision, Decision::Idle);
        assert_eq!(outcome.time_paused, Some(true));
    }
}

#[test]
fn test_settings_roundtrip_preserves_behavior() {
    init_logging();
    let mut sequence = EventSequence::new();
    sequence.push(GameEvent::loaded_map("base1"));
    sequence.push(GameEvent::end());

    let mut stored = SplitterSettings::from_sequence(&sequence);
    stored.pause_game_time = true;
    let restored = SplitterSettings::from_toml(&stored.to_toml().unwrap()).unwrap();
    assert!(restored.pause_game_time);
    assert_eq!(restored.to_sequence(), sequence);

    let game = q2pro();
    let mut orchestrator = SplitOrchestrator::from_settings(&restored);
    let mut host = RecordingHost::default();
    orchestrator.attach(Box::new(game.clone())).unwrap();
    load(&game, "base1");
    orchestrator.tick(&mut host);
    play(&game);
    assert_eq!(orchestrator.tick(&mut host).decision, Decision::Start);
}

#[test]
fn test_driver_follows_process_lifecycle() {
    init_logging();
    let finder = Arc::new(MockProcessFinder::new());
    let splitter = Autosplitter::from_settings(
        Arc::clone(&finder) as Arc<dyn ProcessFinder>,
        &settings(&["loaded:base1", "loaded:base2"]),
        RecordingHost::default(),
    );

    assert_eq!(splitter.poll_once().unwrap(), None);

    let game = q2pro();
    finder.add_process_with_reader(1000, "q2pro.exe", game.clone());
    assert!(splitter.poll_once().unwrap().is_some());
    assert_eq!(splitter.state().game_version.as_deref(), Some("v2016_01_12"));

    load(&game, "base1");
    splitter.poll_once().unwrap();
    play(&game);
    let outcome = splitter.poll_once().unwrap().unwrap();
    assert_eq!(outcome.decision, Decision::Start);
    assert_eq!(splitter.state().current_index, Some(0));

    // Game crashes and is restarted mid-run
    game.invalidate();
    finder.remove_process(1000);
    assert_eq!(splitter.poll_once().unwrap(), None);
    assert!(!splitter.state().process_attached);

    let restarted = q2pro();
    finder.add_process_with_reader(1001, "q2pro.exe", restarted.clone());
    splitter.poll_once().unwrap();
    assert_eq!(splitter.state().process_id, Some(1001));

    load(&restarted, "base2");
    splitter.poll_once().unwrap();
    play(&restarted);
    splitter.poll_once().unwrap();

    let host = splitter.host();
    assert_eq!(host.lock().decisions(), vec![Call::Start, Call::Split]);
}

#[test]
fn test_driver_thread_polls_until_stopped() {
    init_logging();
    let finder = Arc::new(MockProcessFinder::new());
    let game = q2pro();
    finder.add_process_with_reader(5, "q2pro", game.clone());

    let splitter = Autosplitter::from_settings(
        Arc::clone(&finder) as Arc<dyn ProcessFinder>,
        &settings(&["loaded:base1"]),
        RecordingHost::default(),
    )
    .with_poll_interval(Duration::from_millis(1));

    splitter.start().unwrap();
    load(&game, "base1");
    std::thread::sleep(Duration::from_millis(50));
    play(&game);

    let mut started = false;
    for _ in 0..200 {
        if splitter.host().lock().running {
            started = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    splitter.stop();

    assert!(started);
    assert!(!splitter.state().running);
    assert!(!splitter.state().process_attached);
}
