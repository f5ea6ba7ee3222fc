//! UCI plumbing against scripted engines.
//!
//! Each test writes a small shell script that speaks just enough UCI, logs
//! every command it receives and records its pid, so the tests can check
//! what was sent and that the process was reaped afterwards.

#![cfg(target_os = "linux")]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use blunder_check_core::{
    analyze_game, AnalysisConfig, EngineError, Error, Line, Score, Tally, UciEngine,
};
use shakmaty::{Chess, Color};
use tempfile::TempDir;

const SCORE_AND_MOVE: &str = r#"echo "info depth 1 score cp 13 pv e2e4"; echo "bestmove e2e4""#;
const EXIT_ON_QUIT: &str = "exit 0";

/// Writing an executable while another thread forks can fail with ETXTBSY,
/// so tests that spawn engines run one at a time.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

struct FakeEngine {
    dir: TempDir,
    path: PathBuf,
}

impl FakeEngine {
    /// `on_go` runs for every `go`, `on_quit` for `quit`.
    fn new(on_go: &str, on_quit: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fakefish");
        let script = format!(
            r#"#!/bin/sh
dir=$(dirname "$0")
echo $$ > "$dir/pid"
while IFS= read -r cmd; do
  echo "$cmd" >> "$dir/commands.log"
  case "$cmd" in
    uci) echo "id name FakeFish"; echo "option name Hash type spin default 16 min 1 max 33554432"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) {on_go} ;;
    quit) {on_quit} ;;
  esac
done
"#
        );
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        FakeEngine { dir, path }
    }

    fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            engine_path: self.path.clone(),
            move_time_secs: 0.01,
            ..AnalysisConfig::default()
        }
    }

    fn commands(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("commands.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// True once the process is gone and its exit status has been collected.
    fn reaped(&self) -> bool {
        let pid = fs::read_to_string(self.dir.path().join("pid")).unwrap();
        !Path::new("/proc").join(pid.trim()).exists()
    }
}

fn start_line(start: &Chess) -> Line<'_> {
    Line {
        start,
        moves: &[],
        position: start,
    }
}

#[test]
fn test_engine_sees_full_history() {
    let _guard = serial();
    let engine = FakeEngine::new(SCORE_AND_MOVE, EXIT_ON_QUIT);

    let pgn = "1. Nf3 Nf6 2. Ng1 Ng8 3. Nf3 Nf6 4. Ng1 Ng8 *\n";
    let tally = analyze_game(pgn, &engine.config()).unwrap();
    assert_eq!(tally, Tally::default());

    let commands = engine.commands();
    let positions: Vec<_> = commands
        .iter()
        .filter(|c| c.starts_with("position"))
        .collect();
    assert_eq!(positions.len(), 8);
    assert_eq!(positions[0], "position startpos moves g1f3");
    assert_eq!(
        positions[7],
        "position startpos moves g1f3 g8f6 f3g1 f6g8 g1f3 g8f6 f3g1 f6g8"
    );
    assert!(commands.contains(&"ucinewgame".to_string()));
    assert_eq!(commands.last().map(String::as_str), Some("quit"));
    assert!(engine.reaped());
}

#[test]
fn test_engine_released_when_analysis_fails() {
    let _guard = serial();
    let engine = FakeEngine::new(r#"echo "bestmove e2e4""#, EXIT_ON_QUIT);

    let result = analyze_game("1. e4 e5 *\n", &engine.config());
    match result {
        Err(Error::Engine(EngineError::Protocol(msg))) => {
            assert!(msg.contains("no score"), "unexpected message: {}", msg)
        }
        other => panic!("expected a protocol error, got {:?}", other),
    }

    assert_eq!(engine.commands().last().map(String::as_str), Some("quit"));
    assert!(engine.reaped());
}

#[test]
fn test_eof_before_bestmove() {
    let _guard = serial();
    let engine = FakeEngine::new(r#"echo "info depth 1 score cp 5"; exit 0"#, EXIT_ON_QUIT);

    let start = Chess::default();
    let mut uci = UciEngine::new(&engine.path).unwrap();
    assert_eq!(uci.name(), "FakeFish");

    let result = uci.analyze(&start_line(&start), Duration::from_millis(10));
    assert!(matches!(result, Err(EngineError::Protocol(_))));

    drop(uci);
    assert!(engine.reaped());
}

#[test]
fn test_long_search_output_is_not_an_error() {
    let _guard = serial();
    let flood = r#"i=0; while [ $i -lt 12000 ]; do echo "info depth 20 currmove e2e4 currmovenumber 1"; i=$((i+1)); done; echo "info depth 20 score cp -42 pv e7e5"; echo "bestmove e7e5""#;
    let engine = FakeEngine::new(flood, EXIT_ON_QUIT);

    let start = Chess::default();
    let mut uci = UciEngine::new(&engine.path).unwrap();
    let score = uci.analyze(&start_line(&start), Duration::from_secs(5)).unwrap();
    assert_eq!(score, Score::cp(-42, Color::White));

    uci.close().unwrap();
    assert!(engine.reaped());
}

#[test]
fn test_engine_ignoring_quit_is_killed() {
    let _guard = serial();
    let engine = FakeEngine::new(SCORE_AND_MOVE, ":");

    let uci = UciEngine::new(&engine.path).unwrap();
    uci.close().unwrap();

    assert_eq!(engine.commands().last().map(String::as_str), Some("quit"));
    assert!(engine.reaped());
}
