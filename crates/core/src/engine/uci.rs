//! UCI engine interface
//!
//! Spawns a UCI engine (Stockfish or compatible) as a subprocess and asks it
//! for a timed evaluation of each position.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::Duration;

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::score::Score;
use super::{Evaluator, Line};

/// Maximum number of lines to read before giving up on a handshake reply.
///
/// Searches are not capped: a long movetime legitimately produces many
/// `info` lines, and a dead engine is caught by EOF instead.
pub const MAX_UCI_LINES: usize = 1000;

/// How long to wait for the engine to exit after `quit`.
const QUIT_GRACE: Duration = Duration::from_millis(200);
const QUIT_POLL: Duration = Duration::from_millis(10);

#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine binary is missing or could not be started
    #[error("Engine unavailable at {path}: {reason}")]
    Unavailable { path: String, reason: String },
    /// Engine returned something we could not use
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running UCI engine process
pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    /// Name reported via `id name`
    name: String,
    closed: bool,
}

impl UciEngine {
    /// Starts the engine and completes the UCI handshake.
    ///
    /// # Arguments
    /// * `path` - Path to the engine binary, or a bare name to look up in PATH
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let unavailable = |reason: String| EngineError::Unavailable {
            path: path.display().to_string(),
            reason,
        };

        // Bare names like "stockfish" are resolved by the OS at spawn time
        if path.components().count() > 1 && !path.exists() {
            return Err(unavailable("no such file".into()));
        }

        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| unavailable(e.to_string()))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| unavailable("failed to open stdin".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| unavailable("failed to open stdout".into()))?;

        let mut engine = UciEngine {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            name: String::new(),
            closed: false,
        };

        engine.init_uci()?;
        debug!(engine = %engine.name, "UCI engine ready");

        Ok(engine)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        trace!(">> {}", cmd);
        writeln!(self.stdin, "{}", cmd)?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let bytes = self.stdout.read_line(&mut line)?;
        if bytes == 0 {
            return Err(EngineError::Protocol("engine closed its output".into()));
        }
        let line = line.trim().to_string();
        trace!("<< {}", line);
        Ok(line)
    }

    /// Reads lines until one starts with `expected`, feeding the rest to `on_line`.
    ///
    /// With a `limit`, gives up after that many lines.
    fn read_until<F>(
        &mut self,
        expected: &str,
        limit: Option<usize>,
        mut on_line: F,
    ) -> Result<String, EngineError>
    where
        F: FnMut(&str),
    {
        let mut lines_read = 0;
        loop {
            if limit.is_some_and(|max| lines_read >= max) {
                return Err(EngineError::Protocol(format!(
                    "no '{}' within {} lines",
                    expected, lines_read
                )));
            }
            lines_read += 1;

            let line = self.read_line()?;
            if line.starts_with(expected) {
                return Ok(line);
            }
            on_line(&line);
        }
    }

    fn init_uci(&mut self) -> Result<(), EngineError> {
        self.send("uci")?;
        let mut name = String::new();
        self.read_until("uciok", Some(MAX_UCI_LINES), |line| {
            if let Some(n) = line.strip_prefix("id name ") {
                name = n.to_string();
            }
        })?;
        self.name = if name.is_empty() {
            "Unknown Engine".to_string()
        } else {
            name
        };

        self.wait_ready()
    }

    fn wait_ready(&mut self) -> Result<(), EngineError> {
        self.send("isready")?;
        self.read_until("readyok", Some(MAX_UCI_LINES), |_| {})?;
        Ok(())
    }

    /// Evaluates the end of `line` for `budget` of engine time.
    ///
    /// The whole move history is sent so the engine can see repetitions.
    /// The score is from the point of view of the side to move, which is how
    /// UCI engines report it.
    pub fn analyze(&mut self, line: &Line<'_>, budget: Duration) -> Result<Score, EngineError> {
        self.send(&position_command(line))?;
        self.send(&format!("go movetime {}", budget.as_millis().max(1)))?;

        let pov = line.position.turn();
        let mut score = None;
        self.read_until("bestmove", None, |info| {
            if let Some(s) = parse_info_score(info, pov) {
                score = Some(s);
            }
        })?;

        score.ok_or_else(|| {
            EngineError::Protocol(format!(
                "no score reported for position {}",
                Fen::from_position(line.position, EnPassantMode::Legal)
            ))
        })
    }

    /// Clears engine state between games.
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        self.send("ucinewgame")?;
        self.wait_ready()
    }

    /// Shuts the engine down, reporting any failure.
    pub fn close(mut self) -> Result<(), EngineError> {
        self.closed = true;
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        // A dead engine can't read quit; we still need to reap it
        if let Err(e) = self.send("quit") {
            debug!("quit not delivered: {}", e);
        }

        let mut waited = Duration::ZERO;
        while waited < QUIT_GRACE {
            if self.process.try_wait()?.is_some() {
                return Ok(());
            }
            thread::sleep(QUIT_POLL);
            waited += QUIT_POLL;
        }

        warn!(engine = %self.name, "engine ignored quit, killing it");
        self.process.kill()?;
        self.process.wait()?;
        Ok(())
    }
}

impl Evaluator for UciEngine {
    fn evaluate(&mut self, line: &Line<'_>, budget: Duration) -> Result<Score, EngineError> {
        self.analyze(line, budget)
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        UciEngine::new_game(self)
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.shutdown() {
            warn!(engine = %self.name, "engine shutdown failed: {}", e);
        }
    }
}

/// Builds `position startpos moves ...` or `position fen <start> moves ...`.
fn position_command(line: &Line<'_>) -> String {
    let start = Fen::from_position(line.start, EnPassantMode::Legal).to_string();
    let standard = Fen::from_position(&Chess::default(), EnPassantMode::Legal).to_string();

    let mut cmd = if start == standard {
        "position startpos".to_string()
    } else {
        format!("position fen {}", start)
    };

    if !line.moves.is_empty() {
        cmd.push_str(" moves");
        for mv in line.moves {
            cmd.push(' ');
            cmd.push_str(&mv.to_uci(CastlingMode::Standard).to_string());
        }
    }
    cmd
}

/// Extracts the score from a UCI `info` line.
///
/// Format: "info depth X ... score cp Y ..." or "info depth X ... score mate Y ..."
fn parse_info_score(line: &str, pov: shakmaty::Color) -> Option<Score> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("info") {
        return None;
    }

    while let Some(token) = parts.next() {
        match token {
            "score" => {
                let kind = parts.next()?;
                let value: i32 = parts.next()?.parse().ok()?;
                return match kind {
                    "cp" => Some(Score::cp(value, pov)),
                    "mate" => Some(Score::mate(value, pov)),
                    _ => None,
                };
            }
            // Everything after pv is moves
            "pv" | "string" => return None,
            _ => {}
        }
    }
    None
}
