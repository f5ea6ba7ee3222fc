//! Chess engine integration
//!
//! Provides the [`Evaluator`] seam and a UCI implementation of it.

pub mod score;
pub mod uci;

use shakmaty::{Chess, Move};
use std::time::Duration;

pub use score::Score;
pub use uci::{EngineError, UciEngine};

/// A position together with the moves that led to it.
///
/// Engines need the history to spot repetitions.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    /// Where the game started
    pub start: &'a Chess,
    /// Moves played from `start`, up to and including the last one
    pub moves: &'a [Move],
    /// The position after `moves`
    pub position: &'a Chess,
}

/// Something that can score a position.
///
/// Implementations return the score from the point of view of the side to
/// move in `line.position`.
pub trait Evaluator {
    fn evaluate(&mut self, line: &Line<'_>, budget: Duration) -> Result<Score, EngineError>;

    /// Called once before the first position of each game.
    fn new_game(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}
