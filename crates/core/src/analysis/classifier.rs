//! Move classification
//!
//! Walks a game's main line once, scoring every position and charging the
//! side that just moved with whatever evaluation it gave away.

use shakmaty::{Color, Position};
use tracing::{debug, info, warn};

use super::quality::MoveQuality;
use super::tally::Tally;
use crate::config::{AnalysisConfig, MatePolicy};
use crate::engine::{Evaluator, Line, Score, UciEngine};
use crate::error::Result;
use crate::parser::{read_game, PgnGame};

/// Assumed evaluation before the first move: a slight edge for White.
pub const INITIAL_SCORE: Score = Score::Centipawns {
    cp: 20,
    pov: Color::White,
};

/// Loss charged when a forced mate appears or disappears.
pub const MATE_SWING_PENALTY: i32 = 1000;

/// Tallies move quality for both sides of `game`.
///
/// Stops without scoring the final move if it delivers checkmate.
pub fn classify_game<E>(game: &PgnGame, evaluator: &mut E, config: &AnalysisConfig) -> Result<Tally>
where
    E: Evaluator + ?Sized,
{
    let budget = config.move_time();
    let mut tally = Tally::new();
    let mut previous = INITIAL_SCORE;

    evaluator.new_game()?;

    for (ply, position) in game.positions().enumerate() {
        let mover = !position.turn();
        let san = game.moves.get(ply).map(String::as_str).unwrap_or("?");

        if position.is_checkmate() {
            debug!(ply = ply + 1, san, "checkmate, stopping");
            break;
        }

        let line = Line {
            start: &game.start_position,
            moves: &game.played()[..=ply],
            position: &position,
        };
        let current = evaluator.evaluate(&line, budget)?;

        let quality = move_loss(previous, current, mover, config.mate_policy)
            .and_then(|loss| MoveQuality::from_loss(loss, config));

        if let Some(quality) = quality {
            tally.record(mover, quality);
        }

        debug!(
            ply = ply + 1,
            san,
            mover = ?mover,
            before = %previous.reorient(mover),
            after = %current.reorient(mover),
            quality = quality.map(|q| q.as_str()).unwrap_or("ok"),
            "classified move"
        );

        previous = current;
    }

    Ok(tally)
}

/// Centipawns `mover` gave away going from `previous` to `current`, or `None`
/// when the move is not scored.
fn move_loss(previous: Score, current: Score, mover: Color, policy: MatePolicy) -> Option<i32> {
    match (previous.centipawns_for(mover), current.centipawns_for(mover)) {
        (Some(before), Some(after)) => Some(before.saturating_sub(after)),
        (None, None) => None,
        // Mate on the board before, gone now
        (None, Some(_)) => {
            let charged = match policy {
                MatePolicy::AnyTransition => true,
                MatePolicy::OpponentOnly => previous.is_mate_for(mover),
            };
            charged.then_some(MATE_SWING_PENALTY)
        }
        // Mate just appeared
        (Some(_), None) => {
            let charged = match policy {
                MatePolicy::AnyTransition => true,
                MatePolicy::OpponentOnly => !current.is_mate_for(mover),
            };
            charged.then_some(MATE_SWING_PENALTY)
        }
    }
}

/// Analyzes an already parsed game with a fresh engine process.
///
/// The engine is shut down before returning, on success and on error.
pub fn analyze_pgn_game(game: &PgnGame, config: &AnalysisConfig) -> Result<Tally> {
    config.validate()?;

    info!(game = %game.summary(), moves = game.move_count(), "analyzing game");

    let mut engine = UciEngine::new(&config.engine_path)?;
    let tally = classify_game(game, &mut engine, config)?;

    if let Err(e) = engine.close() {
        warn!("engine did not shut down cleanly: {}", e);
    }

    info!(game = %game.summary(), %tally, "analysis complete");
    Ok(tally)
}

/// Parses the first game in `pgn` and analyzes it.
pub fn analyze_game(pgn: &str, config: &AnalysisConfig) -> Result<Tally> {
    let game = read_game(pgn)?;
    analyze_pgn_game(&game, config)
}
