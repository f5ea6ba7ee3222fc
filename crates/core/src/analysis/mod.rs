//! Move quality analysis
//!
//! Buckets each move's evaluation loss and tallies the results per side.

pub mod classifier;
pub mod quality;
pub mod tally;

pub use classifier::{analyze_game, analyze_pgn_game, classify_game, INITIAL_SCORE, MATE_SWING_PENALTY};
pub use quality::MoveQuality;
pub use tally::{SideTally, Tally};
