//! Blunder Check Core Library
//!
//! Counts inaccuracies, mistakes and blunders for both sides of a chess game
//! by comparing engine evaluations before and after every move.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod parser;

pub use analysis::{analyze_game, analyze_pgn_game, classify_game, MoveQuality, SideTally, Tally};
pub use config::{AnalysisConfig, MatePolicy};
pub use engine::{EngineError, Evaluator, Line, Score, UciEngine};
pub use error::{Error, Result};
pub use parser::{parse_pgn_file, parse_pgn_string, read_game, PgnError, PgnGame};
