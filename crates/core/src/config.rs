//! Analysis configuration
//!
//! Thresholds, engine location and per-move time budget. Loaded from a
//! TOML file or built from defaults and overridden by the caller.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_ENGINE_PATH: &str = "/usr/local/bin/stockfish";

/// Who gets charged when a forced mate appears or disappears.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatePolicy {
    /// Any mate transition is a blunder by the side that just moved.
    #[default]
    AnyTransition,
    /// Only charge the mover when the lost mate was theirs, or the new mate is
    /// against them.
    OpponentOnly,
}

impl std::str::FromStr for MatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "any_transition" | "any-transition" => Ok(MatePolicy::AnyTransition),
            "opponent_only" | "opponent-only" => Ok(MatePolicy::OpponentOnly),
            other => Err(Error::Config(format!("unknown mate policy '{}'", other))),
        }
    }
}

/// Settings for a single analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Centipawn loss above which a move is an inaccuracy
    pub inaccuracy_threshold: i32,
    /// Centipawn loss above which a move is a mistake
    pub mistake_threshold: i32,
    /// Centipawn loss above which a move is a blunder
    pub blunder_threshold: i32,
    /// Engine thinking time per position, in seconds
    pub move_time_secs: f64,
    /// Path to a UCI engine binary
    pub engine_path: PathBuf,
    pub mate_policy: MatePolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            inaccuracy_threshold: 50,
            mistake_threshold: 100,
            blunder_threshold: 200,
            move_time_secs: 0.3,
            engine_path: PathBuf::from(DEFAULT_ENGINE_PATH),
            mate_policy: MatePolicy::AnyTransition,
        }
    }
}

impl AnalysisConfig {
    /// Reads a TOML config file. Missing keys fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that thresholds are ordered and the time budget is usable.
    pub fn validate(&self) -> Result<()> {
        if self.inaccuracy_threshold < 0 {
            return Err(Error::Config(format!(
                "inaccuracy_threshold must be non-negative, got {}",
                self.inaccuracy_threshold
            )));
        }
        if self.inaccuracy_threshold >= self.mistake_threshold
            || self.mistake_threshold >= self.blunder_threshold
        {
            return Err(Error::Config(format!(
                "thresholds must be strictly increasing, got {} / {} / {}",
                self.inaccuracy_threshold, self.mistake_threshold, self.blunder_threshold
            )));
        }
        if !self.move_time_secs.is_finite() || self.move_time_secs <= 0.0 {
            return Err(Error::Config(format!(
                "move_time_secs must be positive, got {}",
                self.move_time_secs
            )));
        }
        Ok(())
    }

    pub fn move_time(&self) -> Duration {
        Duration::from_secs_f64(self.move_time_secs)
    }
}
