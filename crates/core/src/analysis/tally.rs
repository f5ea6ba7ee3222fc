//! Per-side counts of inaccuracies, mistakes and blunders

use serde::{Deserialize, Serialize};
use shakmaty::Color;
use std::fmt;

use super::quality::MoveQuality;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideTally {
    pub inaccuracies: u32,
    pub mistakes: u32,
    pub blunders: u32,
}

impl SideTally {
    pub fn total(&self) -> u32 {
        self.inaccuracies + self.mistakes + self.blunders
    }
}

/// Counts for both sides of one game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub white: SideTally,
    pub black: SideTally,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, side: Color) -> &SideTally {
        match side {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn get_mut(&mut self, side: Color) -> &mut SideTally {
        match side {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    pub fn record(&mut self, side: Color, quality: MoveQuality) {
        let counts = self.get_mut(side);
        match quality {
            MoveQuality::Inaccuracy => counts.inaccuracies += 1,
            MoveQuality::Mistake => counts.mistakes += 1,
            MoveQuality::Blunder => counts.blunders += 1,
        }
    }

    pub fn total(&self, side: Color) -> u32 {
        self.get(side).total()
    }
}

impl fmt::Display for SideTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inaccuracies, {} mistakes, {} blunders",
            self.inaccuracies, self.mistakes, self.blunders
        )
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "White: {} | Black: {}", self.white, self.black)
    }
}
