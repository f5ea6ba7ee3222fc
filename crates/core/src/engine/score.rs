//! Engine scores and the side they are expressed for

use shakmaty::Color;
use std::fmt;

/// A position evaluation, always relative to one side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawn advantage for `pov`
    Centipawns { cp: i32, pov: Color },
    /// Forced mate in `moves` (positive = `pov` is mating)
    Mate { moves: i32, pov: Color },
}

impl Score {
    pub fn cp(cp: i32, pov: Color) -> Self {
        Score::Centipawns { cp, pov }
    }

    pub fn mate(moves: i32, pov: Color) -> Self {
        Score::Mate { moves, pov }
    }

    pub fn pov(&self) -> Color {
        match *self {
            Score::Centipawns { pov, .. } | Score::Mate { pov, .. } => pov,
        }
    }

    pub fn is_mate(&self) -> bool {
        matches!(self, Score::Mate { .. })
    }

    /// Returns the same evaluation as seen by `side`.
    pub fn reorient(self, side: Color) -> Self {
        if self.pov() == side {
            return self;
        }
        match self {
            Score::Centipawns { cp, .. } => Score::Centipawns { cp: cp.saturating_neg(), pov: side },
            Score::Mate { moves, .. } => Score::Mate { moves: moves.saturating_neg(), pov: side },
        }
    }

    /// Centipawn value for `side`, or `None` for mate scores.
    pub fn centipawns_for(self, side: Color) -> Option<i32> {
        match self.reorient(side) {
            Score::Centipawns { cp, .. } => Some(cp),
            Score::Mate { .. } => None,
        }
    }

    /// True if this is a forced mate in favour of `side`.
    pub fn is_mate_for(self, side: Color) -> bool {
        matches!(self.reorient(side), Score::Mate { moves, .. } if moves > 0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Centipawns { cp, .. } => {
                let score = *cp as f32 / 100.0;
                if score >= 0.0 {
                    write!(f, "+{:.2}", score)
                } else {
                    write!(f, "{:.2}", score)
                }
            }
            Score::Mate { moves, .. } => write!(f, "M{}", moves),
        }
    }
}
