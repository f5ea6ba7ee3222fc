//! Move quality buckets

use crate::config::AnalysisConfig;

/// How bad a move was. Acceptable moves have no quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveQuality {
    /// Loss above the inaccuracy threshold
    Inaccuracy,
    /// Loss above the mistake threshold
    Mistake,
    /// Loss above the blunder threshold
    Blunder,
}

impl MoveQuality {
    /// Buckets a centipawn loss. Thresholds are exclusive lower bounds, so a
    /// loss equal to a threshold falls in the milder bucket.
    pub fn from_loss(loss: i32, config: &AnalysisConfig) -> Option<Self> {
        match loss {
            l if l > config.blunder_threshold => Some(MoveQuality::Blunder),
            l if l > config.mistake_threshold => Some(MoveQuality::Mistake),
            l if l > config.inaccuracy_threshold => Some(MoveQuality::Inaccuracy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoveQuality::Inaccuracy => "inaccuracy",
            MoveQuality::Mistake => "mistake",
            MoveQuality::Blunder => "blunder",
        }
    }
}
