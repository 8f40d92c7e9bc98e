//! Battle phase classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse temporal bucket of an in-progress battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    /// More than two minutes left
    EarlyGame,
    /// 61-120 seconds left
    MidGame,
    /// 1-60 seconds left
    LateGame,
    /// Regulation time exhausted
    Overtime,
}

impl BattlePhase {
    pub const ALL: [BattlePhase; 4] = [
        BattlePhase::EarlyGame,
        BattlePhase::MidGame,
        BattlePhase::LateGame,
        BattlePhase::Overtime,
    ];

    /// Classify by seconds remaining
    pub fn classify(time_remaining_secs: i64) -> Self {
        match time_remaining_secs {
            t if t > 120 => BattlePhase::EarlyGame,
            t if t > 60 => BattlePhase::MidGame,
            t if t > 0 => BattlePhase::LateGame,
            _ => BattlePhase::Overtime,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BattlePhase::EarlyGame => "early_game",
            BattlePhase::MidGame => "mid_game",
            BattlePhase::LateGame => "late_game",
            BattlePhase::Overtime => "overtime",
        }
    }
}

impl fmt::Display for BattlePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
