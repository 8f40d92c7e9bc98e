//! Core input types supplied by the caller
//!
//! These records are fetched by the upstream game-stats layer and handed to
//! the engine as-is. The engine only reads them.

use serde::{Deserialize, Serialize};

/// Clan membership reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClanRef {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub name: String,
}

/// Arena reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaRef {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

/// Point-in-time player profile as returned by the stats API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPlayerSnapshot {
    pub tag: String,
    pub name: String,
    pub trophies: u32,
    pub best_trophies: u32,
    pub wins: u32,
    pub losses: u32,
    pub battle_count: u32,
    pub three_crown_wins: u32,
    pub exp_level: u32,
    pub clan: Option<ClanRef>,
    pub arena: Option<ArenaRef>,
}

impl RawPlayerSnapshot {
    /// Player tag without the leading '#', upper-cased
    pub fn clean_tag(&self) -> String {
        clean_tag(&self.tag)
    }

    /// Total decided battles
    pub fn decided_battles(&self) -> u32 {
        self.wins.saturating_add(self.losses)
    }
}

/// Optional pre-battle hints about the player's deck and form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreBattleContext {
    /// Elixir cost of each card in the current deck
    pub deck_costs: Vec<f64>,
    /// Deck synergy score from upstream deck analysis (0-1)
    pub deck_synergy: Option<f64>,
    /// Elixir efficiency score from upstream analysis (0-1)
    pub elixir_efficiency: Option<f64>,
    /// Recent battle outcomes, most recent first (true = win)
    pub recent_results: Vec<bool>,
}

/// Single observation of an in-progress battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBattleContext {
    #[serde(alias = "elapsed")]
    pub elapsed_secs: i64,
    #[serde(alias = "time_remaining")]
    pub time_remaining_secs: i64,
    pub player_towers: u8,
    pub opponent_towers: u8,
    pub elixir_advantage: f64,
}

impl Default for RawBattleContext {
    fn default() -> Self {
        Self {
            elapsed_secs: 0,
            time_remaining_secs: 180,
            player_towers: 3,
            opponent_towers: 3,
            elixir_advantage: 0.0,
        }
    }
}

/// Normalize a player tag: strip '#' and upper-case
pub fn clean_tag(tag: &str) -> String {
    tag.replace('#', "").to_uppercase()
}
