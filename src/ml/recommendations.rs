//! Strategic recommendations
//!
//! Deterministic advice keyed on win probability, deck shape and, for live
//! battles, the current phase and tower count.

use super::features::{FeatureKey, FeatureSet};
use super::phase::BattlePhase;
use crate::config::RecommendationConfig;

pub const DEFENSIVE_STRATEGY: &str = "Consider a more defensive strategy";
pub const POSITIVE_TRADES: &str = "Focus on positive elixir trades";
pub const LOW_SYNERGY: &str = "Your deck synergy is low - consider card substitutions";
pub const MAINTAIN_PRESSURE: &str = "You have a strong advantage - maintain pressure";
pub const TAKE_TOWERS: &str = "Look for opportunities to take towers";
pub const BALANCED_MATCH: &str = "Match is balanced - adapt to opponent's strategy";
pub const MONITOR_ELIXIR: &str = "Monitor elixir carefully";
pub const HEAVY_DECK: &str = "Heavy deck - be patient with elixir management";
pub const CYCLE_DECK: &str = "Fast cycle deck - maintain constant pressure";

pub const SCOUT_DECK: &str = "Focus on learning opponent's deck";
pub const EARLY_TRADES: &str = "Make positive elixir trades";
pub const BUILD_PUSH: &str = "Build a strong push";
pub const DEFEND_COUNTER: &str = "Defend and counter-attack";
pub const PROTECT_LEAD: &str = "Play defensively - protect your lead";
pub const GO_AGGRESSIVE: &str = "Time for aggressive plays";
pub const HIGH_RISK: &str = "High-risk, high-reward plays";
pub const TOWER_DAMAGE: &str = "Focus on tower damage";
pub const ELIXIR_REMINDER: &str = "Watch your elixir management";

const LOW_PROBABILITY: f64 = 0.4;
const HIGH_PROBABILITY: f64 = 0.7;
const PUSH_PROBABILITY: f64 = 0.6;
const LOW_SYNERGY_THRESHOLD: f64 = 0.5;
const HEAVY_DECK_COST: f64 = 4.0;
const CYCLE_DECK_COST: f64 = 3.0;

/// Produces ordered advice lists
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    max_items: usize,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(RecommendationConfig::default())
    }
}

impl RecommendationEngine {
    pub fn new(config: RecommendationConfig) -> Self {
        Self {
            max_items: config.max_items.clamp(1, 3),
        }
    }

    /// Snapshot advice when `phase` is None, live advice otherwise
    pub fn recommend(
        &self,
        features: &FeatureSet,
        probability: f64,
        phase: Option<BattlePhase>,
    ) -> Vec<String> {
        let mut items = match phase {
            None => self.snapshot(features, probability),
            Some(phase) => self.live(features, probability, phase),
        };
        items.truncate(self.max_items);
        items.into_iter().map(str::to_string).collect()
    }

    fn snapshot(&self, features: &FeatureSet, probability: f64) -> Vec<&'static str> {
        let mut items = Vec::new();

        if probability < LOW_PROBABILITY {
            items.push(DEFENSIVE_STRATEGY);
            if features.get(FeatureKey::DeckSynergyScore) < LOW_SYNERGY_THRESHOLD {
                items.push(LOW_SYNERGY);
            }
            items.push(POSITIVE_TRADES);
        } else if probability > HIGH_PROBABILITY {
            items.push(MAINTAIN_PRESSURE);
            items.push(TAKE_TOWERS);
        } else {
            items.push(BALANCED_MATCH);
            items.push(MONITOR_ELIXIR);
        }

        let elixir_cost = features.get(FeatureKey::AverageElixirCost);
        if elixir_cost > HEAVY_DECK_COST {
            items.push(HEAVY_DECK);
        } else if elixir_cost < CYCLE_DECK_COST {
            items.push(CYCLE_DECK);
        }

        items
    }

    fn live(&self, features: &FeatureSet, probability: f64, phase: BattlePhase) -> Vec<&'static str> {
        let mut items = match phase {
            BattlePhase::EarlyGame => vec![SCOUT_DECK, EARLY_TRADES],
            BattlePhase::MidGame => {
                if probability > PUSH_PROBABILITY {
                    vec![BUILD_PUSH]
                } else {
                    vec![DEFEND_COUNTER]
                }
            }
            BattlePhase::LateGame => {
                // Tower balance is above 0.5 only when more of our towers stand
                if features.get(FeatureKey::TowerBalance) > 0.5 {
                    vec![PROTECT_LEAD]
                } else {
                    vec![GO_AGGRESSIVE]
                }
            }
            BattlePhase::Overtime => vec![HIGH_RISK, TOWER_DAMAGE],
        };

        // Keep room for the reminder
        items.truncate(self.max_items.saturating_sub(1).max(1));
        items.push(ELIXIR_REMINDER);
        items
    }
}
