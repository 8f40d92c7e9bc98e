//! Feature extraction
//!
//! Turns raw player and battle records into a fixed-schema [`FeatureSet`].
//! Extraction is pure: the same input always yields the same features.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::config::FeatureConfig;
use crate::error::{PredictorError, Result};
use crate::types::{PreBattleContext, RawBattleContext, RawPlayerSnapshot};

/// Named features, in stable vector order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    WinRate,
    TrophyFactor,
    DeckSynergyScore,
    ElixirEfficiency,
    OpponentCounterScore,
    SkillRating,
    RecentWinRate,
    AverageElixirCost,
    ThreeCrownRate,
    ExperienceFactor,
    TowerBalance,
    TimeRemainingFactor,
    ElixirBalance,
}

impl FeatureKey {
    /// Every key, in vector order. Appending keys requires a new layout version.
    pub const ALL: [FeatureKey; 13] = [
        FeatureKey::WinRate,
        FeatureKey::TrophyFactor,
        FeatureKey::DeckSynergyScore,
        FeatureKey::ElixirEfficiency,
        FeatureKey::OpponentCounterScore,
        FeatureKey::SkillRating,
        FeatureKey::RecentWinRate,
        FeatureKey::AverageElixirCost,
        FeatureKey::ThreeCrownRate,
        FeatureKey::ExperienceFactor,
        FeatureKey::TowerBalance,
        FeatureKey::TimeRemainingFactor,
        FeatureKey::ElixirBalance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKey::WinRate => "win_rate",
            FeatureKey::TrophyFactor => "trophy_factor",
            FeatureKey::DeckSynergyScore => "deck_synergy_score",
            FeatureKey::ElixirEfficiency => "elixir_efficiency",
            FeatureKey::OpponentCounterScore => "opponent_counter_score",
            FeatureKey::SkillRating => "skill_rating",
            FeatureKey::RecentWinRate => "recent_win_rate",
            FeatureKey::AverageElixirCost => "average_elixir_cost",
            FeatureKey::ThreeCrownRate => "three_crown_rate",
            FeatureKey::ExperienceFactor => "experience_factor",
            FeatureKey::TowerBalance => "tower_balance",
            FeatureKey::TimeRemainingFactor => "time_remaining_factor",
            FeatureKey::ElixirBalance => "elixir_balance",
        }
    }
}

/// Versioned feature-to-vector ordering shared with learned models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLayout;

impl FeatureLayout {
    pub const VERSION: &'static str = "fs-v1";

    pub fn width() -> usize {
        FeatureKey::ALL.len()
    }

    /// Hex SHA-256 over the version and ordered key names
    pub fn fingerprint() -> String {
        let mut hasher = Sha256::new();
        hasher.update(Self::VERSION.as_bytes());
        for key in FeatureKey::ALL {
            hasher.update(b"|");
            hasher.update(key.as_str().as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Fixed mapping of named numeric features
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet {
    values: BTreeMap<FeatureKey, f64>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: FeatureKey, value: f64) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: FeatureKey, value: f64) {
        self.values.insert(key, value);
    }

    /// Value for `key`, or 0.0 when absent
    pub fn get(&self, key: FeatureKey) -> f64 {
        self.values.get(&key).copied().unwrap_or(0.0)
    }

    /// Value for `key`, failing when it is absent or not finite
    pub fn require(&self, key: FeatureKey) -> Result<f64> {
        match self.values.get(&key) {
            Some(v) if v.is_finite() => Ok(*v),
            _ => Err(PredictorError::FeatureSetInvalid {
                key: key.as_str().to_string(),
            }),
        }
    }

    pub fn contains(&self, key: FeatureKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Fill every absent key with 0.0
    pub fn fill_defaults(mut self) -> Self {
        for key in FeatureKey::ALL {
            self.values.entry(key).or_insert(0.0);
        }
        self
    }

    /// Check that every key is present with a finite value
    pub fn validate(&self) -> Result<()> {
        for key in FeatureKey::ALL {
            self.require(key)?;
        }
        Ok(())
    }

    /// Values in [`FeatureLayout`] order
    pub fn to_vector(&self) -> Vec<f64> {
        FeatureKey::ALL.iter().map(|k| self.get(*k)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureKey, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

/// Builds feature sets from raw records
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FeatureConfig::default())
    }

    /// Pre-battle features from a player snapshot
    pub fn extract(
        &self,
        player: &RawPlayerSnapshot,
        opponent: Option<&RawPlayerSnapshot>,
        context: Option<&PreBattleContext>,
    ) -> FeatureSet {
        let neutral = self.config.neutral_score;

        let win_rate = win_rate(player);
        let trophy_factor = self.trophy_factor(player.trophies);
        let experience = self.experience_factor(player.exp_level);
        let skill = self.skill_rating(player);

        let opponent_counter = match opponent {
            Some(opp) => (0.5 + (skill - self.skill_rating(opp)) / 2.0).clamp(0.0, 1.0),
            None => neutral,
        };

        let deck_synergy = context
            .and_then(|c| c.deck_synergy)
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(neutral);

        let elixir_efficiency = context
            .and_then(|c| c.elixir_efficiency)
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(neutral);

        let average_elixir_cost = context
            .and_then(|c| average(&c.deck_costs))
            .unwrap_or(self.config.neutral_elixir_cost);

        let recent_win_rate = context
            .filter(|c| !c.recent_results.is_empty())
            .map(|c| {
                let wins = c.recent_results.iter().filter(|won| **won).count();
                wins as f64 / c.recent_results.len() as f64
            })
            .unwrap_or(win_rate);

        let three_crown_rate =
            (player.three_crown_wins as f64 / player.wins.max(1) as f64).clamp(0.0, 1.0);

        FeatureSet::new()
            .with(FeatureKey::WinRate, win_rate)
            .with(FeatureKey::TrophyFactor, trophy_factor)
            .with(FeatureKey::DeckSynergyScore, deck_synergy)
            .with(FeatureKey::ElixirEfficiency, elixir_efficiency)
            .with(FeatureKey::OpponentCounterScore, opponent_counter)
            .with(FeatureKey::SkillRating, skill)
            .with(FeatureKey::RecentWinRate, recent_win_rate)
            .with(FeatureKey::AverageElixirCost, average_elixir_cost)
            .with(FeatureKey::ThreeCrownRate, three_crown_rate)
            .with(FeatureKey::ExperienceFactor, experience)
            .with(FeatureKey::TowerBalance, 0.5)
            .with(FeatureKey::TimeRemainingFactor, 1.0)
            .with(FeatureKey::ElixirBalance, 0.5)
    }

    /// Live features from a single battle observation
    ///
    /// The live call carries no player profile, so career-derived features
    /// sit at the neutral midpoint and only the battle state moves.
    pub fn extract_live(&self, player_tag: &str, battle: &RawBattleContext) -> FeatureSet {
        let neutral = self.config.neutral_score;

        let player_towers = battle.player_towers.min(3) as f64;
        let opponent_towers = battle.opponent_towers.min(3) as f64;
        let tower_balance = 0.5 + (player_towers - opponent_towers) / 6.0;

        let time_remaining =
            (battle.time_remaining_secs as f64 / self.config.battle_length_secs).clamp(0.0, 1.0);

        let elixir_advantage = if battle.elixir_advantage.is_finite() {
            battle.elixir_advantage
        } else {
            0.0
        };
        let elixir_balance =
            (0.5 + elixir_advantage / (2.0 * self.config.max_elixir_advantage)).clamp(0.0, 1.0);

        tracing::trace!(
            "{}: towers {}/{} remaining {}s",
            player_tag,
            player_towers,
            opponent_towers,
            battle.time_remaining_secs
        );

        FeatureSet::new()
            .with(FeatureKey::WinRate, neutral)
            .with(FeatureKey::TrophyFactor, neutral)
            .with(FeatureKey::DeckSynergyScore, neutral)
            .with(FeatureKey::ElixirEfficiency, elixir_balance)
            .with(FeatureKey::OpponentCounterScore, neutral)
            .with(FeatureKey::SkillRating, neutral)
            .with(FeatureKey::RecentWinRate, neutral)
            .with(FeatureKey::AverageElixirCost, self.config.neutral_elixir_cost)
            .with(FeatureKey::ThreeCrownRate, 0.0)
            .with(FeatureKey::ExperienceFactor, neutral)
            .with(FeatureKey::TowerBalance, tower_balance)
            .with(FeatureKey::TimeRemainingFactor, time_remaining)
            .with(FeatureKey::ElixirBalance, elixir_balance)
    }

    fn trophy_factor(&self, trophies: u32) -> f64 {
        (trophies as f64 / self.config.trophy_cap).min(1.0)
    }

    fn experience_factor(&self, exp_level: u32) -> f64 {
        (exp_level as f64 / self.config.exp_level_cap).min(1.0)
    }

    /// Blend of ladder standing, career win rate and account experience
    fn skill_rating(&self, player: &RawPlayerSnapshot) -> f64 {
        0.5 * self.trophy_factor(player.trophies)
            + 0.3 * win_rate(player)
            + 0.2 * self.experience_factor(player.exp_level)
    }
}

fn win_rate(player: &RawPlayerSnapshot) -> f64 {
    player.wins as f64 / player.decided_battles().max(1) as f64
}

fn average(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f64>() / finite.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(wins: u32, losses: u32, trophies: u32) -> RawPlayerSnapshot {
        RawPlayerSnapshot {
            tag: "#ABC123".to_string(),
            wins,
            losses,
            trophies,
            exp_level: 14,
            ..Default::default()
        }
    }

    #[test]
    fn test_win_rate_and_trophy_factor() {
        let extractor = FeatureExtractor::with_defaults();
        let features = extractor.extract(&player(70, 30, 5000), None, None);

        assert!((features.get(FeatureKey::WinRate) - 0.7).abs() < 1e-9);
        assert!((features.get(FeatureKey::TrophyFactor) - 5000.0 / 6000.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_battles_does_not_divide_by_zero() {
        let extractor = FeatureExtractor::with_defaults();
        let features = extractor.extract(&player(0, 0, 0), None, None);

        assert_eq!(features.get(FeatureKey::WinRate), 0.0);
        assert_eq!(features.get(FeatureKey::ThreeCrownRate), 0.0);
        assert!(features.validate().is_ok());
    }

    #[test]
    fn test_trophy_factor_caps_at_one() {
        let extractor = FeatureExtractor::with_defaults();
        let features = extractor.extract(&player(10, 10, 9000), None, None);
        assert_eq!(features.get(FeatureKey::TrophyFactor), 1.0);
    }

    #[test]
    fn test_missing_data_uses_neutral_midpoint() {
        let extractor = FeatureExtractor::with_defaults();
        let features = extractor.extract(&player(10, 40, 1000), None, None);

        assert_eq!(features.get(FeatureKey::DeckSynergyScore), 0.5);
        assert_eq!(features.get(FeatureKey::OpponentCounterScore), 0.5);
        assert_eq!(features.get(FeatureKey::ElixirEfficiency), 0.5);
        assert_eq!(features.get(FeatureKey::AverageElixirCost), 3.5);
        // Falls back to career win rate
        assert!((features.get(FeatureKey::RecentWinRate) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_context_overrides_neutral_values() {
        let extractor = FeatureExtractor::with_defaults();
        let context = PreBattleContext {
            deck_costs: vec![2.0, 3.0, 4.0, 5.0],
            deck_synergy: Some(1.4),
            elixir_efficiency: Some(0.8),
            recent_results: vec![true, true, false, true],
        };
        let features = extractor.extract(&player(10, 10, 3000), None, Some(&context));

        assert_eq!(features.get(FeatureKey::DeckSynergyScore), 1.0);
        assert_eq!(features.get(FeatureKey::ElixirEfficiency), 0.8);
        assert_eq!(features.get(FeatureKey::AverageElixirCost), 3.5);
        assert_eq!(features.get(FeatureKey::RecentWinRate), 0.75);
    }

    #[test]
    fn test_opponent_counter_score_favors_stronger_player() {
        let extractor = FeatureExtractor::with_defaults();
        let strong = player(80, 20, 6000);
        let weak = RawPlayerSnapshot {
            exp_level: 5,
            ..player(20, 80, 1000)
        };

        let ahead = extractor.extract(&strong, Some(&weak), None);
        let behind = extractor.extract(&weak, Some(&strong), None);

        assert!(ahead.get(FeatureKey::OpponentCounterScore) > 0.5);
        assert!(behind.get(FeatureKey::OpponentCounterScore) < 0.5);
    }

    #[test]
    fn test_extraction_is_pure() {
        let extractor = FeatureExtractor::with_defaults();
        let p = player(55, 45, 4200);
        assert_eq!(extractor.extract(&p, None, None), extractor.extract(&p, None, None));
    }

    #[test]
    fn test_live_features() {
        let extractor = FeatureExtractor::with_defaults();
        let battle = RawBattleContext {
            elapsed_secs: 90,
            time_remaining_secs: 90,
            player_towers: 3,
            opponent_towers: 1,
            elixir_advantage: 2.5,
        };
        let features = extractor.extract_live("ABC123", &battle);

        assert!((features.get(FeatureKey::TowerBalance) - (0.5 + 2.0 / 6.0)).abs() < 1e-9);
        assert_eq!(features.get(FeatureKey::TimeRemainingFactor), 0.5);
        assert_eq!(features.get(FeatureKey::ElixirBalance), 0.75);
        assert!(features.validate().is_ok());
    }

    #[test]
    fn test_live_features_clamp_bad_counts() {
        let extractor = FeatureExtractor::with_defaults();
        let battle = RawBattleContext {
            time_remaining_secs: -30,
            player_towers: 9,
            opponent_towers: 0,
            elixir_advantage: f64::NAN,
            ..Default::default()
        };
        let features = extractor.extract_live("ABC123", &battle);

        assert_eq!(features.get(FeatureKey::TowerBalance), 1.0);
        assert_eq!(features.get(FeatureKey::TimeRemainingFactor), 0.0);
        assert_eq!(features.get(FeatureKey::ElixirBalance), 0.5);
    }

    #[test]
    fn test_require_reports_missing_key() {
        let features = FeatureSet::new().with(FeatureKey::WinRate, 0.5);
        let err = features.require(FeatureKey::TrophyFactor).unwrap_err();
        assert_eq!(
            err,
            PredictorError::FeatureSetInvalid {
                key: "trophy_factor".to_string()
            }
        );
        assert!(features.fill_defaults().validate().is_ok());
    }

    #[test]
    fn test_vector_layout_is_stable() {
        let extractor = FeatureExtractor::with_defaults();
        let features = extractor.extract(&player(70, 30, 5000), None, None);

        let v1 = features.to_vector();
        let v2 = features.clone().to_vector();
        assert_eq!(v1, v2);
        assert_eq!(v1.len(), FeatureLayout::width());
        assert_eq!(v1[0], features.get(FeatureKey::WinRate));
        assert_eq!(v1[7], features.get(FeatureKey::AverageElixirCost));
    }

    #[test]
    fn test_layout_fingerprint() {
        let fp = FeatureLayout::fingerprint();
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, FeatureLayout::fingerprint());
    }
}
