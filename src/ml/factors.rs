//! Factor attribution
//!
//! Describes which inputs carry the most weight in a feature set. This is a
//! normalized view of the inputs, not a sensitivity analysis of the scorer,
//! so it is identical for every backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::features::{FeatureKey, FeatureSet};

/// Named contributing factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    DeckSynergy,
    ElixirEfficiency,
    OpponentCounter,
    PlayerSkill,
    RecentPerformance,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::DeckSynergy,
        Factor::ElixirEfficiency,
        Factor::OpponentCounter,
        Factor::PlayerSkill,
        Factor::RecentPerformance,
    ];

    /// Feature the factor reads its signal from
    pub fn source(&self) -> FeatureKey {
        match self {
            Factor::DeckSynergy => FeatureKey::DeckSynergyScore,
            Factor::ElixirEfficiency => FeatureKey::ElixirEfficiency,
            Factor::OpponentCounter => FeatureKey::OpponentCounterScore,
            Factor::PlayerSkill => FeatureKey::SkillRating,
            Factor::RecentPerformance => FeatureKey::RecentWinRate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::DeckSynergy => "deck_synergy",
            Factor::ElixirEfficiency => "elixir_efficiency",
            Factor::OpponentCounter => "opponent_counter",
            Factor::PlayerSkill => "player_skill",
            Factor::RecentPerformance => "recent_performance",
        }
    }
}

/// Normalized factor weights: non-negative, summing to 1 or all zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorWeights {
    weights: BTreeMap<Factor, f64>,
}

impl FactorWeights {
    pub fn get(&self, factor: Factor) -> f64 {
        self.weights.get(&factor).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.weights.values().all(|w| *w == 0.0)
    }

    /// Largest factor; ties go to the earlier factor. None when all zero.
    pub fn dominant(&self) -> Option<Factor> {
        let mut best: Option<(Factor, f64)> = None;
        for factor in Factor::ALL {
            let weight = self.get(factor);
            if weight > best.map(|(_, w)| w).unwrap_or(0.0) {
                best = Some((factor, weight));
            }
        }
        best.map(|(f, _)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        self.weights.iter().map(|(f, w)| (*f, *w))
    }
}

/// Decompose a feature set into the five named factor weights
pub fn attribute(features: &FeatureSet) -> FactorWeights {
    let raw: Vec<(Factor, f64)> = Factor::ALL
        .iter()
        .map(|f| {
            let value = features.get(f.source());
            (*f, if value.is_finite() { value.abs() } else { 0.0 })
        })
        .collect();

    let total: f64 = raw.iter().map(|(_, v)| v).sum();

    let weights = raw
        .into_iter()
        .map(|(f, v)| (f, if total > 0.0 { v / total } else { 0.0 }))
        .collect();

    FactorWeights { weights }
}
