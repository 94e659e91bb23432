//! Achievement hook: predicate observation over state transitions.
//!
//! The engine does not know any achievement content; predicates arrive as
//! external data. After each round the observer evaluates every predicate
//! against every team and reports the diff: predicates newly met and newly
//! failed since the previous round.

use crate::team::TeamState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum_macros::EnumString;

/// Metrics a predicate can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    Cash,
    Revenue,
    NetIncome,
    BrandValue,
    EsgScore,
    SharePrice,
    MarketCap,
    Eps,
    TotalMarketShare,
    FactoryCount,
    ProductCount,
    PatentCount,
    TechUnlockCount,
}

impl Metric {
    /// Reads this metric off a team snapshot.
    pub fn read(&self, state: &TeamState) -> f64 {
        match self {
            Metric::Cash => state.cash,
            Metric::Revenue => state.revenue,
            Metric::NetIncome => state.net_income,
            Metric::BrandValue => state.brand_value,
            Metric::EsgScore => state.esg_score,
            Metric::SharePrice => state.share_price,
            Metric::MarketCap => state.market_cap,
            Metric::Eps => state.eps,
            Metric::TotalMarketShare => state.market_share.values().sum(),
            Metric::FactoryCount => state.factories.len() as f64,
            Metric::ProductCount => state.products.len() as f64,
            Metric::PatentCount => state.patents.len() as f64,
            Metric::TechUnlockCount => state.tech.unlocked.len() as f64,
        }
    }
}

/// Comparison direction of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Comparator {
    AtLeast,
    AtMost,
}

/// One externally defined achievement predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Predicate {
    /// Stable predicate id (achievement catalogues key on this)
    pub id: String,
    pub metric: Metric,
    pub comparator: Comparator,
    pub threshold: f64,
}

impl Predicate {
    /// Whether a team snapshot satisfies this predicate.
    pub fn is_met(&self, state: &TeamState) -> bool {
        let value = self.metric.read(state);
        match self.comparator {
            Comparator::AtLeast => value >= self.threshold,
            Comparator::AtMost => value <= self.threshold,
        }
    }
}

/// Diff of predicate states for one team after one round.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AchievementDiff {
    pub team_id: String,
    /// Predicate ids satisfied now but not before
    pub newly_met: Vec<String>,
    /// Predicate ids satisfied before but not now
    pub newly_failed: Vec<String>,
}

impl AchievementDiff {
    pub fn is_empty(&self) -> bool {
        self.newly_met.is_empty() && self.newly_failed.is_empty()
    }
}

/// Observes predicate transitions across rounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AchievementObserver {
    predicates: Vec<Predicate>,
    /// Previously met predicate ids, per team
    met: BTreeMap<String, BTreeSet<String>>,
}

impl AchievementObserver {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        AchievementObserver { predicates, met: BTreeMap::new() }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Evaluates all predicates for the given teams and returns the diffs,
    /// one entry per team with any transition. Teams are visited in the
    /// order given; callers pass them sorted by id.
    pub fn observe(&mut self, teams: &[&TeamState]) -> Vec<AchievementDiff> {
        let mut diffs = Vec::new();
        for team in teams {
            let now: BTreeSet<String> = self
                .predicates
                .iter()
                .filter(|p| p.is_met(team))
                .map(|p| p.id.clone())
                .collect();
            let before = self.met.entry(team.id.clone()).or_default();
            let newly_met: Vec<String> = now.difference(before).cloned().collect();
            let newly_failed: Vec<String> = before.difference(&now).cloned().collect();
            *before = now;
            if !newly_met.is_empty() || !newly_failed.is_empty() {
                diffs.push(AchievementDiff { team_id: team.id.clone(), newly_met, newly_failed });
            }
        }
        diffs
    }
}
