//! The shared market environment.
//!
//! [`MarketState`] is the environment every team competes in: per-segment
//! demand curves, macroeconomic indicators, FX rates, interest rates and the
//! current economic phase. It is immutable during a round and advanced only by
//! the round engine (via the economic cycle) between rounds.

use crate::product::Segment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum_macros::{EnumIter, EnumString};

/// Geographic regions, wire-exact.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
)]
pub enum Region {
    #[serde(rename = "North America")]
    #[strum(serialize = "North America")]
    NorthAmerica,
    Europe,
    Asia,
    #[serde(rename = "MENA")]
    #[strum(serialize = "MENA")]
    Mena,
}

impl Region {
    /// All regions in stable (wire) order.
    pub fn all() -> Vec<Region> {
        vec![Region::NorthAmerica, Region::Europe, Region::Asia, Region::Mena]
    }

    /// Wire-exact name of this region.
    pub fn as_str(&self) -> &str {
        match self {
            Region::NorthAmerica => "North America",
            Region::Europe => "Europe",
            Region::Asia => "Asia",
            Region::Mena => "MENA",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Phase of the economic cycle, advanced by a Markov chain between rounds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EconomicPhase {
    Expansion,
    Peak,
    Contraction,
    Trough,
}

impl EconomicPhase {
    /// All phases in Markov-matrix row/column order.
    pub fn all() -> Vec<EconomicPhase> {
        vec![
            EconomicPhase::Expansion,
            EconomicPhase::Peak,
            EconomicPhase::Contraction,
            EconomicPhase::Trough,
        ]
    }

    /// Index of this phase into the transition matrix.
    pub fn index(&self) -> usize {
        match self {
            EconomicPhase::Expansion => 0,
            EconomicPhase::Peak => 1,
            EconomicPhase::Contraction => 2,
            EconomicPhase::Trough => 3,
        }
    }
}

impl fmt::Display for EconomicPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EconomicPhase::Expansion => "expansion",
            EconomicPhase::Peak => "peak",
            EconomicPhase::Contraction => "contraction",
            EconomicPhase::Trough => "trough",
        };
        write!(f, "{}", name)
    }
}

/// Demand curve for one consumer segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentDemand {
    /// Total units demanded this round
    pub total_demand: f64,
    /// Lower bound of the accepted price range
    pub price_min: f64,
    /// Upper bound of the accepted price range
    pub price_max: f64,
    /// Per-round demand growth rate (before phase modifiers)
    pub growth_rate: f64,
}

/// Macroeconomic indicators published with the market state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroIndicators {
    /// GDP growth rate per round
    pub gdp_growth: f64,
    /// Inflation rate per round
    pub inflation: f64,
    /// Consumer confidence index, 0-100
    pub consumer_confidence: f64,
    /// Unemployment rate, 0-1
    pub unemployment: f64,
}

/// Competitive pressures that tilt the playing field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketPressures {
    /// Strength of price competition, 0-1
    pub price_competition: f64,
    /// How demanding consumers are about quality, 0-1
    pub quality_expectations: f64,
    /// Premium consumers place on sustainable brands, 0-1
    pub sustainability_premium: f64,
}

/// The shared competitive environment for one upcoming round.
///
/// Created once at game start and then mutated exclusively by the round
/// engine between rounds. During a round every team reads the same frozen
/// `MarketState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketState {
    /// The round this state applies to (the *upcoming* round)
    pub round: u32,
    /// Per-segment demand curves
    pub segments: BTreeMap<Segment, SegmentDemand>,
    /// Macro indicators
    pub macros: MacroIndicators,
    /// FX rate per region, home-currency units per foreign unit (home = 1.0)
    pub fx_rates: BTreeMap<Region, f64>,
    /// Volatility of the FX random walk
    pub fx_volatility: f64,
    /// Prevailing base interest rate per round
    pub interest_rate: f64,
    /// Competitive pressures
    pub pressures: MarketPressures,
    /// Current phase of the economic cycle
    pub phase: EconomicPhase,
    /// Names of economy events active this round (e.g. "recession")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_events: Vec<String>,
    /// Unknown fields from newer snapshots, preserved opaquely
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MarketState {
    /// Total demand across all segments.
    pub fn total_demand(&self) -> f64 {
        self.segments.values().map(|d| d.total_demand).sum()
    }

    /// Demand curve for one segment, if the segment is open.
    pub fn segment(&self, segment: Segment) -> Option<&SegmentDemand> {
        self.segments.get(&segment)
    }
}
