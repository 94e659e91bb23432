//! Economic cycle: phase transitions and named economy events.
//!
//! Between rounds the engine advances the economic phase through a Markov
//! chain, lets named events (recession, financial crisis, ...) fire with a
//! phase-dependent chance, and rolls the market state forward: demand growth,
//! price-band inflation drift, and an FX random walk.

use crate::config::GameConfig;
use crate::market::{EconomicPhase, MarketState};
use crate::rng::StreamRng;
use log::{debug, info};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named economy events that modify the next market state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EconomyEvent {
    /// Broad demand contraction and falling confidence
    Recession,
    /// Credit squeeze: interest spikes, demand dips
    FinancialCrisis,
    /// Logistics shock: premium segments suffer, FX volatility rises
    SupplyDisruption,
    /// Technology-driven demand surge in premium segments
    TechBoom,
    /// Sustainability wave: the ESG premium strengthens
    GreenShift,
}

impl EconomyEvent {
    /// All event types
    pub fn all() -> Vec<EconomyEvent> {
        vec![
            EconomyEvent::Recession,
            EconomyEvent::FinancialCrisis,
            EconomyEvent::SupplyDisruption,
            EconomyEvent::TechBoom,
            EconomyEvent::GreenShift,
        ]
    }

    /// Wire name of this event
    pub fn as_str(&self) -> &str {
        match self {
            EconomyEvent::Recession => "recession",
            EconomyEvent::FinancialCrisis => "financial_crisis",
            EconomyEvent::SupplyDisruption => "supply_disruption",
            EconomyEvent::TechBoom => "tech_boom",
            EconomyEvent::GreenShift => "green_shift",
        }
    }

    /// Events that can fire in a given phase.
    fn candidates(phase: EconomicPhase) -> Vec<EconomyEvent> {
        match phase {
            EconomicPhase::Expansion => {
                vec![EconomyEvent::TechBoom, EconomyEvent::GreenShift, EconomyEvent::SupplyDisruption]
            },
            EconomicPhase::Peak => vec![
                EconomyEvent::FinancialCrisis,
                EconomyEvent::SupplyDisruption,
                EconomyEvent::TechBoom,
            ],
            EconomicPhase::Contraction => {
                vec![EconomyEvent::Recession, EconomyEvent::FinancialCrisis, EconomyEvent::SupplyDisruption]
            },
            EconomicPhase::Trough => {
                vec![EconomyEvent::Recession, EconomyEvent::GreenShift]
            },
        }
    }

    /// Applies this event's effects to the next market state.
    ///
    /// Severity is in [0, 1]; effects scale with it.
    pub fn apply(&self, market: &mut MarketState, severity: f64) {
        let severity = severity.clamp(0.0, 1.0);
        match self {
            EconomyEvent::Recession => {
                let drop = 0.10 + severity * 0.15;
                for demand in market.segments.values_mut() {
                    demand.total_demand *= 1.0 - drop;
                }
                market.macros.consumer_confidence =
                    (market.macros.consumer_confidence - 10.0 * severity).max(0.0);
                market.macros.unemployment = (market.macros.unemployment + 0.02 * severity).min(0.5);
            },
            EconomyEvent::FinancialCrisis => {
                market.interest_rate += 0.005 + 0.010 * severity;
                for demand in market.segments.values_mut() {
                    demand.total_demand *= 1.0 - 0.05 * severity;
                }
                market.macros.consumer_confidence =
                    (market.macros.consumer_confidence - 15.0 * severity).max(0.0);
            },
            EconomyEvent::SupplyDisruption => {
                market.fx_volatility = (market.fx_volatility * (1.0 + severity)).min(0.2);
                for (segment, demand) in market.segments.iter_mut() {
                    // Premium goods feel constrained supply hardest.
                    use crate::product::Segment;
                    let hit = match segment {
                        Segment::Professional | Segment::Enthusiast => 0.10 * severity,
                        _ => 0.04 * severity,
                    };
                    demand.total_demand *= 1.0 - hit;
                }
            },
            EconomyEvent::TechBoom => {
                use crate::product::Segment;
                for (segment, demand) in market.segments.iter_mut() {
                    let lift = match segment {
                        Segment::Enthusiast | Segment::Professional => 0.08 + 0.10 * severity,
                        _ => 0.02 * severity,
                    };
                    demand.total_demand *= 1.0 + lift;
                }
                market.pressures.quality_expectations =
                    (market.pressures.quality_expectations + 0.05 * severity).min(1.0);
            },
            EconomyEvent::GreenShift => {
                market.pressures.sustainability_premium =
                    (market.pressures.sustainability_premium + 0.10 * severity).min(1.0);
            },
        }
    }
}

impl fmt::Display for EconomyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Draws the next phase from the configured Markov matrix.
pub fn next_phase(current: EconomicPhase, config: &GameConfig, rng: &mut StreamRng) -> EconomicPhase {
    let row = &config.cycle.transition_matrix[current.index()];
    let roll = rng.next();
    let mut cumulative = 0.0;
    let phases = EconomicPhase::all();
    for (i, p) in row.iter().enumerate() {
        cumulative += p;
        if roll < cumulative {
            return phases[i];
        }
    }
    // Guard against rows summing to just under 1.0 in floating point.
    *phases.last().expect("phases non-empty")
}

/// Advances the market state by one round: phase, events, demand growth,
/// inflation drift, FX walk.
///
/// Returns the events fired this round.
pub fn advance_market(
    market: &mut MarketState,
    config: &GameConfig,
    rng: &mut StreamRng,
) -> Vec<EconomyEvent> {
    let previous_phase = market.phase;
    market.phase = next_phase(previous_phase, config, rng);
    if market.phase != previous_phase {
        info!("economic phase {} -> {}", previous_phase, market.phase);
    }

    // Named events.
    market.active_events.clear();
    let mut fired = Vec::new();
    let chance = config.cycle.event_chance.get(&market.phase).copied().unwrap_or(0.0);
    if rng.chance(chance) {
        let candidates = EconomyEvent::candidates(market.phase);
        if let Some(&event) = rng.pick(&candidates) {
            let severity = rng.range(0.3, 1.0);
            info!("economy event {} fired (severity {:.2})", event, severity);
            event.apply(market, severity);
            market.active_events.push(event.as_str().to_string());
            fired.push(event);
        }
    }

    // Demand growth under the phase modifier.
    let modifier = config.cycle.phase_demand_modifier.get(&market.phase).copied().unwrap_or(1.0);
    for demand in market.segments.values_mut() {
        demand.total_demand = (demand.total_demand * (1.0 + demand.growth_rate) * modifier).max(0.0);
        // Price bands drift with inflation.
        let inflation = market.macros.inflation;
        demand.price_min *= 1.0 + inflation;
        demand.price_max *= 1.0 + inflation;
    }

    // FX random walk, volatility-scaled.
    if market.fx_volatility > 0.0 {
        let normal = Normal::new(0.0, market.fx_volatility).expect("volatility is finite");
        for rate in market.fx_rates.values_mut() {
            let step: f64 = normal.sample(rng.raw());
            *rate = (*rate * (1.0 + step)).clamp(0.25, 4.0);
        }
    }

    // Confidence mean-reverts toward a phase-dependent anchor.
    let anchor = match market.phase {
        EconomicPhase::Expansion => 65.0,
        EconomicPhase::Peak => 70.0,
        EconomicPhase::Contraction => 45.0,
        EconomicPhase::Trough => 35.0,
    };
    market.macros.consumer_confidence += (anchor - market.macros.consumer_confidence) * 0.2;

    market.round += 1;
    debug!("market advanced to round {} ({})", market.round, market.phase);
    fired
}
