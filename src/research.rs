//! R&D: research projects, product development, patents.
//!
//! The research pass starts projects (prerequisites permitting), advances
//! running projects with risk-dependent delay and cost-overrun draws,
//! unlocks tech effects with spillover into adjacent segments, advances
//! product development, and collects patent licensing fees.

use crate::config::GameConfig;
use crate::decisions::ResearchDecision;
use crate::hr::{effective_headcount, Role};
use crate::module::{LedgerDelta, ModuleKind, ModuleOutcome, StateChange, Warning};
use crate::product::{DevelopmentStatus, Product, Segment};
use crate::rng::StreamRng;
use crate::team::TeamState;
use crate::techtree::{TechEffect, TechTree};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use strum_macros::{EnumIter, EnumString};

/// Risk appetite of one research project.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Conservative,
    Moderate,
    Aggressive,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskLevel::Conservative => "conservative",
            RiskLevel::Moderate => "moderate",
            RiskLevel::Aggressive => "aggressive",
        };
        write!(f, "{}", name)
    }
}

/// One running research project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveResearch {
    pub tech_id: String,
    pub risk: RiskLevel,
    pub rounds_remaining: u32,
    /// Cumulative overrun charges so far
    pub cost_overrun: f64,
}

/// A patent held by a team. Owner and licensees reference teams by id only,
/// never by pointer, so clones cannot diverge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patent {
    pub id: String,
    pub tech_id: String,
    pub tier: u32,
    /// Round after which the patent lapses
    pub expiry_round: u32,
    /// Normalised ability to block competitors, [0, 1]
    pub blocking_power: f64,
    /// Per-round fee collected from each licensee
    pub licensing_fee: f64,
    /// Team ids licensed to use the technology
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub licensees: BTreeSet<String>,
}

/// Accumulated research state and unlocked effects for one team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechProgress {
    /// Unlocked tech node ids
    pub unlocked: BTreeSet<String>,
    /// Running projects
    pub active: Vec<ActiveResearch>,
    /// Quality bonus applied to launched products, per segment
    pub quality_bonus: BTreeMap<Segment, f64>,
    /// One-time spillover quality bonus received from adjacent unlocks
    pub spillover_bonus: BTreeMap<Segment, f64>,
    /// Feature points granted to newly launched products
    pub feature_bonus: f64,
    /// Fractional unit-cost reduction, compounded multiplicatively
    pub cost_reduction: f64,
    /// Fractional development speedup from tech
    pub dev_speed_bonus: f64,
    /// Fractional development speedup from platform investment
    pub platform_dev_speed: f64,
    /// Competitive segment bonus from tech, per segment
    pub segment_bonus: BTreeMap<Segment, f64>,
}

/// Rounds a product development takes, given the target quality, engineer
/// staffing and accumulated speedups.
pub fn development_rounds(state: &TeamState, target_quality: f64, config: &GameConfig) -> u32 {
    let params = &config.research;
    let base = params.product_dev_base_rounds as f64
        + params.product_dev_quality_factor * (target_quality - 50.0).max(0.0);
    let engineers = effective_headcount(state, Role::Engineer, config);
    let staffing = (engineers / params.engineers_for_full_speedup.max(1) as f64).min(1.0);
    let speedup = (params.max_engineer_speedup * staffing
        + state.tech.dev_speed_bonus
        + state.tech.platform_dev_speed)
        .min(0.8);
    (base * (1.0 - speedup)).ceil().max(1.0) as u32
}

/// Runs the research pass for one team.
pub fn process(
    state: &TeamState,
    decisions: &[ResearchDecision],
    config: &GameConfig,
    tree: &TechTree,
    rng: &mut StreamRng,
) -> ModuleOutcome {
    let mut state = state.clone();
    let mut ledger = LedgerDelta::default();
    let mut messages = Vec::new();
    let mut warnings = Vec::new();
    let mut changes = Vec::new();

    for decision in decisions {
        match decision {
            ResearchDecision::StartResearch { tech_id, risk } => {
                let Some(node) = tree.get(tech_id) else {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        format!("unknown tech node '{}'", tech_id),
                    ));
                    continue;
                };
                if state.tech.unlocked.contains(tech_id)
                    || state.tech.active.iter().any(|a| &a.tech_id == tech_id)
                {
                    continue;
                }
                // Unmet prerequisites drop the start silently.
                if !tree.is_startable(tech_id, &state.tech.unlocked) {
                    debug!("team {}: prerequisites unmet for '{}'", state.id, tech_id);
                    continue;
                }
                if node.cost > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        format!("insufficient cash to research '{}'", tech_id),
                    ));
                    continue;
                }
                state.cash -= node.cost;
                ledger.rd_expense += node.cost;
                state.tech.active.push(ActiveResearch {
                    tech_id: tech_id.clone(),
                    risk: *risk,
                    rounds_remaining: node.rounds,
                    cost_overrun: 0.0,
                });
                messages.push(format!("started research '{}' at {} risk", tech_id, risk));
            },
            ResearchDecision::StartProduct { product_id, name, segment, target_quality, price } => {
                if state.products.contains_key(product_id) {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        format!("product id '{}' already exists", product_id),
                    ));
                    continue;
                }
                let mut product = Product::new(product_id, name, *segment, *target_quality, *price);
                product.status = DevelopmentStatus::Developing;
                state.products.insert(product_id.clone(), product);
                messages.push(format!("started development of '{}' in {}", product_id, segment));
            },
            ResearchDecision::AllocateProductBudget { product_id, amount } => {
                if *amount > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        format!("insufficient cash for R&D budget on '{}'", product_id),
                    ));
                    continue;
                }
                let Some(product) = state.products.get_mut(product_id) else {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        format!("unknown product '{}'", product_id),
                    ));
                    continue;
                };
                state.cash -= amount;
                ledger.rd_expense += amount;
                // Budget buys features and reliability, with diminishing value
                // past the first few millions.
                let millions = amount / 1_000_000.0;
                let feature_gain = 2.0 * millions.sqrt();
                product.features = (product.features + feature_gain).min(100.0);
                product.reliability = (product.reliability + millions * 0.5).min(100.0);
            },
            ResearchDecision::PlatformInvestment { amount } => {
                if *amount > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        "insufficient cash for platform investment".to_string(),
                    ));
                    continue;
                }
                state.cash -= amount;
                ledger.rd_expense += amount;
                let before = state.tech.platform_dev_speed;
                state.tech.platform_dev_speed = (before
                    + amount / 1_000_000.0 * config.research.platform_dev_speed_per_million)
                    .min(config.research.platform_dev_speed_cap);
                changes.push(StateChange::new(
                    "tech.platform_dev_speed",
                    format!("{:.3}", before),
                    format!("{:.3}", state.tech.platform_dev_speed),
                ));
            },
        }
    }

    // Advance running research projects.
    let mut completed = Vec::new();
    let mut still_active = Vec::new();
    for mut project in std::mem::take(&mut state.tech.active) {
        let profile = config
            .research
            .risk_profiles
            .get(&project.risk)
            .copied()
            .unwrap_or(crate::config::RiskProfile { delay_chance: 0.15, overrun_chance: 0.15 });
        let node_cost = tree.get(&project.tech_id).map(|n| n.cost).unwrap_or(0.0);

        if rng.chance(profile.overrun_chance) {
            let fraction = rng.range(
                config.research.overrun_min_fraction,
                config.research.overrun_max_fraction,
            );
            let overrun = node_cost * fraction;
            project.cost_overrun += overrun;
            state.cash -= overrun;
            ledger.rd_expense += overrun;
            warnings.push(Warning::new(
                ModuleKind::Research,
                format!("research '{}' ran over budget by {:.0}", project.tech_id, overrun),
            ));
        }
        if rng.chance(profile.delay_chance) {
            messages.push(format!("research '{}' delayed one round", project.tech_id));
        } else {
            project.rounds_remaining = project.rounds_remaining.saturating_sub(1);
        }

        if project.rounds_remaining == 0 {
            completed.push(project.tech_id.clone());
        } else {
            still_active.push(project);
        }
    }
    state.tech.active = still_active;

    for tech_id in completed {
        unlock(&mut state, &tech_id, tree, config);
        messages.push(format!("research '{}' completed", tech_id));
    }

    // Expire patents and collect licensing fees.
    let round = state.round;
    state.patents.retain(|p| p.expiry_round > round);
    let licensing: f64 =
        state.patents.iter().map(|p| p.licensing_fee * p.licensees.len() as f64).sum();
    if licensing > 0.0 {
        state.cash += licensing;
        ledger.other_income += licensing;
        messages.push(format!("collected {:.0} in patent licensing fees", licensing));
    }

    // Advance product development.
    let dev_products: Vec<String> = state
        .products
        .values()
        .filter(|p| p.status == DevelopmentStatus::Developing)
        .map(|p| p.id.clone())
        .collect();
    for product_id in dev_products {
        let (target_quality, segment) = {
            let p = &state.products[&product_id];
            (p.target_quality, p.segment)
        };
        let rounds = development_rounds(&state, target_quality, config);
        let step = 100.0 / rounds as f64;
        let launched = {
            let product = state.products.get_mut(&product_id).expect("product exists");
            product.development_progress = (product.development_progress + step).min(100.0);
            product.development_progress >= 100.0
        };
        if launched {
            let quality_bonus = state.tech.quality_bonus.get(&segment).copied().unwrap_or(0.0)
                + state.tech.spillover_bonus.get(&segment).copied().unwrap_or(0.0);
            let feature_bonus = state.tech.feature_bonus;
            let base_cost = estimate_unit_cost(&state, segment, config);
            let product = state.products.get_mut(&product_id).expect("product exists");
            product.status = DevelopmentStatus::Launched;
            product.quality = (product.target_quality + quality_bonus).min(100.0);
            product.features = (product.features + feature_bonus).min(100.0);
            product.unit_cost = base_cost;
            messages.push(format!("product '{}' launched in {}", product_id, segment));
        }
    }

    let costs = ledger.total_cash_out();
    let revenue = ledger.other_income;
    ModuleOutcome { state, costs, revenue, ledger, messages, warnings, changes }
}

/// Applies one unlocked node: effects, spillover, patent filing.
fn unlock(state: &mut TeamState, tech_id: &str, tree: &TechTree, config: &GameConfig) {
    let Some(node) = tree.get(tech_id) else {
        return;
    };
    state.tech.unlocked.insert(tech_id.to_string());

    for effect in &node.effects {
        match effect {
            TechEffect::QualityBonus { segment, amount } => match segment {
                Some(segment) => {
                    *state.tech.quality_bonus.entry(*segment).or_insert(0.0) += amount;
                },
                None => {
                    for segment in Segment::all() {
                        *state.tech.quality_bonus.entry(segment).or_insert(0.0) += amount;
                    }
                },
            },
            TechEffect::FeatureUnlock { points } => state.tech.feature_bonus += points,
            TechEffect::CostReduction { fraction } => {
                state.tech.cost_reduction =
                    1.0 - (1.0 - state.tech.cost_reduction) * (1.0 - fraction);
            },
            TechEffect::DevSpeed { fraction } => state.tech.dev_speed_bonus += fraction,
            TechEffect::SegmentBonus { segment, amount } => {
                *state.tech.segment_bonus.entry(*segment).or_insert(0.0) += amount;
            },
            TechEffect::FamilyBonus { family, amount } => {
                // The bonus scales with how much of the family is already
                // unlocked, landing as a global quality bump.
                let family_unlocked = state
                    .tech
                    .unlocked
                    .iter()
                    .filter(|id| {
                        tree.get(id).and_then(|n| n.family.as_deref()) == Some(family.as_str())
                    })
                    .count();
                let bump = amount * family_unlocked as f64 * 0.5;
                for segment in Segment::all() {
                    *state.tech.quality_bonus.entry(segment).or_insert(0.0) += bump;
                }
            },
        }
    }

    // One-time spillover into adjacent segments.
    let quality_total = tree.quality_effect_total(tech_id);
    if quality_total > 0.0 {
        let spill = config.research.spillover_rate * quality_total;
        let mut touched = BTreeSet::new();
        for segment in tree.quality_segments(tech_id) {
            for adjacent in segment.adjacent() {
                touched.insert(adjacent);
            }
        }
        for segment in touched {
            *state.tech.spillover_bonus.entry(segment).or_insert(0.0) += spill;
        }
    }

    // High-tier completions file a patent.
    if node.tier >= config.research.patent_tier_threshold {
        let patent_id = format!("{}-pat-{}", state.id, tech_id);
        state.patents.push(Patent {
            id: patent_id,
            tech_id: tech_id.to_string(),
            tier: node.tier,
            expiry_round: state.round + config.research.patent_duration_rounds,
            blocking_power: config.research.patent_blocking_power,
            licensing_fee: config.research.patent_licensing_fee,
            licensees: BTreeSet::new(),
        });
    }
}

/// Rough unit cost for a newly launched product: material cost per unit plus
/// a labour overhead share, reduced by accumulated cost-reduction tech.
fn estimate_unit_cost(state: &TeamState, segment: Segment, config: &GameConfig) -> f64 {
    let per_unit = if state.inventory.is_empty() {
        // No stock yet: assume catalogue average at par.
        let catalog = &config.materials.material_catalog;
        if catalog.is_empty() {
            0.0
        } else {
            catalog.values().map(|m| m.base_cost).sum::<f64>() / catalog.len() as f64
        }
    } else {
        state.inventory.average_unit_cost()
    };
    let material = per_unit * config.materials.units_per_product;

    let labour = match segment {
        Segment::Budget => 30.0,
        Segment::General => 60.0,
        Segment::ActiveLifestyle => 50.0,
        Segment::Enthusiast => 110.0,
        Segment::Professional => 220.0,
    };
    (material + labour) * (1.0 - state.tech.cost_reduction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::rng::{RngStream, StreamRng};

    fn setup() -> (TeamState, GameConfig, TechTree, StreamRng) {
        let config = GameConfig::default();
        let team = TeamState::initial("team-a", "Aurora Devices", &config);
        let tree = TechTree::standard();
        let rng = StreamRng::new(42, 1, RngStream::Research, "team-a");
        (team, config, tree, rng)
    }

    #[test]
    fn test_start_research_charges_cost() {
        let (team, config, tree, mut rng) = setup();
        let decisions = vec![ResearchDecision::StartResearch {
            tech_id: "materials_science".to_string(),
            risk: RiskLevel::Conservative,
        }];
        let outcome = process(&team, &decisions, &config, &tree, &mut rng);
        assert_eq!(outcome.state.tech.active.len(), 1);
        assert!(outcome.state.cash < team.cash);
    }

    #[test]
    fn test_unmet_prereqs_fail_silently() {
        let (team, config, tree, mut rng) = setup();
        let decisions = vec![ResearchDecision::StartResearch {
            tech_id: "pro_calibration".to_string(),
            risk: RiskLevel::Moderate,
        }];
        let outcome = process(&team, &decisions, &config, &tree, &mut rng);
        assert!(outcome.state.tech.active.is_empty());
        assert!(outcome.warnings.is_empty(), "prereq failure must not warn");
    }

    #[test]
    fn test_unknown_tech_warns() {
        let (team, config, tree, mut rng) = setup();
        let decisions = vec![ResearchDecision::StartResearch {
            tech_id: "cold_fusion".to_string(),
            risk: RiskLevel::Aggressive,
        }];
        let outcome = process(&team, &decisions, &config, &tree, &mut rng);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_research_completes_and_unlocks() {
        let (mut team, config, tree, mut rng) = setup();
        // Conservative profile with zeroed risk makes completion
        // deterministic in `rounds` passes.
        let mut config = config;
        config.research.risk_profiles.insert(
            RiskLevel::Conservative,
            crate::config::RiskProfile { delay_chance: 0.0, overrun_chance: 0.0 },
        );
        let decisions = vec![ResearchDecision::StartResearch {
            tech_id: "materials_science".to_string(),
            risk: RiskLevel::Conservative,
        }];
        let mut outcome = process(&team, &decisions, &config, &tree, &mut rng);
        for _ in 0..2 {
            team = outcome.state;
            outcome = process(&team, &[], &config, &tree, &mut rng);
        }
        assert!(outcome.state.tech.unlocked.contains("materials_science"));
        // Global quality bonus landed on every segment.
        assert!(outcome.state.tech.quality_bonus[&Segment::Budget] > 0.0);
    }

    #[test]
    fn test_spillover_hits_adjacent_segments() {
        let (mut team, config, tree, _) = setup();
        unlock(&mut team, "composite_shells", &tree, &config);
        // Enthusiast + Active Lifestyle quality effects spill into their
        // adjacency (General, Professional, each other).
        assert!(team.tech.spillover_bonus.contains_key(&Segment::General));
        let spill = team.tech.spillover_bonus[&Segment::General];
        assert!((spill - config.research.spillover_rate * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_high_tier_unlock_files_patent() {
        let (mut team, config, tree, _) = setup();
        unlock(&mut team, "pro_calibration", &tree, &config);
        assert_eq!(team.patents.len(), 1);
        assert_eq!(team.patents[0].tech_id, "pro_calibration");
        assert!(team.patents[0].blocking_power > 0.0);
    }

    #[test]
    fn test_licensing_fees_collected() {
        let (mut team, config, tree, mut rng) = setup();
        unlock(&mut team, "pro_calibration", &tree, &config);
        team.patents[0].licensees.insert("team-b".to_string());
        team.patents[0].licensees.insert("team-c".to_string());
        let outcome = process(&team, &[], &config, &tree, &mut rng);
        assert_eq!(outcome.revenue, 2.0 * config.research.patent_licensing_fee);
    }

    #[test]
    fn test_development_rounds_scale_with_quality() {
        let (team, config, _, _) = setup();
        let low = development_rounds(&team, 50.0, &config);
        let high = development_rounds(&team, 95.0, &config);
        assert!(high > low);
    }

    #[test]
    fn test_product_development_reaches_launch() {
        let (mut team, config, tree, mut rng) = setup();
        let decisions = vec![ResearchDecision::StartProduct {
            product_id: "p1".to_string(),
            name: "Vertex".to_string(),
            segment: Segment::General,
            target_quality: 60.0,
            price: 350.0,
        }];
        let mut outcome = process(&team, &decisions, &config, &tree, &mut rng);
        for _ in 0..12 {
            if outcome.state.products["p1"].status == DevelopmentStatus::Launched {
                break;
            }
            team = outcome.state;
            outcome = process(&team, &[], &config, &tree, &mut rng);
        }
        let product = &outcome.state.products["p1"];
        assert_eq!(product.status, DevelopmentStatus::Launched);
        assert!(product.quality >= 60.0);
        assert!(product.unit_cost > 0.0);
    }

    #[test]
    fn test_expired_patents_lapse() {
        let (mut team, config, tree, mut rng) = setup();
        unlock(&mut team, "pro_calibration", &tree, &config);
        team.round = team.patents[0].expiry_round;
        let outcome = process(&team, &[], &config, &tree, &mut rng);
        assert!(outcome.state.patents.is_empty());
    }
}
