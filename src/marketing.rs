//! Marketing: advertising, branding, sponsorships, promotions.
//!
//! Brand value follows a bounded update law each round: contributions from
//! chunked advertising (geometric decay), branding spend (linear then
//! logarithmic), and sponsorships are summed, clamped at the per-round
//! growth cap, then applied on top of brand decay and clamped into [0, 1].

use crate::config::GameConfig;
use crate::decisions::MarketingDecision;
use crate::module::{LedgerDelta, ModuleKind, ModuleOutcome, StateChange, Warning};
use crate::team::TeamState;
use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{EnumIter, EnumString};

/// Advertising channels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    SocialMedia,
    Tv,
    Print,
    Online,
    Events,
}

impl Channel {
    pub fn all() -> Vec<Channel> {
        vec![Channel::SocialMedia, Channel::Tv, Channel::Print, Channel::Online, Channel::Events]
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::SocialMedia => "social_media",
            Channel::Tv => "tv",
            Channel::Print => "print",
            Channel::Online => "online",
            Channel::Events => "events",
        };
        write!(f, "{}", name)
    }
}

/// Kinds of promotion a team can run in a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromotionKind {
    Discount,
    Bundle,
    Loyalty,
}

/// Brand contribution of one advertising budget, before channel scaling.
///
/// The budget is split into chunks; the k-th chunk contributes
/// `chunk * base_impact * decay^(k-1)`.
pub fn advertising_contribution(budget: f64, config: &GameConfig) -> f64 {
    let params = &config.marketing;
    let chunk_size = params.advertising_chunk_size;
    let mut remaining = budget.max(0.0);
    let mut factor = params.advertising_base_impact;
    let mut total = 0.0;
    while remaining > 0.0 {
        let chunk = remaining.min(chunk_size);
        total += (chunk / chunk_size) * factor;
        factor *= params.advertising_decay;
        remaining -= chunk;
    }
    total
}

/// Brand contribution of direct branding spend: linear up to the threshold,
/// logarithmic past it.
pub fn branding_contribution(amount: f64, config: &GameConfig) -> f64 {
    let params = &config.marketing;
    let threshold = params.branding_linear_threshold;
    if amount <= threshold {
        return amount * params.branding_base_impact;
    }
    let linear = threshold * params.branding_base_impact;
    let excess = amount - threshold;
    let log_part = (1.0 + excess / threshold).log2()
        * params.branding_log_multiplier
        * params.branding_base_impact
        * threshold;
    linear + log_part
}

/// Runs the marketing pass for one team.
pub fn process(
    state: &TeamState,
    decisions: &[MarketingDecision],
    config: &GameConfig,
) -> ModuleOutcome {
    let mut state = state.clone();
    let mut ledger = LedgerDelta::default();
    let mut messages = Vec::new();
    let mut warnings = Vec::new();
    let mut changes = Vec::new();

    // Promotions last one round; the pass starts from a clean slate.
    state.active_promotions.clear();

    let mut growth = 0.0;

    for decision in decisions {
        match decision {
            MarketingDecision::Advertising { segment, channel, budget } => {
                if *budget > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("insufficient cash for advertising in {}", segment),
                    ));
                    continue;
                }
                let effectiveness = config
                    .marketing
                    .channel_effectiveness
                    .get(segment)
                    .and_then(|m| m.get(channel))
                    .copied()
                    .unwrap_or(1.0);
                let contribution = advertising_contribution(*budget, config) * effectiveness;
                growth += contribution;
                state.cash -= budget;
                ledger.opex += budget;
                trace!(
                    "ads {:.0} in {}/{} -> brand +{:.5}",
                    budget,
                    segment,
                    channel,
                    contribution
                );
            },
            MarketingDecision::BrandInvestment { amount } => {
                if *amount > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        "insufficient cash for brand investment".to_string(),
                    ));
                    continue;
                }
                growth += branding_contribution(*amount, config);
                state.cash -= amount;
                ledger.opex += amount;
            },
            MarketingDecision::Sponsorship { sponsorship_id } => {
                let Some(spec) = config.marketing.sponsorship_catalog.get(sponsorship_id) else {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("unknown sponsorship '{}'", sponsorship_id),
                    ));
                    continue;
                };
                if spec.cost > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("insufficient cash for sponsorship '{}'", sponsorship_id),
                    ));
                    continue;
                }
                growth += spec.brand_impact;
                state.cash -= spec.cost;
                ledger.opex += spec.cost;
                messages.push(format!("sponsorship '{}' active", sponsorship_id));
            },
            MarketingDecision::Promotion { segment, kind, intensity } => {
                let intensity = intensity.clamp(0.0, config.marketing.promotion_max_intensity);
                // Stacked promotions in one segment keep the strongest.
                let entry = state.active_promotions.entry(*segment).or_insert(0.0);
                *entry = entry.max(intensity);
                messages.push(format!(
                    "{:?} promotion in {} at {:.0}% intensity",
                    kind,
                    segment,
                    intensity * 100.0
                ));
            },
            MarketingDecision::BrandActivity { activity_id } => {
                let Some(spec) = config.marketing.activity_catalog.get(activity_id) else {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("unknown brand activity '{}'", activity_id),
                    ));
                    continue;
                };
                if spec.cost > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("insufficient cash for activity '{}'", activity_id),
                    ));
                    continue;
                }
                growth += spec.brand_impact;
                state.cash -= spec.cost;
                ledger.opex += spec.cost;
            },
        }
    }

    // Bounded brand update.
    let growth = growth.min(config.marketing.brand_max_growth_per_round);
    let before = state.brand_value;
    state.brand_value =
        (before * (1.0 - config.marketing.brand_decay_rate) + growth).clamp(0.0, 1.0);
    if (state.brand_value - before).abs() > f64::EPSILON {
        changes.push(StateChange::new(
            "brand_value",
            format!("{:.4}", before),
            format!("{:.4}", state.brand_value),
        ));
    }

    let costs = ledger.total_cash_out();
    ModuleOutcome { state, costs, revenue: 0.0, ledger, messages, warnings, changes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::product::Segment;

    fn setup() -> (TeamState, GameConfig) {
        let config = GameConfig::default();
        let team = TeamState::initial("team-a", "Aurora Devices", &config);
        (team, config)
    }

    #[test]
    fn test_advertising_chunks_decay() {
        let config = GameConfig::default();
        let one_chunk = advertising_contribution(config.marketing.advertising_chunk_size, &config);
        let two_chunks =
            advertising_contribution(2.0 * config.marketing.advertising_chunk_size, &config);
        // Second chunk contributes at the decayed rate.
        let expected = one_chunk * (1.0 + config.marketing.advertising_decay);
        assert!((two_chunks - expected).abs() < 1e-12);
    }

    #[test]
    fn test_partial_chunk_scales_linearly() {
        let config = GameConfig::default();
        let half = advertising_contribution(config.marketing.advertising_chunk_size / 2.0, &config);
        let full = advertising_contribution(config.marketing.advertising_chunk_size, &config);
        assert!((half * 2.0 - full).abs() < 1e-12);
    }

    #[test]
    fn test_branding_log_regime_grows_slower() {
        let config = GameConfig::default();
        let threshold = config.marketing.branding_linear_threshold;
        let at = branding_contribution(threshold, &config);
        let double = branding_contribution(2.0 * threshold, &config);
        // Above the threshold, a doubled spend yields less than doubled brand.
        assert!(double < 2.0 * at);
        assert!(double > at);
    }

    #[test]
    fn test_brand_growth_capped_and_clamped() {
        let (mut team, config) = setup();
        team.cash = 10_000_000_000.0;
        team.brand_value = 0.99;
        let decisions = vec![MarketingDecision::BrandInvestment { amount: 900_000_000.0 }];
        let outcome = process(&team, &decisions, &config);
        assert!(outcome.state.brand_value <= 1.0);
    }

    #[test]
    fn test_brand_decays_without_spend() {
        let (team, config) = setup();
        let outcome = process(&team, &[], &config);
        let expected = team.brand_value * (1.0 - config.marketing.brand_decay_rate);
        assert!((outcome.state.brand_value - expected).abs() < 1e-12);
    }

    #[test]
    fn test_promotion_records_intensity() {
        let (team, config) = setup();
        let decisions = vec![MarketingDecision::Promotion {
            segment: Segment::Budget,
            kind: PromotionKind::Discount,
            intensity: 0.2,
        }];
        let outcome = process(&team, &decisions, &config);
        assert_eq!(outcome.state.active_promotions[&Segment::Budget], 0.2);
    }

    #[test]
    fn test_stacked_promotions_keep_strongest() {
        let (team, config) = setup();
        let decisions = vec![
            MarketingDecision::Promotion {
                segment: Segment::Budget,
                kind: PromotionKind::Discount,
                intensity: 0.1,
            },
            MarketingDecision::Promotion {
                segment: Segment::Budget,
                kind: PromotionKind::Bundle,
                intensity: 0.25,
            },
        ];
        let outcome = process(&team, &decisions, &config);
        assert_eq!(outcome.state.active_promotions[&Segment::Budget], 0.25);
    }

    #[test]
    fn test_sponsorship_charges_and_contributes() {
        let (team, config) = setup();
        let decisions =
            vec![MarketingDecision::Sponsorship { sponsorship_id: "esports_league".to_string() }];
        let outcome = process(&team, &decisions, &config);
        assert!(outcome.state.cash < team.cash);
        assert!(outcome.state.brand_value > team.brand_value * 0.98);
    }

    #[test]
    fn test_unknown_sponsorship_warns() {
        let (team, config) = setup();
        let decisions =
            vec![MarketingDecision::Sponsorship { sponsorship_id: "moon_base".to_string() }];
        let outcome = process(&team, &decisions, &config);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.state.cash, team.cash);
    }
}
