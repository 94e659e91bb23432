//! Cross-team market resolution: the demand allocator.
//!
//! For every (team, product, segment) a competitive score is computed; a
//! softmax per segment turns scores into allocated demand shares; the
//! rubber-band stabiliser then boosts trailing teams and reins in leaders,
//! and shares are re-normalised so every open segment's shares sum to one.
//!
//! This stage is the only cross-team coupling in the round, and a failure
//! here (a NaN score, a collapsed segment) is non-recoverable: the round is
//! aborted and no input state is touched.

use crate::config::GameConfig;
use crate::error::{Result, SimulationError};
use crate::esg;
use crate::market::MarketState;
use crate::materials;
use crate::product::Segment;
use crate::team::TeamState;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Allocation result for one team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamMarketResult {
    /// Units sold per segment
    pub sales_by_segment: BTreeMap<Segment, f64>,
    /// Share of each contested segment, in [0, 1]
    pub share_by_segment: BTreeMap<Segment, f64>,
    /// Revenue realised per segment (before ESG and FX adjustments)
    pub revenue_by_segment: BTreeMap<Segment, f64>,
}

impl TeamMarketResult {
    pub fn total_revenue(&self) -> f64 {
        self.revenue_by_segment.values().sum()
    }

    pub fn total_units(&self) -> f64 {
        self.sales_by_segment.values().sum()
    }
}

/// One contender in a segment: a launched product of a team.
#[derive(Debug, Clone)]
struct Contender {
    team_id: String,
    product_id: String,
    score: f64,
    effective_price: f64,
    unit_cost: f64,
}

/// Competitive score of one product in its segment.
///
/// Public so balance tooling can inspect score composition.
pub fn competitive_score(
    state: &TeamState,
    product_id: &str,
    market: &MarketState,
    config: &GameConfig,
) -> Option<f64> {
    let product = state.products.get(product_id)?;
    if !product.is_contending() {
        return None;
    }
    let segment = product.segment;
    let demand = market.segment(segment)?;
    let weights = config.scoring.weights.get(&segment)?;
    let expectation = config.scoring.quality_expectation.get(&segment).copied().unwrap_or(50.0);

    let promo = state.active_promotions.get(&segment).copied().unwrap_or(0.0);
    let price = product.price * (1.0 - promo);

    // Price: distance inside the segment's accepted [min, max] band.
    let span = (demand.price_max - demand.price_min).max(1.0);
    let price_score = ((demand.price_max - price) / span).clamp(0.0, 1.0);

    // Quality: ratio to segment expectation, over-delivery bonus capped.
    let effective_quality =
        (product.quality + materials::segment_quality_impact(state, segment)).clamp(0.0, 100.0);
    let quality_ratio = effective_quality / expectation.max(1.0);
    let quality_score = bonus_capped(quality_ratio, config.scoring.quality_feature_bonus_cap);

    let brand_score = state.brand_value.max(0.0).sqrt() * config.scoring.brand_weight;
    let esg_score = esg::normalized_score(state.esg_score, &config.esg);
    let feature_ratio = product.features / 100.0;
    let feature_score = bonus_capped(feature_ratio, config.scoring.quality_feature_bonus_cap);

    let mut raw = weights.price * price_score
        + weights.quality * quality_score
        + weights.brand * brand_score
        + weights.esg * esg_score
        + weights.features * feature_score;

    // Tech segment bonus is additive on the raw score.
    raw += state.tech.segment_bonus.get(&segment).copied().unwrap_or(0.0);

    // Scores are reported on the configured scale; the softmax temperature
    // is calibrated against it.
    raw *= config.scoring.score_scale;

    // Price-floor rule: selling far below the segment floor reads as junk.
    let floor = demand.price_min * (1.0 - config.scoring.price_floor_penalty_threshold);
    if price < floor && floor > 0.0 {
        let depth = ((floor - price) / floor).min(1.0);
        raw *= 1.0 - depth * config.scoring.price_floor_penalty_max;
    }

    trace!(
        "score {}/{} in {}: price {:.3} quality {:.3} brand {:.3} -> {:.4}",
        state.id,
        product_id,
        segment,
        price_score,
        quality_score,
        brand_score,
        raw
    );
    Some(raw)
}

/// Over-delivery bonus: ratios above 1 earn `1 + sqrt(ratio - 1) * 0.5`,
/// capped; ratios at or below 1 pass through.
fn bonus_capped(ratio: f64, cap: f64) -> f64 {
    if ratio > 1.0 {
        cap.min(1.0 + (ratio - 1.0).sqrt() * 0.5)
    } else {
        ratio
    }
}

/// Resolves the market for all teams.
///
/// `teams` must be sorted by team id; the allocator iterates it in order so
/// the result is independent of how the per-team phase was scheduled.
pub fn resolve_market(
    teams: &[(String, &TeamState)],
    market: &MarketState,
    config: &GameConfig,
) -> Result<BTreeMap<String, TeamMarketResult>> {
    let mut results: BTreeMap<String, TeamMarketResult> =
        teams.iter().map(|(id, _)| (id.clone(), TeamMarketResult::default())).collect();

    for (&segment, demand) in &market.segments {
        if demand.total_demand <= 0.0 {
            continue;
        }

        // Gather contenders in stable (team, product) order.
        let mut contenders = Vec::new();
        for (team_id, state) in teams {
            for product in state.contending_products(segment) {
                let score = competitive_score(state, &product.id, market, config)
                    .unwrap_or(0.0);
                if !score.is_finite() {
                    return Err(SimulationError::RoundFailed(format!(
                        "non-finite competitive score for {}/{} in {}",
                        team_id, product.id, segment
                    )));
                }
                let promo = state.active_promotions.get(&segment).copied().unwrap_or(0.0);
                contenders.push(Contender {
                    team_id: team_id.clone(),
                    product_id: product.id.clone(),
                    score,
                    effective_price: product.price * (1.0 - promo),
                    unit_cost: product.unit_cost,
                });
            }
        }
        if contenders.is_empty() {
            continue;
        }

        // Softmax over scores, stabilised by max subtraction.
        let temperature = config.scoring.softmax_temperature;
        let max_score =
            contenders.iter().map(|c| c.score).fold(f64::NEG_INFINITY, f64::max);
        let mut weights: Vec<f64> = contenders
            .iter()
            .map(|c| ((c.score - max_score) / temperature).exp())
            .collect();
        let weight_sum: f64 = weights.iter().sum();
        if !weight_sum.is_finite() || weight_sum <= 0.0 {
            return Err(SimulationError::RoundFailed(format!(
                "softmax degenerated in {} (weight sum {})",
                segment, weight_sum
            )));
        }
        for w in &mut weights {
            *w /= weight_sum;
        }

        // Per-team shares before stabilisation.
        let mut team_shares: BTreeMap<&str, f64> = BTreeMap::new();
        for (contender, share) in contenders.iter().zip(&weights) {
            *team_shares.entry(contender.team_id.as_str()).or_insert(0.0) += share;
        }

        // Rubber-banding on per-round, per-segment shares.
        let present = team_shares.len() as f64;
        let avg = 1.0 / present;
        let mut adjusted: BTreeMap<&str, f64> = BTreeMap::new();
        for (team_id, share) in &team_shares {
            let mut adjusted_share = *share;
            if *share < config.scoring.rubber_band_threshold * avg {
                adjusted_share *= config.scoring.rubber_band_trailing_boost;
            } else if *share > 2.0 * avg {
                adjusted_share *= config.scoring.rubber_band_leading_penalty;
            }
            adjusted.insert(*team_id, adjusted_share);
        }
        let adjusted_sum: f64 = adjusted.values().sum();
        if adjusted_sum <= 0.0 || !adjusted_sum.is_finite() {
            return Err(SimulationError::RoundFailed(format!(
                "rubber-banding collapsed segment {}",
                segment
            )));
        }
        for share in adjusted.values_mut() {
            *share /= adjusted_sum;
        }

        let check: f64 = adjusted.values().sum();
        if (check - 1.0).abs() > 1e-6 {
            return Err(SimulationError::RoundFailed(format!(
                "share conservation violated in {}: sum {}",
                segment, check
            )));
        }

        // Units per contender: the team's adjusted share splits across its
        // products proportionally to their pre-adjustment weights.
        for (contender, weight) in contenders.iter().zip(&weights) {
            let team_pre = team_shares[contender.team_id.as_str()];
            if team_pre <= 0.0 {
                continue;
            }
            let team_adjusted = adjusted[contender.team_id.as_str()];
            let product_share = team_adjusted * (weight / team_pre);
            let units = demand.total_demand * product_share;
            let revenue = units * contender.effective_price;
            let result = results.get_mut(&contender.team_id).expect("team present");
            *result.sales_by_segment.entry(segment).or_insert(0.0) += units;
            *result.share_by_segment.entry(segment).or_insert(0.0) += product_share;
            *result.revenue_by_segment.entry(segment).or_insert(0.0) += revenue;
            trace!(
                "alloc {} {}: {:.1} units of {} at {:.0} (margin {:.0})",
                contender.team_id,
                segment,
                units,
                contender.product_id,
                contender.effective_price,
                contender.effective_price - contender.unit_cost
            );
        }

        debug!(
            "segment {}: {} contenders from {} teams, demand {:.0}",
            segment,
            contenders.len(),
            present,
            demand.total_demand
        );
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::product::{DevelopmentStatus, Product};

    fn team_with_product(
        id: &str,
        config: &GameConfig,
        segment: Segment,
        price: f64,
        quality: f64,
        brand: f64,
    ) -> TeamState {
        let mut team = TeamState::initial(id, id, config);
        team.brand_value = brand;
        let mut product = Product::new("p1", "P1", segment, quality, price);
        product.quality = quality;
        product.features = 50.0;
        product.status = DevelopmentStatus::Launched;
        product.unit_cost = price * 0.5;
        team.products.insert("p1".to_string(), product);
        team
    }

    fn resolve<'a>(
        teams: &'a [TeamState],
        market: &MarketState,
        config: &GameConfig,
    ) -> BTreeMap<String, TeamMarketResult> {
        let refs: Vec<(String, &TeamState)> =
            teams.iter().map(|t| (t.id.clone(), t)).collect();
        resolve_market(&refs, market, config).unwrap()
    }

    #[test]
    fn test_cost_leader_dominates_budget() {
        let config = GameConfig::default();
        let market = config.initial_market_state();
        let teams = vec![
            team_with_product("team-a", &config, Segment::Budget, 160.0, 55.0, 0.4),
            team_with_product("team-b", &config, Segment::Budget, 260.0, 55.0, 0.4),
            team_with_product("team-c", &config, Segment::Budget, 260.0, 55.0, 0.4),
            team_with_product("team-d", &config, Segment::Budget, 260.0, 55.0, 0.4),
        ];
        let results = resolve(&teams, &market, &config);
        let share_a = results["team-a"].share_by_segment[&Segment::Budget];
        assert!(share_a > 0.40, "cost leader share {} not dominant", share_a);
    }

    #[test]
    fn test_premium_dominates_professional() {
        let config = GameConfig::default();
        let market = config.initial_market_state();
        let teams = vec![
            team_with_product("team-a", &config, Segment::Professional, 1_100.0, 90.0, 0.4),
            team_with_product("team-b", &config, Segment::Professional, 1_250.0, 55.0, 0.4),
        ];
        let results = resolve(&teams, &market, &config);
        let share_a = results["team-a"].share_by_segment[&Segment::Professional];
        let share_b = results["team-b"].share_by_segment[&Segment::Professional];
        assert!(share_a > share_b, "quality leader {} vs {}", share_a, share_b);
    }

    #[test]
    fn test_share_conservation_four_way() {
        let config = GameConfig::default();
        let market = config.initial_market_state();
        let teams = vec![
            team_with_product("team-a", &config, Segment::ActiveLifestyle, 180.0, 50.0, 0.3),
            team_with_product("team-b", &config, Segment::ActiveLifestyle, 260.0, 60.0, 0.5),
            team_with_product("team-c", &config, Segment::ActiveLifestyle, 340.0, 70.0, 0.4),
            team_with_product("team-d", &config, Segment::ActiveLifestyle, 450.0, 80.0, 0.6),
        ];
        let results = resolve(&teams, &market, &config);
        let total: f64 = results
            .values()
            .map(|r| r.share_by_segment.get(&Segment::ActiveLifestyle).copied().unwrap_or(0.0))
            .sum();
        assert!((total - 1.0).abs() < 1e-6, "shares sum to {}", total);
    }

    #[test]
    fn test_advertising_monotonicity_via_brand() {
        // A higher brand value (all else equal) never lowers the share.
        let config = GameConfig::default();
        let market = config.initial_market_state();
        for brand in [0.2, 0.3, 0.4, 0.5] {
            let teams = vec![
                team_with_product("team-a", &config, Segment::General, 400.0, 55.0, brand),
                team_with_product("team-b", &config, Segment::General, 400.0, 55.0, 0.4),
            ];
            let results = resolve(&teams, &market, &config);
            let low = results["team-a"].share_by_segment[&Segment::General];

            let teams_hi = vec![
                team_with_product("team-a", &config, Segment::General, 400.0, 55.0, brand + 0.1),
                team_with_product("team-b", &config, Segment::General, 400.0, 55.0, 0.4),
            ];
            let results_hi = resolve(&teams_hi, &market, &config);
            let high = results_hi["team-a"].share_by_segment[&Segment::General];
            assert!(high >= low, "brand {} -> share {} vs {}", brand, low, high);
        }
    }

    #[test]
    fn test_no_product_zero_share() {
        let config = GameConfig::default();
        let market = config.initial_market_state();
        let team_a = team_with_product("team-a", &config, Segment::Budget, 200.0, 50.0, 0.4);
        let team_b = TeamState::initial("team-b", "team-b", &config);
        let teams = vec![team_a, team_b];
        let results = resolve(&teams, &market, &config);
        assert!(results["team-b"].share_by_segment.is_empty());
        assert_eq!(results["team-b"].total_units(), 0.0);
    }

    #[test]
    fn test_price_floor_penalty_applies() {
        let config = GameConfig::default();
        let market = config.initial_market_state();
        // Budget floor: 100 * (1 - 0.15) = 85; price 40 is deep under it.
        let dumper = team_with_product("team-a", &config, Segment::Budget, 40.0, 55.0, 0.4);
        let fair = team_with_product("team-b", &config, Segment::Budget, 110.0, 55.0, 0.4);
        let score_dumper = competitive_score(&dumper, "p1", &market, &config).unwrap();
        let score_fair = competitive_score(&fair, "p1", &market, &config).unwrap();
        // Despite a better raw price score, the dumper is penalised below the
        // fair-priced competitor.
        assert!(score_dumper < score_fair);
    }

    #[test]
    fn test_quality_bonus_capped() {
        let config = GameConfig::default();
        let cap = config.scoring.quality_feature_bonus_cap;
        assert_eq!(bonus_capped(0.5, cap), 0.5);
        assert_eq!(bonus_capped(1.0, cap), 1.0);
        assert!(bonus_capped(1.5, cap) <= cap);
        assert!(bonus_capped(100.0, cap) <= cap);
    }

    #[test]
    fn test_nan_score_aborts_round() {
        let config = GameConfig::default();
        let market = config.initial_market_state();
        let mut bad = team_with_product("team-a", &config, Segment::Budget, 200.0, 50.0, 0.4);
        bad.products.get_mut("p1").unwrap().price = f64::NAN;
        let refs: Vec<(String, &TeamState)> = vec![("team-a".to_string(), &bad)];
        assert!(matches!(
            resolve_market(&refs, &market, &config),
            Err(SimulationError::RoundFailed(_))
        ));
    }

    #[test]
    fn test_rubber_band_trailer_boosted_leader_trimmed() {
        // The same five-team field resolved with and without the stabiliser:
        // the leader's share must strictly shrink and every trailer's must
        // strictly grow once rubber-banding is on.
        let teams_for = |config: &GameConfig| {
            vec![
                team_with_product("team-a", config, Segment::Budget, 120.0, 80.0, 0.9),
                team_with_product("team-b", config, Segment::Budget, 290.0, 40.0, 0.1),
                team_with_product("team-c", config, Segment::Budget, 280.0, 45.0, 0.1),
                team_with_product("team-d", config, Segment::Budget, 285.0, 42.0, 0.1),
                team_with_product("team-e", config, Segment::Budget, 282.0, 44.0, 0.1),
            ]
        };

        let mut neutral = GameConfig::default();
        neutral.scoring.rubber_band_trailing_boost = 1.0;
        neutral.scoring.rubber_band_leading_penalty = 1.0;
        let active = GameConfig::default();

        let market = active.initial_market_state();
        let raw = resolve(&teams_for(&neutral), &market, &neutral);
        let banded = resolve(&teams_for(&active), &market, &active);

        let leader_raw = raw["team-a"].share_by_segment[&Segment::Budget];
        let leader_banded = banded["team-a"].share_by_segment[&Segment::Budget];
        assert!(leader_banded < leader_raw, "{} !< {}", leader_banded, leader_raw);
        for id in ["team-b", "team-c", "team-d", "team-e"] {
            let trailer_raw = raw[id].share_by_segment[&Segment::Budget];
            let trailer_banded = banded[id].share_by_segment[&Segment::Budget];
            assert!(trailer_banded > trailer_raw, "{}: {} !> {}", id, trailer_banded, trailer_raw);
        }
        let total: f64 = banded
            .values()
            .map(|r| r.share_by_segment.get(&Segment::Budget).copied().unwrap_or(0.0))
            .sum();
        assert!((total - 1.0).abs() < 1e-6);
    }
}
