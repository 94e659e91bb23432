//! Property-based tests for the quantified engine invariants.

use crate::config::GameConfig;
use crate::decisions::{
    validate_decisions, FinanceDecision, MarketingDecision, TeamDecisions,
};
use crate::engine::{RoundEngine, RoundInput, TeamRoundInput};
use crate::marketing::{Channel, PromotionKind};
use crate::product::Segment;
use crate::scoring::resolve_market;
use crate::team::TeamState;
use crate::tests::test_helpers::{market_with_segments, team_with_product};
use proptest::prelude::*;

fn arbitrary_segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        Just(Segment::Budget),
        Just(Segment::General),
        Just(Segment::Enthusiast),
        Just(Segment::Professional),
        Just(Segment::ActiveLifestyle),
    ]
}

fn arbitrary_marketing_decision() -> impl Strategy<Value = MarketingDecision> {
    prop_oneof![
        (arbitrary_segment(), -1.0e7..1.0e8f64).prop_map(|(segment, budget)| {
            MarketingDecision::Advertising { segment, channel: Channel::Online, budget }
        }),
        (-1.0e7..1.0e8f64)
            .prop_map(|amount| MarketingDecision::BrandInvestment { amount }),
        (arbitrary_segment(), -0.5..2.0f64).prop_map(|(segment, intensity)| {
            MarketingDecision::Promotion { segment, kind: PromotionKind::Discount, intensity }
        }),
    ]
}

fn arbitrary_finance_decision() -> impl Strategy<Value = FinanceDecision> {
    prop_oneof![
        (-1.0e7..1.0e8f64).prop_map(|amount| FinanceDecision::IssueTreasuryBills { amount }),
        (-1.0e7..1.0e8f64).prop_map(|amount| FinanceDecision::BuybackShares { amount }),
        (-5.0..10.0f64).prop_map(|per_share| FinanceDecision::DeclareDividend { per_share }),
    ]
}

fn arbitrary_decisions() -> impl Strategy<Value = TeamDecisions> {
    (
        proptest::collection::vec(arbitrary_marketing_decision(), 0..6),
        proptest::collection::vec(arbitrary_finance_decision(), 0..6),
    )
        .prop_map(|(marketing, finance)| TeamDecisions {
            marketing,
            finance,
            ..TeamDecisions::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Validation is idempotent: validating a corrected bundle changes
    /// nothing and emits no further warnings.
    #[test]
    fn prop_validation_idempotent(decisions in arbitrary_decisions()) {
        let config = GameConfig::default();
        let team = TeamState::initial("team-1", "Aurora", &config);
        let once = validate_decisions(&team, &decisions, &config);
        let twice = validate_decisions(&team, &once.corrected, &config);
        prop_assert_eq!(&once.corrected, &twice.corrected);
        prop_assert!(twice.warnings.is_empty(), "second pass warned: {:?}", twice.warnings);
    }

    /// Shares in every contested segment sum to one, whatever the prices
    /// and qualities.
    #[test]
    fn prop_share_conservation(
        prices in proptest::collection::vec(50.0..2_000.0f64, 2..6),
        quality in 1.0..100.0f64,
        brand in 0.0..1.0f64,
    ) {
        let config = GameConfig::default();
        let market = market_with_segments(&config, &[Segment::General]);
        let teams: Vec<TeamState> = prices
            .iter()
            .enumerate()
            .map(|(i, price)| {
                team_with_product(
                    &format!("team-{}", i + 1),
                    &config,
                    Segment::General,
                    *price,
                    quality,
                    brand,
                )
            })
            .collect();
        let refs: Vec<(String, &TeamState)> =
            teams.iter().map(|t| (t.id.clone(), t)).collect();
        let results = resolve_market(&refs, &market, &config).unwrap();
        let total: f64 = results
            .values()
            .map(|r| r.share_by_segment.get(&Segment::General).copied().unwrap_or(0.0))
            .sum();
        prop_assert!((total - 1.0).abs() < 1e-6, "shares sum to {}", total);
    }

    /// After a full round under arbitrary (validated) decisions, every
    /// clamped field sits inside its documented range.
    #[test]
    fn prop_round_respects_clamps(
        decisions in arbitrary_decisions(),
        seed in 0u64..10_000,
    ) {
        let config = GameConfig::default();
        let engine = RoundEngine::new(config.clone()).unwrap();
        let state = team_with_product("team-1", &config, Segment::Budget, 180.0, 55.0, 0.4);
        let input = RoundInput {
            round_number: 1,
            teams: vec![TeamRoundInput {
                id: "team-1".to_string(),
                state,
                decisions,
            }],
            market_state: config.initial_market_state(),
            match_seed: seed,
            forced_events: vec![],
        };
        let report = engine.process_round(&input, None, None).unwrap();
        let state = &report.team("team-1").unwrap().new_state;

        prop_assert!((0.0..=1.0).contains(&state.brand_value));
        prop_assert!(state.esg_score >= 0.0);
        prop_assert!(state.shares_issued >= config.finance.min_shares);
        for factory in &state.factories {
            prop_assert!(factory.efficiency >= 0.0);
            prop_assert!(factory.efficiency <= config.factory.max_efficiency);
            for machine in &factory.machines {
                prop_assert!((0.0..=100.0).contains(&machine.health_percent));
            }
        }
        for share in state.market_share.values() {
            prop_assert!((0.0..=1.0).contains(share));
        }
    }

    /// A higher brand value never lowers a team's segment share, all else
    /// equal. The brand range keeps both teams away from rubber-band
    /// thresholds, where the stabiliser is allowed to bend monotonicity.
    #[test]
    fn prop_brand_monotonicity(brand in 0.25..0.64f64) {
        let config = GameConfig::default();
        let market = market_with_segments(&config, &[Segment::General]);
        let share_at = |b: f64| {
            let teams = vec![
                team_with_product("team-1", &config, Segment::General, 400.0, 55.0, b),
                team_with_product("team-2", &config, Segment::General, 400.0, 55.0, 0.4),
            ];
            let refs: Vec<(String, &TeamState)> =
                teams.iter().map(|t| (t.id.clone(), t)).collect();
            let results = resolve_market(&refs, &market, &config).unwrap();
            results["team-1"].share_by_segment[&Segment::General]
        };
        prop_assert!(share_at(brand + 0.1) >= share_at(brand) - 1e-12);
    }
}
