//! End-to-end scenario tests for the round engine.

use crate::config::GameConfig;
use crate::decisions::{FinanceDecision, ResearchDecision, TeamDecisions};
use crate::engine::{Game, RoundEngine, RoundInput, TeamRoundInput};
use crate::product::Segment;
use crate::research::RiskLevel;
use crate::team::TeamState;
use crate::techtree::{TechNode, TechTree};
use crate::tests::test_helpers::{four_team_input, team_with_product};
use std::collections::BTreeMap;

#[test]
fn test_cost_leader_dominates_budget_segment() {
    // Four equal teams; one undercuts on price in the price-dominant Budget
    // segment and must take more than 40% of it.
    let config = GameConfig::default();
    assert_eq!(config.scoring.softmax_temperature, 4.0);
    let engine = RoundEngine::new(config.clone()).unwrap();
    let mut input =
        four_team_input(&config, Segment::Budget, [260.0, 260.0, 260.0, 260.0], 55.0, 0.4);
    input.teams[0].state.products.get_mut("p1").unwrap().price = 160.0;

    let report = engine.process_round(&input, None, None).unwrap();
    let share = report.team("team-1").unwrap().market_share_by_segment[&Segment::Budget];
    assert!(share > 0.40, "cost leader took only {:.3}", share);
}

#[test]
fn test_premium_product_dominates_professional_segment() {
    // Professional weighting is quality-dominant: the better product wins
    // despite the higher price.
    let config = GameConfig::default();
    let engine = RoundEngine::new(config.clone()).unwrap();
    let input = RoundInput {
        round_number: 1,
        teams: vec![
            TeamRoundInput {
                id: "team-1".to_string(),
                state: team_with_product(
                    "team-1",
                    &config,
                    Segment::Professional,
                    1_100.0,
                    90.0,
                    0.4,
                ),
                decisions: TeamDecisions::default(),
            },
            TeamRoundInput {
                id: "team-2".to_string(),
                state: team_with_product(
                    "team-2",
                    &config,
                    Segment::Professional,
                    1_250.0,
                    55.0,
                    0.4,
                ),
                decisions: TeamDecisions::default(),
            },
        ],
        market_state: config.initial_market_state(),
        match_seed: 42,
        forced_events: vec![],
    };
    let report = engine.process_round(&input, None, None).unwrap();
    let share_a = report.team("team-1").unwrap().market_share_by_segment[&Segment::Professional];
    let share_b = report.team("team-2").unwrap().market_share_by_segment[&Segment::Professional];
    assert!(share_a > share_b, "premium {:.3} vs {:.3}", share_a, share_b);
}

#[test]
fn test_share_conservation_under_four_way_competition() {
    let config = GameConfig::default();
    let engine = RoundEngine::new(config.clone()).unwrap();
    let input = four_team_input(
        &config,
        Segment::ActiveLifestyle,
        [180.0, 260.0, 340.0, 450.0],
        55.0,
        0.4,
    );
    let report = engine.process_round(&input, None, None).unwrap();
    let total: f64 = report
        .results
        .iter()
        .map(|r| {
            r.market_share_by_segment.get(&Segment::ActiveLifestyle).copied().unwrap_or(0.0)
        })
        .sum();
    assert!((total - 1.0).abs() < 1e-6, "shares sum to {}", total);
}

#[test]
fn test_rubber_banding_compresses_extreme_spreads() {
    // Five teams, one overwhelming leader. Compared with a neutral
    // stabiliser, rubber-banding strictly shrinks the leader and strictly
    // lifts every trailer, and shares stay conserved.
    let fields: [(f64, f64, f64); 5] = [
        (120.0, 85.0, 0.9),
        (290.0, 40.0, 0.1),
        (285.0, 42.0, 0.1),
        (288.0, 41.0, 0.1),
        (286.0, 43.0, 0.1),
    ];
    let run = |config: GameConfig| {
        let engine = RoundEngine::new(config.clone()).unwrap();
        let teams = fields
            .iter()
            .enumerate()
            .map(|(i, (price, quality, brand))| {
                let id = format!("team-{}", i + 1);
                TeamRoundInput {
                    id: id.clone(),
                    state: team_with_product(
                        &id,
                        &config,
                        Segment::Budget,
                        *price,
                        *quality,
                        *brand,
                    ),
                    decisions: TeamDecisions::default(),
                }
            })
            .collect();
        let input = RoundInput {
            round_number: 1,
            teams,
            market_state: config.initial_market_state(),
            match_seed: 42,
            forced_events: vec![],
        };
        engine.process_round(&input, None, None).unwrap()
    };

    let mut neutral_config = GameConfig::default();
    neutral_config.scoring.rubber_band_trailing_boost = 1.0;
    neutral_config.scoring.rubber_band_leading_penalty = 1.0;
    let neutral = run(neutral_config);
    let banded = run(GameConfig::default());

    let share = |report: &crate::result::RoundReport, team: &str| {
        report.team(team).unwrap().market_share_by_segment[&Segment::Budget]
    };
    assert!(share(&banded, "team-1") < share(&neutral, "team-1"));
    for i in 2..=5 {
        let id = format!("team-{}", i);
        assert!(
            share(&banded, &id) > share(&neutral, &id),
            "{} not lifted by rubber-banding",
            id
        );
    }
    let total: f64 = banded
        .results
        .iter()
        .map(|r| r.market_share_by_segment.get(&Segment::Budget).copied().unwrap_or(0.0))
        .sum();
    assert!((total - 1.0).abs() < 1e-6);
}

#[test]
fn test_tech_node_with_unmet_or_groups_starts_silently_after_unlock() {
    // AND prereqs [a, b] unlocked, OR groups [[c], [d, e]] unmet: the start
    // is silently dropped. Unlocking c opens the node.
    let nodes = vec![
        node("a", vec![], vec![]),
        node("b", vec![], vec![]),
        node("c", vec![], vec![]),
        node("d", vec![], vec![]),
        node("e", vec![], vec![]),
        node(
            "gated",
            vec!["a".to_string(), "b".to_string()],
            vec![vec!["c".to_string()], vec!["d".to_string(), "e".to_string()]],
        ),
    ];
    let tree = TechTree::new(nodes).unwrap();
    let config = GameConfig::default();
    let engine = RoundEngine::with_tech_tree(config.clone(), tree).unwrap();

    let mut state = TeamState::initial("team-1", "Aurora", &config);
    state.tech.unlocked.insert("a".to_string());
    state.tech.unlocked.insert("b".to_string());

    let start = TeamDecisions {
        research: vec![ResearchDecision::StartResearch {
            tech_id: "gated".to_string(),
            risk: RiskLevel::Conservative,
        }],
        ..TeamDecisions::default()
    };
    let input = RoundInput {
        round_number: 1,
        teams: vec![TeamRoundInput {
            id: "team-1".to_string(),
            state: state.clone(),
            decisions: start.clone(),
        }],
        market_state: config.initial_market_state(),
        match_seed: 42,
        forced_events: vec![],
    };
    let report = engine.process_round(&input, None, None).unwrap();
    let new_state = &report.team("team-1").unwrap().new_state;
    assert!(new_state.tech.active.is_empty(), "gated node must not start");
    assert!(
        !report.warnings.iter().any(|w| w.message.contains("gated")),
        "prerequisite failure must be silent"
    );

    // Unlocking c satisfies the first OR group.
    state.tech.unlocked.insert("c".to_string());
    let input = RoundInput {
        round_number: 1,
        teams: vec![TeamRoundInput { id: "team-1".to_string(), state, decisions: start }],
        market_state: config.initial_market_state(),
        match_seed: 42,
        forced_events: vec![],
    };
    let report = engine.process_round(&input, None, None).unwrap();
    let new_state = &report.team("team-1").unwrap().new_state;
    assert!(
        new_state.tech.active.iter().any(|a| a.tech_id == "gated")
            || new_state.tech.unlocked.contains("gated"),
        "node should start once an OR group is satisfied"
    );
}

fn node(id: &str, and_prereqs: Vec<String>, or_groups: Vec<Vec<String>>) -> TechNode {
    TechNode {
        id: id.to_string(),
        name: id.to_uppercase(),
        tier: 1,
        cost: 1_000_000.0,
        rounds: 2,
        and_prereqs,
        or_prereq_groups: or_groups,
        effects: vec![],
        family: None,
    }
}

#[test]
fn test_buyback_scenario_reconciles() {
    // The reference buyback: 200M cash, 10M shares at 50, 10M net income,
    // 50M buyback. Shares drop by exactly one million, EPS rises to ~1.11,
    // the price boost is 5.56%, and the books still balance after close.
    let config = GameConfig::default();
    let engine = RoundEngine::new(config.clone()).unwrap();
    let mut state = team_with_product("team-1", &config, Segment::General, 400.0, 60.0, 0.4);
    state.cash = 200_000_000.0;
    state.shares_issued = 10_000_000;
    state.share_price = 50.0;
    state.market_cap = 500_000_000.0;
    state.net_income = 10_000_000.0;

    let decisions = TeamDecisions {
        finance: vec![FinanceDecision::BuybackShares { amount: 50_000_000.0 }],
        ..TeamDecisions::default()
    };
    let input = RoundInput {
        round_number: 1,
        teams: vec![TeamRoundInput { id: "team-1".to_string(), state, decisions }],
        market_state: config.initial_market_state(),
        match_seed: 42,
        forced_events: vec![],
    };
    let report = engine.process_round(&input, None, None).unwrap();
    let result = report.team("team-1").unwrap();

    assert_eq!(result.new_state.shares_issued, 9_000_000);
    assert_eq!(result.statements.cash_flow.share_buybacks, 50_000_000.0);
    assert!(
        result.statements.diagnostics.is_empty(),
        "statements failed to reconcile: {:?}",
        result.statements.diagnostics
    );
    assert!(result.statements.balance.gap().abs() <= 0.01);
}

#[test]
fn test_multi_round_scripted_game_stays_sound() {
    // A full scripted game: every round must keep the invariant suite green
    // and leave every team's books balanced.
    let config = GameConfig::default();
    let mut game = Game::new(config, &["Aurora", "Borealis", "Cirrus", "Dune"]).unwrap();
    for _ in 0..8 {
        let decisions: BTreeMap<String, TeamDecisions> = game
            .teams
            .values()
            .map(|team| (team.id.clone(), crate::script::baseline_decisions(team, &game.market)))
            .collect();
        let report = game.advance(&decisions).unwrap();
        let violations = crate::invariant::check_report(report);
        assert!(
            violations.is_empty(),
            "round {} violations: {:?}",
            report.round_number,
            violations
        );
        for result in &report.results {
            assert!(
                result.statements.diagnostics.is_empty(),
                "round {} team {} diagnostics: {:?}",
                report.round_number,
                result.team_id,
                result.statements.diagnostics
            );
        }
    }
    assert_eq!(game.round(), 9);
}

#[test]
fn test_scripted_game_rankings_are_complete() {
    let config = GameConfig::default();
    let mut game = Game::new(config, &["Aurora", "Borealis", "Cirrus"]).unwrap();
    let decisions: BTreeMap<String, TeamDecisions> = game
        .teams
        .values()
        .map(|team| (team.id.clone(), crate::script::baseline_decisions(team, &game.market)))
        .collect();
    let report = game.advance(&decisions).unwrap();
    assert_eq!(report.rankings.overall.len(), 3);
    assert_eq!(report.rankings.by_eps.len(), 3);
    assert_eq!(report.rankings.by_market_share.len(), 3);
    let mut ranks: Vec<u32> = report.results.iter().map(|r| r.rank).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, vec![1, 2, 3]);
}
