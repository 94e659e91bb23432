//! Shared helpers for the integration test modules.

use crate::config::GameConfig;
use crate::engine::{RoundInput, TeamRoundInput};
use crate::decisions::TeamDecisions;
use crate::market::MarketState;
use crate::product::{DevelopmentStatus, Product, Segment};
use crate::team::TeamState;

/// A team with one launched product in the given segment.
pub fn team_with_product(
    id: &str,
    config: &GameConfig,
    segment: Segment,
    price: f64,
    quality: f64,
    brand: f64,
) -> TeamState {
    let mut team = TeamState::initial(id, id, config);
    team.brand_value = brand;
    let mut product = Product::new("p1", "Flagship", segment, quality, price);
    product.quality = quality;
    product.features = 50.0;
    product.unit_cost = price * 0.45;
    product.status = DevelopmentStatus::Launched;
    team.products.insert("p1".to_string(), product);
    team
}

/// Four equal teams contending in one segment at given prices.
pub fn four_team_input(
    config: &GameConfig,
    segment: Segment,
    prices: [f64; 4],
    quality: f64,
    brand: f64,
) -> RoundInput {
    let teams = prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            let id = format!("team-{}", i + 1);
            TeamRoundInput {
                id: id.clone(),
                state: team_with_product(&id, config, segment, *price, quality, brand),
                decisions: TeamDecisions::default(),
            }
        })
        .collect();
    RoundInput {
        round_number: 1,
        teams,
        market_state: config.initial_market_state(),
        match_seed: config.seed,
        forced_events: vec![],
    }
}

/// Market state with only the given segments open.
pub fn market_with_segments(config: &GameConfig, segments: &[Segment]) -> MarketState {
    let mut market = config.initial_market_state();
    market.segments.retain(|segment, _| segments.contains(segment));
    market
}
