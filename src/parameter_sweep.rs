//! Balance sweeps and Monte Carlo analysis.
//!
//! A sweep runs scripted games across a grid of values for one scoring
//! parameter (softmax temperature, rubber-band boost, price-floor penalty,
//! brand decay) and aggregates outcome statistics, to answer questions like
//! "how flat does competition get as temperature rises". Monte Carlo mode
//! replays the same scripted game under consecutive seeds and aggregates the
//! final standings.

use crate::config::GameConfig;
use crate::decisions::TeamDecisions;
use crate::engine::Game;
use crate::error::Result;
use crate::script::baseline_decisions;
use colored::Colorize;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate statistics over a set of runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Computes aggregate statistics for a sample.
pub fn calculate_statistics(values: &[f64]) -> RunStats {
    if values.is_empty() {
        return RunStats::default();
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    RunStats { mean, std_dev: variance.sqrt(), min, max }
}

/// Specification for a sweep over a single scoring parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SweepParameter {
    /// Sweep over softmax temperature values
    SoftmaxTemperature { min: f64, max: f64, steps: usize },
    /// Sweep over rubber-band trailing-boost values
    RubberBandBoost { min: f64, max: f64, steps: usize },
    /// Sweep over price-floor penalty maxima
    PriceFloorPenalty { min: f64, max: f64, steps: usize },
    /// Sweep over brand decay rates
    BrandDecay { min: f64, max: f64, steps: usize },
}

impl SweepParameter {
    /// Get the parameter name for display
    pub fn name(&self) -> &str {
        match self {
            SweepParameter::SoftmaxTemperature { .. } => "softmax_temperature",
            SweepParameter::RubberBandBoost { .. } => "rubber_band_trailing_boost",
            SweepParameter::PriceFloorPenalty { .. } => "price_floor_penalty_max",
            SweepParameter::BrandDecay { .. } => "brand_decay_rate",
        }
    }

    /// Generate the list of values to test for this parameter
    pub fn values(&self) -> Vec<f64> {
        match self {
            SweepParameter::SoftmaxTemperature { min, max, steps }
            | SweepParameter::RubberBandBoost { min, max, steps }
            | SweepParameter::PriceFloorPenalty { min, max, steps }
            | SweepParameter::BrandDecay { min, max, steps } => {
                if *steps <= 1 {
                    vec![*min]
                } else {
                    let step_size = (max - min) / (*steps - 1) as f64;
                    (0..*steps).map(|i| min + i as f64 * step_size).collect()
                }
            },
        }
    }

    /// Apply this parameter value to a configuration
    pub fn apply_to_config(&self, config: &mut GameConfig, value: f64) {
        match self {
            SweepParameter::SoftmaxTemperature { .. } => {
                config.scoring.softmax_temperature = value
            },
            SweepParameter::RubberBandBoost { .. } => {
                config.scoring.rubber_band_trailing_boost = value
            },
            SweepParameter::PriceFloorPenalty { .. } => {
                config.scoring.price_floor_penalty_max = value
            },
            SweepParameter::BrandDecay { .. } => config.marketing.brand_decay_rate = value,
        }
    }
}

/// Outcome metrics of one scripted game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Spread between the best and worst team's total market share
    pub share_spread: f64,
    /// Teams bankrupt at game end
    pub bankruptcies: usize,
    /// Mean final-round net income across teams
    pub mean_net_income: f64,
    /// Team ids in final overall ranking order
    pub final_ranking: Vec<String>,
}

/// Runs one scripted game and measures its outcome.
fn run_scripted_game(config: GameConfig, teams: usize, rounds: u32) -> Result<GameOutcome> {
    let names: Vec<String> = (1..=teams).map(|i| format!("Team {}", i)).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut game = Game::new(config, &name_refs)?;
    for _ in 0..rounds {
        let decisions: BTreeMap<String, TeamDecisions> = game
            .teams
            .values()
            .map(|team| (team.id.clone(), baseline_decisions(team, &game.market)))
            .collect();
        game.advance(&decisions)?;
    }
    let shares: Vec<f64> =
        game.teams.values().map(|t| t.market_share.values().sum::<f64>()).collect();
    let spread = shares.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        - shares.iter().copied().fold(f64::INFINITY, f64::min);
    let final_ranking = game
        .history
        .last()
        .map(|report| report.rankings.overall.clone())
        .unwrap_or_default();
    Ok(GameOutcome {
        share_spread: spread.max(0.0),
        bankruptcies: game.teams.values().filter(|t| t.bankrupt).count(),
        mean_net_income: game.teams.values().map(|t| t.net_income).sum::<f64>()
            / game.teams.len().max(1) as f64,
        final_ranking,
    })
}

/// Result from a single parameter value in a sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepPoint {
    pub parameter_value: f64,
    pub share_spread: RunStats,
    pub mean_net_income: RunStats,
    pub total_bankruptcies: usize,
}

/// Complete results from a balance sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult {
    pub parameter_name: String,
    pub runs_per_point: usize,
    pub base_seed: u64,
    pub points: Vec<SweepPoint>,
    pub total_games: usize,
}

impl SweepResult {
    /// Runs a sweep: for each parameter value, `runs_per_point` scripted
    /// games under seeds `seed .. seed + runs`, in parallel per value.
    pub fn run_sweep(
        base_config: GameConfig,
        parameter: SweepParameter,
        teams: usize,
        rounds: u32,
        runs_per_point: usize,
    ) -> Result<Self> {
        let parameter_name = parameter.name().to_string();
        let values = parameter.values();
        let base_seed = base_config.seed;
        info!(
            "balance sweep: {} over {} values, {} runs each",
            parameter_name,
            values.len(),
            runs_per_point
        );

        let points: Vec<SweepPoint> = values
            .par_iter()
            .map(|&value| {
                let outcomes: Vec<GameOutcome> = (0..runs_per_point)
                    .into_par_iter()
                    .filter_map(|run| {
                        let mut config = base_config.clone();
                        parameter.apply_to_config(&mut config, value);
                        config.seed = base_seed + run as u64;
                        run_scripted_game(config, teams, rounds).ok()
                    })
                    .collect();
                let spreads: Vec<f64> = outcomes.iter().map(|o| o.share_spread).collect();
                let incomes: Vec<f64> = outcomes.iter().map(|o| o.mean_net_income).collect();
                SweepPoint {
                    parameter_value: value,
                    share_spread: calculate_statistics(&spreads),
                    mean_net_income: calculate_statistics(&incomes),
                    total_bankruptcies: outcomes.iter().map(|o| o.bankruptcies).sum(),
                }
            })
            .collect();

        let total_games = points.len() * runs_per_point;
        Ok(SweepResult { parameter_name, runs_per_point, base_seed, points, total_games })
    }

    /// Renders a compact table of the sweep.
    pub fn table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{}\n",
            format!("=== Sweep: {} ({} games) ===", self.parameter_name, self.total_games).bold()
        ));
        out.push_str(&format!(
            "{:>12} {:>14} {:>14} {:>14}\n",
            "value", "spread mean", "spread std", "bankruptcies"
        ));
        for point in &self.points {
            out.push_str(&format!(
                "{:>12.3} {:>14.4} {:>14.4} {:>14}\n",
                point.parameter_value,
                point.share_spread.mean,
                point.share_spread.std_dev,
                point.total_bankruptcies
            ));
        }
        out
    }
}

/// Aggregated result of Monte Carlo runs under consecutive seeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub runs: usize,
    pub base_seed: u64,
    pub share_spread: RunStats,
    pub mean_net_income: RunStats,
    /// How often each team id finished first
    pub wins_by_team: BTreeMap<String, usize>,
}

/// Runs the same scripted game under `runs` consecutive seeds.
pub fn run_monte_carlo(
    base_config: GameConfig,
    teams: usize,
    rounds: u32,
    runs: usize,
) -> Result<MonteCarloResult> {
    let base_seed = base_config.seed;
    let outcomes: Vec<GameOutcome> = (0..runs)
        .into_par_iter()
        .filter_map(|run| {
            let mut config = base_config.clone();
            config.seed = base_seed + run as u64;
            run_scripted_game(config, teams, rounds).ok()
        })
        .collect();

    let spreads: Vec<f64> = outcomes.iter().map(|o| o.share_spread).collect();
    let incomes: Vec<f64> = outcomes.iter().map(|o| o.mean_net_income).collect();
    let mut wins_by_team = BTreeMap::new();
    for outcome in &outcomes {
        if let Some(winner) = outcome.final_ranking.first() {
            *wins_by_team.entry(winner.clone()).or_insert(0) += 1;
        }
    }
    Ok(MonteCarloResult {
        runs: outcomes.len(),
        base_seed,
        share_spread: calculate_statistics(&spreads),
        mean_net_income: calculate_statistics(&incomes),
        wins_by_team,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics() {
        let stats = calculate_statistics(&[1.0, 2.0, 3.0, 4.0]);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert!(stats.std_dev > 1.0 && stats.std_dev < 1.2);
    }

    #[test]
    fn test_statistics_empty() {
        let stats = calculate_statistics(&[]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_parameter_values_grid() {
        let parameter = SweepParameter::SoftmaxTemperature { min: 1.0, max: 5.0, steps: 5 };
        assert_eq!(parameter.values(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let single = SweepParameter::BrandDecay { min: 0.02, max: 0.1, steps: 1 };
        assert_eq!(single.values(), vec![0.02]);
    }

    #[test]
    fn test_apply_to_config() {
        let mut config = GameConfig::default();
        let parameter = SweepParameter::RubberBandBoost { min: 1.0, max: 1.5, steps: 3 };
        parameter.apply_to_config(&mut config, 1.25);
        assert_eq!(config.scoring.rubber_band_trailing_boost, 1.25);
    }

    #[test]
    fn test_small_sweep_runs() {
        let config = GameConfig::default();
        let parameter = SweepParameter::SoftmaxTemperature { min: 2.0, max: 6.0, steps: 2 };
        let result = SweepResult::run_sweep(config, parameter, 3, 3, 2).unwrap();
        assert_eq!(result.points.len(), 2);
        assert_eq!(result.total_games, 4);
        assert!(result.table().contains("softmax_temperature"));
    }

    #[test]
    fn test_monte_carlo_aggregates_wins() {
        let config = GameConfig::default();
        let result = run_monte_carlo(config, 3, 3, 3).unwrap();
        assert_eq!(result.runs, 3);
        let total_wins: usize = result.wins_by_team.values().sum();
        assert_eq!(total_wins, 3);
    }
}
