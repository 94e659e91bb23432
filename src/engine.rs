//! The round engine: the deterministic cross-module pipeline.
//!
//! One call to [`RoundEngine::process_round`] advances every team by exactly
//! one round:
//!
//! 1. validate decisions (corrective, never fatal)
//! 2. per-team module passes — factory → HR → R&D → marketing → finance →
//!    materials — embarrassingly parallel across teams
//! 3. cross-team market resolution (the only coupling point; fatal on error)
//! 4. per-team finance close: COGS, revenue, statements, valuation
//! 5. economic cycle advance and events
//! 6. rankings
//! 7. achievement observation
//!
//! Determinism: all RNG streams derive from `(match_seed, round, stream,
//! team)`; the parallel phase collects results and re-sorts by team id, so
//! output is bit-identical for any worker count. A panic inside one module
//! processor rolls back that module for that team only and the round
//! proceeds.

use crate::achievement::AchievementObserver;
use crate::config::GameConfig;
use crate::cycle;
use crate::decisions::{validate_decisions, TeamDecisions};
use crate::error::{Result, SimulationError};
use crate::event::{EventBus, EventType};
use crate::finance::{self, refresh_credit_rating};
use crate::market::{MarketState, Region};
use crate::module::{LedgerDelta, ModuleKind, ModuleOutcome, Warning};
use crate::result::{
    rank_by, GameHistory, ModuleReport, Rankings, RoundReport, RoundWarning, TeamRoundResult,
};
use crate::rng::{RngStream, StreamRng};
use crate::scoring;
use crate::statements;
use crate::team::TeamState;
use crate::techtree::TechTree;
use crate::{esg, factory, hr, invariant, marketing, materials, research};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// One team's input to a round.
#[derive(Debug, Clone)]
pub struct TeamRoundInput {
    pub id: String,
    pub state: TeamState,
    pub decisions: TeamDecisions,
}

/// The frozen input of one round.
#[derive(Debug, Clone)]
pub struct RoundInput {
    pub round_number: u32,
    pub teams: Vec<TeamRoundInput>,
    pub market_state: MarketState,
    pub match_seed: u64,
    /// Economy events forced by the facilitator this round, if any
    pub forced_events: Vec<cycle::EconomyEvent>,
}

/// Outcome of one team's full module pass.
struct TeamPassOutcome {
    id: String,
    state: TeamState,
    ledger: LedgerDelta,
    module_reports: BTreeMap<ModuleKind, ModuleReport>,
    warnings: Vec<Warning>,
    rolled_back: Vec<(ModuleKind, String)>,
    forecast_message: Option<String>,
}

/// The deterministic round-processing engine.
///
/// Holds only immutable collaborators (config and tech tree); every round's
/// mutable state arrives through [`RoundInput`].
pub struct RoundEngine {
    config: GameConfig,
    tech_tree: TechTree,
}

impl RoundEngine {
    /// Builds an engine after validating the config (schema version
    /// included) and the tech tree.
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;
        let tech_tree = TechTree::standard();
        tech_tree.validate()?;
        Ok(RoundEngine { config, tech_tree })
    }

    /// Builds an engine with a custom tech catalogue.
    pub fn with_tech_tree(config: GameConfig, tech_tree: TechTree) -> Result<Self> {
        config.validate()?;
        tech_tree.validate()?;
        Ok(RoundEngine { config, tech_tree })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn tech_tree(&self) -> &TechTree {
        &self.tech_tree
    }

    /// Deterministic initialisation: a starting team snapshot and the
    /// starting market state.
    pub fn create_initial_state(&self, team_id: &str, name: &str) -> (TeamState, MarketState) {
        (TeamState::initial(team_id, name, &self.config), self.config.initial_market_state())
    }

    /// Pure decision validation; never mutates its inputs.
    pub fn validate_decisions(
        &self,
        state: &TeamState,
        decisions: &TeamDecisions,
    ) -> crate::decisions::ValidatedDecisions {
        validate_decisions(state, decisions, &self.config)
    }

    /// Processes one full round.
    ///
    /// Inputs are not mutated; on any error the caller's state is untouched.
    /// The optional observer receives the post-close snapshots for
    /// achievement diffing; the optional event bus collects engine events.
    pub fn process_round(
        &self,
        input: &RoundInput,
        mut observer: Option<&mut AchievementObserver>,
        mut events: Option<&mut EventBus>,
    ) -> Result<RoundReport> {
        let started = Instant::now();
        let round = input.round_number;
        let seed = input.match_seed;
        let market = &input.market_state;
        info!("processing round {} for {} teams", round, input.teams.len());

        // Teams sorted by id: scheduling must never influence output order.
        let mut teams: Vec<&TeamRoundInput> = input.teams.iter().collect();
        teams.sort_by(|a, b| a.id.cmp(&b.id));

        // Step 1: validate decisions.
        let mut validated = Vec::with_capacity(teams.len());
        let mut round_warnings: Vec<RoundWarning> = Vec::new();
        for team in &teams {
            let result = validate_decisions(&team.state, &team.decisions, &self.config);
            for warning in &result.warnings {
                if let Some(bus) = events.as_deref_mut() {
                    bus.emit(
                        round,
                        EventType::DecisionDropped {
                            team_id: team.id.clone(),
                            module: warning.module,
                            reason: warning.message.clone(),
                        },
                    );
                }
                round_warnings.push(RoundWarning {
                    team_id: team.id.clone(),
                    module: warning.module,
                    message: warning.message.clone(),
                });
            }
            validated.push(result.corrected);
        }

        // Step 2: per-team module passes, parallel across teams.
        let config = &self.config;
        let tree = &self.tech_tree;
        let mut passes: Vec<TeamPassOutcome> = teams
            .par_iter()
            .zip(validated.par_iter())
            .map(|(team, decisions)| {
                run_team_pass(&team.id, &team.state, decisions, market, config, tree, seed, round)
            })
            .collect();
        // par_iter preserves order, but the contract is by-id order, not
        // scheduler order; sort defensively.
        passes.sort_by(|a, b| a.id.cmp(&b.id));

        self.check_budget(started)?;

        // Step 3: cross-team market resolution. Fatal on failure.
        let scored_states: Vec<(String, &TeamState)> =
            passes.iter().map(|p| (p.id.clone(), &p.state)).collect();
        let market_results = scoring::resolve_market(&scored_states, market, config)?;

        // Step 5 runs on a clone so a later failure leaves inputs untouched;
        // the close below needs nothing from the new market state.
        let mut new_market = market.clone();
        let mut events_rng = StreamRng::new(seed, round, RngStream::Events, "");
        let mut fired = cycle::advance_market(&mut new_market, config, &mut events_rng);
        for event in &input.forced_events {
            let severity = events_rng.range(0.3, 1.0);
            event.apply(&mut new_market, severity);
            new_market.active_events.push(event.as_str().to_string());
            fired.push(*event);
        }

        // Step 4: finance close, sequential per team.
        let mut summary_messages = Vec::new();
        let mut results = Vec::with_capacity(passes.len());
        for pass in &mut passes {
            let market_result = market_results.get(&pass.id).cloned().unwrap_or_default();
            let prev = &teams.iter().find(|t| t.id == pass.id).expect("input team").state;

            if let Some(message) = pass.forecast_message.take() {
                summary_messages.push(format!("{}: {}", pass.id, message));
            }

            let units_sold = market_result.total_units();
            let cogs = team_cogs(&pass.state, &market_result);
            let market_revenue = market_result.total_revenue();

            // ESG multiplier and FX impact adjust realised revenue.
            let esg_multiplier = esg::revenue_multiplier(pass.state.esg_score, &config.esg);
            let revenue_by_region = split_revenue_by_region(&pass.state, market_revenue);
            let fx = finance::fx_impact(&revenue_by_region, market, pass.state.home_region);
            let revenue = market_revenue * esg_multiplier + fx;

            // Write allocation results onto the state.
            pass.state.sales_by_segment = market_result.sales_by_segment.clone();
            pass.state.market_share = market_result.share_by_segment.clone();

            let statements = statements::close_team_round(
                prev,
                &mut pass.state,
                revenue,
                units_sold,
                cogs,
                &pass.ledger,
                config,
            );
            statements::apply_valuation(&mut pass.state, config);
            refresh_credit_rating(
                &mut pass.state,
                statements.income.operating_income,
                statements.income.interest_expense,
            );

            // Bankruptcy is observable: negative cash at close must warn.
            if pass.state.cash < 0.0 {
                pass.state.bankrupt = true;
                round_warnings.push(RoundWarning {
                    team_id: pass.id.clone(),
                    module: ModuleKind::Finance,
                    message: format!(
                        "BankruptcyWarning: cash is negative ({:.0})",
                        pass.state.cash
                    ),
                });
                if let Some(bus) = events.as_deref_mut() {
                    bus.emit(
                        round,
                        EventType::Bankruptcy { team_id: pass.id.clone(), cash: pass.state.cash },
                    );
                }
            }

            pass.state.round = round;
            pass.state.clamp_all(config);

            let ratios = finance::ratios(&pass.state, config);
            let total_costs = pass.ledger.total_cash_out();
            results.push(TeamRoundResult {
                team_id: pass.id.clone(),
                new_state: pass.state.clone(),
                module_results: std::mem::take(&mut pass.module_reports),
                sales_by_segment: market_result.sales_by_segment,
                market_share_by_segment: market_result.share_by_segment,
                total_revenue: revenue,
                total_costs,
                net_income: pass.state.net_income,
                statements,
                ratios,
                credit_rating: pass.state.credit_rating,
                rank: 0,
                eps_rank: 0,
                market_share_rank: 0,
            });
        }

        for pass in &passes {
            for warning in &pass.warnings {
                round_warnings.push(RoundWarning {
                    team_id: pass.id.clone(),
                    module: warning.module,
                    message: warning.message.clone(),
                });
            }
            for (module, reason) in &pass.rolled_back {
                if let Some(bus) = events.as_deref_mut() {
                    bus.emit(
                        round,
                        EventType::ModuleRolledBack {
                            team_id: pass.id.clone(),
                            module: *module,
                            reason: reason.clone(),
                        },
                    );
                }
            }
        }

        if market.phase != new_market.phase {
            if let Some(bus) = events.as_deref_mut() {
                bus.emit(
                    round,
                    EventType::PhaseChanged {
                        from: market.phase.to_string(),
                        to: new_market.phase.to_string(),
                    },
                );
            }
            summary_messages
                .push(format!("economy moved from {} to {}", market.phase, new_market.phase));
        }
        for event in &fired {
            summary_messages.push(format!("economy event: {}", event));
            if let Some(bus) = events.as_deref_mut() {
                bus.emit(round, EventType::EconomyEvent { name: event.as_str().to_string() });
            }
        }

        // Step 6: rankings. Primary by net income, side rankings by EPS and
        // total market share; ties broken by team id.
        let net_income_key: Vec<(String, f64)> =
            results.iter().map(|r| (r.team_id.clone(), r.net_income)).collect();
        let eps_key: Vec<(String, f64)> =
            results.iter().map(|r| (r.team_id.clone(), r.new_state.eps)).collect();
        let share_key: Vec<(String, f64)> = results
            .iter()
            .map(|r| (r.team_id.clone(), r.market_share_by_segment.values().sum()))
            .collect();
        let rankings = Rankings {
            overall: rank_by(&net_income_key),
            by_eps: rank_by(&eps_key),
            by_market_share: rank_by(&share_key),
        };
        for result in &mut results {
            result.rank = position(&rankings.overall, &result.team_id);
            result.eps_rank = position(&rankings.by_eps, &result.team_id);
            result.market_share_rank = position(&rankings.by_market_share, &result.team_id);
        }

        // Step 7: achievement observation on the closed snapshots.
        let achievements = match observer.as_deref_mut() {
            Some(observer) => {
                let snapshots: Vec<&TeamState> = results.iter().map(|r| &r.new_state).collect();
                observer.observe(&snapshots)
            },
            None => Vec::new(),
        };

        self.check_budget(started)?;
        if let Some(bus) = events.as_deref_mut() {
            bus.emit(round, EventType::RoundCompleted { round, teams: results.len() });
        }
        debug!("round {} processed in {:?}", round, started.elapsed());

        Ok(RoundReport {
            round_number: round,
            results,
            rankings,
            new_market_state: new_market,
            summary_messages,
            warnings: round_warnings,
            achievements,
            economy_events: fired.iter().map(|e| e.as_str().to_string()).collect(),
        })
    }

    fn check_budget(&self, started: Instant) -> Result<()> {
        if let Some(budget_ms) = self.config.round_budget_ms {
            if started.elapsed().as_nanos() > budget_ms as u128 * 1_000_000 {
                return Err(SimulationError::RoundTimedOut { budget_ms });
            }
        }
        Ok(())
    }
}

/// Runs the fixed module pipeline for one team. Panics inside a processor
/// roll back that module only.
#[allow(clippy::too_many_arguments)]
fn run_team_pass(
    team_id: &str,
    state: &TeamState,
    decisions: &TeamDecisions,
    market: &MarketState,
    config: &GameConfig,
    tree: &TechTree,
    seed: u64,
    round: u32,
) -> TeamPassOutcome {
    let mut current = state.clone();
    let mut ledger = LedgerDelta::default();
    let mut module_reports = BTreeMap::new();
    let mut warnings = Vec::new();
    let mut rolled_back = Vec::new();

    // Score last round's forecast against the market the team just played
    // in, then clear it so a new submission can take its place.
    let forecast_message = current
        .pending_forecast
        .take()
        .map(|forecast| finance::score_forecast(&forecast, market));

    let mut factory_rng = StreamRng::new(seed, round, RngStream::Factory, team_id);
    let mut hr_rng = StreamRng::new(seed, round, RngStream::Hr, team_id);
    let mut research_rng = StreamRng::new(seed, round, RngStream::Research, team_id);
    let mut finance_rng = StreamRng::new(seed, round, RngStream::Market, team_id);

    for module in ModuleKind::all() {
        let before = current.clone();
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| match module {
            ModuleKind::Factory => {
                factory::process(&before, &decisions.factory, config, &mut factory_rng)
            },
            ModuleKind::Hr => hr::process(&before, &decisions.hr, config, &mut hr_rng),
            ModuleKind::Research => {
                research::process(&before, &decisions.research, config, tree, &mut research_rng)
            },
            ModuleKind::Marketing => marketing::process(&before, &decisions.marketing, config),
            ModuleKind::Finance => {
                finance::process(&before, &decisions.finance, market, config, &mut finance_rng)
            },
            ModuleKind::Materials => materials::process(&before, &decisions.materials, config),
        }));
        match attempt {
            Ok(outcome) => {
                let ModuleOutcome {
                    state: next,
                    costs,
                    revenue,
                    ledger: module_ledger,
                    messages,
                    warnings: module_warnings,
                    changes: _,
                } = outcome;
                current = next;
                ledger.absorb(&module_ledger);
                warnings.extend(module_warnings);
                module_reports.insert(module, ModuleReport { costs, revenue, messages });
            },
            Err(cause) => {
                let reason = panic_message(cause);
                warn!("team {}: {} module failed, rolled back ({})", team_id, module, reason);
                current = before;
                warnings.push(Warning::new(
                    module,
                    format!("module failed and was rolled back: {}", reason),
                ));
                rolled_back.push((module, reason));
                module_reports.insert(module, ModuleReport::default());
            },
        }
    }

    TeamPassOutcome {
        id: team_id.to_string(),
        state: current,
        ledger,
        module_reports,
        warnings,
        rolled_back,
        forecast_message,
    }
}

fn panic_message(cause: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = cause.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// COGS from realised sales: per contested segment, the units sold times the
/// average unit cost of the team's contending products there.
fn team_cogs(state: &TeamState, market_result: &scoring::TeamMarketResult) -> f64 {
    let mut cogs = 0.0;
    for (segment, units) in &market_result.sales_by_segment {
        let products = state.contending_products(*segment);
        if products.is_empty() {
            continue;
        }
        let avg_cost: f64 =
            products.iter().map(|p| p.unit_cost).sum::<f64>() / products.len() as f64;
        cogs += units * avg_cost;
    }
    cogs
}

/// Splits realised revenue across regions proportionally to factory
/// presence; a team with no factories books everything at home.
fn split_revenue_by_region(state: &TeamState, revenue: f64) -> BTreeMap<Region, f64> {
    let mut split = BTreeMap::new();
    if state.factories.is_empty() || revenue == 0.0 {
        split.insert(state.home_region, revenue);
        return split;
    }
    let per_factory = revenue / state.factories.len() as f64;
    for factory in &state.factories {
        *split.entry(factory.region).or_insert(0.0) += per_factory;
    }
    split
}

fn position(ranking: &[String], team_id: &str) -> u32 {
    ranking.iter().position(|id| id == team_id).map(|p| p as u32 + 1).unwrap_or(0)
}

/// A running game: engine plus committed state, history, and observers.
///
/// [`Game::advance`] is the submission-cycle boundary: it freezes the
/// decision set, processes one round, and commits the outputs. Across
/// rounds the game is strictly sequential.
pub struct Game {
    engine: RoundEngine,
    pub teams: BTreeMap<String, TeamState>,
    pub market: MarketState,
    pub history: GameHistory,
    pub observer: AchievementObserver,
    pub events: EventBus,
    round: u32,
}

impl Game {
    /// Creates a game with one starting team per name. Team ids are
    /// `team-1 .. team-n` in the order given.
    pub fn new(config: GameConfig, team_names: &[&str]) -> Result<Self> {
        let engine = RoundEngine::new(config)?;
        let market = engine.config().initial_market_state();
        let mut teams = BTreeMap::new();
        for (i, name) in team_names.iter().enumerate() {
            let id = format!("team-{}", i + 1);
            teams.insert(id.clone(), TeamState::initial(&id, name, engine.config()));
        }
        Ok(Game {
            engine,
            teams,
            market,
            history: GameHistory::default(),
            observer: AchievementObserver::default(),
            events: EventBus::new(true),
            round: 1,
        })
    }

    pub fn engine(&self) -> &RoundEngine {
        &self.engine
    }

    pub fn config(&self) -> &GameConfig {
        self.engine.config()
    }

    /// The upcoming round number.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Sets the upcoming round number; used when restoring a snapshot.
    pub(crate) fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    /// Installs achievement predicates (external data).
    pub fn set_predicates(&mut self, predicates: Vec<crate::achievement::Predicate>) {
        self.observer = AchievementObserver::new(predicates);
    }

    /// Processes one round from the given decision set and commits the
    /// result. Missing teams submit empty bundles.
    pub fn advance(
        &mut self,
        decisions: &BTreeMap<String, TeamDecisions>,
    ) -> Result<&RoundReport> {
        let input = RoundInput {
            round_number: self.round,
            teams: self
                .teams
                .values()
                .map(|state| TeamRoundInput {
                    id: state.id.clone(),
                    state: state.clone(),
                    decisions: decisions.get(&state.id).cloned().unwrap_or_default(),
                })
                .collect(),
            market_state: self.market.clone(),
            match_seed: self.config().seed,
            forced_events: vec![],
        };
        let report =
            self.engine.process_round(&input, Some(&mut self.observer), Some(&mut self.events))?;

        // Commit.
        for result in &report.results {
            self.teams.insert(result.team_id.clone(), result.new_state.clone());
        }
        self.market = report.new_market_state.clone();
        self.round += 1;

        if self.config().check_invariants {
            for violation in invariant::check_report(&report) {
                warn!("invariant violation: {}", violation);
            }
        }

        self.history.push(report);
        Ok(self.history.last().expect("report just pushed"))
    }
}
