//! # Business Simulation Engine
//!
//! A multi-team, turn-based business simulation platform. Teams submit
//! per-module decisions; a deterministic round engine resolves one discrete
//! round by running an ordered pipeline of interacting subsystems — factory,
//! HR, R&D, marketing, finance, materials/logistics, ESG, market demand and
//! competitive scoring — and produces new team states, financial statements,
//! market shares, rankings and events.
//!
//! ## Overview
//!
//! The round pipeline:
//! - Decisions are validated at the boundary; malformed or unaffordable
//!   items are dropped with warnings, never aborting the round
//! - Each team runs its six module processors on an isolated clone of its
//!   state (parallel across teams)
//! - A softmax allocator couples teams through shared per-segment demand
//!   and conserves market share exactly
//! - A statements engine closes each team's round with reconciled income
//!   statement, balance sheet and cash flow
//! - The economy advances through a Markov phase cycle with named events
//!
//! ## Quick Start
//!
//! ```no_run
//! use business_simulation::{Game, GameConfig};
//! use std::collections::BTreeMap;
//!
//! // Create a game with four teams under the default balance.
//! let config = GameConfig::default();
//! let mut game = Game::new(config, &["Aurora", "Borealis", "Cirrus", "Dune"]).unwrap();
//!
//! // Advance one round (empty decision bundles here).
//! let report = game.advance(&BTreeMap::new()).unwrap();
//! println!("round {} processed, {} teams ranked", report.round_number, report.results.len());
//! ```
//!
//! ## Determinism
//!
//! For a given `(config, seed, decisions, market state)` the full round
//! output is bit-identical across runs, machines and rayon worker counts.
//! RNG streams are partitioned per subsystem and per team, and re-derived
//! each round from `(seed, round, stream, team)`, so no subsystem can
//! perturb another's draws.
//!
//! ## Modules
//!
//! - [`achievement`] - Achievement hook observing state transitions
//! - [`completion`] - Shell completion generation
//! - [`config`] - The versioned game parameter bundle and difficulty presets
//! - [`credit_rating`] - Corporate credit rating tiers and scoring
//! - [`cycle`] - Economic phase Markov chain and named economy events
//! - [`decisions`] - Tagged per-module decision bundles and validation
//! - [`engine`] - The round orchestrator and the [`Game`] runner
//! - [`error`] - Fatal error types
//! - [`esg`] - ESG tier effects on revenue and competitive scoring
//! - [`event`] - Engine event collection
//! - [`factory`] - Factories, machines, and the factory processor
//! - [`finance`] - Debt, equity, dividends, ratios, board meetings
//! - [`hr`] - Workforce management
//! - [`invariant`] - Invariant checking for round outputs
//! - [`market`] - The shared market environment
//! - [`marketing`] - Advertising, branding and promotions
//! - [`materials`] - Material orders, inventory and logistics
//! - [`module`] - The processor/engine contract
//! - [`parameter_sweep`] - Balance sweeps and Monte Carlo analysis
//! - [`product`] - Products and consumer segments
//! - [`replay`] - Decision logging and bit-identical replay
//! - [`research`] - R&D projects, product development, patents
//! - [`result`] - Round reports, rankings, exports
//! - [`rng`] - Stream-partitioned deterministic RNG
//! - [`scoring`] - Cross-team market resolution (softmax + rubber-banding)
//! - [`script`] - Scripted baseline decisions for demo games
//! - [`snapshot`] - Game snapshot save/load
//! - [`statements`] - Reconciled financial statements
//! - [`team`] - Team state snapshots
//! - [`techtree`] - The research DAG with AND/OR prerequisites

pub mod achievement;
pub mod completion;
pub mod config;
pub mod credit_rating;
pub mod cycle;
pub mod decisions;
pub mod engine;
pub mod error;
pub mod esg;
pub mod event;
pub mod factory;
pub mod finance;
pub mod hr;
pub mod invariant;
pub mod market;
pub mod marketing;
pub mod materials;
pub mod module;
pub mod parameter_sweep;
pub mod product;
pub mod replay;
pub mod research;
pub mod result;
pub mod rng;
pub mod scoring;
pub mod script;
pub mod snapshot;
pub mod statements;
pub mod team;
pub mod techtree;

#[cfg(test)]
mod tests;

pub use config::{Difficulty, GameConfig, ENGINE_SCHEMA_VERSION};
pub use engine::{Game, RoundEngine, RoundInput, TeamRoundInput};
pub use error::{Result, SimulationError};
pub use market::{EconomicPhase, MarketState, Region};
pub use product::{Product, Segment};
pub use result::{GameHistory, RoundReport};
pub use team::TeamState;
