//! Workforce management: salaries, hiring, training, benefits, turnover.
//!
//! The HR pass applies the round's people decisions, then runs the workforce
//! simulation: salary cost, turnover draws, new-hire productivity ramps and
//! training fatigue.

use crate::config::GameConfig;
use crate::decisions::HrDecision;
use crate::module::{LedgerDelta, ModuleKind, ModuleOutcome, StateChange, Warning};
use crate::rng::StreamRng;
use crate::team::{HireCohort, TeamState};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{EnumIter, EnumString};

/// Workforce roles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Worker,
    Supervisor,
    Engineer,
}

impl Role {
    pub fn all() -> Vec<Role> {
        vec![Role::Worker, Role::Supervisor, Role::Engineer]
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Worker => "worker",
            Role::Supervisor => "supervisor",
            Role::Engineer => "engineer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-round salary for one head of a role under the current multipliers.
///
/// The multiplier is clamped into the configured band, and the result into
/// the absolute ceiling.
pub fn salary_for(role: Role, state: &TeamState, config: &GameConfig) -> f64 {
    let base = config.hr.base_salary.get(&role).copied().unwrap_or(0.0);
    let multiplier = state
        .workforce
        .salary_multipliers
        .get(&role)
        .copied()
        .unwrap_or(1.0)
        .clamp(config.hr.salary_multiplier_min, config.hr.salary_multiplier_max);
    (base * multiplier).min(config.hr.max_salary)
}

/// Per-round turnover rate given morale, burnout and active benefits.
pub fn turnover_rate(state: &TeamState, config: &GameConfig) -> f64 {
    let hr = &config.hr;
    let mut rate = hr.base_turnover_rate;
    if state.workforce.morale < 50.0 {
        rate += hr.low_morale_turnover_increase;
    }
    if state.workforce.burnout > 50.0 {
        rate += hr.burnout_turnover_increase;
    }
    let benefit_reduction: f64 = state
        .workforce
        .benefits
        .iter()
        .filter_map(|b| hr.benefit_catalog.get(b))
        .map(|spec| spec.turnover_reduction)
        .sum();
    rate -= benefit_reduction.min(hr.benefits_turnover_reduction_cap);
    rate.max(0.0)
}

/// Effective productive headcount for a role, discounting ramping hires.
///
/// A cohort hired R rounds ago contributes `ramp_up_productivity[R]` per head
/// while R is inside the ramp table; after that it counts fully (it has also
/// left the cohort list by then).
pub fn effective_headcount(state: &TeamState, role: Role, config: &GameConfig) -> f64 {
    let full = state.headcount(role) as f64;
    let ramp = &config.hr.ramp_up_productivity;
    let discount: f64 = state
        .workforce
        .ramping_hires
        .iter()
        .filter(|c| c.role == role)
        .map(|c| {
            let idx = c.rounds_since_hire as usize;
            let productivity = ramp.get(idx).copied().unwrap_or(1.0);
            c.count as f64 * (1.0 - productivity)
        })
        .sum();
    (full - discount).max(0.0)
}

/// Runs the HR pass for one team.
pub fn process(
    state: &TeamState,
    decisions: &[HrDecision],
    config: &GameConfig,
    rng: &mut StreamRng,
) -> ModuleOutcome {
    let mut state = state.clone();
    let mut ledger = LedgerDelta::default();
    let mut messages = Vec::new();
    let mut warnings = Vec::new();
    let mut changes = Vec::new();

    // The training counter resets at year boundaries.
    if state.round % config.rounds_per_year.max(1) == 0 {
        state.workforce.trainings_this_year = 0;
    }

    for decision in decisions {
        match decision {
            HrDecision::SetSalaryMultiplier { role, multiplier } => {
                let clamped = multiplier
                    .clamp(config.hr.salary_multiplier_min, config.hr.salary_multiplier_max);
                let before =
                    state.workforce.salary_multipliers.get(role).copied().unwrap_or(1.0);
                state.workforce.salary_multipliers.insert(*role, clamped);
                changes.push(StateChange::new(
                    format!("workforce.salary_multipliers.{}", role),
                    format!("{:.2}", before),
                    format!("{:.2}", clamped),
                ));
                // Pay moves morale: raises please, cuts sting.
                let delta = (clamped - before) * 10.0;
                state.workforce.morale = (state.workforce.morale + delta).clamp(0.0, 100.0);
            },
            HrDecision::ScheduleTraining { focus } => {
                if config.hr.training_cost > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Hr,
                        format!("insufficient cash for {} training", focus),
                    ));
                    continue;
                }
                state.cash -= config.hr.training_cost;
                ledger.opex += config.hr.training_cost;
                state.workforce.trainings_this_year += 1;

                let over = state
                    .workforce
                    .trainings_this_year
                    .saturating_sub(config.hr.training_fatigue_threshold);
                let effectiveness =
                    (1.0 - over as f64 * config.hr.training_fatigue_penalty).max(0.0);
                state.workforce.morale = (state.workforce.morale
                    + config.hr.training_morale_bonus * effectiveness)
                    .min(100.0);
                state.workforce.productivity = (state.workforce.productivity
                    + config.hr.training_productivity_bonus * effectiveness)
                    .min(100.0);
                if over > 0 {
                    messages.push(format!(
                        "training fatigue: effectiveness down to {:.0}%",
                        effectiveness * 100.0
                    ));
                }
            },
            HrDecision::AdjustHeadcount { factory_id, role, delta } => {
                let fi = match factory_id {
                    Some(fid) => match state.factories.iter().position(|f| &f.id == fid) {
                        Some(fi) => fi,
                        None => {
                            warnings.push(Warning::new(
                                ModuleKind::Hr,
                                format!("unknown factory '{}'", fid),
                            ));
                            continue;
                        },
                    },
                    None => 0,
                };
                if state.factories.is_empty() {
                    continue;
                }
                if *delta > 0 {
                    let count = *delta as u32;
                    let cost = count as f64 * config.hr.hiring_cost_per_head;
                    if cost > state.cash {
                        warnings.push(Warning::new(
                            ModuleKind::Hr,
                            format!("insufficient cash to hire {} {}s", count, role),
                        ));
                        continue;
                    }
                    state.cash -= cost;
                    ledger.opex += cost;
                    *state.factories[fi].headcount_mut(*role) += count;
                    state.workforce.ramping_hires.push(HireCohort {
                        role: *role,
                        count,
                        rounds_since_hire: 0,
                    });
                    messages.push(format!("hired {} {}s", count, role));
                } else {
                    let want = delta.unsigned_abs() as u32;
                    let have = state.factories[fi].headcount(*role);
                    let count = want.min(have);
                    if count == 0 {
                        continue;
                    }
                    let cost = count as f64 * config.hr.firing_cost_per_head;
                    state.cash -= cost;
                    ledger.opex += cost;
                    *state.factories[fi].headcount_mut(*role) -= count;
                    state.workforce.morale = (state.workforce.morale
                        - count as f64 * config.hr.firing_morale_penalty)
                        .max(0.0);
                    messages.push(format!("dismissed {} {}s", count, role));
                }
            },
            HrDecision::SetBenefit { benefit, enabled } => {
                if *enabled {
                    if state.workforce.benefits.insert(benefit.clone()) {
                        if let Some(spec) = config.hr.benefit_catalog.get(benefit) {
                            state.workforce.morale =
                                (state.workforce.morale + spec.morale_bonus).min(100.0);
                        }
                    }
                } else {
                    state.workforce.benefits.remove(benefit);
                }
            },
        }
    }

    // Salary and benefit cost for the whole workforce.
    let mut payroll = 0.0;
    for role in Role::all() {
        payroll += state.headcount(role) as f64 * salary_for(role, &state, config);
    }
    let headcount = state.total_headcount() as f64;
    let benefit_cost: f64 = state
        .workforce
        .benefits
        .iter()
        .filter_map(|b| config.hr.benefit_catalog.get(b))
        .map(|spec| spec.cost_per_employee * headcount)
        .sum();
    state.cash -= payroll + benefit_cost;
    ledger.opex += payroll + benefit_cost;

    // Turnover: a deterministic expected-loss fraction, with the remainder as
    // a per-team coin for the last head.
    let rate = turnover_rate(&state, config);
    let mut departed_total = 0u32;
    for fi in 0..state.factories.len() {
        for role in Role::all() {
            let have = state.factories[fi].headcount(role);
            if have == 0 {
                continue;
            }
            let expected = have as f64 * rate;
            let mut departures = expected.floor() as u32;
            if rng.chance(expected.fract()) {
                departures += 1;
            }
            let departures = departures.min(have);
            *state.factories[fi].headcount_mut(role) -= departures;
            departed_total += departures;
        }
    }
    if departed_total > 0 {
        debug!("{} heads left team {} (rate {:.3})", departed_total, state.id, rate);
        messages.push(format!("{} employees left this round", departed_total));
    }

    // Advance hire cohorts through the ramp table.
    let ramp_len = config.hr.ramp_up_productivity.len() as u32;
    for cohort in &mut state.workforce.ramping_hires {
        cohort.rounds_since_hire += 1;
    }
    state.workforce.ramping_hires.retain(|c| c.rounds_since_hire < ramp_len);

    // Morale and burnout drift back toward their baselines.
    state.workforce.morale = (state.workforce.morale - 0.5).max(0.0);
    state.workforce.burnout = (state.workforce.burnout - 2.0).max(0.0);

    let costs = ledger.total_cash_out();
    ModuleOutcome { state, costs, revenue: 0.0, ledger, messages, warnings, changes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::rng::{RngStream, StreamRng};

    fn setup() -> (TeamState, GameConfig, StreamRng) {
        let config = GameConfig::default();
        let team = TeamState::initial("team-a", "Aurora Devices", &config);
        let rng = StreamRng::new(42, 1, RngStream::Hr, "team-a");
        (team, config, rng)
    }

    #[test]
    fn test_salary_clamped_to_band_and_ceiling() {
        let (mut team, config, _) = setup();
        team.workforce.salary_multipliers.insert(Role::Engineer, 50.0);
        let salary = salary_for(Role::Engineer, &team, &config);
        let base = config.hr.base_salary[&Role::Engineer];
        assert!(salary <= base * config.hr.salary_multiplier_max);
        assert!(salary <= config.hr.max_salary);

        team.workforce.salary_multipliers.insert(Role::Worker, 0.1);
        let salary = salary_for(Role::Worker, &team, &config);
        let base = config.hr.base_salary[&Role::Worker];
        assert_eq!(salary, base * config.hr.salary_multiplier_min);
    }

    #[test]
    fn test_turnover_increases_with_low_morale_and_burnout() {
        let (mut team, config, _) = setup();
        let baseline = turnover_rate(&team, &config);
        team.workforce.morale = 30.0;
        team.workforce.burnout = 80.0;
        let stressed = turnover_rate(&team, &config);
        assert!(stressed > baseline);
        assert!(
            (stressed - baseline
                - config.hr.low_morale_turnover_increase
                - config.hr.burnout_turnover_increase)
                .abs()
                < 1e-12
        );
    }

    #[test]
    fn test_benefit_reduction_is_capped() {
        let (mut team, config, _) = setup();
        for benefit in config.hr.benefit_catalog.keys() {
            team.workforce.benefits.insert(benefit.clone());
        }
        let rate = turnover_rate(&team, &config);
        assert!(
            rate >= config.hr.base_turnover_rate - config.hr.benefits_turnover_reduction_cap
                - 1e-12
        );
    }

    #[test]
    fn test_hiring_creates_ramp_cohort() {
        let (team, config, mut rng) = setup();
        let decisions =
            vec![HrDecision::AdjustHeadcount { factory_id: None, role: Role::Engineer, delta: 20 }];
        let outcome = process(&team, &decisions, &config, &mut rng);
        // Cohort advanced one round during the same pass.
        assert_eq!(outcome.state.workforce.ramping_hires.len(), 1);
        assert_eq!(outcome.state.workforce.ramping_hires[0].rounds_since_hire, 1);
        assert!(outcome.state.headcount(Role::Engineer) >= team.headcount(Role::Engineer));
    }

    #[test]
    fn test_effective_headcount_discounts_ramping_hires() {
        let (mut team, config, _) = setup();
        let full_before = effective_headcount(&team, Role::Worker, &config);
        team.factories[0].workers += 100;
        team.workforce.ramping_hires.push(HireCohort {
            role: Role::Worker,
            count: 100,
            rounds_since_hire: 0,
        });
        let with_ramp = effective_headcount(&team, Role::Worker, &config);
        assert!(with_ramp < team.headcount(Role::Worker) as f64);
        assert!(with_ramp > full_before);
    }

    #[test]
    fn test_firing_never_goes_negative() {
        let (team, config, mut rng) = setup();
        let have = team.headcount(Role::Supervisor) as i64;
        let decisions = vec![HrDecision::AdjustHeadcount {
            factory_id: None,
            role: Role::Supervisor,
            delta: -(have + 500),
        }];
        let outcome = process(&team, &decisions, &config, &mut rng);
        assert_eq!(outcome.state.headcount(Role::Supervisor), 0);
    }

    #[test]
    fn test_training_fatigue_reduces_effect() {
        let (mut team, config, mut rng) = setup();
        team.round = 1; // avoid the year-boundary counter reset
        team.cash = 100_000_000.0;
        team.workforce.trainings_this_year = config.hr.training_fatigue_threshold + 2;
        let morale_before = team.workforce.morale;
        let decisions = vec![HrDecision::ScheduleTraining { focus: Role::Worker }];
        let outcome = process(&team, &decisions, &config, &mut rng);
        // Fatigued training grants less than the full morale bonus.
        let gained = outcome.state.workforce.morale - morale_before + 0.5; // drift compensation
        assert!(gained < config.hr.training_morale_bonus);
    }

    #[test]
    fn test_payroll_is_charged() {
        let (team, config, mut rng) = setup();
        let outcome = process(&team, &[], &config, &mut rng);
        assert!(outcome.state.cash < team.cash);
        assert!(outcome.ledger.opex > 0.0);
    }
}
