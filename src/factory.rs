//! Factories, machines, and the factory decision processor.
//!
//! The factory pass applies efficiency investments (with diminishing
//! returns), factory builds, green-energy investments and machine operations,
//! then runs the per-round machinery simulation: health degradation,
//! probabilistic breakdowns and recoveries, and utilisation wear.

use crate::config::GameConfig;
use crate::decisions::FactoryDecision;
use crate::market::Region;
use crate::module::{LedgerDelta, ModuleKind, ModuleOutcome, StateChange, Warning};
use crate::rng::StreamRng;
use crate::team::TeamState;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use strum_macros::EnumString;

/// Machine lifecycle states, wire-exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MachineStatus {
    Operational,
    Maintenance,
    Breakdown,
    Offline,
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MachineStatus::Operational => "operational",
            MachineStatus::Maintenance => "maintenance",
            MachineStatus::Breakdown => "breakdown",
            MachineStatus::Offline => "offline",
        };
        write!(f, "{}", name)
    }
}

/// Breakdown severity, drawn from a fixed weighted distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

/// One production machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Stable machine id, unique within the factory
    pub id: String,
    /// Catalogue key of this machine's type
    pub machine_type: String,
    pub status: MachineStatus,
    /// Health, 0-100
    pub health_percent: f64,
    /// Rounds since purchase
    pub age_rounds: u32,
    /// Rounds since last maintenance service
    pub rounds_since_maintenance: u32,
    /// Purchase price, basis for depreciation
    pub purchase_cost: f64,
}

impl Machine {
    /// Straight-line depreciated value, bounded below by the residual.
    pub fn depreciated_value(&self, lifespan_rounds: u32, residual_fraction: f64) -> f64 {
        let residual = self.purchase_cost * residual_fraction;
        if lifespan_rounds == 0 {
            return residual;
        }
        let linear =
            self.purchase_cost * (1.0 - self.age_rounds as f64 / lifespan_rounds as f64);
        linear.max(residual)
    }

    /// Whether the machine produces this round.
    pub fn is_producing(&self) -> bool {
        self.status == MachineStatus::Operational
    }
}

/// One production site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factory {
    /// Stable factory id, unique within the team
    pub id: String,
    pub region: Region,
    /// Number of production lines
    pub production_lines: u32,
    pub workers: u32,
    pub engineers: u32,
    pub supervisors: u32,
    /// Efficiency in [0, max_efficiency]
    pub efficiency: f64,
    /// Purchased upgrades, by key
    pub upgrades: BTreeSet<String>,
    pub machines: Vec<Machine>,
    /// CO2 emitted last round, tonnes
    pub co2_emissions: f64,
    /// Cumulative green-energy investment
    pub green_investment: f64,
    /// Utilisation of capacity last round, 0-1
    #[serde(default)]
    pub utilization: f64,
    /// Defect rate accumulated from over-utilisation, 0-1
    #[serde(default)]
    pub defect_rate: f64,
    /// Counter for machine id generation
    #[serde(default)]
    next_machine_seq: u32,
}

impl Factory {
    /// A starting factory with headcounts and no machines yet.
    pub fn initial(
        id: &str,
        region: Region,
        workers: u32,
        engineers: u32,
        supervisors: u32,
        efficiency: f64,
    ) -> Self {
        Factory {
            id: id.to_string(),
            region,
            production_lines: 2,
            workers,
            engineers,
            supervisors,
            efficiency,
            upgrades: BTreeSet::new(),
            machines: Vec::new(),
            co2_emissions: 0.0,
            green_investment: 0.0,
            utilization: 0.0,
            defect_rate: 0.0,
            next_machine_seq: 0,
        }
    }

    pub fn headcount(&self, role: crate::hr::Role) -> u32 {
        match role {
            crate::hr::Role::Worker => self.workers,
            crate::hr::Role::Engineer => self.engineers,
            crate::hr::Role::Supervisor => self.supervisors,
        }
    }

    pub fn headcount_mut(&mut self, role: crate::hr::Role) -> &mut u32 {
        match role {
            crate::hr::Role::Worker => &mut self.workers,
            crate::hr::Role::Engineer => &mut self.engineers,
            crate::hr::Role::Supervisor => &mut self.supervisors,
        }
    }

    /// Units this factory can produce this round.
    pub fn capacity(&self, config: &GameConfig) -> f64 {
        self.machines
            .iter()
            .filter(|m| m.is_producing())
            .map(|m| {
                let spec = config.factory.machine_catalog.get(&m.machine_type);
                let base = spec.map(|s| s.capacity_units).unwrap_or(0.0);
                base * (m.health_percent / 100.0)
            })
            .sum::<f64>()
            * (0.5 + self.efficiency / 2.0)
    }

    /// Allocates the next machine id.
    fn next_machine_id(&mut self) -> String {
        self.next_machine_seq += 1;
        format!("{}-m{}", self.id, self.next_machine_seq)
    }

    /// Clamps bounded fields into range.
    pub fn clamp_ranges(&mut self, max_efficiency: f64) {
        self.efficiency = self.efficiency.clamp(0.0, max_efficiency);
        self.defect_rate = self.defect_rate.clamp(0.0, 1.0);
        self.utilization = self.utilization.clamp(0.0, 1.0);
        for machine in &mut self.machines {
            machine.health_percent = machine.health_percent.clamp(0.0, 100.0);
        }
    }

    /// Structural invariant violations for this factory.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.efficiency < 0.0 || self.efficiency > 1.0 {
            violations.push(format!("factory {} efficiency {} outside [0,1]", self.id, self.efficiency));
        }
        for machine in &self.machines {
            if !(0.0..=100.0).contains(&machine.health_percent) {
                violations.push(format!(
                    "machine {} health {} outside [0,100]",
                    machine.id, machine.health_percent
                ));
            }
        }
        violations
    }
}

/// Runs the factory pass for one team.
///
/// Decisions arrive pre-validated; affordability is still re-checked against
/// the live cash balance because earlier modules may have spent in between.
pub fn process(
    state: &TeamState,
    decisions: &[FactoryDecision],
    config: &GameConfig,
    rng: &mut StreamRng,
) -> ModuleOutcome {
    let mut state = state.clone();
    let mut ledger = LedgerDelta::default();
    let mut messages = Vec::new();
    let mut warnings = Vec::new();
    let mut changes = Vec::new();

    for decision in decisions {
        match decision {
            FactoryDecision::EfficiencyInvestment {
                factory_id,
                workers,
                supervisors,
                engineers,
                machinery,
                general,
            } => {
                let total = workers + supervisors + engineers + machinery + general;
                if total <= 0.0 {
                    continue;
                }
                if total > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("insufficient cash for efficiency investment in '{}'", factory_id),
                    ));
                    continue;
                }
                let Some(factory) = state.factories.iter_mut().find(|f| f.id == *factory_id)
                else {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("unknown factory '{}'", factory_id),
                    ));
                    continue;
                };
                let before = factory.efficiency;
                let gain = efficiency_gain(before, total, &config.factory);
                factory.efficiency = (before + gain).min(config.factory.max_efficiency);
                state.cash -= total;
                state.ppe_gross += total;
                ledger.capex += total;
                changes.push(StateChange::new(
                    format!("factories[{}].efficiency", factory_id),
                    format!("{:.3}", before),
                    format!("{:.3}", factory.efficiency),
                ));
            },
            FactoryDecision::BuildFactory { region } => {
                let cost = config.factory.factory_build_cost;
                if cost > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("insufficient cash to build factory in {}", region),
                    ));
                    continue;
                }
                let id = format!("{}-f{}", state.id, state.factories.len() + 1);
                let factory = Factory::initial(&id, *region, 0, 0, 0, 0.3);
                state.cash -= cost;
                state.ppe_gross += cost;
                ledger.capex += cost;
                messages.push(format!("built factory {} in {}", id, region));
                state.factories.push(factory);
            },
            FactoryDecision::GreenInvestment { factory_id, amount } => {
                if *amount > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("insufficient cash for green investment in '{}'", factory_id),
                    ));
                    continue;
                }
                let Some(factory) = state.factories.iter_mut().find(|f| f.id == *factory_id)
                else {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("unknown factory '{}'", factory_id),
                    ));
                    continue;
                };
                factory.green_investment += amount;
                state.cash -= amount;
                state.ppe_gross += amount;
                ledger.capex += amount;
                let esg_gain = amount / 1_000_000.0 * config.factory.green_esg_points_per_million;
                state.esg_score += esg_gain;
                messages.push(format!(
                    "green investment of {:.0} in {} (+{:.1} ESG)",
                    amount, factory_id, esg_gain
                ));
            },
            FactoryDecision::PurchaseMachine { factory_id, machine_type } => {
                let Some(spec) = config.factory.machine_catalog.get(machine_type) else {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("unknown machine type '{}'", machine_type),
                    ));
                    continue;
                };
                if spec.cost > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("insufficient cash for machine '{}'", machine_type),
                    ));
                    continue;
                }
                let Some(factory) = state.factories.iter_mut().find(|f| f.id == *factory_id)
                else {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("unknown factory '{}'", factory_id),
                    ));
                    continue;
                };
                let id = factory.next_machine_id();
                factory.machines.push(Machine {
                    id: id.clone(),
                    machine_type: machine_type.clone(),
                    status: MachineStatus::Operational,
                    health_percent: 100.0,
                    age_rounds: 0,
                    rounds_since_maintenance: 0,
                    purchase_cost: spec.cost,
                });
                state.cash -= spec.cost;
                state.ppe_gross += spec.cost;
                ledger.capex += spec.cost;
                messages.push(format!("purchased {} ({}) for {:.0}", machine_type, id, spec.cost));
            },
            FactoryDecision::SellMachine { factory_id, machine_id } => {
                let Some(factory) = state.factories.iter_mut().find(|f| f.id == *factory_id)
                else {
                    continue;
                };
                let Some(pos) = factory.machines.iter().position(|m| m.id == *machine_id) else {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("unknown machine '{}'", machine_id),
                    ));
                    continue;
                };
                let machine = factory.machines.remove(pos);
                let spec = config.factory.machine_catalog.get(&machine.machine_type);
                let (lifespan, residual) = spec
                    .map(|s| (s.expected_lifespan_rounds, s.residual_fraction))
                    .unwrap_or((1, 0.0));
                let value = machine.depreciated_value(lifespan, residual);
                state.cash += value;
                state.ppe_gross -= machine.purchase_cost;
                ledger.asset_sales += value;
                ledger.asset_disposals_gross += machine.purchase_cost;
                messages.push(format!("sold machine {} for {:.0}", machine_id, value));
            },
            FactoryDecision::SetMachineOnline { factory_id, machine_id, online } => {
                if let Some(machine) = find_machine(&mut state, factory_id, machine_id) {
                    // A broken-down machine cannot simply be switched back on.
                    if machine.status != MachineStatus::Breakdown {
                        let before = machine.status;
                        machine.status = if *online {
                            MachineStatus::Operational
                        } else {
                            MachineStatus::Offline
                        };
                        changes.push(StateChange::new(
                            format!("machines[{}].status", machine_id),
                            before,
                            machine.status,
                        ));
                    }
                }
            },
            FactoryDecision::MaintainMachine { factory_id, machine_id } => {
                let Some(spec_cost) = state
                    .factories
                    .iter()
                    .find(|f| f.id == *factory_id)
                    .and_then(|f| f.machines.iter().find(|m| m.id == *machine_id))
                    .and_then(|m| config.factory.machine_catalog.get(&m.machine_type))
                    .map(|s| s.maintenance_cost)
                else {
                    continue;
                };
                if spec_cost > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("insufficient cash to maintain machine '{}'", machine_id),
                    ));
                    continue;
                }
                if let Some(machine) = find_machine(&mut state, factory_id, machine_id) {
                    machine.rounds_since_maintenance = 0;
                    machine.health_percent = (machine.health_percent + 10.0).min(100.0);
                    if machine.status == MachineStatus::Maintenance {
                        machine.status = MachineStatus::Operational;
                    }
                }
                state.cash -= spec_cost;
                ledger.opex += spec_cost;
            },
        }
    }

    // Per-round machinery simulation.
    let prev_units: f64 = state.sales_by_segment.values().sum();
    for fi in 0..state.factories.len() {
        let capacity = state.factories[fi].capacity(config);
        let factory_share = if state.factories.is_empty() {
            0.0
        } else {
            1.0 / state.factories.len() as f64
        };
        let utilization = if capacity > 0.0 {
            (prev_units * factory_share / capacity).min(1.5)
        } else {
            0.0
        };
        let factory = &mut state.factories[fi];
        factory.utilization = utilization.min(1.0);

        if utilization > config.factory.burnout_utilization_threshold {
            state.workforce.burnout += config.factory.burnout_increase;
            factory.defect_rate =
                (factory.defect_rate + config.factory.defect_rate_increase).min(1.0);
        } else {
            factory.defect_rate = (factory.defect_rate - 0.005).max(0.0);
        }

        let produced = prev_units * factory_share;
        let green_factor = 1.0
            - (factory.green_investment / 1_000_000.0
                * config.factory.green_co2_reduction_per_million)
                .min(0.9);
        factory.co2_emissions = produced * config.factory.co2_per_unit * green_factor;

        for mi in 0..factory.machines.len() {
            let machine = &mut factory.machines[mi];
            machine.age_rounds += 1;
            machine.rounds_since_maintenance += 1;

            let spec = match config.factory.machine_catalog.get(&machine.machine_type) {
                Some(spec) => spec,
                None => continue,
            };

            match machine.status {
                MachineStatus::Breakdown => {
                    if rng.chance(config.factory.recovery_chance) {
                        machine.status = MachineStatus::Operational;
                        debug!("machine {} recovered from breakdown", machine.id);
                    }
                    continue;
                },
                MachineStatus::Offline => continue,
                _ => {},
            }

            degrade_health(machine, spec, utilization, &config.factory);

            // Critically worn machines drop out of production until serviced.
            if machine.health_percent < 15.0 && machine.status == MachineStatus::Operational {
                machine.status = MachineStatus::Maintenance;
                warnings.push(Warning::new(
                    ModuleKind::Factory,
                    format!(
                        "machine {} taken into maintenance at {:.0}% health",
                        machine.id, machine.health_percent
                    ),
                ));
                continue;
            }

            let chance = breakdown_chance(machine, spec, &config.factory);
            if rng.chance(chance) {
                let severity = draw_severity(machine.health_percent, rng, &config.factory);
                let sev_idx = severity as usize;
                let repair = machine.purchase_cost * config.factory.repair_cost_fraction[sev_idx];
                machine.status = MachineStatus::Breakdown;
                machine.health_percent = (machine.health_percent
                    - match severity {
                        Severity::Minor => 5.0,
                        Severity::Moderate => 15.0,
                        Severity::Major => 30.0,
                    })
                .max(0.0);
                state.cash -= repair;
                ledger.opex += repair;
                warnings.push(Warning::new(
                    ModuleKind::Factory,
                    format!(
                        "machine {} broke down ({:?}); repair cost {:.0}",
                        machine.id, severity, repair
                    ),
                ));
            }
        }
    }

    state.workforce.burnout = state.workforce.burnout.clamp(0.0, 100.0);

    let costs = ledger.total_cash_out();
    ModuleOutcome { state, costs, revenue: 0.0, ledger, messages, warnings, changes }
}

/// Efficiency gained from a total investment, with diminishing returns above
/// the configured threshold.
fn efficiency_gain(current: f64, investment: f64, params: &crate::config::FactoryParams) -> f64 {
    let threshold = params.efficiency_diminish_threshold;
    let effective = if investment > threshold {
        threshold + (investment - threshold) * 0.5
    } else {
        investment
    };
    let gain = effective / 1_000_000.0 * params.efficiency_per_million;
    gain.min((params.max_efficiency - current).max(0.0))
}

fn degrade_health(
    machine: &mut Machine,
    spec: &crate::config::MachineSpec,
    utilization: f64,
    params: &crate::config::FactoryParams,
) {
    let mut degradation = params.health_base_degradation;
    let life = spec.expected_lifespan_rounds.max(1) as f64;
    let age_frac = machine.age_rounds as f64 / life;
    if age_frac > 0.5 {
        degradation += params.health_age_50_extra;
    }
    if age_frac > 0.75 {
        degradation += params.health_age_75_extra;
    }
    if age_frac > 1.0 {
        degradation += params.health_age_100_extra;
    }
    let overdue =
        machine.rounds_since_maintenance.saturating_sub(spec.maintenance_interval_rounds);
    degradation += overdue as f64 * params.health_overdue_penalty;
    if utilization > params.utilization_wear_threshold {
        degradation += params.utilization_wear_penalty;
    }
    machine.health_percent = (machine.health_percent - degradation).max(0.0);
}

/// Per-round breakdown chance for one machine, capped.
fn breakdown_chance(
    machine: &Machine,
    spec: &crate::config::MachineSpec,
    params: &crate::config::FactoryParams,
) -> f64 {
    let health_mult = if machine.health_percent >= 75.0 {
        params.breakdown_mult_high_health
    } else if machine.health_percent >= 50.0 {
        params.breakdown_mult_mid_health
    } else if machine.health_percent >= 25.0 {
        params.breakdown_mult_low_health
    } else {
        params.breakdown_mult_critical_health
    };
    let over_age = machine.age_rounds.saturating_sub(spec.expected_lifespan_rounds) as f64;
    let overdue =
        machine.rounds_since_maintenance.saturating_sub(spec.maintenance_interval_rounds) as f64;
    let chance = params.breakdown_base_chance * health_mult
        + over_age * params.breakdown_age_multiplier
        + overdue * params.breakdown_overdue_multiplier;
    chance.min(params.breakdown_chance_cap)
}

/// Draws breakdown severity; low health promotes the draw one level.
fn draw_severity(
    health: f64,
    rng: &mut StreamRng,
    params: &crate::config::FactoryParams,
) -> Severity {
    let total: f64 = params.severity_weights.iter().sum();
    let roll = rng.next() * total;
    let mut severity = if roll < params.severity_weights[0] {
        Severity::Minor
    } else if roll < params.severity_weights[0] + params.severity_weights[1] {
        Severity::Moderate
    } else {
        Severity::Major
    };
    if health < 25.0 {
        severity = match severity {
            Severity::Minor => Severity::Moderate,
            _ => Severity::Major,
        };
    }
    severity
}

fn find_machine<'a>(
    state: &'a mut TeamState,
    factory_id: &str,
    machine_id: &str,
) -> Option<&'a mut Machine> {
    state
        .factories
        .iter_mut()
        .find(|f| f.id == factory_id)?
        .machines
        .iter_mut()
        .find(|m| m.id == machine_id)
}
