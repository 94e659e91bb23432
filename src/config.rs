//! Game configuration parameters.
//!
//! [`GameConfig`] is the immutable, versioned parameter bundle every
//! subsystem reads. No numeric constant of the round pipeline lives anywhere
//! else: module processors receive the config as an explicit parameter and
//! never consult globals.
//!
//! Configs load from YAML or TOML files ([`GameConfig::from_file`]), support
//! partial files through serde defaults, and are checked by
//! [`GameConfig::validate`] before the engine accepts them. The bundle
//! carries a `schema_version`; the engine refuses to run against a mismatch.

use crate::error::{Result, SimulationError};
use crate::finance::ProposalKind;
use crate::hr::Role;
use crate::market::{EconomicPhase, MacroIndicators, MarketPressures, MarketState, Region, SegmentDemand};
use crate::marketing::Channel;
use crate::product::Segment;
use crate::research::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Schema version this engine build understands.
pub const ENGINE_SCHEMA_VERSION: u32 = 1;

/// Difficulty presets scaling the whole game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Sandbox,
    Easy,
    #[default]
    Normal,
    Hard,
    Expert,
    Nightmare,
}

impl Difficulty {
    /// Get all available difficulty presets
    pub fn all() -> Vec<Difficulty> {
        vec![
            Difficulty::Sandbox,
            Difficulty::Easy,
            Difficulty::Normal,
            Difficulty::Hard,
            Difficulty::Expert,
            Difficulty::Nightmare,
        ]
    }

    /// Get the string identifier for this preset
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Sandbox => "sandbox",
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
            Difficulty::Nightmare => "nightmare",
        }
    }

    /// Get a description of this preset
    pub fn description(&self) -> &str {
        match self {
            Difficulty::Sandbox => "Forgiving market, no economy events, strong rubber-banding",
            Difficulty::Easy => "Generous demand and mild economy events",
            Difficulty::Normal => "Baseline balance",
            Difficulty::Hard => "Tighter demand, more frequent economy events",
            Difficulty::Expert => "Thin margins, aggressive competitors' market",
            Difficulty::Nightmare => "Hostile economy: scarce demand, constant shocks",
        }
    }

    /// Demand multiplier applied to every segment's starting demand.
    fn demand_multiplier(&self) -> f64 {
        match self {
            Difficulty::Sandbox => 1.30,
            Difficulty::Easy => 1.15,
            Difficulty::Normal => 1.00,
            Difficulty::Hard => 0.90,
            Difficulty::Expert => 0.80,
            Difficulty::Nightmare => 0.70,
        }
    }

    /// Multiplier on the per-phase economy event chance.
    fn event_chance_multiplier(&self) -> f64 {
        match self {
            Difficulty::Sandbox => 0.0,
            Difficulty::Easy => 0.5,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
            Difficulty::Expert => 1.8,
            Difficulty::Nightmare => 2.5,
        }
    }

    /// Multiplier on starting cash.
    fn starting_cash_multiplier(&self) -> f64 {
        match self {
            Difficulty::Sandbox => 1.5,
            Difficulty::Easy => 1.2,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 0.9,
            Difficulty::Expert => 0.8,
            Difficulty::Nightmare => 0.7,
        }
    }
}

/// Implement FromStr trait for parsing difficulty names from strings
impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sandbox" => Ok(Difficulty::Sandbox),
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            "nightmare" => Ok(Difficulty::Nightmare),
            _ => Err(format!("Unknown difficulty: '{}'", s)),
        }
    }
}

/// Specification of a purchasable machine type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSpec {
    /// Purchase price
    pub cost: f64,
    /// Units the machine can produce per round at 100% health
    pub capacity_units: f64,
    /// Expected lifespan in rounds
    pub expected_lifespan_rounds: u32,
    /// Rounds between scheduled maintenance
    pub maintenance_interval_rounds: u32,
    /// Fraction of cost retained as residual value after full depreciation
    pub residual_fraction: f64,
    /// Cost of one maintenance service
    pub maintenance_cost: f64,
}

/// Factory and machinery parameters (§ factory module).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryParams {
    /// Efficiency cap for any factory
    pub max_efficiency: f64,
    /// Efficiency gained per million invested (before diminishing returns)
    pub efficiency_per_million: f64,
    /// Investment above this counts at half rate
    pub efficiency_diminish_threshold: f64,
    /// Cost of building a new factory
    pub factory_build_cost: f64,
    /// CO2 emitted per unit produced
    pub co2_per_unit: f64,
    /// CO2 reduction fraction per million of green investment
    pub green_co2_reduction_per_million: f64,
    /// ESG score points per million of green investment
    pub green_esg_points_per_million: f64,
    /// Base machine health degradation per round, in health points
    pub health_base_degradation: f64,
    /// Extra degradation once age exceeds 50% of expected lifespan
    pub health_age_50_extra: f64,
    /// Extra degradation once age exceeds 75% of expected lifespan
    pub health_age_75_extra: f64,
    /// Extra degradation once age exceeds 100% of expected lifespan
    pub health_age_100_extra: f64,
    /// Extra degradation per maintenance-overdue round
    pub health_overdue_penalty: f64,
    /// Utilisation above this adds wear
    pub utilization_wear_threshold: f64,
    /// Extra degradation when utilisation exceeds the wear threshold
    pub utilization_wear_penalty: f64,
    /// Base breakdown chance per round
    pub breakdown_base_chance: f64,
    /// Breakdown multiplier when health >= 75
    pub breakdown_mult_high_health: f64,
    /// Breakdown multiplier when 50 <= health < 75
    pub breakdown_mult_mid_health: f64,
    /// Breakdown multiplier when 25 <= health < 50
    pub breakdown_mult_low_health: f64,
    /// Breakdown multiplier when health < 25
    pub breakdown_mult_critical_health: f64,
    /// Added chance per round of age beyond expected lifespan
    pub breakdown_age_multiplier: f64,
    /// Added chance per maintenance-overdue round
    pub breakdown_overdue_multiplier: f64,
    /// Hard cap on the per-round breakdown chance
    pub breakdown_chance_cap: f64,
    /// Per-round chance a broken-down machine recovers
    pub recovery_chance: f64,
    /// Weights of (minor, moderate, major) breakdown severity
    pub severity_weights: [f64; 3],
    /// Repair cost as a fraction of machine cost per severity step
    pub repair_cost_fraction: [f64; 3],
    /// Utilisation above this accumulates workforce burnout and defects
    pub burnout_utilization_threshold: f64,
    /// Burnout points added per round above the threshold
    pub burnout_increase: f64,
    /// Defect-rate increase per round above the threshold
    pub defect_rate_increase: f64,
    /// Catalogue of purchasable machine types
    pub machine_catalog: BTreeMap<String, MachineSpec>,
}

impl Default for FactoryParams {
    fn default() -> Self {
        let mut machine_catalog = BTreeMap::new();
        machine_catalog.insert(
            "assembly_line".to_string(),
            MachineSpec {
                cost: 4_000_000.0,
                capacity_units: 12_000.0,
                expected_lifespan_rounds: 32,
                maintenance_interval_rounds: 6,
                residual_fraction: 0.10,
                maintenance_cost: 80_000.0,
            },
        );
        machine_catalog.insert(
            "cnc_cell".to_string(),
            MachineSpec {
                cost: 7_500_000.0,
                capacity_units: 18_000.0,
                expected_lifespan_rounds: 40,
                maintenance_interval_rounds: 8,
                residual_fraction: 0.12,
                maintenance_cost: 120_000.0,
            },
        );
        machine_catalog.insert(
            "packaging_unit".to_string(),
            MachineSpec {
                cost: 1_800_000.0,
                capacity_units: 20_000.0,
                expected_lifespan_rounds: 24,
                maintenance_interval_rounds: 4,
                residual_fraction: 0.08,
                maintenance_cost: 40_000.0,
            },
        );
        FactoryParams {
            max_efficiency: 0.95,
            efficiency_per_million: 0.05,
            efficiency_diminish_threshold: 5_000_000.0,
            factory_build_cost: 25_000_000.0,
            co2_per_unit: 0.4,
            green_co2_reduction_per_million: 0.05,
            green_esg_points_per_million: 12.0,
            health_base_degradation: 1.0,
            health_age_50_extra: 0.5,
            health_age_75_extra: 1.0,
            health_age_100_extra: 2.0,
            health_overdue_penalty: 0.5,
            utilization_wear_threshold: 0.90,
            utilization_wear_penalty: 1.0,
            breakdown_base_chance: 0.02,
            breakdown_mult_high_health: 0.5,
            breakdown_mult_mid_health: 1.0,
            breakdown_mult_low_health: 2.0,
            breakdown_mult_critical_health: 4.0,
            breakdown_age_multiplier: 0.01,
            breakdown_overdue_multiplier: 0.02,
            breakdown_chance_cap: 0.5,
            recovery_chance: 0.5,
            severity_weights: [0.6, 0.3, 0.1],
            repair_cost_fraction: [0.02, 0.06, 0.15],
            burnout_utilization_threshold: 0.95,
            burnout_increase: 5.0,
            defect_rate_increase: 0.01,
            machine_catalog,
        }
    }
}

/// Specification of a purchasable employee benefit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenefitSpec {
    /// Per-employee, per-round cost
    pub cost_per_employee: f64,
    /// Reduction of the turnover rate while active
    pub turnover_reduction: f64,
    /// Morale points added while active
    pub morale_bonus: f64,
}

/// Human resources parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrParams {
    /// Base salary per role, per round
    pub base_salary: BTreeMap<Role, f64>,
    /// Lower bound of the salary multiplier
    pub salary_multiplier_min: f64,
    /// Upper bound of the salary multiplier
    pub salary_multiplier_max: f64,
    /// Absolute per-round salary ceiling for any role
    pub max_salary: f64,
    /// Baseline per-round turnover rate
    pub base_turnover_rate: f64,
    /// Turnover added while morale < 50
    pub low_morale_turnover_increase: f64,
    /// Turnover added while burnout > 50
    pub burnout_turnover_increase: f64,
    /// Cap on the total turnover reduction from benefits
    pub benefits_turnover_reduction_cap: f64,
    /// Productivity of new hires over their first ramp rounds
    pub ramp_up_productivity: Vec<f64>,
    /// Training applications per year before fatigue sets in
    pub training_fatigue_threshold: u32,
    /// Linear effectiveness penalty per training beyond the threshold
    pub training_fatigue_penalty: f64,
    /// Cost of one training program
    pub training_cost: f64,
    /// Morale points one (unfatigued) training grants
    pub training_morale_bonus: f64,
    /// Productivity points one (unfatigued) training grants
    pub training_productivity_bonus: f64,
    /// One-off cost per hire
    pub hiring_cost_per_head: f64,
    /// One-off cost per dismissal
    pub firing_cost_per_head: f64,
    /// Morale penalty per dismissed employee (spread across the team)
    pub firing_morale_penalty: f64,
    /// Catalogue of employee benefits
    pub benefit_catalog: BTreeMap<String, BenefitSpec>,
}

impl Default for HrParams {
    fn default() -> Self {
        let mut base_salary = BTreeMap::new();
        base_salary.insert(Role::Worker, 12_500.0);
        base_salary.insert(Role::Supervisor, 20_000.0);
        base_salary.insert(Role::Engineer, 24_000.0);

        let mut benefit_catalog = BTreeMap::new();
        benefit_catalog.insert(
            "health_insurance".to_string(),
            BenefitSpec { cost_per_employee: 400.0, turnover_reduction: 0.020, morale_bonus: 4.0 },
        );
        benefit_catalog.insert(
            "retirement_plan".to_string(),
            BenefitSpec { cost_per_employee: 300.0, turnover_reduction: 0.015, morale_bonus: 2.0 },
        );
        benefit_catalog.insert(
            "flexible_hours".to_string(),
            BenefitSpec { cost_per_employee: 50.0, turnover_reduction: 0.010, morale_bonus: 3.0 },
        );
        benefit_catalog.insert(
            "gym_membership".to_string(),
            BenefitSpec { cost_per_employee: 80.0, turnover_reduction: 0.005, morale_bonus: 1.0 },
        );

        HrParams {
            base_salary,
            salary_multiplier_min: 0.8,
            salary_multiplier_max: 2.0,
            max_salary: 100_000.0,
            base_turnover_rate: 0.05,
            low_morale_turnover_increase: 0.05,
            burnout_turnover_increase: 0.04,
            benefits_turnover_reduction_cap: 0.06,
            ramp_up_productivity: vec![0.5, 0.75, 0.9],
            training_fatigue_threshold: 4,
            training_fatigue_penalty: 0.15,
            training_cost: 250_000.0,
            training_morale_bonus: 3.0,
            training_productivity_bonus: 2.0,
            hiring_cost_per_head: 5_000.0,
            firing_cost_per_head: 10_000.0,
            firing_morale_penalty: 0.05,
            benefit_catalog,
        }
    }
}

/// Per-risk-level research behaviour.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Per-round chance of a one-round delay
    pub delay_chance: f64,
    /// Per-round chance of a cost overrun
    pub overrun_chance: f64,
}

/// R&D and tech-tree parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchParams {
    /// Base rounds to complete a product development
    pub product_dev_base_rounds: u32,
    /// Extra rounds per quality point targeted above 50
    pub product_dev_quality_factor: f64,
    /// Maximum fractional speedup from engineer staffing
    pub max_engineer_speedup: f64,
    /// Engineers needed for the full speedup
    pub engineers_for_full_speedup: u32,
    /// One-time fraction of unlocked quality effects granted to adjacent segments
    pub spillover_rate: f64,
    /// Behaviour per risk level
    pub risk_profiles: BTreeMap<RiskLevel, RiskProfile>,
    /// Cost overrun draw bounds, as fractions of research cost
    pub overrun_min_fraction: f64,
    pub overrun_max_fraction: f64,
    /// Dev-speed fraction granted per million of platform investment
    pub platform_dev_speed_per_million: f64,
    /// Cap on the accumulated platform dev-speed bonus
    pub platform_dev_speed_cap: f64,
    /// Tech tier at or above which completing research files a patent
    pub patent_tier_threshold: u32,
    /// Patent validity in rounds
    pub patent_duration_rounds: u32,
    /// Per-round licensing fee collected from each licensee
    pub patent_licensing_fee: f64,
    /// Blocking power of freshly filed patents
    pub patent_blocking_power: f64,
}

impl Default for ResearchParams {
    fn default() -> Self {
        let mut risk_profiles = BTreeMap::new();
        risk_profiles
            .insert(RiskLevel::Conservative, RiskProfile { delay_chance: 0.05, overrun_chance: 0.05 });
        risk_profiles
            .insert(RiskLevel::Moderate, RiskProfile { delay_chance: 0.15, overrun_chance: 0.15 });
        risk_profiles
            .insert(RiskLevel::Aggressive, RiskProfile { delay_chance: 0.30, overrun_chance: 0.30 });
        ResearchParams {
            product_dev_base_rounds: 3,
            product_dev_quality_factor: 0.06,
            max_engineer_speedup: 0.40,
            engineers_for_full_speedup: 60,
            spillover_rate: 0.25,
            risk_profiles,
            overrun_min_fraction: 0.10,
            overrun_max_fraction: 0.30,
            platform_dev_speed_per_million: 0.01,
            platform_dev_speed_cap: 0.25,
            patent_tier_threshold: 3,
            patent_duration_rounds: 20,
            patent_licensing_fee: 500_000.0,
            patent_blocking_power: 0.5,
        }
    }
}

/// Specification of a purchasable sponsorship or brand activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorshipSpec {
    /// Purchase cost
    pub cost: f64,
    /// Fixed brand-value delta granted this round
    pub brand_impact: f64,
}

/// Marketing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketingParams {
    /// Ad budgets are processed in chunks of this size
    pub advertising_chunk_size: f64,
    /// Brand impact of the first full chunk
    pub advertising_base_impact: f64,
    /// Geometric decay applied to each further chunk
    pub advertising_decay: f64,
    /// (segment, channel) effectiveness matrix scaling ad impact
    pub channel_effectiveness: BTreeMap<Segment, BTreeMap<Channel, f64>>,
    /// Brand points per dollar in the linear branding regime
    pub branding_base_impact: f64,
    /// Spend above this enters the logarithmic branding regime
    pub branding_linear_threshold: f64,
    /// Multiplier of the logarithmic branding term
    pub branding_log_multiplier: f64,
    /// Hard cap on per-round brand growth
    pub brand_max_growth_per_round: f64,
    /// Per-round brand decay
    pub brand_decay_rate: f64,
    /// Maximum allowed promotion intensity
    pub promotion_max_intensity: f64,
    /// Catalogue of sponsorships
    pub sponsorship_catalog: BTreeMap<String, SponsorshipSpec>,
    /// Catalogue of purchasable brand activities
    pub activity_catalog: BTreeMap<String, SponsorshipSpec>,
}

impl Default for MarketingParams {
    fn default() -> Self {
        let mut channel_effectiveness = BTreeMap::new();
        for segment in Segment::all() {
            let mut by_channel = BTreeMap::new();
            for channel in Channel::all() {
                // Baseline 1.0, then tilt: budget buyers live online, premium
                // segments respond to events and print.
                let eff = match (segment, channel) {
                    (Segment::Budget, Channel::Online) => 1.3,
                    (Segment::Budget, Channel::Print) => 0.7,
                    (Segment::General, Channel::Tv) => 1.2,
                    (Segment::Enthusiast, Channel::SocialMedia) => 1.3,
                    (Segment::Professional, Channel::Print) => 1.2,
                    (Segment::Professional, Channel::Events) => 1.3,
                    (Segment::Professional, Channel::SocialMedia) => 0.7,
                    (Segment::ActiveLifestyle, Channel::SocialMedia) => 1.4,
                    (Segment::ActiveLifestyle, Channel::Events) => 1.2,
                    _ => 1.0,
                };
                by_channel.insert(channel, eff);
            }
            channel_effectiveness.insert(segment, by_channel);
        }

        let mut sponsorship_catalog = BTreeMap::new();
        sponsorship_catalog.insert(
            "regional_sports_club".to_string(),
            SponsorshipSpec { cost: 1_500_000.0, brand_impact: 0.008 },
        );
        sponsorship_catalog.insert(
            "esports_league".to_string(),
            SponsorshipSpec { cost: 2_500_000.0, brand_impact: 0.012 },
        );
        sponsorship_catalog.insert(
            "world_tour".to_string(),
            SponsorshipSpec { cost: 6_000_000.0, brand_impact: 0.025 },
        );

        let mut activity_catalog = BTreeMap::new();
        activity_catalog.insert(
            "pop_up_stores".to_string(),
            SponsorshipSpec { cost: 800_000.0, brand_impact: 0.004 },
        );
        activity_catalog.insert(
            "design_award_entry".to_string(),
            SponsorshipSpec { cost: 300_000.0, brand_impact: 0.002 },
        );

        MarketingParams {
            advertising_chunk_size: 1_000_000.0,
            advertising_base_impact: 0.006,
            advertising_decay: 0.8,
            channel_effectiveness,
            branding_base_impact: 2.0e-8,
            branding_linear_threshold: 2_000_000.0,
            branding_log_multiplier: 1.5,
            brand_max_growth_per_round: 0.08,
            brand_decay_rate: 0.02,
            promotion_max_intensity: 0.30,
            sponsorship_catalog,
            activity_catalog,
        }
    }
}

/// Three-tier health boundaries for one financial ratio.
///
/// `green` and `yellow` are lower bounds for ratios where higher is better;
/// for debt-to-equity they are upper bounds (lower is better).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatioBands {
    pub green: f64,
    pub yellow: f64,
}

/// Finance parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceParams {
    /// Treasury bill maturity in rounds
    pub tbill_term_rounds: u32,
    /// T-bill rate as a fraction of the market base rate
    pub tbill_rate_fraction: f64,
    /// Corporate bond maturity in rounds
    pub bond_term_rounds: u32,
    /// Premium over base rate paid on bonds
    pub bond_rate_premium: f64,
    /// Bank loans at or below this term count as short-term debt
    pub loan_short_term_threshold_rounds: u32,
    /// Hard floor on shares outstanding
    pub min_shares: u64,
    /// Cap on the buyback share-price boost
    pub buyback_boost_cap: f64,
    /// Dividend yield above this draws the growth-concern penalty
    pub dividend_yield_concern_threshold: f64,
    /// Share-price multiplier when the concern threshold is crossed
    pub dividend_concern_multiplier: f64,
    /// Dividend yield above this (but under the concern threshold) is rewarded
    pub dividend_yield_reward_threshold: f64,
    /// Share-price multiplier for a healthy dividend
    pub dividend_reward_multiplier: f64,
    /// Board vote base approval probability, percent
    pub board_base_probability: f64,
    /// Percent points per unit of ROE (capped)
    pub board_roe_bonus_scale: f64,
    pub board_roe_bonus_cap: f64,
    /// Bonus when the current ratio exceeds its green band
    pub board_current_ratio_bonus: f64,
    /// Penalty when debt-to-equity exceeds its yellow band
    pub board_high_debt_penalty: f64,
    /// ESG score at or above which the board smiles (+bonus)
    pub board_esg_high_threshold: f64,
    pub board_esg_high_bonus: f64,
    /// ESG score below which the board frowns (−penalty)
    pub board_esg_low_threshold: f64,
    pub board_esg_low_penalty: f64,
    /// Per-proposal-kind probability modifiers, percent points
    pub board_proposal_modifiers: BTreeMap<ProposalKind, f64>,
    /// Approval probability clamp, percent
    pub board_probability_min: f64,
    pub board_probability_max: f64,
    /// Number of board members casting derived votes
    pub board_members: u32,
    /// Ratio health bands
    pub current_ratio_bands: RatioBands,
    pub quick_ratio_bands: RatioBands,
    pub cash_ratio_bands: RatioBands,
    pub debt_to_equity_bands: RatioBands,
    pub roe_bands: RatioBands,
    pub roa_bands: RatioBands,
    pub net_margin_bands: RatioBands,
}

impl Default for FinanceParams {
    fn default() -> Self {
        let mut board_proposal_modifiers = BTreeMap::new();
        board_proposal_modifiers.insert(ProposalKind::Expansion, 5.0);
        board_proposal_modifiers.insert(ProposalKind::SpecialDividend, -5.0);
        board_proposal_modifiers.insert(ProposalKind::ExecutiveCompensation, -10.0);
        board_proposal_modifiers.insert(ProposalKind::SustainabilityProgram, 8.0);
        board_proposal_modifiers.insert(ProposalKind::Restructuring, 0.0);

        FinanceParams {
            tbill_term_rounds: 2,
            tbill_rate_fraction: 0.8,
            bond_term_rounds: 20,
            bond_rate_premium: 0.004,
            loan_short_term_threshold_rounds: 4,
            min_shares: 1_000_000,
            buyback_boost_cap: 0.15,
            dividend_yield_concern_threshold: 0.05,
            dividend_concern_multiplier: 0.98,
            dividend_yield_reward_threshold: 0.02,
            dividend_reward_multiplier: 1.02,
            board_base_probability: 50.0,
            board_roe_bonus_scale: 100.0,
            board_roe_bonus_cap: 15.0,
            board_current_ratio_bonus: 5.0,
            board_high_debt_penalty: 10.0,
            board_esg_high_threshold: 600.0,
            board_esg_high_bonus: 8.0,
            board_esg_low_threshold: 300.0,
            board_esg_low_penalty: 12.0,
            board_proposal_modifiers,
            board_probability_min: 10.0,
            board_probability_max: 95.0,
            board_members: 6,
            current_ratio_bands: RatioBands { green: 1.5, yellow: 1.0 },
            quick_ratio_bands: RatioBands { green: 1.0, yellow: 0.7 },
            cash_ratio_bands: RatioBands { green: 0.5, yellow: 0.2 },
            debt_to_equity_bands: RatioBands { green: 1.0, yellow: 2.0 },
            roe_bands: RatioBands { green: 0.12, yellow: 0.05 },
            roa_bands: RatioBands { green: 0.08, yellow: 0.03 },
            net_margin_bands: RatioBands { green: 0.10, yellow: 0.04 },
        }
    }
}

/// Specification of a material supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierSpec {
    /// Region the supplier ships from
    pub region: Region,
    /// Quality of supplied material, 0-100
    pub quality: f64,
    /// Defect rate of supplied material, 0-1
    pub defect_rate: f64,
    /// Multiplier on the material base cost
    pub cost_multiplier: f64,
}

/// Specification of a raw material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialSpec {
    /// Base cost per unit
    pub base_cost: f64,
    /// Baseline quality, 0-100
    pub quality: f64,
}

/// Specification of a shipping route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Extra rounds spent in customs on this route
    pub customs_rounds_extra: u32,
    /// Multiplier on the order cost (tolls, insurance)
    pub cost_multiplier: f64,
}

/// Materials and logistics parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialsParams {
    /// Holding cost per round, as a fraction of inventory market value
    pub holding_cost_rate: f64,
    /// Rounds an order spends pending before production starts
    pub stage_pending_rounds: u32,
    /// Rounds an order spends in supplier production
    pub stage_production_rounds: u32,
    /// Rounds in shipping, per shipping method
    pub stage_shipping_rounds: BTreeMap<crate::materials::ShippingMethod, u32>,
    /// Rounds an order spends in customs
    pub stage_customs_rounds: u32,
    /// Material units consumed per product unit built
    pub units_per_product: f64,
    /// Catalogue of materials
    pub material_catalog: BTreeMap<String, MaterialSpec>,
    /// Catalogue of suppliers
    pub supplier_catalog: BTreeMap<String, SupplierSpec>,
    /// Catalogue of shipping routes
    pub route_catalog: BTreeMap<String, RouteSpec>,
}

impl Default for MaterialsParams {
    fn default() -> Self {
        use crate::materials::ShippingMethod;
        let mut stage_shipping_rounds = BTreeMap::new();
        stage_shipping_rounds.insert(ShippingMethod::Sea, 3);
        stage_shipping_rounds.insert(ShippingMethod::Rail, 2);
        stage_shipping_rounds.insert(ShippingMethod::Air, 1);

        let mut material_catalog = BTreeMap::new();
        material_catalog
            .insert("aluminium".to_string(), MaterialSpec { base_cost: 14.0, quality: 60.0 });
        material_catalog
            .insert("polymer".to_string(), MaterialSpec { base_cost: 6.0, quality: 50.0 });
        material_catalog
            .insert("electronics".to_string(), MaterialSpec { base_cost: 32.0, quality: 70.0 });

        let mut supplier_catalog = BTreeMap::new();
        supplier_catalog.insert(
            "northstar_metals".to_string(),
            SupplierSpec {
                region: Region::NorthAmerica,
                quality: 78.0,
                defect_rate: 0.015,
                cost_multiplier: 1.15,
            },
        );
        supplier_catalog.insert(
            "rheinwerk".to_string(),
            SupplierSpec {
                region: Region::Europe,
                quality: 85.0,
                defect_rate: 0.008,
                cost_multiplier: 1.30,
            },
        );
        supplier_catalog.insert(
            "pacific_source".to_string(),
            SupplierSpec {
                region: Region::Asia,
                quality: 62.0,
                defect_rate: 0.030,
                cost_multiplier: 0.85,
            },
        );
        supplier_catalog.insert(
            "gulf_supply".to_string(),
            SupplierSpec {
                region: Region::Mena,
                quality: 68.0,
                defect_rate: 0.020,
                cost_multiplier: 0.95,
            },
        );

        let mut route_catalog = BTreeMap::new();
        route_catalog.insert(
            "transpacific".to_string(),
            RouteSpec { customs_rounds_extra: 1, cost_multiplier: 1.05 },
        );
        route_catalog.insert(
            "atlantic".to_string(),
            RouteSpec { customs_rounds_extra: 0, cost_multiplier: 1.03 },
        );
        route_catalog
            .insert("overland".to_string(), RouteSpec { customs_rounds_extra: 0, cost_multiplier: 1.0 });
        route_catalog.insert(
            "suez".to_string(),
            RouteSpec { customs_rounds_extra: 1, cost_multiplier: 0.98 },
        );

        MaterialsParams {
            holding_cost_rate: 0.02,
            stage_pending_rounds: 1,
            stage_production_rounds: 2,
            stage_shipping_rounds,
            stage_customs_rounds: 1,
            units_per_product: 1.0,
            material_catalog,
            supplier_catalog,
            route_catalog,
        }
    }
}

/// Weights of the competitive-score components for one segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub price: f64,
    pub quality: f64,
    pub brand: f64,
    pub esg: f64,
    pub features: f64,
}

/// Market-simulator (allocator) parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Softmax temperature: larger values flatten allocations
    pub softmax_temperature: f64,
    /// Raw scores are reported on a 0..score_scale scale; the temperature
    /// is calibrated against it
    pub score_scale: f64,
    /// Per-segment component weights
    pub weights: BTreeMap<Segment, ScoreWeights>,
    /// Quality consumers expect per segment, 0-100
    pub quality_expectation: BTreeMap<Segment, f64>,
    /// Weight of the sqrt(brand) term
    pub brand_weight: f64,
    /// Prices below `segment_min * (1 - threshold)` draw the floor penalty
    pub price_floor_penalty_threshold: f64,
    /// Maximum floor penalty as a fraction of the raw score
    pub price_floor_penalty_max: f64,
    /// Cap on the quality/feature over-delivery bonus multiplier
    pub quality_feature_bonus_cap: f64,
    /// Teams below `threshold * segment average share` get the trailing boost
    pub rubber_band_threshold: f64,
    /// Multiplier applied to trailing teams' shares
    pub rubber_band_trailing_boost: f64,
    /// Multiplier applied to leading teams' shares (share > 2x average)
    pub rubber_band_leading_penalty: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(
            Segment::Budget,
            ScoreWeights { price: 0.50, quality: 0.20, brand: 0.12, esg: 0.06, features: 0.12 },
        );
        weights.insert(
            Segment::General,
            ScoreWeights { price: 0.32, quality: 0.28, brand: 0.18, esg: 0.08, features: 0.14 },
        );
        weights.insert(
            Segment::Enthusiast,
            ScoreWeights { price: 0.18, quality: 0.30, brand: 0.16, esg: 0.06, features: 0.30 },
        );
        weights.insert(
            Segment::Professional,
            ScoreWeights { price: 0.12, quality: 0.45, brand: 0.15, esg: 0.08, features: 0.20 },
        );
        weights.insert(
            Segment::ActiveLifestyle,
            ScoreWeights { price: 0.25, quality: 0.25, brand: 0.25, esg: 0.12, features: 0.13 },
        );

        let mut quality_expectation = BTreeMap::new();
        quality_expectation.insert(Segment::Budget, 40.0);
        quality_expectation.insert(Segment::General, 55.0);
        quality_expectation.insert(Segment::Enthusiast, 70.0);
        quality_expectation.insert(Segment::Professional, 85.0);
        quality_expectation.insert(Segment::ActiveLifestyle, 60.0);

        ScoringParams {
            softmax_temperature: 4.0,
            score_scale: 100.0,
            weights,
            quality_expectation,
            brand_weight: 1.0,
            price_floor_penalty_threshold: 0.15,
            price_floor_penalty_max: 0.50,
            quality_feature_bonus_cap: 1.5,
            rubber_band_threshold: 0.5,
            rubber_band_trailing_boost: 1.15,
            rubber_band_leading_penalty: 0.95,
        }
    }
}

/// ESG step-function parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsgParams {
    /// Cumulative score at or above which the high bonus applies
    pub high_threshold: f64,
    /// Cumulative score at or above which the mid bonus applies
    pub mid_threshold: f64,
    /// Revenue multiplier bonus in the high tier
    pub high_bonus: f64,
    /// Revenue multiplier bonus in the mid tier
    pub mid_bonus: f64,
    /// Penalty at `mid_threshold - 1` (linear to `low_penalty_max` at 0)
    pub low_penalty_min: f64,
    /// Penalty at score 0
    pub low_penalty_max: f64,
    /// Divisor normalising the raw score into [0, 1] for competitive scoring
    pub score_normalization: f64,
}

impl Default for EsgParams {
    fn default() -> Self {
        EsgParams {
            high_threshold: 600.0,
            mid_threshold: 300.0,
            high_bonus: 0.05,
            mid_bonus: 0.02,
            low_penalty_min: 0.01,
            low_penalty_max: 0.10,
            score_normalization: 1000.0,
        }
    }
}

/// Economic-cycle parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleParams {
    /// Markov transition matrix; rows/columns in [`EconomicPhase::all`] order
    pub transition_matrix: [[f64; 4]; 4],
    /// Chance per round of a named economy event, per phase
    pub event_chance: BTreeMap<EconomicPhase, f64>,
    /// Demand growth modifier per phase
    pub phase_demand_modifier: BTreeMap<EconomicPhase, f64>,
}

impl Default for CycleParams {
    fn default() -> Self {
        let mut event_chance = BTreeMap::new();
        event_chance.insert(EconomicPhase::Expansion, 0.05);
        event_chance.insert(EconomicPhase::Peak, 0.10);
        event_chance.insert(EconomicPhase::Contraction, 0.20);
        event_chance.insert(EconomicPhase::Trough, 0.15);

        let mut phase_demand_modifier = BTreeMap::new();
        phase_demand_modifier.insert(EconomicPhase::Expansion, 1.02);
        phase_demand_modifier.insert(EconomicPhase::Peak, 1.00);
        phase_demand_modifier.insert(EconomicPhase::Contraction, 0.97);
        phase_demand_modifier.insert(EconomicPhase::Trough, 0.98);

        CycleParams {
            transition_matrix: [
                [0.70, 0.25, 0.05, 0.00],
                [0.10, 0.55, 0.35, 0.00],
                [0.05, 0.00, 0.60, 0.35],
                [0.30, 0.00, 0.10, 0.60],
            ],
            event_chance,
            phase_demand_modifier,
        }
    }
}

/// Financial-statement parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementParams {
    /// PP&E straight-line depreciation life, rounds
    pub ppe_life_rounds: u32,
    /// Corporate tax rate on positive pre-tax income
    pub tax_rate: f64,
    /// Target price/earnings multiple for the valuation model
    pub target_pe: f64,
    /// Fraction of the gap to the PE-implied price closed each round
    pub price_smoothing: f64,
    /// Fraction of revenue booked as receivables at round close
    pub receivable_ratio: f64,
    /// Fraction of COGS carried as payables at round close
    pub payable_ratio: f64,
}

impl Default for StatementParams {
    fn default() -> Self {
        StatementParams {
            ppe_life_rounds: 40,
            tax_rate: 0.25,
            target_pe: 15.0,
            price_smoothing: 0.5,
            receivable_ratio: 0.15,
            payable_ratio: 0.10,
        }
    }
}

/// Starting conditions for teams and the market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartingParams {
    /// Cash each team starts with
    pub cash: f64,
    /// Shares outstanding at game start
    pub shares_issued: u64,
    /// Initial share price
    pub share_price: f64,
    /// Home region of newly created teams
    pub home_region: Region,
    /// Initial factory headcounts
    pub workers: u32,
    pub engineers: u32,
    pub supervisors: u32,
    /// Initial factory efficiency
    pub factory_efficiency: f64,
    /// Gross PP&E value of the starting factory
    pub factory_ppe_value: f64,
    /// Initial brand value
    pub brand_value: f64,
    /// Initial cumulative ESG score
    pub esg_score: f64,
    /// Initial per-segment demand
    pub segment_demand: BTreeMap<Segment, SegmentDemand>,
    /// Initial macro indicators
    pub macros: MacroIndicators,
    /// Initial FX rates per region
    pub fx_rates: BTreeMap<Region, f64>,
    /// Initial FX volatility
    pub fx_volatility: f64,
    /// Initial per-round interest rate
    pub interest_rate: f64,
    /// Initial market pressures
    pub pressures: MarketPressures,
}

impl Default for StartingParams {
    fn default() -> Self {
        let mut segment_demand = BTreeMap::new();
        segment_demand.insert(
            Segment::Budget,
            SegmentDemand { total_demand: 100_000.0, price_min: 100.0, price_max: 300.0, growth_rate: 0.02 },
        );
        segment_demand.insert(
            Segment::General,
            SegmentDemand { total_demand: 80_000.0, price_min: 200.0, price_max: 600.0, growth_rate: 0.02 },
        );
        segment_demand.insert(
            Segment::Enthusiast,
            SegmentDemand { total_demand: 40_000.0, price_min: 400.0, price_max: 900.0, growth_rate: 0.025 },
        );
        segment_demand.insert(
            Segment::Professional,
            SegmentDemand { total_demand: 20_000.0, price_min: 800.0, price_max: 1_500.0, growth_rate: 0.015 },
        );
        segment_demand.insert(
            Segment::ActiveLifestyle,
            SegmentDemand { total_demand: 30_000.0, price_min: 150.0, price_max: 500.0, growth_rate: 0.03 },
        );

        let mut fx_rates = BTreeMap::new();
        fx_rates.insert(Region::NorthAmerica, 1.0);
        fx_rates.insert(Region::Europe, 1.08);
        fx_rates.insert(Region::Asia, 0.92);
        fx_rates.insert(Region::Mena, 1.02);

        StartingParams {
            cash: 200_000_000.0,
            shares_issued: 10_000_000,
            share_price: 50.0,
            home_region: Region::NorthAmerica,
            workers: 200,
            engineers: 50,
            supervisors: 20,
            factory_efficiency: 0.55,
            factory_ppe_value: 50_000_000.0,
            brand_value: 0.30,
            esg_score: 350.0,
            segment_demand,
            macros: MacroIndicators {
                gdp_growth: 0.02,
                inflation: 0.01,
                consumer_confidence: 55.0,
                unemployment: 0.05,
            },
            fx_rates,
            fx_volatility: 0.02,
            interest_rate: 0.0125,
            pressures: MarketPressures {
                price_competition: 0.5,
                quality_expectations: 0.5,
                sustainability_premium: 0.2,
            },
        }
    }
}

/// The immutable, versioned parameter bundle consumed read-only by every
/// subsystem of the round pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Schema version; must equal [`ENGINE_SCHEMA_VERSION`]
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Difficulty preset this config was derived from
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Root seed for all RNG streams
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Optional wall-clock budget for one full round, milliseconds
    #[serde(default)]
    pub round_budget_ms: Option<u64>,
    /// Run the invariant suite after every round
    #[serde(default = "default_true")]
    pub check_invariants: bool,
    /// Rounds per in-game year (training fatigue windows, EPS annualisation)
    #[serde(default = "default_rounds_per_year")]
    pub rounds_per_year: u32,
    #[serde(default)]
    pub starting: StartingParams,
    #[serde(default)]
    pub factory: FactoryParams,
    #[serde(default)]
    pub hr: HrParams,
    #[serde(default)]
    pub research: ResearchParams,
    #[serde(default)]
    pub marketing: MarketingParams,
    #[serde(default)]
    pub finance: FinanceParams,
    #[serde(default)]
    pub materials: MaterialsParams,
    #[serde(default)]
    pub scoring: ScoringParams,
    #[serde(default)]
    pub esg: EsgParams,
    #[serde(default)]
    pub cycle: CycleParams,
    #[serde(default)]
    pub statements: StatementParams,
}

fn default_schema_version() -> u32 {
    ENGINE_SCHEMA_VERSION
}

fn default_seed() -> u64 {
    42
}

fn default_true() -> bool {
    true
}

fn default_rounds_per_year() -> u32 {
    4
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            schema_version: ENGINE_SCHEMA_VERSION,
            difficulty: Difficulty::Normal,
            seed: 42,
            round_budget_ms: None,
            check_invariants: true,
            rounds_per_year: 4,
            starting: StartingParams::default(),
            factory: FactoryParams::default(),
            hr: HrParams::default(),
            research: ResearchParams::default(),
            marketing: MarketingParams::default(),
            finance: FinanceParams::default(),
            materials: MaterialsParams::default(),
            scoring: ScoringParams::default(),
            esg: EsgParams::default(),
            cycle: CycleParams::default(),
            statements: StatementParams::default(),
        }
    }
}

impl GameConfig {
    /// Builds the default config scaled by a difficulty preset.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let mut config = GameConfig { difficulty, ..GameConfig::default() };
        config.starting.cash *= difficulty.starting_cash_multiplier();
        for demand in config.starting.segment_demand.values_mut() {
            demand.total_demand *= difficulty.demand_multiplier();
        }
        for chance in config.cycle.event_chance.values_mut() {
            *chance *= difficulty.event_chance_multiplier();
        }
        if difficulty == Difficulty::Sandbox {
            config.scoring.rubber_band_trailing_boost = 1.30;
            config.scoring.rubber_band_leading_penalty = 0.90;
        }
        config
    }

    /// Loads configuration from a YAML or TOML file, by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(SimulationError::ConfigFileRead)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config: GameConfig = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| SimulationError::YamlParse(e.to_string()))?,
            "toml" => {
                toml::from_str(&contents).map_err(|e| SimulationError::TomlParse(e.to_string()))?
            },
            other => return Err(SimulationError::UnsupportedConfigFormat(other.to_string())),
        };
        Ok(config)
    }

    /// Rejects a config built for a different engine schema.
    pub fn check_schema_version(&self) -> Result<()> {
        if self.schema_version != ENGINE_SCHEMA_VERSION {
            return Err(SimulationError::ConfigVersionMismatch {
                expected: ENGINE_SCHEMA_VERSION,
                found: self.schema_version,
            });
        }
        Ok(())
    }

    /// Validates parameter ranges before any engine work.
    pub fn validate(&self) -> Result<()> {
        self.check_schema_version()?;

        if !(0.0..=1.0).contains(&self.factory.max_efficiency) {
            return Err(SimulationError::ValidationError(
                "factory.max_efficiency must be in [0, 1]".to_string(),
            ));
        }
        if self.scoring.softmax_temperature <= 0.0 {
            return Err(SimulationError::ValidationError(
                "scoring.softmax_temperature must be positive".to_string(),
            ));
        }
        if self.scoring.score_scale <= 0.0 {
            return Err(SimulationError::ValidationError(
                "scoring.score_scale must be positive".to_string(),
            ));
        }
        if self.scoring.rubber_band_trailing_boost < 1.0 {
            return Err(SimulationError::ValidationError(
                "scoring.rubber_band_trailing_boost must be >= 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.scoring.rubber_band_leading_penalty) {
            return Err(SimulationError::ValidationError(
                "scoring.rubber_band_leading_penalty must be in [0, 1]".to_string(),
            ));
        }
        if self.marketing.advertising_chunk_size <= 0.0 {
            return Err(SimulationError::ValidationError(
                "marketing.advertising_chunk_size must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.marketing.brand_decay_rate) {
            return Err(SimulationError::ValidationError(
                "marketing.brand_decay_rate must be in [0, 1]".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.marketing.promotion_max_intensity) {
            return Err(SimulationError::ValidationError(
                "marketing.promotion_max_intensity must be in [0, 1)".to_string(),
            ));
        }
        if self.hr.salary_multiplier_min > self.hr.salary_multiplier_max {
            return Err(SimulationError::ValidationError(
                "hr.salary_multiplier_min must not exceed hr.salary_multiplier_max".to_string(),
            ));
        }
        if self.hr.ramp_up_productivity.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(SimulationError::ValidationError(
                "hr.ramp_up_productivity values must be in [0, 1]".to_string(),
            ));
        }
        if self.research.overrun_min_fraction > self.research.overrun_max_fraction {
            return Err(SimulationError::ValidationError(
                "research.overrun_min_fraction must not exceed overrun_max_fraction".to_string(),
            ));
        }
        if self.esg.mid_threshold >= self.esg.high_threshold {
            return Err(SimulationError::ValidationError(
                "esg.mid_threshold must be below esg.high_threshold".to_string(),
            ));
        }
        if self.esg.score_normalization <= 0.0 {
            return Err(SimulationError::ValidationError(
                "esg.score_normalization must be positive".to_string(),
            ));
        }
        if self.rounds_per_year == 0 {
            return Err(SimulationError::ValidationError(
                "rounds_per_year must be positive".to_string(),
            ));
        }
        if self.finance.min_shares == 0 {
            return Err(SimulationError::ValidationError(
                "finance.min_shares must be positive".to_string(),
            ));
        }
        if self.statements.ppe_life_rounds == 0 {
            return Err(SimulationError::ValidationError(
                "statements.ppe_life_rounds must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.statements.tax_rate) {
            return Err(SimulationError::ValidationError(
                "statements.tax_rate must be in [0, 1]".to_string(),
            ));
        }
        for (i, row) in self.cycle.transition_matrix.iter().enumerate() {
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > 1e-9 {
                return Err(SimulationError::ValidationError(format!(
                    "cycle.transition_matrix row {} sums to {}, expected 1.0",
                    i, sum
                )));
            }
            if row.iter().any(|p| *p < 0.0) {
                return Err(SimulationError::ValidationError(format!(
                    "cycle.transition_matrix row {} has a negative entry",
                    i
                )));
            }
        }
        for segment in Segment::all() {
            if !self.scoring.weights.contains_key(&segment) {
                return Err(SimulationError::ValidationError(format!(
                    "scoring.weights is missing segment '{}'",
                    segment
                )));
            }
            if !self.scoring.quality_expectation.contains_key(&segment) {
                return Err(SimulationError::ValidationError(format!(
                    "scoring.quality_expectation is missing segment '{}'",
                    segment
                )));
            }
        }
        Ok(())
    }

    /// Builds the initial market state from the starting parameters.
    pub fn initial_market_state(&self) -> MarketState {
        MarketState {
            round: 1,
            segments: self.starting.segment_demand.clone(),
            macros: self.starting.macros.clone(),
            fx_rates: self.starting.fx_rates.clone(),
            fx_volatility: self.starting.fx_volatility,
            interest_rate: self.starting.interest_rate,
            pressures: self.starting.pressures.clone(),
            phase: EconomicPhase::Expansion,
            active_events: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_all_difficulty_presets_are_valid() {
        for difficulty in Difficulty::all() {
            let config = GameConfig::for_difficulty(difficulty);
            assert!(config.validate().is_ok(), "preset {} invalid", difficulty.as_str());
        }
    }

    #[test]
    fn test_schema_version_mismatch_rejected() {
        let config = GameConfig { schema_version: 99, ..GameConfig::default() };
        assert!(matches!(
            config.validate(),
            Err(SimulationError::ConfigVersionMismatch { expected: _, found: 99 })
        ));
    }

    #[test]
    fn test_bad_softmax_temperature_rejected() {
        let mut config = GameConfig::default();
        config.scoring.softmax_temperature = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_transition_matrix_rejected() {
        let mut config = GameConfig::default();
        config.cycle.transition_matrix[0] = [0.5, 0.5, 0.5, 0.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("nightmare").unwrap(), Difficulty::Nightmare);
        assert_eq!(Difficulty::from_str("NORMAL").unwrap(), Difficulty::Normal);
        assert!(Difficulty::from_str("impossible").is_err());
    }

    #[test]
    fn test_sandbox_disables_events() {
        let config = GameConfig::for_difficulty(Difficulty::Sandbox);
        assert!(config.cycle.event_chance.values().all(|c| *c == 0.0));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "seed: 7\ndifficulty: hard\n";
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = GameConfig::from_file(file.path()).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.schema_version, ENGINE_SCHEMA_VERSION);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            GameConfig::from_file(file.path()),
            Err(SimulationError::UnsupportedConfigFormat(_))
        ));
    }

    #[test]
    fn test_initial_market_state_covers_all_segments() {
        let market = GameConfig::default().initial_market_state();
        for segment in Segment::all() {
            assert!(market.segments.contains_key(&segment));
        }
        assert_eq!(market.round, 1);
    }
}
