//! Team state: the full snapshot of one company between rounds.
//!
//! A [`TeamState`] is a tree of owned values plus id references (patents and
//! licensees point at each other by id only), so a deep clone is a plain
//! `Clone` with no aliasing. The round engine owns all mutation; module
//! processors receive a clone they may mutate freely and hand back.

use crate::config::GameConfig;
use crate::credit_rating::CreditRating;
use crate::factory::Factory;
use crate::finance::{DebtInstrument, EconomicForecast};
use crate::hr::Role;
use crate::market::Region;
use crate::materials::{Inventory, MaterialOrder};
use crate::product::{Product, Segment};
use crate::research::{Patent, TechProgress};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregate workforce block shared across a team's factories.
///
/// Headcounts live on the factories; this block carries the team-wide
/// people metrics and policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workforce {
    /// Team morale, 0-100
    pub morale: f64,
    /// Team burnout, 0-100
    pub burnout: f64,
    /// Average productivity factor, 0-100
    pub productivity: f64,
    /// Salary multiplier per role (1.0 = base salary)
    pub salary_multipliers: BTreeMap<Role, f64>,
    /// Benefits currently active, by catalogue key
    pub benefits: BTreeSet<String>,
    /// Trainings applied in the current year (resets every 4 rounds)
    pub trainings_this_year: u32,
    /// Hire cohorts still on the productivity ramp: (role, count, rounds since hire)
    pub ramping_hires: Vec<HireCohort>,
}

/// One cohort of new hires working through the productivity ramp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HireCohort {
    pub role: Role,
    pub count: u32,
    pub rounds_since_hire: u32,
}

impl Default for Workforce {
    fn default() -> Self {
        let mut salary_multipliers = BTreeMap::new();
        for role in Role::all() {
            salary_multipliers.insert(role, 1.0);
        }
        Workforce {
            morale: 60.0,
            burnout: 10.0,
            productivity: 60.0,
            salary_multipliers,
            benefits: BTreeSet::new(),
            trainings_this_year: 0,
            ramping_hires: Vec::new(),
        }
    }
}

/// A team's full snapshot between rounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamState {
    /// Stable team id
    pub id: String,
    /// Display name
    pub name: String,
    /// The round this snapshot was closed at (0 = game start)
    pub round: u32,

    // Monetary position
    pub cash: f64,
    /// Revenue realised in the last closed round
    pub revenue: f64,
    /// Net income of the last closed round
    pub net_income: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub short_term_debt: f64,
    pub long_term_debt: f64,
    pub accounts_receivable: f64,
    pub accounts_payable: f64,
    pub shareholders_equity: f64,
    /// Capital received for issued shares, net of buybacks
    pub paid_in_capital: f64,
    /// Accumulated retained earnings
    pub retained_earnings: f64,
    /// Gross property, plant and equipment
    pub ppe_gross: f64,
    /// Accumulated straight-line depreciation on PP&E
    pub accumulated_depreciation: f64,
    /// Dividends paid in the last closed round
    pub dividends_paid: f64,

    // Equity market
    pub shares_issued: u64,
    pub share_price: f64,
    pub market_cap: f64,
    pub eps: f64,
    pub credit_rating: CreditRating,

    /// Outstanding debt instruments
    pub debts: Vec<DebtInstrument>,

    /// Production sites, in founding order
    pub factories: Vec<Factory>,
    /// Products keyed by product id
    pub products: BTreeMap<String, Product>,
    /// Aggregate workforce block
    pub workforce: Workforce,

    /// Brand value in [0, 1]
    pub brand_value: f64,
    /// Market share per segment from the last closed round
    pub market_share: BTreeMap<Segment, f64>,
    /// Units sold per segment in the last closed round
    pub sales_by_segment: BTreeMap<Segment, f64>,
    /// Cumulative ESG score, >= 0
    pub esg_score: f64,

    /// Research and tech-tree progress
    pub tech: TechProgress,
    /// Patents this team owns
    pub patents: Vec<Patent>,

    /// Raw-material inventory
    pub inventory: Inventory,
    /// Material orders in flight
    pub material_orders: Vec<MaterialOrder>,

    /// Home region (revenue here carries no FX impact)
    pub home_region: Region,

    /// Promotion discounts active for the upcoming market resolution,
    /// per segment; reset by the marketing pass each round
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub active_promotions: BTreeMap<Segment, f64>,

    /// Economic forecast submitted last round, scored at the next close
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_forecast: Option<EconomicForecast>,

    /// Set once cash has gone negative at a round close
    #[serde(default)]
    pub bankrupt: bool,

    /// Unknown fields from newer snapshots, preserved opaquely
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TeamState {
    /// Creates a team at game start, per the config's starting parameters.
    pub fn initial(id: &str, name: &str, config: &GameConfig) -> Self {
        let start = &config.starting;
        let factory = Factory::initial(
            &format!("{}-f1", id),
            start.home_region,
            start.workers,
            start.engineers,
            start.supervisors,
            start.factory_efficiency,
        );

        let ppe_gross = start.factory_ppe_value;
        let cash = start.cash;
        let total_assets = cash + ppe_gross;
        let paid_in_capital = total_assets;

        TeamState {
            id: id.to_string(),
            name: name.to_string(),
            round: 0,
            cash,
            revenue: 0.0,
            net_income: 0.0,
            total_assets,
            total_liabilities: 0.0,
            short_term_debt: 0.0,
            long_term_debt: 0.0,
            accounts_receivable: 0.0,
            accounts_payable: 0.0,
            shareholders_equity: total_assets,
            paid_in_capital,
            retained_earnings: 0.0,
            ppe_gross,
            accumulated_depreciation: 0.0,
            dividends_paid: 0.0,
            shares_issued: start.shares_issued,
            share_price: start.share_price,
            market_cap: start.share_price * start.shares_issued as f64,
            eps: 0.0,
            credit_rating: CreditRating::BBB,
            debts: Vec::new(),
            factories: vec![factory],
            products: BTreeMap::new(),
            workforce: Workforce::default(),
            brand_value: start.brand_value,
            market_share: BTreeMap::new(),
            sales_by_segment: BTreeMap::new(),
            esg_score: start.esg_score,
            tech: TechProgress::default(),
            patents: Vec::new(),
            inventory: Inventory::default(),
            material_orders: Vec::new(),
            home_region: start.home_region,
            active_promotions: BTreeMap::new(),
            pending_forecast: None,
            bankrupt: false,
            extra: serde_json::Map::new(),
        }
    }

    /// Total headcount across all factories, by role.
    pub fn headcount(&self, role: Role) -> u32 {
        self.factories.iter().map(|f| f.headcount(role)).sum()
    }

    /// Total headcount across all factories and roles.
    pub fn total_headcount(&self) -> u32 {
        Role::all().iter().map(|r| self.headcount(*r)).sum()
    }

    /// Sum of outstanding debt principal.
    pub fn total_debt(&self) -> f64 {
        self.debts.iter().map(|d| d.principal).sum()
    }

    /// Book value of prepaid material orders still in the pipeline.
    pub fn inventory_in_transit_value(&self) -> f64 {
        self.material_orders.iter().map(|o| o.quantity * o.unit_cost).sum()
    }

    /// Launched products contending in a given segment.
    pub fn contending_products(&self, segment: Segment) -> Vec<&Product> {
        self.products.values().filter(|p| p.segment == segment && p.is_contending()).collect()
    }

    /// Clamps every bounded field into its documented range.
    ///
    /// Cash may go negative (bankruptcy); physical counts and normalised
    /// scores may not.
    pub fn clamp_all(&mut self, config: &GameConfig) {
        self.brand_value = self.brand_value.clamp(0.0, 1.0);
        self.esg_score = self.esg_score.max(0.0);
        if self.shares_issued < config.finance.min_shares {
            self.shares_issued = config.finance.min_shares;
        }
        self.share_price = self.share_price.max(0.01);
        for share in self.market_share.values_mut() {
            *share = share.clamp(0.0, 1.0);
        }
        for factory in &mut self.factories {
            factory.clamp_ranges(config.factory.max_efficiency);
        }
        for product in self.products.values_mut() {
            product.clamp_ranges();
        }
        self.workforce.morale = self.workforce.morale.clamp(0.0, 100.0);
        self.workforce.burnout = self.workforce.burnout.clamp(0.0, 100.0);
        self.workforce.productivity = self.workforce.productivity.clamp(0.0, 100.0);
        self.inventory.clamp_negative_lots();
    }

    /// Structural invariant violations in this snapshot, if any.
    ///
    /// Used by the invariant suite after each round; an empty vector means
    /// the snapshot is sound.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if (self.market_cap - self.share_price * self.shares_issued as f64).abs() > 0.01 {
            violations.push(format!(
                "market_cap {} != share_price {} * shares {}",
                self.market_cap, self.share_price, self.shares_issued
            ));
        }
        let balance_gap =
            self.total_assets - (self.total_liabilities + self.shareholders_equity);
        if self.round > 0 && balance_gap.abs() > 0.01 {
            violations.push(format!("balance sheet off by {}", balance_gap));
        }
        if !(0.0..=1.0).contains(&self.brand_value) {
            violations.push(format!("brand_value {} outside [0,1]", self.brand_value));
        }
        if self.esg_score < 0.0 {
            violations.push(format!("esg_score {} negative", self.esg_score));
        }
        for (segment, share) in &self.market_share {
            if !(0.0..=1.0).contains(share) {
                violations.push(format!("market share {} in {} outside [0,1]", share, segment));
            }
        }
        for factory in &self.factories {
            violations.extend(factory.invariant_violations());
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn test_initial_state_is_sound() {
        let config = GameConfig::default();
        let team = TeamState::initial("team-a", "Aurora Devices", &config);
        assert_eq!(team.round, 0);
        assert_eq!(team.factories.len(), 1);
        assert!(team.invariant_violations().is_empty(), "{:?}", team.invariant_violations());
        assert_eq!(team.cash, config.starting.cash);
        assert_eq!(team.shares_issued, config.starting.shares_issued);
    }

    #[test]
    fn test_initial_balance_identity() {
        let config = GameConfig::default();
        let team = TeamState::initial("team-a", "Aurora Devices", &config);
        assert!(
            (team.total_assets - team.total_liabilities - team.shareholders_equity).abs() < 0.01
        );
    }

    #[test]
    fn test_clamp_all_restores_ranges() {
        let config = GameConfig::default();
        let mut team = TeamState::initial("team-a", "Aurora Devices", &config);
        team.brand_value = 1.7;
        team.esg_score = -20.0;
        team.shares_issued = 5;
        team.market_share.insert(Segment::Budget, 1.4);
        team.clamp_all(&config);
        assert_eq!(team.brand_value, 1.0);
        assert_eq!(team.esg_score, 0.0);
        assert_eq!(team.shares_issued, config.finance.min_shares);
        assert_eq!(team.market_share[&Segment::Budget], 1.0);
    }

    #[test]
    fn test_deep_clone_has_no_aliasing() {
        let config = GameConfig::default();
        let team = TeamState::initial("team-a", "Aurora Devices", &config);
        let mut clone = team.clone();
        clone.cash -= 1_000_000.0;
        clone.factories[0].workers += 10;
        assert_ne!(team.cash, clone.cash);
        assert_ne!(team.factories[0].workers, clone.factories[0].workers);
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let config = GameConfig::default();
        let team = TeamState::initial("team-a", "Aurora Devices", &config);
        let mut value = serde_json::to_value(&team).unwrap();
        value["future_metric"] = serde_json::json!(123);
        let restored: TeamState = serde_json::from_value(value).unwrap();
        assert_eq!(restored.extra["future_metric"], serde_json::json!(123));
        let out = serde_json::to_value(&restored).unwrap();
        assert_eq!(out["future_metric"], serde_json::json!(123));
    }
}
