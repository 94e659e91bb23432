//! Per-team, per-round decision bundles.
//!
//! Decisions arrive at the boundary as loose records; here they are modelled
//! as one tagged union per module, with explicit schemas validated before any
//! processing. Validation is *corrective*: malformed or unaffordable items
//! are dropped (with a warning), well-formed ones are kept, and the result of
//! validating an already-validated bundle is the bundle itself.

use crate::config::GameConfig;
use crate::finance::ProposalKind;
use crate::hr::Role;
use crate::market::Region;
use crate::marketing::{Channel, PromotionKind};
use crate::materials::ShippingMethod;
use crate::module::{ModuleKind, Warning};
use crate::product::Segment;
use crate::research::RiskLevel;
use crate::team::TeamState;
use serde::{Deserialize, Serialize};

/// Factory-module operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FactoryDecision {
    /// Allocate efficiency investment across spending categories
    EfficiencyInvestment {
        factory_id: String,
        #[serde(default)]
        workers: f64,
        #[serde(default)]
        supervisors: f64,
        #[serde(default)]
        engineers: f64,
        #[serde(default)]
        machinery: f64,
        #[serde(default)]
        general: f64,
    },
    /// Build a new factory in a region
    BuildFactory { region: Region },
    /// Invest in green energy for one factory
    GreenInvestment { factory_id: String, amount: f64 },
    /// Purchase a machine from the catalogue
    PurchaseMachine { factory_id: String, machine_type: String },
    /// Sell a machine at its depreciated value
    SellMachine { factory_id: String, machine_id: String },
    /// Take a machine offline or bring it back
    SetMachineOnline { factory_id: String, machine_id: String, online: bool },
    /// Service a machine, resetting its maintenance clock
    MaintainMachine { factory_id: String, machine_id: String },
}

/// HR-module operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HrDecision {
    /// Change the salary multiplier for a role
    SetSalaryMultiplier { role: Role, multiplier: f64 },
    /// Run one training program focused on a role
    ScheduleTraining { focus: Role },
    /// Hire (positive) or dismiss (negative) heads of a role
    AdjustHeadcount {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        factory_id: Option<String>,
        role: Role,
        delta: i64,
    },
    /// Enable or disable a benefit from the catalogue
    SetBenefit { benefit: String, enabled: bool },
}

/// R&D-module operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResearchDecision {
    /// Start researching a tech node at a chosen risk level
    StartResearch { tech_id: String, risk: RiskLevel },
    /// Begin developing a new product
    StartProduct { product_id: String, name: String, segment: Segment, target_quality: f64, price: f64 },
    /// Allocate R&D budget to a product in development
    AllocateProductBudget { product_id: String, amount: f64 },
    /// Invest in the shared development platform
    PlatformInvestment { amount: f64 },
}

/// Marketing-module operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketingDecision {
    /// Advertising budget for a (segment, channel) pair
    Advertising { segment: Segment, channel: Channel, budget: f64 },
    /// Direct brand investment
    BrandInvestment { amount: f64 },
    /// Purchase a sponsorship from the catalogue
    Sponsorship { sponsorship_id: String },
    /// Run a promotion in a segment with an intensity in [0, max]
    Promotion { segment: Segment, kind: PromotionKind, intensity: f64 },
    /// Purchase a brand activity from the catalogue
    BrandActivity { activity_id: String },
}

/// Finance-module operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FinanceDecision {
    /// Issue short-term treasury bills
    IssueTreasuryBills { amount: f64 },
    /// Issue long-term corporate bonds
    IssueBonds { amount: f64 },
    /// Request a bank loan with a given term
    RequestLoan { amount: f64, term_rounds: u32 },
    /// Issue new stock for a target amount of capital
    IssueStock { amount: f64 },
    /// Buy back shares for a given cash amount
    BuybackShares { amount: f64 },
    /// Declare a dividend per share
    DeclareDividend { per_share: f64 },
    /// Submit an economic forecast for next round
    SubmitForecast { gdp_growth: f64, inflation: f64, demand_growth: f64 },
    /// Call a board meeting over a proposal
    BoardMeeting { proposal: ProposalKind },
}

/// Materials-module operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialsDecision {
    /// Place a material order with a supplier over an optional named route
    PlaceOrder {
        material: String,
        supplier: String,
        quantity: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        route: Option<String>,
        method: ShippingMethod,
    },
}

/// The full decision bundle one team submits for one round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamDecisions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub factory: Vec<FactoryDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hr: Vec<HrDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub research: Vec<ResearchDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marketing: Vec<MarketingDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finance: Vec<FinanceDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<MaterialsDecision>,
}

impl TeamDecisions {
    /// Whether the bundle contains no decisions at all.
    pub fn is_empty(&self) -> bool {
        self.factory.is_empty()
            && self.hr.is_empty()
            && self.research.is_empty()
            && self.marketing.is_empty()
            && self.finance.is_empty()
            && self.materials.is_empty()
    }
}

/// Outcome of boundary validation: the corrected bundle plus one warning per
/// dropped or corrected item.
#[derive(Debug, Clone)]
pub struct ValidatedDecisions {
    pub corrected: TeamDecisions,
    pub warnings: Vec<Warning>,
}

/// Validates one team's bundle against its state and the config.
///
/// Pure: never mutates the inputs. Idempotent: validating the corrected
/// bundle again yields the same bundle and no warnings.
pub fn validate_decisions(
    state: &TeamState,
    decisions: &TeamDecisions,
    config: &GameConfig,
) -> ValidatedDecisions {
    let mut corrected = TeamDecisions::default();
    let mut warnings = Vec::new();
    // Running affordability budget: investments are capped at cash on hand,
    // whole-item purchases (factories) are dropped outright.
    let mut budget = state.cash.max(0.0);

    for decision in &decisions.factory {
        match decision {
            FactoryDecision::EfficiencyInvestment {
                factory_id,
                workers,
                supervisors,
                engineers,
                machinery,
                general,
            } => {
                if !has_factory(state, factory_id) {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("unknown factory '{}'; efficiency investment dropped", factory_id),
                    ));
                    continue;
                }
                let parts = [*workers, *supervisors, *engineers, *machinery, *general];
                if parts.iter().any(|p| *p < 0.0) {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        "negative efficiency investment dropped".to_string(),
                    ));
                    continue;
                }
                let total: f64 = parts.iter().sum();
                if total <= 0.0 {
                    continue;
                }
                // Relative epsilon keeps re-validation of an already-scaled
                // bundle from rescaling over float round-off.
                let scale = if total > budget * (1.0 + 1e-9) { budget / total } else { 1.0 };
                if scale < 1.0 {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!(
                            "efficiency investment capped at available cash ({:.0} of {:.0})",
                            budget, total
                        ),
                    ));
                }
                if scale <= 0.0 {
                    continue;
                }
                budget -= total * scale;
                corrected.factory.push(FactoryDecision::EfficiencyInvestment {
                    factory_id: factory_id.clone(),
                    workers: workers * scale,
                    supervisors: supervisors * scale,
                    engineers: engineers * scale,
                    machinery: machinery * scale,
                    general: general * scale,
                });
            },
            FactoryDecision::BuildFactory { region } => {
                if config.factory.factory_build_cost > budget {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("cannot afford factory in {}; build dropped", region),
                    ));
                    continue;
                }
                budget -= config.factory.factory_build_cost;
                corrected.factory.push(decision.clone());
            },
            FactoryDecision::GreenInvestment { factory_id, amount } => {
                if !has_factory(state, factory_id) {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("unknown factory '{}'; green investment dropped", factory_id),
                    ));
                    continue;
                }
                if *amount < 0.0 {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        "negative green investment dropped".to_string(),
                    ));
                    continue;
                }
                if *amount <= 0.0 {
                    continue;
                }
                let capped = amount.min(budget);
                if capped < *amount {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("green investment capped at available cash ({:.0})", capped),
                    ));
                }
                if capped <= 0.0 {
                    continue;
                }
                budget -= capped;
                corrected.factory.push(FactoryDecision::GreenInvestment {
                    factory_id: factory_id.clone(),
                    amount: capped,
                });
            },
            FactoryDecision::PurchaseMachine { factory_id, machine_type } => {
                if !has_factory(state, factory_id) {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("unknown factory '{}'; machine purchase dropped", factory_id),
                    ));
                    continue;
                }
                let Some(spec) = config.factory.machine_catalog.get(machine_type) else {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("unknown machine type '{}'; purchase dropped", machine_type),
                    ));
                    continue;
                };
                if spec.cost > budget {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!("cannot afford machine '{}'; purchase dropped", machine_type),
                    ));
                    continue;
                }
                budget -= spec.cost;
                corrected.factory.push(decision.clone());
            },
            FactoryDecision::SellMachine { factory_id, machine_id }
            | FactoryDecision::MaintainMachine { factory_id, machine_id }
            | FactoryDecision::SetMachineOnline { factory_id, machine_id, .. } => {
                if !has_machine(state, factory_id, machine_id) {
                    warnings.push(Warning::new(
                        ModuleKind::Factory,
                        format!(
                            "unknown machine '{}' in factory '{}'; decision dropped",
                            machine_id, factory_id
                        ),
                    ));
                    continue;
                }
                corrected.factory.push(decision.clone());
            },
        }
    }

    for decision in &decisions.hr {
        match decision {
            HrDecision::SetSalaryMultiplier { role, multiplier } => {
                if multiplier.is_nan() || *multiplier <= 0.0 {
                    warnings.push(Warning::new(
                        ModuleKind::Hr,
                        format!("invalid salary multiplier for {}; decision dropped", role),
                    ));
                    continue;
                }
                // Out-of-band multipliers are clamped during processing, not
                // dropped here, so re-validation stays idempotent.
                corrected.hr.push(decision.clone());
            },
            HrDecision::ScheduleTraining { .. } => corrected.hr.push(decision.clone()),
            HrDecision::AdjustHeadcount { factory_id, role, delta } => {
                if let Some(fid) = factory_id {
                    if !has_factory(state, fid) {
                        warnings.push(Warning::new(
                            ModuleKind::Hr,
                            format!("unknown factory '{}'; headcount change dropped", fid),
                        ));
                        continue;
                    }
                }
                if *delta == 0 {
                    continue;
                }
                let _ = role;
                corrected.hr.push(decision.clone());
            },
            HrDecision::SetBenefit { benefit, .. } => {
                if !config.hr.benefit_catalog.contains_key(benefit) {
                    warnings.push(Warning::new(
                        ModuleKind::Hr,
                        format!("unknown benefit '{}'; decision dropped", benefit),
                    ));
                    continue;
                }
                corrected.hr.push(decision.clone());
            },
        }
    }

    for decision in &decisions.research {
        match decision {
            ResearchDecision::StartResearch { .. } => {
                // Prerequisite checks happen in the processor (silently, per
                // the tech-tree contract); the id itself is checked there too.
                corrected.research.push(decision.clone());
            },
            ResearchDecision::StartProduct { product_id, target_quality, price, .. } => {
                if state.products.contains_key(product_id) {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        format!("product id '{}' already exists; decision dropped", product_id),
                    ));
                    continue;
                }
                if *price < 0.0 || !(0.0..=100.0).contains(target_quality) {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        format!("invalid price or target quality for '{}'; dropped", product_id),
                    ));
                    continue;
                }
                corrected.research.push(decision.clone());
            },
            ResearchDecision::AllocateProductBudget { product_id, amount } => {
                if !state.products.contains_key(product_id) {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        format!("unknown product '{}'; budget allocation dropped", product_id),
                    ));
                    continue;
                }
                if *amount < 0.0 {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        "negative R&D budget dropped".to_string(),
                    ));
                    continue;
                }
                if *amount <= 0.0 {
                    continue;
                }
                let capped = amount.min(budget);
                if capped < *amount {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        format!("R&D budget capped at available cash ({:.0})", capped),
                    ));
                }
                if capped <= 0.0 {
                    continue;
                }
                budget -= capped;
                corrected.research.push(ResearchDecision::AllocateProductBudget {
                    product_id: product_id.clone(),
                    amount: capped,
                });
            },
            ResearchDecision::PlatformInvestment { amount } => {
                if *amount < 0.0 {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        "negative platform investment dropped".to_string(),
                    ));
                    continue;
                }
                if *amount <= 0.0 {
                    continue;
                }
                let capped = amount.min(budget);
                if capped < *amount {
                    warnings.push(Warning::new(
                        ModuleKind::Research,
                        format!("platform investment capped at available cash ({:.0})", capped),
                    ));
                }
                if capped <= 0.0 {
                    continue;
                }
                budget -= capped;
                corrected.research.push(ResearchDecision::PlatformInvestment { amount: capped });
            },
        }
    }

    for decision in &decisions.marketing {
        match decision {
            MarketingDecision::Advertising { segment, channel, budget: ad_budget } => {
                if *ad_budget < 0.0 {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        "negative advertising budget dropped".to_string(),
                    ));
                    continue;
                }
                if *ad_budget <= 0.0 {
                    continue;
                }
                let capped = ad_budget.min(budget);
                if capped < *ad_budget {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("advertising budget capped at available cash ({:.0})", capped),
                    ));
                }
                if capped <= 0.0 {
                    continue;
                }
                budget -= capped;
                corrected.marketing.push(MarketingDecision::Advertising {
                    segment: *segment,
                    channel: *channel,
                    budget: capped,
                });
            },
            MarketingDecision::BrandInvestment { amount } => {
                if *amount < 0.0 {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        "negative brand investment dropped".to_string(),
                    ));
                    continue;
                }
                if *amount <= 0.0 {
                    continue;
                }
                let capped = amount.min(budget);
                if capped < *amount {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("brand investment capped at available cash ({:.0})", capped),
                    ));
                }
                if capped <= 0.0 {
                    continue;
                }
                budget -= capped;
                corrected.marketing.push(MarketingDecision::BrandInvestment { amount: capped });
            },
            MarketingDecision::Sponsorship { sponsorship_id } => {
                let Some(spec) = config.marketing.sponsorship_catalog.get(sponsorship_id) else {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("unknown sponsorship '{}'; dropped", sponsorship_id),
                    ));
                    continue;
                };
                if spec.cost > budget {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("cannot afford sponsorship '{}'; dropped", sponsorship_id),
                    ));
                    continue;
                }
                budget -= spec.cost;
                corrected.marketing.push(decision.clone());
            },
            MarketingDecision::Promotion { segment, kind, intensity } => {
                if *intensity < 0.0 || intensity.is_nan() {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        "negative promotion intensity dropped".to_string(),
                    ));
                    continue;
                }
                let max = config.marketing.promotion_max_intensity;
                let capped = intensity.min(max);
                if capped < *intensity {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("promotion intensity capped at {:.0}%", max * 100.0),
                    ));
                }
                corrected.marketing.push(MarketingDecision::Promotion {
                    segment: *segment,
                    kind: *kind,
                    intensity: capped,
                });
            },
            MarketingDecision::BrandActivity { activity_id } => {
                let Some(spec) = config.marketing.activity_catalog.get(activity_id) else {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("unknown brand activity '{}'; dropped", activity_id),
                    ));
                    continue;
                };
                if spec.cost > budget {
                    warnings.push(Warning::new(
                        ModuleKind::Marketing,
                        format!("cannot afford brand activity '{}'; dropped", activity_id),
                    ));
                    continue;
                }
                budget -= spec.cost;
                corrected.marketing.push(decision.clone());
            },
        }
    }

    for decision in &decisions.finance {
        match decision {
            FinanceDecision::IssueTreasuryBills { amount }
            | FinanceDecision::IssueBonds { amount }
            | FinanceDecision::IssueStock { amount } => {
                if *amount <= 0.0 {
                    warnings.push(Warning::new(
                        ModuleKind::Finance,
                        "non-positive issuance amount dropped".to_string(),
                    ));
                    continue;
                }
                corrected.finance.push(decision.clone());
            },
            FinanceDecision::RequestLoan { amount, term_rounds } => {
                if *amount <= 0.0 || *term_rounds == 0 {
                    warnings.push(Warning::new(
                        ModuleKind::Finance,
                        "invalid loan request dropped".to_string(),
                    ));
                    continue;
                }
                corrected.finance.push(decision.clone());
            },
            FinanceDecision::BuybackShares { amount } => {
                if *amount <= 0.0 {
                    warnings.push(Warning::new(
                        ModuleKind::Finance,
                        "non-positive buyback amount dropped".to_string(),
                    ));
                    continue;
                }
                let capped = amount.min(budget);
                if capped < *amount {
                    warnings.push(Warning::new(
                        ModuleKind::Finance,
                        format!("buyback capped at available cash ({:.0})", capped),
                    ));
                }
                if capped <= 0.0 {
                    continue;
                }
                budget -= capped;
                corrected.finance.push(FinanceDecision::BuybackShares { amount: capped });
            },
            FinanceDecision::DeclareDividend { per_share } => {
                if *per_share < 0.0 || per_share.is_nan() {
                    warnings.push(Warning::new(
                        ModuleKind::Finance,
                        "negative dividend dropped".to_string(),
                    ));
                    continue;
                }
                if *per_share == 0.0 {
                    continue;
                }
                corrected.finance.push(decision.clone());
            },
            FinanceDecision::SubmitForecast { gdp_growth, inflation, demand_growth } => {
                if gdp_growth.is_nan() || inflation.is_nan() || demand_growth.is_nan() {
                    warnings.push(Warning::new(
                        ModuleKind::Finance,
                        "forecast with NaN fields dropped".to_string(),
                    ));
                    continue;
                }
                corrected.finance.push(decision.clone());
            },
            FinanceDecision::BoardMeeting { .. } => corrected.finance.push(decision.clone()),
        }
    }

    for decision in &decisions.materials {
        match decision {
            MaterialsDecision::PlaceOrder { material, supplier, quantity, route, method } => {
                if *quantity <= 0.0 || quantity.is_nan() {
                    warnings.push(Warning::new(
                        ModuleKind::Materials,
                        "non-positive order quantity dropped".to_string(),
                    ));
                    continue;
                }
                let Some(mat) = config.materials.material_catalog.get(material) else {
                    warnings.push(Warning::new(
                        ModuleKind::Materials,
                        format!("unknown material '{}'; order dropped", material),
                    ));
                    continue;
                };
                let Some(sup) = config.materials.supplier_catalog.get(supplier) else {
                    warnings.push(Warning::new(
                        ModuleKind::Materials,
                        format!("unknown supplier '{}'; order dropped", supplier),
                    ));
                    continue;
                };
                let route_mult = match route {
                    Some(name) => match config.materials.route_catalog.get(name) {
                        Some(spec) => spec.cost_multiplier,
                        None => {
                            warnings.push(Warning::new(
                                ModuleKind::Materials,
                                format!("unknown route '{}'; order dropped", name),
                            ));
                            continue;
                        },
                    },
                    None => 1.0,
                };
                let cost = mat.base_cost * sup.cost_multiplier * route_mult * quantity;
                if cost > budget {
                    warnings.push(Warning::new(
                        ModuleKind::Materials,
                        format!(
                            "cannot afford order of {:.0} {} from {}; order dropped",
                            quantity, material, supplier
                        ),
                    ));
                    continue;
                }
                budget -= cost;
                corrected.materials.push(decision.clone());
            },
        }
    }

    ValidatedDecisions { corrected, warnings }
}

fn has_factory(state: &TeamState, factory_id: &str) -> bool {
    state.factories.iter().any(|f| f.id == factory_id)
}

fn has_machine(state: &TeamState, factory_id: &str, machine_id: &str) -> bool {
    state
        .factories
        .iter()
        .find(|f| f.id == factory_id)
        .map(|f| f.machines.iter().any(|m| m.id == machine_id))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::team::TeamState;

    fn setup() -> (TeamState, GameConfig) {
        let config = GameConfig::default();
        let team = TeamState::initial("team-a", "Aurora Devices", &config);
        (team, config)
    }

    #[test]
    fn test_negative_budget_dropped_with_warning() {
        let (team, config) = setup();
        let decisions = TeamDecisions {
            marketing: vec![MarketingDecision::Advertising {
                segment: Segment::Budget,
                channel: Channel::Online,
                budget: -5_000.0,
            }],
            ..TeamDecisions::default()
        };
        let validated = validate_decisions(&team, &decisions, &config);
        assert!(validated.corrected.marketing.is_empty());
        assert_eq!(validated.warnings.len(), 1);
        assert_eq!(validated.warnings[0].module, ModuleKind::Marketing);
    }

    #[test]
    fn test_unknown_machine_type_dropped() {
        let (team, config) = setup();
        let factory_id = team.factories[0].id.clone();
        let decisions = TeamDecisions {
            factory: vec![FactoryDecision::PurchaseMachine {
                factory_id,
                machine_type: "quantum_forge".to_string(),
            }],
            ..TeamDecisions::default()
        };
        let validated = validate_decisions(&team, &decisions, &config);
        assert!(validated.corrected.factory.is_empty());
        assert!(validated.warnings[0].message.contains("quantum_forge"));
    }

    #[test]
    fn test_unaffordable_factory_build_dropped() {
        let (mut team, config) = setup();
        team.cash = 1_000_000.0;
        let decisions = TeamDecisions {
            factory: vec![FactoryDecision::BuildFactory { region: Region::Asia }],
            ..TeamDecisions::default()
        };
        let validated = validate_decisions(&team, &decisions, &config);
        assert!(validated.corrected.factory.is_empty());
        assert_eq!(validated.warnings.len(), 1);
    }

    #[test]
    fn test_investment_capped_at_cash() {
        let (mut team, config) = setup();
        team.cash = 1_000_000.0;
        let decisions = TeamDecisions {
            marketing: vec![MarketingDecision::BrandInvestment { amount: 5_000_000.0 }],
            ..TeamDecisions::default()
        };
        let validated = validate_decisions(&team, &decisions, &config);
        assert_eq!(validated.corrected.marketing.len(), 1);
        match &validated.corrected.marketing[0] {
            MarketingDecision::BrandInvestment { amount } => assert_eq!(*amount, 1_000_000.0),
            other => panic!("unexpected decision {:?}", other),
        }
        assert_eq!(validated.warnings.len(), 1);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let (mut team, config) = setup();
        team.cash = 3_000_000.0;
        let factory_id = team.factories[0].id.clone();
        let decisions = TeamDecisions {
            factory: vec![
                FactoryDecision::EfficiencyInvestment {
                    factory_id: factory_id.clone(),
                    workers: 2_000_000.0,
                    supervisors: 2_000_000.0,
                    engineers: 0.0,
                    machinery: 0.0,
                    general: 0.0,
                },
                FactoryDecision::PurchaseMachine {
                    factory_id,
                    machine_type: "nonexistent".to_string(),
                },
            ],
            marketing: vec![MarketingDecision::Promotion {
                segment: Segment::General,
                kind: PromotionKind::Discount,
                intensity: 0.8,
            }],
            ..TeamDecisions::default()
        };
        let once = validate_decisions(&team, &decisions, &config);
        assert!(!once.warnings.is_empty());
        let twice = validate_decisions(&team, &once.corrected, &config);
        assert_eq!(once.corrected, twice.corrected);
        assert!(twice.warnings.is_empty(), "second pass warned: {:?}", twice.warnings);
    }

    #[test]
    fn test_promotion_intensity_capped() {
        let (team, config) = setup();
        let decisions = TeamDecisions {
            marketing: vec![MarketingDecision::Promotion {
                segment: Segment::Budget,
                kind: PromotionKind::Loyalty,
                intensity: 0.9,
            }],
            ..TeamDecisions::default()
        };
        let validated = validate_decisions(&team, &decisions, &config);
        match &validated.corrected.marketing[0] {
            MarketingDecision::Promotion { intensity, .. } => {
                assert_eq!(*intensity, config.marketing.promotion_max_intensity)
            },
            other => panic!("unexpected decision {:?}", other),
        }
    }

    #[test]
    fn test_wire_format_tagged_unions() {
        let decision = FactoryDecision::PurchaseMachine {
            factory_id: "f1".to_string(),
            machine_type: "cnc_cell".to_string(),
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["type"], "purchase_machine");
        let parsed: FactoryDecision = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, decision);
    }
}
