//! Scripted baseline decisions for demo games, sweeps and Monte Carlo runs.
//!
//! Decisions enter the engine pre-formed; this module is one such source — a
//! deterministic script that gives every team a coherent persona (cost
//! leader, premium, balanced, brand-led) derived from its id. No RNG: the
//! same `(team, round, state)` always yields the same bundle, which keeps
//! scripted games replayable.

use crate::decisions::{
    FinanceDecision, HrDecision, MarketingDecision, MaterialsDecision, ResearchDecision,
    TeamDecisions,
};
use crate::hr::Role;
use crate::market::MarketState;
use crate::marketing::{Channel, PromotionKind};
use crate::materials::ShippingMethod;
use crate::product::{DevelopmentStatus, Segment};
use crate::research::RiskLevel;
use crate::team::TeamState;

/// Strategy personas for scripted teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    CostLeader,
    Premium,
    Balanced,
    BrandLed,
}

impl Persona {
    /// Stable persona for a team id.
    pub fn for_team(team_id: &str) -> Persona {
        let sum: u32 = team_id.bytes().map(u32::from).sum();
        match sum % 4 {
            0 => Persona::CostLeader,
            1 => Persona::Premium,
            2 => Persona::Balanced,
            _ => Persona::BrandLed,
        }
    }

    fn segment(&self) -> Segment {
        match self {
            Persona::CostLeader => Segment::Budget,
            Persona::Premium => Segment::Professional,
            Persona::Balanced => Segment::General,
            Persona::BrandLed => Segment::ActiveLifestyle,
        }
    }

    fn price(&self, market: &MarketState) -> f64 {
        let demand = match market.segment(self.segment()) {
            Some(demand) => demand,
            None => return 100.0,
        };
        match self {
            Persona::CostLeader => demand.price_min * 1.15,
            Persona::Premium => demand.price_max * 0.85,
            Persona::Balanced => (demand.price_min + demand.price_max) / 2.0,
            Persona::BrandLed => demand.price_min * 1.5,
        }
    }

    fn target_quality(&self) -> f64 {
        match self {
            Persona::CostLeader => 45.0,
            Persona::Premium => 90.0,
            Persona::Balanced => 62.0,
            Persona::BrandLed => 58.0,
        }
    }
}

/// Produces the baseline bundle for one team and round.
pub fn baseline_decisions(state: &TeamState, market: &MarketState) -> TeamDecisions {
    let persona = Persona::for_team(&state.id);
    let round = market.round;
    let mut decisions = TeamDecisions::default();

    // Round 1: lay the groundwork.
    if round == 1 {
        decisions.research.push(ResearchDecision::StartProduct {
            product_id: format!("{}-flagship", state.id),
            name: format!("{} Flagship", state.name),
            segment: persona.segment(),
            target_quality: persona.target_quality(),
            price: persona.price(market),
        });
        decisions.research.push(ResearchDecision::StartResearch {
            tech_id: match persona {
                Persona::CostLeader => "lean_production".to_string(),
                Persona::Premium => "materials_science".to_string(),
                Persona::Balanced => "rapid_prototyping".to_string(),
                Persona::BrandLed => "materials_science".to_string(),
            },
            risk: RiskLevel::Moderate,
        });
        if let Some(factory) = state.factories.first() {
            decisions.factory.push(crate::decisions::FactoryDecision::PurchaseMachine {
                factory_id: factory.id.clone(),
                machine_type: "assembly_line".to_string(),
            });
            decisions.factory.push(crate::decisions::FactoryDecision::PurchaseMachine {
                factory_id: factory.id.clone(),
                machine_type: "packaging_unit".to_string(),
            });
        }
    }

    // Keep materials stocked: a standing order sized to last demand.
    let stock = state.inventory.total_quantity();
    let target_stock = 30_000.0;
    if stock < target_stock && round % 2 == 1 {
        decisions.materials.push(MaterialsDecision::PlaceOrder {
            material: "aluminium".to_string(),
            supplier: match persona {
                Persona::Premium => "rheinwerk".to_string(),
                Persona::CostLeader => "pacific_source".to_string(),
                _ => "northstar_metals".to_string(),
            },
            quantity: target_stock - stock,
            route: Some("overland".to_string()),
            method: ShippingMethod::Rail,
        });
    }

    // Marketing cadence once the flagship is on the market.
    let has_launched =
        state.products.values().any(|p| p.status == DevelopmentStatus::Launched);
    if has_launched {
        let ad_budget = match persona {
            Persona::BrandLed => 3_000_000.0,
            Persona::Premium => 1_500_000.0,
            _ => 1_000_000.0,
        };
        decisions.marketing.push(MarketingDecision::Advertising {
            segment: persona.segment(),
            channel: match persona {
                Persona::CostLeader => Channel::Online,
                Persona::Premium => Channel::Print,
                Persona::Balanced => Channel::Tv,
                Persona::BrandLed => Channel::SocialMedia,
            },
            budget: ad_budget,
        });
        if persona == Persona::BrandLed {
            decisions.marketing.push(MarketingDecision::BrandInvestment { amount: 2_000_000.0 });
        }
        if persona == Persona::CostLeader && round % 3 == 0 {
            decisions.marketing.push(MarketingDecision::Promotion {
                segment: persona.segment(),
                kind: PromotionKind::Discount,
                intensity: 0.15,
            });
        }
    }

    // Hiring follows growth; training keeps morale up.
    if round % 4 == 2 {
        decisions.hr.push(HrDecision::AdjustHeadcount {
            factory_id: None,
            role: Role::Worker,
            delta: 15,
        });
        decisions.hr.push(HrDecision::ScheduleTraining { focus: Role::Worker });
    }
    if round == 2 {
        decisions.hr.push(HrDecision::SetBenefit {
            benefit: "health_insurance".to_string(),
            enabled: true,
        });
    }

    // Finance: fund early build-out with bonds, return cash later.
    if round == 2 && persona != Persona::CostLeader {
        decisions.finance.push(FinanceDecision::IssueBonds { amount: 30_000_000.0 });
    }
    if state.net_income > 5_000_000.0 && round % 4 == 0 {
        decisions.finance.push(FinanceDecision::DeclareDividend { per_share: 0.25 });
    }
    if round % 3 == 1 {
        let avg_growth = if market.segments.is_empty() {
            0.0
        } else {
            market.segments.values().map(|d| d.growth_rate).sum::<f64>()
                / market.segments.len() as f64
        };
        decisions.finance.push(FinanceDecision::SubmitForecast {
            gdp_growth: market.macros.gdp_growth,
            inflation: market.macros.inflation,
            demand_growth: avg_growth,
        });
    }

    // Efficiency investment when cash allows.
    if state.cash > 60_000_000.0 && round % 2 == 0 {
        if let Some(factory) = state.factories.first() {
            decisions.factory.push(crate::decisions::FactoryDecision::EfficiencyInvestment {
                factory_id: factory.id.clone(),
                workers: 1_000_000.0,
                supervisors: 500_000.0,
                engineers: 1_000_000.0,
                machinery: 1_500_000.0,
                general: 0.0,
            });
        }
    }
    decisions
}
