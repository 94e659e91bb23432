//! Materials and logistics: orders, inventory, holding costs.
//!
//! Orders move through a fixed stage pipeline (`pending → production →
//! shipping → customs → delivered`) at configured per-stage round counts.
//! Arrivals fold into inventory at a weighted-average unit cost; production
//! consumes inventory at that average cost; holding inventory costs a
//! fraction of its market value every round.

use crate::config::GameConfig;
use crate::decisions::MaterialsDecision;
use crate::module::{LedgerDelta, ModuleKind, ModuleOutcome, StateChange, Warning};
use crate::product::Segment;
use crate::team::TeamState;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum_macros::{EnumIter, EnumString};

/// How an order ships.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ShippingMethod {
    Sea,
    Rail,
    Air,
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShippingMethod::Sea => "sea",
            ShippingMethod::Rail => "rail",
            ShippingMethod::Air => "air",
        };
        write!(f, "{}", name)
    }
}

/// Pipeline stage of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStage {
    Pending,
    Production,
    Shipping,
    Customs,
    Delivered,
}

impl fmt::Display for OrderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStage::Pending => "pending",
            OrderStage::Production => "production",
            OrderStage::Shipping => "shipping",
            OrderStage::Customs => "customs",
            OrderStage::Delivered => "delivered",
        };
        write!(f, "{}", name)
    }
}

/// A material order in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialOrder {
    pub id: String,
    pub material: String,
    pub supplier: String,
    pub quantity: f64,
    /// Named route the order ships over, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    pub method: ShippingMethod,
    /// Cost per unit locked at order time
    pub unit_cost: f64,
    /// Quality of the supplied material, 0-100
    pub quality: f64,
    /// Defect rate of the supplied material, 0-1
    pub defect_rate: f64,
    pub stage: OrderStage,
    /// Rounds remaining in the current stage
    pub rounds_in_stage: u32,
}

/// One material position in stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialLot {
    pub quantity: f64,
    /// Weighted-average unit cost of the position
    pub avg_unit_cost: f64,
    /// Weighted-average quality of the position, 0-100
    pub avg_quality: f64,
    /// Weighted-average defect rate of the position, 0-1
    pub avg_defect_rate: f64,
}

/// Raw-material inventory, keyed by material name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub lots: BTreeMap<String, MaterialLot>,
}

impl Inventory {
    pub fn is_empty(&self) -> bool {
        self.lots.values().all(|l| l.quantity <= 0.0)
    }

    /// Total units across all materials.
    pub fn total_quantity(&self) -> f64 {
        self.lots.values().map(|l| l.quantity).sum()
    }

    /// Book value of the whole inventory.
    pub fn total_value(&self) -> f64 {
        self.lots.values().map(|l| l.quantity * l.avg_unit_cost).sum()
    }

    /// Quantity-weighted average unit cost across materials.
    pub fn average_unit_cost(&self) -> f64 {
        let qty = self.total_quantity();
        if qty <= 0.0 {
            return 0.0;
        }
        self.total_value() / qty
    }

    /// Quantity-weighted average quality across materials.
    pub fn average_quality(&self) -> f64 {
        let qty = self.total_quantity();
        if qty <= 0.0 {
            return 0.0;
        }
        self.lots.values().map(|l| l.quantity * l.avg_quality).sum::<f64>() / qty
    }

    /// Quantity-weighted average defect rate across materials.
    pub fn average_defect_rate(&self) -> f64 {
        let qty = self.total_quantity();
        if qty <= 0.0 {
            return 0.0;
        }
        self.lots.values().map(|l| l.quantity * l.avg_defect_rate).sum::<f64>() / qty
    }

    /// Folds a delivery into stock with a weighted-average cost update:
    /// `new_avg = (old_qty * old_avg + new_qty * new_cost) / (old_qty + new_qty)`.
    pub fn receive(&mut self, material: &str, quantity: f64, unit_cost: f64, quality: f64, defect_rate: f64) {
        if quantity <= 0.0 {
            return;
        }
        let lot = self.lots.entry(material.to_string()).or_insert(MaterialLot {
            quantity: 0.0,
            avg_unit_cost: 0.0,
            avg_quality: 0.0,
            avg_defect_rate: 0.0,
        });
        let total = lot.quantity + quantity;
        lot.avg_unit_cost = (lot.quantity * lot.avg_unit_cost + quantity * unit_cost) / total;
        lot.avg_quality = (lot.quantity * lot.avg_quality + quantity * quality) / total;
        lot.avg_defect_rate = (lot.quantity * lot.avg_defect_rate + quantity * defect_rate) / total;
        lot.quantity = total;
    }

    /// Consumes units at weighted-average cost, spread proportionally across
    /// materials. Returns the cost of goods consumed; shortfalls clamp the
    /// draw to what is in stock.
    pub fn consume(&mut self, quantity: f64) -> f64 {
        if quantity <= 0.0 {
            return 0.0;
        }
        let available = self.total_quantity();
        if available <= 0.0 {
            return 0.0;
        }
        let draw = quantity.min(available);
        let fraction = draw / available;
        let mut cost = 0.0;
        for lot in self.lots.values_mut() {
            let take = lot.quantity * fraction;
            cost += take * lot.avg_unit_cost;
            lot.quantity -= take;
        }
        self.clamp_negative_lots();
        cost
    }

    /// Clamps numerically-negative positions to zero.
    pub fn clamp_negative_lots(&mut self) {
        for lot in self.lots.values_mut() {
            if lot.quantity < 0.0 {
                lot.quantity = 0.0;
            }
        }
    }
}

/// Rounds an order spends in a given stage; the route can lengthen customs.
fn stage_rounds(stage: OrderStage, method: ShippingMethod, route: Option<&str>, config: &GameConfig) -> u32 {
    let params = &config.materials;
    match stage {
        OrderStage::Pending => params.stage_pending_rounds,
        OrderStage::Production => params.stage_production_rounds,
        OrderStage::Shipping => {
            params.stage_shipping_rounds.get(&method).copied().unwrap_or(2)
        },
        OrderStage::Customs => {
            let extra = route
                .and_then(|name| params.route_catalog.get(name))
                .map(|spec| spec.customs_rounds_extra)
                .unwrap_or(0);
            params.stage_customs_rounds + extra
        },
        OrderStage::Delivered => 0,
    }
}

fn next_stage(stage: OrderStage) -> OrderStage {
    match stage {
        OrderStage::Pending => OrderStage::Production,
        OrderStage::Production => OrderStage::Shipping,
        OrderStage::Shipping => OrderStage::Customs,
        OrderStage::Customs => OrderStage::Delivered,
        OrderStage::Delivered => OrderStage::Delivered,
    }
}

/// Runs the materials pass for one team.
pub fn process(
    state: &TeamState,
    decisions: &[MaterialsDecision],
    config: &GameConfig,
) -> ModuleOutcome {
    let mut state = state.clone();
    let mut ledger = LedgerDelta::default();
    let mut messages = Vec::new();
    let mut warnings = Vec::new();
    let mut changes = Vec::new();

    // Advance the order pipeline before taking new orders, so a fresh
    // order spends its full configured time in each stage.
    let mut delivered = Vec::new();
    for order in &mut state.material_orders {
        if order.stage == OrderStage::Delivered {
            continue;
        }
        order.rounds_in_stage = order.rounds_in_stage.saturating_sub(1);
        while order.rounds_in_stage == 0 && order.stage != OrderStage::Delivered {
            let from = order.stage;
            order.stage = next_stage(order.stage);
            order.rounds_in_stage = stage_rounds(order.stage, order.method, order.route.as_deref(), config);
            debug!("order {} advanced {} -> {}", order.id, from, order.stage);
            if order.stage == OrderStage::Delivered {
                delivered.push(order.id.clone());
            }
        }
    }
    for id in &delivered {
        let order = state
            .material_orders
            .iter()
            .find(|o| &o.id == id)
            .expect("delivered order exists")
            .clone();
        state.inventory.receive(
            &order.material,
            order.quantity,
            order.unit_cost,
            order.quality,
            order.defect_rate,
        );
        messages.push(format!("order {} delivered: {:.0} {}", order.id, order.quantity, order.material));
    }
    state.material_orders.retain(|o| o.stage != OrderStage::Delivered);

    for decision in decisions {
        match decision {
            MaterialsDecision::PlaceOrder { material, supplier, quantity, route, method } => {
                let Some(mat) = config.materials.material_catalog.get(material) else {
                    warnings.push(Warning::new(
                        ModuleKind::Materials,
                        format!("unknown material '{}'", material),
                    ));
                    continue;
                };
                let Some(sup) = config.materials.supplier_catalog.get(supplier) else {
                    warnings.push(Warning::new(
                        ModuleKind::Materials,
                        format!("unknown supplier '{}'", supplier),
                    ));
                    continue;
                };
                let route_spec = route.as_deref().and_then(|r| config.materials.route_catalog.get(r));
                if route.is_some() && route_spec.is_none() {
                    warnings.push(Warning::new(
                        ModuleKind::Materials,
                        format!("unknown route '{}'", route.as_deref().unwrap_or("")),
                    ));
                    continue;
                }
                let route_mult = route_spec.map(|r| r.cost_multiplier).unwrap_or(1.0);
                let unit_cost = mat.base_cost * sup.cost_multiplier * route_mult;
                let total = unit_cost * quantity;
                if total > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Materials,
                        format!("insufficient cash for order of {:.0} {}", quantity, material),
                    ));
                    continue;
                }
                let id = format!("{}-o{}", state.id, state.material_orders.len() + 1);
                // Supplier quality blends with the material's own baseline.
                let quality = (mat.quality + sup.quality) / 2.0;
                state.material_orders.push(MaterialOrder {
                    id: id.clone(),
                    material: material.clone(),
                    supplier: supplier.clone(),
                    quantity: *quantity,
                    route: route.clone(),
                    method: *method,
                    unit_cost,
                    quality,
                    defect_rate: sup.defect_rate,
                    stage: OrderStage::Pending,
                    rounds_in_stage: stage_rounds(OrderStage::Pending, *method, route.as_deref(), config),
                });
                state.cash -= total;
                // Prepaid orders sit as inventory-in-transit on the books
                // until delivery; the cash out surfaces in the statements as
                // a working-capital (inventory) change, not as opex.
                messages.push(format!(
                    "ordered {:.0} {} from {} via {} ({:.0})",
                    quantity, material, supplier, method, total
                ));
                changes.push(StateChange::new(
                    format!("material_orders[{}].stage", id),
                    "-",
                    OrderStage::Pending,
                ));
            },
        }
    }

    // Holding cost on the inventory book value.
    let holding = state.inventory.total_value() * config.materials.holding_cost_rate;
    if holding > 0.0 {
        state.cash -= holding;
        ledger.opex += holding;
    }

    // Material quality feeds the products built from it.
    let avg_quality = state.inventory.average_quality();
    let avg_defect = state.inventory.average_defect_rate();
    if avg_quality > 0.0 {
        for product in state.products.values_mut() {
            if !product.is_contending() {
                continue;
            }
            // Reliability drifts toward the material quality floor, quality
            // takes a small dent from defective supply.
            let target = 40.0 + avg_quality * 0.6;
            product.reliability += (target - product.reliability) * 0.2;
            product.quality = (product.quality - avg_defect * 10.0).max(0.0);
        }
    }

    let costs = ledger.total_cash_out();
    ModuleOutcome { state, costs, revenue: 0.0, ledger, messages, warnings, changes }
}

/// Quality impact per segment from current material specs: the weighted
/// average material quality scaled into a small additive product bonus.
pub fn segment_quality_impact(state: &TeamState, segment: Segment) -> f64 {
    let avg = state.inventory.average_quality();
    if avg <= 0.0 {
        return 0.0;
    }
    // Premium segments feel material quality more.
    let sensitivity = match segment {
        Segment::Budget => 0.02,
        Segment::General => 0.04,
        Segment::ActiveLifestyle => 0.04,
        Segment::Enthusiast => 0.06,
        Segment::Professional => 0.08,
    };
    (avg - 50.0) * sensitivity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn setup() -> (TeamState, GameConfig) {
        let config = GameConfig::default();
        let team = TeamState::initial("team-a", "Aurora Devices", &config);
        (team, config)
    }

    #[test]
    fn test_weighted_average_cost_update() {
        let mut inv = Inventory::default();
        inv.receive("aluminium", 100.0, 10.0, 60.0, 0.01);
        inv.receive("aluminium", 100.0, 20.0, 80.0, 0.03);
        let lot = &inv.lots["aluminium"];
        assert!((lot.avg_unit_cost - 15.0).abs() < 1e-12);
        assert!((lot.avg_quality - 70.0).abs() < 1e-12);
        assert!((lot.avg_defect_rate - 0.02).abs() < 1e-12);
        assert_eq!(lot.quantity, 200.0);
    }

    #[test]
    fn test_consume_at_average_cost() {
        let mut inv = Inventory::default();
        inv.receive("polymer", 100.0, 5.0, 50.0, 0.0);
        let cogs = inv.consume(40.0);
        assert!((cogs - 200.0).abs() < 1e-12);
        assert!((inv.total_quantity() - 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_consume_clamps_to_stock() {
        let mut inv = Inventory::default();
        inv.receive("polymer", 10.0, 5.0, 50.0, 0.0);
        let cogs = inv.consume(100.0);
        assert!((cogs - 50.0).abs() < 1e-12);
        assert_eq!(inv.total_quantity(), 0.0);
    }

    #[test]
    fn test_order_pipeline_advances_to_delivery() {
        let (mut team, config) = setup();
        let decisions = vec![MaterialsDecision::PlaceOrder {
            material: "aluminium".to_string(),
            supplier: "pacific_source".to_string(),
            quantity: 1_000.0,
            route: None,
            method: ShippingMethod::Air,
        }];
        let mut outcome = process(&team, &decisions, &config);
        assert_eq!(outcome.state.material_orders.len(), 1);

        // pending(1) + production(2) + shipping air(1) + customs(1) = 5 rounds.
        for _ in 0..5 {
            team = outcome.state;
            outcome = process(&team, &[], &config);
        }
        assert!(outcome.state.material_orders.is_empty());
        assert!((outcome.state.inventory.total_quantity() - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_charged_upfront() {
        let (team, config) = setup();
        let decisions = vec![MaterialsDecision::PlaceOrder {
            material: "electronics".to_string(),
            supplier: "rheinwerk".to_string(),
            quantity: 500.0,
            route: None,
            method: ShippingMethod::Sea,
        }];
        let outcome = process(&team, &decisions, &config);
        let expected = 32.0 * 1.30 * 500.0;
        assert!((team.cash - outcome.state.cash - expected).abs() < 1e-6);
    }

    #[test]
    fn test_holding_cost_charged() {
        let (mut team, config) = setup();
        team.inventory.receive("aluminium", 10_000.0, 14.0, 60.0, 0.01);
        let cash_before = team.cash;
        let outcome = process(&team, &[], &config);
        let expected = 10_000.0 * 14.0 * config.materials.holding_cost_rate;
        assert!((cash_before - outcome.state.cash - expected).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_supplier_dropped() {
        let (team, config) = setup();
        let decisions = vec![MaterialsDecision::PlaceOrder {
            material: "aluminium".to_string(),
            supplier: "phantom_corp".to_string(),
            quantity: 100.0,
            route: None,
            method: ShippingMethod::Rail,
        }];
        let outcome = process(&team, &decisions, &config);
        assert!(outcome.state.material_orders.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_route_adds_customs_time_and_cost() {
        let (team, config) = setup();
        let order = |route: Option<&str>| MaterialsDecision::PlaceOrder {
            material: "aluminium".to_string(),
            supplier: "pacific_source".to_string(),
            quantity: 1_000.0,
            route: route.map(String::from),
            method: ShippingMethod::Air,
        };

        let direct = process(&team, &[order(None)], &config);
        let routed = process(&team, &[order(Some("transpacific"))], &config);
        // Transpacific carries a 5% toll.
        let direct_cost = team.cash - direct.state.cash;
        let routed_cost = team.cash - routed.state.cash;
        assert!((routed_cost - direct_cost * 1.05).abs() < 1e-6);

        // And one extra customs round: air delivery takes 6 passes, not 5.
        let mut state = routed.state;
        for _ in 0..5 {
            state = process(&state, &[], &config).state;
        }
        assert_eq!(state.material_orders.len(), 1, "routed order cleared customs early");
        state = process(&state, &[], &config).state;
        assert!(state.material_orders.is_empty());
    }

    #[test]
    fn test_unknown_route_dropped() {
        let (team, config) = setup();
        let decisions = vec![MaterialsDecision::PlaceOrder {
            material: "aluminium".to_string(),
            supplier: "pacific_source".to_string(),
            quantity: 100.0,
            route: Some("northwest_passage".to_string()),
            method: ShippingMethod::Sea,
        }];
        let outcome = process(&team, &decisions, &config);
        assert!(outcome.state.material_orders.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_segment_quality_impact_premium_sensitivity() {
        let (mut team, _) = setup();
        team.inventory.receive("aluminium", 100.0, 14.0, 90.0, 0.0);
        let budget = segment_quality_impact(&team, Segment::Budget);
        let professional = segment_quality_impact(&team, Segment::Professional);
        assert!(professional > budget);
    }
}
