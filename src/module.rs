//! Shared contract between the round engine and the module processors.
//!
//! Every module processor is a pure function of `(team state, decisions,
//! market state, config, rng stream)` and returns a [`ModuleOutcome`]: the
//! patched state clone plus the costs, revenue contributions, messages,
//! warnings and change records the engine folds into the round report.

use crate::team::TeamState;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{EnumIter, EnumString};

/// The six decision modules, in fixed pipeline order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModuleKind {
    Factory,
    Hr,
    Research,
    Marketing,
    Finance,
    Materials,
}

impl ModuleKind {
    /// All modules in pipeline order.
    pub fn all() -> Vec<ModuleKind> {
        vec![
            ModuleKind::Factory,
            ModuleKind::Hr,
            ModuleKind::Research,
            ModuleKind::Marketing,
            ModuleKind::Finance,
            ModuleKind::Materials,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            ModuleKind::Factory => "factory",
            ModuleKind::Hr => "hr",
            ModuleKind::Research => "research",
            ModuleKind::Marketing => "marketing",
            ModuleKind::Finance => "finance",
            ModuleKind::Materials => "materials",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A human-readable warning attached to a module outcome.
///
/// The engine prefixes the team id when folding warnings into the round
/// report, so processors only name the module and the reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warning {
    pub module: ModuleKind,
    pub message: String,
}

impl Warning {
    pub fn new(module: ModuleKind, message: impl Into<String>) -> Self {
        Warning { module, message: message.into() }
    }
}

/// One recorded state change, for audit trails and the UI timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChange {
    /// Dotted path of the changed field, e.g. `"factories[f1].efficiency"`
    pub field: String,
    pub from: String,
    pub to: String,
}

impl StateChange {
    pub fn new(field: impl Into<String>, from: impl fmt::Display, to: impl fmt::Display) -> Self {
        StateChange { field: field.into(), from: from.to_string(), to: to.to_string() }
    }
}

/// Cash-flow categories a module contributes to during one round.
///
/// The statements engine consumes the summed deltas, so every dollar a
/// processor moves must land in exactly one of these buckets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerDelta {
    /// Operating expenses paid in cash (salaries, marketing, maintenance, ...)
    pub opex: f64,
    /// Research and development expense
    pub rd_expense: f64,
    /// Capital expenditure (machines, factories)
    pub capex: f64,
    /// Proceeds from selling fixed assets
    pub asset_sales: f64,
    /// Gross book value of fixed assets disposed
    pub asset_disposals_gross: f64,
    /// Interest paid this round
    pub interest_expense: f64,
    /// New debt raised (bills, bonds, loans)
    pub debt_issued: f64,
    /// Of the debt issued, the short-term portion
    pub debt_issued_short_term: f64,
    /// Debt principal repaid
    pub debt_repaid: f64,
    /// Of the debt repaid, the short-term portion
    pub debt_repaid_short_term: f64,
    /// Proceeds from issuing stock
    pub equity_issued: f64,
    /// Cash spent buying back shares
    pub buyback: f64,
    /// Dividends declared this round (paid at round close)
    pub dividends_declared: f64,
    /// Licensing and other non-market revenue received in cash
    pub other_income: f64,
}

impl LedgerDelta {
    /// Total cash leaving the team this round, before market revenue.
    pub fn total_cash_out(&self) -> f64 {
        self.opex + self.rd_expense + self.capex + self.interest_expense + self.debt_repaid
            + self.buyback
            + self.dividends_declared
    }

    /// Total cash entering the team this round, before market revenue.
    pub fn total_cash_in(&self) -> f64 {
        self.asset_sales + self.debt_issued + self.equity_issued + self.other_income
    }

    /// Folds another delta into this one.
    pub fn absorb(&mut self, other: &LedgerDelta) {
        self.opex += other.opex;
        self.rd_expense += other.rd_expense;
        self.capex += other.capex;
        self.asset_sales += other.asset_sales;
        self.asset_disposals_gross += other.asset_disposals_gross;
        self.interest_expense += other.interest_expense;
        self.debt_issued += other.debt_issued;
        self.debt_issued_short_term += other.debt_issued_short_term;
        self.debt_repaid += other.debt_repaid;
        self.debt_repaid_short_term += other.debt_repaid_short_term;
        self.equity_issued += other.equity_issued;
        self.buyback += other.buyback;
        self.dividends_declared += other.dividends_declared;
        self.other_income += other.other_income;
    }
}

/// What one module processor hands back to the engine.
#[derive(Debug, Clone)]
pub struct ModuleOutcome {
    /// The patched state clone
    pub state: TeamState,
    /// Total cash cost incurred (for display; the ledger is authoritative)
    pub costs: f64,
    /// Non-market revenue contributed by this module
    pub revenue: f64,
    /// Cash-flow categorisation of everything this module did
    pub ledger: LedgerDelta,
    /// Informational messages
    pub messages: Vec<String>,
    /// Warnings (dropped decisions, affordability corrections, ...)
    pub warnings: Vec<Warning>,
    /// Recorded state changes
    pub changes: Vec<StateChange>,
}

impl ModuleOutcome {
    /// An outcome that leaves the state untouched.
    pub fn unchanged(state: TeamState) -> Self {
        ModuleOutcome {
            state,
            costs: 0.0,
            revenue: 0.0,
            ledger: LedgerDelta::default(),
            messages: Vec::new(),
            warnings: Vec::new(),
            changes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_order_is_pipeline_order() {
        let all = ModuleKind::all();
        assert_eq!(all.first(), Some(&ModuleKind::Factory));
        assert_eq!(all.last(), Some(&ModuleKind::Materials));
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn test_ledger_absorb_and_totals() {
        let mut a = LedgerDelta { opex: 100.0, debt_issued: 50.0, ..LedgerDelta::default() };
        let b = LedgerDelta { opex: 25.0, buyback: 10.0, ..LedgerDelta::default() };
        a.absorb(&b);
        assert_eq!(a.opex, 125.0);
        assert_eq!(a.total_cash_out(), 135.0);
        assert_eq!(a.total_cash_in(), 50.0);
    }

    #[test]
    fn test_warning_display_fields() {
        let w = Warning::new(ModuleKind::Factory, "insufficient cash for cnc_cell");
        assert_eq!(w.module.as_str(), "factory");
        assert!(w.message.contains("cnc_cell"));
    }
}
