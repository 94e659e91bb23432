//! Invariant checking for round outputs.
//!
//! A trait-based system for conditions that must hold after every processed
//! round. Violations indicate engine bugs, never player mistakes; the game
//! runner logs them, and the test suite asserts their absence.

use crate::product::Segment;
use crate::result::RoundReport;
use std::fmt;

/// Represents a violation of an invariant.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Name of the violated invariant
    pub invariant_name: String,
    /// Description of what went wrong
    pub description: String,
    /// Round in which the violation occurred
    pub round: u32,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invariant violation '{}' at round {}: {}",
            self.invariant_name, self.round, self.description
        )
    }
}

impl std::error::Error for InvariantViolation {}

/// A condition that must hold for every valid round report.
pub trait Invariant: Send + Sync {
    /// Returns the name of this invariant for reporting purposes.
    fn name(&self) -> &str;

    /// Checks the invariant against one round report.
    fn check(&self, report: &RoundReport) -> Result<(), InvariantViolation>;
}

/// Per open segment, market shares must sum to 1 within 1e-6.
pub struct ShareConservationInvariant;

impl Invariant for ShareConservationInvariant {
    fn name(&self) -> &str {
        "ShareConservation"
    }

    fn check(&self, report: &RoundReport) -> Result<(), InvariantViolation> {
        for segment in Segment::all() {
            let contested = report
                .results
                .iter()
                .any(|r| r.market_share_by_segment.contains_key(&segment));
            if !contested {
                continue;
            }
            let total: f64 = report
                .results
                .iter()
                .map(|r| r.market_share_by_segment.get(&segment).copied().unwrap_or(0.0))
                .sum();
            if (total - 1.0).abs() > 1e-6 {
                return Err(InvariantViolation {
                    invariant_name: self.name().to_string(),
                    description: format!("segment {} shares sum to {}", segment, total),
                    round: report.round_number,
                });
            }
        }
        Ok(())
    }
}

/// Every team's balance sheet must balance within one cent.
pub struct BalanceSheetInvariant;

impl Invariant for BalanceSheetInvariant {
    fn name(&self) -> &str {
        "BalanceSheet"
    }

    fn check(&self, report: &RoundReport) -> Result<(), InvariantViolation> {
        for result in &report.results {
            let gap = result.statements.balance.gap();
            if gap.abs() > 0.01 {
                return Err(InvariantViolation {
                    invariant_name: self.name().to_string(),
                    description: format!("team {} balance sheet off by {}", result.team_id, gap),
                    round: report.round_number,
                });
            }
        }
        Ok(())
    }
}

/// Ending cash must reconcile with the cash flow statement.
pub struct CashReconciliationInvariant;

impl Invariant for CashReconciliationInvariant {
    fn name(&self) -> &str {
        "CashReconciliation"
    }

    fn check(&self, report: &RoundReport) -> Result<(), InvariantViolation> {
        for result in &report.results {
            let cf = &result.statements.cash_flow;
            let computed = cf.beginning_cash + cf.net_cash_change;
            if (computed - cf.ending_cash).abs() > 0.01 {
                return Err(InvariantViolation {
                    invariant_name: self.name().to_string(),
                    description: format!(
                        "team {}: beginning {} + change {} != ending {}",
                        result.team_id, cf.beginning_cash, cf.net_cash_change, cf.ending_cash
                    ),
                    round: report.round_number,
                });
            }
            if (cf.ending_cash - result.new_state.cash).abs() > 0.01 {
                return Err(InvariantViolation {
                    invariant_name: self.name().to_string(),
                    description: format!(
                        "team {}: statement ending cash {} != book cash {}",
                        result.team_id, cf.ending_cash, result.new_state.cash
                    ),
                    round: report.round_number,
                });
            }
        }
        Ok(())
    }
}

/// Bounded fields must sit inside their documented ranges.
pub struct ClampInvariant;

impl Invariant for ClampInvariant {
    fn name(&self) -> &str {
        "Clamp"
    }

    fn check(&self, report: &RoundReport) -> Result<(), InvariantViolation> {
        for result in &report.results {
            let violations = result.new_state.invariant_violations();
            if let Some(first) = violations.first() {
                return Err(InvariantViolation {
                    invariant_name: self.name().to_string(),
                    description: format!("team {}: {}", result.team_id, first),
                    round: report.round_number,
                });
            }
        }
        Ok(())
    }
}

/// The standard suite run after every round.
pub fn standard_suite() -> Vec<Box<dyn Invariant>> {
    vec![
        Box::new(ShareConservationInvariant),
        Box::new(BalanceSheetInvariant),
        Box::new(CashReconciliationInvariant),
        Box::new(ClampInvariant),
    ]
}

/// Runs the standard suite against a report and collects every violation.
pub fn check_report(report: &RoundReport) -> Vec<InvariantViolation> {
    standard_suite().iter().filter_map(|inv| inv.check(report).err()).collect()
}
