//! # Corporate Credit Rating Module
//!
//! Rates each team's creditworthiness on the familiar agency scale
//! (`AAA` … `D`) from a weighted multi-factor score:
//!
//! - **Leverage (30%)**: debt-to-equity position
//! - **Liquidity (25%)**: current-ratio coverage of short-term obligations
//! - **Profitability (20%)**: net margin on revenue
//! - **Interest Coverage (15%)**: operating income vs. interest burden
//! - **Payment Capacity (10%)**: cash relative to total debt service
//!
//! The rating feeds the bank-loan interest premium in the finance module and
//! is reported per team per round.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::EnumString;

/// Agency-style rating tiers, wire-exact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumString,
)]
pub enum CreditRating {
    AAA,
    AA,
    A,
    BBB,
    BB,
    B,
    CCC,
    D,
}

impl CreditRating {
    /// All tiers from best to worst.
    pub fn all() -> Vec<CreditRating> {
        vec![
            CreditRating::AAA,
            CreditRating::AA,
            CreditRating::A,
            CreditRating::BBB,
            CreditRating::BB,
            CreditRating::B,
            CreditRating::CCC,
            CreditRating::D,
        ]
    }

    /// Interest premium (added to the market base rate) for bank loans.
    pub fn loan_premium(&self) -> f64 {
        match self {
            CreditRating::AAA => 0.000,
            CreditRating::AA => 0.002,
            CreditRating::A => 0.004,
            CreditRating::BBB => 0.008,
            CreditRating::BB => 0.015,
            CreditRating::B => 0.025,
            CreditRating::CCC => 0.040,
            CreditRating::D => 0.080,
        }
    }

    /// Whether this tier is considered investment grade.
    pub fn is_investment_grade(&self) -> bool {
        matches!(self, CreditRating::AAA | CreditRating::AA | CreditRating::A | CreditRating::BBB)
    }
}

impl fmt::Display for CreditRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CreditRating::AAA => "AAA",
            CreditRating::AA => "AA",
            CreditRating::A => "A",
            CreditRating::BBB => "BBB",
            CreditRating::BB => "BB",
            CreditRating::B => "B",
            CreditRating::CCC => "CCC",
            CreditRating::D => "D",
        };
        write!(f, "{}", name)
    }
}

/// Inputs to the rating calculation, taken from a closed round.
#[derive(Debug, Clone, Copy)]
pub struct RatingInputs {
    pub cash: f64,
    pub total_debt: f64,
    pub shareholders_equity: f64,
    pub current_assets: f64,
    pub current_liabilities: f64,
    pub revenue: f64,
    pub net_income: f64,
    pub operating_income: f64,
    pub interest_expense: f64,
}

/// Computes the weighted credit score in `[0, 1]` and maps it to a tier.
///
/// A team with negative equity and negative cash is rated `D` outright.
pub fn rate(inputs: &RatingInputs) -> CreditRating {
    if inputs.shareholders_equity <= 0.0 && inputs.cash < 0.0 {
        return CreditRating::D;
    }

    let raw = leverage_factor(inputs) * 0.30
        + liquidity_factor(inputs) * 0.25
        + profitability_factor(inputs) * 0.20
        + coverage_factor(inputs) * 0.15
        + payment_capacity_factor(inputs) * 0.10;

    score_to_tier(raw.clamp(0.0, 1.0))
}

/// Leverage factor (0.0 to 1.0). Low debt-to-equity = 1.0.
fn leverage_factor(inputs: &RatingInputs) -> f64 {
    if inputs.total_debt <= 0.0 {
        return 1.0;
    }
    if inputs.shareholders_equity <= 0.0 {
        return 0.0;
    }
    let ratio = inputs.total_debt / inputs.shareholders_equity;
    // 0.0 D/E = 1.0, 1.0 D/E = 0.6, 2.0 D/E = 0.2, 2.5+ D/E = 0.0
    (1.0 - ratio * 0.4).clamp(0.0, 1.0)
}

/// Liquidity factor (0.0 to 1.0) from the current ratio.
fn liquidity_factor(inputs: &RatingInputs) -> f64 {
    if inputs.current_liabilities <= 0.0 {
        return 1.0;
    }
    let current_ratio = inputs.current_assets / inputs.current_liabilities;
    // 2.0+ = 1.0, 1.0 = 0.5, 0.0 = 0.0
    (current_ratio / 2.0).clamp(0.0, 1.0)
}

/// Profitability factor (0.0 to 1.0) from the net margin.
fn profitability_factor(inputs: &RatingInputs) -> f64 {
    if inputs.revenue <= 0.0 {
        return if inputs.net_income >= 0.0 { 0.5 } else { 0.2 };
    }
    let margin = inputs.net_income / inputs.revenue;
    // -10% margin = 0.0, 0% = 0.33, +20% margin = 1.0
    ((margin + 0.10) / 0.30).clamp(0.0, 1.0)
}

/// Interest coverage factor (0.0 to 1.0).
fn coverage_factor(inputs: &RatingInputs) -> f64 {
    if inputs.interest_expense <= 0.0 {
        return 1.0;
    }
    let coverage = inputs.operating_income / inputs.interest_expense;
    // 8x+ coverage = 1.0, 1x = 0.125, negative = 0.0
    (coverage / 8.0).clamp(0.0, 1.0)
}

/// Payment capacity factor (0.0 to 1.0): cash against total debt.
fn payment_capacity_factor(inputs: &RatingInputs) -> f64 {
    if inputs.total_debt <= 0.0 {
        return 1.0;
    }
    if inputs.cash <= 0.0 {
        return 0.0;
    }
    (inputs.cash / inputs.total_debt).clamp(0.0, 1.0)
}

fn score_to_tier(score: f64) -> CreditRating {
    if score >= 0.90 {
        CreditRating::AAA
    } else if score >= 0.80 {
        CreditRating::AA
    } else if score >= 0.70 {
        CreditRating::A
    } else if score >= 0.55 {
        CreditRating::BBB
    } else if score >= 0.40 {
        CreditRating::BB
    } else if score >= 0.25 {
        CreditRating::B
    } else if score >= 0.10 {
        CreditRating::CCC
    } else {
        CreditRating::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_inputs() -> RatingInputs {
        RatingInputs {
            cash: 80_000_000.0,
            total_debt: 20_000_000.0,
            shareholders_equity: 150_000_000.0,
            current_assets: 100_000_000.0,
            current_liabilities: 30_000_000.0,
            revenue: 120_000_000.0,
            net_income: 18_000_000.0,
            operating_income: 25_000_000.0,
            interest_expense: 1_000_000.0,
        }
    }

    #[test]
    fn test_healthy_team_is_investment_grade() {
        let rating = rate(&healthy_inputs());
        assert!(rating.is_investment_grade(), "expected investment grade, got {}", rating);
    }

    #[test]
    fn test_debt_free_profitable_team_rates_aaa() {
        let mut inputs = healthy_inputs();
        inputs.total_debt = 0.0;
        inputs.interest_expense = 0.0;
        inputs.net_income = 30_000_000.0;
        assert_eq!(rate(&inputs), CreditRating::AAA);
    }

    #[test]
    fn test_insolvent_team_rates_d() {
        let mut inputs = healthy_inputs();
        inputs.shareholders_equity = -5_000_000.0;
        inputs.cash = -1_000_000.0;
        assert_eq!(rate(&inputs), CreditRating::D);
    }

    #[test]
    fn test_heavy_leverage_degrades_rating() {
        let healthy = rate(&healthy_inputs());

        let mut leveraged = healthy_inputs();
        leveraged.total_debt = 300_000_000.0;
        leveraged.interest_expense = 12_000_000.0;
        leveraged.net_income = -5_000_000.0;
        let stressed = rate(&leveraged);

        assert!(stressed > healthy, "rating should worsen: {} vs {}", stressed, healthy);
        assert!(!stressed.is_investment_grade());
    }

    #[test]
    fn test_premium_is_monotone_in_rating() {
        let tiers = CreditRating::all();
        for pair in tiers.windows(2) {
            assert!(pair[0].loan_premium() <= pair[1].loan_premium());
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&CreditRating::CCC).unwrap(), "\"CCC\"");
        let parsed: CreditRating = serde_json::from_str("\"AA\"").unwrap();
        assert_eq!(parsed, CreditRating::AA);
    }
}
