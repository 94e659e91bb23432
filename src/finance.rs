//! Corporate finance: debt, equity, dividends, ratios, board meetings.
//!
//! The finance pass applies the round's capital-structure decisions and
//! services outstanding debt. Ratio computation and the FX / forecast
//! helpers used by the round close also live here.

use crate::config::{GameConfig, RatioBands};
use crate::credit_rating;
use crate::decisions::FinanceDecision;
use crate::market::{MarketState, Region};
use crate::module::{LedgerDelta, ModuleKind, ModuleOutcome, StateChange, Warning};
use crate::rng::StreamRng;
use crate::team::TeamState;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum_macros::{EnumIter, EnumString};

/// Kinds of debt instrument a team can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DebtKind {
    TreasuryBill,
    Bond,
    Loan,
}

/// One outstanding debt instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtInstrument {
    pub kind: DebtKind,
    pub principal: f64,
    /// Interest rate per round
    pub rate_per_round: f64,
    pub rounds_remaining: u32,
    /// Whether this instrument counts as short-term debt
    pub short_term: bool,
}

/// Proposals a board meeting can be called over.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProposalKind {
    Expansion,
    SpecialDividend,
    ExecutiveCompensation,
    SustainabilityProgram,
    Restructuring,
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalKind::Expansion => "expansion",
            ProposalKind::SpecialDividend => "special_dividend",
            ProposalKind::ExecutiveCompensation => "executive_compensation",
            ProposalKind::SustainabilityProgram => "sustainability_program",
            ProposalKind::Restructuring => "restructuring",
        };
        write!(f, "{}", name)
    }
}

/// An economic forecast submitted for scoring against the next round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicForecast {
    pub gdp_growth: f64,
    pub inflation: f64,
    pub demand_growth: f64,
}

/// Traffic-light health of one ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatioHealth {
    Green,
    Yellow,
    Red,
}

fn health_higher_better(value: f64, bands: &RatioBands) -> RatioHealth {
    if value >= bands.green {
        RatioHealth::Green
    } else if value >= bands.yellow {
        RatioHealth::Yellow
    } else {
        RatioHealth::Red
    }
}

fn health_lower_better(value: f64, bands: &RatioBands) -> RatioHealth {
    if value <= bands.green {
        RatioHealth::Green
    } else if value <= bands.yellow {
        RatioHealth::Yellow
    } else {
        RatioHealth::Red
    }
}

/// The standard ratio set with three-tier health labels.
///
/// Liquidity numerators use real short-term debt, not total liabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialRatios {
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub cash_ratio: f64,
    pub debt_to_equity: f64,
    pub return_on_equity: f64,
    pub return_on_assets: f64,
    pub net_margin: f64,
    pub health: BTreeMap<String, RatioHealth>,
}

/// Computes the ratio set for a team snapshot.
pub fn ratios(state: &TeamState, config: &GameConfig) -> FinancialRatios {
    let fin = &config.finance;
    let inventory_value = state.inventory.total_value() + state.inventory_in_transit_value();
    let current_assets = state.cash.max(0.0) + state.accounts_receivable + inventory_value;
    let current_liabilities = state.accounts_payable + state.short_term_debt;

    let safe_div = |a: f64, b: f64| if b.abs() < 1e-9 { 0.0 } else { a / b };

    let current_ratio = safe_div(current_assets, current_liabilities);
    let quick_ratio = safe_div(current_assets - inventory_value, current_liabilities);
    let cash_ratio = safe_div(state.cash.max(0.0), current_liabilities);
    let debt_to_equity = safe_div(state.total_debt(), state.shareholders_equity.max(1.0));
    let return_on_equity = safe_div(state.net_income, state.shareholders_equity.max(1.0));
    let return_on_assets = safe_div(state.net_income, state.total_assets.max(1.0));
    let net_margin = safe_div(state.net_income, state.revenue);

    let mut health = BTreeMap::new();
    health.insert(
        "current_ratio".to_string(),
        health_higher_better(current_ratio, &fin.current_ratio_bands),
    );
    health.insert(
        "quick_ratio".to_string(),
        health_higher_better(quick_ratio, &fin.quick_ratio_bands),
    );
    health
        .insert("cash_ratio".to_string(), health_higher_better(cash_ratio, &fin.cash_ratio_bands));
    health.insert(
        "debt_to_equity".to_string(),
        health_lower_better(debt_to_equity, &fin.debt_to_equity_bands),
    );
    health.insert(
        "return_on_equity".to_string(),
        health_higher_better(return_on_equity, &fin.roe_bands),
    );
    health.insert(
        "return_on_assets".to_string(),
        health_higher_better(return_on_assets, &fin.roa_bands),
    );
    health.insert("net_margin".to_string(), health_higher_better(net_margin, &fin.net_margin_bands));

    FinancialRatios {
        current_ratio,
        quick_ratio,
        cash_ratio,
        debt_to_equity,
        return_on_equity,
        return_on_assets,
        net_margin,
        health,
    }
}

/// FX impact on foreign revenue: for every non-home region with revenue,
/// `(rate - 1) * revenue_in_region`.
pub fn fx_impact(
    revenue_by_region: &BTreeMap<Region, f64>,
    market: &MarketState,
    home: Region,
) -> f64 {
    revenue_by_region
        .iter()
        .filter(|(region, revenue)| **region != home && **revenue != 0.0)
        .map(|(region, revenue)| {
            let rate = market.fx_rates.get(region).copied().unwrap_or(1.0);
            (rate - 1.0) * revenue
        })
        .sum()
}

/// Scores a submitted forecast against the realised market state.
///
/// Returns the accuracy band message only; no gameplay bonus is applied.
pub fn score_forecast(forecast: &EconomicForecast, realised: &MarketState) -> String {
    let avg_growth = if realised.segments.is_empty() {
        0.0
    } else {
        realised.segments.values().map(|d| d.growth_rate).sum::<f64>()
            / realised.segments.len() as f64
    };
    let error = (forecast.gdp_growth - realised.macros.gdp_growth).abs()
        + (forecast.inflation - realised.macros.inflation).abs()
        + (forecast.demand_growth - avg_growth).abs();
    let band = if error < 0.01 {
        "excellent"
    } else if error < 0.03 {
        "good"
    } else if error < 0.06 {
        "fair"
    } else {
        "poor"
    };
    format!("economic forecast scored {} (total error {:.3})", band, error)
}

/// Board approval probability, percent, clamped into the configured band.
pub fn board_probability(state: &TeamState, proposal: ProposalKind, config: &GameConfig) -> f64 {
    let fin = &config.finance;
    let r = ratios(state, config);
    let mut probability = fin.board_base_probability;
    if r.return_on_equity > 0.0 {
        probability += (r.return_on_equity * fin.board_roe_bonus_scale).min(fin.board_roe_bonus_cap);
    }
    if r.current_ratio > fin.current_ratio_bands.green {
        probability += fin.board_current_ratio_bonus;
    }
    if r.debt_to_equity > fin.debt_to_equity_bands.yellow {
        probability -= fin.board_high_debt_penalty;
    }
    if state.esg_score >= fin.board_esg_high_threshold {
        probability += fin.board_esg_high_bonus;
    } else if state.esg_score < fin.board_esg_low_threshold {
        probability -= fin.board_esg_low_penalty;
    }
    probability += fin.board_proposal_modifiers.get(&proposal).copied().unwrap_or(0.0);
    probability.clamp(fin.board_probability_min, fin.board_probability_max)
}

/// Runs the finance pass for one team.
pub fn process(
    state: &TeamState,
    decisions: &[FinanceDecision],
    market: &MarketState,
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
            FinanceDecision::IssueTreasuryBills { amount } => {
                let rate = market.interest_rate * config.finance.tbill_rate_fraction;
                state.debts.push(DebtInstrument {
                    kind: DebtKind::TreasuryBill,
                    principal: *amount,
                    rate_per_round: rate,
                    rounds_remaining: config.finance.tbill_term_rounds,
                    short_term: true,
                });
                state.cash += amount;
                ledger.debt_issued += amount;
                ledger.debt_issued_short_term += amount;
                messages.push(format!("issued {:.0} in treasury bills at {:.2}%", amount, rate * 100.0));
            },
            FinanceDecision::IssueBonds { amount } => {
                let rate = market.interest_rate + config.finance.bond_rate_premium;
                state.debts.push(DebtInstrument {
                    kind: DebtKind::Bond,
                    principal: *amount,
                    rate_per_round: rate,
                    rounds_remaining: config.finance.bond_term_rounds,
                    short_term: false,
                });
                state.cash += amount;
                ledger.debt_issued += amount;
                messages.push(format!("issued {:.0} in corporate bonds at {:.2}%", amount, rate * 100.0));
            },
            FinanceDecision::RequestLoan { amount, term_rounds } => {
                let premium = state.credit_rating.loan_premium();
                let rate = market.interest_rate + premium;
                let short_term = *term_rounds <= config.finance.loan_short_term_threshold_rounds;
                state.debts.push(DebtInstrument {
                    kind: DebtKind::Loan,
                    principal: *amount,
                    rate_per_round: rate,
                    rounds_remaining: *term_rounds,
                    short_term,
                });
                state.cash += amount;
                ledger.debt_issued += amount;
                if short_term {
                    ledger.debt_issued_short_term += amount;
                }
                messages.push(format!(
                    "bank loan of {:.0} over {} rounds at {:.2}% ({} rating)",
                    amount,
                    term_rounds,
                    rate * 100.0,
                    state.credit_rating
                ));
            },
            FinanceDecision::IssueStock { amount } => {
                if state.share_price <= 0.0 {
                    warnings.push(Warning::new(
                        ModuleKind::Finance,
                        "cannot issue stock at zero share price".to_string(),
                    ));
                    continue;
                }
                let new_shares = (amount / state.share_price).floor() as u64;
                if new_shares == 0 {
                    warnings.push(Warning::new(
                        ModuleKind::Finance,
                        "stock issuance too small for one share".to_string(),
                    ));
                    continue;
                }
                let proceeds = new_shares as f64 * state.share_price;
                let before = state.shares_issued;
                state.shares_issued += new_shares;
                // Dilution: the market cap does not move with the issue, the
                // price reprices to market_cap / shares.
                state.share_price = state.market_cap / state.shares_issued as f64;
                state.cash += proceeds;
                state.paid_in_capital += proceeds;
                ledger.equity_issued += proceeds;
                changes.push(StateChange::new("shares_issued", before, state.shares_issued));
                messages.push(format!("issued {} shares for {:.0}", new_shares, proceeds));
            },
            FinanceDecision::BuybackShares { amount } => {
                if *amount > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Finance,
                        "insufficient cash for share buyback".to_string(),
                    ));
                    continue;
                }
                if state.share_price <= 0.0 {
                    continue;
                }
                let wanted = (amount / state.share_price).floor() as u64;
                let headroom = state.shares_issued.saturating_sub(config.finance.min_shares);
                let bought = wanted.min(headroom);
                if bought == 0 {
                    warnings.push(Warning::new(
                        ModuleKind::Finance,
                        "buyback would breach the share floor; dropped".to_string(),
                    ));
                    continue;
                }
                let spend = bought as f64 * state.share_price;
                let eps_before = if state.shares_issued > 0 {
                    state.net_income / state.shares_issued as f64
                } else {
                    0.0
                };
                state.shares_issued -= bought;
                state.cash -= spend;
                state.paid_in_capital -= spend;
                ledger.buyback += spend;
                state.eps = state.net_income / state.shares_issued as f64;
                let eps_growth = if eps_before.abs() > 1e-12 {
                    (state.eps - eps_before) / eps_before.abs()
                } else {
                    0.0
                };
                let boost = (eps_growth * 0.5).max(0.0).min(config.finance.buyback_boost_cap);
                state.share_price *= 1.0 + boost;
                state.market_cap = state.share_price * state.shares_issued as f64;
                messages.push(format!(
                    "bought back {} shares for {:.0}; EPS {:.2}, price +{:.2}%",
                    bought,
                    spend,
                    state.eps,
                    boost * 100.0
                ));
            },
            FinanceDecision::DeclareDividend { per_share } => {
                let total = per_share * state.shares_issued as f64;
                if total > state.cash {
                    warnings.push(Warning::new(
                        ModuleKind::Finance,
                        "insufficient cash for declared dividend".to_string(),
                    ));
                    continue;
                }
                let yield_ = if state.share_price > 0.0 {
                    per_share / state.share_price
                } else {
                    0.0
                };
                state.cash -= total;
                ledger.dividends_declared += total;
                if yield_ > config.finance.dividend_yield_concern_threshold {
                    state.share_price *= config.finance.dividend_concern_multiplier;
                    messages.push("dividend yield raised growth concerns".to_string());
                } else if yield_ > config.finance.dividend_yield_reward_threshold {
                    state.share_price *= config.finance.dividend_reward_multiplier;
                }
                state.market_cap = state.share_price * state.shares_issued as f64;
                messages.push(format!(
                    "declared dividend of {:.2} per share ({:.0} total)",
                    per_share, total
                ));
            },
            FinanceDecision::SubmitForecast { gdp_growth, inflation, demand_growth } => {
                state.pending_forecast = Some(EconomicForecast {
                    gdp_growth: *gdp_growth,
                    inflation: *inflation,
                    demand_growth: *demand_growth,
                });
                messages.push("economic forecast submitted".to_string());
            },
            FinanceDecision::BoardMeeting { proposal } => {
                let probability = board_probability(&state, *proposal, config);
                let roll = rng.next();
                let approved = roll * 100.0 < probability;
                let members = config.finance.board_members;
                let majority = members / 2 + 1;
                // The vote tally is derived from the probability, not drawn.
                let mut yes = (probability / 100.0 * members as f64).round() as u32;
                if approved {
                    yes = yes.clamp(majority, members);
                } else {
                    yes = yes.min(majority.saturating_sub(1));
                }
                debug!(
                    "board vote on {}: p={:.0}% roll={:.2} -> {} ({}/{})",
                    proposal, probability, roll, approved, yes, members
                );
                messages.push(format!(
                    "board {} the {} proposal ({} of {} in favour)",
                    if approved { "approved" } else { "rejected" },
                    proposal,
                    yes,
                    members
                ));
                if approved && *proposal == ProposalKind::SustainabilityProgram {
                    let cost = 2_000_000.0_f64.min(state.cash.max(0.0));
                    state.cash -= cost;
                    ledger.opex += cost;
                    state.esg_score += 25.0;
                }
            },
        }
    }

    // Service outstanding debt: pay interest, retire maturing principal.
    let mut interest_total = 0.0;
    let mut still_outstanding = Vec::new();
    for mut debt in std::mem::take(&mut state.debts) {
        let interest = debt.principal * debt.rate_per_round;
        interest_total += interest;
        debt.rounds_remaining = debt.rounds_remaining.saturating_sub(1);
        if debt.rounds_remaining == 0 {
            state.cash -= debt.principal;
            ledger.debt_repaid += debt.principal;
            if debt.short_term {
                ledger.debt_repaid_short_term += debt.principal;
            }
            messages.push(format!("repaid {:.0} of maturing {:?} debt", debt.principal, debt.kind));
        } else {
            still_outstanding.push(debt);
        }
    }
    state.debts = still_outstanding;
    state.cash -= interest_total;
    ledger.interest_expense += interest_total;

    // Refresh the short/long split.
    state.short_term_debt =
        state.debts.iter().filter(|d| d.short_term).map(|d| d.principal).sum();
    state.long_term_debt =
        state.debts.iter().filter(|d| !d.short_term).map(|d| d.principal).sum();

    let costs = ledger.total_cash_out();
    ModuleOutcome { state, costs, revenue: 0.0, ledger, messages, warnings, changes }
}

/// Re-rates a team's credit from a closed round's statements.
pub fn refresh_credit_rating(state: &mut TeamState, operating_income: f64, interest_expense: f64) {
    let inputs = credit_rating::RatingInputs {
        cash: state.cash,
        total_debt: state.total_debt(),
        shareholders_equity: state.shareholders_equity,
        current_assets: state.cash.max(0.0)
            + state.accounts_receivable
            + state.inventory.total_value(),
        current_liabilities: state.accounts_payable + state.short_term_debt,
        revenue: state.revenue,
        net_income: state.net_income,
        operating_income,
        interest_expense,
    };
    state.credit_rating = credit_rating::rate(&inputs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::rng::{RngStream, StreamRng};

    fn setup() -> (TeamState, MarketState, GameConfig, StreamRng) {
        let config = GameConfig::default();
        let team = TeamState::initial("team-a", "Aurora Devices", &config);
        let market = config.initial_market_state();
        let rng = StreamRng::new(42, 1, RngStream::Market, "team-a");
        (team, market, config, rng)
    }

    #[test]
    fn test_buyback_matches_reference_numbers() {
        let (mut team, market, config, mut rng) = setup();
        team.cash = 200_000_000.0;
        team.shares_issued = 10_000_000;
        team.share_price = 50.0;
        team.market_cap = 500_000_000.0;
        team.net_income = 10_000_000.0;

        let decisions = vec![FinanceDecision::BuybackShares { amount: 50_000_000.0 }];
        let outcome = process(&team, &decisions, &market, &config, &mut rng);
        let state = &outcome.state;

        assert_eq!(state.shares_issued, 9_000_000);
        assert!((state.eps - 10_000_000.0 / 9_000_000.0).abs() < 1e-9);
        // EPS growth 11.1%, boost = min(15%, 5.56%).
        let expected_boost = ((10.0_f64 / 9.0 - 1.0) * 0.5).min(0.15);
        assert!((state.share_price - 50.0 * (1.0 + expected_boost)).abs() < 1e-6);
        assert!((state.market_cap - state.share_price * 9_000_000.0).abs() < 0.01);
    }

    #[test]
    fn test_buyback_respects_share_floor() {
        let (mut team, market, config, mut rng) = setup();
        team.shares_issued = config.finance.min_shares;
        team.cash = 500_000_000.0;
        let decisions = vec![FinanceDecision::BuybackShares { amount: 100_000_000.0 }];
        let outcome = process(&team, &decisions, &market, &config, &mut rng);
        assert_eq!(outcome.state.shares_issued, config.finance.min_shares);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_stock_issue_dilutes_and_reprices() {
        let (team, market, config, mut rng) = setup();
        let decisions = vec![FinanceDecision::IssueStock { amount: 50_000_000.0 }];
        let outcome = process(&team, &decisions, &market, &config, &mut rng);
        let state = &outcome.state;
        assert!(state.shares_issued > team.shares_issued);
        assert!(state.share_price < team.share_price);
        assert!((state.share_price - state.market_cap / state.shares_issued as f64).abs() < 1e-6);
        assert!(state.cash > team.cash);
    }

    #[test]
    fn test_high_dividend_draws_concern_penalty() {
        let (mut team, market, config, mut rng) = setup();
        team.net_income = 50_000_000.0;
        // Yield 3/50 = 6% > 5% concern threshold.
        let decisions = vec![FinanceDecision::DeclareDividend { per_share: 3.0 }];
        let outcome = process(&team, &decisions, &market, &config, &mut rng);
        assert!(
            (outcome.state.share_price
                - team.share_price * config.finance.dividend_concern_multiplier)
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_moderate_dividend_rewarded() {
        let (mut team, market, config, mut rng) = setup();
        team.net_income = 50_000_000.0;
        // Yield 1.5/50 = 3%: above reward, below concern.
        let decisions = vec![FinanceDecision::DeclareDividend { per_share: 1.5 }];
        let outcome = process(&team, &decisions, &market, &config, &mut rng);
        assert!(
            (outcome.state.share_price
                - team.share_price * config.finance.dividend_reward_multiplier)
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_loan_term_classifies_debt() {
        let (team, market, config, mut rng) = setup();
        let decisions = vec![
            FinanceDecision::RequestLoan { amount: 10_000_000.0, term_rounds: 3 },
            FinanceDecision::RequestLoan { amount: 20_000_000.0, term_rounds: 12 },
        ];
        let outcome = process(&team, &decisions, &market, &config, &mut rng);
        assert_eq!(outcome.state.short_term_debt, 10_000_000.0);
        assert_eq!(outcome.state.long_term_debt, 20_000_000.0);
    }

    #[test]
    fn test_maturing_debt_repaid() {
        let (mut team, market, config, mut rng) = setup();
        team.debts.push(DebtInstrument {
            kind: DebtKind::TreasuryBill,
            principal: 5_000_000.0,
            rate_per_round: 0.01,
            rounds_remaining: 1,
            short_term: true,
        });
        let cash_before = team.cash;
        let outcome = process(&team, &[], &market, &config, &mut rng);
        assert!(outcome.state.debts.is_empty());
        // Principal plus one round of interest left the account.
        assert!((cash_before - outcome.state.cash - 5_050_000.0).abs() < 1e-6);
        assert_eq!(outcome.ledger.debt_repaid, 5_000_000.0);
    }

    #[test]
    fn test_board_probability_clamped() {
        let (mut team, _, config, _) = setup();
        team.esg_score = 1_000.0;
        team.net_income = 1_000_000_000.0;
        team.revenue = 2_000_000_000.0;
        for proposal in
            [ProposalKind::Expansion, ProposalKind::ExecutiveCompensation, ProposalKind::Restructuring]
        {
            let p = board_probability(&team, proposal, &config);
            assert!(p >= config.finance.board_probability_min);
            assert!(p <= config.finance.board_probability_max);
        }
    }

    #[test]
    fn test_esg_shifts_board_probability() {
        let (mut team, _, config, _) = setup();
        team.esg_score = 650.0;
        let high = board_probability(&team, ProposalKind::Expansion, &config);
        team.esg_score = 100.0;
        let low = board_probability(&team, ProposalKind::Expansion, &config);
        assert!(
            (high - low - config.finance.board_esg_high_bonus - config.finance.board_esg_low_penalty)
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_fx_impact_skips_home_region() {
        let (_, mut market, _, _) = setup();
        market.fx_rates.insert(Region::Europe, 1.10);
        market.fx_rates.insert(Region::Asia, 0.90);
        let mut revenue = BTreeMap::new();
        revenue.insert(Region::NorthAmerica, 100_000.0);
        revenue.insert(Region::Europe, 50_000.0);
        revenue.insert(Region::Asia, 20_000.0);
        let impact = fx_impact(&revenue, &market, Region::NorthAmerica);
        let expected = 0.10 * 50_000.0 - 0.10 * 20_000.0;
        assert!((impact - expected).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_scoring_bands() {
        let (_, market, _, _) = setup();
        let perfect = EconomicForecast {
            gdp_growth: market.macros.gdp_growth,
            inflation: market.macros.inflation,
            demand_growth: market.segments.values().map(|d| d.growth_rate).sum::<f64>()
                / market.segments.len() as f64,
        };
        assert!(score_forecast(&perfect, &market).contains("excellent"));
        let poor = EconomicForecast { gdp_growth: 0.5, inflation: 0.5, demand_growth: 0.5 };
        assert!(score_forecast(&poor, &market).contains("poor"));
    }

    #[test]
    fn test_liquidity_ratios_use_short_term_debt() {
        let (mut team, _, config, _) = setup();
        team.cash = 50_000_000.0;
        team.short_term_debt = 25_000_000.0;
        team.long_term_debt = 500_000_000.0;
        let r = ratios(&team, &config);
        // Long-term debt does not depress the cash ratio.
        assert!((r.cash_ratio - 2.0).abs() < 1e-9);
    }
}
