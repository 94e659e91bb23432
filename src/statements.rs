//! Financial statements: income statement, balance sheet, cash flow.
//!
//! Statements are produced in that order each round, so working-capital
//! changes fall out of balance-sheet deltas. Reconciliation is checked and
//! *reported*, never repaired: a gap becomes a diagnostic on the statements,
//! and no balancing figure is ever plugged.

use crate::config::GameConfig;
use crate::module::LedgerDelta;
use crate::team::TeamState;
use log::warn;
use serde::{Deserialize, Serialize};

/// Income statement for one team, one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: f64,
    pub cost_of_goods_sold: f64,
    pub gross_profit: f64,
    pub operating_expenses: f64,
    pub research_and_development: f64,
    pub depreciation: f64,
    pub operating_income: f64,
    pub interest_expense: f64,
    pub other_income: f64,
    pub pre_tax_income: f64,
    pub tax: f64,
    pub net_income: f64,
}

/// Asset side of the balance sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceAssets {
    pub cash: f64,
    pub accounts_receivable: f64,
    pub inventory: f64,
    pub inventory_in_transit: f64,
    pub ppe_gross: f64,
    pub accumulated_depreciation: f64,
    pub ppe_net: f64,
    pub total: f64,
}

/// Liability side of the balance sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceLiabilities {
    pub accounts_payable: f64,
    pub short_term_debt: f64,
    pub long_term_debt: f64,
    pub total: f64,
}

/// Equity section of the balance sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEquity {
    pub paid_in_capital: f64,
    pub retained_earnings: f64,
    pub total: f64,
}

/// Balance sheet for one team at round close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub assets: BalanceAssets,
    pub liabilities: BalanceLiabilities,
    pub equity: BalanceEquity,
}

impl BalanceSheet {
    /// Assets minus (liabilities + equity); zero when balanced.
    pub fn gap(&self) -> f64 {
        self.assets.total - (self.liabilities.total + self.equity.total)
    }
}

/// Cash flow statement for one team, one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowStatement {
    // Operating
    pub net_income: f64,
    pub depreciation: f64,
    pub accounts_receivable_change: f64,
    pub accounts_payable_change: f64,
    pub inventory_change: f64,
    pub operating_net: f64,
    // Investing
    pub capital_expenditure: f64,
    pub asset_sales: f64,
    pub investing_net: f64,
    // Financing
    pub debt_issued: f64,
    pub debt_repaid: f64,
    pub equity_issued: f64,
    pub share_buybacks: f64,
    pub dividends_paid: f64,
    pub financing_net: f64,
    // Totals
    pub beginning_cash: f64,
    pub net_cash_change: f64,
    pub ending_cash: f64,
}

/// The three reconciled statements plus any reconciliation diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialStatements {
    pub income: IncomeStatement,
    pub balance: BalanceSheet,
    pub cash_flow: CashFlowStatement,
    /// Non-empty when reconciliation failed; the figures are NOT adjusted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// Closes one team's round: applies the revenue/COGS/tax cash movements to
/// the state and produces the reconciled statements.
///
/// `prev` is the snapshot the round started from (beginning balances);
/// `state` is the post-module, post-market clone being closed; `revenue` is
/// the realised market revenue already adjusted for ESG and FX; `total_cogs`
/// is the product-cost of the units sold; `ledger` sums every module's cash
/// categorisation.
pub fn close_team_round(
    prev: &TeamState,
    state: &mut TeamState,
    revenue: f64,
    units_sold: f64,
    total_cogs: f64,
    ledger: &LedgerDelta,
    config: &GameConfig,
) -> FinancialStatements {
    let params = &config.statements;

    // --- Income statement -------------------------------------------------
    // Material COGS draws down inventory at weighted-average cost; the
    // conversion remainder is paid in cash (net of payables carried).
    let material_cogs =
        state.inventory.consume(units_sold * config.materials.units_per_product);
    let conversion_cogs = (total_cogs - material_cogs).max(0.0);
    let cogs = material_cogs + conversion_cogs;

    let depreciation = {
        let straight_line = state.ppe_gross / params.ppe_life_rounds as f64;
        let remaining = (state.ppe_gross - state.accumulated_depreciation).max(0.0);
        straight_line.min(remaining)
    };

    let operating_expenses = ledger.opex;
    let research = ledger.rd_expense;
    let gross_profit = revenue - cogs;
    let operating_income = gross_profit - operating_expenses - research - depreciation;
    let pre_tax = operating_income - ledger.interest_expense + ledger.other_income;
    let tax = if pre_tax > 0.0 { pre_tax * params.tax_rate } else { 0.0 };
    let net_income = pre_tax - tax;

    let income = IncomeStatement {
        revenue,
        cost_of_goods_sold: cogs,
        gross_profit,
        operating_expenses,
        research_and_development: research,
        depreciation,
        operating_income,
        interest_expense: ledger.interest_expense,
        other_income: ledger.other_income,
        pre_tax_income: pre_tax,
        tax,
        net_income,
    };

    // --- Apply close-time cash movements ---------------------------------
    // Working-capital targets at close.
    let new_ar = revenue * params.receivable_ratio;
    let new_ap = cogs * params.payable_ratio;
    let ar_change = new_ar - prev.accounts_receivable;
    let ap_change = new_ap - prev.accounts_payable;

    // Revenue collected net of the receivables build-up; conversion cost and
    // tax paid net of the payables build-up.
    state.cash += revenue - ar_change;
    state.cash -= conversion_cogs - ap_change;
    state.cash -= tax;
    state.accounts_receivable = new_ar;
    state.accounts_payable = new_ap;

    // Depreciation accrues; disposals release their accumulated share so the
    // book value retired equals the sale proceeds.
    state.accumulated_depreciation += depreciation;
    let disposal_depreciation = (ledger.asset_disposals_gross - ledger.asset_sales).max(0.0);
    state.accumulated_depreciation =
        (state.accumulated_depreciation - disposal_depreciation).max(0.0);

    // Retained earnings carry forward.
    state.retained_earnings += net_income - ledger.dividends_declared;
    state.dividends_paid = ledger.dividends_declared;
    state.revenue = revenue;
    state.net_income = net_income;
    state.eps = if state.shares_issued > 0 {
        net_income / state.shares_issued as f64
    } else {
        0.0
    };

    // --- Balance sheet ----------------------------------------------------
    let inventory_value = state.inventory.total_value();
    let in_transit = state.inventory_in_transit_value();
    let ppe_net = (state.ppe_gross - state.accumulated_depreciation).max(0.0);
    let assets_total =
        state.cash + state.accounts_receivable + inventory_value + in_transit + ppe_net;
    let liabilities_total =
        state.accounts_payable + state.short_term_debt + state.long_term_debt;
    let equity_total = state.paid_in_capital + state.retained_earnings;

    let balance = BalanceSheet {
        assets: BalanceAssets {
            cash: state.cash,
            accounts_receivable: state.accounts_receivable,
            inventory: inventory_value,
            inventory_in_transit: in_transit,
            ppe_gross: state.ppe_gross,
            accumulated_depreciation: state.accumulated_depreciation,
            ppe_net,
            total: assets_total,
        },
        liabilities: BalanceLiabilities {
            accounts_payable: state.accounts_payable,
            short_term_debt: state.short_term_debt,
            long_term_debt: state.long_term_debt,
            total: liabilities_total,
        },
        equity: BalanceEquity {
            paid_in_capital: state.paid_in_capital,
            retained_earnings: state.retained_earnings,
            total: equity_total,
        },
    };

    state.total_assets = assets_total;
    state.total_liabilities = liabilities_total;
    state.shareholders_equity = equity_total;

    // --- Cash flow statement ---------------------------------------------
    let prev_inventory_total =
        prev.inventory.total_value() + prev.inventory_in_transit_value();
    let inventory_change = (inventory_value + in_transit) - prev_inventory_total;

    let operating_net =
        net_income + depreciation - ar_change + ap_change - inventory_change;
    let investing_net = ledger.asset_sales - ledger.capex;
    let financing_net = ledger.debt_issued + ledger.equity_issued
        - ledger.debt_repaid
        - ledger.buyback
        - ledger.dividends_declared;
    let net_cash_change = operating_net + investing_net + financing_net;
    let beginning_cash = prev.cash;
    let ending_cash = beginning_cash + net_cash_change;

    let cash_flow = CashFlowStatement {
        net_income,
        depreciation,
        accounts_receivable_change: ar_change,
        accounts_payable_change: ap_change,
        inventory_change,
        operating_net,
        capital_expenditure: ledger.capex,
        asset_sales: ledger.asset_sales,
        debt_issued: ledger.debt_issued,
        debt_repaid: ledger.debt_repaid,
        equity_issued: ledger.equity_issued,
        share_buybacks: ledger.buyback,
        dividends_paid: ledger.dividends_declared,
        investing_net,
        financing_net,
        beginning_cash,
        net_cash_change,
        ending_cash,
    };

    // --- Reconciliation ---------------------------------------------------
    let mut diagnostics = Vec::new();
    let balance_gap = balance.gap();
    if balance_gap.abs() > 0.01 {
        diagnostics.push(format!(
            "balance sheet does not balance: assets {:.2} vs L+E {:.2} (gap {:.4})",
            balance.assets.total,
            balance.liabilities.total + balance.equity.total,
            balance_gap
        ));
    }
    if (cash_flow.net_income - income.net_income).abs() > 0.01 {
        diagnostics.push(format!(
            "cash flow net income {:.2} differs from income statement {:.2}",
            cash_flow.net_income, income.net_income
        ));
    }
    let cash_gap = cash_flow.ending_cash - state.cash;
    if cash_gap.abs() > 0.01 {
        diagnostics.push(format!(
            "cash flow ending cash {:.2} differs from book cash {:.2} (gap {:.4})",
            cash_flow.ending_cash, state.cash, cash_gap
        ));
    }
    for diagnostic in &diagnostics {
        warn!("team {}: {}", state.id, diagnostic);
    }

    FinancialStatements { income, balance, cash_flow, diagnostics }
}

/// Target-PE valuation pass: moves the share price a configured fraction of
/// the way toward the earnings-implied price, then refreshes the market cap.
///
/// The PE multiple applies to annualised earnings per share.
pub fn apply_valuation(state: &mut TeamState, config: &GameConfig) {
    let params = &config.statements;
    let target = if state.eps > 0.0 {
        state.eps * config.rounds_per_year as f64 * params.target_pe
    } else {
        // Loss-making teams drift down rather than snapping to zero.
        state.share_price * 0.95
    };
    state.share_price += (target - state.share_price) * params.price_smoothing;
    state.share_price = state.share_price.max(0.01);
    state.market_cap = state.share_price * state.shares_issued as f64;
}
