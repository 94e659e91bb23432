//! Round reports, rankings, and game-history output.
//!
//! One [`RoundReport`] is the complete outcome of a processed round: per-team
//! results (with the new snapshots and statements), rankings, warnings,
//! summary messages and the advanced market state. A [`GameHistory`]
//! accumulates reports and exports to JSON, optionally gzip-compressed.

use crate::achievement::AchievementDiff;
use crate::credit_rating::CreditRating;
use crate::error::{Result, SimulationError};
use crate::finance::FinancialRatios;
use crate::market::MarketState;
use crate::module::ModuleKind;
use crate::product::Segment;
use crate::statements::FinancialStatements;
use crate::team::TeamState;
use chrono::{DateTime, Utc};
use colored::Colorize;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Per-module outcome summary carried on the round report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleReport {
    pub costs: f64,
    pub revenue: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

/// A warning surfaced to players: who, where, why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundWarning {
    pub team_id: String,
    pub module: ModuleKind,
    pub message: String,
}

/// One team's full result for one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRoundResult {
    pub team_id: String,
    /// The team's snapshot after the round closed
    pub new_state: TeamState,
    pub module_results: BTreeMap<ModuleKind, ModuleReport>,
    pub sales_by_segment: BTreeMap<Segment, f64>,
    pub market_share_by_segment: BTreeMap<Segment, f64>,
    pub total_revenue: f64,
    pub total_costs: f64,
    pub net_income: f64,
    pub statements: FinancialStatements,
    pub ratios: FinancialRatios,
    pub credit_rating: CreditRating,
    /// Overall rank this round (1 = best)
    pub rank: u32,
    pub eps_rank: u32,
    pub market_share_rank: u32,
}

/// Rankings for one round, as ordered team-id lists (best first).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rankings {
    pub overall: Vec<String>,
    pub by_eps: Vec<String>,
    pub by_market_share: Vec<String>,
}

/// The complete output of one processed round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReport {
    pub round_number: u32,
    pub results: Vec<TeamRoundResult>,
    pub rankings: Rankings,
    pub new_market_state: MarketState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary_messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RoundWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub achievements: Vec<AchievementDiff>,
    /// Names of economy events fired during the close
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub economy_events: Vec<String>,
}

impl RoundReport {
    /// Result entry for one team, if present.
    pub fn team(&self, team_id: &str) -> Option<&TeamRoundResult> {
        self.results.iter().find(|r| r.team_id == team_id)
    }
}

/// Ranks teams by a value, descending, with ties broken by stable team-id
/// order. Returns team ids best-first.
pub fn rank_by(results: &[(String, f64)]) -> Vec<String> {
    let mut order: Vec<&(String, f64)> = results.iter().collect();
    order.sort_by(|a, b| {
        b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0))
    });
    order.into_iter().map(|(id, _)| id.clone()).collect()
}

/// Full game history with export support.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameHistory {
    pub reports: Vec<RoundReport>,
}

/// Wrapper written to disk: history plus generation metadata.
#[derive(Debug, Serialize)]
struct ExportedHistory<'a> {
    generated_at: DateTime<Utc>,
    rounds: usize,
    history: &'a GameHistory,
}

impl GameHistory {
    pub fn push(&mut self, report: RoundReport) {
        self.reports.push(report);
    }

    pub fn last(&self) -> Option<&RoundReport> {
        self.reports.last()
    }

    /// Writes the history as JSON; with `compress` the file gains a `.gz`
    /// suffix and gzip framing.
    pub fn export_json<P: AsRef<Path>>(&self, path: P, compress: bool) -> Result<()> {
        let export = ExportedHistory {
            generated_at: Utc::now(),
            rounds: self.reports.len(),
            history: self,
        };
        let json = serde_json::to_string_pretty(&export)
            .map_err(|e| SimulationError::JsonSerialize(e.to_string()))?;
        if compress {
            let path = path.as_ref().with_extension("json.gz");
            let file = File::create(&path)?;
            let mut encoder = GzEncoder::new(file, Compression::default());
            encoder.write_all(json.as_bytes())?;
            encoder.finish()?;
        } else {
            let mut file = File::create(path.as_ref())?;
            file.write_all(json.as_bytes())?;
        }
        Ok(())
    }
}

/// Renders a colored standings table for one round.
pub fn standings_table(report: &RoundReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format!("=== Round {} standings ===", report.round_number).bold()
    ));
    out.push_str(&format!(
        "{:<4} {:<16} {:>14} {:>14} {:>8} {:>7} {:>6}\n",
        "#", "Team", "Revenue", "Net income", "Share", "Price", "Rating"
    ));
    let mut rows: Vec<&TeamRoundResult> = report.results.iter().collect();
    rows.sort_by_key(|r| r.rank);
    for result in rows {
        let total_share: f64 = result.market_share_by_segment.values().sum();
        let net = if result.net_income >= 0.0 {
            format!("{:>14.0}", result.net_income).green()
        } else {
            format!("{:>14.0}", result.net_income).red()
        };
        let rating = if result.credit_rating.is_investment_grade() {
            result.credit_rating.to_string().green()
        } else {
            result.credit_rating.to_string().yellow()
        };
        out.push_str(&format!(
            "{:<4} {:<16} {:>14.0} {} {:>7.1}% {:>7.2} {:>6}\n",
            result.rank,
            result.new_state.name,
            result.total_revenue,
            net,
            total_share * 100.0,
            result.new_state.share_price,
            rating
        ));
    }
    for warning in &report.warnings {
        out.push_str(&format!(
            "{} [{}/{}] {}\n",
            "warning:".yellow(),
            warning.team_id,
            warning.module,
            warning.message
        ));
    }
    out
}
