//! Attribution summary.
//!
//! Condenses an [`AttributionResult`] to the period view: compounded returns,
//! linked effect totals and one line per sector.

use crate::export::{ExportError, ExportFormat, Exporter, rows_to_csv};
use brinson_engine::{AttributionResult, EffectModel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Period figures of one sector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectorSummary {
    /// Sector label.
    pub sector: String,

    /// Mean portfolio weight.
    pub portfolio_weight: f64,

    /// Mean benchmark weight.
    pub benchmark_weight: f64,

    /// Linked allocation effect.
    pub allocation: f64,

    /// Linked selection effect.
    pub selection: f64,

    /// Linked interaction effect.
    pub interaction: f64,

    /// Linked sum of effects.
    pub total_effect: f64,
}

impl fmt::Display for SectorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.4}% (allocation: {:.4}%, selection: {:.4}%, interaction: {:.4}%)",
            self.sector,
            self.total_effect * 100.0,
            self.allocation * 100.0,
            self.selection * 100.0,
            self.interaction * 100.0
        )
    }
}

/// Period summary of an attribution run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributionSummary {
    /// Portfolio name.
    pub name: String,

    /// First attributed date.
    pub period_start: NaiveDate,

    /// Last attributed date.
    pub period_end: NaiveDate,

    /// Effect decomposition used.
    pub effect_model: EffectModel,

    /// Number of attributed dates.
    pub dates: usize,

    /// Compounded portfolio return.
    pub portfolio_return: f64,

    /// Compounded benchmark return.
    pub benchmark_return: f64,

    /// Compounded excess return.
    pub excess_return: f64,

    /// Linked allocation effect.
    pub allocation: f64,

    /// Linked selection effect.
    pub selection: f64,

    /// Linked interaction effect.
    pub interaction: f64,

    /// Linked sum of effects.
    pub total_effect: f64,

    /// Zero-return dates removed.
    pub zero_dates: usize,

    /// Sum of returns dropped on trailing zero dates.
    pub discarded_return: f64,

    /// Per-sector figures, by sector label.
    pub sectors: Vec<SectorSummary>,
}

impl AttributionSummary {
    /// Summarize a result.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::EmptyResult`] if the result has no dates.
    pub fn from_result(name: impl Into<String>, result: &AttributionResult) -> Result<Self, ExportError> {
        let (Some(period_start), Some(period_end)) = (result.start_date(), result.end_date()) else {
            return Err(ExportError::EmptyResult);
        };

        let weights: BTreeMap<&str, (f64, f64)> = result
            .average_weights
            .iter()
            .map(|w| (w.sector.as_str(), (w.portfolio_weight, w.benchmark_weight)))
            .collect();

        let sectors = result
            .sector_effects
            .iter()
            .map(|e| {
                let (portfolio_weight, benchmark_weight) =
                    weights.get(e.sector.as_str()).copied().unwrap_or_default();
                SectorSummary {
                    sector: e.sector.clone(),
                    portfolio_weight,
                    benchmark_weight,
                    allocation: e.allocation,
                    selection: e.selection,
                    interaction: e.interaction,
                    total_effect: e.total_effect,
                }
            })
            .collect();

        let totals = result.linked.totals;
        Ok(Self {
            name: name.into(),
            period_start,
            period_end,
            effect_model: result.effect_model,
            dates: result.daily.len(),
            portfolio_return: totals.portfolio_return,
            benchmark_return: totals.benchmark_return,
            excess_return: totals.excess_return,
            allocation: totals.allocation,
            selection: totals.selection,
            interaction: totals.interaction,
            total_effect: totals.total_effect,
            zero_dates: result.redistribution.zero_dates.len(),
            discarded_return: result.redistribution.discarded.iter().map(|d| d.amount).sum(),
            sectors,
        })
    }

    /// Excess return not explained by the linked effects.
    pub fn residual(&self) -> f64 {
        self.excess_return - self.total_effect
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nBrinson Attribution: {}\n", self.name));
        output.push_str(&format!(
            "Period: {} to {} ({} dates, {})\n",
            self.period_start, self.period_end, self.dates, self.effect_model
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str("\nCompounded Returns:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "  Portfolio:                {:>10.4}%\n",
            self.portfolio_return * 100.0
        ));
        output.push_str(&format!(
            "  Benchmark:                {:>10.4}%\n",
            self.benchmark_return * 100.0
        ));
        output.push_str(&format!(
            "  Excess:                   {:>10.4}%\n",
            self.excess_return * 100.0
        ));

        output.push_str("\nLinked Effects:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "  Allocation:               {:>10.4}%\n",
            self.allocation * 100.0
        ));
        output.push_str(&format!(
            "  Selection:                {:>10.4}%\n",
            self.selection * 100.0
        ));
        output.push_str(&format!(
            "  Interaction:              {:>10.4}%\n",
            self.interaction * 100.0
        ));
        output.push_str(&format!(
            "  Total:                    {:>10.4}%\n",
            self.total_effect * 100.0
        ));
        if self.zero_dates > 0 {
            output.push_str(&format!(
                "  Zero-return dates:        {:>10} (discarded {:.4}%)\n",
                self.zero_dates,
                self.discarded_return * 100.0
            ));
        }

        if !self.sectors.is_empty() {
            output.push_str("\nSector Effects:\n");
            output.push_str(&"-".repeat(80));
            output.push('\n');
            output.push_str(&format!(
                "{:<20} {:>9} {:>9} {:>10} {:>10} {:>10} {:>9}\n",
                "Sector", "Port. W", "Bench. W", "Alloc.", "Select.", "Inter.", "Total"
            ));
            output.push_str(&"-".repeat(80));
            output.push('\n');

            for s in &self.sectors {
                output.push_str(&format!(
                    "{:<20} {:>8.2}% {:>8.2}% {:>9.4}% {:>9.4}% {:>9.4}% {:>8.4}%\n",
                    s.sector,
                    s.portfolio_weight * 100.0,
                    s.benchmark_weight * 100.0,
                    s.allocation * 100.0,
                    s.selection * 100.0,
                    s.interaction * 100.0,
                    s.total_effect * 100.0
                ));
            }
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Brinson Attribution: {}\n\n", self.name));
        output.push_str(&format!(
            "**Period:** {} to {} ({} dates, {})\n\n",
            self.period_start, self.period_end, self.dates, self.effect_model
        ));

        output.push_str("## Compounded Returns\n\n");
        output.push_str(&format!(
            "- **Portfolio:** {:.4}%\n",
            self.portfolio_return * 100.0
        ));
        output.push_str(&format!(
            "- **Benchmark:** {:.4}%\n",
            self.benchmark_return * 100.0
        ));
        output.push_str(&format!("- **Excess:** {:.4}%\n\n", self.excess_return * 100.0));

        output.push_str("## Linked Effects\n\n");
        output.push_str(&format!("- **Allocation:** {:.4}%\n", self.allocation * 100.0));
        output.push_str(&format!("- **Selection:** {:.4}%\n", self.selection * 100.0));
        output.push_str(&format!(
            "- **Interaction:** {:.4}%\n",
            self.interaction * 100.0
        ));
        output.push_str(&format!("- **Total:** {:.4}%\n\n", self.total_effect * 100.0));

        if !self.sectors.is_empty() {
            output.push_str("## Sector Effects\n\n");
            output.push_str(
                "| Sector | Portfolio Weight | Benchmark Weight | Allocation | Selection | Interaction | Total |\n",
            );
            output.push_str(
                "|--------|------------------|------------------|------------|-----------|-------------|-------|\n",
            );

            for s in &self.sectors {
                output.push_str(&format!(
                    "| {} | {:.2}% | {:.2}% | {:.4}% | {:.4}% | {:.4}% | {:.4}% |\n",
                    s.sector,
                    s.portfolio_weight * 100.0,
                    s.benchmark_weight * 100.0,
                    s.allocation * 100.0,
                    s.selection * 100.0,
                    s.interaction * 100.0,
                    s.total_effect * 100.0
                ));
            }
        }

        output
    }
}

impl fmt::Display for AttributionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Brinson Attribution: {} ({} to {})",
            self.name, self.period_start, self.period_end
        )?;
        writeln!(f, "  Portfolio Return: {:.4}%", self.portfolio_return * 100.0)?;
        writeln!(f, "  Benchmark Return: {:.4}%", self.benchmark_return * 100.0)?;
        writeln!(f, "  Excess Return: {:.4}%", self.excess_return * 100.0)?;
        writeln!(f, "  Allocation: {:.4}%", self.allocation * 100.0)?;
        writeln!(f, "  Selection: {:.4}%", self.selection * 100.0)?;
        writeln!(f, "  Interaction: {:.4}%", self.interaction * 100.0)?;
        Ok(())
    }
}

impl Exporter for AttributionSummary {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => rows_to_csv(&self.sectors),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
