//! Outcome sweeps: many seeded rounds of one scenario, run in parallel, tallied.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::data::config::CultistsConfig;
use crate::error::RuleError;
use crate::parallel::{seed_batches, SeedBatch, WorkerPool};
use crate::rule::outcome::{ConditionTag, Outcome};
use crate::sim::scenario::{run_scenario, RoundReport, ScenarioSetup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Template round; its seed is the first seed of the sweep.
    pub setup: ScenarioSetup,
    pub runs: usize,
    pub pool: WorkerPool,
}

/// One CSV row per round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepRow {
    pub seed: u64,
    pub round_id: String,
    pub started: bool,
    pub outcome: Outcome,
    pub cultists: usize,
    pub conditions: String,
}

impl From<&RoundReport> for SweepRow {
    fn from(report: &RoundReport) -> Self {
        Self {
            seed: report.seed,
            round_id: report.round_id.clone(),
            started: report.started,
            outcome: report.outcome,
            cultists: report.cultists.len(),
            conditions: report
                .conditions
                .iter()
                .map(|tag| tag.as_str())
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub generated_at: String,
    pub runs: usize,
    pub cancelled: usize,
    pub workers: usize,
    pub outcomes: BTreeMap<Outcome, usize>,
    pub conditions: BTreeMap<ConditionTag, usize>,
    #[serde(skip)]
    pub rows: Vec<SweepRow>,
}

impl SweepSummary {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Run `sweep.runs` rounds with consecutive seeds. Rows come back in seed order
/// regardless of worker count.
pub fn run_sweep(config: &CultistsConfig, sweep: &SweepConfig) -> Result<SweepSummary, RuleError> {
    config.validate()?;
    let workers = sweep.pool.effective_workers();
    let batches = seed_batches(sweep.setup.seed, sweep.runs, workers.max(1));

    let per_batch: Vec<Result<Vec<RoundReport>, RuleError>> = sweep.pool.install(|| {
        batches
            .par_iter()
            .map(|batch| run_batch(config, &sweep.setup, batch))
            .collect()
    });

    let mut summary = SweepSummary {
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        runs: sweep.runs,
        cancelled: 0,
        workers,
        outcomes: BTreeMap::new(),
        conditions: BTreeMap::new(),
        rows: Vec::with_capacity(sweep.runs),
    };
    for reports in per_batch {
        for report in reports? {
            if !report.started {
                summary.cancelled += 1;
            }
            *summary.outcomes.entry(report.outcome).or_insert(0) += 1;
            for tag in &report.conditions {
                *summary.conditions.entry(*tag).or_insert(0) += 1;
            }
            summary.rows.push(SweepRow::from(&report));
        }
    }
    info!(
        runs = summary.runs,
        cancelled = summary.cancelled,
        workers,
        "sweep finished"
    );
    Ok(summary)
}

fn run_batch(
    config: &CultistsConfig,
    template: &ScenarioSetup,
    batch: &SeedBatch,
) -> Result<Vec<RoundReport>, RuleError> {
    batch
        .seeds()
        .map(|seed| {
            let setup = ScenarioSetup { seed, ..*template };
            run_scenario(config, &setup)
        })
        .collect()
}
