//! Campaign driver: epochs of sequential batches, one per content reference.
//!
//! After every batch the table is persisted, a batch report is written and
//! the ranking is handed to the `batch_done` channel if there is one;
//! after every epoch a summary is written and the cool-down elapses (except
//! after the last epoch). Persistence and report failures are logged and the
//! campaign carries on.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use tokio::sync::mpsc;

use crate::config::{GwrankConfig, DEFAULT_CONTENT_REF};
use crate::probe::Probe;
use crate::rank::rank;
use crate::report::{BatchStats, CampaignSummary, ReportWriter};
use crate::scoring::ScoringEngine;
use crate::table::EndpointTable;

use super::batch::run_batch;
use super::progress::{BatchFinished, BatchPosition, BatchProgress};

/// What to probe and how hard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignPlan {
    pub content_refs: Vec<String>,
    pub epochs: u32,
    pub max_concurrent: usize,
    pub cooldown: Duration,
}

impl CampaignPlan {
    /// Plan from config; `content_refs` overrides the configured list when non-empty.
    pub fn from_config(cfg: &GwrankConfig, content_refs: Vec<String>) -> Self {
        let content_refs = if !content_refs.is_empty() {
            content_refs
        } else if !cfg.content_refs.is_empty() {
            cfg.content_refs.clone()
        } else {
            vec![cfg.default_content_ref.clone()]
        };
        Self {
            content_refs,
            epochs: cfg.epochs,
            max_concurrent: cfg.max_concurrent_probes,
            cooldown: cfg.cooldown(),
        }
    }

    /// Content references to probe; never empty.
    pub fn refs(&self) -> Vec<String> {
        let refs: Vec<String> = self
            .content_refs
            .iter()
            .filter(|r| !r.trim().is_empty())
            .cloned()
            .collect();
        if refs.is_empty() {
            vec![DEFAULT_CONTENT_REF.to_string()]
        } else {
            refs
        }
    }
}

/// Where a campaign leaves its artifacts. `None` disables that output.
#[derive(Debug, Clone)]
pub struct CampaignOutputs {
    pub state_path: Option<PathBuf>,
    pub reports: Option<ReportWriter>,
    pub top_n: usize,
    /// Receives the ranked table after each batch.
    pub batch_done: Option<mpsc::Sender<BatchFinished>>,
}

impl Default for CampaignOutputs {
    fn default() -> Self {
        Self {
            state_path: None,
            reports: None,
            top_n: 20,
            batch_done: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignResult {
    pub epochs_completed: u32,
    pub batches: usize,
    pub probes: usize,
    pub failed_probes: usize,
}

pub async fn run_campaign(
    table: &mut EndpointTable,
    engine: &ScoringEngine,
    prober: Arc<dyn Probe>,
    plan: &CampaignPlan,
    outputs: &CampaignOutputs,
    progress: Option<&mpsc::Sender<BatchProgress>>,
) -> CampaignResult {
    let refs = plan.refs();
    let epochs = plan.epochs.max(1);
    let started = Instant::now();
    let mut result = CampaignResult::default();
    tracing::info!(
        endpoints = table.len(),
        content_refs = refs.len(),
        epochs,
        max_concurrent = plan.max_concurrent,
        "campaign start"
    );

    for epoch in 1..=epochs {
        let mut batch_stats = Vec::with_capacity(refs.len());
        for (content_index, content_ref) in refs.iter().enumerate() {
            let position = BatchPosition {
                epoch,
                epochs,
                content_index,
                content_count: refs.len(),
            };
            let outcome = run_batch(
                table,
                engine,
                Arc::clone(&prober),
                content_ref,
                plan.max_concurrent,
                progress.map(|tx| (tx, position)),
            )
            .await;
            result.batches += 1;
            result.probes += outcome.results.len();
            result.failed_probes += outcome.failed.len();

            persist(table, outputs);
            let ranked = rank(table.records());
            batch_stats.push((content_ref.clone(), BatchStats::from_ranked(&ranked)));
            if let Some(writer) = &outputs.reports {
                if let Err(e) = writer.write_batch(content_ref, &ranked, Local::now().naive_local()) {
                    tracing::warn!(error = %format!("{e:#}"), "batch report not written");
                }
            }
            if let Some(tx) = &outputs.batch_done {
                let done = BatchFinished {
                    position,
                    content_ref: content_ref.clone(),
                    ranked,
                };
                if tx.send(done).await.is_err() {
                    tracing::debug!("batch listener gone");
                }
            }
        }

        let ranked = rank(table.records());
        if let Some(best) = ranked.first() {
            tracing::info!(epoch, best = %best.url, weight = best.weight, "epoch finished");
        }
        if let Some(writer) = &outputs.reports {
            let summary = CampaignSummary::from_ranked(&ranked, outputs.top_n).with_batches(batch_stats);
            if let Err(e) = writer.write_summary(&refs, &summary, Local::now().naive_local()) {
                tracing::warn!(error = %format!("{e:#}"), "summary report not written");
            }
        }
        result.epochs_completed = epoch;

        if epoch < epochs && !plan.cooldown.is_zero() {
            tracing::debug!(secs = plan.cooldown.as_secs_f64(), "cooling down");
            tokio::time::sleep(plan.cooldown).await;
        }
    }

    tracing::info!(
        batches = result.batches,
        probes = result.probes,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "campaign finished"
    );
    result
}

fn persist(table: &EndpointTable, outputs: &CampaignOutputs) {
    let Some(path) = &outputs.state_path else {
        return;
    };
    if let Err(e) = table.save_to_path(path) {
        tracing::warn!(error = %e, "endpoint state not saved");
    }
}
