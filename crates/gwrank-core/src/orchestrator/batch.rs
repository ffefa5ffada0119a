//! One probe batch: every endpoint in the table, one content reference.
//!
//! Keeps up to `max_concurrent` probes in flight; when one finishes, its
//! measurement is scored into the table and the next endpoint is started
//! until every endpoint has been probed once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::{self, JoinSet};

use crate::probe::{Measurement, Probe};
use crate::scoring::ScoringEngine;
use crate::table::EndpointTable;

use super::progress::{BatchPosition, BatchProgress};

/// What one batch did.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub content_ref: String,
    /// Scored measurements in completion order.
    pub results: Vec<(String, Measurement)>,
    /// Endpoints whose probe task panicked; their records are unchanged.
    pub failed: Vec<String>,
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|(_, m)| m.is_success()).count()
    }
}

/// Probes every endpoint in `table` for `content_ref` with at most
/// `max_concurrent` probes in flight, applying each result as it arrives.
///
/// A probe task that panics is logged and its endpoint recorded in
/// [`BatchOutcome::failed`]. Every finished task, failed or not, yields one
/// progress event if a sender is given; events are sent with `try_send`.
pub async fn run_batch(
    table: &mut EndpointTable,
    engine: &ScoringEngine,
    prober: Arc<dyn Probe>,
    content_ref: &str,
    max_concurrent: usize,
    progress: Option<(&mpsc::Sender<BatchProgress>, BatchPosition)>,
) -> BatchOutcome {
    let max_concurrent = max_concurrent.max(1);
    let started = Instant::now();
    let mut queue = table.urls().into_iter();
    let total = table.len();
    tracing::info!(content_ref, endpoints = total, max_concurrent, "batch start");

    let mut outcome = BatchOutcome {
        content_ref: content_ref.to_string(),
        results: Vec::with_capacity(total),
        ..Default::default()
    };
    let mut join_set = JoinSet::new();
    let mut in_flight: HashMap<task::Id, String> = HashMap::with_capacity(max_concurrent);

    loop {
        while join_set.len() < max_concurrent {
            let Some(url) = queue.next() else {
                break;
            };
            let prober = Arc::clone(&prober);
            let content_ref = content_ref.to_string();
            let target = url.clone();
            let handle = join_set.spawn_blocking(move || prober.probe(&target, &content_ref));
            in_flight.insert(handle.id(), url);
        }

        let Some(joined) = join_set.join_next_with_id().await else {
            break;
        };
        let (id, measurement) = match joined {
            Ok((id, m)) => (id, Some(m)),
            Err(e) => {
                tracing::warn!(error = %e, "probe task failed, endpoint left unchanged");
                (e.id(), None)
            }
        };
        let Some(url) = in_flight.remove(&id) else {
            tracing::warn!(task = %id, "finished probe task has no endpoint");
            continue;
        };

        if let Some(m) = &measurement {
            table.apply(&url, m, engine);
        }
        let completed = outcome.results.len() + outcome.failed.len() + 1;
        tracing::debug!(
            %url,
            completed,
            total,
            status = measurement.map(|m| m.status_code),
            "probe complete"
        );
        if let Some((tx, position)) = progress {
            let _ = tx.try_send(BatchProgress {
                position,
                content_ref: content_ref.to_string(),
                completed,
                total,
                url: url.clone(),
                measurement,
            });
        }
        match measurement {
            Some(m) => outcome.results.push((url, m)),
            None => outcome.failed.push(url),
        }
    }

    outcome.elapsed = started.elapsed();
    tracing::info!(
        content_ref,
        probed = outcome.results.len(),
        successes = outcome.successes(),
        failed = outcome.failed.len(),
        elapsed_secs = outcome.elapsed.as_secs_f64(),
        "batch finished"
    );
    outcome
}
