//! Probe orchestration: one bounded-concurrency batch per content reference,
//! and campaigns that repeat batches over several references and epochs.
//!
//! The batch loop is the only writer of the endpoint table. Probes run on the
//! blocking pool; their results come back through a `JoinSet` and are scored
//! one at a time in completion order.

mod batch;
mod campaign;
mod progress;

pub use batch::{run_batch, BatchOutcome};
pub use campaign::{run_campaign, CampaignOutputs, CampaignPlan, CampaignResult};
pub use progress::{BatchFinished, BatchPosition, BatchProgress};
