//! Scoring engine.
//!
//! Turns a stream of noisy probe results into one stable weight per endpoint:
//! an exponential moving average of 206-success, raised to `beta`, derated by
//! a latency penalty and a throughput penalty, floored at `w_min`. The update
//! is a pure function of (record, measurement); all constants come from an
//! immutable [`ScoringParams`].

mod engine;
mod params;
mod record;

pub use engine::{ScoringEngine, WeightBreakdown, MAX_THROUGHPUT_KBS};
pub use params::ScoringParams;
pub use record::{positive_mean, push_bounded, EndpointRecord, LastMeasurement, INITIAL_SCORE};
