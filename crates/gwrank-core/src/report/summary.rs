//! Campaign summary: top endpoints, aggregate statistics and a throughput histogram.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::rank::RankedEntry;

use super::batch::BatchStats;
use super::{format_opt, format_rate, REPORT_TIME_FORMAT};

/// Endpoint counts by average throughput (KB/s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ThroughputHistogram {
    /// Above 1000.
    pub very_fast: usize,
    /// 500 to 1000, both inclusive.
    pub fast: usize,
    /// 200 up to 500.
    pub medium: usize,
    /// 50 up to 200.
    pub slow: usize,
    /// Below 50.
    pub very_slow: usize,
}

impl ThroughputHistogram {
    pub fn from_throughputs(values: impl IntoIterator<Item = f64>) -> Self {
        let mut h = Self::default();
        for kbs in values {
            if kbs > 1000.0 {
                h.very_fast += 1;
            } else if kbs >= 500.0 {
                h.fast += 1;
            } else if kbs >= 200.0 {
                h.medium += 1;
            } else if kbs >= 50.0 {
                h.slow += 1;
            } else {
                h.very_slow += 1;
            }
        }
        h
    }

    pub fn total(&self) -> usize {
        self.very_fast + self.fast + self.medium + self.slow + self.very_slow
    }

    /// Bucket labels with counts, fastest first.
    pub fn buckets(&self) -> [(&'static str, usize); 5] {
        [
            ("> 1000 KB/s", self.very_fast),
            ("500-1000 KB/s", self.fast),
            ("200-500 KB/s", self.medium),
            ("50-200 KB/s", self.slow),
            ("< 50 KB/s", self.very_slow),
        ]
    }
}

/// Everything the summary report prints, computed from a ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSummary {
    pub top: Vec<RankedEntry>,
    pub total_endpoints: usize,
    /// Endpoints with at least one valid test.
    pub active_endpoints: usize,
    /// Mean of the positive average throughputs of active endpoints.
    pub avg_throughput_kbs: Option<f64>,
    pub max_throughput_kbs: Option<f64>,
    pub avg_response_time_ms: Option<f64>,
    pub min_response_time_ms: Option<f64>,
    pub avg_success_rate: Option<f64>,
    pub histogram: ThroughputHistogram,
    /// Per content reference batch statistics, in probe order.
    pub batches: Vec<(String, BatchStats)>,
}

impl CampaignSummary {
    pub fn from_ranked(ranked: &[RankedEntry], top_n: usize) -> Self {
        let active: Vec<&RankedEntry> = ranked.iter().filter(|e| e.valid_test_count > 0).collect();

        let avg_speeds: Vec<f64> = active
            .iter()
            .map(|e| e.avg_throughput)
            .filter(|v| *v > 0.0)
            .collect();
        let (avg_throughput_kbs, max_throughput_kbs) = if avg_speeds.is_empty() {
            (None, None)
        } else {
            (
                Some(avg_speeds.iter().sum::<f64>() / avg_speeds.len() as f64),
                Some(active.iter().map(|e| e.max_throughput).fold(0.0, f64::max)),
            )
        };

        let times: Vec<f64> = active.iter().filter_map(|e| e.response_time_ms).collect();
        let avg_response_time_ms = mean(&times);
        let min_response_time_ms = times.iter().copied().reduce(f64::min);

        let rates: Vec<f64> = active.iter().map(|e| e.success_rate).collect();

        Self {
            top: ranked.iter().take(top_n).cloned().collect(),
            total_endpoints: ranked.len(),
            active_endpoints: active.len(),
            avg_throughput_kbs,
            max_throughput_kbs,
            avg_response_time_ms,
            min_response_time_ms,
            avg_success_rate: mean(&rates),
            histogram: ThroughputHistogram::from_throughputs(active.iter().map(|e| e.avg_throughput)),
            batches: Vec::new(),
        }
    }

    /// Attaches the statistics of the batches run for this summary.
    pub fn with_batches(mut self, batches: Vec<(String, BatchStats)>) -> Self {
        self.batches = batches;
        self
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn render_summary(
    content_refs: &[String],
    summary: &CampaignSummary,
    generated_at: NaiveDateTime,
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut out, content_refs, summary, generated_at);
    out
}

fn write_summary(
    out: &mut String,
    content_refs: &[String],
    summary: &CampaignSummary,
    generated_at: NaiveDateTime,
) -> std::fmt::Result {
    writeln!(out, "=== Gateway campaign summary ===")?;
    writeln!(out)?;
    writeln!(out, "Generated: {}", generated_at.format(REPORT_TIME_FORMAT))?;
    writeln!(out, "Content refs: {}", content_refs.len())?;
    for r in content_refs {
        writeln!(out, "  {r}")?;
    }

    writeln!(out)?;
    writeln!(out, "=== Top {} endpoints ===", summary.top.len())?;
    writeln!(
        out,
        "{:<50} {:>7} {:>9} {:>9} {:>11} {:>11} {:>11}",
        "ENDPOINT", "WEIGHT", "SUCCESS", "RT(ms)", "AVG KB/s", "MAX KB/s", "INSTABILITY"
    )?;
    writeln!(out, "{}", "-".repeat(115))?;
    for e in &summary.top {
        writeln!(
            out,
            "{:<50} {:>7.3} {:>9} {:>9} {:>11.1} {:>11.1} {:>11.2}",
            e.url,
            e.weight,
            format_rate(e.success_rate, e.valid_test_count),
            format_opt(e.response_time_ms, 1),
            e.avg_throughput,
            e.max_throughput,
            e.speed_stability,
        )?;
    }

    if !summary.batches.is_empty() {
        writeln!(out)?;
        writeln!(out, "=== Batches ===")?;
        for (content_ref, stats) in &summary.batches {
            writeln!(out)?;
            writeln!(out, "Content: {content_ref}")?;
            stats.write_to(out)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "=== Endpoint statistics ===")?;
    writeln!(out, "Total endpoints:   {}", summary.total_endpoints)?;
    writeln!(out, "Active endpoints:  {}", summary.active_endpoints)?;
    if let (Some(avg), Some(max)) = (summary.avg_throughput_kbs, summary.max_throughput_kbs) {
        writeln!(out, "Avg throughput:    {avg:.2} KB/s")?;
        writeln!(out, "Max throughput:    {max:.2} KB/s")?;
    }
    if let (Some(avg), Some(min)) = (summary.avg_response_time_ms, summary.min_response_time_ms) {
        writeln!(out, "Avg response time: {avg:.2} ms")?;
        writeln!(out, "Min response time: {min:.2} ms")?;
    }
    if let Some(rate) = summary.avg_success_rate {
        writeln!(out, "Avg success rate:  {:.2}%", rate * 100.0)?;
    }

    if summary.active_endpoints > 0 {
        writeln!(out)?;
        writeln!(out, "=== Throughput distribution ===")?;
        let total = summary.histogram.total().max(1) as f64;
        for (label, count) in summary.histogram.buckets() {
            writeln!(
                out,
                "{label:<14} {count:>5} endpoints ({:.1}%)",
                count as f64 / total * 100.0
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::rank::rank;
    use crate::scoring::{EndpointRecord, LastMeasurement};

    fn probed(url: &str, weight: f64, history: &[f64], rt: f64, valid: u64, ok: u64) -> EndpointRecord {
        let mut r = EndpointRecord::new(url, false);
        r.weight = weight;
        r.throughput_history = history.iter().copied().collect::<VecDeque<_>>();
        r.avg_throughput = crate::scoring::positive_mean(history.iter().copied());
        r.last_measurement = Some(LastMeasurement {
            response_time_ms: rt,
            status_code: 206,
            throughput_kbs: history.last().copied().unwrap_or(0.0),
            timestamp: Utc::now(),
        });
        r.total_attempts = valid;
        r.valid_test_count = valid;
        r.success_count = ok;
        r
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 0))
            .unwrap()
    }

    #[test]
    fn histogram_bucket_edges() {
        let h = ThroughputHistogram::from_throughputs([
            1000.5, 1000.0, 500.0, 499.9, 200.0, 199.9, 50.0, 49.9, 0.0,
        ]);
        assert_eq!(h.very_fast, 1);
        assert_eq!(h.fast, 2);
        assert_eq!(h.medium, 2);
        assert_eq!(h.slow, 2);
        assert_eq!(h.very_slow, 2);
        assert_eq!(h.total(), 9);
    }

    #[test]
    fn summary_aggregates_active_endpoints_only() {
        let ranked = rank(&[
            probed("https://a.example", 0.9, &[1200.0, 1400.0], 100.0, 2, 2),
            probed("https://b.example", 0.4, &[0.0, 300.0], 600.0, 2, 1),
            probed("https://c.example", 0.01, &[0.0], 1500.0, 1, 0),
            EndpointRecord::new("https://idle.example", false),
        ]);
        let s = CampaignSummary::from_ranked(&ranked, 2);
        assert_eq!(s.top.len(), 2);
        assert_eq!(s.top[0].url, "https://idle.example");
        assert_eq!(s.total_endpoints, 4);
        assert_eq!(s.active_endpoints, 3);
        // Positive averages: 1300 and 300.
        assert!((s.avg_throughput_kbs.unwrap() - 800.0).abs() < 1e-9);
        assert_eq!(s.max_throughput_kbs, Some(1400.0));
        assert!((s.avg_response_time_ms.unwrap() - 2200.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.min_response_time_ms, Some(100.0));
        assert!((s.avg_success_rate.unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(
            s.histogram,
            ThroughputHistogram {
                very_fast: 1,
                medium: 1,
                very_slow: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn summary_of_unprobed_table_has_no_aggregates() {
        let ranked = rank(&[EndpointRecord::new("https://a.example", true)]);
        let s = CampaignSummary::from_ranked(&ranked, 20);
        assert_eq!(s.active_endpoints, 0);
        assert!(s.avg_throughput_kbs.is_none());
        assert!(s.avg_success_rate.is_none());
        let text = render_summary(&["Qm1".to_string()], &s, at());
        assert!(text.contains("Active endpoints:  0"));
        assert!(!text.contains("Throughput distribution"));
    }

    #[test]
    fn render_includes_sections() {
        let ranked = rank(&[
            probed("https://a.example", 0.9, &[1200.0], 100.0, 1, 1),
            probed("https://b.example", 0.4, &[80.0], 600.0, 1, 1),
        ]);
        let s = CampaignSummary::from_ranked(&ranked, 20).with_batches(vec![(
            "QmOne".to_string(),
            BatchStats::from_ranked(&ranked),
        )]);
        let text = render_summary(&["QmOne".to_string(), "QmTwo".to_string()], &s, at());
        assert!(text.contains("Generated: 2024-03-09 14:05:00"));
        assert!(text.contains("Content refs: 2"));
        assert!(text.contains("=== Top 2 endpoints ==="));
        assert!(text.contains("Content: QmOne"));
        assert!(text.contains("> 1000 KB/s"));
        assert!(text.contains("50.0%"));
    }
}
