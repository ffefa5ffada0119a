//! Writes rendered reports under the report directory.
//!
//! Every report lands twice: a timestamped file that is never overwritten
//! within the same second, and a `*_latest.log` copy that always is.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::rank::RankedEntry;

use super::{render_batch_report, render_summary, CampaignSummary, FILE_TIME_FORMAT};

#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `batch_<ref>_<ts>.log` and `batch_latest.log`. Returns the timestamped path.
    pub fn write_batch(
        &self,
        content_ref: &str,
        ranked: &[RankedEntry],
        generated_at: NaiveDateTime,
    ) -> Result<PathBuf> {
        let text = render_batch_report(content_ref, ranked, generated_at);
        let name = format!(
            "batch_{}_{}.log",
            file_safe(content_ref),
            generated_at.format(FILE_TIME_FORMAT)
        );
        self.write_pair(&name, "batch_latest.log", &text)
    }

    /// Writes `summary_<ts>.log` and `summary_latest.log`. Returns the timestamped path.
    pub fn write_summary(
        &self,
        content_refs: &[String],
        summary: &CampaignSummary,
        generated_at: NaiveDateTime,
    ) -> Result<PathBuf> {
        let text = render_summary(content_refs, summary, generated_at);
        let name = format!("summary_{}.log", generated_at.format(FILE_TIME_FORMAT));
        self.write_pair(&name, "summary_latest.log", &text)
    }

    fn write_pair(&self, name: &str, latest: &str, text: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create report dir: {}", self.dir.display()))?;
        let path = self.dir.join(name);
        fs::write(&path, text).with_context(|| format!("write report: {}", path.display()))?;
        let latest = self.dir.join(latest);
        fs::write(&latest, text).with_context(|| format!("write report: {}", latest.display()))?;
        tracing::debug!(path = %path.display(), "report written");
        Ok(path)
    }
}

/// Content references are used in file names; anything outside `[A-Za-z0-9._-]` becomes `_`.
fn file_safe(content_ref: &str) -> String {
    content_ref
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
