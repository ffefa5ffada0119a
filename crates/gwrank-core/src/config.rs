use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Content reference probed when a campaign names none (an empty directory object).
pub const DEFAULT_CONTENT_REF: &str = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn";

/// Scoring constants (optional `[scoring]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// EMA window N; the smoothing factor is 2 / (N + 1).
    pub window: u32,
    /// Exponent applied to the success EMA before penalties.
    pub beta: f64,
    /// Floor for the final weight.
    pub w_min: f64,
    /// Time penalty at the response-time cap (0 < base_ln <= 1).
    pub base_ln: f64,
    /// Speed penalty as throughput approaches zero (0 < k_speed <= 1).
    pub k_speed: f64,
    /// Number of throughput and weight samples kept per endpoint.
    pub history_len: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            window: 10,
            beta: 2.0,
            w_min: 0.001,
            base_ln: 0.8,
            k_speed: 0.7,
            history_len: 10,
        }
    }
}

/// How the probe reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeBackend {
    /// libcurl in-process (one Easy handle per probe on the blocking pool).
    #[default]
    Easy,
    /// External `curl` executable; the four-field `-w` trailer is parsed.
    Command,
}

/// What happens to persisted endpoints that no longer appear in either seed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    #[default]
    Retain,
    Prune,
}

/// Global configuration loaded from `~/.config/gwrank/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GwrankConfig {
    /// Maximum number of probes in flight at once.
    pub max_concurrent_probes: usize,
    /// Hard wall-clock bound for a single probe.
    pub probe_timeout_secs: u64,
    /// Last byte (inclusive) of the requested range `0-N`.
    pub probe_range_end: u64,
    /// Path segment between the gateway base URL and the content reference.
    pub content_path: String,
    /// Content reference used when a campaign names none.
    pub default_content_ref: String,
    /// Content references probed by `gwrank run` when none are given on the command line.
    #[serde(default)]
    pub content_refs: Vec<String>,
    /// Full passes over all content references.
    pub epochs: u32,
    /// Pause between epochs.
    pub cooldown_secs: u64,
    /// Rows in the summary report's top table.
    pub report_top_n: usize,
    #[serde(default)]
    pub stale_endpoints: StalePolicy,
    #[serde(default)]
    pub probe_backend: ProbeBackend,
    /// Executable used by the `command` backend.
    #[serde(default = "default_curl_program")]
    pub curl_program: String,
    /// Primary gateway list (one base URL per line).
    #[serde(default)]
    pub primary_list: Option<PathBuf>,
    /// Secondary gateway list.
    #[serde(default)]
    pub secondary_list: Option<PathBuf>,
    /// Endpoint state table (JSON).
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    /// Directory for per-batch and summary reports.
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
    /// Optional scoring constants; if missing, built-in defaults are used.
    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
}

fn default_curl_program() -> String {
    "curl".to_string()
}

impl Default for GwrankConfig {
    fn default() -> Self {
        Self {
            max_concurrent_probes: 50,
            probe_timeout_secs: 15,
            probe_range_end: 1_048_576,
            content_path: "ipfs".to_string(),
            default_content_ref: DEFAULT_CONTENT_REF.to_string(),
            content_refs: Vec::new(),
            epochs: 3,
            cooldown_secs: 2,
            report_top_n: 20,
            stale_endpoints: StalePolicy::Retain,
            probe_backend: ProbeBackend::Easy,
            curl_program: default_curl_program(),
            primary_list: None,
            secondary_list: None,
            state_file: None,
            report_dir: None,
            scoring: None,
        }
    }
}

impl GwrankConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn scoring(&self) -> ScoringConfig {
        self.scoring.clone().unwrap_or_default()
    }

    /// Resolved on-disk locations, filling unset paths from the XDG directories.
    pub fn paths(&self) -> Result<GwrankPaths> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("gwrank")?;
        let config_home = xdg_dirs.get_config_home();
        let state_home = xdg_dirs.get_state_home();
        Ok(self.paths_under(&config_home, &state_home))
    }

    pub fn paths_under(&self, config_home: &Path, state_home: &Path) -> GwrankPaths {
        GwrankPaths {
            primary_list: self
                .primary_list
                .clone()
                .unwrap_or_else(|| config_home.join("gateways_primary.txt")),
            secondary_list: self
                .secondary_list
                .clone()
                .unwrap_or_else(|| config_home.join("gateways_secondary.txt")),
            state_file: self
                .state_file
                .clone()
                .unwrap_or_else(|| state_home.join("endpoints.json")),
            report_dir: self
                .report_dir
                .clone()
                .unwrap_or_else(|| state_home.join("reports")),
        }
    }
}

/// Files and directories used by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GwrankPaths {
    pub primary_list: PathBuf,
    pub secondary_list: PathBuf,
    pub state_file: PathBuf,
    pub report_dir: PathBuf,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("gwrank")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GwrankConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GwrankConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<GwrankConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: GwrankConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
