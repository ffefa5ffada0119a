//! Immutable scoring constants with their derived coefficients.

use crate::config::ScoringConfig;

/// Constants for the weight update, fixed for the lifetime of a [`ScoringEngine`](super::ScoringEngine).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    window: u32,
    alpha: f64,
    beta: f64,
    w_min: f64,
    base_ln: f64,
    k_time: f64,
    k_speed: f64,
    k_speed_logistic: f64,
    history_len: usize,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl ScoringParams {
    /// Derives the coefficients. Out-of-range inputs are pulled back to the
    /// nearest usable value rather than rejected.
    pub fn from_config(cfg: &ScoringConfig) -> Self {
        let window = cfg.window.max(1);
        let base_ln = sanitize_unit(cfg.base_ln, 0.8);
        let k_speed = sanitize_unit(cfg.k_speed, 0.7);
        let beta = if cfg.beta.is_finite() && cfg.beta > 0.0 {
            cfg.beta
        } else {
            2.0
        };
        let w_min = if cfg.w_min.is_finite() && cfg.w_min > 0.0 {
            cfg.w_min.min(1.0)
        } else {
            0.001
        };
        Self {
            window,
            alpha: 2.0 / (window as f64 + 1.0),
            beta,
            w_min,
            base_ln,
            k_time: -base_ln.ln(),
            k_speed,
            k_speed_logistic: 1.0 / k_speed - 1.0,
            history_len: cfg.history_len.max(1),
        }
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    /// EMA smoothing factor, 2 / (N + 1).
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn w_min(&self) -> f64 {
        self.w_min
    }

    pub fn base_ln(&self) -> f64 {
        self.base_ln
    }

    /// -ln(base_ln).
    pub fn k_time(&self) -> f64 {
        self.k_time
    }

    pub fn k_speed(&self) -> f64 {
        self.k_speed
    }

    /// 1 / k_speed - 1.
    pub fn k_speed_logistic(&self) -> f64 {
        self.k_speed_logistic
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }
}

fn sanitize_unit(v: f64, fallback: f64) -> f64 {
    if v.is_finite() && v > 0.0 && v <= 1.0 {
        v
    } else {
        fallback
    }
}
