//! `gwrank probe <endpoint>` – one probe, printed; saved state is not touched.

use anyhow::{Context, Result};
use gwrank_core::config::GwrankConfig;
use gwrank_core::probe::{CurlProbe, Probe};
use gwrank_core::scoring::{EndpointRecord, ScoringEngine, ScoringParams};

pub async fn run_probe(cfg: &GwrankConfig, endpoint: &str, cid: Option<&str>) -> Result<()> {
    let prober = CurlProbe::from_config(cfg);
    let content_ref = cid.unwrap_or(&cfg.default_content_ref).to_string();
    let endpoint = endpoint.to_string();
    let (prober, endpoint, measurement) = tokio::task::spawn_blocking(move || {
        let m = prober.probe(&endpoint, &content_ref);
        (prober, endpoint, m)
    })
    .await
    .context("probe task join")?;

    let engine = ScoringEngine::new(ScoringParams::from_config(&cfg.scoring()));
    let scored = engine.update(&EndpointRecord::new(endpoint.as_str(), false), &measurement);

    println!("Endpoint:       {}", endpoint);
    println!("Timeout:        {}s", prober.options().timeout.as_secs());
    println!("Status:         {}", measurement.status_code);
    println!("Response time:  {:.1} ms", measurement.response_time_ms);
    println!(
        "Throughput:     {:.1} KB/s",
        measurement.throughput_bytes_per_sec / 1024.0
    );
    println!("Bytes received: {}", measurement.bytes_received);
    println!("Weight (fresh): {:.3}", scored.weight);
    if measurement.is_worst_case() {
        println!("Probe failed or timed out.");
    }
    Ok(())
}
