use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and register all application metrics.
/// The returned handle's `render()` produces the scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;

    // Pre-register counters so they appear even before the first increment.
    counter!("model_call_failures_total").absolute(0);
    counter!("bets_committed_total").absolute(0);
    for confidence in ["full", "partial", "fallback"] {
        counter!("predictions_parsed_total", "confidence" => confidence).absolute(0);
    }

    gauge!("bankroll_current_amount").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("pipeline_latency_seconds").record(0.0);

    Ok(handle)
}
