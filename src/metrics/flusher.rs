use super::{system, MetricAggregator, MetricEmitter};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// Spawn the periodic flush task
///
/// Drains the aggregator and pushes one sample per metric every `period`
/// (default 10 s via config). A failing or panicking cycle is logged and the
/// timer keeps running. The task lives for the process lifetime; there is no
/// shutdown drain of in-flight sends, only the returned handle to abort the
/// timer itself.
pub fn spawn_flush_task(
    aggregator: Arc<MetricAggregator>,
    emitter: Arc<MetricEmitter>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        flush_loop(aggregator, emitter, period).await;
    })
}

async fn flush_loop(aggregator: Arc<MetricAggregator>, emitter: Arc<MetricEmitter>, period: Duration) {
    let mut interval = time::interval(period);
    // The first tick fires immediately; skip it so counters get a full window.
    interval.tick().await;

    loop {
        interval.tick().await;

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            flush_once(&aggregator, &emitter);
        }));
        if let Err(e) = result {
            tracing::error!(panic = ?e, "metrics flush cycle panicked");
        }
    }
}

/// Drain the aggregator and emit one cycle of samples, in fixed order
///
/// Public so tests (and manual triggering) can drive a flush without the
/// timer. Emission is fire-and-forget; this only guarantees the drain/reset
/// and the order in which samples are handed off.
pub fn flush_once(aggregator: &MetricAggregator, emitter: &MetricEmitter) {
    for (method, count) in aggregator.drain_requests() {
        emitter.emit("http_requests", count, &[("method", method.as_str())]);
    }

    emitter.emit("active_users", aggregator.active_user_count(), &[]);

    let auth = aggregator.drain_auth();
    emitter.emit("auth_success", auth.success, &[]);
    emitter.emit("auth_failure", auth.failure, &[]);

    let purchases = aggregator.drain_purchases();
    emitter.emit("pizza_success", purchases.success, &[]);
    emitter.emit("pizza_failure", purchases.failure, &[]);
    emitter.emit("pizza_revenue", format!("{:.2}", purchases.revenue), &[]);
    match purchases.average_latency() {
        Some(average) => emitter.emit("pizza_latency", format!("{:.2}", average), &[]),
        None => emitter.emit("pizza_latency", 0, &[]),
    }

    emitter.emit("cpu_usage", system::cpu_usage_percentage(), &[]);
    emitter.emit("memory_usage", system::memory_usage_percentage(), &[]);
}
