use dashmap::{DashMap, DashSet};
use std::sync::{Mutex, MutexGuard};

/// Auth outcome counters for one flush window
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AuthAttempts {
    pub success: u64,
    pub failure: u64,
}

/// Purchase outcome stats for one flush window
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PurchaseStats {
    pub success: u64,
    pub failure: u64,
    pub revenue: f64,
    pub latencies: Vec<f64>,
}

impl PurchaseStats {
    /// Arithmetic mean of the collected latencies, `None` with no samples
    pub fn average_latency(&self) -> Option<f64> {
        if self.latencies.is_empty() {
            return None;
        }
        Some(self.latencies.iter().sum::<f64>() / self.latencies.len() as f64)
    }
}

/// In-process metric state, drained once per flush interval
///
/// Explicitly owned: construct one at startup and share it via `Arc` with the
/// request-tracker middleware, the route handlers and the flush task. Tests
/// get isolation by constructing a fresh instance.
///
/// All structures are synchronized because the runtime is multi-threaded;
/// increments are independent, so per-structure locking is enough.
#[derive(Debug, Default)]
pub struct MetricAggregator {
    requests: DashMap<String, u64>,
    active_users: DashSet<String>,
    auth: Mutex<AuthAttempts>,
    purchases: Mutex<PurchaseStats>,
}

impl MetricAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an inbound request and, when authenticated, its user identity
    pub fn track_request(&self, method: &str, user: Option<&str>) {
        *self.requests.entry(method.to_string()).or_insert(0) += 1;

        if let Some(user) = user {
            self.active_users.insert(user.to_string());
        }
    }

    /// Count a login/registration outcome
    pub fn record_auth_attempt(&self, success: bool) {
        let mut auth = lock(&self.auth);
        if success {
            auth.success += 1;
        } else {
            auth.failure += 1;
        }
    }

    /// Count a pizza purchase outcome
    ///
    /// Latency and cost are only recorded for successful purchases; a failed
    /// purchase bumps the failure counter and nothing else.
    pub fn record_purchase(&self, success: bool, latency_ms: f64, cost: f64) {
        let mut purchases = lock(&self.purchases);
        if success {
            purchases.success += 1;
            purchases.revenue += cost;
            purchases.latencies.push(latency_ms);
        } else {
            purchases.failure += 1;
        }
    }

    /// Number of distinct authenticated users seen since process start
    ///
    /// Deliberately cumulative: the set is never cleared on flush, unlike the
    /// windowed counters.
    pub fn active_user_count(&self) -> usize {
        self.active_users.len()
    }

    /// Read and zero the per-method request counters
    ///
    /// Keys are retained at zero so known methods keep reporting, and the
    /// result is sorted by method for a deterministic emission order.
    pub fn drain_requests(&self) -> Vec<(String, u64)> {
        let mut drained = Vec::with_capacity(self.requests.len());
        for mut entry in self.requests.iter_mut() {
            let count = *entry.value();
            *entry.value_mut() = 0;
            drained.push((entry.key().clone(), count));
        }
        drained.sort();
        drained
    }

    /// Read and reset the auth counters
    pub fn drain_auth(&self) -> AuthAttempts {
        std::mem::take(&mut *lock(&self.auth))
    }

    /// Read and reset the purchase stats
    pub fn drain_purchases(&self) -> PurchaseStats {
        std::mem::take(&mut *lock(&self.purchases))
    }
}

// Telemetry state must never poison the request path; recover the guard
// instead of panicking.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
