use crate::{config::MetricsConfig, error::TelemetryError};
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::fmt;

/// Metric emitter pushing line-protocol samples to the configured sink
///
/// Delivery is best-effort: each `emit` hands one line to a spawned task and
/// returns immediately. No retry, no backpressure; sample loss under a sink
/// outage is accepted.
#[derive(Debug, Clone)]
pub struct MetricEmitter {
    config: MetricsConfig,
    client: reqwest::Client,
}

impl MetricEmitter {
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Format and push one sample
    pub fn emit(&self, name: &str, value: impl fmt::Display, tags: &[(&str, &str)]) {
        let line = self.format_line(name, &value.to_string(), tags);

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(metric = name, "no async runtime available, dropping sample");
                return;
            }
        };

        let client = self.client.clone();
        let url = self.config.url.clone();
        let auth = format!(
            "Basic {}",
            general_purpose::STANDARD.encode(&self.config.api_key)
        );
        let metric = name.to_string();

        handle.spawn(async move {
            if let Err(e) = push_metric(&client, &url, &auth, line).await {
                tracing::warn!(metric = %metric, error = %e, "failed to push metric to sink");
            }
        });
    }

    /// Build the line-protocol string for one sample (exposed for tests)
    ///
    /// `name,source=<src>[,tag=val...] value=<v> <timestamp_ns>` — the source
    /// tag always comes first, then the caller's tags in the given order. The
    /// timestamp is the millisecond epoch scaled to nanoseconds.
    pub fn format_line(&self, name: &str, value: &str, tags: &[(&str, &str)]) -> String {
        let timestamp = chrono::Utc::now().timestamp_millis() * 1_000_000;

        let mut tag_string = format!("source={}", self.config.source);
        for (key, val) in tags {
            tag_string.push_str(&format!(",{}={}", key, val));
        }

        format!("{},{} value={} {}", name, tag_string, value, timestamp)
    }
}

async fn push_metric(
    client: &reqwest::Client,
    url: &str,
    auth: &str,
    line: String,
) -> Result<(), TelemetryError> {
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "text/plain")
        .header(AUTHORIZATION, auth)
        .body(line)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(TelemetryError::SinkRejected { status, body });
    }

    Ok(())
}
