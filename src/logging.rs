use crate::{config::LoggingConfig, error::TelemetryError, redact::sanitize};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// Severity attached to each log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Derive a level from an HTTP response status
    pub fn from_status(status: u16) -> Self {
        if status >= 500 {
            Self::Error
        } else if status >= 400 {
            Self::Warn
        } else {
            Self::Info
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels identifying one log stream at the sink
#[derive(Debug, Serialize)]
pub struct StreamLabels {
    pub component: String,
    pub level: &'static str,
    #[serde(rename = "type")]
    pub event_type: String,
}

#[derive(Debug, Serialize)]
pub struct LogStream {
    pub stream: StreamLabels,
    /// `[timestamp_ns_as_string, sanitized_payload]` pairs
    pub values: Vec<[String; 2]>,
}

/// Push envelope accepted by the log sink
#[derive(Debug, Serialize)]
pub struct LogEvent {
    pub streams: Vec<LogStream>,
}

/// Log emitter pushing records to the configured sink
///
/// Every `log` call is fire-and-forget: the record is built synchronously and
/// handed to a spawned task for delivery. Delivery failures are reported via
/// `tracing` and dropped; logging never blocks the caller and never errors
/// into the request path.
#[derive(Debug, Clone)]
pub struct Logger {
    config: LoggingConfig,
    client: reqwest::Client,
}

impl Logger {
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Build and push one log record
    pub fn log(&self, level: LogLevel, event_type: &str, data: &Value) {
        let event = self.build_log_event(level, event_type, data);
        let body = match serde_json::to_string(&event) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize log event, dropping");
                return;
            }
        };

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("no async runtime available, dropping log event");
                return;
            }
        };

        let client = self.client.clone();
        let url = self.config.url.clone();
        let auth = format!("Bearer {}:{}", self.config.user_id, self.config.api_key);

        handle.spawn(async move {
            if let Err(e) = push_log(&client, &url, &auth, body).await {
                tracing::warn!(error = %e, "failed to push log to sink");
            }
        });
    }

    /// Assemble the push envelope for one record (exposed for tests)
    ///
    /// The timestamp is the millisecond epoch scaled to nanoseconds, so the
    /// six sub-millisecond digits are always zero.
    pub fn build_log_event(&self, level: LogLevel, event_type: &str, data: &Value) -> LogEvent {
        let labels = StreamLabels {
            component: self.config.source.clone(),
            level: level.as_str(),
            event_type: event_type.to_string(),
        };

        LogEvent {
            streams: vec![LogStream {
                stream: labels,
                values: vec![[now_ns_string(), sanitize(data)]],
            }],
        }
    }

    /// Log a SQL statement about to be executed
    pub fn log_sql_query(&self, query: &str, params: &[&str]) {
        self.log(
            LogLevel::Info,
            "sql",
            &json!({ "query": query, "params": params }),
        );
    }

    /// Log an outbound call to a collaborating service
    pub fn log_service_request(&self, service_name: &str, action: &str, input: &Value) {
        self.log(
            LogLevel::Info,
            "service",
            &json!({ "serviceName": service_name, "action": action, "input": input }),
        );
    }

    /// Log an unhandled error with its debug representation
    pub fn log_exception(&self, error: &dyn std::error::Error) {
        self.log(
            LogLevel::Error,
            "exception",
            &json!({ "message": error.to_string(), "stack": format!("{:?}", error) }),
        );
    }
}

fn now_ns_string() -> String {
    (chrono::Utc::now().timestamp_millis() * 1_000_000).to_string()
}

async fn push_log(
    client: &reqwest::Client,
    url: &str,
    auth: &str,
    body: String,
) -> Result<(), TelemetryError> {
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, auth)
        .body(body)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(TelemetryError::SinkRejected { status, body });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;

    fn test_logger() -> Logger {
        Logger::new(LoggingConfig {
            url: "http://localhost:3100/loki/api/v1/push".to_string(),
            user_id: "123456".to_string(),
            api_key: "test-key".to_string(),
            source: "jwt-pizza-service".to_string(),
        })
    }

    #[test]
    fn test_status_to_level_mapping() {
        assert_eq!(LogLevel::from_status(200), LogLevel::Info);
        assert_eq!(LogLevel::from_status(399), LogLevel::Info);
        assert_eq!(LogLevel::from_status(400), LogLevel::Warn);
        assert_eq!(LogLevel::from_status(404), LogLevel::Warn);
        assert_eq!(LogLevel::from_status(499), LogLevel::Warn);
        assert_eq!(LogLevel::from_status(500), LogLevel::Error);
        assert_eq!(LogLevel::from_status(599), LogLevel::Error);
    }

    #[test]
    fn test_build_log_event_shape() {
        let logger = test_logger();
        let event = logger.build_log_event(
            LogLevel::Warn,
            "http",
            &json!({ "path": "/api/order", "password": "secret" }),
        );

        assert_eq!(event.streams.len(), 1);
        let stream = &event.streams[0];
        assert_eq!(stream.stream.component, "jwt-pizza-service");
        assert_eq!(stream.stream.level, "warn");
        assert_eq!(stream.stream.event_type, "http");
        assert_eq!(stream.values.len(), 1);

        // Timestamp is a nanosecond epoch string with zero sub-millisecond digits
        let ts = &stream.values[0][0];
        assert!(ts.ends_with("000000"));
        assert!(ts.parse::<i64>().unwrap() > 0);

        // Payload is the sanitized serialization
        let payload = &stream.values[0][1];
        assert!(payload.contains("/api/order"));
        assert!(!payload.contains("secret"));
        assert!(payload.contains("*****"));
    }

    #[test]
    fn test_envelope_serializes_with_sink_field_names() {
        let logger = test_logger();
        let event = logger.build_log_event(LogLevel::Info, "sql", &json!({ "query": "SELECT 1" }));

        let value = serde_json::to_value(&event).unwrap();
        assert!(value["streams"][0]["stream"]["type"] == "sql");
        assert!(value["streams"][0]["stream"]["component"] == "jwt-pizza-service");
        assert!(value["streams"][0]["values"][0].is_array());
    }

    #[tokio::test]
    async fn test_log_never_panics_without_sink() {
        // Sink is unreachable; log must swallow the failure.
        let logger = test_logger();
        logger.log(LogLevel::Info, "service", &json!({ "action": "noop" }));
        logger.log_sql_query("SELECT * FROM menu", &[]);
        logger.log_service_request("factory", "order", &json!({ "pizzas": 2 }));
    }
}
