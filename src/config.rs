use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Log sink settings (Loki-style push endpoint)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub url: String,
    pub user_id: String,
    pub api_key: String,
    /// Reported as the `component` label on every log record
    pub source: String,
}

/// Metrics sink settings (line-protocol push endpoint)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    pub url: String,
    pub api_key: String,
    /// Injected as the first tag on every metric line
    pub source: String,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

fn default_flush_interval_ms() -> u64 {
    10_000
}

pub fn load_config() -> anyhow::Result<TelemetryConfig> {
    let config = config::Config::builder()
        .add_source(config::File::with_name("telemetry").required(false))
        .add_source(config::Environment::with_prefix("PIZZA_TELEMETRY").separator("__"))
        .build()?;

    let cfg: TelemetryConfig = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &TelemetryConfig) -> anyhow::Result<()> {
    if cfg.logging.url.is_empty() {
        anyhow::bail!("logging.url must not be empty");
    }

    if cfg.logging.user_id.is_empty() || cfg.logging.api_key.is_empty() {
        anyhow::bail!("logging.user_id and logging.api_key must be configured");
    }

    if cfg.logging.source.is_empty() {
        anyhow::bail!("logging.source must not be empty");
    }

    if cfg.metrics.url.is_empty() {
        anyhow::bail!("metrics.url must not be empty");
    }

    if cfg.metrics.api_key.is_empty() {
        anyhow::bail!("metrics.api_key must be configured");
    }

    if cfg.metrics.source.is_empty() {
        anyhow::bail!("metrics.source must not be empty");
    }

    if cfg.metrics.flush_interval_ms == 0 {
        anyhow::bail!("metrics.flush_interval_ms must be greater than zero");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config_accepts_complete_config() {
        let cfg = create_test_config();
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_validate_config_rejects_empty_log_url() {
        let mut cfg = create_test_config();
        cfg.logging.url.clear();

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("logging.url must not be empty"));
    }

    #[test]
    fn test_validate_config_rejects_missing_credentials() {
        let mut cfg = create_test_config();
        cfg.metrics.api_key.clear();

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("metrics.api_key must be configured"));
    }

    #[test]
    fn test_validate_config_rejects_zero_flush_interval() {
        let mut cfg = create_test_config();
        cfg.metrics.flush_interval_ms = 0;

        assert!(validate_config(&cfg).is_err());
    }

    fn create_test_config() -> TelemetryConfig {
        TelemetryConfig {
            logging: LoggingConfig {
                url: "http://localhost:3100/loki/api/v1/push".to_string(),
                user_id: "123456".to_string(),
                api_key: "test-log-key".to_string(),
                source: "jwt-pizza-service".to_string(),
            },
            metrics: MetricsConfig {
                url: "http://localhost:8086/api/v2/write".to_string(),
                api_key: "test-metrics-key".to_string(),
                source: "jwt-pizza-service".to_string(),
                flush_interval_ms: 10_000,
            },
        }
    }
}
