use thiserror::Error;

/// Telemetry pipeline error types
///
/// These never reach API clients: every send path catches them, reports via
/// `tracing`, and drops the payload (best-effort delivery).
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Sink answered with a non-2xx status
    #[error("sink rejected push with status {status}: {body}")]
    SinkRejected { status: u16, body: String },

    /// Transport-level failure reaching the sink
    #[error("sink unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Payload could not be serialized
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = TelemetryError::SinkRejected {
            status: 401,
            body: "bad credentials".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "sink rejected push with status 401: bad credentials"
        );
    }
}
