use crate::{
    logging::{LogLevel, Logger},
    metrics::{MetricAggregator, MetricEmitter},
};
use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};
use std::{sync::Arc, time::Instant};

/// Authenticated identity attached to the request by the host service's auth
/// middleware; used for active-user tracking
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
}

/// Shared state for the request-tracker middleware
#[derive(Clone)]
pub struct MetricsState {
    pub aggregator: Arc<MetricAggregator>,
    pub emitter: Arc<MetricEmitter>,
}

/// HTTP access-log middleware
///
/// Buffers the request and response bodies, logs one `http` record with a
/// level derived from the response status, and hands the response back
/// unchanged. Transparent by construction: logging is fire-and-forget and a
/// body that cannot be buffered degrades to an empty captured body rather
/// than failing the request.
pub async fn http_logger(State(logger): State<Arc<Logger>>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let authorized = parts.headers.contains_key(header::AUTHORIZATION);
    let path = parts.uri.path().to_string();
    let method = parts.method.to_string();

    let req_bytes = buffer_body(body).await;
    let req = Request::from_parts(parts, Body::from(req_bytes.clone()));

    let response = next.run(req).await;

    let (parts, body) = response.into_parts();
    let res_bytes = buffer_body(body).await;
    let status = parts.status.as_u16();

    let log_data = json!({
        "authorized": authorized,
        "path": path,
        "method": method,
        "statusCode": status,
        "reqBody": body_to_value(&req_bytes),
        "resBody": body_to_value(&res_bytes),
    });
    logger.log(LogLevel::from_status(status), "http", &log_data);

    Response::from_parts(parts, Body::from(res_bytes))
}

/// Request-tracker middleware
///
/// Bumps the per-method counter (and the active-user set for authenticated
/// requests) on entry, and emits an `http_request_latency` sample as soon as
/// the response is produced — latency does not wait for the periodic flush.
pub async fn request_tracker(State(state): State<MetricsState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user = req.extensions().get::<AuthUser>().map(|u| u.email.clone());

    state.aggregator.track_request(&method, user.as_deref());

    let start = Instant::now();
    let response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    state.emitter.emit(
        "http_request_latency",
        latency_ms,
        &[("method", method.as_str()), ("path", path.as_str())],
    );

    response
}

async fn buffer_body(body: Body) -> Bytes {
    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "failed to buffer body for access log");
            Bytes::new()
        }
    }
}

/// Capture a body for logging: parsed JSON when it is JSON (so redaction can
/// walk it), otherwise the raw text
fn body_to_value(bytes: &Bytes) -> Value {
    if bytes.is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_to_value_parses_json() {
        let bytes = Bytes::from_static(b"{\"email\":\"d@jwt.com\"}");
        let value = body_to_value(&bytes);
        assert_eq!(value["email"], "d@jwt.com");
    }

    #[test]
    fn test_body_to_value_falls_back_to_text() {
        let bytes = Bytes::from_static(b"not json");
        assert_eq!(body_to_value(&bytes), Value::String("not json".to_string()));

        assert_eq!(body_to_value(&Bytes::new()), Value::String(String::new()));
    }
}
