//! Echo-forwarding handler.
//!
//! Parses `value` and `count` from the form, issues `count` sequential echo
//! calls and answers with one line per call: the echoed value or the error.

use std::time::Duration;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tonic::Status;

use crate::consumer::EchoClient;
use crate::http::form::parse_form;
use crate::observability::metrics;

/// Application state injected into the handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: EchoClient,
    pub default_count: u32,
    pub response_delay: Duration,
}

pub async fn echo_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let form = match parse_form(&method, &headers, uri.query(), &body) {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse request form");
            metrics::record_http_request(500);
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let values = form.get_all("value");
    tracing::info!(values = ?values, "Received value");
    let value = values.first().map(String::as_str).unwrap_or_default();

    let counts = form.get_all("count");
    tracing::info!(counts = ?counts, "Received count");
    let count = resolve_count(counts.first().map(String::as_str), state.default_count);

    let mut out = String::new();
    for attempt in 0..count {
        match state.client.echo(value).await {
            Ok(echoed) => {
                tracing::info!(attempt, value, response = %echoed, "Sent message");
                out.push_str(&echoed);
            }
            Err(status) => {
                tracing::info!(attempt, value, error = %status.message(), code = ?status.code(), "Sent message");
                out.push_str(&status_line(&status));
            }
        }
        out.push('\n');
    }

    if !state.response_delay.is_zero() {
        tokio::time::sleep(state.response_delay).await;
    }
    metrics::record_http_request(200);
    (StatusCode::OK, out).into_response()
}

/// Effective call count from the raw `count` parameter.
pub fn resolve_count(raw: Option<&str>, default_count: u32) -> u64 {
    let Some(raw) = raw else {
        return u64::from(default_count);
    };
    match raw.parse::<i64>() {
        Ok(v) if v > 0 => v as u64,
        Ok(_) => u64::from(default_count),
        Err(e) => {
            tracing::warn!(count = %raw, error = %e, "Count is not an integer, using default");
            u64::from(default_count)
        }
    }
}

/// Render a call error as a response line.
pub fn status_line(status: &Status) -> String {
    format!("rpc error: code = {:?} desc = {}", status.code(), status.message())
}
