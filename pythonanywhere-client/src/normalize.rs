//! Response normalization.
//!
//! The single cross-cutting contract of the library: transport failure →
//! `{status_code: null, error: true, message}`; unexpected status →
//! `{status_code: actual, error: true, message}`; success →
//! `{status_code: actual, error: false, data: parsed-or-wrapped body}`.
//!
//! Everything here is a pure function over `(StatusCode, &str)` so the
//! contract is testable without a server.

use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use tracing::warn;

use pythonanywhere_core::{ApiResponse, ClientError};

/// Parses a body as JSON, else wraps the raw text under a `text` key.
pub fn parse_or_wrap(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| json!({ "text": body }))
}

/// Success requires an expected status code; the body is normalized
/// leniently (JSON if it parses, `{"text": ...}` otherwise).
pub fn expect_body(
    status: StatusCode,
    body: &str,
    expected: &[StatusCode],
    failure: &str,
) -> ApiResponse {
    if !expected.contains(&status) {
        warn!(status = %status, "{failure}");
        return ApiResponse::fail(status.as_u16(), failure);
    }
    ApiResponse::ok(status.as_u16(), parse_or_wrap(body))
}

/// Success requires an expected status code AND a JSON body.
pub fn expect_json(
    status: StatusCode,
    body: &str,
    expected: &[StatusCode],
    failure: &str,
) -> ApiResponse {
    if !expected.contains(&status) {
        warn!(status = %status, "{failure}");
        return ApiResponse::fail(status.as_u16(), failure);
    }
    match serde_json::from_str::<Value>(body) {
        Ok(data) => ApiResponse::ok(status.as_u16(), data),
        Err(e) => {
            warn!(error = %e, "{failure}: body is not valid JSON");
            ApiResponse::fail(status.as_u16(), failure)
        }
    }
}

/// Success requires an expected status code; no payload is returned
/// (deletes, logout's raw 302).
pub fn expect_empty(status: StatusCode, expected: &[StatusCode], failure: &str) -> ApiResponse {
    if !expected.contains(&status) {
        warn!(status = %status, "{failure}");
        return ApiResponse::fail(status.as_u16(), failure);
    }
    ApiResponse::ok_empty(status.as_u16())
}

/// Collapses an operation's internal result into the normalized record.
///
/// Public operations never return `Err`; anything an internal helper
/// propagated with `?` is converted here.
pub fn into_response(result: Result<ApiResponse, ClientError>) -> ApiResponse {
    result.unwrap_or_else(|e| ApiResponse::from(&e))
}

/// Reads the status and body out of a response; a failed body read counts
/// as a transport failure.
pub(crate) async fn read(response: Response) -> Result<(StatusCode, String), ClientError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    Ok((status, body))
}
