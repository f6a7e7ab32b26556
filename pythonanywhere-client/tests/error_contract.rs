//! Integration tests for the cross-cutting normalization contract.

use reqwest::StatusCode;

use pythonanywhere_client::normalize::{expect_body, expect_empty, expect_json};
use pythonanywhere_core::ApiResponse;

const OK: &[StatusCode] = &[StatusCode::OK];

#[test]
fn test_error_flag_iff_failure() {
    // Transport raised: no status, error set.
    let transport = ApiResponse::transport_failure("connection reset by peer");
    assert!(transport.error);
    assert_eq!(transport.status_code, None);

    // Status outside the expected set: actual status, error set.
    let status = expect_body(StatusCode::BAD_GATEWAY, "", OK, "failed");
    assert!(status.error);
    assert_eq!(status.status_code, Some(502));

    // Body parsing failed where JSON was required: error set.
    let parse = expect_json(StatusCode::OK, "<html>oops</html>", OK, "failed");
    assert!(parse.error);

    // None of the above: success.
    let success = expect_json(StatusCode::OK, "[]", OK, "failed");
    assert!(!success.error);
}

#[test]
fn test_diagnostics_always_under_message_key() {
    for response in [
        ApiResponse::transport_failure("dns"),
        expect_body(StatusCode::FORBIDDEN, "", OK, "Reload failed"),
        expect_empty(StatusCode::OK, &[StatusCode::NO_CONTENT], "Delete task failed"),
    ] {
        assert!(response.error);
        assert!(response.message().is_some());
    }
}

#[test]
fn test_success_payload_never_carries_message() {
    let success = expect_body(StatusCode::OK, r#"{"output": "hi"}"#, OK, "failed");
    assert!(!success.error);
    assert_eq!(success.message(), None);
    assert_eq!(success.data_str("output"), Some("hi"));
}
