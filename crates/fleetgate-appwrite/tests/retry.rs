// crates/fleetgate-appwrite/tests/retry.rs
// ============================================================================
// Module: Retry Policy Tests
// Description: Tests for conditional retry, backoff, and outcome mapping.
// ============================================================================
//! ## Overview
//! Drives the retry loop with scripted attempt closures: GETs retry on
//! retryable statuses, bare POSTs never retry, idempotency keys make any
//! method retryable, and exhaustion surfaces the upstream failure with its
//! retryability preserved.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use fleetgate_appwrite::AppwriteAdapterConfig;
use fleetgate_appwrite::AttemptOutcome;
use fleetgate_appwrite::HttpResponse;
use fleetgate_appwrite::Method;
use fleetgate_appwrite::backoff_base_ms;
use fleetgate_appwrite::execute_with_retry;
use fleetgate_appwrite::request_is_retryable;
use fleetgate_appwrite::resolve_outcome;
use fleetgate_core::ErrorCode;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Config with two retries and negligible backoff.
fn fast_config() -> AppwriteAdapterConfig {
    AppwriteAdapterConfig {
        max_retries: 2,
        retry_base_delay_ms: 1,
        retry_max_delay_ms: 1,
        ..AppwriteAdapterConfig::default()
    }
}

/// Shorthand for a response outcome.
fn response(status: u16, body: &str) -> AttemptOutcome {
    AttemptOutcome::Response(HttpResponse {
        status,
        body: body.to_string(),
    })
}

// ============================================================================
// SECTION: Retryability
// ============================================================================

/// Tests the request retryability matrix.
#[test]
fn test_request_retryability() {
    assert!(request_is_retryable(Method::Get, false));
    assert!(request_is_retryable(Method::Get, true));
    assert!(!request_is_retryable(Method::Post, false));
    assert!(request_is_retryable(Method::Post, true));
    assert!(!request_is_retryable(Method::Delete, false));
}

/// Tests backoff doubles and clamps at the maximum.
#[test]
fn test_backoff_doubles_and_clamps() {
    assert_eq!(backoff_base_ms(250, 5_000, 1), 250);
    assert_eq!(backoff_base_ms(250, 5_000, 2), 500);
    assert_eq!(backoff_base_ms(250, 5_000, 3), 1_000);
    assert_eq!(backoff_base_ms(250, 5_000, 6), 5_000);
    assert_eq!(backoff_base_ms(250, 5_000, 63), 5_000);
}

// ============================================================================
// SECTION: Attempt Loop
// ============================================================================

/// Tests a retryable request recovers from a 503.
#[test]
fn test_retryable_request_recovers() {
    let config = fast_config();
    let script = [response(503, ""), response(200, r#"{"ok":true}"#)];
    let mut served = script.into_iter();

    let (outcome, attempts) =
        execute_with_retry(&config, true, |_| served.next().unwrap());

    assert_eq!(attempts, 2);
    assert_eq!(outcome, response(200, r#"{"ok":true}"#));
}

/// Tests a non-retryable request fails on the first 503.
#[test]
fn test_non_retryable_request_fails_fast() {
    let config = fast_config();

    let (outcome, attempts) = execute_with_retry(&config, false, |_| response(503, ""));

    assert_eq!(attempts, 1);
    assert_eq!(outcome, response(503, ""));
}

/// Tests timeouts count as retry triggers.
#[test]
fn test_timeout_triggers_retry() {
    let config = fast_config();
    let script = [AttemptOutcome::Timeout, response(200, "{}")];
    let mut served = script.into_iter();

    let (outcome, attempts) =
        execute_with_retry(&config, true, |_| served.next().unwrap());

    assert_eq!(attempts, 2);
    assert_eq!(outcome, response(200, "{}"));
}

/// Tests exhaustion returns the last failing outcome.
#[test]
fn test_exhaustion_returns_last_outcome() {
    let config = fast_config();

    let (outcome, attempts) = execute_with_retry(&config, true, |_| response(503, "busy"));

    assert_eq!(attempts, 3);
    assert_eq!(outcome, response(503, "busy"));
}

/// Tests a non-retry status stops the loop immediately.
#[test]
fn test_non_retry_status_stops_loop() {
    let config = fast_config();

    let (outcome, attempts) = execute_with_retry(&config, true, |_| response(404, ""));

    assert_eq!(attempts, 1);
    assert_eq!(outcome, response(404, ""));
}

// ============================================================================
// SECTION: Outcome Mapping
// ============================================================================

/// Tests a 2xx body parses into data.
#[test]
fn test_success_parses_json() {
    let config = fast_config();

    let data = resolve_outcome(&config, response(201, r#"{"id":"db-main"}"#)).unwrap();

    assert_eq!(data, json!({"id": "db-main"}));
}

/// Tests a non-JSON 2xx body is wrapped raw.
#[test]
fn test_success_wraps_non_json() {
    let config = fast_config();

    let data = resolve_outcome(&config, response(200, "plain text")).unwrap();

    assert_eq!(data, json!({"raw": "plain text"}));
}

/// Tests a non-2xx maps to INTERNAL_ERROR with the upstream message.
#[test]
fn test_upstream_failure_maps_to_internal_error() {
    let config = fast_config();

    let error = resolve_outcome(
        &config,
        response(503, r#"{"message":"service unavailable"}"#),
    )
    .unwrap_err();

    assert_eq!(error.code, ErrorCode::InternalError);
    assert_eq!(error.message, "Appwrite 503: service unavailable");
    assert!(error.retryable);
}

/// Tests a non-retry status yields a non-retryable error.
#[test]
fn test_non_retry_status_is_not_retryable() {
    let config = fast_config();

    let error = resolve_outcome(&config, response(404, r#"{"message":"not found"}"#))
        .unwrap_err();

    assert_eq!(error.message, "Appwrite 404: not found");
    assert!(!error.retryable);
}

/// Tests timeout and transport failures are retryable.
#[test]
fn test_timeout_and_transport_are_retryable() {
    let config = fast_config();

    let timeout = resolve_outcome(&config, AttemptOutcome::Timeout).unwrap_err();
    assert_eq!(timeout.code, ErrorCode::InternalError);
    assert!(timeout.retryable);

    let transport =
        resolve_outcome(&config, AttemptOutcome::Transport("connection reset".to_string()))
            .unwrap_err();
    assert!(transport.retryable);
}
