// crates/fleetgate-core/tests/confirm.rs
// ============================================================================
// Module: Confirmation Token Tests
// Description: Tests for token issue/verify round-trips and failure order.
// ============================================================================
//! ## Overview
//! Validates the token round-trip matrix: ok before expiry, expired at the
//! boundary, mismatch for foreign hashes, and invalid for structural or
//! signature defects.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use fleetgate_core::ConfirmationTokenService;
use fleetgate_core::DEFAULT_CONFIRMATION_SECRET;
use fleetgate_core::TokenVerification;

// ============================================================================
// SECTION: Round Trip
// ============================================================================

/// Tests a fresh token verifies against its plan hash.
#[test]
fn test_round_trip_ok() {
    let service = ConfirmationTokenService::new("unit-secret");
    let token = service.issue("hash-a", 1_000).unwrap();

    assert_eq!(service.verify(&token, "hash-a", 999), TokenVerification::Ok);
}

/// Tests a token is expired exactly at its expiry second.
#[test]
fn test_expired_at_boundary() {
    let service = ConfirmationTokenService::new("unit-secret");
    let token = service.issue("hash-a", 1_000).unwrap();

    assert_eq!(service.verify(&token, "hash-a", 1_000), TokenVerification::Expired);
    assert_eq!(service.verify(&token, "hash-a", 2_000), TokenVerification::Expired);
}

/// Tests a token bound to another plan reports mismatch.
#[test]
fn test_foreign_hash_is_mismatch() {
    let service = ConfirmationTokenService::new("unit-secret");
    let token = service.issue("hash-a", 1_000).unwrap();

    assert_eq!(service.verify(&token, "hash-b", 999), TokenVerification::Mismatch);
}

/// Tests mismatch wins over expiry in the check order.
#[test]
fn test_mismatch_precedes_expiry() {
    let service = ConfirmationTokenService::new("unit-secret");
    let token = service.issue("hash-a", 1_000).unwrap();

    assert_eq!(service.verify(&token, "hash-b", 5_000), TokenVerification::Mismatch);
}

// ============================================================================
// SECTION: Invalid Tokens
// ============================================================================

/// Tests malformed tokens are invalid.
#[test]
fn test_malformed_tokens_are_invalid() {
    let service = ConfirmationTokenService::new("unit-secret");

    assert_eq!(service.verify("", "hash-a", 0), TokenVerification::Invalid);
    assert_eq!(service.verify("no-dot", "hash-a", 0), TokenVerification::Invalid);
    assert_eq!(service.verify("a.!!!", "hash-a", 0), TokenVerification::Invalid);
}

/// Tests a token signed under another secret is invalid.
#[test]
fn test_foreign_signature_is_invalid() {
    let issuer = ConfirmationTokenService::new("secret-one");
    let verifier = ConfirmationTokenService::new("secret-two");
    let token = issuer.issue("hash-a", 1_000).unwrap();

    assert_eq!(verifier.verify(&token, "hash-a", 0), TokenVerification::Invalid);
}

/// Tests a tampered payload fails the signature check.
#[test]
fn test_tampered_payload_is_invalid() {
    let service = ConfirmationTokenService::new("unit-secret");
    let token = service.issue("hash-a", 1_000).unwrap();
    let (payload, tag) = token.split_once('.').unwrap();
    let mut corrupted = payload.to_string();
    corrupted.push('A');
    let tampered = format!("{corrupted}.{tag}");

    assert_eq!(service.verify(&tampered, "hash-a", 0), TokenVerification::Invalid);
}

// ============================================================================
// SECTION: Secrets
// ============================================================================

/// Tests the sentinel secret is detectable for startup policy.
#[test]
fn test_default_secret_detection() {
    let default = ConfirmationTokenService::new(DEFAULT_CONFIRMATION_SECRET);
    let custom = ConfirmationTokenService::new("deployment-secret");

    assert!(default.uses_default_secret());
    assert!(!custom.uses_default_secret());
}

/// Tests identical inputs produce identical tokens.
#[test]
fn test_tokens_are_deterministic() {
    let service = ConfirmationTokenService::new("unit-secret");

    let token_a = service.issue("hash-a", 1_000).unwrap();
    let token_b = service.issue("hash-a", 1_000).unwrap();

    assert_eq!(token_a, token_b);
}
