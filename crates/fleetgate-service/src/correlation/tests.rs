// crates/fleetgate-service/src/correlation/tests.rs
// ============================================================================
// Module: Correlation Tests
// Description: Tests for correlation ID generation.
// ============================================================================
//! ## Overview
//! Validates uniqueness and shape of generated correlation IDs.

#![allow(clippy::unwrap_used, reason = "Panic-based assertions are permitted in tests.")]

use std::collections::BTreeSet;

use super::CorrelationIdGenerator;

/// Tests issued IDs are unique and carry the prefix.
#[test]
fn test_issued_ids_are_unique() {
    let generator = CorrelationIdGenerator::new("fg");

    let ids: BTreeSet<String> = (0..100).map(|_| generator.issue()).collect();

    assert_eq!(ids.len(), 100);
    assert!(ids.iter().all(|id| id.starts_with("fg-")));
}

/// Tests independent generators diverge through their boot seed.
#[test]
fn test_generators_have_distinct_boot_ids() {
    let generator_a = CorrelationIdGenerator::new("fg");
    let generator_b = CorrelationIdGenerator::new("fg");

    assert_ne!(generator_a.issue(), generator_b.issue());
}
