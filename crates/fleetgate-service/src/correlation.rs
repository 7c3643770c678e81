// crates/fleetgate-service/src/correlation.rs
// ============================================================================
// Module: Fleetgate Correlation IDs
// Description: Boot-scoped correlation identifier generation.
// Purpose: Thread one opaque ID through a tool invocation and its audit.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Every tool invocation mints exactly one correlation ID, which appears in
//! the response and in every audit entry the invocation produces. IDs
//! combine a boot-scoped random seed with a monotonic counter, so they are
//! unique within a process lifetime and cheap to generate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Boot-scoped correlation ID generator.
///
/// # Invariants
/// - Issued identifiers are unique within the process lifetime.
#[derive(Debug)]
pub struct CorrelationIdGenerator {
    /// Prefix included in every generated identifier.
    prefix: &'static str,
    /// Boot-scoped random seed.
    boot_id: u64,
    /// Monotonic counter for issued identifiers.
    counter: AtomicU64,
}

impl CorrelationIdGenerator {
    /// Creates a generator with the given prefix.
    #[must_use]
    pub fn new(prefix: &'static str) -> Self {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        Self {
            prefix,
            boot_id: u64::from_be_bytes(bytes),
            counter: AtomicU64::new(1),
        }
    }

    /// Issues a new correlation ID.
    #[must_use]
    pub fn issue(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:016x}-{:08x}", self.prefix, self.boot_id, seq)
    }
}

impl Default for CorrelationIdGenerator {
    fn default() -> Self {
        Self::new("fg")
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
