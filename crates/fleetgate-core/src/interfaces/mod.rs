// crates/fleetgate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Fleetgate Interfaces
// Description: Trait seams between the engine and its collaborators.
// Purpose: Keep the executor independent of any concrete upstream transport.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The engine reaches the outside world through one seam: the
//! [`UpstreamAdapter`], which turns a normalized operation into a concrete
//! upstream call. Implementations own their transport, timeout, and retry
//! behavior; the executor owns preflight, idempotency, auditing, and error
//! normalization.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::error::StandardError;
use crate::core::types::AuthContext;
use crate::core::types::NormalizedOperation;

// ============================================================================
// SECTION: Upstream Adapter
// ============================================================================

/// Executes one operation against the upstream service.
pub trait UpstreamAdapter: Send + Sync {
    /// Performs `operation` against `project_id` under `auth`.
    ///
    /// Returns the upstream response data on success. Failures carry a
    /// [`StandardError`]; the executor fills in missing target/operation
    /// context and redacts the message before it leaves the process.
    ///
    /// # Errors
    ///
    /// Returns [`StandardError`] for validation failures, missing
    /// credentials, and upstream/transport failures.
    fn execute_operation(
        &self,
        project_id: &str,
        operation: &NormalizedOperation,
        auth: &AuthContext,
        correlation_id: &str,
    ) -> Result<Value, StandardError>;
}
