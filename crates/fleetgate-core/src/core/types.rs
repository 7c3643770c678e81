// crates/fleetgate-core/src/core/types.rs
// ============================================================================
// Module: Fleetgate Core Types
// Description: Shared value types for operations, targets, and credentials.
// Purpose: Provide the immutable vocabulary the engine components exchange.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Value types shared across the engine: client-supplied operations and
//! targets, their resolved and normalized forms, the per-project credential
//! model, and the status/risk enumerations. Auth contexts are immutable value
//! types; everything client-supplied is validated before use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::actions::Action;
use crate::core::actions::Domain;

// ============================================================================
// SECTION: Operations
// ============================================================================

/// One intended change, as supplied by the client.
///
/// # Invariants
/// - `operation_id` is client-assigned and must be non-empty.
/// - `required_scopes` may extend, but never undercut, the catalog minimum;
///   the planner enforces the union.
/// - `destructive`/`critical` hints may be upgraded during planning but never
///   downgraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Client-assigned operation identifier.
    pub operation_id: String,
    /// Domain claimed by the client; validated against the action when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    /// Action to perform.
    pub action: Action,
    /// Opaque action parameters, validated by the adapter per action.
    #[serde(default)]
    pub params: Value,
    /// Scopes the client declares for this operation.
    #[serde(default)]
    pub required_scopes: BTreeSet<String>,
    /// Client hint that the operation is destructive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destructive: Option<bool>,
    /// Client hint that the operation is critical.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<bool>,
    /// Optional idempotency key for replay-safe retries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// An operation after planning normalization.
///
/// # Invariants
/// - `required_scopes` is a superset of the catalog scopes for `action`.
/// - `destructive` is true for inherently destructive actions regardless of
///   client hints; `critical` follows the policy rules and is never weaker
///   than the client hint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedOperation {
    /// Client-assigned operation identifier.
    pub operation_id: String,
    /// Action to perform.
    pub action: Action,
    /// Opaque action parameters.
    pub params: Value,
    /// Effective scopes after the catalog union.
    pub required_scopes: BTreeSet<String>,
    /// Effective destructive classification.
    pub destructive: bool,
    /// Effective critical classification.
    pub critical: bool,
    /// Optional idempotency key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

// ============================================================================
// SECTION: Targets
// ============================================================================

/// Client-supplied target: an explicit project ID or a configured alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInput {
    /// Explicit project identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Configured alias to translate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// How a resolved target was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    /// Taken from the request's explicit target list.
    Explicit,
    /// Produced by a target selector.
    Selector,
    /// Resolved from process configuration.
    Auto,
}

impl TargetSource {
    /// Returns the stable wire label for this source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Selector => "selector",
            Self::Auto => "auto",
        }
    }
}

/// A fully resolved target project.
///
/// # Invariants
/// - `project_id` is non-empty.
/// - `index` is the position in the deduplicated resolution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    /// Position in resolution order.
    pub index: usize,
    /// How this target was selected.
    pub source: TargetSource,
    /// Resolved project identifier.
    pub project_id: String,
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Credentials and endpoint for one upstream tenant.
///
/// # Invariants
/// - Execution requires both `endpoint` and `api_key` to be non-empty.
/// - An empty `scopes` set means "scopes unknown"; preflight is skipped and
///   the upstream service is the authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Upstream base endpoint.
    pub endpoint: String,
    /// API key presented to the upstream service.
    pub api_key: String,
    /// Scopes the key is declared to hold.
    #[serde(default)]
    pub scopes: BTreeSet<String>,
}

impl AuthContext {
    /// Returns true when both endpoint and API key are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

/// Credential directory consulted by the executor.
///
/// # Invariants
/// - When `per_project` is non-empty it is authoritative: a target absent
///   from it fails preflight rather than falling back.
/// - `management` holds the credentials used for `project.*` actions; its
///   absence disables the project-management namespace.
#[derive(Debug, Clone, Default)]
pub struct AuthDirectory {
    /// Per-project credential map.
    pub per_project: BTreeMap<String, AuthContext>,
    /// Fallback credentials used when no per-project map is configured.
    pub fallback: Option<AuthContext>,
    /// Management credentials for the `project.*` namespace.
    pub management: Option<AuthContext>,
}

impl AuthDirectory {
    /// Returns true when project-management actions are available.
    #[must_use]
    pub const fn management_enabled(&self) -> bool {
        self.management.is_some()
    }
}

// ============================================================================
// SECTION: Statuses
// ============================================================================

/// Risk classification for a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// No destructive operations.
    Low,
    /// At least one destructive operation.
    Medium,
    /// At least one critical operation.
    High,
}

impl RiskLevel {
    /// Returns the stable wire label for this risk level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// Aggregate status over all targets of one apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Every target succeeded.
    Success,
    /// Some targets succeeded and some failed.
    PartialSuccess,
    /// No target succeeded.
    Failed,
}

impl BatchStatus {
    /// Returns the stable wire label for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::PartialSuccess => "PARTIAL_SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}
