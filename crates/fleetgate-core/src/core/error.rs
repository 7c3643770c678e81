// crates/fleetgate-core/src/core/error.rs
// ============================================================================
// Module: Fleetgate Standard Errors
// Description: Closed error taxonomy with canonical remediation policy.
// Purpose: Give every failure a stable code, retryability, and context.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! All failures surface as a [`StandardError`]: a plain record carrying one
//! of ten closed codes, a redacted message, optional target/operation
//! context, and a retryability flag. Errors propagate as values through
//! `Result`; only the outermost tool boundary maps unexpected failures to
//! `INTERNAL_ERROR`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::redact::redact_message;

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// Closed set of error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input failed schema or parameter presence/type checks.
    ValidationError,
    /// Alias or project cannot be resolved.
    TargetNotFound,
    /// Auto resolution with no configured default.
    TargetAmbiguous,
    /// Missing, unknown, expired, or tampered plan.
    PlanMismatch,
    /// Transport or project-management channel disabled.
    CapabilityUnavailable,
    /// Missing or expired confirmation for a critical operation.
    ConfirmRequired,
    /// Bad confirmation signature or plan-hash mismatch.
    InvalidConfirmToken,
    /// Declared scopes insufficient for the operation.
    MissingScope,
    /// Target lacks endpoint or API key.
    AuthContextRequired,
    /// Upstream, adapter, or unclassified failure.
    InternalError,
}

impl ErrorCode {
    /// Returns the stable wire label for this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::TargetNotFound => "TARGET_NOT_FOUND",
            Self::TargetAmbiguous => "TARGET_AMBIGUOUS",
            Self::PlanMismatch => "PLAN_MISMATCH",
            Self::CapabilityUnavailable => "CAPABILITY_UNAVAILABLE",
            Self::ConfirmRequired => "CONFIRM_REQUIRED",
            Self::InvalidConfirmToken => "INVALID_CONFIRM_TOKEN",
            Self::MissingScope => "MISSING_SCOPE",
            Self::AuthContextRequired => "AUTH_CONTEXT_REQUIRED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Standard Error
// ============================================================================

/// Standardized failure record surfaced to clients and audit details.
///
/// # Invariants
/// - `message` is redacted at construction.
/// - `retryable` is false for every code except upstream-classified
///   `INTERNAL_ERROR` failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardError {
    /// Stable error code.
    pub code: ErrorCode,
    /// Redacted human-readable message.
    pub message: String,
    /// Target project the failure applies to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Operation the failure applies to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Whether retrying the same request may succeed.
    pub retryable: bool,
    /// Scopes missing from the available set (`MISSING_SCOPE` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_scopes: Option<Vec<String>>,
    /// Transports the server supports (`CAPABILITY_UNAVAILABLE` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_transports: Option<Vec<String>>,
    /// Short human-readable remediation hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl StandardError {
    /// Creates a non-retryable error with a redacted message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: redact_message(&message.into()),
            target: None,
            operation_id: None,
            retryable: false,
            missing_scopes: None,
            supported_transports: None,
            remediation: None,
        }
    }

    /// Returns a copy with the retryability flag set.
    #[must_use]
    pub const fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Returns a copy bound to a target project.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Returns a copy bound to an operation.
    #[must_use]
    pub fn with_operation(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Returns a copy carrying the missing scopes.
    #[must_use]
    pub fn with_missing_scopes(mut self, scopes: Vec<String>) -> Self {
        self.missing_scopes = Some(scopes);
        self
    }

    /// Returns a copy carrying the supported transports.
    #[must_use]
    pub fn with_supported_transports(mut self, transports: Vec<String>) -> Self {
        self.supported_transports = Some(transports);
        self
    }

    /// Returns a copy carrying a remediation hint.
    #[must_use]
    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    /// Fills target and operation context when the producer omitted them.
    #[must_use]
    pub fn contextualize(mut self, target: &str, operation_id: &str) -> Self {
        if self.target.is_none() {
            self.target = Some(target.to_string());
        }
        if self.operation_id.is_none() {
            self.operation_id = Some(operation_id.to_string());
        }
        self
    }
}

impl fmt::Display for StandardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for StandardError {}
