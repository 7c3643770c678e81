// crates/fleetgate-core/src/lib.rs
// ============================================================================
// Module: Fleetgate Core
// Description: Core orchestration engine for the fleetgate control plane.
// Purpose: Validate, plan, gate, and execute mutations against project tenants.
// Dependencies: serde, serde_jcs, sha2, hmac, subtle, base64, regex, rand
// ============================================================================

//! ## Overview
//! Fleetgate core implements the safety-gated orchestration engine: canonical
//! plan hashing, secret redaction, scope cataloging, target resolution, plan
//! management, confirmation tokens, and the mutation executor. The tool
//! facade and the upstream HTTP adapter live in sibling crates and reach the
//! engine only through the interfaces defined here.
//! Security posture: every client-supplied value is untrusted and validated
//! before it can influence an upstream call.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::actions::ALL_ACTIONS;
pub use core::actions::Action;
pub use core::actions::Domain;
pub use core::audit::AuditOutcome;
pub use core::audit::AuditRecord;
pub use core::audit::AuditSink;
pub use core::audit::InMemoryAuditLog;
pub use core::audit::StderrAuditSink;
pub use core::error::ErrorCode;
pub use core::error::StandardError;
pub use core::hashing::HashError;
pub use core::hashing::canonical_json_bytes;
pub use core::hashing::plan_digest;
pub use core::redact::REDACTED;
pub use core::redact::redact_message;
pub use core::redact::redact_value;
pub use core::scopes::SCOPE_CATALOG_VERSION;
pub use core::scopes::catalog_scopes;
pub use core::scopes::scope_catalog;
pub use core::types::AuthContext;
pub use core::types::AuthDirectory;
pub use core::types::BatchStatus;
pub use core::types::NormalizedOperation;
pub use core::types::Operation;
pub use core::types::ResolvedTarget;
pub use core::types::RiskLevel;
pub use core::types::TargetInput;
pub use core::types::TargetSource;
pub use interfaces::UpstreamAdapter;
pub use runtime::confirm::ConfirmationTokenService;
pub use runtime::confirm::DEFAULT_CONFIRMATION_SECRET;
pub use runtime::confirm::TokenVerification;
pub use runtime::executor::ExecutionReport;
pub use runtime::executor::MutationExecutor;
pub use runtime::executor::OperationResult;
pub use runtime::executor::OperationStatus;
pub use runtime::executor::TargetResult;
pub use runtime::plan::DEFAULT_PLAN_TTL_SECONDS;
pub use runtime::plan::Plan;
pub use runtime::plan::PlanError;
pub use runtime::plan::PlanManager;
pub use runtime::plan::PlanOperation;
pub use runtime::plan::normalize_operations;
pub use runtime::targets::SelectorMode;
pub use runtime::targets::TargetDirectory;
pub use runtime::targets::TargetSelector;
pub use runtime::targets::resolve_targets;
