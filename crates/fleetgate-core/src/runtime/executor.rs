// crates/fleetgate-core/src/runtime/executor.rs
// ============================================================================
// Module: Fleetgate Mutation Executor
// Description: Per-target preflight, idempotent dispatch, and auditing.
// Purpose: Execute a verified plan deterministically across its targets.
// Dependencies: serde_json, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The executor walks resolved targets in input order and operations within
//! each target in request order. Per target it resolves and validates the
//! auth context; per operation it substitutes management credentials for the
//! `project.*` namespace, runs the scope preflight, consults the idempotency
//! cache, dispatches to the upstream adapter, and appends an audit entry.
//! Failures never abort the batch: each operation carries its own result and
//! the target and batch statuses are aggregated afterwards, which keeps
//! `target_results` aligned index-for-index with the plan's target list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::core::actions::Action;
use crate::core::audit::AuditOutcome;
use crate::core::audit::AuditRecord;
use crate::core::audit::AuditSink;
use crate::core::error::ErrorCode;
use crate::core::error::StandardError;
use crate::core::redact::redact_message;
use crate::core::redact::redact_value;
use crate::core::types::AuthContext;
use crate::core::types::AuthDirectory;
use crate::core::types::BatchStatus;
use crate::core::types::NormalizedOperation;
use crate::core::types::ResolvedTarget;
use crate::interfaces::UpstreamAdapter;

// ============================================================================
// SECTION: Results
// ============================================================================

/// Status of one executed operation or one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// The operation (or every operation of the target) succeeded.
    Success,
    /// The operation (or at least one operation of the target) failed.
    Failed,
}

/// Result of one operation against one target.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    /// Client-assigned operation identifier.
    pub operation_id: String,
    /// Action performed.
    pub action: Action,
    /// Operation status.
    pub status: OperationStatus,
    /// Redacted upstream response data on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure record on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StandardError>,
}

/// Result of all operations against one target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetResult {
    /// Resolved project identifier.
    pub project_id: String,
    /// Aggregated target status.
    pub status: OperationStatus,
    /// Per-operation results, in request order.
    pub operations: Vec<OperationResult>,
}

/// Aggregated outcome of one apply.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    /// Batch status across all targets.
    pub status: BatchStatus,
    /// Per-target results, aligned with the plan's target order.
    pub target_results: Vec<TargetResult>,
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Executes verified plans against their targets.
pub struct MutationExecutor {
    /// Upstream adapter handle.
    adapter: Arc<dyn UpstreamAdapter>,
    /// Audit sink for execution entries.
    audit: Arc<dyn AuditSink>,
    /// Credential directory.
    auth: AuthDirectory,
    /// Idempotency cache keyed by `project:action:key`.
    idempotency: Mutex<HashMap<String, Value>>,
}

impl MutationExecutor {
    /// Creates an executor over an adapter, audit sink, and credentials.
    #[must_use]
    pub fn new(
        adapter: Arc<dyn UpstreamAdapter>,
        audit: Arc<dyn AuditSink>,
        auth: AuthDirectory,
    ) -> Self {
        Self {
            adapter,
            audit,
            auth,
            idempotency: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the credential directory.
    #[must_use]
    pub const fn auth(&self) -> &AuthDirectory {
        &self.auth
    }

    /// Executes all operations against all targets, sequentially and in
    /// input order.
    #[must_use]
    pub fn execute(
        &self,
        targets: &[ResolvedTarget],
        operations: &[NormalizedOperation],
        actor: &str,
        correlation_id: &str,
        now: u64,
    ) -> ExecutionReport {
        let mut target_results = Vec::with_capacity(targets.len());
        for target in targets {
            target_results.push(self.execute_target(target, operations, actor, correlation_id, now));
        }

        let succeeded = target_results
            .iter()
            .filter(|result| result.status == OperationStatus::Success)
            .count();
        let status = if succeeded == target_results.len() {
            BatchStatus::Success
        } else if succeeded == 0 {
            BatchStatus::Failed
        } else {
            BatchStatus::PartialSuccess
        };
        ExecutionReport {
            status,
            target_results,
        }
    }

    /// Executes all operations against one target.
    fn execute_target(
        &self,
        target: &ResolvedTarget,
        operations: &[NormalizedOperation],
        actor: &str,
        correlation_id: &str,
        now: u64,
    ) -> TargetResult {
        let project_id = target.project_id.as_str();
        let auth = match self.resolve_auth(project_id) {
            Ok(auth) => auth,
            Err(error) => {
                return self.fail_target(project_id, operations, &error, actor, correlation_id, now);
            }
        };

        let mut results = Vec::with_capacity(operations.len());
        for operation in operations {
            let result =
                self.execute_operation(project_id, operation, &auth, actor, correlation_id, now);
            results.push(result);
        }
        let status = if results.iter().all(|result| result.status == OperationStatus::Success) {
            OperationStatus::Success
        } else {
            OperationStatus::Failed
        };
        TargetResult {
            project_id: project_id.to_string(),
            status,
            operations: results,
        }
    }

    /// Executes one operation against one target.
    fn execute_operation(
        &self,
        project_id: &str,
        operation: &NormalizedOperation,
        auth: &AuthContext,
        actor: &str,
        correlation_id: &str,
        now: u64,
    ) -> OperationResult {
        // Management namespace runs under the management credentials.
        let effective_auth = if operation.action.is_project_management() {
            match self.auth.management.as_ref() {
                Some(management) => management.clone(),
                None => {
                    let error = StandardError::new(
                        ErrorCode::CapabilityUnavailable,
                        "project management is disabled",
                    )
                    .with_remediation("configure management credentials to use project.* actions")
                    .contextualize(project_id, &operation.operation_id);
                    return self.failed_result(project_id, operation, error, actor, correlation_id, now);
                }
            }
        } else {
            auth.clone()
        };

        // Scope preflight. An empty available set means the key's scopes are
        // unknown; the upstream service is then the authority.
        if !effective_auth.scopes.is_empty() {
            let missing = missing_scopes(&operation.required_scopes, &effective_auth.scopes);
            if !missing.is_empty() {
                let error = StandardError::new(
                    ErrorCode::MissingScope,
                    format!("api key lacks scopes: {}", missing.join(", ")),
                )
                .with_missing_scopes(missing)
                .with_remediation("grant the listed scopes to the project's api key")
                .contextualize(project_id, &operation.operation_id);
                return self.failed_result(project_id, operation, error, actor, correlation_id, now);
            }
        }

        // Idempotency cache short-circuits replays of completed work.
        let cache_key = operation
            .idempotency_key
            .as_ref()
            .map(|key| format!("{project_id}:{}:{key}", operation.action));
        if let Some(key) = cache_key.as_ref()
            && let Some(cached) = self.cache().get(key).cloned()
        {
            self.append_audit(
                actor,
                now,
                project_id,
                operation,
                AuditOutcome::Skipped,
                correlation_id,
                Some(json!({ "idempotency_key": operation.idempotency_key })),
            );
            return OperationResult {
                operation_id: operation.operation_id.clone(),
                action: operation.action,
                status: OperationStatus::Success,
                data: Some(cached),
                error: None,
            };
        }

        match self.adapter.execute_operation(project_id, operation, &effective_auth, correlation_id)
        {
            Ok(data) => {
                let data = redact_value(&data);
                if let Some(key) = cache_key {
                    self.cache().insert(key, data.clone());
                }
                self.append_audit(
                    actor,
                    now,
                    project_id,
                    operation,
                    AuditOutcome::Success,
                    correlation_id,
                    Some(data.clone()),
                );
                OperationResult {
                    operation_id: operation.operation_id.clone(),
                    action: operation.action,
                    status: OperationStatus::Success,
                    data: Some(data),
                    error: None,
                }
            }
            Err(error) => {
                let error = normalize_error(error, project_id, &operation.operation_id);
                self.failed_result(project_id, operation, error, actor, correlation_id, now)
            }
        }
    }

    /// Resolves the auth context for a target.
    fn resolve_auth(&self, project_id: &str) -> Result<AuthContext, StandardError> {
        let auth = if self.auth.per_project.is_empty() {
            self.auth.fallback.clone()
        } else {
            self.auth.per_project.get(project_id).cloned()
        };
        let auth = auth.ok_or_else(|| auth_context_error(project_id))?;
        if !auth.is_complete() {
            return Err(auth_context_error(project_id));
        }
        Ok(auth)
    }

    /// Fails every operation of a target with the same preflight error.
    fn fail_target(
        &self,
        project_id: &str,
        operations: &[NormalizedOperation],
        error: &StandardError,
        actor: &str,
        correlation_id: &str,
        now: u64,
    ) -> TargetResult {
        let results: Vec<OperationResult> = operations
            .iter()
            .map(|operation| {
                let error = error.clone().contextualize(project_id, &operation.operation_id);
                self.failed_result(project_id, operation, error, actor, correlation_id, now)
            })
            .collect();
        TargetResult {
            project_id: project_id.to_string(),
            status: OperationStatus::Failed,
            operations: results,
        }
    }

    /// Records and returns one failed operation result.
    fn failed_result(
        &self,
        project_id: &str,
        operation: &NormalizedOperation,
        error: StandardError,
        actor: &str,
        correlation_id: &str,
        now: u64,
    ) -> OperationResult {
        let details = serde_json::to_value(&error).ok();
        self.append_audit(
            actor,
            now,
            project_id,
            operation,
            AuditOutcome::Failed,
            correlation_id,
            details,
        );
        OperationResult {
            operation_id: operation.operation_id.clone(),
            action: operation.action,
            status: OperationStatus::Failed,
            data: None,
            error: Some(error),
        }
    }

    /// Appends one audit entry with redacted details.
    #[allow(clippy::too_many_arguments, reason = "audit entries capture full operation context")]
    fn append_audit(
        &self,
        actor: &str,
        now: u64,
        project_id: &str,
        operation: &NormalizedOperation,
        outcome: AuditOutcome,
        correlation_id: &str,
        details: Option<Value>,
    ) {
        self.audit.append(AuditRecord {
            actor: actor.to_string(),
            timestamp: now,
            target_project: project_id.to_string(),
            operation_id: operation.operation_id.clone(),
            action: operation.action,
            outcome,
            correlation_id: correlation_id.to_string(),
            details: details.as_ref().map(redact_value),
        });
    }

    /// Locks the idempotency cache, recovering from poisoning.
    fn cache(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.idempotency.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the preflight error for a target without usable credentials.
fn auth_context_error(project_id: &str) -> StandardError {
    StandardError::new(
        ErrorCode::AuthContextRequired,
        format!("no usable credentials for project '{project_id}'"),
    )
    .with_remediation("configure endpoint and api_key for the target project")
    .with_target(project_id)
}

/// Normalizes an adapter failure: redacts the message and fills context.
fn normalize_error(mut error: StandardError, project_id: &str, operation_id: &str) -> StandardError {
    error.message = redact_message(&error.message);
    error.contextualize(project_id, operation_id)
}

/// Computes the scopes missing from an available set.
#[must_use]
pub fn missing_scopes(
    required: &BTreeSet<String>,
    available: &BTreeSet<String>,
) -> Vec<String> {
    required.difference(available).cloned().collect()
}
