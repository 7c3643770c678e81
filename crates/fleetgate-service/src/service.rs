// crates/fleetgate-service/src/service.rs
// ============================================================================
// Module: Fleetgate Control Service
// Description: Facade implementing the seven tool operations.
// Purpose: Wire planning, policy, and execution into one canonical surface.
// Dependencies: fleetgate-core, fleetgate-config, serde
// ============================================================================

//! ## Overview
//! The control service owns the plan store, the audit log, the confirmation
//! token service, and the mutation executor, and exposes the seven tool
//! operations the framing layer serves: `capabilities.list`, `context.get`,
//! `targets.resolve`, `scopes.catalog.get`, `changes.preview`,
//! `changes.apply`, and `confirm.issue`. All handlers are thin wrappers over
//! the core engine: decode, validate, dispatch, respond.
//!
//! ## Invariants
//! - Every invocation mints exactly one correlation ID and threads it
//!   through every audit entry it produces.
//! - Client-supplied `credentials` are ignored in favor of process
//!   configuration; this is a security invariant, not a fallback.
//! - Validation, planning, and policy failures produce a
//!   [`MutationErrorResponse`] with no side effects and no upstream calls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use fleetgate_appwrite::AppwriteAdapter;
use fleetgate_appwrite::AppwriteAdapterConfig;
use fleetgate_config::FleetConfig;
use fleetgate_core::AuditOutcome;
use fleetgate_core::AuditRecord;
use fleetgate_core::AuditSink;
use fleetgate_core::AuthDirectory;
use fleetgate_core::BatchStatus;
use fleetgate_core::ConfirmationTokenService;
use fleetgate_core::DEFAULT_PLAN_TTL_SECONDS;
use fleetgate_core::ErrorCode;
use fleetgate_core::InMemoryAuditLog;
use fleetgate_core::MutationExecutor;
use fleetgate_core::NormalizedOperation;
use fleetgate_core::Operation;
use fleetgate_core::Plan;
use fleetgate_core::PlanError;
use fleetgate_core::PlanManager;
use fleetgate_core::ResolvedTarget;
use fleetgate_core::SCOPE_CATALOG_VERSION;
use fleetgate_core::StandardError;
use fleetgate_core::TargetDirectory;
use fleetgate_core::TargetInput;
use fleetgate_core::TargetResult;
use fleetgate_core::TargetSelector;
use fleetgate_core::TargetSource;
use fleetgate_core::TokenVerification;
use fleetgate_core::UpstreamAdapter;
use fleetgate_core::scope_catalog;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::capabilities::Capabilities;
use crate::capabilities::CapabilityRegistry;
use crate::capabilities::Transport;
use crate::correlation::CorrelationIdGenerator;
use crate::metrics::NoopMetrics;
use crate::metrics::ServiceMetrics;
use crate::metrics::ToolMetricEvent;
use crate::metrics::ToolName;
use crate::metrics::ToolOutcome;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default confirmation token TTL in seconds.
pub const DEFAULT_CONFIRM_TTL_SECONDS: u64 = 300;
/// Minimum confirmation token TTL in seconds.
pub const MIN_CONFIRM_TTL_SECONDS: u64 = 30;
/// Maximum confirmation token TTL in seconds.
pub const MAX_CONFIRM_TTL_SECONDS: u64 = 7_200;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Request payload for `capabilities.list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapabilitiesRequest {
    /// Transport the client intends to use.
    #[serde(default)]
    pub transport: Option<String>,
}

/// Request payload for `targets.resolve`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetsResolveRequest {
    /// Explicit targets.
    #[serde(default)]
    pub targets: Vec<TargetInput>,
    /// Selector applied when no explicit targets are given.
    #[serde(default)]
    pub target_selector: Option<TargetSelector>,
}

/// Request payload for `changes.preview`.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    /// Actor requesting the change.
    pub actor: String,
    /// Explicit targets.
    #[serde(default)]
    pub targets: Vec<TargetInput>,
    /// Selector applied when no explicit targets are given.
    #[serde(default)]
    pub target_selector: Option<TargetSelector>,
    /// Operations to plan.
    pub operations: Vec<Operation>,
    /// Transport the client intends to use.
    #[serde(default)]
    pub transport: Option<String>,
    /// Client-supplied credentials; always ignored.
    #[serde(default)]
    pub credentials: Option<Value>,
}

/// Request payload for `changes.apply`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyRequest {
    /// Actor requesting the change.
    pub actor: String,
    /// Explicit targets.
    #[serde(default)]
    pub targets: Vec<TargetInput>,
    /// Selector applied when no explicit targets are given.
    #[serde(default)]
    pub target_selector: Option<TargetSelector>,
    /// Operations to execute; must rehash to the previewed plan.
    pub operations: Vec<Operation>,
    /// Plan identifier returned by preview.
    #[serde(default)]
    pub plan_id: Option<String>,
    /// Plan hash returned by preview.
    #[serde(default)]
    pub plan_hash: Option<String>,
    /// Confirmation token for critical plans.
    #[serde(default)]
    pub confirmation_token: Option<String>,
    /// Transport the client intends to use.
    #[serde(default)]
    pub transport: Option<String>,
    /// Client-supplied credentials; always ignored.
    #[serde(default)]
    pub credentials: Option<Value>,
}

/// Request payload for `confirm.issue`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmIssueRequest {
    /// Plan hash the token binds to.
    pub plan_hash: String,
    /// Token TTL override in seconds.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Response payload for `capabilities.list`.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilitiesResponse {
    /// Correlation ID for this invocation.
    pub correlation_id: String,
    /// One-line summary.
    pub summary: String,
    /// Capability summary.
    pub capabilities: Capabilities,
}

/// Response payload for `context.get`.
#[derive(Debug, Clone, Serialize)]
pub struct ContextResponse {
    /// Correlation ID for this invocation.
    pub correlation_id: String,
    /// One-line summary.
    pub summary: String,
    /// Known project identifiers.
    pub known_project_ids: Vec<String>,
    /// Number of configured aliases.
    pub alias_count: usize,
    /// Projects selected by the auto rule.
    pub auto_target_project_ids: Vec<String>,
    /// Selector applied when a request carries none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_target_selector: Option<TargetSelector>,
}

/// Response payload for `targets.resolve`.
#[derive(Debug, Clone, Serialize)]
pub struct TargetsResolveResponse {
    /// Correlation ID for this invocation.
    pub correlation_id: String,
    /// One-line summary.
    pub summary: String,
    /// Resolved targets, in resolution order.
    pub resolved_targets: Vec<ResolvedTarget>,
    /// How the targets were selected.
    pub source: TargetSource,
}

/// Scopes for one catalog action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionScopes {
    /// Minimum scopes for the action.
    pub required_scopes: Vec<String>,
}

/// Response payload for `scopes.catalog.get`.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeCatalogResponse {
    /// Correlation ID for this invocation.
    pub correlation_id: String,
    /// One-line summary.
    pub summary: String,
    /// Catalog version tag.
    pub catalog_version: String,
    /// Scopes per action.
    pub actions: BTreeMap<String, ActionScopes>,
}

/// Response payload for `changes.preview`.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    /// Correlation ID for this invocation.
    pub correlation_id: String,
    /// Fixed preview status.
    pub status: &'static str,
    /// One-line summary.
    pub summary: String,
    /// The stored plan.
    pub plan: Plan,
}

/// Response payload for `changes.apply`.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyResponse {
    /// Correlation ID for this invocation.
    pub correlation_id: String,
    /// Aggregate batch status.
    pub status: BatchStatus,
    /// One-line summary.
    pub summary: String,
    /// Plan the apply executed.
    pub plan_id: String,
    /// Per-target results, aligned with the plan's target order.
    pub target_results: Vec<TargetResult>,
}

/// Response payload for `confirm.issue`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmIssueResponse {
    /// Correlation ID for this invocation.
    pub correlation_id: String,
    /// One-line summary.
    pub summary: String,
    /// Signed confirmation token.
    pub token: String,
    /// Unix-seconds token expiry.
    pub expires_at: u64,
}

/// Error response shared by every tool operation.
#[derive(Debug, Clone, Serialize)]
pub struct MutationErrorResponse {
    /// Correlation ID for this invocation.
    pub correlation_id: String,
    /// Fixed failure status.
    pub status: &'static str,
    /// One-line summary.
    pub summary: String,
    /// Failure record.
    pub error: StandardError,
}

// ============================================================================
// SECTION: Service Configuration
// ============================================================================

/// Configuration inputs for building a control service.
pub struct ControlServiceConfig {
    /// Immutable targeting state.
    pub directory: TargetDirectory,
    /// Immutable credential directory.
    pub auth: AuthDirectory,
    /// Upstream adapter handle.
    pub adapter: Arc<dyn UpstreamAdapter>,
    /// Audit sink shared by planning and execution.
    pub audit: Arc<dyn AuditSink>,
    /// Confirmation token secret.
    pub confirmation_secret: String,
    /// Plan time-to-live in seconds.
    pub plan_ttl_seconds: u64,
    /// Default transport advertised in capabilities.
    pub transport_default: Transport,
    /// Metrics sink.
    pub metrics: Arc<dyn ServiceMetrics>,
}

impl ControlServiceConfig {
    /// Builds service configuration from a validated fleet config.
    #[must_use]
    pub fn from_fleet_config(config: &FleetConfig, adapter: Arc<dyn UpstreamAdapter>) -> Self {
        Self {
            directory: config.target_directory(),
            auth: config.auth_directory(),
            adapter,
            audit: Arc::new(InMemoryAuditLog::new()),
            confirmation_secret: config.confirmation_secret().to_string(),
            plan_ttl_seconds: config.plan_ttl_seconds.unwrap_or(DEFAULT_PLAN_TTL_SECONDS),
            transport_default: Transport::Stdio,
            metrics: Arc::new(NoopMetrics),
        }
    }
}

// ============================================================================
// SECTION: Control Service
// ============================================================================

/// Control service facade owning the plan store, audit log, and executor.
pub struct ControlService {
    /// Immutable targeting state.
    directory: TargetDirectory,
    /// Plan manager and store.
    plans: PlanManager,
    /// Confirmation token service.
    confirm: ConfirmationTokenService,
    /// Mutation executor.
    executor: MutationExecutor,
    /// Audit sink shared with the executor.
    audit: Arc<dyn AuditSink>,
    /// Correlation ID generator.
    correlation: CorrelationIdGenerator,
    /// Capability registry.
    capabilities: CapabilityRegistry,
    /// Metrics sink.
    metrics: Arc<dyn ServiceMetrics>,
}

impl ControlService {
    /// Builds a control service from configuration.
    #[must_use]
    pub fn new(config: ControlServiceConfig) -> Self {
        let capabilities = CapabilityRegistry::new(
            config.transport_default,
            config.auth.management_enabled(),
            config.directory.auto_targeting_enabled(),
        );
        let executor = MutationExecutor::new(
            Arc::clone(&config.adapter),
            Arc::clone(&config.audit),
            config.auth,
        );
        Self {
            directory: config.directory,
            plans: PlanManager::new(config.plan_ttl_seconds),
            confirm: ConfirmationTokenService::new(config.confirmation_secret.into_bytes()),
            executor,
            audit: config.audit,
            correlation: CorrelationIdGenerator::default(),
            capabilities,
            metrics: config.metrics,
        }
    }

    /// Builds a production service from a validated fleet config, wiring
    /// the Appwrite adapter with the config's legacy-alias switch.
    ///
    /// # Errors
    ///
    /// Returns [`StandardError`] when the HTTP client cannot be built.
    pub fn from_fleet_config(config: &FleetConfig) -> Result<Self, StandardError> {
        let adapter_config = AppwriteAdapterConfig {
            allow_legacy_user_update: config.allow_legacy_user_update.unwrap_or(true),
            ..AppwriteAdapterConfig::default()
        };
        let adapter = Arc::new(AppwriteAdapter::new(adapter_config)?);
        Ok(Self::new(ControlServiceConfig::from_fleet_config(config, adapter)))
    }

    /// Returns the audit entries recorded so far.
    #[must_use]
    pub fn audit_log(&self) -> Vec<AuditRecord> {
        self.audit.list()
    }

    /// Implements `capabilities.list`.
    ///
    /// # Errors
    ///
    /// Returns [`MutationErrorResponse`] for an unsupported transport.
    pub fn capabilities_list(
        &self,
        request: &CapabilitiesRequest,
    ) -> Result<CapabilitiesResponse, MutationErrorResponse> {
        let correlation_id = self.correlation.issue();
        if let Err(error) = self.capabilities.validate_transport(request.transport.as_deref()) {
            return Err(self.fail(ToolName::CapabilitiesList, correlation_id, error));
        }
        self.ok(ToolName::CapabilitiesList);
        let capabilities = self.capabilities.capabilities();
        Ok(CapabilitiesResponse {
            correlation_id,
            summary: format!(
                "{} transports; auto targeting {}",
                capabilities.supported_transports.len(),
                if capabilities.auto_targeting_enabled { "enabled" } else { "disabled" },
            ),
            capabilities,
        })
    }

    /// Implements `context.get`.
    ///
    /// # Errors
    ///
    /// Never fails today; the error type keeps the surface uniform.
    pub fn context_get(&self) -> Result<ContextResponse, MutationErrorResponse> {
        let correlation_id = self.correlation.issue();
        self.ok(ToolName::ContextGet);
        Ok(ContextResponse {
            correlation_id,
            summary: format!("{} project(s) configured", self.directory.known_project_ids.len()),
            known_project_ids: self.directory.known_project_ids.clone(),
            alias_count: self.directory.alias_map.len(),
            auto_target_project_ids: self.directory.auto_target_project_ids.clone(),
            default_target_selector: self.directory.default_target_selector.clone(),
        })
    }

    /// Implements `targets.resolve`.
    ///
    /// # Errors
    ///
    /// Returns [`MutationErrorResponse`] when resolution fails.
    pub fn targets_resolve(
        &self,
        request: &TargetsResolveRequest,
    ) -> Result<TargetsResolveResponse, MutationErrorResponse> {
        let correlation_id = self.correlation.issue();
        match fleetgate_core::resolve_targets(
            &self.directory,
            &request.targets,
            request.target_selector.as_ref(),
        ) {
            Ok((resolved_targets, source)) => {
                self.ok(ToolName::TargetsResolve);
                Ok(TargetsResolveResponse {
                    correlation_id,
                    summary: format!(
                        "resolved {} target(s) via {}",
                        resolved_targets.len(),
                        source.as_str(),
                    ),
                    resolved_targets,
                    source,
                })
            }
            Err(error) => Err(self.fail(ToolName::TargetsResolve, correlation_id, error)),
        }
    }

    /// Implements `scopes.catalog.get`.
    ///
    /// # Errors
    ///
    /// Never fails today; the error type keeps the surface uniform.
    pub fn scopes_catalog_get(&self) -> Result<ScopeCatalogResponse, MutationErrorResponse> {
        let correlation_id = self.correlation.issue();
        self.ok(ToolName::ScopesCatalogGet);
        let actions: BTreeMap<String, ActionScopes> = scope_catalog()
            .iter()
            .map(|(action, scopes)| {
                (
                    action.as_str().to_string(),
                    ActionScopes {
                        required_scopes: scopes.iter().cloned().collect(),
                    },
                )
            })
            .collect();
        Ok(ScopeCatalogResponse {
            correlation_id,
            summary: format!("{} action(s) cataloged", actions.len()),
            catalog_version: SCOPE_CATALOG_VERSION.to_string(),
            actions,
        })
    }

    /// Implements `changes.preview`.
    ///
    /// # Errors
    ///
    /// Returns [`MutationErrorResponse`] for validation and resolution
    /// failures. Previews have no side effects beyond the stored plan and
    /// its `planned` audit entries.
    pub fn changes_preview(
        &self,
        request: &PreviewRequest,
    ) -> Result<PreviewResponse, MutationErrorResponse> {
        let correlation_id = self.correlation.issue();
        let now = unix_now();
        let tool = ToolName::ChangesPreview;

        let (targets, _source) = match self.admit_mutation(
            &request.actor,
            &request.targets,
            request.target_selector.as_ref(),
            &request.operations,
            request.transport.as_deref(),
        ) {
            Ok(resolved) => resolved,
            Err(error) => return Err(self.fail(tool, correlation_id, error)),
        };

        let (plan, _normalized) =
            match self.plans.build_and_store(&request.actor, &targets, &request.operations, now) {
                Ok(built) => built,
                Err(error) => {
                    return Err(self.fail(tool, correlation_id, plan_error_to_standard(error)));
                }
            };
        self.audit_planned(&plan, &correlation_id, now);
        self.plans.purge_expired(now);
        self.ok(tool);
        Ok(PreviewResponse {
            correlation_id,
            status: "PLANNED",
            summary: format!(
                "planned {} operation(s) across {} project(s); risk {}",
                plan.operations.len(),
                plan.target_projects.len(),
                plan.risk_level.as_str(),
            ),
            plan,
        })
    }

    /// Implements `changes.apply`.
    ///
    /// # Errors
    ///
    /// Returns [`MutationErrorResponse`] for validation, plan, and policy
    /// failures; none of these reach the upstream service. Per-operation
    /// execution failures surface inside the [`ApplyResponse`] instead.
    pub fn changes_apply(
        &self,
        request: &ApplyRequest,
    ) -> Result<ApplyResponse, MutationErrorResponse> {
        let correlation_id = self.correlation.issue();
        let now = unix_now();
        let tool = ToolName::ChangesApply;

        let (targets, _source) = match self.admit_mutation(
            &request.actor,
            &request.targets,
            request.target_selector.as_ref(),
            &request.operations,
            request.transport.as_deref(),
        ) {
            Ok(resolved) => resolved,
            Err(error) => return Err(self.fail(tool, correlation_id, error)),
        };

        let plan_id = request.plan_id.as_deref().unwrap_or_default();
        let plan_hash = request.plan_hash.as_deref().unwrap_or_default();
        let (plan, normalized) = match self.plans.require_matching(
            &request.actor,
            &targets,
            &request.operations,
            plan_id,
            plan_hash,
            now,
        ) {
            Ok(matched) => matched,
            Err(error) => {
                return Err(self.fail(tool, correlation_id, plan_error_to_standard(error)));
            }
        };

        if let Err(error) =
            self.enforce_confirmation(&plan, &normalized, request.confirmation_token.as_deref(), now)
        {
            return Err(self.fail(tool, correlation_id, error));
        }

        self.audit_planned(&plan, &correlation_id, now);
        let report =
            self.executor.execute(&targets, &normalized, &request.actor, &correlation_id, now);
        self.plans.purge_expired(now);
        self.ok(tool);
        Ok(ApplyResponse {
            correlation_id,
            status: report.status,
            summary: format!(
                "applied {} operation(s) across {} project(s): {}",
                normalized.len(),
                targets.len(),
                report.status.as_str(),
            ),
            plan_id: plan.plan_id,
            target_results: report.target_results,
        })
    }

    /// Implements `confirm.issue`.
    ///
    /// # Errors
    ///
    /// Returns [`MutationErrorResponse`] for an invalid hash or TTL.
    pub fn confirm_issue(
        &self,
        request: &ConfirmIssueRequest,
    ) -> Result<ConfirmIssueResponse, MutationErrorResponse> {
        let correlation_id = self.correlation.issue();
        let now = unix_now();
        let tool = ToolName::ConfirmIssue;

        if request.plan_hash.trim().is_empty() {
            let error =
                StandardError::new(ErrorCode::ValidationError, "plan_hash must be non-empty");
            return Err(self.fail(tool, correlation_id, error));
        }
        let ttl = request.ttl_seconds.unwrap_or(DEFAULT_CONFIRM_TTL_SECONDS);
        if !(MIN_CONFIRM_TTL_SECONDS..=MAX_CONFIRM_TTL_SECONDS).contains(&ttl) {
            let error = StandardError::new(
                ErrorCode::ValidationError,
                format!(
                    "ttl_seconds must be within [{MIN_CONFIRM_TTL_SECONDS}, {MAX_CONFIRM_TTL_SECONDS}]"
                ),
            );
            return Err(self.fail(tool, correlation_id, error));
        }

        let expires_at = now.saturating_add(ttl);
        match self.confirm.issue(&request.plan_hash, expires_at) {
            Ok(token) => {
                self.ok(tool);
                Ok(ConfirmIssueResponse {
                    correlation_id,
                    summary: format!("confirmation issued; expires in {ttl}s"),
                    token,
                    expires_at,
                })
            }
            Err(error) => {
                let error = StandardError::new(ErrorCode::InternalError, error.to_string())
                    .retryable(true);
                Err(self.fail(tool, correlation_id, error))
            }
        }
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    /// Shared admission path for preview and apply.
    fn admit_mutation(
        &self,
        actor: &str,
        targets: &[TargetInput],
        selector: Option<&TargetSelector>,
        operations: &[Operation],
        transport: Option<&str>,
    ) -> Result<(Vec<ResolvedTarget>, TargetSource), StandardError> {
        self.capabilities.validate_transport(transport)?;
        if actor.trim().is_empty() {
            return Err(StandardError::new(
                ErrorCode::ValidationError,
                "actor must be non-empty",
            ));
        }
        if operations.is_empty() {
            return Err(StandardError::new(
                ErrorCode::ValidationError,
                "operations must be non-empty",
            ));
        }
        for (position, operation) in operations.iter().enumerate() {
            if operation.operation_id.trim().is_empty() {
                return Err(StandardError::new(
                    ErrorCode::ValidationError,
                    format!("operations[{position}].operation_id must be non-empty"),
                ));
            }
            if let Some(domain) = operation.domain
                && domain != operation.action.domain()
            {
                return Err(StandardError::new(
                    ErrorCode::ValidationError,
                    format!(
                        "operations[{position}] claims domain '{}' but action '{}' belongs to '{}'",
                        domain.as_str(),
                        operation.action,
                        operation.action.domain().as_str(),
                    ),
                )
                .with_operation(operation.operation_id.clone()));
            }
        }
        if targets.is_empty() && selector.is_none() && !self.directory.auto_targeting_enabled() {
            return Err(StandardError::new(
                ErrorCode::ValidationError,
                "neither targets nor target_selector provided",
            ));
        }
        fleetgate_core::resolve_targets(&self.directory, targets, selector)
    }

    /// Enforces the destructive-policy gate before any upstream call.
    fn enforce_confirmation(
        &self,
        plan: &Plan,
        normalized: &[NormalizedOperation],
        token: Option<&str>,
        now: u64,
    ) -> Result<(), StandardError> {
        if !normalized.iter().any(|operation| operation.critical) {
            return Ok(());
        }
        let Some(token) = token else {
            return Err(StandardError::new(
                ErrorCode::ConfirmRequired,
                "plan contains critical operations and requires a confirmation token",
            )
            .with_remediation("issue a token via confirm.issue and retry"));
        };
        match self.confirm.verify(token, &plan.plan_hash, now) {
            TokenVerification::Ok => Ok(()),
            TokenVerification::Expired => Err(StandardError::new(
                ErrorCode::ConfirmRequired,
                "confirmation token has expired",
            )
            .with_remediation("issue a fresh token via confirm.issue and retry")),
            TokenVerification::Invalid => Err(StandardError::new(
                ErrorCode::InvalidConfirmToken,
                "confirmation token is malformed or carries a bad signature",
            )),
            TokenVerification::Mismatch => Err(StandardError::new(
                ErrorCode::InvalidConfirmToken,
                "confirmation token is bound to a different plan",
            )),
        }
    }

    /// Appends `planned` audit entries for every target and operation.
    fn audit_planned(&self, plan: &Plan, correlation_id: &str, now: u64) {
        for target_project in &plan.target_projects {
            for operation in &plan.operations {
                self.audit.append(AuditRecord {
                    actor: plan.actor.clone(),
                    timestamp: now,
                    target_project: target_project.clone(),
                    operation_id: operation.operation_id.clone(),
                    action: operation.action,
                    outcome: AuditOutcome::Planned,
                    correlation_id: correlation_id.to_string(),
                    details: None,
                });
            }
        }
    }

    /// Records a successful invocation.
    fn ok(&self, tool: ToolName) {
        self.metrics.record(ToolMetricEvent {
            tool,
            outcome: ToolOutcome::Ok,
        });
    }

    /// Records a failed invocation and builds the error response.
    fn fail(
        &self,
        tool: ToolName,
        correlation_id: String,
        error: StandardError,
    ) -> MutationErrorResponse {
        self.metrics.record(ToolMetricEvent {
            tool,
            outcome: ToolOutcome::Failed,
        });
        MutationErrorResponse {
            correlation_id,
            status: "FAILED",
            summary: format!("{} failed: {}", tool.as_str(), error.code),
            error,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a plan error to its standard form.
fn plan_error_to_standard(error: PlanError) -> StandardError {
    match error {
        PlanError::Mismatch(message) => StandardError::new(ErrorCode::PlanMismatch, message)
            .with_remediation("run changes.preview again and apply the fresh plan"),
        PlanError::Hash(err) => {
            StandardError::new(ErrorCode::InternalError, err.to_string()).retryable(true)
        }
    }
}

/// Reads the current unix time in seconds.
fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
