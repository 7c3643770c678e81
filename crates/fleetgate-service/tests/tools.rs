// crates/fleetgate-service/tests/tools.rs
// ============================================================================
// Module: Tool Surface Tests
// Description: Tests for the read-only tools and confirm.issue.
// ============================================================================
//! ## Overview
//! Covers `capabilities.list`, `context.get`, `targets.resolve`,
//! `scopes.catalog.get`, `confirm.issue` validation, and the metrics seam.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;
use std::sync::Mutex;

use common::ScriptedAdapter;
use common::service_with;
use fleetgate_core::ErrorCode;
use fleetgate_core::SCOPE_CATALOG_VERSION;
use fleetgate_core::SelectorMode;
use fleetgate_core::TargetSelector;
use fleetgate_core::TargetSource;
use fleetgate_service::CapabilitiesRequest;
use fleetgate_service::ConfirmIssueRequest;
use fleetgate_service::ServiceMetrics;
use fleetgate_service::TargetsResolveRequest;
use fleetgate_service::ToolMetricEvent;
use fleetgate_service::Transport;

// ============================================================================
// SECTION: Capabilities
// ============================================================================

/// Tests the capability summary reflects the deployment.
#[test]
fn test_capabilities_summary() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));

    let response = service.capabilities_list(&CapabilitiesRequest::default()).unwrap();

    let caps = response.capabilities;
    assert!(caps.domains.project);
    assert!(caps.domains.database);
    assert!(caps.domains.operation);
    assert_eq!(caps.transport_default, Transport::Stdio);
    assert_eq!(caps.supported_transports, vec![Transport::Stdio, Transport::Http]);
    assert!(!caps.auto_targeting_enabled);
    assert_eq!(caps.scope_catalog_version, SCOPE_CATALOG_VERSION);
    assert!(!response.correlation_id.is_empty());
}

/// Tests a supported transport passes and an unknown one is rejected.
#[test]
fn test_capabilities_transport_validation() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));

    let ok = service.capabilities_list(&CapabilitiesRequest {
        transport: Some("http".to_string()),
    });
    assert!(ok.is_ok());

    let denied = service
        .capabilities_list(&CapabilitiesRequest {
            transport: Some("smoke-signal".to_string()),
        })
        .unwrap_err();
    assert_eq!(denied.error.code, ErrorCode::CapabilityUnavailable);
    assert_eq!(denied.status, "FAILED");
    assert!(denied.error.supported_transports.is_some());
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Tests the context report matches the configured directory.
#[test]
fn test_context_report() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));

    let response = service.context_get().unwrap();

    assert_eq!(response.known_project_ids, vec!["p_a".to_string(), "p_b".to_string()]);
    assert_eq!(response.alias_count, 1);
    assert!(response.auto_target_project_ids.is_empty());
    assert!(response.default_target_selector.is_none());
}

// ============================================================================
// SECTION: Target Resolution Tool
// ============================================================================

/// Tests the resolve tool reports targets and their source.
#[test]
fn test_targets_resolve_tool() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));

    let response = service
        .targets_resolve(&TargetsResolveRequest {
            targets: Vec::new(),
            target_selector: Some(TargetSelector {
                mode: SelectorMode::Alias,
                values: vec!["prod".to_string()],
            }),
        })
        .unwrap();

    assert_eq!(response.source, TargetSource::Selector);
    assert_eq!(response.resolved_targets.len(), 1);
    assert_eq!(response.resolved_targets[0].project_id, "p_a");
}

/// Tests resolution failures surface as error responses.
#[test]
fn test_targets_resolve_failure() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));

    let denied = service.targets_resolve(&TargetsResolveRequest::default()).unwrap_err();

    assert_eq!(denied.error.code, ErrorCode::TargetAmbiguous);
}

// ============================================================================
// SECTION: Scope Catalog Tool
// ============================================================================

/// Tests the catalog tool exposes the static catalog verbatim.
#[test]
fn test_scope_catalog_tool() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));

    let response = service.scopes_catalog_get().unwrap();

    assert_eq!(response.catalog_version, SCOPE_CATALOG_VERSION);
    let entry = response.actions.get("database.create").unwrap();
    assert_eq!(entry.required_scopes, vec!["databases.write".to_string()]);
    assert!(response.actions.contains_key("auth.users.update.labels"));
    assert!(response.actions.contains_key("function.deployment.trigger"));
}

// ============================================================================
// SECTION: Confirm Issue
// ============================================================================

/// Tests TTL bounds on token issuance.
#[test]
fn test_confirm_issue_ttl_bounds() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));

    let too_short = service
        .confirm_issue(&ConfirmIssueRequest {
            plan_hash: "h".repeat(64),
            ttl_seconds: Some(10),
        })
        .unwrap_err();
    assert_eq!(too_short.error.code, ErrorCode::ValidationError);

    let too_long = service
        .confirm_issue(&ConfirmIssueRequest {
            plan_hash: "h".repeat(64),
            ttl_seconds: Some(10_000),
        })
        .unwrap_err();
    assert_eq!(too_long.error.code, ErrorCode::ValidationError);

    let ok = service
        .confirm_issue(&ConfirmIssueRequest {
            plan_hash: "h".repeat(64),
            ttl_seconds: Some(30),
        })
        .unwrap();
    assert!(ok.token.contains('.'));
}

/// Tests a blank plan hash is rejected.
#[test]
fn test_confirm_issue_requires_hash() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));

    let denied = service
        .confirm_issue(&ConfirmIssueRequest {
            plan_hash: "  ".to_string(),
            ttl_seconds: None,
        })
        .unwrap_err();

    assert_eq!(denied.error.code, ErrorCode::ValidationError);
}

// ============================================================================
// SECTION: Metrics
// ============================================================================

/// Metrics sink collecting events for assertions.
#[derive(Default)]
struct CollectingMetrics {
    events: Mutex<Vec<ToolMetricEvent>>,
}

impl ServiceMetrics for CollectingMetrics {
    fn record(&self, event: ToolMetricEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Tests tool invocations report outcome metrics.
#[test]
fn test_metrics_record_outcomes() {
    use fleetgate_core::AuthDirectory;
    use fleetgate_core::InMemoryAuditLog;
    use fleetgate_core::TargetDirectory;
    use fleetgate_service::ControlService;
    use fleetgate_service::ControlServiceConfig;
    use fleetgate_service::ToolName;
    use fleetgate_service::ToolOutcome;

    let metrics = Arc::new(CollectingMetrics::default());
    let service = ControlService::new(ControlServiceConfig {
        directory: TargetDirectory::default(),
        auth: AuthDirectory::default(),
        adapter: Arc::new(ScriptedAdapter::default()),
        audit: Arc::new(InMemoryAuditLog::new()),
        confirmation_secret: "integration-secret".to_string(),
        plan_ttl_seconds: 900,
        transport_default: Transport::Stdio,
        metrics: Arc::clone(&metrics) as Arc<dyn ServiceMetrics>,
    });

    service.context_get().unwrap();
    service.targets_resolve(&TargetsResolveRequest::default()).unwrap_err();

    let events = metrics.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].tool, ToolName::ContextGet);
    assert_eq!(events[0].outcome, ToolOutcome::Ok);
    assert_eq!(events[1].tool, ToolName::TargetsResolve);
    assert_eq!(events[1].outcome, ToolOutcome::Failed);
}
