// crates/fleetgate-service/tests/preview_apply.rs
// ============================================================================
// Module: Preview/Apply Tests
// Description: End-to-end scenarios over the control service.
// ============================================================================
//! ## Overview
//! Drives the full preview/apply path against a scripted adapter: plan
//! shape, partial success, the confirmation gate, tamper rejection, scope
//! monotonicity, idempotent replay, ordering, and redaction.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::ScriptedAdapter;
use common::service_with;
use fleetgate_core::Action;
use fleetgate_core::AuditOutcome;
use fleetgate_core::BatchStatus;
use fleetgate_core::ErrorCode;
use fleetgate_core::Operation;
use fleetgate_core::OperationStatus;
use fleetgate_core::RiskLevel;
use fleetgate_core::TargetInput;
use fleetgate_service::ApplyRequest;
use fleetgate_service::ConfirmIssueRequest;
use fleetgate_service::PreviewRequest;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Request Builders
// ============================================================================

/// Target input naming a project directly.
fn by_id(project_id: &str) -> TargetInput {
    TargetInput {
        project_id: Some(project_id.to_string()),
        alias: None,
    }
}

/// Operation with defaults.
fn operation(id: &str, action: Action, params: Value) -> Operation {
    Operation {
        operation_id: id.to_string(),
        domain: None,
        action,
        params,
        required_scopes: BTreeSet::new(),
        destructive: None,
        critical: None,
        idempotency_key: None,
    }
}

/// Preview request over explicit targets.
fn preview_request(targets: Vec<TargetInput>, operations: Vec<Operation>) -> PreviewRequest {
    PreviewRequest {
        actor: "ops-bot".to_string(),
        targets,
        target_selector: None,
        operations,
        transport: None,
        credentials: None,
    }
}

/// Apply request echoing a previewed plan.
fn apply_request(
    targets: Vec<TargetInput>,
    operations: Vec<Operation>,
    plan_id: &str,
    plan_hash: &str,
    confirmation_token: Option<String>,
) -> ApplyRequest {
    ApplyRequest {
        actor: "ops-bot".to_string(),
        targets,
        target_selector: None,
        operations,
        plan_id: Some(plan_id.to_string()),
        plan_hash: Some(plan_hash.to_string()),
        confirmation_token,
        transport: None,
        credentials: None,
    }
}

// ============================================================================
// SECTION: Happy Path
// ============================================================================

/// Tests a two-target database creation previews LOW risk and applies in
/// order.
#[test]
fn test_two_target_database_create() {
    let adapter = Arc::new(ScriptedAdapter::default());
    let service = service_with(Arc::clone(&adapter));
    let targets = vec![by_id("p_a"), by_id("p_b")];
    let ops = vec![operation(
        "op-1",
        Action::DatabaseCreate,
        json!({"database_id": "db-main", "name": "Main DB"}),
    )];

    let preview = service.changes_preview(&preview_request(targets.clone(), ops.clone())).unwrap();
    assert_eq!(preview.status, "PLANNED");
    assert_eq!(preview.plan.destructive_count, 0);
    assert_eq!(preview.plan.risk_level, RiskLevel::Low);
    assert_eq!(preview.plan.required_scopes, vec!["databases.write".to_string()]);
    assert_eq!(preview.plan.target_projects, vec!["p_a".to_string(), "p_b".to_string()]);

    let apply = service
        .changes_apply(&apply_request(
            targets,
            ops,
            &preview.plan.plan_id,
            &preview.plan.plan_hash,
            None,
        ))
        .unwrap();

    assert_eq!(apply.status, BatchStatus::Success);
    assert_eq!(apply.target_results.len(), 2);
    for (index, result) in apply.target_results.iter().enumerate() {
        assert_eq!(result.project_id, preview.plan.target_projects[index]);
    }
    assert_eq!(adapter.recorded().len(), 2);
}

/// Tests one failing target surfaces PARTIAL_SUCCESS with a failed audit
/// entry.
#[test]
fn test_partial_success() {
    let adapter = Arc::new(ScriptedAdapter::failing("p_b"));
    let service = service_with(Arc::clone(&adapter));
    let targets = vec![by_id("p_a"), by_id("p_b")];
    let ops = vec![operation(
        "op-1",
        Action::DatabaseCreate,
        json!({"database_id": "db-main", "name": "Main DB"}),
    )];

    let preview = service.changes_preview(&preview_request(targets.clone(), ops.clone())).unwrap();
    let apply = service
        .changes_apply(&apply_request(
            targets,
            ops,
            &preview.plan.plan_id,
            &preview.plan.plan_hash,
            None,
        ))
        .unwrap();

    assert_eq!(apply.status, BatchStatus::PartialSuccess);
    assert_eq!(apply.target_results[0].status, OperationStatus::Success);
    assert_eq!(apply.target_results[1].status, OperationStatus::Failed);
    let failed_for_b = service
        .audit_log()
        .into_iter()
        .filter(|r| r.outcome == AuditOutcome::Failed && r.target_project == "p_b")
        .count();
    assert!(failed_for_b >= 1);
}

// ============================================================================
// SECTION: Confirmation Gate
// ============================================================================

/// Tests a critical deletion requires a confirmation token before any
/// upstream call.
#[test]
fn test_critical_delete_requires_confirmation() {
    let adapter = Arc::new(ScriptedAdapter::default());
    let service = service_with(Arc::clone(&adapter));
    let targets = vec![by_id("p_a")];
    let ops = vec![operation("op-1", Action::ProjectDelete, json!({"project_id": "p_a"}))];

    let preview = service.changes_preview(&preview_request(targets.clone(), ops.clone())).unwrap();
    assert_eq!(preview.plan.risk_level, RiskLevel::High);

    let denied = service
        .changes_apply(&apply_request(
            targets.clone(),
            ops.clone(),
            &preview.plan.plan_id,
            &preview.plan.plan_hash,
            None,
        ))
        .unwrap_err();
    assert_eq!(denied.error.code, ErrorCode::ConfirmRequired);
    assert!(adapter.recorded().is_empty());

    let confirm = service
        .confirm_issue(&ConfirmIssueRequest {
            plan_hash: preview.plan.plan_hash.clone(),
            ttl_seconds: None,
        })
        .unwrap();
    let apply = service
        .changes_apply(&apply_request(
            targets,
            ops,
            &preview.plan.plan_id,
            &preview.plan.plan_hash,
            Some(confirm.token),
        ))
        .unwrap();

    assert_eq!(apply.status, BatchStatus::Success);
    assert_eq!(adapter.recorded().len(), 1);
    assert_eq!(adapter.recorded()[0].api_key, "management-key");
}

/// Tests a token bound to another plan is rejected as invalid.
#[test]
fn test_foreign_token_rejected() {
    let adapter = Arc::new(ScriptedAdapter::default());
    let service = service_with(Arc::clone(&adapter));
    let targets = vec![by_id("p_a")];
    let ops = vec![operation("op-1", Action::ProjectDelete, json!({"project_id": "p_a"}))];

    let preview = service.changes_preview(&preview_request(targets.clone(), ops.clone())).unwrap();
    let foreign = service
        .confirm_issue(&ConfirmIssueRequest {
            plan_hash: "0000000000000000000000000000000000000000000000000000000000000000"
                .to_string(),
            ttl_seconds: None,
        })
        .unwrap();

    let denied = service
        .changes_apply(&apply_request(
            targets,
            ops,
            &preview.plan.plan_id,
            &preview.plan.plan_hash,
            Some(foreign.token),
        ))
        .unwrap_err();

    assert_eq!(denied.error.code, ErrorCode::InvalidConfirmToken);
    assert!(adapter.recorded().is_empty());
}

// ============================================================================
// SECTION: Plan Integrity
// ============================================================================

/// Tests a tampered plan hash is rejected with zero upstream calls.
#[test]
fn test_tampered_plan_hash_rejected() {
    let adapter = Arc::new(ScriptedAdapter::default());
    let service = service_with(Arc::clone(&adapter));
    let targets = vec![by_id("p_a")];
    let ops = vec![operation(
        "op-1",
        Action::DatabaseCreate,
        json!({"database_id": "db-main", "name": "Main DB"}),
    )];

    let preview = service.changes_preview(&preview_request(targets.clone(), ops.clone())).unwrap();
    let tampered = format!("{}x", preview.plan.plan_hash);
    let denied = service
        .changes_apply(&apply_request(targets, ops, &preview.plan.plan_id, &tampered, None))
        .unwrap_err();

    assert_eq!(denied.error.code, ErrorCode::PlanMismatch);
    assert!(adapter.recorded().is_empty());
}

/// Tests missing plan references are rejected as PLAN_MISMATCH.
#[test]
fn test_missing_plan_refs_rejected() {
    let adapter = Arc::new(ScriptedAdapter::default());
    let service = service_with(Arc::clone(&adapter));
    let targets = vec![by_id("p_a")];
    let ops = vec![operation(
        "op-1",
        Action::DatabaseCreate,
        json!({"database_id": "db-main", "name": "Main DB"}),
    )];

    let request = ApplyRequest {
        actor: "ops-bot".to_string(),
        targets,
        target_selector: None,
        operations: ops,
        plan_id: None,
        plan_hash: None,
        confirmation_token: None,
        transport: None,
        credentials: None,
    };
    let denied = service.changes_apply(&request).unwrap_err();

    assert_eq!(denied.error.code, ErrorCode::PlanMismatch);
    assert!(adapter.recorded().is_empty());
}

// ============================================================================
// SECTION: Scope Monotonicity
// ============================================================================

/// Tests declared scopes can extend but never undercut the catalog.
#[test]
fn test_scope_downgrade_blocked() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));
    let mut op = operation("op-1", Action::AuthUsersCreate, json!({"user_id": "u1", "email": "x@y"}));
    op.required_scopes.insert("users.read".to_string());

    let preview = service.changes_preview(&preview_request(vec![by_id("p_a")], vec![op])).unwrap();

    assert!(preview.plan.required_scopes.contains(&"users.read".to_string()));
    assert!(preview.plan.required_scopes.contains(&"users.write".to_string()));
}

// ============================================================================
// SECTION: Idempotency
// ============================================================================

/// Tests two applies of one plan dispatch once per idempotency key.
#[test]
fn test_idempotent_replay() {
    let adapter = Arc::new(ScriptedAdapter::default());
    let service = service_with(Arc::clone(&adapter));
    let targets = vec![by_id("p_a")];
    let mut op = operation(
        "op-1",
        Action::DatabaseCreate,
        json!({"database_id": "db-main", "name": "Main DB"}),
    );
    op.idempotency_key = Some("x".to_string());
    let ops = vec![op];

    let preview = service.changes_preview(&preview_request(targets.clone(), ops.clone())).unwrap();
    let first = service
        .changes_apply(&apply_request(
            targets.clone(),
            ops.clone(),
            &preview.plan.plan_id,
            &preview.plan.plan_hash,
            None,
        ))
        .unwrap();
    let second = service
        .changes_apply(&apply_request(
            targets,
            ops,
            &preview.plan.plan_id,
            &preview.plan.plan_hash,
            None,
        ))
        .unwrap();

    assert_eq!(adapter.recorded().len(), 1);
    assert_eq!(second.status, BatchStatus::Success);
    assert_eq!(
        first.target_results[0].operations[0].data,
        second.target_results[0].operations[0].data,
    );
    let skipped = service
        .audit_log()
        .into_iter()
        .filter(|r| r.outcome == AuditOutcome::Skipped)
        .count();
    assert_eq!(skipped, 1);
}

// ============================================================================
// SECTION: Security Invariants
// ============================================================================

/// Tests client-supplied credentials are ignored for execution.
#[test]
fn test_client_credentials_ignored() {
    let adapter = Arc::new(ScriptedAdapter::default());
    let service = service_with(Arc::clone(&adapter));
    let targets = vec![by_id("p_a")];
    let ops = vec![operation(
        "op-1",
        Action::DatabaseCreate,
        json!({"database_id": "db-main", "name": "Main DB"}),
    )];

    let preview = service.changes_preview(&preview_request(targets.clone(), ops.clone())).unwrap();
    let mut request = apply_request(
        targets,
        ops,
        &preview.plan.plan_id,
        &preview.plan.plan_hash,
        None,
    );
    request.credentials = Some(json!({"api_key": "attacker-key", "endpoint": "https://evil"}));

    service.changes_apply(&request).unwrap();

    assert_eq!(adapter.recorded()[0].api_key, "key-a");
}

/// Tests responses and audit entries never leak secret patterns.
#[test]
fn test_responses_are_redacted() {
    let adapter = Arc::new(ScriptedAdapter {
        response: Some(json!({
            "name": "db",
            "api_key": "sk_abcdef1234567890",
            "note": "authorized via Bearer abc.def-1"
        })),
        ..ScriptedAdapter::default()
    });
    let service = service_with(Arc::clone(&adapter));
    let targets = vec![by_id("p_a")];
    let ops = vec![operation(
        "op-1",
        Action::DatabaseCreate,
        json!({"database_id": "db-main", "name": "Main DB"}),
    )];

    let preview = service.changes_preview(&preview_request(targets.clone(), ops.clone())).unwrap();
    let apply = service
        .changes_apply(&apply_request(
            targets,
            ops,
            &preview.plan.plan_id,
            &preview.plan.plan_hash,
            None,
        ))
        .unwrap();

    let serialized = serde_json::to_string(&apply).unwrap();
    assert!(!serialized.contains("sk_abcdef1234567890"));
    assert!(!serialized.contains("Bearer abc"));
    let audit = serde_json::to_string(&service.audit_log()).unwrap();
    assert!(!audit.contains("sk_abcdef1234567890"));
}

// ============================================================================
// SECTION: Audit Ordering
// ============================================================================

/// Tests apply appends planned entries before execution outcomes.
#[test]
fn test_audit_orders_planned_before_outcomes() {
    let adapter = Arc::new(ScriptedAdapter::default());
    let service = service_with(Arc::clone(&adapter));
    let targets = vec![by_id("p_a"), by_id("p_b")];
    let ops = vec![operation(
        "op-1",
        Action::DatabaseCreate,
        json!({"database_id": "db-main", "name": "Main DB"}),
    )];

    let preview = service.changes_preview(&preview_request(targets.clone(), ops.clone())).unwrap();
    let apply = service
        .changes_apply(&apply_request(
            targets,
            ops,
            &preview.plan.plan_id,
            &preview.plan.plan_hash,
            None,
        ))
        .unwrap();

    let entries: Vec<_> = service
        .audit_log()
        .into_iter()
        .filter(|record| record.correlation_id == apply.correlation_id)
        .collect();
    assert_eq!(entries.len(), 4);
    assert!(entries[..2].iter().all(|record| record.outcome == AuditOutcome::Planned));
    assert!(entries[2..].iter().all(|record| record.outcome == AuditOutcome::Success));
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Tests preview requires some form of targeting when auto is disabled.
#[test]
fn test_preview_requires_targeting() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));
    let ops = vec![operation(
        "op-1",
        Action::DatabaseCreate,
        json!({"database_id": "db-main", "name": "Main DB"}),
    )];

    let denied = service.changes_preview(&preview_request(Vec::new(), ops)).unwrap_err();

    assert_eq!(denied.error.code, ErrorCode::ValidationError);
}

/// Tests an unsupported transport is rejected with the supported set.
#[test]
fn test_unsupported_transport_rejected() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));
    let ops = vec![operation(
        "op-1",
        Action::DatabaseCreate,
        json!({"database_id": "db-main", "name": "Main DB"}),
    )];
    let mut request = preview_request(vec![by_id("p_a")], ops);
    request.transport = Some("carrier-pigeon".to_string());

    let denied = service.changes_preview(&request).unwrap_err();

    assert_eq!(denied.error.code, ErrorCode::CapabilityUnavailable);
    let transports = denied.error.supported_transports.unwrap();
    assert!(transports.contains(&"stdio".to_string()));
    assert!(transports.contains(&"http".to_string()));
}

/// Tests a claimed domain must match the action's domain.
#[test]
fn test_domain_mismatch_rejected() {
    let service = service_with(Arc::new(ScriptedAdapter::default()));
    let mut op = operation(
        "op-1",
        Action::DatabaseCreate,
        json!({"database_id": "db-main", "name": "Main DB"}),
    );
    op.domain = Some(fleetgate_core::Domain::Auth);

    let denied = service.changes_preview(&preview_request(vec![by_id("p_a")], vec![op])).unwrap_err();

    assert_eq!(denied.error.code, ErrorCode::ValidationError);
}
