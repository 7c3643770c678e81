// crates/fleetgate-service/tests/common/mod.rs
// ============================================================================
// Module: Service Test Helpers
// Description: Scripted adapter and service fixtures for integration tests.
// ============================================================================
//! ## Overview
//! Shared fixtures: a scripted upstream adapter recording every call, and a
//! two-project control service with an alias, management credentials, and a
//! test secret.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only helpers; not every test uses every fixture."
)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

use fleetgate_core::AuthContext;
use fleetgate_core::AuthDirectory;
use fleetgate_core::InMemoryAuditLog;
use fleetgate_core::NormalizedOperation;
use fleetgate_core::StandardError;
use fleetgate_core::TargetDirectory;
use fleetgate_core::UpstreamAdapter;
use fleetgate_service::ControlService;
use fleetgate_service::ControlServiceConfig;
use fleetgate_service::NoopMetrics;
use fleetgate_service::Transport;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Scripted Adapter
// ============================================================================

/// One recorded upstream call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Target project.
    pub project_id: String,
    /// Action name.
    pub action: String,
    /// API key the call ran under.
    pub api_key: String,
}

/// Adapter that fails scripted projects and records every call.
#[derive(Default)]
pub struct ScriptedAdapter {
    /// Projects whose calls fail with an upstream error.
    pub failing_projects: BTreeSet<String>,
    /// Response data returned on success.
    pub response: Option<Value>,
    /// Recorded calls, in order.
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedAdapter {
    /// Adapter that fails every call against the given project.
    pub fn failing(project_id: &str) -> Self {
        Self {
            failing_projects: [project_id.to_string()].into_iter().collect(),
            ..Self::default()
        }
    }

    /// Returns the calls recorded so far.
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl UpstreamAdapter for ScriptedAdapter {
    fn execute_operation(
        &self,
        project_id: &str,
        operation: &NormalizedOperation,
        auth: &AuthContext,
        _correlation_id: &str,
    ) -> Result<Value, StandardError> {
        self.calls.lock().unwrap().push(RecordedCall {
            project_id: project_id.to_string(),
            action: operation.action.to_string(),
            api_key: auth.api_key.clone(),
        });
        if self.failing_projects.contains(project_id) {
            return Err(StandardError::new(
                fleetgate_core::ErrorCode::InternalError,
                "Appwrite 503: service unavailable",
            )
            .retryable(true));
        }
        Ok(self.response.clone().unwrap_or_else(|| json!({"ok": true})))
    }
}

// ============================================================================
// SECTION: Service Fixture
// ============================================================================

/// Builds the two-project control service over the given adapter.
pub fn service_with(adapter: Arc<ScriptedAdapter>) -> ControlService {
    let mut alias_map = BTreeMap::new();
    alias_map.insert("prod".to_string(), "p_a".to_string());
    let directory = TargetDirectory {
        alias_map,
        known_project_ids: vec!["p_a".to_string(), "p_b".to_string()],
        auto_target_project_ids: Vec::new(),
        default_target_selector: None,
    };
    let auth = AuthDirectory {
        per_project: [
            ("p_a".to_string(), context("key-a")),
            ("p_b".to_string(), context("key-b")),
        ]
        .into_iter()
        .collect(),
        fallback: None,
        management: Some(context("management-key")),
    };
    ControlService::new(ControlServiceConfig {
        directory,
        auth,
        adapter,
        audit: Arc::new(InMemoryAuditLog::new()),
        confirmation_secret: "integration-secret".to_string(),
        plan_ttl_seconds: 900,
        transport_default: Transport::Stdio,
        metrics: Arc::new(NoopMetrics),
    })
}

/// Builds a complete auth context with unknown scopes.
fn context(api_key: &str) -> AuthContext {
    AuthContext {
        endpoint: "https://appwrite.test/v1".to_string(),
        api_key: api_key.to_string(),
        scopes: BTreeSet::new(),
    }
}
