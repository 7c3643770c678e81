// crates/fleetgate-core/src/core/scopes.rs
// ============================================================================
// Module: Fleetgate Scope Catalog
// Description: Static mapping from action to minimum required scopes.
// Purpose: Let the planner union catalog scopes into every operation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The scope catalog is a build-time constant mapping every action to the
//! minimum capability scopes an API key must hold to perform it. The planner
//! unions these into each operation before hashing, so a client can declare
//! additional scopes but never fewer than the catalog minimum. The catalog is
//! exposed verbatim through the `scopes.catalog.get` tool.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::core::actions::ALL_ACTIONS;
use crate::core::actions::Action;

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Version tag reported alongside the catalog.
pub const SCOPE_CATALOG_VERSION: &str = "1.0.0";

/// Minimum scopes required for an action.
#[must_use]
pub const fn catalog_scopes(action: Action) -> &'static [&'static str] {
    match action {
        Action::ProjectCreate | Action::ProjectDelete => &["projects.write"],
        Action::DatabaseList => &["databases.read"],
        Action::DatabaseCreate => &["databases.write"],
        Action::DatabaseUpsertCollection | Action::DatabaseDeleteCollection => {
            &["collections.write"]
        }
        Action::AuthUsersList => &["users.read"],
        Action::AuthUsersCreate
        | Action::AuthUsersUpdate
        | Action::AuthUsersUpdateEmail
        | Action::AuthUsersUpdateName
        | Action::AuthUsersUpdateStatus
        | Action::AuthUsersUpdatePassword
        | Action::AuthUsersUpdatePhone
        | Action::AuthUsersUpdateEmailVerification
        | Action::AuthUsersUpdatePhoneVerification
        | Action::AuthUsersUpdateMfa
        | Action::AuthUsersUpdateLabels
        | Action::AuthUsersUpdatePrefs => &["users.write"],
        Action::FunctionList => &["functions.read"],
        Action::FunctionCreate | Action::FunctionUpdate | Action::FunctionDeploymentTrigger => {
            &["functions.write"]
        }
        Action::FunctionExecutionTrigger => &["executions.write"],
        Action::FunctionExecutionStatus => &["executions.read"],
    }
}

/// Full catalog keyed by action, for verbatim exposure.
static CATALOG: LazyLock<BTreeMap<Action, BTreeSet<String>>> = LazyLock::new(|| {
    ALL_ACTIONS
        .iter()
        .map(|action| {
            let scopes =
                catalog_scopes(*action).iter().map(|scope| (*scope).to_string()).collect();
            (*action, scopes)
        })
        .collect()
});

/// Returns the full scope catalog.
#[must_use]
pub fn scope_catalog() -> &'static BTreeMap<Action, BTreeSet<String>> {
    &CATALOG
}
