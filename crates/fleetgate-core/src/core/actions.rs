// crates/fleetgate-core/src/core/actions.rs
// ============================================================================
// Module: Fleetgate Actions
// Description: Closed enumeration of upstream actions and their domains.
// Purpose: Give every mutation a stable wire name and policy classification.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every tool operation names exactly one action from this closed set. An
//! action selects one upstream endpoint/method pair and carries its policy
//! classification: the owning domain, whether it is inherently destructive,
//! and whether it belongs to the project-management namespace (which executes
//! under the management credentials instead of per-project keys).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Domain
// ============================================================================

/// Domain owning an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Project lifecycle management.
    Project,
    /// Databases and collections.
    Database,
    /// Auth users.
    Auth,
    /// Functions, deployments, and executions.
    Function,
}

impl Domain {
    /// Returns the stable wire label for this domain.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Database => "database",
            Self::Auth => "auth",
            Self::Function => "function",
        }
    }
}

// ============================================================================
// SECTION: Action
// ============================================================================

/// Enumerated identifier selecting one upstream endpoint/method pair.
///
/// # Invariants
/// - Wire names are stable; adding a variant is additive only.
/// - `domain()` is derivable from the wire name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Create a project.
    #[serde(rename = "project.create")]
    ProjectCreate,
    /// Delete a project.
    #[serde(rename = "project.delete")]
    ProjectDelete,
    /// List databases.
    #[serde(rename = "database.list")]
    DatabaseList,
    /// Create a database.
    #[serde(rename = "database.create")]
    DatabaseCreate,
    /// Create or replace a collection.
    #[serde(rename = "database.upsert_collection")]
    DatabaseUpsertCollection,
    /// Delete a collection.
    #[serde(rename = "database.delete_collection")]
    DatabaseDeleteCollection,
    /// List auth users.
    #[serde(rename = "auth.users.list")]
    AuthUsersList,
    /// Create an auth user.
    #[serde(rename = "auth.users.create")]
    AuthUsersCreate,
    /// Update an auth user (legacy alias; field inferred from params).
    #[serde(rename = "auth.users.update")]
    AuthUsersUpdate,
    /// Update a user's email address.
    #[serde(rename = "auth.users.update.email")]
    AuthUsersUpdateEmail,
    /// Update a user's display name.
    #[serde(rename = "auth.users.update.name")]
    AuthUsersUpdateName,
    /// Update a user's status.
    #[serde(rename = "auth.users.update.status")]
    AuthUsersUpdateStatus,
    /// Update a user's password.
    #[serde(rename = "auth.users.update.password")]
    AuthUsersUpdatePassword,
    /// Update a user's phone number.
    #[serde(rename = "auth.users.update.phone")]
    AuthUsersUpdatePhone,
    /// Update a user's email verification state.
    #[serde(rename = "auth.users.update.email_verification")]
    AuthUsersUpdateEmailVerification,
    /// Update a user's phone verification state.
    #[serde(rename = "auth.users.update.phone_verification")]
    AuthUsersUpdatePhoneVerification,
    /// Update a user's MFA requirement.
    #[serde(rename = "auth.users.update.mfa")]
    AuthUsersUpdateMfa,
    /// Replace a user's labels.
    #[serde(rename = "auth.users.update.labels")]
    AuthUsersUpdateLabels,
    /// Replace a user's preferences.
    #[serde(rename = "auth.users.update.prefs")]
    AuthUsersUpdatePrefs,
    /// List functions.
    #[serde(rename = "function.list")]
    FunctionList,
    /// Create a function.
    #[serde(rename = "function.create")]
    FunctionCreate,
    /// Update a function.
    #[serde(rename = "function.update")]
    FunctionUpdate,
    /// Upload and trigger a deployment.
    #[serde(rename = "function.deployment.trigger")]
    FunctionDeploymentTrigger,
    /// Trigger a function execution.
    #[serde(rename = "function.execution.trigger")]
    FunctionExecutionTrigger,
    /// Read the status of a function execution.
    #[serde(rename = "function.execution.status")]
    FunctionExecutionStatus,
}

/// All actions, in catalog order.
pub const ALL_ACTIONS: &[Action] = &[
    Action::ProjectCreate,
    Action::ProjectDelete,
    Action::DatabaseList,
    Action::DatabaseCreate,
    Action::DatabaseUpsertCollection,
    Action::DatabaseDeleteCollection,
    Action::AuthUsersList,
    Action::AuthUsersCreate,
    Action::AuthUsersUpdate,
    Action::AuthUsersUpdateEmail,
    Action::AuthUsersUpdateName,
    Action::AuthUsersUpdateStatus,
    Action::AuthUsersUpdatePassword,
    Action::AuthUsersUpdatePhone,
    Action::AuthUsersUpdateEmailVerification,
    Action::AuthUsersUpdatePhoneVerification,
    Action::AuthUsersUpdateMfa,
    Action::AuthUsersUpdateLabels,
    Action::AuthUsersUpdatePrefs,
    Action::FunctionList,
    Action::FunctionCreate,
    Action::FunctionUpdate,
    Action::FunctionDeploymentTrigger,
    Action::FunctionExecutionTrigger,
    Action::FunctionExecutionStatus,
];

impl Action {
    /// Returns the stable wire name for this action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProjectCreate => "project.create",
            Self::ProjectDelete => "project.delete",
            Self::DatabaseList => "database.list",
            Self::DatabaseCreate => "database.create",
            Self::DatabaseUpsertCollection => "database.upsert_collection",
            Self::DatabaseDeleteCollection => "database.delete_collection",
            Self::AuthUsersList => "auth.users.list",
            Self::AuthUsersCreate => "auth.users.create",
            Self::AuthUsersUpdate => "auth.users.update",
            Self::AuthUsersUpdateEmail => "auth.users.update.email",
            Self::AuthUsersUpdateName => "auth.users.update.name",
            Self::AuthUsersUpdateStatus => "auth.users.update.status",
            Self::AuthUsersUpdatePassword => "auth.users.update.password",
            Self::AuthUsersUpdatePhone => "auth.users.update.phone",
            Self::AuthUsersUpdateEmailVerification => "auth.users.update.email_verification",
            Self::AuthUsersUpdatePhoneVerification => "auth.users.update.phone_verification",
            Self::AuthUsersUpdateMfa => "auth.users.update.mfa",
            Self::AuthUsersUpdateLabels => "auth.users.update.labels",
            Self::AuthUsersUpdatePrefs => "auth.users.update.prefs",
            Self::FunctionList => "function.list",
            Self::FunctionCreate => "function.create",
            Self::FunctionUpdate => "function.update",
            Self::FunctionDeploymentTrigger => "function.deployment.trigger",
            Self::FunctionExecutionTrigger => "function.execution.trigger",
            Self::FunctionExecutionStatus => "function.execution.status",
        }
    }

    /// Returns the domain owning this action.
    #[must_use]
    pub const fn domain(self) -> Domain {
        match self {
            Self::ProjectCreate | Self::ProjectDelete => Domain::Project,
            Self::DatabaseList
            | Self::DatabaseCreate
            | Self::DatabaseUpsertCollection
            | Self::DatabaseDeleteCollection => Domain::Database,
            Self::AuthUsersList
            | Self::AuthUsersCreate
            | Self::AuthUsersUpdate
            | Self::AuthUsersUpdateEmail
            | Self::AuthUsersUpdateName
            | Self::AuthUsersUpdateStatus
            | Self::AuthUsersUpdatePassword
            | Self::AuthUsersUpdatePhone
            | Self::AuthUsersUpdateEmailVerification
            | Self::AuthUsersUpdatePhoneVerification
            | Self::AuthUsersUpdateMfa
            | Self::AuthUsersUpdateLabels
            | Self::AuthUsersUpdatePrefs => Domain::Auth,
            Self::FunctionList
            | Self::FunctionCreate
            | Self::FunctionUpdate
            | Self::FunctionDeploymentTrigger
            | Self::FunctionExecutionTrigger
            | Self::FunctionExecutionStatus => Domain::Function,
        }
    }

    /// Returns true when the action destroys data regardless of client hints.
    #[must_use]
    pub const fn inherently_destructive(self) -> bool {
        matches!(self, Self::ProjectDelete | Self::DatabaseDeleteCollection)
    }

    /// Returns true when the action belongs to the project-management namespace.
    #[must_use]
    pub const fn is_project_management(self) -> bool {
        matches!(self, Self::ProjectCreate | Self::ProjectDelete)
    }

    /// Returns true when the upstream request is an HTTP GET.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(
            self,
            Self::DatabaseList
                | Self::AuthUsersList
                | Self::FunctionList
                | Self::FunctionExecutionStatus
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
