// crates/fleetgate-config/src/config.rs
// ============================================================================
// Module: Fleetgate Configuration Model
// Description: JSON schema types, loading, and fail-closed validation.
// Purpose: Turn an operator's config file into validated runtime state.
// Dependencies: fleetgate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The configuration file declares the upstream endpoint, per-project
//! credentials and aliases, auto-targeting defaults, and the optional
//! management channel. Loading distinguishes a missing file, an unreadable
//! file, invalid JSON, and schema violations; validation reports the JSON
//! path of every violation. The validated config converts into the immutable
//! directories consumed by the target resolver and the mutation executor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use fleetgate_core::AuthContext;
use fleetgate_core::AuthDirectory;
use fleetgate_core::DEFAULT_CONFIRMATION_SECRET;
use fleetgate_core::TargetDirectory;
use fleetgate_core::TargetSelector;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable selecting the deployment environment.
pub const ENVIRONMENT_ENV_VAR: &str = "FLEETGATE_ENV";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;
/// Minimum accepted plan TTL in seconds.
const MIN_PLAN_TTL_SECONDS: u64 = 60;
/// Maximum accepted plan TTL in seconds.
const MAX_PLAN_TTL_SECONDS: u64 = 3_600;

// ============================================================================
// SECTION: Environment
// ============================================================================

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development; the sentinel confirmation secret is tolerated.
    Development,
    /// Production; the sentinel confirmation secret is rejected.
    Production,
}

impl Environment {
    /// Reads the environment from `FLEETGATE_ENV` (default: development).
    #[must_use]
    pub fn from_env() -> Self {
        match env::var(ENVIRONMENT_ENV_VAR) {
            Ok(value) if value.eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file does not exist.
    #[error("config file not found: {path}")]
    Missing {
        /// Path that was checked.
        path: PathBuf,
    },
    /// Configuration file exists but cannot be read.
    #[error("config file unreadable: {path}: {source}")]
    Unreadable {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Configuration file exceeds the size limit.
    #[error("config file too large: {path} ({actual} > {limit} bytes)")]
    TooLarge {
        /// Path that was read.
        path: PathBuf,
        /// Observed size in bytes.
        actual: u64,
        /// Maximum allowed bytes.
        limit: u64,
    },
    /// Configuration file is not valid JSON.
    #[error("invalid JSON in config file: {0}")]
    Parse(String),
    /// A field violates the schema.
    #[error("invalid config at {path}: {message}")]
    Schema {
        /// JSON path of the violation.
        path: String,
        /// What is wrong with the value.
        message: String,
    },
    /// Production deployment still uses the development sentinel secret.
    #[error("production requires a non-default confirmation secret")]
    DefaultSecret,
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Root configuration document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FleetConfig {
    /// Upstream endpoint used when a project declares none.
    pub default_endpoint: String,
    /// Per-project configuration, keyed by project ID.
    pub projects: BTreeMap<String, ProjectConfig>,
    /// Targeting defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
    /// Management channel for `project.*` actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management: Option<ManagementConfig>,
    /// Process secret for confirmation tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_secret: Option<String>,
    /// Plan time-to-live override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_ttl_seconds: Option<u64>,
    /// Whether the legacy `auth.users.update` alias stays routable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_legacy_user_update: Option<bool>,
}

/// One project tenant.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// API key for this project.
    pub api_key: String,
    /// Scopes the key is declared to hold; empty means unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    /// Endpoint override for this project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Aliases resolving to this project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    /// Whether this project participates in auto targeting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_for_auto: Option<bool>,
    /// Human-readable display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Targeting defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Projects selected by the auto rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_target_project_ids: Option<Vec<String>>,
    /// Selector applied when a request carries none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_selector: Option<TargetSelector>,
}

/// Management channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ManagementConfig {
    /// Endpoint override for management calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Management API key.
    pub api_key: String,
    /// Scopes the management key is declared to hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    /// Console project identifier, when the deployment needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Loads a configuration file without validating it.
///
/// # Errors
///
/// Returns [`ConfigError`] for a missing file, an unreadable file, an
/// oversized file, or invalid JSON.
pub fn load_config(path: &Path) -> Result<FleetConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Missing {
            path: path.to_path_buf(),
        });
    }
    let metadata = fs::metadata(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::TooLarge {
            path: path.to_path_buf(),
            actual: metadata.len(),
            limit: MAX_CONFIG_FILE_SIZE,
        });
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|err| ConfigError::Parse(err.to_string()))
}

impl FleetConfig {
    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document is not valid JSON or
    /// violates the schema shape.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration for the given environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Schema`] naming the offending path, or
    /// [`ConfigError::DefaultSecret`] for a production deployment on the
    /// sentinel secret.
    pub fn validate(&self, environment: Environment) -> Result<(), ConfigError> {
        validate_endpoint("default_endpoint", &self.default_endpoint)?;
        if self.projects.is_empty() {
            return Err(schema("projects", "must configure at least one project"));
        }

        let mut alias_owners: BTreeMap<&str, &str> = BTreeMap::new();
        for (project_id, project) in &self.projects {
            if project_id.trim().is_empty() {
                return Err(schema("projects", "project IDs must be non-empty"));
            }
            if project.api_key.trim().is_empty() {
                return Err(schema(
                    format!("projects.{project_id}.api_key"),
                    "must be non-empty",
                ));
            }
            if let Some(endpoint) = project.endpoint.as_deref() {
                validate_endpoint(format!("projects.{project_id}.endpoint"), endpoint)?;
            }
            for (position, alias) in project.aliases.iter().flatten().enumerate() {
                let path = format!("projects.{project_id}.aliases[{position}]");
                if alias.trim().is_empty() {
                    return Err(schema(path, "aliases must be non-empty"));
                }
                if self.projects.contains_key(alias) {
                    return Err(schema(path, format!("alias '{alias}' shadows a project ID")));
                }
                if let Some(owner) = alias_owners.insert(alias, project_id)
                    && owner != project_id
                {
                    return Err(schema(
                        path,
                        format!("alias '{alias}' is already defined by project '{owner}'"),
                    ));
                }
            }
        }

        if let Some(defaults) = &self.defaults {
            for (position, target) in
                defaults.auto_target_project_ids.iter().flatten().enumerate()
            {
                if !self.projects.contains_key(target) {
                    return Err(schema(
                        format!("defaults.auto_target_project_ids[{position}]"),
                        format!("references unknown project '{target}'"),
                    ));
                }
            }
        }

        if let Some(management) = &self.management {
            if management.api_key.trim().is_empty() {
                return Err(schema("management.api_key", "must be non-empty"));
            }
            if let Some(endpoint) = management.endpoint.as_deref() {
                validate_endpoint("management.endpoint", endpoint)?;
            }
        }

        if let Some(ttl) = self.plan_ttl_seconds
            && !(MIN_PLAN_TTL_SECONDS..=MAX_PLAN_TTL_SECONDS).contains(&ttl)
        {
            return Err(schema(
                "plan_ttl_seconds",
                format!("must be within [{MIN_PLAN_TTL_SECONDS}, {MAX_PLAN_TTL_SECONDS}]"),
            ));
        }

        if environment == Environment::Production
            && self.confirmation_secret() == DEFAULT_CONFIRMATION_SECRET
        {
            return Err(ConfigError::DefaultSecret);
        }
        Ok(())
    }

    /// Returns the effective confirmation secret.
    #[must_use]
    pub fn confirmation_secret(&self) -> &str {
        self.confirmation_secret
            .as_deref()
            .filter(|secret| !secret.trim().is_empty())
            .unwrap_or(DEFAULT_CONFIRMATION_SECRET)
    }

    /// Builds the immutable targeting state.
    #[must_use]
    pub fn target_directory(&self) -> TargetDirectory {
        let mut alias_map = BTreeMap::new();
        for (project_id, project) in &self.projects {
            for alias in project.aliases.iter().flatten() {
                alias_map.insert(alias.clone(), project_id.clone());
            }
        }
        let known_project_ids: Vec<String> = self.projects.keys().cloned().collect();
        let auto_target_project_ids = self
            .defaults
            .as_ref()
            .and_then(|defaults| defaults.auto_target_project_ids.clone())
            .unwrap_or_else(|| {
                self.projects
                    .iter()
                    .filter(|(_, project)| project.default_for_auto == Some(true))
                    .map(|(project_id, _)| project_id.clone())
                    .collect()
            });
        TargetDirectory {
            alias_map,
            known_project_ids,
            auto_target_project_ids,
            default_target_selector: self
                .defaults
                .as_ref()
                .and_then(|defaults| defaults.target_selector.clone()),
        }
    }

    /// Builds the immutable credential directory.
    #[must_use]
    pub fn auth_directory(&self) -> AuthDirectory {
        let per_project = self
            .projects
            .iter()
            .map(|(project_id, project)| {
                let context = AuthContext {
                    endpoint: project
                        .endpoint
                        .clone()
                        .unwrap_or_else(|| self.default_endpoint.clone()),
                    api_key: project.api_key.clone(),
                    scopes: scope_set(project.scopes.as_deref()),
                };
                (project_id.clone(), context)
            })
            .collect();
        let management = self.management.as_ref().map(|management| AuthContext {
            endpoint: management
                .endpoint
                .clone()
                .unwrap_or_else(|| self.default_endpoint.clone()),
            api_key: management.api_key.clone(),
            scopes: scope_set(management.scopes.as_deref()),
        });
        AuthDirectory {
            per_project,
            fallback: None,
            management,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a schema violation error.
fn schema(path: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::Schema {
        path: path.into(),
        message: message.into(),
    }
}

/// Validates an endpoint URL shape.
fn validate_endpoint(path: impl Into<String>, endpoint: &str) -> Result<(), ConfigError> {
    if endpoint.trim().is_empty() {
        return Err(schema(path, "must be non-empty"));
    }
    if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
        return Err(schema(path, "must start with http:// or https://"));
    }
    Ok(())
}

/// Collects declared scopes into a set.
fn scope_set(scopes: Option<&[String]>) -> BTreeSet<String> {
    scopes.map(|scopes| scopes.iter().cloned().collect()).unwrap_or_default()
}
