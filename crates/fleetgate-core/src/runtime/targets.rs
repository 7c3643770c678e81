// crates/fleetgate-core/src/runtime/targets.rs
// ============================================================================
// Module: Fleetgate Target Resolution
// Description: Resolve explicit targets, selectors, and auto defaults.
// Purpose: Turn a request's targeting into an ordered project-ID list.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Targets resolve in a fixed precedence: an explicit `targets[]` list wins,
//! then a selector (from the request or the configured default), then the
//! auto rule. Resolution preserves input order and deduplicates on first
//! occurrence. Lookup failures are fail-closed: an unknown alias or an empty
//! selector result rejects the request rather than silently narrowing it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ErrorCode;
use crate::core::error::StandardError;
use crate::core::types::ResolvedTarget;
use crate::core::types::TargetInput;
use crate::core::types::TargetSource;

// ============================================================================
// SECTION: Selectors
// ============================================================================

/// Selector modes for non-explicit targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorMode {
    /// Values are project identifiers, filtered against known projects.
    ProjectId,
    /// Values are aliases, translated through the alias map.
    Alias,
    /// Use the configured auto targets.
    Auto,
}

/// A target selector: a mode plus its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSelector {
    /// Selector mode.
    pub mode: SelectorMode,
    /// Selector values; unused for `auto`.
    #[serde(default)]
    pub values: Vec<String>,
}

// ============================================================================
// SECTION: Directory
// ============================================================================

/// Immutable targeting state derived from configuration at startup.
///
/// # Invariants
/// - `auto_target_project_ids` and alias values reference known projects;
///   the configuration loader validates this before construction.
#[derive(Debug, Clone, Default)]
pub struct TargetDirectory {
    /// Alias to project-ID translation map.
    pub alias_map: BTreeMap<String, String>,
    /// Known project identifiers, in configuration order.
    pub known_project_ids: Vec<String>,
    /// Projects selected by the auto rule.
    pub auto_target_project_ids: Vec<String>,
    /// Selector applied when a request carries none.
    pub default_target_selector: Option<TargetSelector>,
}

impl TargetDirectory {
    /// Returns true when targeting can resolve without explicit input.
    #[must_use]
    pub fn auto_targeting_enabled(&self) -> bool {
        !self.auto_target_project_ids.is_empty()
            || self.known_project_ids.len() == 1
            || self.default_target_selector.is_some()
    }
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves a request's targeting into an ordered project list.
///
/// # Errors
///
/// Returns `TARGET_NOT_FOUND` when an alias or selector resolves to nothing
/// and `TARGET_AMBIGUOUS` when the auto rule has no configured default.
pub fn resolve_targets(
    directory: &TargetDirectory,
    targets: &[TargetInput],
    selector: Option<&TargetSelector>,
) -> Result<(Vec<ResolvedTarget>, TargetSource), StandardError> {
    if !targets.is_empty() {
        let ids = resolve_explicit(directory, targets)?;
        return Ok((finalize(ids, TargetSource::Explicit), TargetSource::Explicit));
    }
    if let Some(selector) = selector.or(directory.default_target_selector.as_ref()) {
        let ids = resolve_selector(directory, selector)?;
        return Ok((finalize(ids, TargetSource::Selector), TargetSource::Selector));
    }
    let ids = resolve_auto(directory)?;
    Ok((finalize(ids, TargetSource::Auto), TargetSource::Auto))
}

/// Resolves an explicit target list.
fn resolve_explicit(
    directory: &TargetDirectory,
    targets: &[TargetInput],
) -> Result<Vec<String>, StandardError> {
    let mut ids = Vec::with_capacity(targets.len());
    for (position, target) in targets.iter().enumerate() {
        if let Some(project_id) = target.project_id.as_deref()
            && !project_id.trim().is_empty()
        {
            ids.push(project_id.to_string());
            continue;
        }
        if let Some(alias) = target.alias.as_deref() {
            let Some(project_id) = directory.alias_map.get(alias) else {
                return Err(StandardError::new(
                    ErrorCode::TargetNotFound,
                    format!("alias '{alias}' is not configured"),
                ));
            };
            ids.push(project_id.clone());
            continue;
        }
        return Err(StandardError::new(
            ErrorCode::TargetNotFound,
            format!("targets[{position}] carries neither project_id nor alias"),
        ));
    }
    Ok(ids)
}

/// Resolves a selector by mode.
fn resolve_selector(
    directory: &TargetDirectory,
    selector: &TargetSelector,
) -> Result<Vec<String>, StandardError> {
    match selector.mode {
        SelectorMode::ProjectId => {
            let known: BTreeSet<&str> =
                directory.known_project_ids.iter().map(String::as_str).collect();
            let ids: Vec<String> = selector
                .values
                .iter()
                .filter(|value| known.contains(value.as_str()))
                .cloned()
                .collect();
            if ids.is_empty() {
                return Err(StandardError::new(
                    ErrorCode::TargetNotFound,
                    "selector matched no known project",
                ));
            }
            Ok(ids)
        }
        SelectorMode::Alias => {
            let ids: Vec<String> = selector
                .values
                .iter()
                .filter_map(|alias| directory.alias_map.get(alias).cloned())
                .collect();
            if ids.is_empty() {
                return Err(StandardError::new(
                    ErrorCode::TargetNotFound,
                    "selector matched no configured alias",
                ));
            }
            Ok(ids)
        }
        SelectorMode::Auto => resolve_auto(directory),
    }
}

/// Applies the auto rule: configured auto targets, else a singleton project.
fn resolve_auto(directory: &TargetDirectory) -> Result<Vec<String>, StandardError> {
    if !directory.auto_target_project_ids.is_empty() {
        return Ok(directory.auto_target_project_ids.clone());
    }
    if directory.known_project_ids.len() == 1 {
        return Ok(directory.known_project_ids.clone());
    }
    Err(StandardError::new(
        ErrorCode::TargetAmbiguous,
        "no targets given and no auto target is configured",
    )
    .with_remediation("pass explicit targets, a target_selector, or configure auto targets"))
}

/// Deduplicates while preserving first occurrence and assigns indices.
fn finalize(ids: Vec<String>, source: TargetSource) -> Vec<ResolvedTarget> {
    let mut seen = BTreeSet::new();
    let mut resolved = Vec::with_capacity(ids.len());
    for project_id in ids {
        if seen.insert(project_id.clone()) {
            resolved.push(ResolvedTarget {
                index: resolved.len(),
                source,
                project_id,
            });
        }
    }
    resolved
}
