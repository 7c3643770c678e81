// crates/fleetgate-core/src/runtime/plan.rs
// ============================================================================
// Module: Fleetgate Plan Manager
// Description: Plan normalization, hashing, storage, and re-verification.
// Purpose: Make every apply echo back a plan that provably matches preview.
// Dependencies: serde, rand, crate::core
// ============================================================================

//! ## Overview
//! A plan is the hashed, time-limited summary of a preview. The manager
//! normalizes operations (catalog scope union, destructive/critical
//! upgrades), hashes the canonical seed, and stores the plan until its TTL
//! expires. Apply must present the stored plan ID and hash; the manager
//! additionally rebuilds the plan from the submitted request and compares
//! hashes, so any drift between preview and apply is rejected as tampering.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::actions::Action;
use crate::core::actions::Domain;
use crate::core::hashing::HashError;
use crate::core::hashing::plan_digest;
use crate::core::scopes::catalog_scopes;
use crate::core::types::NormalizedOperation;
use crate::core::types::Operation;
use crate::core::types::ResolvedTarget;
use crate::core::types::RiskLevel;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default plan time-to-live in seconds.
pub const DEFAULT_PLAN_TTL_SECONDS: u64 = 900;

/// Policy tag folded into every plan hash.
///
/// Bumping this tag invalidates all outstanding plans, which is the intended
/// effect of a policy change.
pub const PLAN_POLICY_TAG: &str = "fleetgate.plan.v1";

/// Mode tag folded into every plan hash.
const PLAN_MODE: &str = "preview";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building or verifying plans.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Submitted plan is missing, unknown, expired, or tampered.
    #[error("plan mismatch: {0}")]
    Mismatch(String),
    /// Canonical hashing failed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

// ============================================================================
// SECTION: Plan Model
// ============================================================================

/// Descriptor of one planned operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOperation {
    /// Client-assigned operation identifier.
    pub operation_id: String,
    /// Domain owning the action.
    pub domain: Domain,
    /// Action to perform.
    pub action: Action,
    /// Effective destructive classification.
    pub destructive: bool,
    /// Effective critical classification.
    pub critical: bool,
}

/// Immutable plan produced by preview.
///
/// # Invariants
/// - `required_scopes` is sorted and deduplicated.
/// - `destructive_count` equals the number of destructive descriptors.
/// - `risk_level` is HIGH iff any operation is critical, else MEDIUM iff any
///   is destructive, else LOW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Server-assigned plan identifier.
    pub plan_id: String,
    /// Canonical hash of the plan seed.
    pub plan_hash: String,
    /// Actor that requested the preview.
    pub actor: String,
    /// Resolved target projects, in resolution order.
    pub target_projects: Vec<String>,
    /// Planned operation descriptors, in request order.
    pub operations: Vec<PlanOperation>,
    /// Union of required scopes across operations.
    pub required_scopes: Vec<String>,
    /// Number of destructive operations.
    pub destructive_count: usize,
    /// Risk classification.
    pub risk_level: RiskLevel,
    /// Unix-seconds creation time.
    pub created_at: u64,
    /// Unix-seconds expiry time.
    pub expires_at: u64,
}

/// Canonical hash input; field order is irrelevant under RFC 8785.
#[derive(Serialize)]
struct PlanSeed<'a> {
    /// Actor that requested the preview.
    actor: &'a str,
    /// Fixed mode tag.
    mode: &'a str,
    /// Fixed policy tag.
    policy_tag: &'a str,
    /// Resolved target projects.
    target_projects: &'a [String],
    /// Normalized operations.
    operations: &'a [NormalizedOperation],
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Normalizes operations for planning.
///
/// Unions the catalog scopes into each operation's declared scopes and
/// upgrades the destructive/critical classification: inherently destructive
/// actions stay destructive no matter what the client claims, project
/// deletion is always critical, and a destructive operation fanning out to
/// two or more targets becomes critical.
#[must_use]
pub fn normalize_operations(
    operations: &[Operation],
    target_count: usize,
) -> Vec<NormalizedOperation> {
    operations
        .iter()
        .map(|operation| {
            let mut required_scopes: BTreeSet<String> = operation.required_scopes.clone();
            for scope in catalog_scopes(operation.action) {
                required_scopes.insert((*scope).to_string());
            }
            let destructive =
                operation.action.inherently_destructive() || operation.destructive == Some(true);
            let critical = operation.action == Action::ProjectDelete
                || (destructive && target_count >= 2)
                || operation.critical == Some(true);
            NormalizedOperation {
                operation_id: operation.operation_id.clone(),
                action: operation.action,
                params: operation.params.clone(),
                required_scopes,
                destructive,
                critical,
                idempotency_key: operation.idempotency_key.clone(),
            }
        })
        .collect()
}

/// Computes the canonical plan hash for a normalized request.
///
/// # Errors
///
/// Returns [`HashError`] when canonicalization fails.
pub fn plan_hash(
    actor: &str,
    target_projects: &[String],
    operations: &[NormalizedOperation],
) -> Result<String, HashError> {
    plan_digest(&PlanSeed {
        actor,
        mode: PLAN_MODE,
        policy_tag: PLAN_POLICY_TAG,
        target_projects,
        operations,
    })
}

// ============================================================================
// SECTION: Plan Manager
// ============================================================================

/// Builds, stores, and re-verifies plans.
pub struct PlanManager {
    /// Plan time-to-live in seconds.
    ttl_seconds: u64,
    /// Stored plans keyed by plan ID.
    plans: Mutex<HashMap<String, Plan>>,
}

impl PlanManager {
    /// Creates a manager with the given TTL.
    #[must_use]
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds,
            plans: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a plan from a normalized request and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Hash`] when canonical hashing fails.
    pub fn build_and_store(
        &self,
        actor: &str,
        targets: &[ResolvedTarget],
        operations: &[Operation],
        now: u64,
    ) -> Result<(Plan, Vec<NormalizedOperation>), PlanError> {
        let target_projects: Vec<String> =
            targets.iter().map(|target| target.project_id.clone()).collect();
        let normalized = normalize_operations(operations, target_projects.len());
        let hash = plan_hash(actor, &target_projects, &normalized)?;

        let descriptors: Vec<PlanOperation> = normalized
            .iter()
            .map(|operation| PlanOperation {
                operation_id: operation.operation_id.clone(),
                domain: operation.action.domain(),
                action: operation.action,
                destructive: operation.destructive,
                critical: operation.critical,
            })
            .collect();
        let required_scopes: BTreeSet<String> = normalized
            .iter()
            .flat_map(|operation| operation.required_scopes.iter().cloned())
            .collect();
        let destructive_count =
            descriptors.iter().filter(|descriptor| descriptor.destructive).count();
        let risk_level = if descriptors.iter().any(|descriptor| descriptor.critical) {
            RiskLevel::High
        } else if destructive_count > 0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let plan = Plan {
            plan_id: generate_plan_id(),
            plan_hash: hash,
            actor: actor.to_string(),
            target_projects,
            operations: descriptors,
            required_scopes: required_scopes.into_iter().collect(),
            destructive_count,
            risk_level,
            created_at: now,
            expires_at: now.saturating_add(self.ttl_seconds),
        };
        self.guard().insert(plan.plan_id.clone(), plan.clone());
        Ok((plan, normalized))
    }

    /// Verifies that a submitted request still matches a stored plan.
    ///
    /// Rejects when the ID or hash is missing, the plan is unknown or
    /// expired, the submitted hash differs from the stored hash, or a rebuild
    /// of the plan from the submitted request hashes differently. The rebuild
    /// clause is the tamper defense: identical inputs must rehash
    /// identically between preview and apply.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Mismatch`] on any verification failure.
    pub fn require_matching(
        &self,
        actor: &str,
        targets: &[ResolvedTarget],
        operations: &[Operation],
        plan_id: &str,
        submitted_hash: &str,
        now: u64,
    ) -> Result<(Plan, Vec<NormalizedOperation>), PlanError> {
        if plan_id.trim().is_empty() || submitted_hash.trim().is_empty() {
            return Err(PlanError::Mismatch("plan_id and plan_hash are required".to_string()));
        }
        let plan = self
            .guard()
            .get(plan_id)
            .cloned()
            .ok_or_else(|| PlanError::Mismatch(format!("plan '{plan_id}' not found")))?;
        if now >= plan.expires_at {
            return Err(PlanError::Mismatch(format!("plan '{plan_id}' has expired")));
        }
        if plan.plan_hash != submitted_hash {
            return Err(PlanError::Mismatch("submitted hash differs from stored plan".to_string()));
        }

        let target_projects: Vec<String> =
            targets.iter().map(|target| target.project_id.clone()).collect();
        let normalized = normalize_operations(operations, target_projects.len());
        let rebuilt = plan_hash(actor, &target_projects, &normalized)?;
        if rebuilt != plan.plan_hash {
            return Err(PlanError::Mismatch(
                "request no longer matches the previewed plan".to_string(),
            ));
        }
        Ok((plan, normalized))
    }

    /// Removes plans whose TTL has elapsed.
    pub fn purge_expired(&self, now: u64) {
        self.guard().retain(|_, plan| now < plan.expires_at);
    }

    /// Returns the number of stored plans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Returns true when no plans are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locks the plan store, recovering from poisoning.
    fn guard(&self) -> MutexGuard<'_, HashMap<String, Plan>> {
        self.plans.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for PlanManager {
    fn default() -> Self {
        Self::new(DEFAULT_PLAN_TTL_SECONDS)
    }
}

/// Generates a plan identifier from OS randomness.
fn generate_plan_id() -> String {
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);
    let mut id = String::with_capacity(21);
    id.push_str("plan_");
    for byte in bytes {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}
