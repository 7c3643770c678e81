// crates/fleetgate-core/src/runtime/mod.rs
// ============================================================================
// Module: Fleetgate Runtime
// Description: Target resolution, planning, confirmation, and execution.
// Purpose: Provide the single canonical mutation path for all tool surfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime modules implement the orchestration path every tool surface
//! must go through: resolve targets, build and verify plans, gate critical
//! changes behind confirmation tokens, and execute operations per target in
//! deterministic order. The runtime never reads wall-clock time; hosts pass
//! unix-second timestamps explicitly so behavior stays replayable in tests.

pub mod confirm;
pub mod executor;
pub mod plan;
pub mod targets;
